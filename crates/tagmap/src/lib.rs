//! Rule-driven tag translation.
//!
//! A [`Mapping`] is compiled once from a configuration of per-section rule
//! tables and then translates any number of tag lists:
//!
//! ```
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use tagmap::{Mapping, MappingSettings};
//!
//! let mapping = Mapping::from_toml_str(
//!     r#"
//! [ao3]
//! "character:Test" = "character:Fullname"
//! "#,
//!     &MappingSettings {
//!         resort_ship_tags: Some(true),
//!         ..Default::default()
//!     },
//! )?;
//!
//! let tags = mapping.translate_tags(
//!     Some("ao3"),
//!     ["ship:Test/Test (right now)", "character:test (mentioned)", "fandom:aa|bb"],
//! );
//! assert_eq!(
//!     tags.values(),
//!     [
//!         "fandom:aa",
//!         "fandom:aa|bb",
//!         "character:Fullname - mentioned",
//!         "ship:Fullname/Fullname (right now)",
//!     ]
//! );
//! assert_eq!(tags.unchanged(), ["fandom:aa|bb"]);
//! # Ok(())
//! # }
//! ```

mod companions;
mod list;
mod mapping;
mod pipeline;
mod rules;
mod ship;
mod template;

pub use list::TagList;
pub use mapping::Mapping;
pub use rules::{Replacer, Rule, RuleSet};
pub use ship::split_people;
pub use template::Template;

// Re-export configuration and tag utilities for convenience
pub use tagmap_config::{ConfigError, MappingSettings, Options, RawConfig, RawOptions};
pub use tagmap_tags::{
    Origin, PreferredFandoms, Tag, fandom, fandoms, sort_tags, tag_compare, uniq_tags,
};
