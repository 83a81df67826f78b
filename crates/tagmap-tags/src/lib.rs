//! Tag values and the standalone tag utilities for tagmap.
//!
//! This crate works on plain tag lists and needs no compiled mapping:
//! - [`Tag`]: tag text plus its [`Origin`] (original or produced by a rule)
//! - [`sort_tags`] / [`tag_compare`]: canonical tag ordering
//! - [`uniq_tags`]: case-insensitive deduplication with piped-fandom collapsing
//! - [`fandom`] / [`fandoms`]: primary and complete fandom extraction
//!
//! # Example
//!
//! ```
//! use tagmap_tags::{PreferredFandoms, sort_tags, uniq_tags};
//!
//! let preferred = PreferredFandoms::new(["PRIMARY"]);
//! let mut tags = uniq_tags(&["zzz", "fandom:aaa", "fandom:PRIMARY", "ZZZ"]);
//! sort_tags(&mut tags, &preferred);
//! assert_eq!(tags, ["fandom:PRIMARY", "fandom:aaa", "zzz"]);
//! ```

mod collate;
mod fandom;
mod sort;
mod tag;
mod uniq;

pub use collate::locale_compare;
pub use fandom::{
    PreferredFandoms, fandom, fandoms, fandoms_from_tag, first_alternative_is, has_alternative,
};
pub use sort::{SortKey, sort_key, sort_tags, tag_compare};
pub use tag::{Origin, Tag, TagKind, tag_body};
pub use uniq::{uniq_any_case, uniq_tags};
