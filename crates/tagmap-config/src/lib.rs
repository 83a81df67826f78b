//! Configuration for tagmap.
//!
//! A configuration maps section names (a site, a `pre:`/`post:` phase, or a
//! fandom) to rule tables. One reserved section, `--config--` (matched
//! case-insensitively), holds the engine options instead of rules.
//!
//! ```toml
//! ["--config--"]
//! preferred-fandoms = ["Star Wars"]
//! resort-ship-tags = true
//!
//! [ao3]
//! "character:Ben Solo" = "character:Kylo Ren"
//! "/^Warning: (.*)/" = "warning:$1"
//! "freeform:xxx & freeform:yyy" = ["freeform:xxx yyy"]
//! ```
//!
//! Rule keys come in three forms: `/pattern/` for a pattern replacer,
//! `kind:a & kind:b` for a rule that needs every operand present, and any
//! other text for an exact, case-insensitive match.
//!
//! Patterns use the [`regex`] crate syntax. Lookaround and backreferences
//! are not supported; a key using them fails with [`ConfigError::Pattern`].
//!
//! Section and rule order is significant and is kept exactly as written.
//! Programmatic overrides can be applied via [`MappingSettings`].

mod options;
mod pattern;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::de::{self, IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

pub use options::{MappingSettings, Options, RawOptions};
pub use pattern::{Case, Matcher, pattern_body};

/// Name of the reserved options section.
pub const OPTIONS_SECTION: &str = "--config--";

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    /// A `/pattern/` key or matcher that does not compile.
    #[error("Invalid pattern {pattern}: {source}")]
    Pattern {
        /// The entry as written, including slashes.
        pattern: String,
        /// Regex compilation error.
        #[source]
        source: regex::Error,
    },
    /// A rule value that is not a tag or a list of tags.
    #[error("Tag not a string in [{section}] rule {key:?}")]
    InvalidTag {
        /// Section holding the rule.
        section: String,
        /// Rule key.
        key: String,
    },
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
}

/// One rule as written: a key and its replacement tags.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawRule {
    /// Rule key: a tag, a `/pattern/`, or `kind:a & kind:b` conjunction.
    pub key: String,
    /// Replacement tags or templates, in order.
    pub replacements: Vec<String>,
}

/// One section's rule table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawSection {
    /// Section name.
    pub name: String,
    /// Rules in declaration order.
    pub rules: Vec<RawRule>,
}

/// Raw configuration: ordered rule tables plus the options block.
#[derive(Clone, Debug, Default)]
pub struct RawConfig {
    sections: Vec<RawSection>,
    options: RawOptions,
}

impl RawConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let document: Document = toml::from_str(content)?;
        document.into_config()
    }

    /// Build configuration from an already parsed TOML table.
    pub fn from_toml_table(table: &toml::Table) -> Result<Self, ConfigError> {
        let document: Document = toml::Value::Table(table.clone()).try_into()?;
        document.into_config()
    }

    /// Parse configuration from JSON text.
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let document: Document = serde_json::from_str(content)?;
        document.into_config()
    }

    /// Load configuration from a `.toml` or `.json` file.
    ///
    /// # Errors
    ///
    /// Returns error if the file doesn't exist, can't be read, has an
    /// unknown extension, or fails to parse.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&content)?,
            Some("json") => Self::from_json_str(&content)?,
            _ => {
                return Err(ConfigError::Validation(format!(
                    "{} must have a .toml or .json extension",
                    path.display()
                )));
            }
        };
        tracing::debug!(
            path = %path.display(),
            sections = config.sections.len(),
            "Loaded tag mapping configuration"
        );
        Ok(config)
    }

    /// Append a rule to a section, creating the section if needed.
    pub fn add_rule<I, S>(&mut self, section: &str, key: &str, replacements: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let rule = RawRule {
            key: key.to_owned(),
            replacements: replacements.into_iter().map(Into::into).collect(),
        };
        match self.sections.iter_mut().find(|s| s.name == section) {
            Some(existing) => existing.rules.push(rule),
            None => self.sections.push(RawSection {
                name: section.to_owned(),
                rules: vec![rule],
            }),
        }
        self
    }

    /// Replace the options block.
    pub fn set_options(&mut self, options: RawOptions) -> &mut Self {
        self.options = options;
        self
    }

    /// Rule tables in declaration order.
    #[must_use]
    pub fn sections(&self) -> &[RawSection] {
        &self.sections
    }

    /// The options block.
    #[must_use]
    pub fn options(&self) -> &RawOptions {
        &self.options
    }
}

/// Rule value as written: one tag, a list of tags, or something invalid.
#[derive(Deserialize)]
#[serde(untagged)]
enum RuleValue {
    One(String),
    Many(Vec<String>),
    Invalid(IgnoredAny),
}

/// Ordered `key = value` pairs of a map.
struct Entries<V>(Vec<(String, V)>);

impl<'de, V: Deserialize<'de>> Deserialize<'de> for Entries<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor<V>(std::marker::PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for EntriesVisitor<V> {
            type Value = Entries<V>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a table of rules")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, V>()? {
                    entries.push((key, value));
                }
                Ok(Entries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor(std::marker::PhantomData))
    }
}

enum DocumentSection {
    Options(RawOptions),
    Rules(String, Entries<RuleValue>),
}

/// Top-level document: sections in order, the options block split out.
struct Document(Vec<DocumentSection>);

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DocumentVisitor;

        impl<'de> Visitor<'de> for DocumentVisitor {
            type Value = Document;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a table of sections")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut sections = Vec::new();
                while let Some(name) = map.next_key::<String>()? {
                    if name.eq_ignore_ascii_case(OPTIONS_SECTION) {
                        sections.push(DocumentSection::Options(map.next_value()?));
                    } else {
                        let rules = map.next_value().map_err(|e: A::Error| {
                            <A::Error as de::Error>::custom(format_args!("section [{name}]: {e}"))
                        })?;
                        sections.push(DocumentSection::Rules(name, rules));
                    }
                }
                Ok(Document(sections))
            }
        }

        deserializer.deserialize_map(DocumentVisitor)
    }
}

impl Document {
    fn into_config(self) -> Result<RawConfig, ConfigError> {
        let mut config = RawConfig::default();
        for section in self.0 {
            match section {
                DocumentSection::Options(options) => config.options = options,
                DocumentSection::Rules(name, Entries(entries)) => {
                    let mut rules = Vec::with_capacity(entries.len());
                    for (key, value) in entries {
                        let replacements = match value {
                            RuleValue::One(tag) => vec![tag],
                            RuleValue::Many(tags) => tags,
                            RuleValue::Invalid(_) => {
                                return Err(ConfigError::InvalidTag { section: name, key });
                            }
                        };
                        rules.push(RawRule { key, replacements });
                    }
                    config.sections.push(RawSection { name, rules });
                }
            }
        }
        Ok(config)
    }
}
