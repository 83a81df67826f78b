//! Engine options: the reserved `--config--` block, programmatic overrides,
//! and the resolved [`Options`].

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::de::IgnoredAny;
use tagmap_tags::PreferredFandoms;

use crate::ConfigError;
use crate::pattern::Matcher;

/// Characters allowed as remapped ship participants without `character:`.
const DEFAULT_UNPREFIXED_CHAR_MATCHERS: &[&str] = &["OC", "OFC", "OMC"];

/// Participants sorted after everyone else when ship tags are resorted.
const DEFAULT_CHARS_TO_SORT_TO_LAST: &[&str] = &[
    "OFC",
    "OMC",
    "OC",
    "Reader",
    "You",
    "Harem",
    "Other(s)",
    "?",
    "*",
    "/ - OC$| [(]OC[)]$/",
];

/// Options block as written in the configuration.
///
/// Every field is optional; unset fields fall back to the engine defaults.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RawOptions {
    /// Fandom names checked first when resolving a primary fandom.
    pub preferred_fandoms: Option<Vec<String>>,
    /// Literals or `/patterns/` allowed as participants without `character:`.
    pub unprefixed_char_matchers: Option<Vec<String>>,
    /// Sort ship and friendship participants.
    pub resort_ship_tags: Option<bool>,
    /// Literals or `/patterns/` sorted after other participants.
    pub chars_to_sort_to_last: Option<Vec<String>>,
    /// Keep character paths and comments when remapping characters.
    pub make_char_comments_ship_safe: Option<bool>,
    /// Keys the engine does not recognise.
    #[serde(flatten)]
    pub unknown: BTreeMap<String, IgnoredAny>,
}

/// Programmatic option overrides.
///
/// Only `Some` values override the configuration's options block.
#[derive(Clone, Debug, Default)]
pub struct MappingSettings {
    /// Override preferred fandoms.
    pub preferred_fandoms: Option<Vec<String>>,
    /// Override unprefixed character matchers.
    pub unprefixed_char_matchers: Option<Vec<String>>,
    /// Override ship resorting.
    pub resort_ship_tags: Option<bool>,
    /// Override the sort-to-last participant list.
    pub chars_to_sort_to_last: Option<Vec<String>>,
    /// Override path and comment preserving character remapping.
    pub make_char_comments_ship_safe: Option<bool>,
}

impl RawOptions {
    /// Apply programmatic settings on top of this block.
    pub fn apply_settings(&mut self, settings: &MappingSettings) {
        if let Some(preferred) = &settings.preferred_fandoms {
            self.preferred_fandoms = Some(preferred.clone());
        }
        if let Some(matchers) = &settings.unprefixed_char_matchers {
            self.unprefixed_char_matchers = Some(matchers.clone());
        }
        if let Some(resort) = settings.resort_ship_tags {
            self.resort_ship_tags = Some(resort);
        }
        if let Some(last) = &settings.chars_to_sort_to_last {
            self.chars_to_sort_to_last = Some(last.clone());
        }
        if let Some(ship_safe) = settings.make_char_comments_ship_safe {
            self.make_char_comments_ship_safe = Some(ship_safe);
        }
    }
}

/// Resolved engine options.
#[derive(Clone, Debug)]
pub struct Options {
    /// Fandoms checked first when resolving a primary fandom.
    pub preferred_fandoms: PreferredFandoms,
    /// Participants sorted after everyone else in ship tags.
    pub chars_to_sort_to_last: Vec<Matcher>,
    /// Remapped participants kept even without a `character:` prefix.
    pub unprefixed_char_matchers: Vec<Matcher>,
    /// Sort ship and friendship participants.
    pub resort_ship_tags: bool,
    /// Keep character paths and comments when remapping characters.
    pub make_char_comments_ship_safe: bool,
}

impl Options {
    /// Resolve an options block against the engine defaults.
    ///
    /// `make-char-comments-ship-safe` follows `resort-ship-tags` unless it
    /// is set explicitly.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Pattern` if a `/pattern/` matcher does not compile.
    pub fn resolve(raw: &RawOptions) -> Result<Self, ConfigError> {
        for key in raw.unknown.keys() {
            tracing::warn!(key = %key, "Ignoring unknown option");
        }

        let resort_ship_tags = raw.resort_ship_tags.unwrap_or(false);
        Ok(Self {
            preferred_fandoms: raw
                .preferred_fandoms
                .iter()
                .flatten()
                .cloned()
                .collect(),
            chars_to_sort_to_last: resolve_matchers(
                raw.chars_to_sort_to_last.as_deref(),
                DEFAULT_CHARS_TO_SORT_TO_LAST,
            )?,
            unprefixed_char_matchers: resolve_matchers(
                raw.unprefixed_char_matchers.as_deref(),
                DEFAULT_UNPREFIXED_CHAR_MATCHERS,
            )?,
            resort_ship_tags,
            make_char_comments_ship_safe: raw
                .make_char_comments_ship_safe
                .unwrap_or(resort_ship_tags),
        })
    }

    /// True if `name` should sort after other ship participants.
    #[must_use]
    pub fn sorts_to_last(&self, name: &str) -> bool {
        self.chars_to_sort_to_last.iter().any(|m| m.matches(name))
    }

    /// True if `name` may stand as a participant without `character:`.
    #[must_use]
    pub fn is_unprefixed_char(&self, name: &str) -> bool {
        self.unprefixed_char_matchers.iter().any(|m| m.matches(name))
    }
}

fn resolve_matchers<S: AsRef<str>>(
    configured: Option<&[S]>,
    defaults: &[&str],
) -> Result<Vec<Matcher>, ConfigError> {
    match configured {
        Some(entries) => entries.iter().map(|e| Matcher::parse(e.as_ref())).collect(),
        None => defaults.iter().map(|e| Matcher::parse(e)).collect(),
    }
}
