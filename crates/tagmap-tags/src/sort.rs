//! Canonical tag ordering.
//!
//! Every tag gets a sort key made of six category digits followed by its
//! normalised lowercase text:
//!
//! | digit | `0` when | `1` when |
//! |---|---|---|
//! | 1 | `fandom:` with a preferred body | otherwise |
//! | 2 | `fandom:` | otherwise |
//! | 3 | `fusion:` | otherwise |
//! | 4 | `xover:` | otherwise |
//! | 5 | not `status:` | `status:` |
//! | 6 | typed (`kind:value`) | untyped |
//!
//! Keys are compared with [`locale_compare`]; ties keep input order.

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;

use crate::collate::locale_compare;
use crate::fandom::PreferredFandoms;
use crate::tag::{TagKind, tag_body};

/// Runs of characters that do not take part in alphabetic comparison.
static NON_ALNUM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^:a-z0-9]+").unwrap());

/// A tag sort key, ordered with [`locale_compare`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortKey(String);

impl SortKey {
    /// Key text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        locale_compare(&self.0, &other.0)
    }
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Compute the canonical sort key of a tag.
///
/// `freeform:` tags all collapse to the word `freeform`, so they sort by kind
/// only and keep their relative input order.
#[must_use]
pub fn sort_key(tag: &str, preferred: &PreferredFandoms) -> SortKey {
    let kind = TagKind::of(tag);
    let preferred_hit = kind == TagKind::Fandom && preferred.contains(tag_body(tag));

    let mut key = String::with_capacity(tag.len() + 6);
    for bit in [
        !preferred_hit,
        kind != TagKind::Fandom,
        kind != TagKind::Fusion,
        kind != TagKind::Xover,
        kind == TagKind::Status,
        !tag.contains(':'),
    ] {
        key.push(if bit { '1' } else { '0' });
    }

    let lower = tag.to_lowercase();
    let text = if lower.starts_with("freeform:") {
        "freeform"
    } else {
        lower.as_str()
    };
    key.push_str(NON_ALNUM_RE.replace_all(text, " ").trim());
    SortKey(key)
}

/// Sort tags into canonical order in place. The sort is stable.
pub fn sort_tags<T: AsRef<str>>(tags: &mut [T], preferred: &PreferredFandoms) {
    tags.sort_by_cached_key(|tag| sort_key(tag.as_ref(), preferred));
}

/// Compare two tags by canonical order.
#[must_use]
pub fn tag_compare(a: &str, b: &str, preferred: &PreferredFandoms) -> Ordering {
    sort_key(a, preferred).cmp(&sort_key(b, preferred))
}
