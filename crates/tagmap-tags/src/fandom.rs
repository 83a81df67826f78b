//! Fandom extraction from tag lists.
//!
//! Fandom bodies may list equivalent names separated by `|`
//! (`fandom:Star Wars|SW`). Each name is an *alternative*.

use crate::tag::{TagKind, tag_body};
use crate::uniq::uniq_any_case;

/// Ordered set of fandom names checked first when resolving a primary fandom.
///
/// Names are matched case-sensitively. Iteration follows priority order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PreferredFandoms {
    names: Vec<String>,
}

impl PreferredFandoms {
    /// Create a set from names in priority order. Repeated names are dropped.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names.into_iter().collect()
    }

    /// Check whether `name` is a preferred fandom.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Names in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }
}

impl<S: Into<String>> FromIterator<S> for PreferredFandoms {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut names: Vec<String> = Vec::new();
        for name in iter {
            let name = name.into();
            if !names.contains(&name) {
                names.push(name);
            }
        }
        Self { names }
    }
}

/// Check whether `name` is one whole alternative of a piped fandom body.
///
/// Whitespace around a `|` is ignored. The body's first alternative must
/// start exactly with `name`, and its last must end exactly with it.
///
/// ```
/// use tagmap_tags::has_alternative;
///
/// assert!(has_alternative("xyz | PRIMARY", "PRIMARY"));
/// assert!(has_alternative("PRIMARY|abc", "PRIMARY"));
/// assert!(!has_alternative("PRIMARY2|abc", "PRIMARY"));
/// ```
#[must_use]
pub fn has_alternative(body: &str, name: &str) -> bool {
    let alternatives: Vec<&str> = body.split('|').collect();
    let last = alternatives.len() - 1;
    alternatives.into_iter().enumerate().any(|(i, alt)| {
        let alt = if i == 0 { alt } else { alt.trim_start() };
        if i == last {
            alt == name
        } else {
            alt.trim_end() == name
        }
    })
}

/// Check whether the first alternative of `body` is exactly `name`.
#[must_use]
pub fn first_alternative_is(body: &str, name: &str) -> bool {
    body.strip_prefix(name)
        .is_some_and(|rest| rest.is_empty() || rest.trim_start().starts_with('|'))
}

/// Split a fandom tag (or bare body) into its trimmed alternatives.
///
/// ```
/// use tagmap_tags::fandoms_from_tag;
///
/// assert_eq!(fandoms_from_tag("xover:def | ghi"), ["def", "ghi"]);
/// assert_eq!(fandoms_from_tag("aa|bb"), ["aa", "bb"]);
/// ```
#[must_use]
pub fn fandoms_from_tag(tag: &str) -> Vec<String> {
    let body = if TagKind::of(tag).is_fandom_like() {
        tag_body(tag)
    } else {
        tag
    };
    body.split('|').map(|alt| alt.trim().to_owned()).collect()
}

/// Resolve the primary fandom of a tag list.
///
/// Preferred names are tried in priority order against every alternative of
/// every `fandom:`, `xover:` and `fusion:` tag; the first hit returns that
/// tag's whole body. Otherwise the body of the first `fandom:` tag wins,
/// then the first `fusion:` tag, then the first `xover:` tag.
#[must_use]
pub fn fandom<T: AsRef<str>>(tags: &[T], preferred: &PreferredFandoms) -> Option<String> {
    for name in preferred.iter() {
        let hit = tags.iter().map(AsRef::as_ref).find(|tag| {
            TagKind::of(tag).is_fandom_like() && has_alternative(tag_body(tag), name)
        });
        if let Some(tag) = hit {
            return Some(tag_body(tag).to_owned());
        }
    }

    [TagKind::Fandom, TagKind::Fusion, TagKind::Xover]
        .into_iter()
        .find_map(|kind| {
            tags.iter()
                .map(AsRef::as_ref)
                .find(|tag| TagKind::of(tag) == kind)
                .map(|tag| tag_body(tag).to_owned())
        })
}

/// All distinct fandom names in a tag list, in first-seen order.
///
/// Piped bodies contribute every alternative; duplicates are dropped
/// case-insensitively.
#[must_use]
pub fn fandoms<T: AsRef<str>>(tags: &[T]) -> Vec<String> {
    let names: Vec<String> = tags
        .iter()
        .map(AsRef::as_ref)
        .filter(|tag| TagKind::of(tag).is_fandom_like())
        .flat_map(fandoms_from_tag)
        .collect();
    uniq_any_case(&names)
}
