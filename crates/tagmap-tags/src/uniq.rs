//! Tag deduplication.

use std::collections::HashSet;

use crate::fandom::fandoms_from_tag;
use crate::tag::{TagKind, tag_body};

/// Drop case-insensitive duplicates, keeping the first occurrence.
#[must_use]
pub fn uniq_any_case<T: AsRef<str> + Clone>(items: &[T]) -> Vec<T> {
    let mut seen = HashSet::new();
    items
        .iter()
        .filter(|item| seen.insert(item.as_ref().to_lowercase()))
        .cloned()
        .collect()
}

/// A fandom body seen so far, and the surviving tag that carries it.
///
/// Alternatives recorded only as parts of a longer piped body have no
/// survivor.
struct SeenFandom {
    body: String,
    survivor: Option<String>,
}

/// Fandom bodies in the order they were first recorded.
#[derive(Default)]
struct SeenFandoms {
    entries: Vec<SeenFandom>,
}

impl SeenFandoms {
    fn contains(&self, body: &str) -> bool {
        self.entries.iter().any(|e| e.body == body)
    }

    fn record(&mut self, body: &str, survivor: Option<String>) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.body == body) {
            entry.survivor = survivor;
        } else {
            self.entries.push(SeenFandom {
                body: body.to_owned(),
                survivor,
            });
        }
    }
}

/// Deduplicate a tag list.
///
/// Tags are compared case-insensitively and the first occurrence wins.
/// `fandom:`, `fusion:` and `xover:` tags are also compared by body, so
/// `xover:abc` after `fandom:abc` is dropped, and piped alternatives collapse:
///
/// - a body that extends an earlier body with more alternatives
///   (`aa|bb` after `aa`) is dropped, unless the earlier body is the very
///   first fandom seen;
/// - an earlier surviving body that is covered by a later alternative
///   (`def` before `abc|def`) is removed in favour of the piped tag.
///
/// ```
/// use tagmap_tags::uniq_tags;
///
/// assert_eq!(uniq_tags(&["fandom:abc", "fandom:abc"]), ["fandom:abc"]);
/// assert_eq!(uniq_tags(&["fandom:def", "fandom:abc|def"]), ["fandom:abc|def"]);
/// ```
#[must_use]
pub fn uniq_tags<T: AsRef<str> + Clone>(tags: &[T]) -> Vec<T> {
    let mut kept: Vec<T> = Vec::with_capacity(tags.len());
    let mut seen_tags = HashSet::new();
    let mut seen_fandoms = SeenFandoms::default();
    let mut first_fandom: Option<String> = None;

    for tag in tags {
        let lower = tag.as_ref().to_lowercase();
        if !seen_tags.insert(lower.clone()) {
            continue;
        }
        if !TagKind::of(&lower).is_fandom_like() {
            kept.push(tag.clone());
            continue;
        }

        let body = tag_body(&lower);
        let first = first_fandom.get_or_insert_with(|| body.to_owned());
        if seen_fandoms.contains(body) {
            continue;
        }

        let extends_existing = seen_fandoms.entries.iter().any(|e| {
            e.body != *first
                && body
                    .strip_prefix(e.body.as_str())
                    .is_some_and(|rest| rest.starts_with('|'))
        });
        if extends_existing {
            seen_fandoms.record(body, None);
            continue;
        }

        for chunk in fandoms_from_tag(body).into_iter().skip(1) {
            let covered: Vec<String> = seen_fandoms
                .entries
                .iter()
                .filter(|e| e.survivor.is_some() && covers(&chunk, &e.body))
                .map(|e| e.body.clone())
                .collect();
            for existing in covered {
                if let Some(pos) = seen_fandoms.entries.iter().position(|e| e.body == existing) {
                    let entry = seen_fandoms.entries.remove(pos);
                    if let Some(survivor) = entry.survivor {
                        kept.retain(|t| t.as_ref().to_lowercase() != survivor);
                    }
                }
            }
            seen_fandoms.record(&chunk, None);
        }

        seen_fandoms.record(body, Some(lower.clone()));
        kept.push(tag.clone());
    }

    kept
}

/// True if `existing` starts with the whole alternative `chunk`.
fn covers(chunk: &str, existing: &str) -> bool {
    existing
        .strip_prefix(chunk)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('|'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_exact_dups() {
        assert_eq!(uniq_tags(&["fandom:abc", "fandom:abc"]), ["fandom:abc"]);
    }

    #[test]
    fn test_case_insensitive_dups_keep_first() {
        assert_eq!(uniq_tags(&["Foo", "bar", "FOO"]), ["Foo", "bar"]);
    }

    #[test]
    fn test_crossover_and_fusion_dups() {
        assert_eq!(uniq_tags(&["fandom:abc", "xover:abc"]), ["fandom:abc"]);
        assert_eq!(uniq_tags(&["fandom:abc", "fusion:abc"]), ["fandom:abc"]);
    }

    #[test]
    fn test_long_dups() {
        assert_eq!(uniq_tags(&["fandom:def", "fandom:abc|def"]), ["fandom:abc|def"]);
    }

    #[test]
    fn test_piped_collapsing() {
        let list = [
            "fandom:aa",
            "fandom:bb",
            "fandom:aa|bb",
            "fandom:zz|bb",
            "fandom:cc",
            "fandom:cc",
            "fandom:dd|ee",
            "fandom:ee",
        ];
        assert_eq!(
            uniq_tags(&list),
            [
                "fandom:aa",
                "fandom:aa|bb",
                "fandom:zz|bb",
                "fandom:cc",
                "fandom:dd|ee",
            ]
        );
    }

    #[test]
    fn test_extension_of_later_fandom_dropped() {
        let list = ["fandom:aa", "fandom:bb", "xover:bb|cc"];
        assert_eq!(uniq_tags(&list), ["fandom:aa", "fandom:bb"]);
    }

    // Idempotent for this shape only; see `test_not_idempotent_across_passes`.
    #[test]
    fn test_idempotent() {
        let list = [
            "fandom:aa",
            "fandom:bb",
            "fandom:aa|bb",
            "fandom:zz|bb",
            "Fandom:CC",
            "cc",
            "CC",
            "xover:dd|ee",
            "fusion:ee",
        ];
        let once = uniq_tags(&list);
        assert_eq!(uniq_tags(&once), once);
    }

    #[test]
    fn test_not_idempotent_across_passes() {
        // `b` stops being the first fandom once `c|b` displaces it, so the
        // second pass treats `b|a` as an extension of `b`.
        let list = ["fandom:b", "fandom:c|b", "fandom:b|a", "fandom:a|c"];
        let once = uniq_tags(&list);
        assert_eq!(once, ["fandom:c|b", "fandom:b|a"]);
        assert_eq!(uniq_tags(&once), ["fandom:c|b"]);
    }

    #[test]
    fn test_uniq_any_case() {
        assert_eq!(uniq_any_case(&["Fullname", "fullname", "plain"]), ["Fullname", "plain"]);
    }
}
