//! Replacement templates for `/pattern/` rules.
//!
//! Templates use `$` references:
//!
//! | reference | expands to |
//! |---|---|
//! | `$$` | a literal `$` |
//! | `$&` | the whole match |
//! | `` $` `` | text before the match |
//! | `$'` | text after the match |
//! | `$1`..`$99` | numbered group (two digits win when that group exists) |
//! | `$<name>` | named group, when the pattern has named groups |
//!
//! Anything else after a `$` is kept literally.

use regex::{Captures, Regex};

#[derive(Clone, Debug, PartialEq, Eq)]
enum Part {
    Text(String),
    Group(usize),
    Named(String),
    Match,
    Before,
    After,
}

/// A parsed replacement template.
#[derive(Clone, Debug)]
pub struct Template {
    source: String,
    parts: Vec<Part>,
}

impl Template {
    /// Parse `source` for use with `pattern`.
    ///
    /// Group references are resolved against the pattern's groups, so `$12`
    /// means group 12 only if the pattern has at least twelve groups.
    #[must_use]
    pub fn parse(source: &str, pattern: &Regex) -> Self {
        let groups = pattern.captures_len() - 1;
        let has_names = pattern.capture_names().flatten().next().is_some();

        let mut parts = Vec::new();
        let mut text = String::new();
        let mut rest = source;
        while let Some(dollar) = rest.find('$') {
            text.push_str(&rest[..dollar]);
            let after = &rest[dollar + 1..];
            let (part, consumed) = reference(after, groups, has_names);
            match part {
                Some(part) => {
                    if !text.is_empty() {
                        parts.push(Part::Text(std::mem::take(&mut text)));
                    }
                    parts.push(part);
                }
                None => text.push('$'),
            }
            rest = &after[consumed..];
        }
        text.push_str(rest);
        if !text.is_empty() {
            parts.push(Part::Text(text));
        }

        Self {
            source: source.to_owned(),
            parts,
        }
    }

    /// The template as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Append the expansion for one match to `dst`.
    pub fn expand(&self, caps: &Captures<'_>, haystack: &str, dst: &mut String) {
        let Some(whole) = caps.get(0) else {
            return;
        };
        for part in &self.parts {
            match part {
                Part::Text(text) => dst.push_str(text),
                Part::Group(index) => {
                    if let Some(group) = caps.get(*index) {
                        dst.push_str(group.as_str());
                    }
                }
                Part::Named(name) => {
                    if let Some(group) = caps.name(name) {
                        dst.push_str(group.as_str());
                    }
                }
                Part::Match => dst.push_str(whole.as_str()),
                Part::Before => dst.push_str(&haystack[..whole.start()]),
                Part::After => dst.push_str(&haystack[whole.end()..]),
            }
        }
    }

    /// Replace every match of `pattern` in `text`.
    #[must_use]
    pub fn replace_all(&self, pattern: &Regex, text: &str) -> String {
        pattern
            .replace_all(text, |caps: &Captures<'_>| {
                let mut out = String::new();
                self.expand(caps, text, &mut out);
                out
            })
            .into_owned()
    }
}

/// Parse the reference following a `$`.
///
/// Returns the part and the number of bytes it used. `None` means the `$`
/// is literal; for `$$` one byte is still consumed.
fn reference(after: &str, groups: usize, has_names: bool) -> (Option<Part>, usize) {
    let bytes = after.as_bytes();
    match bytes.first() {
        Some(b'$') => (None, 1),
        Some(b'&') => (Some(Part::Match), 1),
        Some(b'`') => (Some(Part::Before), 1),
        Some(b'\'') => (Some(Part::After), 1),
        Some(first) if first.is_ascii_digit() => {
            let first = usize::from(first - b'0');
            if let Some(second) = bytes.get(1).filter(|b| b.is_ascii_digit()) {
                let two = first * 10 + usize::from(second - b'0');
                if (1..=groups).contains(&two) {
                    return (Some(Part::Group(two)), 2);
                }
            }
            if (1..=groups).contains(&first) {
                (Some(Part::Group(first)), 1)
            } else {
                (None, 0)
            }
        }
        Some(b'<') if has_names => match after.find('>') {
            Some(end) => (Some(Part::Named(after[1..end].to_owned())), end + 1),
            None => (None, 0),
        },
        _ => (None, 0),
    }
}
