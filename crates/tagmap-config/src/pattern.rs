//! Literal-or-pattern matchers.
//!
//! Configuration entries written as `/pattern/` are regular expressions;
//! anything else is a literal string.

use regex::{Regex, RegexBuilder};

use crate::ConfigError;

/// Case handling for a [`Matcher`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Case {
    /// Exact comparison.
    #[default]
    Sensitive,
    /// Compare lowercase forms; patterns get the `i` flag.
    Insensitive,
}

/// A literal string or compiled pattern built from a configuration entry.
#[derive(Clone, Debug)]
pub enum Matcher {
    /// Whole-text equality.
    Literal {
        /// Text to compare against (lowercased for [`Case::Insensitive`]).
        text: String,
        /// Case handling.
        case: Case,
    },
    /// Unanchored regular expression search.
    Pattern(Regex),
}

/// Return the pattern inside a `/pattern/` entry.
///
/// ```
/// use tagmap_config::pattern_body;
///
/// assert_eq!(pattern_body("/^cc(\\w+)/"), Some("^cc(\\w+)"));
/// assert_eq!(pattern_body("character:abc"), None);
/// assert_eq!(pattern_body("/"), None);
/// ```
#[must_use]
pub fn pattern_body(entry: &str) -> Option<&str> {
    if entry.len() >= 2 && entry.starts_with('/') && entry.ends_with('/') {
        Some(&entry[1..entry.len() - 1])
    } else {
        None
    }
}

/// Compile a pattern, reporting the entry it came from on failure.
pub(crate) fn compile(entry: &str, body: &str, case: Case) -> Result<Regex, ConfigError> {
    RegexBuilder::new(body)
        .case_insensitive(case == Case::Insensitive)
        .build()
        .map_err(|source| ConfigError::Pattern {
            pattern: entry.to_owned(),
            source,
        })
}

impl Matcher {
    /// Build a case-sensitive matcher from a configuration entry.
    pub fn parse(entry: &str) -> Result<Self, ConfigError> {
        Self::with_case(entry, Case::Sensitive)
    }

    /// Build a matcher from a configuration entry.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Pattern` if a `/pattern/` entry does not compile.
    pub fn with_case(entry: &str, case: Case) -> Result<Self, ConfigError> {
        match pattern_body(entry) {
            Some(body) => Ok(Self::Pattern(compile(entry, body, case)?)),
            None => Ok(Self::literal(entry, case)),
        }
    }

    /// Build a literal matcher.
    #[must_use]
    pub fn literal(text: &str, case: Case) -> Self {
        let text = match case {
            Case::Sensitive => text.to_owned(),
            Case::Insensitive => text.to_lowercase(),
        };
        Self::Literal { text, case }
    }

    /// Check whether `text` matches.
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        match self {
            Self::Literal {
                text: expected,
                case: Case::Sensitive,
            } => expected == text,
            Self::Literal {
                text: expected,
                case: Case::Insensitive,
            } => *expected == text.to_lowercase(),
            Self::Pattern(re) => re.is_match(text),
        }
    }

    /// The literal text or pattern source.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Literal { text, .. } => text,
            Self::Pattern(re) => re.as_str(),
        }
    }

    /// True for `/pattern/` matchers.
    #[must_use]
    pub fn is_pattern(&self) -> bool {
        matches!(self, Self::Pattern(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_case_sensitive() {
        let m = Matcher::parse("OC").unwrap();
        assert!(m.matches("OC"));
        assert!(!m.matches("oc"));
        assert!(!m.matches("OC2"));
        assert!(!m.is_pattern());
    }

    #[test]
    fn test_literal_case_insensitive() {
        let m = Matcher::with_case("Freeform:YYY", Case::Insensitive).unwrap();
        assert_eq!(m.as_str(), "freeform:yyy");
        assert!(m.matches("freeform:yyy"));
        assert!(m.matches("FREEFORM:yyy"));
    }

    #[test]
    fn test_pattern_is_unanchored() {
        let m = Matcher::parse("/ - OC$| [(]OC[)]$/").unwrap();
        assert!(m.is_pattern());
        assert!(m.matches("Jane - OC"));
        assert!(m.matches("Jane (OC)"));
        assert!(!m.matches("OC"));
    }

    #[test]
    fn test_pattern_case_insensitive() {
        let m = Matcher::with_case("/^reader$/", Case::Insensitive).unwrap();
        assert!(m.matches("Reader"));
    }

    #[test]
    fn test_bad_pattern_is_error() {
        let err = Matcher::parse("/([a-z]/").unwrap_err();
        assert!(matches!(err, ConfigError::Pattern { .. }));
        assert!(err.to_string().contains("/([a-z]/"));
    }

    #[test]
    fn test_lookaround_and_backreference_are_rejected() {
        for entry in ["/^fandom:(?!Star Wars)/", r"/^(a)\1$/"] {
            let err = Matcher::parse(entry).unwrap_err();
            assert!(matches!(err, ConfigError::Pattern { .. }), "{entry}");
        }
    }
}
