//! Tag values with change provenance.

use std::fmt;

/// Where the text of a [`Tag`] came from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Origin {
    /// Supplied by the caller and not rewritten since.
    #[default]
    Original,
    /// Produced by a replacement rule or a rewrite step.
    Replaced,
}

/// Kind of a tag, taken from the text before its first colon.
///
/// Kind detection is case-sensitive: `Fandom:abc` is a custom kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagKind<'a> {
    /// `fandom:` - the work's source fandom.
    Fandom,
    /// `fusion:` - a crossover where settings are merged.
    Fusion,
    /// `xover:` - a crossover fandom.
    Xover,
    /// `character:`
    Character,
    /// `ship:` - romantic relationship.
    Ship,
    /// `friendship:` - platonic relationship.
    Friendship,
    /// `status:`
    Status,
    /// `freeform:`
    Freeform,
    /// Any other `kind:value` tag.
    Custom(&'a str),
    /// A bare tag without a colon.
    Untyped,
}

impl<'a> TagKind<'a> {
    /// Determine the kind of a tag's text.
    #[must_use]
    pub fn of(text: &'a str) -> Self {
        let Some((kind, _)) = text.split_once(':') else {
            return Self::Untyped;
        };
        match kind {
            "fandom" => Self::Fandom,
            "fusion" => Self::Fusion,
            "xover" => Self::Xover,
            "character" => Self::Character,
            "ship" => Self::Ship,
            "friendship" => Self::Friendship,
            "status" => Self::Status,
            "freeform" => Self::Freeform,
            other => Self::Custom(other),
        }
    }

    /// True for `fandom:`, `fusion:` and `xover:`.
    #[must_use]
    pub fn is_fandom_like(self) -> bool {
        matches!(self, Self::Fandom | Self::Fusion | Self::Xover)
    }

    /// True for `ship:` and `friendship:`.
    #[must_use]
    pub fn is_relationship(self) -> bool {
        matches!(self, Self::Ship | Self::Friendship)
    }
}

/// Everything after the first colon, or the whole text for untyped tags.
#[must_use]
pub fn tag_body(text: &str) -> &str {
    text.split_once(':').map_or(text, |(_, body)| body)
}

/// A tag's text annotated with its [`Origin`].
///
/// Tags are immutable values: rewriting produces a new tag.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Tag {
    text: String,
    origin: Origin,
}

impl Tag {
    #[must_use]
    pub fn new(text: impl Into<String>, origin: Origin) -> Self {
        Self {
            text: text.into(),
            origin,
        }
    }

    /// Create a tag supplied by the caller.
    #[must_use]
    pub fn original(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            origin: Origin::Original,
        }
    }

    /// Create a tag produced by a rewrite.
    #[must_use]
    pub fn replaced(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            origin: Origin::Replaced,
        }
    }

    /// The tag text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Where the text came from.
    #[must_use]
    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// True if the tag was produced by a rewrite.
    #[must_use]
    pub fn is_changed(&self) -> bool {
        self.origin == Origin::Replaced
    }

    /// Kind of the tag.
    #[must_use]
    pub fn kind(&self) -> TagKind<'_> {
        TagKind::of(&self.text)
    }

    /// Text after the first colon.
    #[must_use]
    pub fn body(&self) -> &str {
        tag_body(&self.text)
    }

    /// Rewrite the text, keeping this tag's origin when the text is unchanged.
    #[must_use]
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        let text = text.into();
        if text == self.text {
            self.clone()
        } else {
            Self::replaced(text)
        }
    }

    /// Strip surrounding whitespace. Provenance is kept.
    #[must_use]
    pub fn trimmed(&self) -> Self {
        Self::new(self.text.trim(), self.origin)
    }

    /// Consume the tag, returning its text.
    #[must_use]
    pub fn into_text(self) -> String {
        self.text
    }
}

impl AsRef<str> for Tag {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<&str> for Tag {
    fn from(text: &str) -> Self {
        Self::original(text)
    }
}

impl From<String> for Tag {
    fn from(text: String) -> Self {
        Self::original(text)
    }
}
