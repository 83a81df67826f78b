//! The tag list seen by conjunctive rules.

use tagmap_config::Matcher;
use tagmap_tags::Tag;

/// Tags a conjunctive rule may consume, plus the scan cursor over them.
///
/// Consuming removes companions from the list; the cursor is adjusted so
/// the caller neither skips nor revisits a tag.
pub(crate) struct Companions<'a> {
    tags: &'a mut Vec<Tag>,
    position: usize,
    removed_current: bool,
}

impl<'a> Companions<'a> {
    pub(crate) fn new(tags: &'a mut Vec<Tag>, position: usize) -> Self {
        Self {
            tags,
            position,
            removed_current: false,
        }
    }

    /// Remove one tag for every matcher if all of them are present.
    ///
    /// Returns `false`, leaving the list untouched, if any is missing.
    pub(crate) fn consume(&mut self, required: &[Matcher]) -> bool {
        let mut found = Vec::with_capacity(required.len());
        for matcher in required {
            match self.tags.iter().position(|t| matcher.matches(t.text())) {
                Some(index) => found.push(index),
                None => return false,
            }
        }
        found.sort_unstable();
        found.dedup();

        for &index in found.iter().rev() {
            let removed = self.tags.remove(index);
            tracing::debug!(tag = %removed, "Consumed companion tag");
            if index < self.position {
                self.position -= 1;
            } else if index == self.position {
                self.removed_current = true;
            }
        }
        true
    }

    /// Cursor position and whether the tag under it was consumed.
    pub(crate) fn finish(&self) -> (usize, bool) {
        (self.position, self.removed_current)
    }

    /// Index of the next tag for a forward scan.
    pub(crate) fn next_position(&self) -> usize {
        if self.removed_current {
            self.position
        } else {
            self.position + 1
        }
    }
}
