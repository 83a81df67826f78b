//! Tag lists bound to a mapping.

use std::slice;

use tagmap_tags::{Tag, fandom, fandoms, sort_tags, uniq_tags};

use crate::companions::Companions;
use crate::mapping::Mapping;

/// An ordered list of tags with provenance, bound to the [`Mapping`] whose
/// options it sorts and resolves fandoms with.
#[derive(Clone, Debug)]
pub struct TagList<'m> {
    pub(crate) mapping: &'m Mapping,
    pub(crate) tags: Vec<Tag>,
}

impl<'m> TagList<'m> {
    pub(crate) fn new(mapping: &'m Mapping, tags: Vec<Tag>) -> Self {
        Self { mapping, tags }
    }

    /// The mapping this list belongs to.
    #[must_use]
    pub fn mapping(&self) -> &'m Mapping {
        self.mapping
    }

    /// A new list with the tags matching `predicate`.
    #[must_use]
    pub fn filter<P: FnMut(&Tag) -> bool>(&self, mut predicate: P) -> Self {
        let tags = self.tags.iter().filter(|t| predicate(t)).cloned().collect();
        Self::new(self.mapping, tags)
    }

    /// Keep only the tags matching `predicate`.
    pub fn retain<P: FnMut(&Tag) -> bool>(&mut self, predicate: P) -> &mut Self {
        self.tags.retain(predicate);
        self
    }

    /// Rewrite every tag's text in place.
    ///
    /// A tag whose text comes back unchanged keeps its provenance.
    pub fn mutate<F: FnMut(&str) -> String>(&mut self, mut f: F) -> &mut Self {
        for tag in &mut self.tags {
            let text = f(tag.text());
            if text != tag.text() {
                *tag = Tag::replaced(text);
            }
        }
        self
    }

    /// Replace every tag with zero or more tags.
    ///
    /// Tags are visited from the end backwards.
    pub fn flat_mutate<F: FnMut(&Tag) -> Vec<Tag>>(&mut self, mut f: F) -> &mut Self {
        self.flat_mutate_with_companions(|tag, _| f(tag))
    }

    /// Like [`flat_mutate`](Self::flat_mutate), with the list itself as the
    /// companion pool of conjunctive rules.
    ///
    /// Consumed companions before the cursor are never visited; results
    /// replace the visited tag, or go where it was if it was consumed.
    pub(crate) fn flat_mutate_with_companions<F>(&mut self, mut f: F) -> &mut Self
    where
        F: FnMut(&Tag, &mut Companions<'_>) -> Vec<Tag>,
    {
        let mut index = self.tags.len();
        while index > 0 {
            index -= 1;
            let current = self.tags[index].clone();
            let mut pool = Companions::new(&mut self.tags, index);
            let result = f(&current, &mut pool);
            let (position, removed_current) = pool.finish();
            if removed_current {
                self.tags.splice(position..position, result);
            } else {
                self.tags.splice(position..=position, result);
            }
            index = position;
        }
        self
    }

    /// Sort into canonical order.
    pub fn sort(&mut self) -> &mut Self {
        sort_tags(&mut self.tags, &self.mapping.options().preferred_fandoms);
        self
    }

    /// Deduplicate, collapsing piped fandoms.
    pub fn uniq(&mut self) -> &mut Self {
        self.tags = uniq_tags(&self.tags);
        self
    }

    /// Trim whitespace around every tag, keeping provenance.
    pub fn trim(&mut self) -> &mut Self {
        for tag in &mut self.tags {
            *tag = tag.trimmed();
        }
        self
    }

    /// Texts of tags produced by a rewrite.
    #[must_use]
    pub fn changed(&self) -> Vec<String> {
        self.texts(true)
    }

    /// Texts of tags that came through untouched.
    #[must_use]
    pub fn unchanged(&self) -> Vec<String> {
        self.texts(false)
    }

    fn texts(&self, changed: bool) -> Vec<String> {
        self.tags
            .iter()
            .filter(|t| t.is_changed() == changed)
            .map(|t| t.text().to_owned())
            .collect()
    }

    /// Every tag's text, in order.
    #[must_use]
    pub fn values(&self) -> Vec<String> {
        self.tags.iter().map(|t| t.text().to_owned()).collect()
    }

    #[must_use]
    pub fn into_values(self) -> Vec<String> {
        self.tags.into_iter().map(Tag::into_text).collect()
    }

    /// Primary fandom, honouring the mapping's preferred fandoms.
    #[must_use]
    pub fn fandom(&self) -> Option<String> {
        fandom(&self.tags, &self.mapping.options().preferred_fandoms)
    }

    /// Every distinct fandom name.
    #[must_use]
    pub fn fandoms(&self) -> Vec<String> {
        fandoms(&self.tags)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, Tag> {
        self.tags.iter()
    }

    /// Tags with their provenance.
    #[must_use]
    pub fn entries(&self) -> &[Tag] {
        &self.tags
    }
}

impl<'a> IntoIterator for &'a TagList<'_> {
    type Item = &'a Tag;
    type IntoIter = slice::Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.tags.iter()
    }
}

impl IntoIterator for TagList<'_> {
    type Item = Tag;
    type IntoIter = std::vec::IntoIter<Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.tags.into_iter()
    }
}
