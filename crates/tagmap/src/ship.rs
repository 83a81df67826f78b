//! Relationship tags: `ship:a/b` and `friendship:a & b`.
//!
//! Participants are split out, remapped one by one as `character:` tags,
//! rejoined, and optionally put in order.

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;
use tagmap_tags::{Tag, TagKind, locale_compare, uniq_any_case};

use crate::companions::Companions;
use crate::mapping::Mapping;
use crate::rules::RuleSet;

/// A trailing parenthetical comment.
static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"( [(][^()]+[)]|[(][^()]{3,}[)])$").unwrap());

static DASH_COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" - (.*?)$").unwrap());

/// Participant separators, by priority.
static SEPARATORS: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    ["&", "/", " and ", " [Xx] "].map(|sep| Regex::new(sep).unwrap())
});

/// Prefix and joiner of a relationship kind.
fn relationship_parts(kind: TagKind<'_>) -> Option<(&'static str, &'static str)> {
    match kind {
        TagKind::Ship => Some(("ship:", "/")),
        TagKind::Friendship => Some(("friendship:", " & ")),
        _ => None,
    }
}

/// Split a relationship body into trimmed participant names.
///
/// The first separator present wins: `&`, then `/`, then ` and `, then
/// ` x `. A participant with unbalanced parentheses absorbs the following
/// chunk, separator included.
///
/// ```
/// use tagmap::split_people;
///
/// assert_eq!(split_people("aaa & bbb"), ["aaa", "bbb"]);
/// assert_eq!(split_people("ccc (zzz) & ddd (xxx)"), ["ccc (zzz)", "ddd (xxx)"]);
/// assert_eq!(split_people("aaa/bbb and ccc"), ["aaa", "bbb and ccc"]);
/// ```
#[must_use]
pub fn split_people(body: &str) -> Vec<String> {
    let Some(separator) = SEPARATORS.iter().find(|re| re.is_match(body)) else {
        return vec![body.trim().to_owned()];
    };

    let mut people = Vec::new();
    let mut current = String::new();
    let mut start = 0;
    let mut matches = separator.find_iter(body);
    loop {
        let next = matches.next();
        let end = next.map_or(body.len(), |m| m.start());
        current.push_str(&body[start..end]);
        if is_balanced(&current) {
            people.push(current.trim().to_owned());
            current.clear();
        } else if let Some(m) = next {
            current.push_str(m.as_str());
        }
        match next {
            Some(m) => start = m.end(),
            None => break,
        }
    }
    if !current.is_empty() {
        people.push(current.trim().to_owned());
    }
    people
}

fn is_balanced(text: &str) -> bool {
    text.matches('(').count() == text.matches(')').count()
}

/// Split a trailing comment off a relationship tag.
///
/// A dash comment (`ship:abc - note`) counts only when the tag has no `&` or
/// `/`, and is returned in parenthetical form.
fn split_comment(text: &str) -> (&str, Option<String>) {
    if let Some(m) = COMMENT_RE.find(text) {
        return (&text[..m.start()], Some(m.as_str().to_owned()));
    }
    if !text.contains(['&', '/'])
        && let Some(caps) = DASH_COMMENT_RE.captures(text)
        && let Some(whole) = caps.get(0)
    {
        let note = caps.get(1).map_or("", |m| m.as_str());
        return (&text[..whole.start()], Some(format!(" ({note})")));
    }
    (text, None)
}

impl Mapping {
    /// Remap a relationship tag through `sections`.
    ///
    /// The whole tag is looked up first, so a rule may turn it into other
    /// tags entirely. Relationship results then have every participant
    /// remapped. Other tags pass through untouched.
    pub(crate) fn remap_ship_tag(
        &self,
        tag: &Tag,
        sections: &[&RuleSet],
        pool: &mut Companions<'_>,
    ) -> Vec<Tag> {
        if relationship_parts(tag.kind()).is_none() {
            return vec![tag.clone()];
        }
        let (working, comment) = split_comment(tag.text());
        let comment = comment.unwrap_or_default();

        let mut ship = vec![Tag::original(working)];
        for rules in sections {
            let mut next = Vec::new();
            for current in &ship {
                next.extend(self.remap_tag(current, rules, pool));
            }
            ship = uniq_any_case(&next);
        }

        let mut out = Vec::with_capacity(ship.len());
        for result in ship {
            let Some((prefix, joiner)) = relationship_parts(result.kind()) else {
                out.push(Tag::replaced(result.into_text()));
                continue;
            };
            let mut people = Vec::new();
            for person in split_people(result.body()) {
                people.extend(self.remap_people(&person, sections, pool));
            }
            out.push(tag.with_text(format!("{prefix}{}{comment}", people.join(joiner))));
        }
        out
    }

    /// Remap one participant through every section in turn.
    fn remap_people(&self, person: &str, sections: &[&RuleSet], pool: &mut Companions<'_>) -> Vec<String> {
        let mut people = vec![person.to_owned()];
        for rules in sections {
            let mut next = Vec::new();
            for current in &people {
                next.extend(self.remap_person(current, rules, pool));
            }
            people = uniq_any_case(&next);
        }
        people
    }

    /// Remap a participant as a `character:` tag.
    ///
    /// Only `character:` results and unprefixed character matches are kept,
    /// without the prefix.
    fn remap_person(&self, person: &str, rules: &RuleSet, pool: &mut Companions<'_>) -> Vec<String> {
        let tag = Tag::original(format!("character:{person}"));
        self.remap_tag(&tag, rules, pool)
            .into_iter()
            .filter_map(|t| match t.text().strip_prefix("character:") {
                Some(name) => Some(name.to_owned()),
                None if self.options().is_unprefixed_char(t.text()) => Some(t.into_text()),
                None => None,
            })
            .collect()
    }

    /// Put a relationship tag's participants in order.
    ///
    /// Only a parenthetical comment is split off; dash comments stay with
    /// their participant.
    pub(crate) fn resort_ship_tag(&self, tag: &Tag) -> Tag {
        let Some((prefix, joiner)) = relationship_parts(tag.kind()) else {
            return tag.clone();
        };
        let text = tag.text();
        let (working, comment) = match COMMENT_RE.find(text) {
            Some(m) => (&text[..m.start()], m.as_str()),
            None => (text, ""),
        };
        let mut people = split_people(&working[prefix.len()..]);
        people.sort_by(|a, b| self.ship_compare(a, b));
        tag.with_text(format!("{prefix}{}{comment}", people.join(joiner)))
    }

    /// Order two participants, sending sort-to-last names to the end.
    #[must_use]
    pub fn ship_compare(&self, a: &str, b: &str) -> Ordering {
        if a == b {
            return Ordering::Equal;
        }
        let options = self.options();
        match (options.sorts_to_last(a), options.sorts_to_last(b)) {
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            _ => locale_compare(a, b),
        }
    }
}
