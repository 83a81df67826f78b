//! Compiled rule tables.
//!
//! A section's rule table compiles into a [`RuleSet`]: an exact-match table
//! keyed by lowercase tag text, plus the `/pattern/` replacers in the order
//! they were written.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tagmap_config::{Case, ConfigError, Matcher, RawSection};
use tagmap_tags::Tag;

use crate::companions::Companions;
use crate::template::Template;

/// A key written as `kind:a & kind:b`.
static CONJUNCTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+:.*\s+&\s+[A-Za-z0-9_]+:").unwrap());

static CONJUNCTION_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+&\s+").unwrap());

/// One exact-match rule.
#[derive(Clone, Debug)]
pub struct Rule {
    companions: Vec<Matcher>,
    replacements: Vec<String>,
}

impl Rule {
    /// Tags that must also be present for the rule to fire.
    #[must_use]
    pub fn companions(&self) -> &[Matcher] {
        &self.companions
    }

    /// Replacement tags. An empty list deletes the matched tag.
    #[must_use]
    pub fn replacements(&self) -> &[String] {
        &self.replacements
    }

    /// True if the rule came from a `kind:a & kind:b` key.
    #[must_use]
    pub fn is_conjunctive(&self) -> bool {
        !self.companions.is_empty()
    }
}

/// A `/pattern/` rule applied to every tag of a phase.
#[derive(Clone, Debug)]
pub struct Replacer {
    pattern: Regex,
    templates: Vec<Template>,
}

impl Replacer {
    fn new(pattern: Regex, replacements: &[String]) -> Self {
        let templates = replacements
            .iter()
            .map(|r| Template::parse(r, &pattern))
            .collect();
        Self { pattern, templates }
    }

    #[must_use]
    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    #[must_use]
    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    /// Rewrite `tags` once per template, template by template.
    ///
    /// Tags the pattern does not match are carried over unchanged.
    #[must_use]
    pub fn apply(&self, tags: &[Tag]) -> Vec<Tag> {
        let mut out = Vec::with_capacity(tags.len() * self.templates.len());
        for template in &self.templates {
            for tag in tags {
                if self.pattern.is_match(tag.text()) {
                    out.push(Tag::replaced(template.replace_all(&self.pattern, tag.text())));
                } else {
                    out.push(tag.clone());
                }
            }
        }
        out
    }
}

/// Compiled rules of one section.
#[derive(Clone, Debug, Default)]
pub struct RuleSet {
    exact: HashMap<String, Vec<Rule>>,
    replacers: Vec<Replacer>,
}

impl RuleSet {
    /// Compile one section's rule table.
    ///
    /// Conjunctive rules for a key are tried before plain ones: they are
    /// prepended, plain rules are appended.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Pattern` if a `/pattern/` key does not compile.
    pub fn compile(section: &RawSection) -> Result<Self, ConfigError> {
        let mut rules = Self::default();
        for raw in &section.rules {
            if let Matcher::Pattern(pattern) = Matcher::parse(&raw.key)? {
                rules.replacers.push(Replacer::new(pattern, &raw.replacements));
                continue;
            }

            let key = raw.key.to_lowercase();
            if CONJUNCTION_RE.is_match(&raw.key) {
                let operands: Vec<&str> = CONJUNCTION_SPLIT_RE.split(&key).collect();
                for (index, operand) in operands.iter().enumerate() {
                    let companions = operands
                        .iter()
                        .enumerate()
                        .filter(|(other, _)| *other != index)
                        .map(|(_, other)| Matcher::literal(other, Case::Insensitive))
                        .collect();
                    let rule = Rule {
                        companions,
                        replacements: raw.replacements.clone(),
                    };
                    rules
                        .exact
                        .entry((*operand).to_owned())
                        .or_default()
                        .insert(0, rule);
                }
            } else {
                rules.exact.entry(key).or_default().push(Rule {
                    companions: Vec::new(),
                    replacements: raw.replacements.clone(),
                });
            }
        }

        tracing::debug!(
            section = %section.name,
            keys = rules.exact.len(),
            replacers = rules.replacers.len(),
            "Compiled rule section"
        );
        Ok(rules)
    }

    /// Rules registered for a lowercase key, in the order they are tried.
    #[must_use]
    pub fn rules_for(&self, key: &str) -> &[Rule] {
        self.exact.get(key).map_or(&[], Vec::as_slice)
    }

    /// Pattern replacers in declaration order.
    #[must_use]
    pub fn replacers(&self) -> &[Replacer] {
        &self.replacers
    }

    /// True if the section has no rules at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.replacers.is_empty()
    }

    /// Find the replacements for a lowercase key.
    ///
    /// A conjunctive rule fires only if all its companions are in the pool,
    /// and consumes them when it does.
    pub(crate) fn lookup(&self, key: &str, pool: &mut Companions<'_>) -> Option<&[String]> {
        self.rules_for(key)
            .iter()
            .find(|rule| !rule.is_conjunctive() || pool.consume(&rule.companions))
            .map(|rule| rule.replacements.as_slice())
    }

    /// Run every replacer that matches over one tag.
    ///
    /// A replacer is skipped unless it matches one of the tags produced so
    /// far; each one that runs sees the previous one's output.
    pub(crate) fn apply_replacers(&self, tag: &Tag) -> Vec<Tag> {
        let mut current = vec![tag.clone()];
        for replacer in &self.replacers {
            if current.iter().any(|t| replacer.pattern.is_match(t.text())) {
                current = replacer.apply(&current);
            }
        }
        current
    }
}
