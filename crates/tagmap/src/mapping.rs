//! The compiled configuration and single-tag remapping.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tagmap_config::{ConfigError, MappingSettings, Options, RawConfig};
use tagmap_tags::{Tag, TagKind, fandom, tag_body, uniq_tags};

use crate::companions::Companions;
use crate::list::TagList;
use crate::rules::RuleSet;

/// `character:[path!]*name[ (comment)| - comment]`
static CHARACTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^character:((?:[^!]+!)*)([^!]+?)(?: ?[(]([^)]{2,})[)]| - (.*))?$").unwrap()
});

/// Compiled tag mapping: rule sets by section plus resolved options.
///
/// Read-only once built; one mapping serves any number of translations.
#[derive(Clone, Debug)]
pub struct Mapping {
    sitemap: HashMap<String, RuleSet>,
    options: Options,
}

impl Mapping {
    /// Compile a raw configuration.
    ///
    /// `settings` take precedence over the configuration's options block.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Pattern` if a rule key or matcher pattern does
    /// not compile. Nothing is built in that case.
    pub fn compile(config: &RawConfig, settings: &MappingSettings) -> Result<Self, ConfigError> {
        let mut raw_options = config.options().clone();
        raw_options.apply_settings(settings);
        let options = Options::resolve(&raw_options)?;

        let mut sitemap = HashMap::with_capacity(config.sections().len());
        for section in config.sections() {
            sitemap.insert(section.name.clone(), RuleSet::compile(section)?);
        }

        tracing::debug!(sections = sitemap.len(), "Compiled tag mapping");
        Ok(Self { sitemap, options })
    }

    /// Parse and compile a TOML configuration.
    pub fn from_toml_str(content: &str, settings: &MappingSettings) -> Result<Self, ConfigError> {
        Self::compile(&RawConfig::from_toml_str(content)?, settings)
    }

    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Rules of a section, if the configuration has it.
    #[must_use]
    pub fn rules(&self, section: &str) -> Option<&RuleSet> {
        self.sitemap.get(section)
    }

    /// Wrap tags in a list bound to this mapping.
    pub fn with_tags<I, T>(&self, tags: I) -> TagList<'_>
    where
        I: IntoIterator<Item = T>,
        T: Into<Tag>,
    {
        TagList::new(self, tags.into_iter().map(Into::into).collect())
    }

    /// Translate tags for `section` (or for no particular section).
    pub fn translate_tags<I, T>(&self, section: Option<&str>, tags: I) -> TagList<'_>
    where
        I: IntoIterator<Item = T>,
        T: Into<Tag>,
    {
        self.with_tags(tags).translate(section)
    }

    #[must_use]
    pub fn uniq_tags<T: AsRef<str> + Clone>(&self, tags: &[T]) -> Vec<T> {
        uniq_tags(tags)
    }

    /// Primary fandom of `tags`, honouring the preferred fandoms.
    #[must_use]
    pub fn fandom<T: AsRef<str>>(&self, tags: &[T]) -> Option<String> {
        fandom(tags, &self.options.preferred_fandoms)
    }

    /// Run one section's rules over every tag.
    ///
    /// Each tag goes through the pattern replacers, then every result is
    /// looked up in the exact-match table. The incoming list doubles as the
    /// companion pool, so consumed companions are never visited.
    pub(crate) fn translate_for(&self, section: &str, mut tags: Vec<Tag>) -> Vec<Tag> {
        let Some(rules) = self.sitemap.get(section) else {
            return tags;
        };
        tracing::trace!(section, tags = tags.len(), "Applying rule phase");

        let mut out = Vec::with_capacity(tags.len());
        let mut position = 0;
        while position < tags.len() {
            let expanded = rules.apply_replacers(&tags[position]);
            let mut pool = Companions::new(&mut tags, position);
            for tag in &expanded {
                out.extend(self.remap_tag(tag, rules, &mut pool));
            }
            position = pool.next_position();
        }
        out
    }

    /// Look one tag up in a rule set.
    ///
    /// Fandom-like tags are looked up as `fandom:<body>` and keep their own
    /// kind in the replacements. With ship-safe character comments enabled,
    /// character paths and comments survive the lookup. Without a matching
    /// rule the tag is returned as is.
    pub(crate) fn remap_tag(&self, tag: &Tag, rules: &RuleSet, pool: &mut Companions<'_>) -> Vec<Tag> {
        let lower = tag.text().to_lowercase();

        let kind = TagKind::of(&lower);
        if kind.is_fandom_like() {
            let key = format!("fandom:{}", tag_body(&lower));
            if let Some(replacements) = rules.lookup(&key, pool) {
                let prefix = lower.split_once(':').map_or("fandom", |(k, _)| k);
                return replacements
                    .iter()
                    .map(|r| match r.strip_prefix("fandom:") {
                        Some(body) => Tag::replaced(format!("{prefix}:{body}")),
                        None => Tag::replaced(r.as_str()),
                    })
                    .collect();
            }
        }

        if self.options.make_char_comments_ship_safe
            && let Some(caps) = CHARACTER_RE.captures(tag.text())
        {
            let path = caps.get(1).map_or("", |m| m.as_str());
            let name = caps.get(2).map_or("", |m| m.as_str());
            let suffix = caps
                .get(3)
                .or_else(|| caps.get(4))
                .filter(|m| !m.as_str().is_empty())
                .map(|m| format!(" - {}", m.as_str()))
                .unwrap_or_default();

            let key = format!("character:{}", name.to_lowercase());
            if let Some(replacements) = rules.lookup(&key, pool) {
                return replacements
                    .iter()
                    .map(|r| match r.strip_prefix("character:") {
                        Some(rest) => Tag::replaced(format!("character:{path}{rest}{suffix}")),
                        None => Tag::replaced(r.as_str()),
                    })
                    .collect();
            }
            if let Some(replacements) = rules.lookup(&lower, pool) {
                return replacements.iter().map(|r| Tag::replaced(r.as_str())).collect();
            }
            return vec![tag.with_text(format!("character:{path}{name}{suffix}"))];
        }

        match rules.lookup(&lower, pool) {
            Some(replacements) => replacements.iter().map(|r| Tag::replaced(r.as_str())).collect(),
            None => vec![tag.clone()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    static_assertions::assert_impl_all!(Mapping: Send, Sync);

    fn settings() -> MappingSettings {
        MappingSettings {
            preferred_fandoms: Some(vec!["PRIMARY".to_owned()]),
            resort_ship_tags: Some(true),
            ..Default::default()
        }
    }

    fn mapping(toml: &str) -> Mapping {
        Mapping::from_toml_str(toml, &settings()).unwrap()
    }

    fn translate_for(mapping: &Mapping, section: &str, tags: &[&str]) -> Vec<String> {
        let tags = tags.iter().map(|t| Tag::original(*t)).collect();
        mapping
            .translate_for(section, tags)
            .into_iter()
            .map(Tag::into_text)
            .collect()
    }

    #[test]
    fn test_translate_for_rules_and_replacers() {
        let mapping = mapping(
            r#"
[example]
abc = "def"
ghi = ["aaa", "bbb"]
"/zzz/" = "ZZZ"
'/^cc(\w+).+/' = ["!$1!", "$&"]
"#,
        );
        let out = translate_for(
            &mapping,
            "example",
            &["abc", "ghi", "thizzz izzz a test", "ccYUP hmm"],
        );
        assert_eq!(
            out,
            ["def", "aaa", "bbb", "thiZZZ iZZZ a test", "!YUP!", "ccYUP hmm"]
        );
    }

    #[test]
    fn test_translate_for_missing_section_is_identity() {
        let mapping = mapping("");
        assert_eq!(translate_for(&mapping, "nowhere", &["abc"]), ["abc"]);
    }

    #[test]
    fn test_translate_for_consumes_companion() {
        let mapping = mapping(
            r#"
[example]
"freeform:xxx & freeform:yyy" = "freeform:xxx yyy"
"#,
        );
        let out = translate_for(
            &mapping,
            "example",
            &["freeform:xxx", "freeform:alone", "freeform:yyy"],
        );
        assert_eq!(out, ["freeform:xxx yyy", "freeform:alone"]);
    }

    #[test]
    fn test_translate_for_companion_after_cursor() {
        let mapping = mapping(
            r#"
[example]
"freeform:xxx & freeform:yyy" = "freeform:xxx yyy"
"#,
        );
        // `yyy` is seen first and consumes `xxx` further on.
        let out = translate_for(&mapping, "example", &["freeform:yyy", "a", "freeform:xxx"]);
        assert_eq!(out, ["freeform:xxx yyy", "a"]);
    }

    #[test]
    fn test_translate_for_companion_before_cursor() {
        let mapping = mapping(
            r#"
[example]
"/^a:y$/" = "b:y"
"a:x & a:y" = "z"
"#,
        );
        // `a:y` is already rewritten when `a:x` consumes it; `c` is still visited.
        let out = translate_for(&mapping, "example", &["a:y", "a:x", "c"]);
        assert_eq!(out, ["b:y", "z", "c"]);
    }

    #[test]
    fn test_empty_replacement_deletes() {
        let mapping = mapping("[example]\n\"freeform:gone\" = []\n");
        assert_eq!(translate_for(&mapping, "example", &["freeform:gone", "x"]), ["x"]);
    }

    #[test]
    fn test_fandom_rule_keeps_kind() {
        let mapping = mapping("[example]\n\"fandom:uuu\" = \"fandom:UUU\"\n");
        let out = translate_for(&mapping, "example", &["xover:uuu", "fusion:UUU", "fandom:uuu"]);
        assert_eq!(out, ["xover:UUU", "fusion:UUU", "fandom:UUU"]);
    }

    #[test]
    fn test_character_path_and_comment_survive() {
        let mapping = mapping(
            r#"
[example]
"character:Test" = "character:Fullname"
"character:zed (yyy)" = "character:zed"
"character:abc" = "shipname:abc"
"#,
        );
        let out = translate_for(
            &mapping,
            "example",
            &[
                "character:test (mentioned)",
                "character:zow!test",
                "character:zed (yyy) (mentioned)",
                "character:abc - cameo",
            ],
        );
        assert_eq!(
            out,
            [
                "character:Fullname - mentioned",
                "character:zow!Fullname",
                "character:zed - mentioned",
                "shipname:abc",
            ]
        );
    }

    #[test]
    fn test_character_without_rule_is_normalised() {
        let mapping = mapping("[example]\n");
        let tags = vec![
            Tag::original("character:ccc (zzz)"),
            Tag::original("character:plain"),
        ];
        let out = mapping.translate_for("example", tags);
        assert_eq!(out[0].text(), "character:ccc - zzz");
        assert!(out[0].is_changed());
        assert_eq!(out[1].text(), "character:plain");
        assert!(!out[1].is_changed());
    }

    #[test]
    fn test_character_comments_untouched_when_not_ship_safe() {
        let settings = MappingSettings {
            make_char_comments_ship_safe: Some(false),
            ..Default::default()
        };
        let mapping =
            Mapping::from_toml_str("[example]\n\"character:test\" = \"character:X\"\n", &settings)
                .unwrap();
        let out: Vec<String> = mapping
            .translate_for("example", vec![Tag::original("character:test (mentioned)")])
            .into_iter()
            .map(Tag::into_text)
            .collect();
        assert_eq!(out, ["character:test (mentioned)"]);
    }

    #[test]
    fn test_settings_override_options_block() {
        let mapping = mapping(
            r#"
["--config--"]
preferred-fandoms = ["Other"]
"#,
        );
        assert!(mapping.options().preferred_fandoms.contains("PRIMARY"));
        assert!(!mapping.options().preferred_fandoms.contains("Other"));
        assert!(mapping.options().make_char_comments_ship_safe);
    }

    #[test]
    fn test_bad_pattern_builds_nothing() {
        let err = Mapping::from_toml_str("[example]\n\"/(/\" = \"x\"\n", &settings()).unwrap_err();
        assert!(matches!(err, ConfigError::Pattern { .. }));
    }

    #[test]
    fn test_fandom_uses_preferred() {
        let mapping = mapping("");
        assert_eq!(
            mapping.fandom(&["fandom:xyz", "xover:PRIMARY|abc"]),
            Some("PRIMARY|abc".to_owned())
        );
    }

    #[test]
    fn test_rules_lookup() {
        let mapping = mapping("[example]\nabc = \"def\"\n");
        assert!(mapping.rules("example").is_some());
        assert!(mapping.rules("other").is_none());
    }
}
