//! The translation pipeline.
//!
//! Rule phases run in a fixed order over one [`TagList`]:
//!
//! 1. `pre:*`, `pre:<section>`, `<section>`, `post:<section>`, `*`
//! 2. `pre:<fandom>` for every fandom, then `<fandom>`, then `post:<fandom>`
//! 3. `post:*`
//!
//! Fandom tags are then reconciled (fusion detection, demotion of extra
//! fandoms, promotion of a crossover, the unpiped primary in front),
//! relationship tags are remapped through every phase that exists, and
//! their participants are optionally put in order.

use std::mem;

use tagmap_tags::{
    PreferredFandoms, Tag, TagKind, fandom, fandoms_from_tag, first_alternative_is, uniq_any_case,
};

use crate::list::TagList;
use crate::rules::RuleSet;

impl TagList<'_> {
    /// Translate the list for `section`, then sort and deduplicate it.
    #[must_use]
    pub fn translate(mut self, section: Option<&str>) -> Self {
        self.run_pipeline(section);
        self.sort().uniq();
        self
    }

    fn apply_phase(&mut self, phase: &str) {
        let tags = mem::take(&mut self.tags);
        self.tags = self.mapping.translate_for(phase, tags);
    }

    fn run_pipeline(&mut self, section: Option<&str>) {
        let mapping = self.mapping;
        self.trim();

        let mut phases = vec!["pre:*".to_owned()];
        if let Some(section) = section {
            phases.push(format!("pre:{section}"));
            phases.push(section.to_owned());
            phases.push(format!("post:{section}"));
        }
        phases.push("*".to_owned());
        for phase in &phases {
            self.apply_phase(phase);
        }

        let candidates: Vec<String> = self.fandom().into_iter().chain(self.fandoms()).collect();
        let fandom_list = uniq_any_case(&candidates);
        let fandom_phases: Vec<String> = fandom_list
            .iter()
            .map(|f| format!("pre:{f}"))
            .chain(fandom_list.iter().cloned())
            .chain(fandom_list.iter().map(|f| format!("post:{f}")))
            .collect();
        for phase in &fandom_phases {
            self.apply_phase(phase);
        }
        self.apply_phase("post:*");

        self.uniq();
        let primary = self.reconcile_fandoms();
        self.uniq();
        if let Some(primary) = primary {
            self.lead_with_unpiped_primary(&primary);
        }

        let sections: Vec<&RuleSet> = phases
            .iter()
            .chain(&fandom_phases)
            .map(String::as_str)
            .chain(["post:*"])
            .filter_map(|phase| mapping.rules(phase))
            .collect();
        self.flat_mutate_with_companions(|tag, pool| mapping.remap_ship_tag(tag, &sections, pool));
        if mapping.options().resort_ship_tags {
            self.flat_mutate(|tag| vec![mapping.resort_ship_tag(tag)]);
        }
    }

    /// Settle fusion, crossover and fandom kinds; return the primary fandom.
    fn reconcile_fandoms(&mut self) -> Option<String> {
        let is_fusion = self
            .tags
            .iter()
            .any(|t| t.text() == "Fusion" || t.kind() == TagKind::Fusion);
        let crossover = if is_fusion { "fusion:" } else { "xover:" };
        if is_fusion {
            tracing::debug!("Work is a fusion, marking crossovers as fusions");
            self.mutate(|text| match text.strip_prefix("xover:") {
                Some(body) => format!("fusion:{body}"),
                None => text.to_owned(),
            });
        }

        let tagged: Vec<&Tag> = self
            .tags
            .iter()
            .filter(|t| t.kind() == TagKind::Fandom)
            .collect();
        let tagged_count = tagged.len();
        let mut primary = fandom(&tagged, &PreferredFandoms::default());

        if let Some(body) = &primary
            && tagged_count > 1
        {
            // The primary and its piped variants stay; every other fandom is demoted.
            self.mutate(|text| match text.strip_prefix("fandom:") {
                Some(other) if !first_alternative_is(other, body) => format!("{crossover}{other}"),
                _ => text.to_owned(),
            });
        }

        if primary.is_none()
            && let Some(found) = self.tags.iter().find(|t| t.text().starts_with(crossover))
        {
            let demoted = found.text().to_owned();
            let body = demoted[crossover.len()..].to_owned();
            let promoted = format!("fandom:{body}");
            tracing::debug!(fandom = %body, "Promoted crossover to primary fandom");
            self.mutate(|text| {
                if text == demoted {
                    promoted.clone()
                } else {
                    text.to_owned()
                }
            });
            primary = Some(body);
        }
        primary
    }

    /// Drop crossovers repeating the primary fandom and put its first
    /// alternative in front as a plain `fandom:` tag.
    fn lead_with_unpiped_primary(&mut self, primary: &str) {
        let alternatives = fandoms_from_tag(primary);
        let Some(short) = alternatives.first().filter(|s| !s.is_empty()).cloned() else {
            return;
        };
        let piped = alternatives.len() > 1;
        self.retain(|tag| {
            let in_scope = match tag.kind() {
                TagKind::Xover | TagKind::Fusion => true,
                TagKind::Fandom => piped,
                _ => false,
            };
            !in_scope
                || tag.body() == primary
                || !alternatives
                    .iter()
                    .any(|alt| first_alternative_is(tag.body(), alt))
        });
        self.tags.insert(0, Tag::replaced(format!("fandom:{short}")));
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tagmap_config::{MappingSettings, RawConfig};

    use crate::Mapping;

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

    const CHARACTER_RULES: &str = r#"
[example]
"character:Test" = "character:Fullname"
"character:abc" = "shipname:abc"
"character:zed (yyy)" = "character:zed"
"freeform:xxx & freeform:yyy" = "freeform:xxx yyy"
"#;

    #[test]
    fn test_piped_fandom_gets_unpiped_lead() {
        let mapping = Mapping::compile(&RawConfig::default(), &MappingSettings::default()).unwrap();
        let result = mapping.translate_tags(Some("example"), ["fandom:aa|bb"]);
        assert_eq!(result.values(), ["fandom:aa", "fandom:aa|bb"]);
        assert_eq!(result.unchanged(), ["fandom:aa|bb"]);
        assert_eq!(result.changed(), ["fandom:aa"]);
    }

    #[test]
    fn test_record_mutation() {
        let mapping = mapping(CHARACTER_RULES);
        let result = mapping.translate_tags(
            Some("example"),
            [
                "xover:PRIMARY",
                "character:zed (yyy) (mentioned)",
                "character:test",
                "character:abc",
                "character:test (mentioned)",
                "ship:test (ilu)/def (in passing)",
                "ship:Test/Test (right now)",
                "freeform:xxx",
                "freeform:alone",
                "ship:plain/test",
                "freeform:yyy",
            ],
        );
        assert_eq!(
            result.values(),
            [
                "fandom:PRIMARY",
                "character:Fullname",
                "character:Fullname - mentioned",
                "character:zed - mentioned",
                "freeform:xxx yyy",
                "freeform:alone",
                "ship:def/Fullname - ilu (in passing)",
                "ship:Fullname/Fullname (right now)",
                "ship:Fullname/plain",
                "shipname:abc",
            ]
        );
        assert_eq!(result.unchanged(), ["freeform:alone"]);
        assert_eq!(
            result.changed(),
            [
                "fandom:PRIMARY",
                "character:Fullname",
                "character:Fullname - mentioned",
                "character:zed - mentioned",
                "freeform:xxx yyy",
                "ship:def/Fullname - ilu (in passing)",
                "ship:Fullname/Fullname (right now)",
                "ship:Fullname/plain",
                "shipname:abc",
            ]
        );
    }

    #[test]
    fn test_fusion_crossovers_and_ship_rules() {
        let mut toml = CHARACTER_RULES.to_owned();
        toml.push_str("\"ship:nm\" = \"ship:mmm/nnn\"\n\"fandom:uuu\" = \"fandom:UUU\"\n");
        let mapping = mapping(&toml);
        let result = mapping.translate_tags(
            Some("example"),
            [
                "xover:PRIMARY",
                "xover:uuu",
                "Fusion",
                "character:zed (yyy) (mentioned)",
                "character:test",
                "character:abc",
                "shipname:abc",
                "character:test (mentioned)",
                "ship:test (ilu)/def (in passing)",
                "ship:Test/Test (right now)",
                "freeform:xxx",
                "freeform:alone",
                "ship:plain/test",
                "canon:AU",
                "canon:AU:abc",
                "character:zow!test",
                "freeform:yyy",
                "ship:nm (implied)",
            ],
        );
        assert_eq!(
            result.values(),
            [
                "fandom:PRIMARY",
                "fusion:UUU",
                "canon:AU",
                "canon:AU:abc",
                "character:Fullname",
                "character:Fullname - mentioned",
                "character:zed - mentioned",
                "character:zow!Fullname",
                "freeform:xxx yyy",
                "freeform:alone",
                "ship:def/Fullname - ilu (in passing)",
                "ship:Fullname/Fullname (right now)",
                "ship:Fullname/plain",
                "ship:mmm/nnn (implied)",
                "shipname:abc",
                "Fusion",
            ]
        );
    }

    #[test]
    fn test_resort_ships() {
        let mapping = mapping("[example]\n");
        let result = mapping
            .with_tags([
                "friendship:aaa & bbb",
                "friendship:bbb/ccc",
                "ship:OC/You",
                "ship:aaa/OC",
                "ship:You/bbb",
            ])
            .translate(Some("example"));
        assert_eq!(
            result.values(),
            [
                "friendship:aaa & bbb",
                "friendship:bbb & ccc",
                "ship:aaa/OC",
                "ship:bbb/You",
                "ship:OC/You",
            ]
        );
    }

    #[test]
    fn test_split_ships() {
        let mapping = mapping("[example]\n");
        let result = mapping
            .with_tags([
                "ship:aaa & bbb",
                "ship:aaa/ccc",
                "ship:aaa and ddd",
                "ship:aaa x eee",
                "ship:aaa X fff",
                "friendship:aaa & bbb",
                "friendship:aaa/ccc",
                "friendship:aaa and ddd",
                "friendship:aaa x eee",
                "friendship:aaa X fff",
                "ship:aaa",
                "ship:ccc (zzz) & ddd (xxx)",
                "ship:aaa/bbb and ccc",
            ])
            .translate(Some("example"));
        assert_eq!(
            result.values(),
            [
                "friendship:aaa & bbb",
                "friendship:aaa & ccc",
                "friendship:aaa & ddd",
                "friendship:aaa & eee",
                "friendship:aaa & fff",
                "ship:aaa",
                "ship:aaa/bbb",
                "ship:aaa/bbb and ccc",
                "ship:aaa/ccc",
                "ship:aaa/ddd",
                "ship:aaa/eee",
                "ship:aaa/fff",
                "ship:ccc - zzz/ddd (xxx)",
            ]
        );
    }

    #[test]
    fn test_global_section_remaps_participants() {
        let mapping = mapping(
            r#"
["*"]
"character:Ben Solo | Kylo Ren" = "character:Kylo Ren"
"character:Original Character(s)" = [ "OC" ]
"#,
        );
        let result = mapping
            .with_tags([
                "ship:Rey/Ben Solo | Kylo Ren",
                "friendship:Lucius Malfoy & Original Character(s)",
            ])
            .translate(Some("example"));
        assert_eq!(
            result.values(),
            ["friendship:Lucius Malfoy & OC", "ship:Kylo Ren/Rey"]
        );
    }

    #[test]
    fn test_extra_fandoms_become_crossovers() {
        let mapping = mapping("");
        let result = mapping.translate_tags(None, ["fandom:aaa", "fandom:bbb", "freeform:x"]);
        assert_eq!(result.values(), ["fandom:aaa", "xover:bbb", "freeform:x"]);
        assert_eq!(result.fandom(), Some("aaa".to_owned()));
    }

    #[test]
    fn test_extra_fandoms_become_fusions() {
        let mapping = mapping("");
        let result = mapping.translate_tags(None, ["fandom:aaa", "fandom:bbb", "Fusion"]);
        assert_eq!(result.values(), ["fandom:aaa", "fusion:bbb", "Fusion"]);
    }

    #[test]
    fn test_fandoms_sharing_a_prefix_are_demoted() {
        let mapping = mapping("");
        let result = mapping.translate_tags(
            None,
            ["fandom:Star Wars", "fandom:Star Wars Rebels", "fandom:Harry Potter"],
        );
        assert_eq!(
            result.values(),
            ["fandom:Star Wars", "xover:Harry Potter", "xover:Star Wars Rebels"]
        );

        let result = mapping.translate_tags(None, ["fandom:aa", "fandom:aab"]);
        assert_eq!(result.values(), ["fandom:aa", "xover:aab"]);
    }

    #[test]
    fn test_piped_variant_of_primary_stays_fandom() {
        let mapping = mapping("");
        let result = mapping.translate_tags(None, ["fandom:aa", "fandom:aa|bb", "fandom:cc"]);
        assert_eq!(result.values(), ["fandom:aa", "fandom:aa|bb", "xover:cc"]);
    }

    #[test]
    fn test_crossovers_repeating_unpiped_primary_are_dropped() {
        let mapping = mapping("");
        let result = mapping.translate_tags(None, ["fandom:aa", "xover:aa|cc", "xover:dd"]);
        assert_eq!(result.values(), ["fandom:aa", "xover:dd"]);
    }

    #[test]
    fn test_piped_primary_keeps_its_own_tag() {
        let mapping = mapping("");
        let result = mapping.translate_tags(
            None,
            ["fandom:aa|bb", "fandom:aa|bb|cc", "xover:aa", "xover:dd"],
        );
        assert_eq!(result.values(), ["fandom:aa", "fandom:aa|bb", "xover:dd"]);
        assert_eq!(result.unchanged(), ["fandom:aa|bb", "xover:dd"]);
    }

    #[test]
    fn test_unprefixed_character_pattern_keeps_participant() {
        let mapping = Mapping::from_toml_str(
            r#"
["--config--"]
unprefixed-char-matchers = ["/^Reader( .*)?$/"]

[example]
"character:reader" = "Reader Insert"
"character:someone" = "freeform:someone"
"#,
            &MappingSettings::default(),
        )
        .unwrap();
        let result = mapping.translate_tags(
            Some("example"),
            ["ship:Alice/reader", "friendship:Alice & someone"],
        );
        assert_eq!(result.values(), ["friendship:Alice", "ship:Alice/Reader Insert"]);
    }

    #[test]
    fn test_first_crossover_is_promoted() {
        let mapping = mapping("");
        let result = mapping.translate_tags(None, ["xover:zzz", "xover:PRIMARY"]);
        assert_eq!(result.values(), ["fandom:zzz", "xover:PRIMARY"]);
        assert_eq!(result.changed(), ["fandom:zzz"]);
    }

    #[test]
    fn test_fandom_phases_run_per_fandom() {
        let mapping = mapping(
            r#"
["pre:aaa"]
"freeform:x" = "freeform:pre"
[aaa]
"freeform:pre" = "freeform:mid"
["post:aaa"]
"freeform:mid" = "freeform:post"
["post:*"]
"freeform:post" = "freeform:last"
"#,
        );
        let result = mapping.translate_tags(None, ["fandom:aaa", "freeform:x"]);
        assert_eq!(result.values(), ["fandom:aaa", "freeform:last"]);
    }

    #[test]
    fn test_section_phases_order() {
        let mapping = mapping(
            r#"
["pre:*"]
a = "b"
["pre:example"]
b = "c"
[example]
c = "d"
["post:example"]
d = "e"
["*"]
e = "f"
"#,
        );
        assert_eq!(mapping.translate_tags(Some("example"), ["a"]).values(), ["f"]);
        assert_eq!(mapping.translate_tags(None, ["a"]).values(), ["b"]);
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        let mapping = mapping("[example]\nabc = \"def\"\n");
        let result = mapping.translate_tags(Some("example"), ["  abc ", " ghi"]);
        assert_eq!(result.values(), ["def", "ghi"]);
        assert_eq!(result.unchanged(), ["ghi"]);
    }

    #[test]
    fn test_mapping_is_reusable() {
        let mapping = mapping(CHARACTER_RULES);
        let first = mapping.translate_tags(Some("example"), ["character:test"]).into_values();
        let second = mapping.translate_tags(Some("example"), ["character:test"]).into_values();
        assert_eq!(first, second);
        assert_eq!(first, ["character:Fullname"]);
    }
}
