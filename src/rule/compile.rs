//! Normalization of raw rule records into [`Rule`]s.
//!
//! Raw records are YAML mappings exactly as authored. Normalization coerces
//! scalars to lists and lists to sets, lowercases case-insensitive fields,
//! folds the legacy `family` field into `ruleset`, compiles patterns and
//! resolves flag aliases. Anything with an unexpected shape is rejected
//! here so that matching never has to branch on field types.

use super::{Effects, FlavorSpec, FullMatchPattern, Predicates, Rule, SubstringSet};
use super::{VersionConstraint, VersionOp};
use crate::error::{Result, TransformError};
use crate::interpolate::placeholders;
use crate::package::PackageFlag;
use serde_yaml::{Mapping, Value};
use std::collections::HashSet;

/// Flag effects in the order they are applied. Several historical names
/// write a different flag than their name suggests.
const FLAG_EFFECTS: [(&str, PackageFlag); 15] = [
    ("remove", PackageFlag::Remove),
    ("ignore", PackageFlag::Ignore),
    ("weak_devel", PackageFlag::Ignore),
    ("devel", PackageFlag::Devel),
    ("p_is_patch", PackageFlag::PIsPatch),
    ("any_is_patch", PackageFlag::AnyIsPatch),
    ("outdated", PackageFlag::Outdated),
    ("legacy", PackageFlag::Legacy),
    ("incorrect", PackageFlag::Incorrect),
    ("untrusted", PackageFlag::Untrusted),
    ("noscheme", PackageFlag::Noscheme),
    ("rolling", PackageFlag::Rolling),
    ("snapshot", PackageFlag::Ignore),
    ("successor", PackageFlag::Devel),
    ("generated", PackageFlag::Rolling),
];

const VERSION_CONSTRAINTS: [(&str, VersionOp); 6] = [
    ("vergt", VersionOp::Gt),
    ("verge", VersionOp::Ge),
    ("verlt", VersionOp::Lt),
    ("verle", VersionOp::Le),
    ("vereq", VersionOp::Eq),
    ("verne", VersionOp::Ne),
];

const OTHER_FIELDS: [&str; 22] = [
    "name",
    "namepat",
    "ver",
    "verpat",
    "verlonger",
    "category",
    "family",
    "ruleset",
    "noruleset",
    "wwwpat",
    "wwwpart",
    "flag",
    "noflag",
    "addflavor",
    "resetflavors",
    "addflag",
    "setname",
    "setver",
    "replaceinname",
    "tolowername",
    "warning",
    "last",
];

fn is_known_field(field: &str) -> bool {
    OTHER_FIELDS.contains(&field)
        || VERSION_CONSTRAINTS.iter().any(|(name, _)| *name == field)
        || FLAG_EFFECTS.iter().any(|(name, _)| *name == field)
}

/// Compile an ordered sequence of raw records. Rule numbers are positions.
pub fn compile_rules<I>(records: I) -> Result<Vec<Rule>>
where
    I: IntoIterator<Item = Mapping>,
{
    records
        .into_iter()
        .enumerate()
        .map(|(number, record)| compile_rule(number, &record))
        .collect()
}

/// Compile one raw record into a rule numbered `number`.
pub fn compile_rule(number: usize, record: &Mapping) -> Result<Rule> {
    let raw = RawRule::new(number, record)?;

    let pretty = serde_json::to_string(record)?;
    let predicates = raw.predicates()?;
    let effects = raw.effects()?;

    raw.check_placeholders(&predicates, &effects)?;

    Ok(Rule {
        number,
        matches: 0,
        pretty,
        predicates,
        effects,
    })
}

struct RawRule<'a> {
    number: usize,
    record: &'a Mapping,
}

impl<'a> RawRule<'a> {
    fn new(number: usize, record: &'a Mapping) -> Result<Self> {
        for key in record.keys() {
            match key.as_str() {
                Some(field) if is_known_field(field) => {}
                Some(field) => {
                    return Err(TransformError::UnknownField {
                        rule: number,
                        field: field.to_string(),
                    })
                }
                None => {
                    return Err(TransformError::UnknownField {
                        rule: number,
                        field: format!("{key:?}"),
                    })
                }
            }
        }
        Ok(Self { number, record })
    }

    fn get(&self, field: &str) -> Option<&'a Value> {
        self.record.get(field)
    }

    fn invalid(&self, field: &str, expected: &'static str) -> TransformError {
        TransformError::InvalidField {
            rule: self.number,
            field: field.to_string(),
            expected,
        }
    }

    fn scalar(&self, field: &str, value: &Value) -> Result<String> {
        match value {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            _ => Err(self.invalid(field, "a string")),
        }
    }

    fn string(&self, field: &str) -> Result<Option<String>> {
        self.get(field)
            .map(|value| self.scalar(field, value))
            .transpose()
    }

    fn list(&self, field: &str) -> Result<Option<Vec<String>>> {
        let Some(value) = self.get(field) else {
            return Ok(None);
        };
        let items = match value {
            Value::Sequence(items) => items
                .iter()
                .map(|item| {
                    self.scalar(field, item)
                        .map_err(|_| self.invalid(field, "a string or a list of strings"))
                })
                .collect::<Result<Vec<_>>>()?,
            other => vec![self
                .scalar(field, other)
                .map_err(|_| self.invalid(field, "a string or a list of strings"))?],
        };
        Ok(Some(items))
    }

    fn set(&self, field: &str) -> Result<Option<HashSet<String>>> {
        Ok(self.list(field)?.map(|items| items.into_iter().collect()))
    }

    fn lowercase_set(&self, field: &str) -> Result<Option<HashSet<String>>> {
        Ok(self
            .list(field)?
            .map(|items| items.into_iter().map(|s| s.to_lowercase()).collect()))
    }

    fn boolean(&self, field: &str) -> Result<Option<bool>> {
        match self.get(field) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(_) => Err(self.invalid(field, "a boolean")),
        }
    }

    fn count(&self, field: &str) -> Result<Option<usize>> {
        match self.get(field) {
            None => Ok(None),
            Some(Value::Number(n)) => n
                .as_u64()
                .and_then(|n| usize::try_from(n).ok())
                .map(Some)
                .ok_or_else(|| self.invalid(field, "a non-negative integer")),
            Some(_) => Err(self.invalid(field, "a non-negative integer")),
        }
    }

    fn pattern(&self, field: &'static str, case_insensitive: bool) -> Result<Option<FullMatchPattern>> {
        match self.get(field) {
            None => Ok(None),
            Some(Value::String(source)) => {
                FullMatchPattern::compile(self.number, field, source, case_insensitive).map(Some)
            }
            Some(_) => Err(self.invalid(field, "a regular expression string")),
        }
    }

    fn rulesets(&self) -> Result<Option<HashSet<String>>> {
        match (self.set("ruleset")?, self.set("family")?) {
            (Some(_), Some(_)) => Err(TransformError::DuplicateRuleset { rule: self.number }),
            (ruleset, family) => Ok(ruleset.or(family)),
        }
    }

    fn predicates(&self) -> Result<Predicates> {
        let mut version_constraints = Vec::new();
        for (field, op) in VERSION_CONSTRAINTS {
            if let Some(reference) = self.string(field)? {
                version_constraints.push(VersionConstraint { op, reference });
            }
        }

        Ok(Predicates {
            ruleset: self.rulesets()?,
            noruleset: self.set("noruleset")?,
            category: self.lowercase_set("category")?,
            name: self.set("name")?,
            namepat: self.pattern("namepat", false)?,
            ver: self.set("ver")?,
            verpat: self.pattern("verpat", true)?,
            verlonger: self.count("verlonger")?,
            version_constraints,
            wwwpat: self.pattern("wwwpat", false)?,
            wwwpart: self.list("wwwpart")?.map(SubstringSet::new),
            flag: self.set("flag")?,
            noflag: self.set("noflag")?,
        })
    }

    fn flavor(&self) -> Result<Option<FlavorSpec>> {
        let invalid = || TransformError::InvalidFlavor { rule: self.number };
        match self.get("addflavor") {
            None => Ok(None),
            // any boolean spelling adds the effective name
            Some(Value::Bool(_)) => Ok(Some(FlavorSpec::EffectiveName)),
            Some(Value::String(template)) => Ok(Some(FlavorSpec::Templates(vec![template.clone()]))),
            Some(Value::Sequence(items)) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string).ok_or_else(invalid))
                .collect::<Result<Vec<_>>>()
                .map(|templates| Some(FlavorSpec::Templates(templates))),
            Some(_) => Err(invalid()),
        }
    }

    fn replacements(&self) -> Result<Vec<(String, String)>> {
        match self.get("replaceinname") {
            None => Ok(Vec::new()),
            Some(Value::Mapping(map)) => map
                .iter()
                .map(|(pattern, replacement)| {
                    let expected = "a mapping of strings to strings";
                    let pattern = self
                        .scalar("replaceinname", pattern)
                        .map_err(|_| self.invalid("replaceinname", expected))?;
                    let replacement = self
                        .scalar("replaceinname", replacement)
                        .map_err(|_| self.invalid("replaceinname", expected))?;
                    Ok((pattern, replacement))
                })
                .collect(),
            Some(_) => Err(self.invalid("replaceinname", "a mapping of strings to strings")),
        }
    }

    fn effects(&self) -> Result<Effects> {
        let mut flags = Vec::new();
        for (field, flag) in FLAG_EFFECTS {
            if let Some(value) = self.boolean(field)? {
                flags.push((flag, value));
            }
        }

        Ok(Effects {
            flags,
            addflavor: self.flavor()?,
            resetflavors: self.boolean("resetflavors")?.is_some(),
            addflag: self.list("addflag")?.unwrap_or_default(),
            setname: self.string("setname")?,
            setver: self.string("setver")?,
            replaceinname: self.replacements()?,
            tolowername: self.boolean("tolowername")?.is_some(),
            warning: self.string("warning")?,
            last: self.boolean("last")?.unwrap_or(false),
        })
    }

    /// Templates may only reference groups their pattern defines.
    fn check_placeholders(&self, predicates: &Predicates, effects: &Effects) -> Result<()> {
        if let Some(namepat) = &predicates.namepat {
            if let Some(setname) = &effects.setname {
                self.check_template("setname", setname, namepat)?;
            }
            if let Some(FlavorSpec::Templates(templates)) = &effects.addflavor {
                for template in templates {
                    self.check_template("addflavor", template, namepat)?;
                }
            }
        }
        if let (Some(verpat), Some(setver)) = (&predicates.verpat, &effects.setver) {
            self.check_template("setver", setver, verpat)?;
        }
        Ok(())
    }

    fn check_template(
        &self,
        field: &'static str,
        template: &str,
        pattern: &FullMatchPattern,
    ) -> Result<()> {
        let available = pattern.group_count();
        match placeholders(template).find(|group| *group >= available) {
            Some(group) => Err(TransformError::InvalidPlaceholder {
                rule: self.number,
                field,
                group,
                available,
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(yaml: &str) -> Mapping {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn compile(yaml: &str) -> Result<Rule> {
        compile_rule(0, &record(yaml))
    }

    #[test]
    fn test_scalars_become_sets() {
        let rule = compile("{ name: foo, ver: 1.0, flag: a, ruleset: freebsd }").unwrap();
        let p = rule.predicates();
        assert!(p.name.as_ref().unwrap().contains("foo"));
        assert!(p.ver.as_ref().unwrap().contains("1.0"));
        assert!(p.flag.as_ref().unwrap().contains("a"));
        assert!(p.ruleset.as_ref().unwrap().contains("freebsd"));
        assert_eq!(rule.matches(), 0);
        assert_eq!(rule.number(), 0);
    }

    #[test]
    fn test_lists_are_kept() {
        let rule = compile("{ name: [foo, bar], addflag: [x, y] }").unwrap();
        assert_eq!(rule.names().unwrap().len(), 2);
        assert_eq!(rule.effects().addflag, vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn test_lowercasing() {
        let rule = compile("{ category: [Games, DEVEL], wwwpart: GitHub.com }").unwrap();
        let p = rule.predicates();
        let category = p.category.as_ref().unwrap();
        assert!(category.contains("games"));
        assert!(category.contains("devel"));
        assert_eq!(p.wwwpart.as_ref().unwrap().parts(), &["github.com".to_string()]);
    }

    #[test]
    fn test_family_folds_into_ruleset() {
        let rule = compile("{ family: [debian, ubuntu], ignore: true }").unwrap();
        let ruleset = rule.predicates().ruleset.as_ref().unwrap();
        assert!(ruleset.contains("debian"));
        assert!(ruleset.contains("ubuntu"));
    }

    #[test]
    fn test_family_and_ruleset_conflict() {
        let err = compile_rule(5, &record("{ family: debian, ruleset: debian }")).unwrap_err();
        assert!(matches!(err, TransformError::DuplicateRuleset { rule: 5 }));
    }

    #[test]
    fn test_flag_aliases_resolve_in_order() {
        let rule = compile(
            "{ snapshot: true, weak_devel: false, successor: true, generated: true, remove: true }",
        )
        .unwrap();
        let flags = &rule.effects().flags;
        assert_eq!(flags.len(), 5);
        assert_eq!(flags[0], (PackageFlag::Remove, true));
        assert_eq!(flags[1], (PackageFlag::Ignore, false));
        assert_eq!(flags[2], (PackageFlag::Ignore, true));
        assert_eq!(flags[3], (PackageFlag::Devel, true));
        assert_eq!(flags[4], (PackageFlag::Rolling, true));
    }

    #[test]
    fn test_non_boolean_flag_is_rejected() {
        let err = compile("{ remove: yes please }").unwrap_err();
        assert!(matches!(err, TransformError::InvalidField { ref field, .. } if field == "remove"));
    }

    #[test]
    fn test_addflavor_shapes() {
        let rule = compile("{ name: foo, addflavor: true }").unwrap();
        assert_eq!(rule.effects().addflavor, Some(FlavorSpec::EffectiveName));

        let rule = compile("{ name: foo, addflavor: false }").unwrap();
        assert_eq!(rule.effects().addflavor, Some(FlavorSpec::EffectiveName));

        let rule = compile("{ name: foo, addflavor: qt5 }").unwrap();
        assert_eq!(
            rule.effects().addflavor,
            Some(FlavorSpec::Templates(vec!["qt5".to_string()]))
        );

        let rule = compile("{ name: foo, addflavor: [a, b] }").unwrap();
        assert_eq!(
            rule.effects().addflavor,
            Some(FlavorSpec::Templates(vec!["a".to_string(), "b".to_string()]))
        );

        let err = compile("{ name: foo, addflavor: { a: b } }").unwrap_err();
        assert!(matches!(err, TransformError::InvalidFlavor { rule: 0 }));

        let err = compile("{ name: foo, addflavor: 12 }").unwrap_err();
        assert!(matches!(err, TransformError::InvalidFlavor { .. }));
    }

    #[test]
    fn test_control_effects_act_when_present() {
        let rule = compile("{ name: foo, resetflavors: false, tolowername: false, last: false }").unwrap();
        assert!(rule.effects().resetflavors);
        assert!(rule.effects().tolowername);
        assert!(!rule.effects().last);

        let rule = compile("{ name: foo }").unwrap();
        assert!(!rule.effects().resetflavors);
        assert!(!rule.effects().tolowername);

        let err = compile("{ name: foo, tolowername: yes please }").unwrap_err();
        assert!(matches!(err, TransformError::InvalidField { ref field, .. } if field == "tolowername"));
    }

    #[test]
    fn test_patterns_compile() {
        let rule = compile("{ namepat: \"lib(.*)\", verpat: \"([0-9]+)RC\", wwwpat: \"https://.*\" }")
            .unwrap();
        let p = rule.predicates();
        assert!(p.namepat.as_ref().unwrap().is_match("libfoo"));
        assert!(p.verpat.as_ref().unwrap().is_match("1rc"));
        assert!(p.wwwpat.as_ref().unwrap().is_match("https://example.org"));
        assert!(rule.has_name_condition());
    }

    #[test]
    fn test_multiline_pattern() {
        let rule = compile("namepat: |\n  foo|\n  bar\n").unwrap();
        let namepat = rule.namepat().unwrap();
        assert!(namepat.is_match("foo"));
        assert!(namepat.is_match("bar"));
    }

    #[test]
    fn test_version_constraints_are_ordered() {
        let rule = compile("{ verne: '3', vergt: '1', verle: 2 }").unwrap();
        let ops: Vec<VersionOp> = rule
            .predicates()
            .version_constraints
            .iter()
            .map(|c| c.op)
            .collect();
        assert_eq!(ops, vec![VersionOp::Gt, VersionOp::Le, VersionOp::Ne]);
        assert_eq!(rule.predicates().version_constraints[1].reference, "2");
    }

    #[test]
    fn test_replaceinname_keeps_order() {
        let rule = compile("{ replaceinname: { '_': '-', '--': '-' } }").unwrap();
        assert_eq!(
            rule.effects().replaceinname,
            vec![
                ("_".to_string(), "-".to_string()),
                ("--".to_string(), "-".to_string())
            ]
        );
    }

    #[test]
    fn test_unknown_field() {
        let err = compile("{ nmae: foo }").unwrap_err();
        assert!(matches!(err, TransformError::UnknownField { ref field, .. } if field == "nmae"));
    }

    #[test]
    fn test_verlonger() {
        let rule = compile("{ verlonger: 3 }").unwrap();
        assert_eq!(rule.predicates().verlonger, Some(3));
        assert!(compile("{ verlonger: -1 }").is_err());
        assert!(compile("{ verlonger: many }").is_err());
    }

    #[test]
    fn test_placeholder_validation() {
        assert!(compile("{ namepat: \"lib(.*)\", setname: \"$1\" }").is_ok());
        let err = compile("{ namepat: \"lib(.*)\", setname: \"$2\" }").unwrap_err();
        assert!(matches!(
            err,
            TransformError::InvalidPlaceholder { field: "setname", group: 2, available: 2, .. }
        ));
        let err = compile("{ verpat: \"[0-9]+\", setver: \"$1\" }").unwrap_err();
        assert!(matches!(err, TransformError::InvalidPlaceholder { field: "setver", .. }));
        // without a pattern, placeholders other than $0 are literal text
        assert!(compile("{ name: foo, setname: \"$1\" }").is_ok());
    }

    #[test]
    fn test_pretty_is_one_line_source() {
        let rule = compile("{ name: foo, setname: bar }").unwrap();
        assert_eq!(rule.pretty(), r#"{"name":"foo","setname":"bar"}"#);
    }

    #[test]
    fn test_compile_rules_numbers() {
        let rules = compile_rules(vec![record("{ name: a }"), record("{ name: b }")]).unwrap();
        assert_eq!(rules[0].number(), 0);
        assert_eq!(rules[1].number(), 1);
    }
}
