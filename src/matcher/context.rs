//! Transient per-package and per-match state.

use crate::interpolate::CaptureGroups;
use std::collections::HashSet;

/// State that lives for one `process` call.
///
/// Holds the transient flags raised by `addflag` (visible to later rules in
/// the same pass only) and the rulesets of the package's origin repository.
#[derive(Debug, Clone, Default)]
pub struct PackageContext {
    flags: HashSet<String>,
    rulesets: HashSet<String>,
}

impl PackageContext {
    pub fn new<I, S>(rulesets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            flags: HashSet::new(),
            rulesets: rulesets.into_iter().map(Into::into).collect(),
        }
    }

    pub fn set_flag(&mut self, name: &str, value: bool) {
        if value {
            self.flags.insert(name.to_string());
        } else {
            self.flags.remove(name);
        }
    }

    pub fn has_flag(&self, name: &str) -> bool {
        self.flags.contains(name)
    }

    /// Whether any of `names` is set.
    pub fn has_any_flag(&self, names: &HashSet<String>) -> bool {
        !self.flags.is_disjoint(names)
    }

    /// Whether the origin repository belongs to any of `rulesets`.
    pub fn has_any_ruleset(&self, rulesets: &HashSet<String>) -> bool {
        !self.rulesets.is_disjoint(rulesets)
    }
}

/// Capture groups recorded while matching one rule, consumed by the applier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchContext {
    pub name_match: Option<CaptureGroups>,
    pub ver_match: Option<CaptureGroups>,
}
