//! Compiled rule model.
//!
//! A [`Rule`] is the canonical in-memory shape of one rule record after field
//! normalization. Predicates and effects are explicit typed fields; the only
//! state that changes after compilation is the match counter.
//!
//! - [`compile`] - normalization of raw records into rules
//! - [`pattern`] - full-match regexes, pattern unions and substring sets

pub mod compile;
pub mod pattern;

pub use compile::{compile_rule, compile_rules};
pub use pattern::{FullMatchPattern, PatternUnion, SubstringSet};

use crate::package::PackageFlag;
use std::cmp::Ordering;
use std::collections::HashSet;

/// Version comparison operator of a `ver*` predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionOp {
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
    Ne,
}

impl VersionOp {
    /// Whether `package_version <op> reference` holds given their ordering.
    pub fn accepts(self, ordering: Ordering) -> bool {
        match self {
            VersionOp::Gt => ordering == Ordering::Greater,
            VersionOp::Ge => ordering != Ordering::Less,
            VersionOp::Lt => ordering == Ordering::Less,
            VersionOp::Le => ordering != Ordering::Greater,
            VersionOp::Eq => ordering == Ordering::Equal,
            VersionOp::Ne => ordering != Ordering::Equal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionConstraint {
    pub op: VersionOp,
    pub reference: String,
}

/// What `addflavor` appends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlavorSpec {
    /// `addflavor: true` - the current effective name.
    EffectiveName,
    /// One or more templates.
    Templates(Vec<String>),
}

/// Match conditions, evaluated in declaration order by the matcher.
#[derive(Debug, Clone, Default)]
pub struct Predicates {
    pub ruleset: Option<HashSet<String>>,
    pub noruleset: Option<HashSet<String>>,
    pub category: Option<HashSet<String>>,
    pub name: Option<HashSet<String>>,
    pub namepat: Option<FullMatchPattern>,
    pub ver: Option<HashSet<String>>,
    pub verpat: Option<FullMatchPattern>,
    pub verlonger: Option<usize>,
    /// `vergt`, `verge`, `verlt`, `verle`, `vereq`, `verne`, in that order.
    pub version_constraints: Vec<VersionConstraint>,
    pub wwwpat: Option<FullMatchPattern>,
    pub wwwpart: Option<SubstringSet>,
    pub flag: Option<HashSet<String>>,
    pub noflag: Option<HashSet<String>>,
}

/// Changes applied to a matched package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Effects {
    /// Permanent flag writes in application order. Alias effects are
    /// already resolved to the flag they write.
    pub flags: Vec<(PackageFlag, bool)>,
    pub addflavor: Option<FlavorSpec>,
    pub resetflavors: bool,
    pub addflag: Vec<String>,
    pub setname: Option<String>,
    pub setver: Option<String>,
    pub replaceinname: Vec<(String, String)>,
    pub tolowername: bool,
    pub warning: Option<String>,
    pub last: bool,
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub(crate) number: usize,
    pub(crate) matches: u64,
    pub(crate) pretty: String,
    pub(crate) predicates: Predicates,
    pub(crate) effects: Effects,
}

impl Rule {
    /// Position of the rule in load order.
    pub fn number(&self) -> usize {
        self.number
    }

    /// Number of packages this rule has matched so far.
    pub fn matches(&self) -> u64 {
        self.matches
    }

    /// One-line rendering of the rule as it was written.
    pub fn pretty(&self) -> &str {
        &self.pretty
    }

    pub fn predicates(&self) -> &Predicates {
        &self.predicates
    }

    pub fn effects(&self) -> &Effects {
        &self.effects
    }

    pub fn names(&self) -> Option<&HashSet<String>> {
        self.predicates.name.as_ref()
    }

    pub fn namepat(&self) -> Option<&FullMatchPattern> {
        self.predicates.namepat.as_ref()
    }

    /// Whether the rule is restricted by `name` or `namepat`. Rules that are
    /// not can match any package and are never demoted by the optimizer.
    pub fn has_name_condition(&self) -> bool {
        self.predicates.name.is_some() || self.predicates.namepat.is_some()
    }
}
