//! Predicate evaluation.
//!
//! [`match_rule`] checks one rule against one package in a fixed order,
//! failing fast on the first unmet predicate. Cheap set lookups run before
//! regexes and version comparisons. A successful match bumps the rule's
//! match counter, which feeds the optimizer; a failed one has no side
//! effects.

pub mod context;

pub use context::{MatchContext, PackageContext};

use crate::package::Package;
use crate::rule::Rule;
use crate::version::VersionComparator;
use once_cell::sync::Lazy;
use regex::Regex;

static VERSION_SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new("[^a-zA-Z0-9]+").expect("valid separator regex"));

/// Number of components in a version split on runs of non-alphanumerics.
pub fn version_component_count(version: &str) -> usize {
    VERSION_SEPARATORS.split(version).count()
}

/// Match `rule` against `package`.
///
/// Returns the capture context on success, `None` otherwise.
pub fn match_rule(
    rule: &mut Rule,
    package: &Package,
    package_context: &PackageContext,
    versions: &dyn VersionComparator,
) -> Option<MatchContext> {
    let mut match_context = MatchContext::default();
    let p = &rule.predicates;

    if let Some(rulesets) = &p.ruleset {
        if !package_context.has_any_ruleset(rulesets) {
            return None;
        }
    }

    if let Some(rulesets) = &p.noruleset {
        if package_context.has_any_ruleset(rulesets) {
            return None;
        }
    }

    if let Some(categories) = &p.category {
        let category = package.category.as_deref().filter(|c| !c.is_empty())?;
        if !categories.contains(&category.to_lowercase()) {
            return None;
        }
    }

    let effname = package.effname();

    if let Some(names) = &p.name {
        if !names.contains(effname) {
            return None;
        }
    }

    if let Some(namepat) = &p.namepat {
        match_context.name_match = Some(namepat.captures(effname)?);
    }

    if let Some(versions_set) = &p.ver {
        if !versions_set.contains(&package.version) {
            return None;
        }
    }

    if let Some(verpat) = &p.verpat {
        match_context.ver_match = Some(verpat.captures(&package.version.to_lowercase())?);
    }

    if let Some(threshold) = p.verlonger {
        if version_component_count(&package.version) <= threshold {
            return None;
        }
    }

    for constraint in &p.version_constraints {
        let ordering = versions.compare(&package.version, &constraint.reference);
        if !constraint.op.accepts(ordering) {
            return None;
        }
    }

    if let Some(wwwpat) = &p.wwwpat {
        let homepage = package.homepage.as_deref().filter(|h| !h.is_empty())?;
        if !wwwpat.is_match(homepage) {
            return None;
        }
    }

    if let Some(wwwpart) = &p.wwwpart {
        let homepage = package.homepage.as_deref().filter(|h| !h.is_empty())?;
        if !wwwpart.matches(homepage) {
            return None;
        }
    }

    if let Some(flags) = &p.flag {
        if !package_context.has_any_flag(flags) {
            return None;
        }
    }

    if let Some(flags) = &p.noflag {
        if package_context.has_any_flag(flags) {
            return None;
        }
    }

    rule.matches += 1;

    Some(match_context)
}
