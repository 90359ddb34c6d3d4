//! Effect application.

use crate::interpolate::substitute;
use crate::matcher::{MatchContext, PackageContext};
use crate::package::Package;
use crate::rule::{FlavorSpec, Rule};
use tracing::warn;

/// Whether rule processing continues for the current package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleApplyResult {
    Continue,
    Stop,
}

/// Apply the effects of a matched `rule` to `package`.
///
/// Effects run in a fixed order: permanent flags, `addflavor`,
/// `resetflavors`, `addflag`, `setname`, `setver`, `replaceinname`,
/// `tolowername`, `warning`. `last` is honored after everything else.
pub fn apply_rule(
    rule: &Rule,
    package: &mut Package,
    package_context: &mut PackageContext,
    match_context: &MatchContext,
) -> RuleApplyResult {
    let effects = rule.effects();

    for &(flag, value) in &effects.flags {
        package.set_flag(flag, value);
    }

    if let Some(spec) = &effects.addflavor {
        let effname = package.effname().to_string();
        let flavors: Vec<String> = match spec {
            FlavorSpec::EffectiveName => vec![effname],
            FlavorSpec::Templates(templates) => templates
                .iter()
                .map(|template| substitute(template, match_context.name_match.as_ref(), &effname))
                .collect(),
        };
        package.flavors.extend(
            flavors
                .iter()
                .map(|flavor| flavor.trim_matches('-'))
                .filter(|flavor| !flavor.is_empty())
                .map(str::to_string),
        );
    }

    if effects.resetflavors {
        package.flavors.clear();
    }

    for flag in &effects.addflag {
        package_context.set_flag(flag, true);
    }

    if let Some(setname) = &effects.setname {
        let effname = substitute(setname, match_context.name_match.as_ref(), package.effname());
        package.set_effname(effname);
    }

    if let Some(setver) = &effects.setver {
        let version = substitute(setver, match_context.ver_match.as_ref(), &package.version);
        if package.origversion.is_none() {
            package.origversion = Some(package.version.clone());
        }
        package.verfixed = version != package.version;
        package.version = version;
    }

    if !effects.replaceinname.is_empty() {
        let mut effname = package.effname().to_string();
        for (pattern, replacement) in &effects.replaceinname {
            effname = effname.replace(pattern.as_str(), replacement);
        }
        package.set_effname(effname);
    }

    if effects.tolowername {
        let effname = package.effname().to_lowercase();
        package.set_effname(effname);
    }

    if let Some(warning) = &effects.warning {
        warn!(
            package = %package.name,
            repo = %package.repo,
            rule = rule.number(),
            "rule warning: {warning}"
        );
    }

    if effects.last {
        RuleApplyResult::Stop
    } else {
        RuleApplyResult::Continue
    }
}
