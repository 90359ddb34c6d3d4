//! `$N` placeholder substitution shared by `setname`, `setver` and `addflavor`.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static DOLLAR_N: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$([0-9]+)").expect("valid placeholder regex"));

/// Owned capture groups of a full-string pattern match.
///
/// Index 0 is the whole match; unmatched optional groups are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureGroups(Vec<Option<String>>);

impl CaptureGroups {
    pub fn from_captures(captures: &Captures<'_>) -> Self {
        Self(
            captures
                .iter()
                .map(|group| group.map(|m| m.as_str().to_string()))
                .collect(),
        )
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).and_then(|group| group.as_deref())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Fill a template.
///
/// With `groups`, every `$N` is replaced by capture group `N` (empty when
/// the group did not participate). Without groups only `$0` is replaced, by
/// `whole`; other placeholders stay literal.
pub fn substitute(template: &str, groups: Option<&CaptureGroups>, whole: &str) -> String {
    match groups {
        Some(groups) => DOLLAR_N
            .replace_all(template, |caps: &Captures<'_>| {
                caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| groups.get(index))
                    .unwrap_or("")
                    .to_string()
            })
            .into_owned(),
        None => template.replace("$0", whole),
    }
}

/// Group numbers referenced by a template, in order of appearance.
pub(crate) fn placeholders(template: &str) -> impl Iterator<Item = usize> + '_ {
    DOLLAR_N
        .captures_iter(template)
        .map(|caps| caps[1].parse::<usize>().unwrap_or(usize::MAX))
}
