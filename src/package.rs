//! Package record and its permanent flag vocabulary.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Permanent package flags that rules may set or clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageFlag {
    Remove,
    Ignore,
    Devel,
    Outdated,
    Legacy,
    Incorrect,
    Untrusted,
    Noscheme,
    Rolling,
    PIsPatch,
    AnyIsPatch,
}

impl PackageFlag {
    pub const ALL: [PackageFlag; 11] = [
        PackageFlag::Remove,
        PackageFlag::Ignore,
        PackageFlag::Devel,
        PackageFlag::Outdated,
        PackageFlag::Legacy,
        PackageFlag::Incorrect,
        PackageFlag::Untrusted,
        PackageFlag::Noscheme,
        PackageFlag::Rolling,
        PackageFlag::PIsPatch,
        PackageFlag::AnyIsPatch,
    ];

    fn bit(self) -> u16 {
        1 << (self as u16)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PackageFlag::Remove => "remove",
            PackageFlag::Ignore => "ignore",
            PackageFlag::Devel => "devel",
            PackageFlag::Outdated => "outdated",
            PackageFlag::Legacy => "legacy",
            PackageFlag::Incorrect => "incorrect",
            PackageFlag::Untrusted => "untrusted",
            PackageFlag::Noscheme => "noscheme",
            PackageFlag::Rolling => "rolling",
            PackageFlag::PIsPatch => "p_is_patch",
            PackageFlag::AnyIsPatch => "any_is_patch",
        }
    }
}

impl fmt::Display for PackageFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compact set of [`PackageFlag`]s.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageFlags(u16);

impl PackageFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, flag: PackageFlag, value: bool) {
        if value {
            self.0 |= flag.bit();
        } else {
            self.0 &= !flag.bit();
        }
    }

    pub fn contains(&self, flag: PackageFlag) -> bool {
        self.0 & flag.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = PackageFlag> + '_ {
        PackageFlag::ALL
            .into_iter()
            .filter(move |flag| self.contains(*flag))
    }
}

/// A package record harvested from a repository.
///
/// The transformer mutates `effname`, `version`, `origversion`, `verfixed`,
/// `flavors` and `flags`; everything else is read-only input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Package {
    /// Identifier of the origin repository.
    pub repo: String,
    /// Name as reported by the repository.
    pub name: String,
    /// Working name rewritten by rules; defaults to `name` on first processing.
    pub effname: Option<String>,
    pub version: String,
    /// Version before the first `setver` rewrite.
    pub origversion: Option<String>,
    /// Whether the most recent version rewrite changed the version.
    pub verfixed: bool,
    pub category: Option<String>,
    pub homepage: Option<String>,
    pub flavors: Vec<String>,
    pub flags: PackageFlags,
}

impl Package {
    pub fn new(repo: impl Into<String>, name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            name: name.into(),
            version: version.into(),
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_homepage(mut self, homepage: impl Into<String>) -> Self {
        self.homepage = Some(homepage.into());
        self
    }

    /// Current working name, falling back to the original name.
    pub fn effname(&self) -> &str {
        self.effname.as_deref().unwrap_or(&self.name)
    }

    pub fn set_effname(&mut self, effname: String) {
        self.effname = Some(effname);
    }

    pub fn has_flag(&self, flag: PackageFlag) -> bool {
        self.flags.contains(flag)
    }

    pub fn set_flag(&mut self, flag: PackageFlag, value: bool) {
        self.flags.set(flag, value);
    }
}
