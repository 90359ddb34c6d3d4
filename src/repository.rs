//! Repository metadata lookup.
//!
//! Rules may be gated on the rulesets an origin repository belongs to
//! (`ruleset` / `noruleset`). The transformer asks a [`RepositoryLookup`]
//! once per processed package.

use std::collections::HashMap;

pub trait RepositoryLookup: Send + Sync {
    /// Rulesets the repository belongs to. Unknown repositories belong to none.
    fn rulesets(&self, repo: &str) -> &[String];
}

/// In-memory repository → rulesets table.
///
/// # Examples
///
/// ```rust
/// use package_transform::{RepositoryLookup, RepositoryMap};
///
/// let repos = RepositoryMap::new()
///     .with_repository("freebsd", ["freebsd", "bsd"])
///     .with_repository("debian_unstable", ["debian"]);
///
/// assert_eq!(repos.rulesets("freebsd"), &["freebsd".to_string(), "bsd".to_string()]);
/// assert!(repos.rulesets("unknown").is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RepositoryMap {
    repositories: HashMap<String, Vec<String>>,
}

impl RepositoryMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_repository<I, S>(mut self, repo: impl Into<String>, rulesets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_repository(repo, rulesets);
        self
    }

    pub fn add_repository<I, S>(&mut self, repo: impl Into<String>, rulesets: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.repositories
            .insert(repo.into(), rulesets.into_iter().map(Into::into).collect());
    }

    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }
}

impl RepositoryLookup for RepositoryMap {
    fn rulesets(&self, repo: &str) -> &[String] {
        self.repositories
            .get(repo)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
