//! The package transformer: rule set, block index and processing loop.

use crate::apply::{apply_rule, RuleApplyResult};
use crate::block::{partition_rules, BlockCursor, RuleBlock};
use crate::config::TransformerConfig;
use crate::error::Result;
use crate::matcher::{match_rule, PackageContext};
use crate::optimizer::BlockOptimizer;
use crate::package::Package;
use crate::repository::{RepositoryLookup, RepositoryMap};
use crate::rule::{compile_rules, Rule};
use crate::version::{StandardVersionComparator, VersionComparator};
use serde_yaml::Mapping;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Block index statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformerStats {
    pub rule_count: usize,
    pub static_blocks: usize,
    pub active_blocks: usize,
    pub covering_blocks: usize,
    pub packages_processed: u64,
}

/// Applies a compiled rule set to packages.
///
/// Rules are grouped into blocks once at construction (the static list).
/// The list actually walked for each package (the active list) starts out
/// identical and is rebuilt by the optimizer at the configured milestones.
pub struct PackageTransformer {
    rules: Vec<Rule>,
    static_blocks: Vec<Arc<RuleBlock>>,
    active_blocks: Vec<Arc<RuleBlock>>,
    repositories: Arc<dyn RepositoryLookup>,
    versions: Arc<dyn VersionComparator>,
    config: TransformerConfig,
    packages_processed: u64,
}

impl PackageTransformer {
    /// Compile `records` with the default repository map, version
    /// comparator and configuration.
    pub fn new(records: Vec<Mapping>) -> Result<Self> {
        Self::builder().build(records)
    }

    pub fn builder() -> PackageTransformerBuilder {
        PackageTransformerBuilder::new()
    }

    fn from_rules(
        rules: Vec<Rule>,
        repositories: Arc<dyn RepositoryLookup>,
        versions: Arc<dyn VersionComparator>,
        config: TransformerConfig,
    ) -> Result<Self> {
        let static_blocks = partition_rules(&rules, &config)?;
        let active_blocks = static_blocks.clone();

        info!(
            rules = rules.len(),
            blocks = static_blocks.len(),
            "package transformer ready"
        );

        Ok(Self {
            rules,
            static_blocks,
            active_blocks,
            repositories,
            versions,
            config,
            packages_processed: 0,
        })
    }

    /// Run every applicable rule on `package`.
    ///
    /// Sets `effname` from `name` if it is unset. Re-optimizes the block index
    /// first when the processed count hits a milestone; if that rebuild
    /// fails the previous active blocks stay in use.
    pub fn process(&mut self, package: &mut Package) {
        self.packages_processed += 1;
        if self.config.is_milestone(self.packages_processed) {
            if let Err(err) = self.optimize() {
                warn!(
                    processed = self.packages_processed,
                    error = %err,
                    "block re-optimization failed"
                );
            }
        }

        if package.effname.is_none() {
            package.effname = Some(package.name.clone());
        }

        let mut package_context =
            PackageContext::new(self.repositories.rulesets(&package.repo).iter().cloned());

        let Self {
            rules,
            active_blocks,
            versions,
            ..
        } = self;

        for block in active_blocks.iter() {
            let mut cursor = BlockCursor::default();
            while let Some(number) = block.next_candidate(package.effname(), &mut cursor) {
                let rule = &mut rules[number];
                let Some(match_context) =
                    match_rule(rule, package, &package_context, &**versions)
                else {
                    continue;
                };

                if apply_rule(rule, package, &mut package_context, &match_context)
                    == RuleApplyResult::Stop
                {
                    debug!(package = %package.name, rule = number, "stopped by last rule");
                    return;
                }
            }
        }
    }

    /// Rebuild the active block list from current match counts.
    pub fn optimize(&mut self) -> Result<()> {
        self.active_blocks = BlockOptimizer::new(&self.config).optimize(
            &self.static_blocks,
            &self.rules,
            self.packages_processed,
        )?;
        Ok(())
    }

    /// Source of every rule that has not matched any package yet.
    pub fn unmatched_rules(&self) -> Vec<&str> {
        self.rules
            .iter()
            .filter(|rule| rule.matches() == 0)
            .map(Rule::pretty)
            .collect()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn packages_processed(&self) -> u64 {
        self.packages_processed
    }

    pub fn config(&self) -> &TransformerConfig {
        &self.config
    }

    pub fn stats(&self) -> TransformerStats {
        TransformerStats {
            rule_count: self.rules.len(),
            static_blocks: self.static_blocks.len(),
            active_blocks: self.active_blocks.len(),
            covering_blocks: self.active_blocks.iter().filter(|b| b.is_covering()).count(),
            packages_processed: self.packages_processed,
        }
    }
}

/// Builder for [`PackageTransformer`].
pub struct PackageTransformerBuilder {
    repositories: Arc<dyn RepositoryLookup>,
    versions: Arc<dyn VersionComparator>,
    config: TransformerConfig,
}

impl PackageTransformerBuilder {
    pub fn new() -> Self {
        Self {
            repositories: Arc::new(RepositoryMap::new()),
            versions: Arc::new(StandardVersionComparator),
            config: TransformerConfig::default(),
        }
    }

    /// Source of ruleset membership for `ruleset` / `noruleset`.
    pub fn with_repositories(mut self, repositories: impl RepositoryLookup + 'static) -> Self {
        self.repositories = Arc::new(repositories);
        self
    }

    /// Comparator for the `ver*` ordering predicates.
    pub fn with_version_comparator(mut self, versions: impl VersionComparator + 'static) -> Self {
        self.versions = Arc::new(versions);
        self
    }

    pub fn with_config(mut self, config: TransformerConfig) -> Self {
        self.config = config;
        self
    }

    /// Compile `records` in order and build the transformer.
    pub fn build(self, records: Vec<Mapping>) -> Result<PackageTransformer> {
        let rules = compile_rules(records)?;
        PackageTransformer::from_rules(rules, self.repositories, self.versions, self.config)
    }
}

impl Default for PackageTransformerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
