//! Adaptive block re-optimization.

use crate::block::RuleBlock;
use crate::config::TransformerConfig;
use crate::error::{Result, TransformError};
use crate::rule::Rule;
use std::sync::Arc;
use tracing::{debug, warn};

/// Rebuilds the active block list from the static partition using the
/// current per-rule match counts.
pub struct BlockOptimizer<'a> {
    config: &'a TransformerConfig,
}

impl<'a> BlockOptimizer<'a> {
    pub fn new(config: &'a TransformerConfig) -> Self {
        Self { config }
    }

    /// Compute a new active block list after `processed` packages.
    ///
    /// Blocks stay as they are if they contain a rule without a name
    /// condition, or if their busiest rule reached the low-frequency
    /// threshold. Runs of other blocks are merged into covering blocks.
    pub fn optimize(
        &self,
        static_blocks: &[Arc<RuleBlock>],
        rules: &[Rule],
        processed: u64,
    ) -> Result<Vec<Arc<RuleBlock>>> {
        let threshold = processed as f64 * self.config.lowfreq_threshold;

        let mut active = Vec::with_capacity(static_blocks.len());
        let mut cold: Vec<Arc<RuleBlock>> = Vec::new();
        let mut merged = 0;

        for block in static_blocks {
            if self.is_hot(block, rules, threshold) {
                merged += self.flush(&mut cold, &mut active, rules)?;
                active.push(Arc::clone(block));
            } else {
                cold.push(Arc::clone(block));
            }
        }
        merged += self.flush(&mut cold, &mut active, rules)?;

        debug!(
            processed,
            static_blocks = static_blocks.len(),
            active_blocks = active.len(),
            merged_blocks = merged,
            "rebuilt active rule blocks"
        );

        Ok(active)
    }

    fn is_hot(&self, block: &RuleBlock, rules: &[Rule], threshold: f64) -> bool {
        let mut max_matches = 0;
        for number in block.rule_numbers() {
            let rule = &rules[number];
            if !rule.has_name_condition() {
                return true;
            }
            max_matches = max_matches.max(rule.matches());
        }
        max_matches as f64 >= threshold
    }

    /// Move queued cold blocks to `active`, returning how many were merged.
    ///
    /// A run whose combined name pattern does not fit the configured size
    /// limit is kept unmerged.
    fn flush(
        &self,
        cold: &mut Vec<Arc<RuleBlock>>,
        active: &mut Vec<Arc<RuleBlock>>,
        rules: &[Rule],
    ) -> Result<usize> {
        if cold.is_empty() {
            return Ok(0);
        }

        if cold.len() < self.config.covering_block_min_size {
            active.append(cold);
            return Ok(0);
        }

        let count = cold.len();
        match RuleBlock::covering(cold.clone(), rules, self.config.covering_regex_size_limit) {
            Ok(covering) => {
                cold.clear();
                active.push(Arc::new(covering));
                Ok(count)
            }
            Err(err @ TransformError::CoveringPattern { .. }) => {
                warn!(error = %err, blocks = count, "keeping cold rule blocks unmerged");
                active.append(cold);
                Ok(0)
            }
            Err(err) => Err(err),
        }
    }
}
