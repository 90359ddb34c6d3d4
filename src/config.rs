//! Configuration for the package transformer.
//!
//! The defaults reproduce the tuning the rule engine has always shipped with;
//! the knobs exist so that tests and benchmarks can trigger optimization at
//! small package counts and so that batch pipelines can schedule it
//! themselves.

/// Default compiled-size budget for a covering block's combined name pattern.
pub const DEFAULT_COVERING_REGEX_SIZE_LIMIT: usize = 256 * (1 << 20);

/// Processed-package counts at which blocks are re-optimized by default.
pub const DEFAULT_MILESTONES: [u64; 4] = [1_000, 10_000, 100_000, 1_000_000];

/// Tunables for block construction and adaptive re-optimization.
///
/// # Examples
///
/// ```rust
/// use package_transform::TransformerConfig;
///
/// let config = TransformerConfig::default()
///     .with_milestones(vec![10, 100])
///     .with_covering_block_min_size(3);
/// assert_eq!(config.milestones, vec![10, 100]);
/// assert!(config.is_milestone(100));
/// assert!(!config.is_milestone(101));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TransformerConfig {
    /// Fraction of processed packages a block must match to stay "hot".
    ///
    /// Blocks whose best rule matched fewer than `processed × threshold`
    /// packages are candidates for merging into a covering block.
    ///
    /// **Default**: 0.001
    pub lowfreq_threshold: f64,

    /// Minimum number of consecutive cold blocks merged into one covering
    /// block. A covering block over a single block only adds overhead.
    ///
    /// **Default**: 2
    pub covering_block_min_size: usize,

    /// Compiled-size budget of the combined name pattern of one covering
    /// block. A run of cold blocks whose patterns do not fit stays unmerged.
    ///
    /// **Default**: 256 MiB
    pub covering_regex_size_limit: usize,

    /// Minimum number of consecutive name rules grouped into a name-indexed
    /// block. Shorter runs become direct blocks.
    ///
    /// **Default**: 1
    pub namemap_block_min_size: usize,

    /// Processed counts at which the optimizer runs. Compared by equality,
    /// so each milestone fires exactly once.
    ///
    /// **Default**: 1 000 / 10 000 / 100 000 / 1 000 000
    pub milestones: Vec<u64>,

    /// Master switch for milestone-driven optimization.
    ///
    /// **Default**: true
    pub enable_optimization: bool,
}

impl Default for TransformerConfig {
    fn default() -> Self {
        Self {
            lowfreq_threshold: 0.001,
            covering_block_min_size: 2,
            covering_regex_size_limit: DEFAULT_COVERING_REGEX_SIZE_LIMIT,
            namemap_block_min_size: 1,
            milestones: DEFAULT_MILESTONES.to_vec(),
            enable_optimization: true,
        }
    }
}

impl TransformerConfig {
    /// Replace the optimization milestones.
    pub fn with_milestones(mut self, milestones: Vec<u64>) -> Self {
        self.milestones = milestones;
        self
    }

    /// Set the low-frequency threshold.
    pub fn with_lowfreq_threshold(mut self, threshold: f64) -> Self {
        self.lowfreq_threshold = threshold;
        self
    }

    /// Set the minimum covering block size.
    pub fn with_covering_block_min_size(mut self, size: usize) -> Self {
        self.covering_block_min_size = size;
        self
    }

    /// Set the compiled-size budget of a covering block's name pattern.
    pub fn with_covering_regex_size_limit(mut self, bytes: usize) -> Self {
        self.covering_regex_size_limit = bytes;
        self
    }

    /// Set the minimum name-indexed block size.
    pub fn with_namemap_block_min_size(mut self, size: usize) -> Self {
        self.namemap_block_min_size = size;
        self
    }

    /// Disable milestone-driven optimization entirely.
    pub fn without_optimization(mut self) -> Self {
        self.enable_optimization = false;
        self
    }

    /// Whether `processed` is exactly one of the configured milestones.
    pub fn is_milestone(&self, processed: u64) -> bool {
        self.enable_optimization && self.milestones.contains(&processed)
    }
}
