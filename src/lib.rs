//! # Package Transform
//!
//! A rule engine that normalizes package records collected from many
//! repositories: it renames packages to a common effective name, rewrites
//! versions, attaches flavors and sets classification flags, driven by an
//! ordered list of YAML rules.
//!
//! Rules are grouped into blocks so that a package only meets the rules that
//! can concern it. Consecutive rules keyed by literal names share one hash
//! index, and blocks of rules that rarely match are merged behind a single
//! combined name filter once enough packages have been seen.
//!
//! ## Quick Start
//!
//! ```rust
//! use package_transform::{load_rules_from_str, Package, PackageFlag, PackageTransformer};
//!
//! let rules = load_rules_from_str(
//!     r#"
//! - { namepat: "lib(.*)", setname: "$1" }
//! - { name: foo, vergt: "1.0", ignore: true }
//! "#,
//! )?;
//!
//! let mut transformer = PackageTransformer::new(rules)?;
//!
//! let mut package = Package::new("freebsd", "libfoo", "1.5");
//! transformer.process(&mut package);
//!
//! assert_eq!(package.effname(), "foo");
//! assert!(package.has_flag(PackageFlag::Ignore));
//! # Ok::<(), package_transform::TransformError>(())
//! ```
//!
//! ### Repositories and Configuration
//!
//! ```rust
//! use package_transform::{
//!     load_rules_from_str, Package, PackageFlag, PackageTransformer, RepositoryMap,
//!     TransformerConfig,
//! };
//!
//! let repositories = RepositoryMap::new().with_repository("freebsd", ["freebsd", "bsd"]);
//!
//! let mut transformer = PackageTransformer::builder()
//!     .with_repositories(repositories)
//!     .with_config(TransformerConfig::default().with_milestones(vec![100, 1_000]))
//!     .build(load_rules_from_str("- { ruleset: bsd, noscheme: true }")?)?;
//!
//! let mut package = Package::new("freebsd", "bar", "2.0");
//! transformer.process(&mut package);
//! assert!(package.has_flag(PackageFlag::Noscheme));
//! # Ok::<(), package_transform::TransformError>(())
//! ```

pub mod apply;
pub mod block;
pub mod config;
pub mod error;
pub mod interpolate;
pub mod loader;
pub mod matcher;
pub mod optimizer;
pub mod package;
pub mod repository;
pub mod rule;
pub mod transformer;
pub mod version;

// Primary interface
pub use transformer::{PackageTransformer, PackageTransformerBuilder, TransformerStats};

// Configuration and errors
pub use config::{TransformerConfig, DEFAULT_COVERING_REGEX_SIZE_LIMIT, DEFAULT_MILESTONES};
pub use error::{Result, TransformError};

// Records and collaborators
pub use loader::{load_rules_from_dir, load_rules_from_str};
pub use package::{Package, PackageFlag, PackageFlags};
pub use repository::{RepositoryLookup, RepositoryMap};
pub use version::{StandardVersionComparator, VersionComparator};

// Rule model (for inspection and advanced use)
pub use rule::{compile_rule, compile_rules, Rule};
