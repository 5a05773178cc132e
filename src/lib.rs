//! rosdistro-filter Library
//!
//! Reconciles a ROS distribution manifest and the rosdep mapping documents
//! against the packages available in an Alpine apk repository.

pub mod candidates;
pub mod cli;
pub mod config;
pub mod distribution;
pub mod error;
pub mod fetch;
pub mod package_index;
pub mod pipeline;
pub mod rosdep;
pub mod sanity;
pub mod types;

// Re-export main types for convenience
pub use candidates::{CandidateSet, PartitionedCandidates};
pub use config::FilterConfig;
pub use distribution::{Distribution, FilterReport, RepositoryMatch};
pub use error::{FilterError, Result};
pub use fetch::{DocumentSource, HttpSource};
pub use package_index::{ApkIndex, PackageIndex, SnapshotIndex};
pub use pipeline::{run, RunReport, RunRequest};
pub use rosdep::{
    DependencyEntry, DependencyMap, MappingRules, OverrideChange, OverrideMap, Overrides,
    RosdepReport,
};
pub use types::Stage;
