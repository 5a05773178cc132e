//! Candidate package set built from a package index listing.
//!
//! # Naming conventions
//!
//! | apk name                  | Used for                          |
//! |---------------------------|-----------------------------------|
//! | `ros-kinetic-roscpp-core` | distribution filter: `roscpp_core` |
//! | `py-yaml`                 | rosdep python mapping             |
//! | `libfoo-dev`              | rosdep base mapping               |
//! | `libfoo-dbg`, `foo-doc`   | dropped on load                   |

use std::collections::BTreeSet;

/// Deduplicated set of package names available in the target repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateSet {
    names: BTreeSet<String>,
}

/// Candidates outside the ROS namespace, split by naming convention.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionedCandidates {
    /// Names carrying the language prefix (`py-*`)
    pub language: BTreeSet<String>,
    /// Everything else
    pub system: BTreeSet<String>,
}

impl CandidateSet {
    /// Build the set from line-oriented index output.
    ///
    /// Blank lines are skipped and names ending in any of `exclude_suffixes`
    /// (debug and documentation variants) are dropped.
    pub fn from_index_output<S: AsRef<str>>(raw: &str, exclude_suffixes: &[S]) -> Self {
        let names = raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter(|line| {
                !exclude_suffixes
                    .iter()
                    .any(|suffix| line.ends_with(suffix.as_ref()))
            })
            .map(str::to_string)
            .collect();

        Self { names }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Names carrying `tag`, with the tag stripped and hyphens swapped for
    /// underscores to match rosdistro repository names.
    pub fn namespaced(&self, tag: &str) -> BTreeSet<String> {
        self.names
            .iter()
            .filter_map(|name| name.strip_prefix(tag))
            .map(normalize_separators)
            .collect()
    }

    /// Drop every name carrying `tag`, then split the rest on `language_prefix`.
    pub fn partition(&self, tag: &str, language_prefix: &str) -> PartitionedCandidates {
        let mut partitioned = PartitionedCandidates::default();

        for name in self.names.iter().filter(|name| !name.starts_with(tag)) {
            if name.starts_with(language_prefix) {
                partitioned.language.insert(name.clone());
            } else {
                partitioned.system.insert(name.clone());
            }
        }

        partitioned
    }
}

impl<S: Into<String>> FromIterator<S> for CandidateSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Swap apk's hyphen separator for the underscore used by ROS package names
pub fn normalize_separators(name: &str) -> String {
    name.replace('-', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXCLUDE: &[&str] = &["-dbg", "-doc"];

    #[test]
    fn test_from_index_output_drops_variants() {
        let raw = "libfoo\nlibfoo-dbg\nlibfoo-doc\nlibfoo-dev\n";
        let set = CandidateSet::from_index_output(raw, EXCLUDE);

        assert_eq!(set.len(), 2);
        assert!(set.contains("libfoo"));
        assert!(set.contains("libfoo-dev"));
        assert!(!set.contains("libfoo-dbg"));
        assert!(!set.contains("libfoo-doc"));
    }

    #[test]
    fn test_from_index_output_deduplicates() {
        let raw = "py-yaml\npy-yaml\n  py-yaml  \n\n";
        let set = CandidateSet::from_index_output(raw, EXCLUDE);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["py-yaml"]);
    }

    #[test]
    fn test_from_empty_output() {
        let set = CandidateSet::from_index_output("\n\n", EXCLUDE);
        assert!(set.is_empty());
    }

    #[test]
    fn test_namespaced_strips_tag_and_normalizes() {
        let set: CandidateSet = ["ros-kinetic-foo", "ros-kinetic-bar-dev", "ros-melodic-baz", "qux"]
            .into_iter()
            .collect();

        let namespaced = set.namespaced("ros-kinetic-");
        assert_eq!(
            namespaced.into_iter().collect::<Vec<_>>(),
            vec!["bar_dev".to_string(), "foo".to_string()]
        );
    }

    #[test]
    fn test_partition_excludes_namespace() {
        let set: CandidateSet = ["ros-kinetic-foo", "py-yaml", "py-numpy", "libfoo-dev", "boost"]
            .into_iter()
            .collect();

        let parts = set.partition("ros-kinetic-", "py-");
        assert_eq!(parts.language.len(), 2);
        assert!(parts.language.contains("py-yaml"));
        assert_eq!(parts.system.len(), 2);
        assert!(parts.system.contains("boost"));
        assert!(!parts.system.contains("ros-kinetic-foo"));
        assert!(!parts.language.contains("ros-kinetic-foo"));
    }

    #[test]
    fn test_normalize_separators() {
        assert_eq!(normalize_separators("roscpp-core"), "roscpp_core");
        assert_eq!(normalize_separators("plain"), "plain");
    }
}
