//! ROS distribution manifest (`<distro>/distribution.yaml`) and its filter.
//!
//! Only the keys the filter reads are typed; every other key is carried
//! through untouched so the written manifest differs from upstream only in
//! the repositories removed and the release platform swapped.

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{FilterError, Result};

/// Leading comment block of every distribution file (REP 143)
pub const DISTRIBUTION_HEADER: &str = "%YAML 1.1\n\
# ROS distribution file\n\
# see REP 143: http://ros.org/reps/rep-0143.html\n\
---\n";

/// A distribution manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub release_platforms: BTreeMap<String, Vec<Value>>,
    pub repositories: BTreeMap<String, Repository>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// One repository entry of the manifest
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<Release>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Release metadata of a repository
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Release {
    /// Packages released from a multi-package repository
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packages: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// How a repository matched the candidate set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryMatch {
    /// The repository name itself is available
    Direct,
    /// One of its released packages is available
    SubPackage(String),
}

/// Repository counts before and after filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterReport {
    pub original: usize,
    pub retained: usize,
}

impl FilterReport {
    pub fn removed(&self) -> usize {
        self.original - self.retained
    }
}

impl Repository {
    /// Released sub-packages, empty when the repository lists none
    pub fn sub_packages(&self) -> &[String] {
        self.release
            .as_ref()
            .and_then(|release| release.packages.as_deref())
            .unwrap_or_default()
    }

    /// Match `name` (or, failing that, any sub-package) against `candidates`
    pub fn match_against(
        &self,
        name: &str,
        candidates: &BTreeSet<String>,
    ) -> Option<RepositoryMatch> {
        if candidates.contains(name) {
            return Some(RepositoryMatch::Direct);
        }

        self.sub_packages()
            .iter()
            .find(|package| candidates.contains(package.as_str()))
            .map(|package| RepositoryMatch::SubPackage(package.clone()))
    }
}

impl Distribution {
    /// Parse a manifest, failing fast when the document has the wrong shape.
    ///
    /// `origin` names the document in error messages.
    pub fn from_yaml(origin: &str, text: &str) -> Result<Self> {
        serde_yaml::from_str(text)
            .map_err(|e| FilterError::malformed(format!("{}: {}", origin, e)))
    }

    /// Render the manifest with the REP 143 header, keys sorted at every level
    pub fn to_document(&self) -> Result<String> {
        let body = serde_yaml::to_string(&sort_keys(serde_yaml::to_value(self)?))?;
        Ok(format!("{}{}", DISTRIBUTION_HEADER, body))
    }

    /// Remove every repository with no direct or sub-package match.
    pub fn retain_available(&mut self, candidates: &BTreeSet<String>) -> FilterReport {
        let original = self.repositories.len();

        self.repositories.retain(|name, repository| {
            match repository.match_against(name, candidates) {
                Some(RepositoryMatch::Direct) => {
                    tracing::debug!("Keeping {}: available", name);
                    true
                }
                Some(RepositoryMatch::SubPackage(package)) => {
                    tracing::debug!("Keeping {}: sub-package {} available", name, package);
                    true
                }
                None => false,
            }
        });

        FilterReport {
            original,
            retained: self.repositories.len(),
        }
    }

    /// Replace the `source` release platform with `target` at `versions`.
    pub fn swap_release_platform(&mut self, source: &str, target: &str, versions: &[String]) {
        if self.release_platforms.remove(source).is_none() {
            tracing::warn!("Release platform '{}' not present in manifest", source);
        }

        let versions = versions.iter().cloned().map(Value::String).collect();
        self.release_platforms.insert(target.to_string(), versions);
    }
}

/// Recursively order mapping keys. Typed fields serialize ahead of flattened
/// ones, so declaration order alone does not give sorted output.
pub(crate) fn sort_keys(value: Value) -> Value {
    match value {
        Value::Mapping(mapping) => {
            let mut entries: Vec<(Value, Value)> = mapping
                .into_iter()
                .map(|(key, value)| (key, sort_keys(value)))
                .collect();
            entries.sort_by_cached_key(|(key, _)| key_text(key));
            Value::Mapping(entries.into_iter().collect())
        }
        Value::Sequence(items) => Value::Sequence(items.into_iter().map(sort_keys).collect()),
        Value::Tagged(mut tagged) => {
            tagged.value = sort_keys(tagged.value);
            Value::Tagged(tagged)
        }
        other => other,
    }
}

fn key_text(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}
