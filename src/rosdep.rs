//! rosdep mapping documents (`rosdep/base.yaml`, `rosdep/python.yaml`).
//!
//! Each document maps a dependency key to per-platform rules. The updater
//! only ever touches the target platform's rule; other platforms are carried
//! through as opaque YAML values.
//!
//! # Resolution Rules
//!
//! | Document      | Entry key     | Resolved when available     |
//! |---------------|---------------|-----------------------------|
//! | `python.yaml` | `python-yaml` | `[py-yaml]`                 |
//! | `base.yaml`   | `boost`       | `[boost]`                   |
//! | `base.yaml`   | `libfoo`      | `[libfoo-dev]` (fallback)   |
//!
//! Manual overrides run last and win over anything derived automatically.

use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::Path;

use crate::candidates::PartitionedCandidates;
use crate::config::FilterConfig;
use crate::distribution::sort_keys;
use crate::error::{FilterError, Result};

/// Naming conventions used to derive target-platform package names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingRules {
    pub platform: String,
    pub language_token: String,
    pub language_replacement: String,
    pub dev_suffix: String,
}

impl MappingRules {
    pub fn from_config(config: &FilterConfig) -> Self {
        Self {
            platform: config.target_platform.clone(),
            language_token: config.language_token.clone(),
            language_replacement: config.language_replacement.clone(),
            dev_suffix: config.dev_suffix.clone(),
        }
    }

    /// `python-yaml` -> `py-yaml`
    pub fn language_name(&self, key: &str) -> String {
        key.replace(&self.language_token, &self.language_replacement)
    }

    /// `libfoo` -> `libfoo-dev`, or `None` when `key` already is a dev package
    pub fn dev_name(&self, key: &str) -> Option<String> {
        if key.ends_with(&self.dev_suffix) {
            None
        } else {
            Some(format!("{}{}", key, self.dev_suffix))
        }
    }
}

/// Per-platform rules of one rosdep key
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DependencyEntry {
    rules: BTreeMap<String, Value>,
}

impl<'de> Deserialize<'de> for DependencyEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        // `key:` with no rules parses as null
        let rules =
            Option::<BTreeMap<String, Value>>::deserialize(deserializer)?.unwrap_or_default();
        Ok(Self { rules })
    }
}

impl DependencyEntry {
    pub fn resolution(&self, platform: &str) -> Option<&Value> {
        self.rules.get(platform)
    }

    pub fn has_resolution(&self, platform: &str) -> bool {
        self.rules.contains_key(platform)
    }

    /// Overwrite the platform rule, returning the previous one
    pub fn set_resolution(&mut self, platform: &str, packages: &[String]) -> Option<Value> {
        self.rules.insert(platform.to_string(), package_list(packages))
    }

    /// Append to the platform's package list, creating it when absent
    pub fn append_resolution(&mut self, platform: &str, package: &str) {
        match self.rules.get_mut(platform) {
            Some(Value::Sequence(packages)) => packages.push(Value::String(package.to_string())),
            Some(other) => {
                tracing::warn!(
                    "Replacing non-list {} rule {} with [{}]",
                    platform,
                    describe(other),
                    package
                );
                *other = package_list(&[package.to_string()]);
            }
            None => {
                self.set_resolution(platform, &[package.to_string()]);
            }
        }
    }

    pub fn remove_resolution(&mut self, platform: &str) -> Option<Value> {
        self.rules.remove(platform)
    }
}

impl<const N: usize> From<[(&str, Value); N]> for DependencyEntry {
    fn from(rules: [(&str, Value); N]) -> Self {
        Self {
            rules: rules
                .into_iter()
                .map(|(platform, rule)| (platform.to_string(), rule))
                .collect(),
        }
    }
}

/// A rosdep mapping document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependencyMap {
    entries: BTreeMap<String, DependencyEntry>,
}

impl DependencyMap {
    /// Parse a mapping document, failing fast on the wrong shape.
    pub fn from_yaml(origin: &str, text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }

        let entries: Option<BTreeMap<String, DependencyEntry>> = serde_yaml::from_str(text)
            .map_err(|e| FilterError::malformed(format!("{}: {}", origin, e)))?;

        Ok(Self {
            entries: entries.unwrap_or_default(),
        })
    }

    /// Render the document, keys sorted at every level
    pub fn to_document(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&sort_keys(serde_yaml::to_value(self)?))?)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&DependencyEntry> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, entry: DependencyEntry) {
        self.entries.insert(key.into(), entry);
    }

    /// Keys with no rule for `platform` yet
    fn unresolved(&self, platform: &str) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, entry)| !entry.has_resolution(platform))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Resolve language-specific keys by renaming them to the repository's
    /// convention. Returns the number of entries resolved.
    pub fn add_language_resolutions(
        &mut self,
        available: &BTreeSet<String>,
        rules: &MappingRules,
    ) -> usize {
        let mut additions = 0;

        for key in self.unresolved(&rules.platform) {
            let package = rules.language_name(&key);
            if !available.contains(&package) {
                continue;
            }
            if let Some(entry) = self.entries.get_mut(&key) {
                tracing::debug!("{}: {} -> [{}]", key, rules.platform, package);
                entry.set_resolution(&rules.platform, &[package]);
                additions += 1;
            }
        }

        additions
    }

    /// Resolve system keys by exact name, falling back to the development
    /// variant when the mapping does not list that variant on its own.
    /// Returns the number of entries resolved.
    pub fn add_system_resolutions(
        &mut self,
        available: &BTreeSet<String>,
        rules: &MappingRules,
    ) -> usize {
        let mut additions = 0;

        for key in self.unresolved(&rules.platform) {
            let resolved = if available.contains(&key) {
                Some(Resolution::Set(key.clone()))
            } else {
                rules
                    .dev_name(&key)
                    .filter(|dev| !self.entries.contains_key(dev))
                    .filter(|dev| available.contains(dev))
                    .map(Resolution::Append)
            };

            let (Some(resolved), Some(entry)) = (resolved, self.entries.get_mut(&key)) else {
                continue;
            };

            match resolved {
                Resolution::Set(package) => {
                    tracing::debug!("{}: {} -> [{}]", key, rules.platform, package);
                    entry.set_resolution(&rules.platform, &[package]);
                }
                Resolution::Append(package) => {
                    tracing::debug!("{}: {} += {}", key, rules.platform, package);
                    entry.append_resolution(&rules.platform, &package);
                }
            }
            additions += 1;
        }

        additions
    }

    /// Apply hand-authored entries on top of the automatic resolutions.
    ///
    /// Overrides for keys missing from the document are skipped.
    pub fn apply_overrides(
        &mut self,
        overrides: &OverrideMap,
        platform: &str,
    ) -> Vec<OverrideChange> {
        let mut changes = Vec::new();

        for (key, packages) in overrides.iter() {
            let Some(entry) = self.entries.get_mut(key) else {
                tracing::warn!("Manual entry '{}' has no matching rosdep key, skipping", key);
                continue;
            };

            let change = if packages.is_empty() {
                OverrideChange::Removed {
                    key: key.clone(),
                    old: entry.remove_resolution(platform),
                }
            } else {
                match entry.set_resolution(platform, packages) {
                    Some(old) => OverrideChange::Updated {
                        key: key.clone(),
                        old,
                        new: packages.clone(),
                    },
                    None => OverrideChange::Added {
                        key: key.clone(),
                        new: packages.clone(),
                    },
                }
            };

            tracing::info!("{}", change);
            changes.push(change);
        }

        changes
    }
}

enum Resolution {
    Set(String),
    Append(String),
}

/// Hand-authored target-platform package lists, keyed by rosdep key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideMap {
    entries: BTreeMap<String, Vec<String>>,
}

impl OverrideMap {
    /// Parse an override document. Each entry must carry a list of package
    /// names for `platform`; an empty or null document yields no overrides.
    pub fn from_yaml(origin: &str, text: &str, platform: &str) -> Result<Self> {
        let document = DependencyMap::from_yaml(origin, text)?;
        let mut entries = BTreeMap::new();

        for (key, entry) in document.entries {
            let packages = match entry.resolution(platform) {
                Some(Value::Sequence(items)) => items
                    .iter()
                    .map(|item| match item {
                        Value::String(name) => Ok(name.clone()),
                        other => Err(FilterError::malformed(format!(
                            "{}: '{}' lists non-string package {}",
                            origin,
                            key,
                            describe(other)
                        ))),
                    })
                    .collect::<Result<Vec<_>>>()?,
                Some(Value::Null) => Vec::new(),
                Some(other) => {
                    return Err(FilterError::malformed(format!(
                        "{}: '{}' {} entry must be a list, got {}",
                        origin,
                        key,
                        platform,
                        describe(other)
                    )));
                }
                None => {
                    return Err(FilterError::malformed(format!(
                        "{}: '{}' has no {} entry",
                        origin, key, platform
                    )));
                }
            };
            entries.insert(key, packages);
        }

        Ok(Self { entries })
    }

    /// Load an override file; a missing file means no overrides
    pub fn load(path: &Path, platform: &str) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No manual entries at {}", path.display());
            return Ok(Self::default());
        }

        let text = fs::read_to_string(path)?;
        Self::from_yaml(&path.display().to_string(), &text, platform)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.entries.iter()
    }
}

impl<K: Into<String>> FromIterator<(K, Vec<String>)> for OverrideMap {
    fn from_iter<I: IntoIterator<Item = (K, Vec<String>)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(key, packages)| (key.into(), packages)).collect(),
        }
    }
}

/// A change made by a manual override
#[derive(Debug, Clone, PartialEq)]
pub enum OverrideChange {
    Removed { key: String, old: Option<Value> },
    Updated { key: String, old: Value, new: Vec<String> },
    Added { key: String, new: Vec<String> },
}

impl OverrideChange {
    pub fn key(&self) -> &str {
        match self {
            Self::Removed { key, .. } | Self::Updated { key, .. } | Self::Added { key, .. } => key,
        }
    }
}

impl fmt::Display for OverrideChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Removed { key, .. } => write!(f, "To '{}': removing all entries", key),
            Self::Updated { key, old, new } => write!(
                f,
                "To '{}': updating {} to [{}]",
                key,
                describe(old),
                new.join(", ")
            ),
            Self::Added { key, new } => write!(f, "To '{}': adding [{}]", key, new.join(", ")),
        }
    }
}

/// Outcome of updating one mapping document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingReport {
    pub additions: usize,
    pub changes: Vec<OverrideChange>,
}

/// Outcome of updating both mapping documents
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RosdepReport {
    pub system: MappingReport,
    pub language: MappingReport,
}

/// Manual overrides for both mapping documents
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub system: OverrideMap,
    pub language: OverrideMap,
}

impl Overrides {
    pub fn load(config: &FilterConfig) -> Result<Self> {
        Ok(Self {
            system: OverrideMap::load(&config.system_overrides, &config.target_platform)?,
            language: OverrideMap::load(&config.language_overrides, &config.target_platform)?,
        })
    }
}

/// Add target-platform resolutions to both documents, then apply overrides.
pub fn update_mappings(
    system: &mut DependencyMap,
    language: &mut DependencyMap,
    candidates: &PartitionedCandidates,
    overrides: &Overrides,
    rules: &MappingRules,
) -> RosdepReport {
    let mut report = RosdepReport {
        language: MappingReport {
            additions: language.add_language_resolutions(&candidates.language, rules),
            changes: Vec::new(),
        },
        system: MappingReport {
            additions: system.add_system_resolutions(&candidates.system, rules),
            changes: Vec::new(),
        },
    };

    if !overrides.system.is_empty() {
        tracing::info!("Making manual modifications to rosdep/base.yaml");
        report.system.changes = system.apply_overrides(&overrides.system, &rules.platform);
    }

    if !overrides.language.is_empty() {
        tracing::info!("Making manual modifications to rosdep/python.yaml");
        report.language.changes = language.apply_overrides(&overrides.language, &rules.platform);
    }

    report
}

fn package_list(packages: &[String]) -> Value {
    Value::Sequence(packages.iter().cloned().map(Value::String).collect())
}

/// Compact single-line rendering of a rule for log output
fn describe(value: &Value) -> String {
    match value {
        Value::Sequence(items) => format!(
            "[{}]",
            items.iter().map(describe).collect::<Vec<_>>().join(", ")
        ),
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().replace('\n', " "))
            .unwrap_or_else(|_| format!("{:?}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> MappingRules {
        MappingRules::from_config(&FilterConfig::default())
    }

    fn available(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn list(names: &[&str]) -> Value {
        Value::Sequence(names.iter().map(|n| Value::String(n.to_string())).collect())
    }

    #[test]
    fn test_rules_naming() {
        let rules = rules();
        assert_eq!(rules.language_name("python-yaml"), "py-yaml");
        assert_eq!(rules.language_name("python3-numpy"), "py3-numpy");
        assert_eq!(rules.dev_name("libfoo"), Some("libfoo-dev".to_string()));
        assert_eq!(rules.dev_name("libfoo-dev"), None);
    }

    #[test]
    fn test_from_yaml_accepts_null_entries() {
        let text = "boost:\n  ubuntu: [libboost-all-dev]\nlibfoo:\n";
        let map = DependencyMap::from_yaml("base.yaml", text).unwrap();
        assert_eq!(map.len(), 2);
        assert!(!map.get("libfoo").unwrap().has_resolution("alpine"));
    }

    #[test]
    fn test_to_document_sorts_nested_keys() {
        let text = "boost:\n  ubuntu:\n    xenial: [libboost-dev]\n    bionic: [libboost-dev]\n";
        let map = DependencyMap::from_yaml("base.yaml", text).unwrap();
        let document = map.to_document().unwrap();

        assert!(document.find("bionic").unwrap() < document.find("xenial").unwrap());
    }

    #[test]
    fn test_from_yaml_empty_document() {
        assert!(DependencyMap::from_yaml("base.yaml", "").unwrap().is_empty());
    }

    #[test]
    fn test_from_yaml_rejects_non_mapping() {
        let err = DependencyMap::from_yaml("base.yaml", "- boost\n- libfoo\n").unwrap_err();
        assert!(matches!(err, FilterError::MalformedManifest(_)));
    }

    #[test]
    fn test_language_resolution() {
        let mut map = DependencyMap::default();
        map.insert("python-yaml", DependencyEntry::default());
        map.insert("python-missing", DependencyEntry::default());

        let added = map.add_language_resolutions(&available(&["py-yaml"]), &rules());

        assert_eq!(added, 1);
        assert_eq!(
            map.get("python-yaml").unwrap().resolution("alpine"),
            Some(&list(&["py-yaml"]))
        );
        assert!(!map.get("python-missing").unwrap().has_resolution("alpine"));
    }

    #[test]
    fn test_existing_resolution_untouched() {
        let mut map = DependencyMap::default();
        map.insert("python-yaml", DependencyEntry::from([("alpine", list(&["py3-yaml"]))]));

        let added = map.add_language_resolutions(&available(&["py-yaml"]), &rules());

        assert_eq!(added, 0);
        assert_eq!(
            map.get("python-yaml").unwrap().resolution("alpine"),
            Some(&list(&["py3-yaml"]))
        );
    }

    #[test]
    fn test_system_direct_match() {
        let mut map = DependencyMap::default();
        map.insert("boost", DependencyEntry::from([("ubuntu", list(&["libboost-all-dev"]))]));

        let added = map.add_system_resolutions(&available(&["boost", "boost-dev"]), &rules());

        assert_eq!(added, 1);
        let entry = map.get("boost").unwrap();
        assert_eq!(entry.resolution("alpine"), Some(&list(&["boost"])));
        assert_eq!(
            entry.resolution("ubuntu"),
            Some(&list(&["libboost-all-dev"]))
        );
    }

    #[test]
    fn test_system_dev_fallback() {
        let mut map = DependencyMap::default();
        map.insert("libfoo", DependencyEntry::default());

        let added = map.add_system_resolutions(&available(&["libfoo-dev"]), &rules());

        assert_eq!(added, 1);
        assert_eq!(
            map.get("libfoo").unwrap().resolution("alpine"),
            Some(&list(&["libfoo-dev"]))
        );
    }

    #[test]
    fn test_system_dev_fallback_skipped_when_dev_key_exists() {
        let mut map = DependencyMap::default();
        map.insert("libfoo", DependencyEntry::default());
        map.insert("libfoo-dev", DependencyEntry::default());

        let added = map.add_system_resolutions(&available(&["libfoo-dev"]), &rules());

        // Only the dev key itself resolves
        assert_eq!(added, 1);
        assert!(!map.get("libfoo").unwrap().has_resolution("alpine"));
        assert_eq!(
            map.get("libfoo-dev").unwrap().resolution("alpine"),
            Some(&list(&["libfoo-dev"]))
        );
    }

    #[test]
    fn test_no_double_dev_suffix() {
        let mut map = DependencyMap::default();
        map.insert("libbar-dev", DependencyEntry::default());

        let added = map.add_system_resolutions(&available(&["libbar-dev-dev"]), &rules());
        assert_eq!(added, 0);
    }

    #[test]
    fn test_append_resolution() {
        let mut entry = DependencyEntry::from([("alpine", list(&["libfoo"]))]);
        entry.append_resolution("alpine", "libfoo-dev");
        assert_eq!(
            entry.resolution("alpine"),
            Some(&list(&["libfoo", "libfoo-dev"]))
        );

        let mut entry = DependencyEntry::default();
        entry.append_resolution("alpine", "libfoo-dev");
        assert_eq!(entry.resolution("alpine"), Some(&list(&["libfoo-dev"])));
    }

    #[test]
    fn test_override_empty_list_removes() {
        let mut map = DependencyMap::default();
        map.insert("libfoo", DependencyEntry::default());
        map.add_system_resolutions(&available(&["libfoo"]), &rules());
        assert!(map.get("libfoo").unwrap().has_resolution("alpine"));

        let overrides: OverrideMap = [("libfoo", Vec::new())].into_iter().collect();
        let changes = map.apply_overrides(&overrides, "alpine");

        assert!(!map.get("libfoo").unwrap().has_resolution("alpine"));
        assert_eq!(
            changes,
            vec![OverrideChange::Removed {
                key: "libfoo".into(),
                old: Some(list(&["libfoo"])),
            }]
        );
    }

    #[test]
    fn test_override_overwrites_and_adds() {
        let mut map = DependencyMap::default();
        map.insert("boost", DependencyEntry::from([("alpine", list(&["boost", "boost-dev"]))]));
        map.insert("eigen", DependencyEntry::default());

        let overrides: OverrideMap = [
            ("boost", vec!["boost-dev".to_string()]),
            ("eigen", vec!["eigen-dev".to_string()]),
            ("unknown", vec!["nothing".to_string()]),
        ]
        .into_iter()
        .collect();
        let changes = map.apply_overrides(&overrides, "alpine");

        assert_eq!(changes.len(), 2);
        assert_eq!(
            map.get("boost").unwrap().resolution("alpine"),
            Some(&list(&["boost-dev"]))
        );
        assert_eq!(
            map.get("eigen").unwrap().resolution("alpine"),
            Some(&list(&["eigen-dev"]))
        );
        assert!(map.get("unknown").is_none());
        assert_eq!(
            changes[0].to_string(),
            "To 'boost': updating [boost, boost-dev] to [boost-dev]"
        );
        assert_eq!(changes[1].to_string(), "To 'eigen': adding [eigen-dev]");
    }

    #[test]
    fn test_override_document_parsing() {
        let text = "boost:\n  alpine: [boost-dev]\nlibfoo:\n  alpine: []\n";
        let overrides = OverrideMap::from_yaml("manual.yaml", text, "alpine").unwrap();
        assert_eq!(overrides.len(), 2);

        let entries: Vec<_> = overrides.iter().collect();
        assert_eq!(
            entries[0],
            (&"boost".to_string(), &vec!["boost-dev".to_string()])
        );
        assert!(entries[1].1.is_empty());
    }

    #[test]
    fn test_override_document_missing_platform() {
        let err =
            OverrideMap::from_yaml("manual.yaml", "boost:\n  ubuntu: [x]\n", "alpine").unwrap_err();
        assert!(matches!(err, FilterError::MalformedManifest(_)));
    }

    #[test]
    fn test_override_document_null_is_empty() {
        assert!(OverrideMap::from_yaml("manual.yaml", "~\n", "alpine").unwrap().is_empty());
    }

    #[test]
    fn test_override_missing_file() {
        let overrides = OverrideMap::load(Path::new("/nonexistent/manual.yaml"), "alpine").unwrap();
        assert!(overrides.is_empty());
    }

    #[test]
    fn test_update_mappings_counts() {
        let mut system =
            DependencyMap::from_yaml("base.yaml", "boost: {}\nlibfoo: {}\neigen: {}\n").unwrap();
        let mut language = DependencyMap::from_yaml("python.yaml", "python-yaml: {}\n").unwrap();
        let candidates = PartitionedCandidates {
            language: available(&["py-yaml"]),
            system: available(&["boost", "libfoo-dev"]),
        };
        let overrides = Overrides {
            system: [("eigen", vec!["eigen-dev".to_string()])].into_iter().collect(),
            language: OverrideMap::default(),
        };

        let report = update_mappings(&mut system, &mut language, &candidates, &overrides, &rules());

        assert_eq!(report.system.additions, 2);
        assert_eq!(report.language.additions, 1);
        assert_eq!(report.system.changes.len(), 1);
        assert_eq!(report.system.changes[0].key(), "eigen");
        assert!(report.language.changes.is_empty());
    }
}
