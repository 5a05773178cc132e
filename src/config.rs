//! Configuration file handling for the filter pipeline.
//!
//! Every field has a default matching the upstream rosdistro layout and the
//! Alpine naming conventions, so a config file only needs to name what it
//! changes.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::FilterError;

/// Upstream location of the rosdistro repository (raw file access)
pub const DEFAULT_ROSDISTRO_URL: &str = "https://raw.githubusercontent.com/ros/rosdistro/master";

/// Filter settings loaded from a JSON file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    // Package index
    pub index_command: Vec<String>,
    pub refresh_command: Vec<String>,
    pub exclude_suffixes: Vec<String>,

    // Remote documents
    pub rosdistro_url: String,
    pub request_timeout_secs: u64,

    // Release platform swap
    pub source_platform: String,
    pub target_platform: String,
    pub target_versions: Vec<String>,

    // rosdep naming conventions
    pub language_prefix: String,
    pub language_token: String,
    pub language_replacement: String,
    pub dev_suffix: String,

    // Hand-authored rosdep entries
    pub system_overrides: PathBuf,
    pub language_overrides: PathBuf,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            index_command: vec!["apk".into(), "search".into(), "-q".into()],
            refresh_command: vec!["apk".into(), "update".into()],
            exclude_suffixes: vec!["-dbg".into(), "-doc".into()],
            rosdistro_url: DEFAULT_ROSDISTRO_URL.to_string(),
            request_timeout_secs: 60,
            source_platform: "ubuntu".to_string(),
            target_platform: "alpine".to_string(),
            target_versions: vec!["3.7".to_string()],
            language_prefix: "py-".to_string(),
            language_token: "python".to_string(),
            language_replacement: "py".to_string(),
            dev_suffix: "-dev".to_string(),
            system_overrides: PathBuf::from("/manual_entries_base.yaml"),
            language_overrides: PathBuf::from("/manual_entries_python.yaml"),
        }
    }
}

impl FilterConfig {
    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration from {:?}", path.as_ref()))?;

        let config: Self =
            serde_json::from_str(&content).context("Failed to parse configuration JSON")?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.index_command.first().is_none_or(|program| program.trim().is_empty()) {
            return Err(FilterError::config("index_command must name a program"));
        }

        let source = self.source_platform.trim();
        let target = self.target_platform.trim();
        if source.is_empty() || target.is_empty() {
            return Err(FilterError::config(
                "source_platform and target_platform must not be empty",
            ));
        }
        if source == target {
            return Err(FilterError::config(format!(
                "source_platform and target_platform are both '{}'",
                target
            )));
        }

        if self.target_versions.is_empty() {
            return Err(FilterError::config("target_versions must list at least one version"));
        }

        if self.language_prefix.is_empty() || self.language_token.is_empty() {
            return Err(FilterError::config(
                "language_prefix and language_token must not be empty",
            ));
        }

        if self.dev_suffix.is_empty() {
            return Err(FilterError::config("dev_suffix must not be empty"));
        }

        if self.request_timeout_secs == 0 {
            return Err(FilterError::config("request_timeout_secs must be greater than zero"));
        }

        if !self.rosdistro_url.starts_with("http://") && !self.rosdistro_url.starts_with("https://")
        {
            return Err(FilterError::config(format!(
                "rosdistro_url must be an http(s) URL, got '{}'",
                self.rosdistro_url
            )));
        }

        Ok(())
    }

    /// Prefix carried by every ROS package of `distro` in the apk repository
    pub fn namespace_tag(&self, distro: &str) -> String {
        format!("ros-{}-", distro)
    }

    /// URL of the distribution manifest for `distro`
    pub fn distribution_url(&self, distro: &str) -> String {
        format!(
            "{}/{}/distribution.yaml",
            self.rosdistro_url.trim_end_matches('/'),
            distro
        )
    }

    /// URL of a rosdep mapping document (`base.yaml`, `python.yaml`)
    pub fn rosdep_url(&self, file: &str) -> String {
        format!("{}/rosdep/{}", self.rosdistro_url.trim_end_matches('/'), file)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
