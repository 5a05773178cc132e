//! End-to-end run: index -> remote documents -> filter -> output files.
//!
//! Collaborators are injected so the whole run can be exercised against a
//! saved index listing and in-memory documents.

use std::fs;
use std::path::{Path, PathBuf};

use crate::candidates::CandidateSet;
use crate::config::FilterConfig;
use crate::distribution::{Distribution, FilterReport};
use crate::error::{FilterError, Result};
use crate::fetch::DocumentSource;
use crate::package_index::{self, PackageIndex};
use crate::rosdep::{self, DependencyMap, MappingRules, Overrides, RosdepReport};
use crate::types::Stage;

/// Parameters of one run
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub distro: String,
    pub output_dir: PathBuf,
    pub stage: Stage,
    pub dry_run: bool,
}

impl RunRequest {
    pub fn validate(&self) -> Result<()> {
        let distro = self.distro.trim();
        if distro.is_empty() {
            return Err(FilterError::config("distribution name must not be empty"));
        }
        if !distro
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(FilterError::config(format!(
                "invalid distribution name '{}'",
                self.distro
            )));
        }
        Ok(())
    }

    pub fn distribution_output(&self) -> PathBuf {
        self.output_dir.join(&self.distro).join("distribution.yaml")
    }

    pub fn rosdep_output(&self, file: &str) -> PathBuf {
        self.output_dir.join("rosdep").join(file)
    }
}

/// What a run did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub candidates: usize,
    pub distribution: Option<FilterReport>,
    pub rosdep: Option<RosdepReport>,
    pub written: Vec<PathBuf>,
}

/// Run the requested stages.
pub fn run(
    config: &FilterConfig,
    request: &RunRequest,
    index: &dyn PackageIndex,
    source: &dyn DocumentSource,
    overrides: &Overrides,
) -> Result<RunReport> {
    request.validate()?;

    let candidates = package_index::load_candidates(index, &config.exclude_suffixes)?;
    let mut report = RunReport {
        candidates: candidates.len(),
        ..Default::default()
    };

    if request.stage.includes_distribution() {
        let (filter_report, document) = filter_distribution(config, request, &candidates, source)?;
        report.distribution = Some(filter_report);
        write_output(
            request,
            &request.distribution_output(),
            &document,
            &mut report.written,
        )?;
    }

    if request.stage.includes_rosdep() {
        let (rosdep_report, system, language) =
            filter_rosdep(config, request, &candidates, source, overrides)?;
        report.rosdep = Some(rosdep_report);
        write_output(
            request,
            &request.rosdep_output("python.yaml"),
            &language,
            &mut report.written,
        )?;
        write_output(
            request,
            &request.rosdep_output("base.yaml"),
            &system,
            &mut report.written,
        )?;
    }

    Ok(report)
}

/// Filter the distribution manifest, returning the rendered document
fn filter_distribution(
    config: &FilterConfig,
    request: &RunRequest,
    candidates: &CandidateSet,
    source: &dyn DocumentSource,
) -> Result<(FilterReport, String)> {
    let url = config.distribution_url(&request.distro);
    let mut distribution = Distribution::from_yaml(&url, &source.fetch(&url)?)?;

    let available = candidates.namespaced(&config.namespace_tag(&request.distro));
    let filter_report = distribution.retain_available(&available);
    tracing::info!(
        "{}/distribution.yaml file was filtered from {} packages down to {}",
        request.distro,
        filter_report.original,
        filter_report.retained
    );

    distribution.swap_release_platform(
        &config.source_platform,
        &config.target_platform,
        &config.target_versions,
    );

    Ok((filter_report, distribution.to_document()?))
}

/// Update both rosdep mappings, returning the rendered base and python documents
fn filter_rosdep(
    config: &FilterConfig,
    request: &RunRequest,
    candidates: &CandidateSet,
    source: &dyn DocumentSource,
    overrides: &Overrides,
) -> Result<(RosdepReport, String, String)> {
    let python_url = config.rosdep_url("python.yaml");
    let base_url = config.rosdep_url("base.yaml");
    let mut language = DependencyMap::from_yaml(&python_url, &source.fetch(&python_url)?)?;
    let mut system = DependencyMap::from_yaml(&base_url, &source.fetch(&base_url)?)?;

    let partitioned = candidates.partition(
        &config.namespace_tag(&request.distro),
        &config.language_prefix,
    );
    let rules = MappingRules::from_config(config);
    let rosdep_report =
        rosdep::update_mappings(&mut system, &mut language, &partitioned, overrides, &rules);

    tracing::info!(
        "Added {} packages to rosdep/python.yaml",
        rosdep_report.language.additions
    );
    tracing::info!(
        "Added {} packages to rosdep/base.yaml",
        rosdep_report.system.additions
    );

    Ok((rosdep_report, system.to_document()?, language.to_document()?))
}

fn write_output(
    request: &RunRequest,
    path: &Path,
    contents: &str,
    written: &mut Vec<PathBuf>,
) -> Result<()> {
    if request.dry_run {
        tracing::info!("[dry-run] would write {} ({} bytes)", path.display(), contents.len());
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    tracing::debug!("Wrote {}", path.display());
    written.push(path.to_path_buf());
    Ok(())
}
