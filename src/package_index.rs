//! Package index access: listing the packages a repository provides.
//!
//! The live implementation shells out to `apk`; a saved listing can be
//! injected instead so runs are reproducible and do not depend on the state
//! of the local apk cache.

use std::fs;
use std::path::PathBuf;
use std::process::Command;

use crate::candidates::CandidateSet;
use crate::error::{FilterError, Result};

/// Source of the raw, newline-separated package name listing
pub trait PackageIndex {
    /// Bring the index up to date. A no-op for static listings.
    fn refresh(&self) -> Result<()> {
        Ok(())
    }

    /// Raw listing, one package name per line
    fn list_packages(&self) -> Result<String>;
}

/// Live apk index (`apk search -q`)
#[derive(Debug, Clone)]
pub struct ApkIndex {
    search: Vec<String>,
    update: Vec<String>,
}

impl ApkIndex {
    pub fn new(search: Vec<String>, update: Vec<String>) -> Self {
        Self { search, update }
    }

    /// Program the search command runs, checked during preflight
    pub fn program(&self) -> Option<&str> {
        self.search.first().map(String::as_str)
    }
}

impl PackageIndex for ApkIndex {
    fn refresh(&self) -> Result<()> {
        tracing::info!("Refreshing package index: {}", self.update.join(" "));
        run_command(&self.update).map(|_| ())
    }

    fn list_packages(&self) -> Result<String> {
        run_command(&self.search)
    }
}

/// Saved index listing read from a file
#[derive(Debug, Clone)]
pub struct SnapshotIndex {
    path: PathBuf,
}

impl SnapshotIndex {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PackageIndex for SnapshotIndex {
    fn list_packages(&self) -> Result<String> {
        fs::read_to_string(&self.path).map_err(|e| {
            FilterError::collaborator(format!(
                "Failed to read index snapshot {}: {}",
                self.path.display(),
                e
            ))
        })
    }
}

/// Query `index` and build the candidate set, refusing an empty result.
pub fn load_candidates<I: PackageIndex + ?Sized>(
    index: &I,
    exclude_suffixes: &[String],
) -> Result<CandidateSet> {
    let raw = index.list_packages()?;
    let candidates = CandidateSet::from_index_output(&raw, exclude_suffixes);

    if candidates.is_empty() {
        return Err(FilterError::empty_candidates(
            "the index listing is empty; run `apk update` first or pass --refresh-index",
        ));
    }

    tracing::info!("Found {} candidate packages", candidates.len());
    Ok(candidates)
}

fn run_command(argv: &[String]) -> Result<String> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| FilterError::config("empty command line"))?;

    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| FilterError::collaborator(format!("Failed to run {}: {}", program, e)))?;

    if !output.status.success() {
        return Err(FilterError::collaborator(format!(
            "{} failed ({}): {}",
            argv.join(" "),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}
