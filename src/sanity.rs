//! Pre-flight sanity checks for the runtime environment
//!
//! Verifies that the programs the live package index relies on are present
//! before any query or download is attempted.

use std::process::Command;

use crate::error::{FilterError, Result};

/// Result of environment verification
#[derive(Debug, Default)]
pub struct SanityCheckResult {
    pub missing_binaries: Vec<String>,
}

impl SanityCheckResult {
    /// Returns true if all checks passed
    pub fn is_ok(&self) -> bool {
        self.missing_binaries.is_empty()
    }

    pub fn into_result(self) -> Result<()> {
        if self.is_ok() {
            return Ok(());
        }

        Err(FilterError::collaborator(format!(
            "required programs not found in PATH: {} (install apk-tools or pass --index-file)",
            self.missing_binaries.join(", ")
        )))
    }
}

/// Check if a binary is available in PATH
fn binary_exists(name: &str) -> bool {
    Command::new("which")
        .arg(name)
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Verify each of `binaries` is on PATH
pub fn verify_environment<'a>(binaries: impl IntoIterator<Item = &'a str>) -> SanityCheckResult {
    let missing_binaries = binaries
        .into_iter()
        .filter(|binary| !binary_exists(binary))
        .map(str::to_string)
        .collect();

    SanityCheckResult { missing_binaries }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_present_binary() {
        let result = verify_environment(["sh"]);
        assert!(result.is_ok());
        assert!(result.into_result().is_ok());
    }

    #[test]
    fn test_missing_binary() {
        let result = verify_environment(["sh", "this_binary_does_not_exist_12345"]);
        assert_eq!(
            result.missing_binaries,
            vec!["this_binary_does_not_exist_12345"]
        );
        assert!(matches!(
            result.into_result(),
            Err(FilterError::CollaboratorUnavailable(_))
        ));
    }
}
