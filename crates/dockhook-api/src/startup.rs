//! Startup gate over pre-flight validation results.

use anyhow::bail;
use dockhook_preflight::ValidationResult;
use tracing::{error, info};

/// Refuse to start unless every result is valid.
///
/// Every error of every invalid result is logged before failing, so one run
/// reports all problems.
pub fn gate(results: &[ValidationResult]) -> anyhow::Result<()> {
    let invalid: Vec<&ValidationResult> = results.iter().filter(|r| !r.is_valid).collect();
    for result in &invalid {
        for message in &result.errors {
            error!(repo = %result.repo_name, "{}", message);
        }
    }

    if !invalid.is_empty() {
        let names: Vec<&str> = invalid.iter().map(|r| r.repo_name.as_str()).collect();
        bail!(
            "configuration validation failed for {}",
            names.join(", ")
        );
    }

    info!(count = results.len(), "Configuration valid");
    Ok(())
}

/// Validation results as the JSON report printed by `--check`.
pub fn report(results: &[ValidationResult]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(results)
}
