//! JSON interchange for report batches.
//!
//! Reports are the persistence unit: extraction runs where the code model
//! lives, scoring can run elsewhere or later against the serialized batch.

use crate::core::PurityReport;
use crate::errors::AnalysisError;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub fn reports_to_json(reports: &[PurityReport]) -> Result<String, AnalysisError> {
    Ok(serde_json::to_string_pretty(reports)?)
}

pub fn reports_from_json(json: &str) -> Result<Vec<PurityReport>, AnalysisError> {
    Ok(serde_json::from_str(json)?)
}

pub fn write_reports(path: &Path, reports: &[PurityReport]) -> Result<()> {
    let json = reports_to_json(reports)?;
    fs::write(path, json).with_context(|| format!("Failed to write reports to {path:?}"))?;
    Ok(())
}

pub fn read_reports(path: &Path) -> Result<Vec<PurityReport>> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read reports from {path:?}"))?;
    Ok(reports_from_json(&json)?)
}
