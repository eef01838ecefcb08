//! `docsift config`: print the effective config with secrets masked.

use anyhow::{bail, Result};
use docsift_config::{collect_redacted_paths, redact, write_config};

use crate::config::Settings;
use crate::terminal_output::{note_error, note_info, note_success, note_warn};

/// Write the effective config to the resolved path. Refuses to overwrite.
pub async fn init(settings: &Settings) -> Result<()> {
    if settings.path.exists() {
        bail!("{} already exists", settings.path.display());
    }
    settings.ensure_valid()?;
    write_config(&settings.config, &settings.path).await?;
    note_success(&format!("Wrote {}", settings.path.display()));
    Ok(())
}

pub fn run(settings: &Settings) -> Result<()> {
    note_info(&format!("Config file: {}", settings.path.display()));
    if !settings.path.exists() {
        note_info("File not found; showing defaults");
    }
    if !settings.env_refs.is_empty() {
        note_info(&format!("Environment variables used: {}", settings.env_refs.join(", ")));
    }

    let value = serde_json::to_value(&settings.config)?;
    let masked = collect_redacted_paths(&value);
    if !masked.is_empty() {
        note_info(&format!("Masked: {}", masked.join(", ")));
    }
    println!("{}", serde_json::to_string_pretty(&redact(&value))?);

    for warning in &settings.report.warnings {
        note_warn(&format!("{}: {}", warning.path, warning.message));
    }
    for error in &settings.report.errors {
        note_error(&format!("{}: {}", error.path, error.message));
    }
    settings.ensure_valid()?;
    note_success("Config is valid");
    Ok(())
}
