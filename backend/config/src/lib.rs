//! `docsift-config`: runtime configuration for docsift.
//!
//! Provides:
//! - Typed config schema
//! - YAML read/write with atomic backup rotation
//! - `${ENV_VAR}` substitution
//! - Config redaction for safe display
//! - Default value application
//! - Validation with field paths

pub mod defaults;
pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{collect_referenced_vars, resolve_env_vars, resolve_env_vars_with, MissingEnvVarError};
pub use io::{config_file_path, load_config, load_config_value, write_config};
pub use redact::{collect_redacted_paths, redact};
pub use schema::DocsiftConfig;
pub use validation::{validate, ConfigValidationError, ValidationReport};

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

/// Load a config file, substitute env vars, apply defaults and validate.
///
/// This is the main entry point at runtime. Validation problems are logged
/// and returned in the report; the caller decides whether errors are fatal.
pub async fn load_and_prepare(path: &Path) -> Result<(DocsiftConfig, ValidationReport)> {
    let value = load_config_value(path).await?;
    let value = resolve_env_vars(&value).context("Failed to resolve env vars in config")?;
    prepare(value)
}

/// Same as `load_and_prepare` with an explicit variable map.
pub async fn load_and_prepare_with(
    path: &Path,
    vars: &HashMap<String, String>,
) -> Result<(DocsiftConfig, ValidationReport)> {
    let value = load_config_value(path).await?;
    let value = resolve_env_vars_with(&value, vars).context("Failed to resolve env vars in config")?;
    prepare(value)
}

fn prepare(value: Value) -> Result<(DocsiftConfig, ValidationReport)> {
    let config: DocsiftConfig =
        serde_json::from_value(value).context("Failed to deserialize config after processing")?;
    let config = apply_all_defaults(config);

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }

    Ok((config, report))
}
