//! Config file lookup, read and atomic write.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::schema::DocsiftConfig;

pub const CONFIG_FILE_NAME: &str = "docsift.yaml";
pub const CONFIG_ENV_VAR: &str = "DOCSIFT_CONFIG";

/// Number of rolling backups kept by `write_config`.
const MAX_BACKUPS: usize = 3;

/// Resolve which config file to use.
/// Priority: explicit path > `DOCSIFT_CONFIG` > `./docsift.yaml` > user config dir.
pub fn config_file_path(explicit: Option<&Path>) -> PathBuf {
    resolve_config_path(
        explicit,
        std::env::var(CONFIG_ENV_VAR).ok().as_deref(),
        Path::new("."),
        dirs::config_dir().as_deref(),
    )
}

fn resolve_config_path(
    explicit: Option<&Path>,
    env_value: Option<&str>,
    cwd: &Path,
    user_config_dir: Option<&Path>,
) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Some(path) = env_value.filter(|v| !v.trim().is_empty()) {
        return PathBuf::from(path);
    }
    let local = cwd.join(CONFIG_FILE_NAME);
    if local.exists() {
        return local;
    }
    match user_config_dir {
        Some(dir) => dir.join("docsift").join(CONFIG_FILE_NAME),
        None => local,
    }
}

/// Read the config file as an untyped value so `${VAR}` references can be
/// resolved before typing. A missing file is an empty mapping.
pub async fn load_config_value(path: &Path) -> Result<Value> {
    if !path.exists() {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(Value::Object(Default::default()));
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let value: Value = serde_yaml::from_str(&raw)
        .with_context(|| format!("Failed to parse config YAML at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded config");
    // An empty file parses as null.
    Ok(if value.is_null() {
        Value::Object(Default::default())
    } else {
        value
    })
}

/// Load and type the config without env substitution or defaults.
pub async fn load_config(path: &Path) -> Result<DocsiftConfig> {
    let value = load_config_value(path).await?;
    serde_json::from_value(value)
        .with_context(|| format!("Invalid config at: {}", path.display()))
}

/// Write config atomically (temp file, then rename), rotating backups of
/// the previous file.
pub async fn write_config(config: &DocsiftConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await.with_context(|| {
            format!("Failed to create config directory: {}", parent.display())
        })?;
    }

    if path.exists() {
        rotate_backups(path).await;
    }

    let yaml = serde_yaml::to_string(config).context("Failed to serialize config to YAML")?;

    let tmp_path = path.with_extension("yaml.tmp");
    fs::write(&tmp_path, yaml.as_bytes())
        .await
        .with_context(|| format!("Failed to write temp config: {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path)
        .await
        .with_context(|| format!("Failed to rename temp config to: {}", path.display()))?;

    info!(path = %path.display(), "Wrote config");
    Ok(())
}

/// docsift.yaml.bak.1 -> .bak.2 -> ... -> .bak.N
async fn rotate_backups(path: &Path) {
    for i in (1..MAX_BACKUPS).rev() {
        let old = path.with_extension(format!("yaml.bak.{i}"));
        let new = path.with_extension(format!("yaml.bak.{}", i + 1));
        if old.exists() {
            if let Err(e) = fs::rename(&old, &new).await {
                warn!("Failed to rotate backup {}: {}", old.display(), e);
            }
        }
    }

    let bak = path.with_extension("yaml.bak.1");
    if let Err(e) = fs::copy(path, &bak).await {
        warn!("Failed to create backup {}: {}", bak.display(), e);
    }
}
