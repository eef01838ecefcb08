//! Config loading shared by every subcommand.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use docsift_config::{
    collect_referenced_vars, config_file_path, load_and_prepare, load_config_value, DocsiftConfig,
    ValidationReport,
};
use docsift_logging::{LogFormat, LoggingOptions};

/// A resolved config plus where it came from.
pub struct Settings {
    pub path: PathBuf,
    pub config: DocsiftConfig,
    pub report: ValidationReport,
    /// `${VAR}` names the file refers to.
    pub env_refs: Vec<String>,
}

impl Settings {
    /// Resolve, load and validate. Validation errors are returned in the
    /// report; use [`Settings::ensure_valid`] where they are fatal.
    pub async fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = config_file_path(explicit);
        let env_refs = collect_referenced_vars(&load_config_value(&path).await?);
        let (config, report) = load_and_prepare(&path).await?;
        Ok(Self {
            path,
            config,
            report,
            env_refs,
        })
    }

    pub fn ensure_valid(&self) -> Result<()> {
        if self.report.is_valid() {
            return Ok(());
        }
        let messages: Vec<String> = self.report.errors.iter().map(|e| e.to_string()).collect();
        bail!(
            "Invalid config {}:\n  {}",
            self.path.display(),
            messages.join("\n  ")
        )
    }

    /// Logging options from the `logging` section; `level` overrides it.
    pub fn logging_options(&self, level: Option<&str>) -> LoggingOptions {
        let logging = self.config.logging.clone().unwrap_or_default();
        let defaults = LoggingOptions::default();
        LoggingOptions {
            level: level
                .map(str::to_string)
                .or(logging.level)
                .unwrap_or(defaults.level),
            format: logging
                .format
                .as_deref()
                .and_then(|f| f.parse::<LogFormat>().ok())
                .unwrap_or(defaults.format),
            file_dir: logging.file_dir.map(PathBuf::from),
            ansi: crate::terminal_output::supports_color(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_gives_valid_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(Some(&dir.path().join("none.yaml"))).await.unwrap();
        settings.ensure_valid().unwrap();
        let options = settings.logging_options(None);
        assert_eq!(options.level, "info");
        assert_eq!(options.format, LogFormat::Pretty);
        assert!(options.file_dir.is_none());
    }

    #[tokio::test]
    async fn flag_overrides_logging_level() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docsift.yaml");
        std::fs::write(&path, "logging:\n  level: warn\n  format: json\n  fileDir: /var/log/docsift\n")
            .unwrap();
        let settings = Settings::load(Some(&path)).await.unwrap();
        let options = settings.logging_options(Some("debug"));
        assert_eq!(options.level, "debug");
        assert_eq!(options.format, LogFormat::Json);
        assert_eq!(options.file_dir, Some(PathBuf::from("/var/log/docsift")));
    }

    #[tokio::test]
    async fn validation_errors_are_fatal_on_demand() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docsift.yaml");
        std::fs::write(&path, "ranking:\n  topK: 0\n").unwrap();
        let settings = Settings::load(Some(&path)).await.unwrap();
        assert!(settings.env_refs.is_empty());
        let err = settings.ensure_valid().unwrap_err();
        assert!(err.to_string().contains("ranking.topK"));
    }
}
