//! Structured Logger
//!
//! Wraps `tracing` with an env-controlled filter, a pretty or JSON console
//! layer and an optional rolling NDJSON file layer.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt as tfmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_PREFIX: &str = "docsift";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => bail!("Unknown log format '{other}'"),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pretty => "pretty",
            Self::Json => "json",
        })
    }
}

#[derive(Debug, Clone)]
pub struct LoggingOptions {
    /// Filter directive, e.g. `info` or `docsift_pipeline=debug`.
    /// `RUST_LOG` takes precedence when set.
    pub level: String,
    pub format: LogFormat,
    /// Directory for `docsift.YYYY-MM-DD.log`; `None` disables file output.
    pub file_dir: Option<PathBuf>,
    pub ansi: bool,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            file_dir: None,
            ansi: true,
        }
    }
}

fn build_filter(level: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level).with_context(|| format!("Invalid log level '{level}'")),
    }
}

fn build_file_appender(options: &LoggingOptions) -> Result<Option<RollingFileAppender>> {
    let Some(dir) = &options.file_dir else {
        return Ok(None);
    };
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .build(dir)
        .with_context(|| format!("Failed to open log file in {}", dir.display()))?;
    Ok(Some(appender))
}

/// Initialize the global logger.
///
/// Only the first successful call installs a subscriber; later calls are
/// no-ops apart from validating their options.
pub fn init_logger(options: &LoggingOptions) -> Result<()> {
    let env_filter = build_filter(&options.level)?;

    let file_layer = build_file_appender(options)?.map(|appender| {
        tfmt::layer()
            .json()
            .with_writer(appender)
            .with_ansi(false)
    });

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer);

    let _ = match options.format {
        LogFormat::Pretty => registry
            .with(
                tfmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_ansi(options.ansi),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                tfmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .try_init(),
    };
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_formats() {
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert_eq!(" JSON ".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("xml".parse::<LogFormat>().is_err());
        assert_eq!(LogFormat::Json.to_string(), "json");
    }

    #[test]
    fn file_dir_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("logs");
        let options = LoggingOptions {
            file_dir: Some(logs.clone()),
            ansi: false,
            ..Default::default()
        };
        init_logger(&options).unwrap();
        assert!(logs.is_dir());
    }

    #[test]
    fn init_twice_is_harmless() {
        let options = LoggingOptions {
            format: LogFormat::Json,
            ..Default::default()
        };
        init_logger(&options).unwrap();
        init_logger(&options).unwrap();
    }
}
