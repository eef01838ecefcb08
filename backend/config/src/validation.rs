//! Config validation with field paths in every message.

use thiserror::Error;

use crate::defaults::{MAX_TOP_K, MIN_WORDS_FLOOR};
use crate::schema::DocsiftConfig;

pub const EMBEDDING_PROVIDERS: &[&str] = &["local", "ollama", "openai", "mock"];
pub const EXPANSION_PROVIDERS: &[&str] = &["heuristic", "ollama", "openrouter", "none"];
pub const LOG_FORMATS: &[&str] = &["pretty", "json"];
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// All errors and warnings found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate a config. Meant to run after defaults are applied; unset
/// fields are skipped.
pub fn validate(config: &DocsiftConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_chunking(config, &mut report);
    validate_ranking(config, &mut report);
    validate_embedding(config, &mut report);
    validate_expansion(config, &mut report);
    validate_paths(config, &mut report);
    validate_logging(config, &mut report);
    report
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map(str::trim).map_or(true, str::is_empty)
}

fn validate_chunking(config: &DocsiftConfig, report: &mut ValidationReport) {
    let Some(chunking) = &config.chunking else { return };
    if chunking.chunk_size == Some(0) {
        report.error("chunking.chunkSize", "chunkSize must be > 0");
    }
    if let (Some(size), Some(overlap)) = (chunking.chunk_size, chunking.overlap) {
        if overlap >= size {
            report.error(
                "chunking.overlap",
                format!("overlap ({overlap}) must be smaller than chunkSize ({size})"),
            );
        }
    }
    if let Some(min) = chunking.min_words.filter(|&m| m < MIN_WORDS_FLOOR) {
        report.error(
            "chunking.minWords",
            format!("minWords ({min}) must be >= {MIN_WORDS_FLOOR}"),
        );
    }
    if let (Some(size), Some(min)) = (chunking.chunk_size, chunking.min_words) {
        if min >= size {
            report.warn(
                "chunking.minWords",
                format!("minWords ({min}) >= chunkSize ({size}); no window can be kept"),
            );
        }
    }
}

fn validate_ranking(config: &DocsiftConfig, report: &mut ValidationReport) {
    let Some(ranking) = &config.ranking else { return };
    match ranking.top_k {
        Some(0) => report.error("ranking.topK", "topK must be >= 1"),
        Some(k) if k > MAX_TOP_K => {
            report.error("ranking.topK", format!("topK ({k}) must be <= {MAX_TOP_K}"))
        }
        _ => {}
    }
}

fn validate_embedding(config: &DocsiftConfig, report: &mut ValidationReport) {
    let Some(embedding) = &config.embedding else { return };
    let Some(provider) = embedding.provider.as_deref() else { return };
    if !EMBEDDING_PROVIDERS.contains(&provider) {
        report.error(
            "embedding.provider",
            format!("Unknown embedding provider '{provider}'. Use one of {EMBEDDING_PROVIDERS:?}"),
        );
        return;
    }
    match provider {
        "openai" if is_blank(&embedding.api_key) => {
            report.error("embedding.apiKey", "apiKey is required for the openai provider");
        }
        "mock" if embedding.dimension.unwrap_or(0) == 0 => {
            report.error("embedding.dimension", "dimension must be > 0 for the mock provider");
        }
        "mock" => {
            report.warn("embedding.provider", "mock embeddings carry no semantics");
        }
        _ => {}
    }
}

fn validate_expansion(config: &DocsiftConfig, report: &mut ValidationReport) {
    let Some(expansion) = &config.expansion else { return };
    let Some(provider) = expansion.provider.as_deref() else { return };
    if !EXPANSION_PROVIDERS.contains(&provider) {
        report.error(
            "expansion.provider",
            format!("Unknown expansion provider '{provider}'. Use one of {EXPANSION_PROVIDERS:?}"),
        );
        return;
    }
    if matches!(provider, "ollama" | "openrouter") && is_blank(&expansion.model) {
        report.error(
            "expansion.model",
            format!("model is required for the {provider} provider"),
        );
    }
    if provider == "openrouter" && is_blank(&expansion.api_key) {
        report.error("expansion.apiKey", "apiKey is required for the openrouter provider");
    }
    if let Some(t) = expansion.temperature {
        if !(0.0..=2.0).contains(&t) {
            report.warn("expansion.temperature", format!("temperature {t} is outside 0..=2"));
        }
    }
    if expansion.max_tokens == Some(0) {
        report.error("expansion.maxTokens", "maxTokens must be > 0");
    }
}

fn validate_paths(config: &DocsiftConfig, report: &mut ValidationReport) {
    let Some(paths) = &config.paths else { return };
    for (field, value) in [
        ("paths.inputDir", &paths.input_dir),
        ("paths.outputDir", &paths.output_dir),
        ("paths.inputFile", &paths.input_file),
        ("paths.outputFile", &paths.output_file),
    ] {
        if value.is_some() && is_blank(value) {
            report.error(field, "path cannot be empty");
        }
    }
}

fn validate_logging(config: &DocsiftConfig, report: &mut ValidationReport) {
    let Some(logging) = &config.logging else { return };
    if let Some(format) = logging.format.as_deref() {
        if !LOG_FORMATS.contains(&format) {
            report.error(
                "logging.format",
                format!("Unknown log format '{format}'. Use 'pretty' or 'json'"),
            );
        }
    }
    if let Some(level) = logging.level.as_deref() {
        // Full filter directives like "docsift_pipeline=debug" are allowed.
        if !level.contains('=') && !LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
            report.warn("logging.level", format!("Unrecognised log level '{level}'"));
        }
    }
}
