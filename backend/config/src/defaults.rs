//! Config defaults: fill every unset field after loading.

use crate::schema::{
    ChunkingConfig, DocsiftConfig, EmbeddingConfig, ExpansionConfig, LoggingConfig,
    PathsConfig, PipelineConfig, RankingConfig,
};

pub const DEFAULT_CHUNK_SIZE: usize = 150;
pub const DEFAULT_OVERLAP: usize = 30;
pub const DEFAULT_MIN_WORDS: usize = 20;
/// Kept chunks always have more than this many words.
pub const MIN_WORDS_FLOOR: usize = 20;

pub const DEFAULT_TOP_K: usize = 5;
/// Output ranks run from 1 to this.
pub const MAX_TOP_K: usize = 5;

pub const DEFAULT_EMBEDDING_PROVIDER: &str = "local";
pub const DEFAULT_EMBEDDING_MODEL: &str = "all-MiniLM-L6-v2";

pub const DEFAULT_EXPANSION_PROVIDER: &str = "heuristic";
pub const DEFAULT_EXPANSION_MAX_TOKENS: u32 = 128;
pub const DEFAULT_EXPANSION_TIMEOUT_SECS: u64 = 60;

pub const DEFAULT_INPUT_DIR: &str = "/app/input";
pub const DEFAULT_OUTPUT_DIR: &str = "/app/output";
pub const DEFAULT_PDF_SUBDIR: &str = "PDFs";
pub const DEFAULT_INPUT_FILE: &str = "challenge1b_input.json";
pub const DEFAULT_OUTPUT_FILE: &str = "challenge1b_output.json";

pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_FORMAT: &str = "pretty";

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: DocsiftConfig) -> DocsiftConfig {
    let config = apply_chunking_defaults(config);
    let config = apply_ranking_defaults(config);
    let config = apply_embedding_defaults(config);
    let config = apply_expansion_defaults(config);
    let config = apply_path_defaults(config);
    let config = apply_pipeline_defaults(config);
    apply_logging_defaults(config)
}

fn apply_chunking_defaults(mut config: DocsiftConfig) -> DocsiftConfig {
    let chunking = config.chunking.get_or_insert_with(ChunkingConfig::default);
    chunking.chunk_size.get_or_insert(DEFAULT_CHUNK_SIZE);
    chunking.overlap.get_or_insert(DEFAULT_OVERLAP);
    chunking.min_words.get_or_insert(DEFAULT_MIN_WORDS);
    config
}

fn apply_ranking_defaults(mut config: DocsiftConfig) -> DocsiftConfig {
    let ranking = config.ranking.get_or_insert_with(RankingConfig::default);
    ranking.top_k.get_or_insert(DEFAULT_TOP_K);
    ranking.normalize.get_or_insert(false);
    config
}

/// The model default only applies to the local provider; HTTP providers
/// pick their own.
fn apply_embedding_defaults(mut config: DocsiftConfig) -> DocsiftConfig {
    let embedding = config.embedding.get_or_insert_with(EmbeddingConfig::default);
    let provider = embedding
        .provider
        .get_or_insert_with(|| DEFAULT_EMBEDDING_PROVIDER.to_string());
    if provider.as_str() == "local" && embedding.model.is_none() {
        embedding.model = Some(DEFAULT_EMBEDDING_MODEL.to_string());
    }
    embedding.batch_size.get_or_insert(0);
    config
}

fn apply_expansion_defaults(mut config: DocsiftConfig) -> DocsiftConfig {
    let expansion = config.expansion.get_or_insert_with(ExpansionConfig::default);
    expansion
        .provider
        .get_or_insert_with(|| DEFAULT_EXPANSION_PROVIDER.to_string());
    expansion.max_tokens.get_or_insert(DEFAULT_EXPANSION_MAX_TOKENS);
    expansion.temperature.get_or_insert(0.0);
    expansion.timeout_secs.get_or_insert(DEFAULT_EXPANSION_TIMEOUT_SECS);
    config
}

fn apply_path_defaults(mut config: DocsiftConfig) -> DocsiftConfig {
    let paths = config.paths.get_or_insert_with(PathsConfig::default);
    paths.input_dir.get_or_insert_with(|| DEFAULT_INPUT_DIR.to_string());
    paths.output_dir.get_or_insert_with(|| DEFAULT_OUTPUT_DIR.to_string());
    paths.pdf_subdir.get_or_insert_with(|| DEFAULT_PDF_SUBDIR.to_string());
    paths.input_file.get_or_insert_with(|| DEFAULT_INPUT_FILE.to_string());
    paths.output_file.get_or_insert_with(|| DEFAULT_OUTPUT_FILE.to_string());
    config
}

fn apply_pipeline_defaults(mut config: DocsiftConfig) -> DocsiftConfig {
    let pipeline = config.pipeline.get_or_insert_with(PipelineConfig::default);
    pipeline.max_parallel_documents.get_or_insert(0);
    config
}

fn apply_logging_defaults(mut config: DocsiftConfig) -> DocsiftConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    logging.level.get_or_insert_with(|| DEFAULT_LOG_LEVEL.to_string());
    logging.format.get_or_insert_with(|| DEFAULT_LOG_FORMAT.to_string());
    config
}
