//! Batch run orchestration for docsift.
//!
//! Reads the input descriptor, parses every listed document in parallel,
//! expands the persona's task into queries, ranks all chunks and writes
//! the top sections as one JSON record.

pub mod input;
pub mod output;
pub mod paths;
pub mod providers;
pub mod runner;

pub use input::{load_input, InputDescriptor};
pub use output::{write_output, OutputRecord};
pub use paths::RunPaths;
pub use providers::{build_embedding_provider, build_expander, embedding_kind};
pub use runner::{
    chunk_config_from, parse_file, parse_file_as, rank_config_from, ParsedBatch, Pipeline,
    RunReport,
};
