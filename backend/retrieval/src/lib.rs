//! Retrieval stage: embed chunks and expanded queries, score every chunk by
//! its best-matching query, and select one representative chunk per section.

pub mod batch_embed;
pub mod embeddings;
pub mod query_expansion;
pub mod ranker;
pub mod selector;
pub mod similarity;

pub use batch_embed::BatchEmbedder;
pub use embeddings::{create_provider, EmbeddingProvider, EmbeddingProviderKind, MockEmbeddings};
pub use query_expansion::{
    expand_or_fallback, HeuristicQueryExpander, LlmQueryExpander, QueryExpander,
};
pub use ranker::{rank_chunks, RankConfig};
pub use selector::{select_sections, RankedSection};
