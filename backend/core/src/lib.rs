pub mod cancel;
pub mod error;
pub mod traits;
pub mod types;

pub use cancel::CancelFlag;
pub use error::{DocsiftError, DocsiftResult};
pub use traits::{BlockSupplier, LlmProvider, LlmRequest, LlmResponse};
pub use types::{
    Block, BlockRole, Chunk, Header, Line, RawBlock, ScoredChunk, SectionKey, Span,
};
