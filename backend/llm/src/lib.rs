//! Chat-completion providers behind the `LlmProvider` trait.

pub mod providers;

pub use providers::mock::MockProvider;
pub use providers::ollama::OllamaProvider;
pub use providers::openrouter::OpenRouterProvider;
pub use providers::ProviderRegistry;
