//! Query expansion: turn a persona and task into several search queries.
//!
//! A single task sentence often misses passages that use different
//! phrasing. Expanders produce a handful of alternative queries; ranking
//! then scores each chunk by its best-matching query.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use docsift_core::{DocsiftError, LlmProvider, LlmRequest};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};

/// How many queries the LLM is asked for.
const DEFAULT_QUERY_COUNT: usize = 4;
const DEFAULT_MAX_TOKENS: u32 = 128;

/// Leading list markers such as `1.`, `-` or `1.2.`.
static LIST_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*[\d.\-]+\s*").unwrap());

#[async_trait]
pub trait QueryExpander: Send + Sync {
    fn name(&self) -> &str;
    async fn expand(&self, persona: &str, task: &str) -> Result<Vec<String>>;
}

/// The instruction sent to the LLM.
pub fn expansion_prompt(persona: &str, task: &str) -> String {
    format!(
        "Based on the request from a '{persona}' to '{task}', generate a list of \
         {DEFAULT_QUERY_COUNT} distinct search queries to find the most useful information. \
         Output only a newline-separated list."
    )
}

/// Split an LLM reply into queries: one per line, list markers stripped,
/// blank lines dropped.
pub fn parse_query_list(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| LIST_MARKER.replace(line, "").trim().to_string())
        .filter(|q| !q.is_empty())
        .collect()
}

/// Expands queries with a chat model.
pub struct LlmQueryExpander {
    provider: Arc<dyn LlmProvider>,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl LlmQueryExpander {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: 0.0,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

#[async_trait]
impl QueryExpander for LlmQueryExpander {
    fn name(&self) -> &str {
        self.provider.name()
    }

    async fn expand(&self, persona: &str, task: &str) -> Result<Vec<String>> {
        let request = LlmRequest {
            model: self.model.clone(),
            system_prompt: String::new(),
            user_prompt: expansion_prompt(persona, task),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };
        let response = self.provider.complete(&request).await?;
        debug!(
            provider = %response.provider,
            tokens = response.tokens_used,
            latency_ms = response.latency_ms,
            "Expansion reply received"
        );
        Ok(parse_query_list(&response.content))
    }
}

/// Offline expander built from phrasing variations of the task.
pub struct HeuristicQueryExpander {
    max_queries: usize,
}

impl HeuristicQueryExpander {
    pub fn new(max_queries: usize) -> Self {
        Self {
            max_queries: max_queries.max(1),
        }
    }
}

impl Default for HeuristicQueryExpander {
    fn default() -> Self {
        Self::new(DEFAULT_QUERY_COUNT)
    }
}

#[async_trait]
impl QueryExpander for HeuristicQueryExpander {
    fn name(&self) -> &str {
        "heuristic"
    }

    async fn expand(&self, persona: &str, task: &str) -> Result<Vec<String>> {
        let task = task.trim();
        let persona = persona.trim();
        if task.is_empty() {
            return Ok(Vec::new());
        }
        let lower = task.to_lowercase();
        let mut queries = vec![task.to_string()];

        // Reframe as a question from the persona's point of view.
        if !task.ends_with('?') {
            if persona.is_empty() {
                queries.push(format!("What is needed to {lower}?"));
            } else {
                queries.push(format!("What does the {persona} need to {lower}?"));
            }
        }

        // Keyword disjunction over the content words.
        let keywords: Vec<&str> = task
            .split_whitespace()
            .filter(|w| w.chars().filter(|c| c.is_alphanumeric()).count() > 3)
            .collect();
        if keywords.len() > 1 {
            queries.push(keywords.join(" OR "));
        }

        if !lower.starts_with("how") {
            queries.push(format!("how to {lower}"));
        }

        let mut seen = HashSet::new();
        queries.retain(|q| seen.insert(q.to_lowercase()));
        queries.truncate(self.max_queries);
        Ok(queries)
    }
}

/// Expand, falling back to the task alone when expansion fails or yields
/// nothing usable.
pub async fn expand_or_fallback(
    expander: &dyn QueryExpander,
    persona: &str,
    task: &str,
) -> Vec<String> {
    let failure = match expander.expand(persona, task).await {
        Ok(queries) if !queries.is_empty() => {
            info!(expander = expander.name(), queries = ?queries, "Queries expanded");
            return queries;
        }
        Ok(_) => DocsiftError::ExpansionFailure("no queries returned".into()),
        Err(e) => DocsiftError::ExpansionFailure(format!("{e:#}")),
    };
    warn!(expander = expander.name(), error = %failure, "Falling back to the task as the only query");
    vec![task.to_string()]
}
