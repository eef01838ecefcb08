//! One batch run, end to end.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use docsift_config::defaults::{MAX_TOP_K, MIN_WORDS_FLOOR};
use docsift_config::DocsiftConfig;
use docsift_core::{CancelFlag, Chunk, DocsiftError, DocsiftResult};
use docsift_layout::supplier_for;
use docsift_retrieval::{
    expand_or_fallback, rank_chunks, select_sections, BatchEmbedder, EmbeddingProvider,
    QueryExpander, RankConfig, RankedSection,
};
use docsift_structure::{parse_document, ChunkConfig, ParsedDocument};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::input::{load_input, InputDescriptor};
use crate::output::{write_output, OutputRecord};
use crate::paths::RunPaths;
use crate::providers::{build_embedding_provider, build_expander};

/// Summary of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub output: PathBuf,
    pub record: OutputRecord,
    pub chunk_count: usize,
    pub documents_parsed: usize,
    pub documents_skipped: Vec<String>,
    pub queries: Vec<String>,
    pub elapsed: Duration,
}

/// Parsed documents in descriptor order, plus the names that were skipped.
#[derive(Debug)]
pub struct ParsedBatch {
    pub documents: Vec<ParsedDocument>,
    pub skipped: Vec<String>,
}

/// Parse one file on the current thread. `document` is the name carried
/// into chunks and output.
pub fn parse_file_as(
    path: &Path,
    document: &str,
    config: &ChunkConfig,
) -> DocsiftResult<ParsedDocument> {
    if !path.is_file() {
        return Err(DocsiftError::MissingDocument {
            document: document.to_string(),
        });
    }
    let supplier = supplier_for(path);
    debug!(document, supplier = supplier.name(), "Reading layout");
    let pages = supplier
        .pages(path)
        .map_err(|e| DocsiftError::ParseFailure {
            document: document.to_string(),
            message: format!("{e:#}"),
        })?;
    Ok(parse_document(document, pages, config))
}

/// Parse one file, naming it after its file name.
pub fn parse_file(path: &Path, config: &ChunkConfig) -> DocsiftResult<ParsedDocument> {
    let document = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    parse_file_as(path, &document, config)
}

/// Window sizing from the `chunking` section, validated.
pub fn chunk_config_from(config: &DocsiftConfig) -> DocsiftResult<ChunkConfig> {
    let chunking = config.chunking.clone().unwrap_or_default();
    let defaults = ChunkConfig::default();
    let chunk_config = ChunkConfig {
        chunk_size: chunking.chunk_size.unwrap_or(defaults.chunk_size),
        overlap: chunking.overlap.unwrap_or(defaults.overlap),
        min_words: chunking.min_words.unwrap_or(defaults.min_words),
    };
    chunk_config.validate().map_err(DocsiftError::Config)?;
    if chunk_config.min_words < MIN_WORDS_FLOOR {
        return Err(DocsiftError::Config(format!(
            "minWords ({}) must be >= {MIN_WORDS_FLOOR}",
            chunk_config.min_words
        )));
    }
    Ok(chunk_config)
}

/// Ranking options from the `ranking` section; `topK` must be 1..=5.
pub fn rank_config_from(config: &DocsiftConfig) -> DocsiftResult<RankConfig> {
    let ranking = config.ranking.clone().unwrap_or_default();
    let defaults = RankConfig::default();
    let rank_config = RankConfig {
        top_k: ranking.top_k.unwrap_or(defaults.top_k),
        normalize: ranking.normalize.unwrap_or(defaults.normalize),
    };
    if !(1..=MAX_TOP_K).contains(&rank_config.top_k) {
        return Err(DocsiftError::Config(format!(
            "topK ({}) must be between 1 and {MAX_TOP_K}",
            rank_config.top_k
        )));
    }
    Ok(rank_config)
}

async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
}

pub struct Pipeline {
    chunk_config: ChunkConfig,
    rank_config: RankConfig,
    embedder: BatchEmbedder,
    expander: Option<Arc<dyn QueryExpander>>,
    /// 0 means available parallelism.
    max_parallel_documents: usize,
}

impl Pipeline {
    /// A pipeline with default chunking and ranking and no query expansion.
    pub fn new(embeddings: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            chunk_config: ChunkConfig::default(),
            rank_config: RankConfig::default(),
            embedder: BatchEmbedder::new(embeddings),
            expander: None,
            max_parallel_documents: 0,
        }
    }

    pub fn with_expander(mut self, expander: Option<Arc<dyn QueryExpander>>) -> Self {
        self.expander = expander;
        self
    }

    pub fn with_chunk_config(mut self, config: ChunkConfig) -> Self {
        self.chunk_config = config;
        self
    }

    pub fn with_rank_config(mut self, config: RankConfig) -> Self {
        self.rank_config = config;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.embedder = self.embedder.with_batch_size(batch_size);
        self
    }

    pub fn with_max_parallel_documents(mut self, n: usize) -> Self {
        self.max_parallel_documents = n;
        self
    }

    /// Build from a config that already has defaults applied.
    pub async fn from_config(config: &DocsiftConfig) -> DocsiftResult<Self> {
        let chunk_config = chunk_config_from(config)?;
        let rank_config = rank_config_from(config)?;

        let embedding = config.embedding.clone().unwrap_or_default();
        let provider = build_embedding_provider(&embedding)
            .await
            .map_err(|e| DocsiftError::Config(format!("{e:#}")))?;
        let expander = build_expander(&config.expansion.clone().unwrap_or_default())
            .map_err(|e| DocsiftError::Config(format!("{e:#}")))?;

        let max_parallel = config
            .pipeline
            .as_ref()
            .and_then(|p| p.max_parallel_documents)
            .unwrap_or(0);

        Ok(Self::new(provider)
            .with_expander(expander)
            .with_chunk_config(chunk_config)
            .with_rank_config(rank_config)
            .with_batch_size(embedding.batch_size.unwrap_or(0))
            .with_max_parallel_documents(max_parallel))
    }

    pub fn chunk_config(&self) -> &ChunkConfig {
        &self.chunk_config
    }

    fn parallelism(&self) -> usize {
        if self.max_parallel_documents > 0 {
            return self.max_parallel_documents;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }

    /// Parse every listed document on the blocking pool. Results land in
    /// per-document slots so output order follows the descriptor.
    pub async fn parse_documents(
        &self,
        input: &InputDescriptor,
        pdf_dir: &Path,
        cancel: &CancelFlag,
    ) -> DocsiftResult<ParsedBatch> {
        let semaphore = Arc::new(Semaphore::new(self.parallelism()));
        let mut join_set = JoinSet::new();

        for (idx, doc) in input.documents.iter().enumerate() {
            cancel.check()?;
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|e| DocsiftError::Other(e.into()))?;
            let path = pdf_dir.join(&doc.filename);
            let name = doc.filename.clone();
            let config = self.chunk_config;
            join_set.spawn_blocking(move || {
                let _permit = permit;
                (idx, parse_file_as(&path, &name, &config))
            });
        }

        let mut slots: Vec<Option<ParsedDocument>> =
            (0..input.documents.len()).map(|_| None).collect();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((idx, Ok(parsed))) => slots[idx] = Some(parsed),
                Ok((idx, Err(e))) if e.is_recoverable() => {
                    warn!(document = %input.documents[idx].filename, error = %e, "Skipping document");
                }
                Ok((_, Err(e))) => return Err(e),
                Err(e) => error!(error = %e, "Document parser task panicked"),
            }
        }

        let mut documents = Vec::new();
        let mut skipped = Vec::new();
        for (slot, doc) in slots.into_iter().zip(&input.documents) {
            match slot {
                Some(parsed) => documents.push(parsed),
                None => skipped.push(doc.filename.clone()),
            }
        }
        Ok(ParsedBatch { documents, skipped })
    }

    /// Expanded queries, or the task alone without an expander.
    pub async fn expand_queries(&self, persona: &str, task: &str) -> Vec<String> {
        match &self.expander {
            Some(expander) => expand_or_fallback(expander.as_ref(), persona, task).await,
            None => vec![task.to_string()],
        }
    }

    /// Expand, embed, rank and select. Returns the queries used and the
    /// selected sections.
    pub async fn analyze(
        &self,
        persona: &str,
        task: &str,
        chunks: Vec<Chunk>,
        cancel: &CancelFlag,
    ) -> DocsiftResult<(Vec<String>, Vec<RankedSection>)> {
        let queries = self.expand_queries(persona, task).await;
        cancel.check()?;

        info!(
            chunks = chunks.len(),
            queries = queries.len(),
            provider = self.embedder.provider_name(),
            "Embedding chunks and queries"
        );
        let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        let chunk_vectors = self.embedder.embed_all(&texts).await?;
        let query_texts: Vec<&str> = queries.iter().map(String::as_str).collect();
        let query_vectors = self.embedder.embed_all(&query_texts).await?;

        let ranked = rank_chunks(chunks, &chunk_vectors, &query_vectors, &self.rank_config)?;
        let sections = select_sections(&ranked, self.rank_config.top_k);
        for section in &sections {
            debug!(
                rank = section.importance_rank,
                document = %section.best.chunk.document,
                section = %section.best.chunk.parent_section_title,
                score = section.best.score,
                "Selected section"
            );
        }
        Ok((queries, sections))
    }

    /// Run the batch described by `paths`. Nothing is written unless every
    /// fatal stage succeeds.
    pub async fn run(&self, paths: &RunPaths, cancel: &CancelFlag) -> DocsiftResult<RunReport> {
        let started = Instant::now();

        if !is_dir(&paths.input_dir).await {
            return Err(DocsiftError::MissingInput(format!(
                "input directory not found at {}",
                paths.input_dir.display()
            )));
        }
        let input = load_input(&paths.input_path()).await?;
        let pdf_dir = paths.pdf_dir();
        if !is_dir(&pdf_dir).await {
            return Err(DocsiftError::MissingInput(format!(
                "PDF directory not found at {}",
                pdf_dir.display()
            )));
        }

        info!(
            persona = %input.persona(),
            task = %input.task(),
            documents = input.documents.len(),
            "Starting run"
        );

        let batch = self.parse_documents(&input, &pdf_dir, cancel).await?;
        let documents_parsed = batch.documents.len();
        let chunks: Vec<Chunk> = batch
            .documents
            .into_iter()
            .flat_map(|d| d.chunks)
            .collect();
        if chunks.is_empty() {
            return Err(DocsiftError::EmptyResult {
                documents: documents_parsed,
                min_words: self.chunk_config.min_words,
            });
        }
        let chunk_count = chunks.len();
        info!(
            documents = documents_parsed,
            skipped = batch.skipped.len(),
            chunks = chunk_count,
            "Documents parsed"
        );

        let (queries, sections) = self
            .analyze(input.persona(), input.task(), chunks, cancel)
            .await?;

        let record = OutputRecord::new(&input, &sections, Utc::now());
        let output = paths.output_path();
        write_output(&output, &record).await?;

        let report = RunReport {
            output,
            record,
            chunk_count,
            documents_parsed,
            documents_skipped: batch.skipped,
            queries,
            elapsed: started.elapsed(),
        };
        info!(
            output = %report.output.display(),
            sections = report.record.extracted_sections.len(),
            chunks = report.chunk_count,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Run complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsift_llm::MockProvider;
    use docsift_retrieval::{LlmQueryExpander, MockEmbeddings};
    use serde_json::json;

    /// (y0, text, size, bold) per block, one vector per page.
    type PageSpec = Vec<(f32, String, f32, bool)>;

    fn repeat(phrase: &str, n: usize) -> String {
        vec![phrase; n].join(" ")
    }

    fn filler(prefix: &str, n: usize) -> String {
        (0..n)
            .map(|i| format!("{prefix}{i}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn block(y0: f32, text: String, size: f32, bold: bool) -> (f32, String, f32, bool) {
        (y0, text, size, bold)
    }

    fn dump(pages: &[PageSpec]) -> String {
        let pages: Vec<_> = pages
            .iter()
            .map(|blocks| {
                let blocks: Vec<_> = blocks
                    .iter()
                    .map(|(y0, text, size, bold)| {
                        json!({
                            "bbox": [72.0, y0, 540.0, y0 + size],
                            "lines": [{"spans": [{
                                "text": text,
                                "size": size,
                                "font": "Helvetica",
                                "flags": if *bold { 16 } else { 0 }
                            }]}]
                        })
                    })
                    .collect();
                json!({ "blocks": blocks })
            })
            .collect();
        json!({ "pages": pages }).to_string()
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        paths: RunPaths,
    }

    impl Fixture {
        fn new(documents: &[&str]) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let input_dir = dir.path().join("input");
            std::fs::create_dir_all(input_dir.join("PDFs")).unwrap();
            let docs: Vec<_> = documents.iter().map(|d| json!({ "filename": d })).collect();
            let input = json!({
                "documents": docs,
                "persona": {"role": "Analyst"},
                "job_to_be_done": {"task": "find risks"}
            });
            std::fs::write(input_dir.join("challenge1b_input.json"), input.to_string()).unwrap();
            let paths = RunPaths::default()
                .with_input_dir(&input_dir)
                .with_output_dir(dir.path().join("output"));
            Self { _dir: dir, paths }
        }

        /// A placeholder PDF with a sibling layout dump.
        fn add_document(&self, filename: &str, pages: &[PageSpec]) {
            let pdf = self.paths.pdf_dir().join(filename);
            std::fs::write(&pdf, b"%PDF-1.5 placeholder").unwrap();
            std::fs::write(docsift_layout::sibling_dump_path(&pdf), dump(pages)).unwrap();
        }

        fn add_raw(&self, filename: &str, bytes: &[u8]) {
            std::fs::write(self.paths.pdf_dir().join(filename), bytes).unwrap();
        }
    }

    fn risk_report() -> Vec<PageSpec> {
        vec![
            vec![
                block(40.0, "Risk Review 2024".into(), 24.0, true),
                block(100.0, "Market Exposure".into(), 18.0, true),
                block(
                    130.0,
                    format!("{} {}", repeat("market risk", 8), filler("m", 10)),
                    10.0,
                    false,
                ),
                block(300.0, "Credit Quality".into(), 18.0, true),
                block(
                    330.0,
                    format!("{} {}", repeat("credit risk", 6), filler("c", 12)),
                    10.0,
                    false,
                ),
            ],
            vec![block(
                60.0,
                format!("{} {}", repeat("operational risk", 5), filler("o", 12)),
                10.0,
                false,
            )],
        ]
    }

    fn growth_plan() -> Vec<PageSpec> {
        vec![vec![
            block(40.0, "Growth Plan".into(), 24.0, true),
            block(100.0, "Revenue Targets".into(), 18.0, true),
            block(
                130.0,
                format!("{} {}", repeat("revenue", 10), filler("g", 15)),
                10.0,
                false,
            ),
        ]]
    }

    fn analyst_pipeline() -> Pipeline {
        let chat = Arc::new(
            MockProvider::new("mock")
                .with_response("1. risk factors\n2. market risk\n3. credit risk\n4. operational risk"),
        );
        let embeddings = Arc::new(MockEmbeddings::with_axes([
            "risk",
            "market",
            "credit",
            "operational",
            "revenue",
        ]));
        Pipeline::new(embeddings)
            .with_expander(Some(Arc::new(LlmQueryExpander::new(chat, "t5-small"))))
            .with_max_parallel_documents(2)
    }

    #[tokio::test]
    async fn analyst_finds_risk_sections_first() {
        let fixture = Fixture::new(&["risks.pdf", "growth.pdf"]);
        fixture.add_document("risks.pdf", &risk_report());
        fixture.add_document("growth.pdf", &growth_plan());

        let report = analyst_pipeline()
            .run(&fixture.paths, &CancelFlag::new())
            .await
            .unwrap();

        assert_eq!(
            report.queries,
            vec!["risk factors", "market risk", "credit risk", "operational risk"]
        );
        assert_eq!(report.documents_parsed, 2);
        assert_eq!(report.chunk_count, 4);

        let sections: Vec<(&str, &str, usize, u32)> = report
            .record
            .extracted_sections
            .iter()
            .map(|s| {
                (
                    s.document.as_str(),
                    s.section_title.as_str(),
                    s.importance_rank,
                    s.page_number,
                )
            })
            .collect();
        // The page-2 chunk continues "Credit Quality" and loses to its page-1 sibling.
        assert_eq!(
            sections,
            vec![
                ("risks.pdf", "Market Exposure", 1, 1),
                ("risks.pdf", "Credit Quality", 2, 1),
                ("growth.pdf", "Revenue Targets", 3, 1),
            ]
        );
        assert!(report.record.subsection_analysis[0]
            .refined_text
            .starts_with("market risk market risk"));
        assert_eq!(report.record.metadata.persona, "Analyst");
        assert_eq!(report.record.metadata.job_to_be_done, "find risks");
        assert_eq!(
            report.record.metadata.input_documents,
            vec!["risks.pdf", "growth.pdf"]
        );

        let written: OutputRecord =
            serde_json::from_str(&std::fs::read_to_string(&report.output).unwrap()).unwrap();
        assert_eq!(written, report.record);
    }

    #[tokio::test]
    async fn sections_are_distinct_and_capped() {
        let fixture = Fixture::new(&["many.pdf"]);
        let mut page = vec![block(20.0, "Handbook Of Risks".into(), 24.0, true)];
        for i in 0..7 {
            let y = 60.0 + i as f32 * 100.0;
            page.push(block(y, format!("Topic Number {i}"), 18.0, true));
            page.push(block(
                y + 30.0,
                format!("{} {}", repeat("risk", i + 1), filler("t", 25)),
                10.0,
                false,
            ));
        }
        fixture.add_document("many.pdf", &[page]);

        let report = analyst_pipeline()
            .run(&fixture.paths, &CancelFlag::new())
            .await
            .unwrap();
        let sections = &report.record.extracted_sections;
        assert_eq!(sections.len(), 5);
        let ranks: Vec<usize> = sections.iter().map(|s| s.importance_rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4, 5]);
        let mut keys: Vec<(&str, &str)> = sections
            .iter()
            .map(|s| (s.document.as_str(), s.section_title.as_str()))
            .collect();
        assert_eq!(keys[0].1, "Topic Number 6");
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), 5);
    }

    #[tokio::test]
    async fn missing_and_unparseable_documents_are_skipped() {
        let fixture = Fixture::new(&["absent.pdf", "broken.pdf", "risks.pdf"]);
        fixture.add_raw("broken.pdf", b"not a pdf at all");
        fixture.add_document("risks.pdf", &risk_report());

        let report = analyst_pipeline()
            .run(&fixture.paths, &CancelFlag::new())
            .await
            .unwrap();
        assert_eq!(report.documents_parsed, 1);
        assert_eq!(report.documents_skipped, vec!["absent.pdf", "broken.pdf"]);
        assert_eq!(
            report.record.metadata.input_documents,
            vec!["absent.pdf", "broken.pdf", "risks.pdf"]
        );
    }

    #[tokio::test]
    async fn missing_input_dir_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let paths = RunPaths::default()
            .with_input_dir(dir.path().join("nope"))
            .with_output_dir(dir.path().join("out"));
        let err = analyst_pipeline()
            .run(&paths, &CancelFlag::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DocsiftError::MissingInput(_)));
        assert!(!paths.output_path().exists());
    }

    #[tokio::test]
    async fn missing_pdf_dir_is_fatal() {
        let fixture = Fixture::new(&["risks.pdf"]);
        std::fs::remove_dir_all(fixture.paths.pdf_dir()).unwrap();
        let err = analyst_pipeline()
            .run(&fixture.paths, &CancelFlag::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DocsiftError::MissingInput(_)));
    }

    #[tokio::test]
    async fn no_surviving_chunks_writes_nothing() {
        let fixture = Fixture::new(&["short.pdf"]);
        fixture.add_document(
            "short.pdf",
            &[vec![
                block(40.0, "Tiny Memo".into(), 24.0, true),
                block(80.0, filler("w", 20), 10.0, false),
            ]],
        );
        let err = analyst_pipeline()
            .run(&fixture.paths, &CancelFlag::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DocsiftError::EmptyResult {
                documents: 1,
                min_words: 20
            }
        ));
        assert!(!fixture.paths.output_path().exists());
    }

    #[tokio::test]
    async fn embedding_failure_is_fatal_and_writes_nothing() {
        let fixture = Fixture::new(&["risks.pdf"]);
        fixture.add_document("risks.pdf", &risk_report());
        let pipeline =
            Pipeline::new(Arc::new(MockEmbeddings::hashed(8).failing("model not loaded")));
        let err = pipeline
            .run(&fixture.paths, &CancelFlag::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DocsiftError::EmbeddingFailure(_)));
        assert!(!fixture.paths.output_path().exists());
    }

    #[tokio::test]
    async fn cancelled_run_stops_before_parsing() {
        let fixture = Fixture::new(&["risks.pdf"]);
        fixture.add_document("risks.pdf", &risk_report());
        let cancel = CancelFlag::new();
        cancel.cancel();
        let err = analyst_pipeline()
            .run(&fixture.paths, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, DocsiftError::Cancelled));
        assert!(!fixture.paths.output_path().exists());
    }

    #[tokio::test]
    async fn failed_expansion_uses_the_task() {
        let fixture = Fixture::new(&["risks.pdf"]);
        fixture.add_document("risks.pdf", &risk_report());
        let chat = Arc::new(MockProvider::new("mock").failing("connection refused"));
        let pipeline = Pipeline::new(Arc::new(MockEmbeddings::with_axes(["risk"])))
            .with_expander(Some(Arc::new(LlmQueryExpander::new(chat, "t5-small"))));
        let report = pipeline
            .run(&fixture.paths, &CancelFlag::new())
            .await
            .unwrap();
        assert_eq!(report.queries, vec!["find risks"]);
    }

    #[tokio::test]
    async fn reruns_are_identical_apart_from_timestamp() {
        let fixture = Fixture::new(&["risks.pdf", "growth.pdf"]);
        fixture.add_document("risks.pdf", &risk_report());
        fixture.add_document("growth.pdf", &growth_plan());

        let pipeline = analyst_pipeline();
        let first = pipeline.run(&fixture.paths, &CancelFlag::new()).await.unwrap();
        let second = pipeline.run(&fixture.paths, &CancelFlag::new()).await.unwrap();
        assert_eq!(
            serde_json::to_string(&first.record.extracted_sections).unwrap(),
            serde_json::to_string(&second.record.extracted_sections).unwrap()
        );
        assert_eq!(
            serde_json::to_string(&first.record.subsection_analysis).unwrap(),
            serde_json::to_string(&second.record.subsection_analysis).unwrap()
        );
    }

    #[test]
    fn parse_file_names_document_after_file() {
        let fixture = Fixture::new(&[]);
        fixture.add_document("risks.pdf", &risk_report());
        let parsed = parse_file(
            &fixture.paths.pdf_dir().join("risks.pdf"),
            &ChunkConfig::default(),
        )
        .unwrap();
        assert_eq!(parsed.document, "risks.pdf");
        assert_eq!(parsed.title.as_deref(), Some("Risk Review 2024"));
        assert_eq!(parsed.page_count, 2);
    }

    #[tokio::test]
    async fn from_config_rejects_bad_chunking() {
        let mut config = docsift_config::apply_all_defaults(DocsiftConfig::default());
        if let Some(chunking) = config.chunking.as_mut() {
            chunking.overlap = Some(200);
        }
        if let Some(embedding) = config.embedding.as_mut() {
            embedding.provider = Some("mock".into());
            embedding.dimension = Some(8);
        }
        assert!(matches!(
            Pipeline::from_config(&config).await,
            Err(DocsiftError::Config(_))
        ));
    }

    #[test]
    fn config_conversion_keeps_output_bounds() {
        let mut config = docsift_config::apply_all_defaults(DocsiftConfig::default());
        assert_eq!(rank_config_from(&config).unwrap().top_k, 5);
        assert_eq!(chunk_config_from(&config).unwrap().min_words, 20);

        if let Some(ranking) = config.ranking.as_mut() {
            ranking.top_k = Some(8);
        }
        if let Some(chunking) = config.chunking.as_mut() {
            chunking.min_words = Some(3);
        }
        assert!(matches!(rank_config_from(&config), Err(DocsiftError::Config(_))));
        assert!(matches!(chunk_config_from(&config), Err(DocsiftError::Config(_))));
    }

    #[tokio::test]
    async fn from_config_builds_mock_pipeline() {
        let mut config = docsift_config::apply_all_defaults(DocsiftConfig::default());
        if let Some(embedding) = config.embedding.as_mut() {
            embedding.provider = Some("mock".into());
            embedding.model = None;
            embedding.dimension = Some(8);
        }
        let pipeline = Pipeline::from_config(&config).await.unwrap();
        assert_eq!(pipeline.chunk_config(), &ChunkConfig::default());
        assert_eq!(
            pipeline.expand_queries("Analyst", "find risks").await[0],
            "find risks"
        );
    }
}
