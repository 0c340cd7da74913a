//! GreenQuery API
//!
//! A corrective-RAG (CRAG) service for environmental questions:
//! - query decomposition into self-contained sub-questions
//! - per-sub-question retrieve -> grade -> (web search) -> generate cycles
//! - consolidation into markdown or a structured answer card
//!
//! All collaborators (LLM, embeddings, vector index, web search) are
//! dependency-injected at startup; nothing here is process-global.

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use api::state::AppState;
use domain::{
    AnswerGenerator, EmbeddingProvider, LlmProvider, QueryDecomposer, ResponseFormatter,
    Retriever, WebSearchProvider,
};
use infrastructure::llm::{HttpClient, OpenAiProvider, RetryPolicy};
use infrastructure::embedding::OpenAiEmbeddingProvider;
use infrastructure::pipeline::{
    AskPipeline, CragCycle, CycleConfig, LlmAnswerGenerator, LlmCardFormatter,
    LlmQueryDecomposer, LlmRelevanceGrader,
};
use infrastructure::retrieval::{IndexSnapshot, RetrievalConfig, VectorIndexRetriever};
use infrastructure::search::TavilySearchProvider;

/// Create the application state with default configuration
pub fn create_app_state() -> anyhow::Result<AppState> {
    create_app_state_with_config(&AppConfig::default())
}

/// Create the application state: construct every adapter and wire the
/// pipeline
pub fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let api_key = std::env::var("API_KEY")
        .ok()
        .or_else(|| config.auth.api_key.clone())
        .ok_or_else(|| {
            anyhow::anyhow!("API_KEY environment variable or auth.api_key config is required")
        })?;

    let http_client = HttpClient::with_timeout(Duration::from_secs(config.llm.timeout_secs))
        .with_retry(RetryPolicy {
            max_retries: config.llm.max_retries,
            base_backoff: Duration::from_millis(config.llm.retry_backoff_ms),
        });

    let llm_provider = create_llm_provider(config, http_client.clone());
    let retriever = create_retriever(config, http_client.clone())?;
    let web_search = create_web_search(config, http_client);

    let grader = Arc::new(LlmRelevanceGrader::new(
        llm_provider.clone(),
        config.grading_model(),
    ));
    let decomposer: Arc<dyn QueryDecomposer> = Arc::new(LlmQueryDecomposer::new(
        llm_provider.clone(),
        &config.llm.model,
    ));
    let generator: Arc<dyn AnswerGenerator> = Arc::new(LlmAnswerGenerator::new(
        llm_provider.clone(),
        &config.llm.model,
    ));
    let formatter: Arc<dyn ResponseFormatter> = Arc::new(LlmCardFormatter::new(
        llm_provider.clone(),
        &config.llm.model,
    ));

    let cycle_config = match &config.search.trusted_sites {
        Some(sites) => CycleConfig {
            trusted_sites: sites.clone(),
        },
        None => CycleConfig::default(),
    };

    let cycle = CragCycle::new(
        retriever.clone(),
        grader,
        web_search,
        generator.clone(),
        cycle_config,
    );

    let pipeline = AskPipeline::new(decomposer, cycle, generator, formatter);

    info!(
        model = %config.llm.model,
        grading_model = %config.grading_model(),
        "application state wired"
    );

    Ok(AppState::new(
        Arc::new(pipeline),
        retriever,
        api_key,
        Duration::from_secs(config.pipeline.request_timeout_secs),
    ))
}

fn create_llm_provider(config: &AppConfig, http_client: HttpClient) -> Arc<dyn LlmProvider> {
    let api_key =
        std::env::var("OPENAI_API_KEY").unwrap_or_else(|_| "sk-placeholder".to_string());
    let base_url = std::env::var("OPENAI_BASE_URL")
        .ok()
        .or_else(|| config.llm.base_url.clone());

    match base_url {
        Some(url) => {
            info!(%url, "using OpenAI-compatible provider with custom base URL");
            Arc::new(OpenAiProvider::with_base_url(http_client, api_key, url))
        }
        None => Arc::new(OpenAiProvider::new(http_client, api_key)),
    }
}

fn create_retriever(
    config: &AppConfig,
    http_client: HttpClient,
) -> anyhow::Result<Arc<dyn Retriever>> {
    let api_key =
        std::env::var("OPENAI_API_KEY").unwrap_or_else(|_| "sk-placeholder".to_string());

    let embedder: Arc<dyn EmbeddingProvider> = match &config.embedding.base_url {
        Some(url) => Arc::new(OpenAiEmbeddingProvider::with_base_url(
            http_client,
            api_key,
            &config.embedding.model,
            url,
        )),
        None => Arc::new(OpenAiEmbeddingProvider::new(
            http_client,
            api_key,
            &config.embedding.model,
        )),
    };

    let snapshot = IndexSnapshot::load(&config.retrieval.index_path)?;

    Ok(Arc::new(VectorIndexRetriever::new(
        embedder,
        snapshot,
        RetrievalConfig {
            top_k: config.retrieval.top_k,
            similarity_threshold: config.retrieval.similarity_threshold,
        },
    )))
}

fn create_web_search(config: &AppConfig, http_client: HttpClient) -> Arc<dyn WebSearchProvider> {
    let api_key =
        std::env::var("TAVILY_API_KEY").unwrap_or_else(|_| "tvly-placeholder".to_string());

    let provider = match &config.search.base_url {
        Some(url) => TavilySearchProvider::with_base_url(http_client, api_key, url),
        None => TavilySearchProvider::new(http_client, api_key),
    };

    Arc::new(provider.with_max_results(config.search.max_results))
}
