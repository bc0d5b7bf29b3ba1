use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use veridex::api::server::serve;
use veridex::api::types::AppContext;
use veridex::config::{self, Config};
use veridex::corpus::index::CorpusIndex;
use veridex::embedding::embedder::{OllamaEmbedder, DEFAULT_EMBEDDING_DIM};
use veridex::generation::ollama::{OllamaClient, OllamaGenerator};
use veridex::retrieval::live::HttpSearchClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    let config = Config::from_env();
    tracing::info!(version = config::APP_VERSION, "{} starting", config::APP_NAME);

    let generator = Arc::new(OllamaGenerator::new(
        OllamaClient::new(&config.ollama_url, config.generation_timeout.as_secs())?,
        config.model.clone(),
    ));
    let embedder = Arc::new(OllamaEmbedder::new(
        OllamaClient::new(&config.ollama_url, config.generation_timeout.as_secs())?,
        config.embed_model.clone(),
        DEFAULT_EMBEDDING_DIM,
    ));
    let live_search = Arc::new(HttpSearchClient::new(&config.search_url)?);

    // The corpus index is built once here and never mutated afterwards;
    // re-indexing is an external concern.
    let index = match &config.corpus_dir {
        Some(dir) => {
            let index = CorpusIndex::load_dir(Path::new(dir), &*embedder).await?;
            tracing::info!(
                scopes = index.scope_names().len(),
                passages = index.passage_count(),
                "reference corpus loaded"
            );
            Arc::new(index)
        }
        None => {
            tracing::warn!("VERIDEX_CORPUS_DIR unset — starting with an empty corpus index");
            Arc::new(CorpusIndex::new())
        }
    };

    let bind_addr = config.bind_addr.clone();
    let ctx = AppContext::new(index, embedder, generator, live_search, config);

    serve(ctx, &bind_addr).await?;
    Ok(())
}
