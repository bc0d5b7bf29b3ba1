use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "Veridex";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default bind address for the HTTP server.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";

/// Similarity at or above this value counts as a plagiarism match.
pub const DEFAULT_PLAGIARISM_THRESHOLD: f32 = 0.80;

/// Default number of passages retrieved per query.
pub const DEFAULT_TOP_K: usize = 8;

/// Default timeout for a single generation call.
pub const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 120;

/// Default log filter when RUST_LOG is unset.
pub fn default_log_filter() -> &'static str {
    "info,veridex=debug"
}

/// Runtime configuration, resolved once at startup from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server binds to (`VERIDEX_BIND`).
    pub bind_addr: String,
    /// Base URL of the Ollama instance (`VERIDEX_OLLAMA_URL`).
    pub ollama_url: String,
    /// Generation model name (`VERIDEX_MODEL`).
    pub model: String,
    /// Embedding model name (`VERIDEX_EMBED_MODEL`).
    pub embed_model: String,
    /// JSON search endpoint for live augmentation (`VERIDEX_SEARCH_URL`).
    pub search_url: String,
    /// Directory of reference corpus files, one scope per subdirectory
    /// (`VERIDEX_CORPUS_DIR`).
    pub corpus_dir: Option<String>,
    /// Plagiarism match threshold (`VERIDEX_PLAG_THRESHOLD`).
    pub plagiarism_threshold: f32,
    /// Retrieval depth per query (`VERIDEX_TOP_K`).
    pub top_k: usize,
    /// Generation call timeout (`VERIDEX_GENERATION_TIMEOUT_SECS`).
    pub generation_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            ollama_url: "http://localhost:11434".to_string(),
            model: "llama3.1".to_string(),
            embed_model: "nomic-embed-text".to_string(),
            search_url: "http://localhost:8888/search".to_string(),
            corpus_dir: None,
            plagiarism_threshold: DEFAULT_PLAGIARISM_THRESHOLD,
            top_k: DEFAULT_TOP_K,
            generation_timeout: Duration::from_secs(DEFAULT_GENERATION_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Build a configuration from `VERIDEX_*` environment variables,
    /// falling back to defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            bind_addr: env_or("VERIDEX_BIND", defaults.bind_addr),
            ollama_url: env_or("VERIDEX_OLLAMA_URL", defaults.ollama_url),
            model: env_or("VERIDEX_MODEL", defaults.model),
            embed_model: env_or("VERIDEX_EMBED_MODEL", defaults.embed_model),
            search_url: env_or("VERIDEX_SEARCH_URL", defaults.search_url),
            corpus_dir: std::env::var("VERIDEX_CORPUS_DIR").ok(),
            plagiarism_threshold: env_parse_or(
                "VERIDEX_PLAG_THRESHOLD",
                defaults.plagiarism_threshold,
            ),
            top_k: env_parse_or("VERIDEX_TOP_K", defaults.top_k),
            generation_timeout: Duration::from_secs(env_parse_or(
                "VERIDEX_GENERATION_TIMEOUT_SECS",
                DEFAULT_GENERATION_TIMEOUT_SECS,
            )),
        }
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

fn env_parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
