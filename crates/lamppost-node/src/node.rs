//! Node configuration and wiring.
//!
//! Architecture:
//! - Single daemon process with shared RocksDB storage
//! - HTTP API for clients (context, posts)
//! - Two outbound clients: reverse geocoding and the moderation classifier

use crate::api;
use crate::error::Result;
use crate::geocode::{Geocoder, LocalityLookup};
use crate::moderation::{ContentClassifier, FallbackPolicy, Moderator};
use crate::pipeline::Pipeline;
use crate::query::{QueryEngine, SpatialStrategy};
use crate::storage::Storage;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for a Lamppost node.
#[derive(Debug, Clone)]
pub struct Config {
    /// Data directory for storage
    pub data_dir: PathBuf,

    /// HTTP API listen address
    pub api_addr: SocketAddr,

    /// Root domain label localities hang off of: requests arrive at
    /// `<locality>.<root_domain>.<tld>`
    pub root_domain: String,

    /// Local/developer operation: the write gate always allows
    pub dev_mode: bool,

    /// Reverse-geocoding endpoint
    pub geocode_url: String,

    /// Reverse-geocoding API key
    pub geocode_api_key: String,

    /// Moderation classifier endpoint; unset disables classification
    pub moderation_url: Option<String>,

    /// Bearer token for the classifier
    pub moderation_token: Option<String>,

    /// Classifier model name
    pub moderation_model: String,

    /// What to do when the classifier is unavailable
    pub moderation_fallback: FallbackPolicy,

    /// Spatial filter strategy for coordinate reads
    pub query_strategy: SpatialStrategy,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

impl Config {
    /// Create config from environment variables with sensible defaults.
    pub fn from_env() -> Self {
        let data_dir = PathBuf::from(
            std::env::var("LAMPPOST_DATA_DIR").unwrap_or_else(|_| "./lamppost-data".to_string()),
        );

        let api_addr = std::env::var("LAMPPOST_API_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .expect("Invalid LAMPPOST_API_ADDR");

        let root_domain =
            std::env::var("LAMPPOST_ROOT_DOMAIN").unwrap_or_else(|_| "lamppost".to_string());

        let dev_mode = std::env::var("LAMPPOST_DEV_MODE")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let geocode_url = std::env::var("LAMPPOST_GEOCODE_URL")
            .unwrap_or_else(|_| "https://maps.googleapis.com/maps/api/geocode/json".to_string());
        let geocode_api_key = std::env::var("LAMPPOST_GEOCODE_API_KEY").unwrap_or_default();

        let moderation_url = std::env::var("LAMPPOST_MODERATION_URL")
            .ok()
            .filter(|v| !v.is_empty());
        let moderation_token = std::env::var("LAMPPOST_MODERATION_TOKEN")
            .ok()
            .filter(|v| !v.is_empty());
        let moderation_model = std::env::var("LAMPPOST_MODERATION_MODEL")
            .unwrap_or_else(|_| "llama-3.1-8b-instruct".to_string());
        let moderation_fallback = std::env::var("LAMPPOST_MODERATION_FALLBACK")
            .ok()
            .and_then(|v| FallbackPolicy::from_env_value(&v))
            .unwrap_or(FallbackPolicy::Open);

        let query_strategy = std::env::var("LAMPPOST_QUERY_STRATEGY")
            .ok()
            .and_then(|v| SpatialStrategy::from_env_value(&v))
            .unwrap_or_default();

        Self {
            data_dir,
            api_addr,
            root_domain,
            dev_mode,
            geocode_url,
            geocode_api_key,
            moderation_url,
            moderation_token,
            moderation_model,
            moderation_fallback,
            query_strategy,
        }
    }
}

/// Shared state for the node - the pipeline and config shared by all
/// request handlers.
pub struct NodeState {
    pub pipeline: Pipeline,
    pub config: Config,
}

/// A Lamppost node instance.
pub struct Node {
    state: Arc<NodeState>,
    config: Config,
}

impl Node {
    /// Create a new node.
    pub async fn new(config: Config) -> Result<Self> {
        // Ensure data directory exists
        std::fs::create_dir_all(&config.data_dir)?;

        let storage = Arc::new(Storage::open(&config.data_dir)?);

        let geocoder: Arc<dyn LocalityLookup> = Arc::new(Geocoder::new(
            config.geocode_url.clone(),
            config.geocode_api_key.clone(),
        )?);
        let classifier: Arc<dyn ContentClassifier> = Arc::new(Moderator::new(
            config.moderation_url.clone(),
            config.moderation_token.clone(),
            config.moderation_model.clone(),
            config.moderation_fallback,
        )?);

        let pipeline = Pipeline {
            storage,
            geocoder,
            classifier,
            engine: QueryEngine::new(config.query_strategy),
        };

        let state = Arc::new(NodeState {
            pipeline,
            config: config.clone(),
        });

        Ok(Self { state, config })
    }

    /// Get the shared state (for API handlers).
    pub fn state(&self) -> Arc<NodeState> {
        Arc::clone(&self.state)
    }

    /// Run the node (starts the HTTP server).
    pub async fn run(self) -> Result<()> {
        tracing::info!("Lamppost node starting");
        tracing::info!("  API: http://{}", self.config.api_addr);
        tracing::info!("  Data: {:?}", self.config.data_dir);
        tracing::info!("  Root domain: {}", self.config.root_domain);
        tracing::info!("  Query strategy: {:?}", self.config.query_strategy);
        if self.config.dev_mode {
            tracing::warn!("dev mode enabled, the write gate is open");
        }
        if self.config.moderation_url.is_none() {
            tracing::warn!("no moderation classifier configured, posts publish unmoderated");
        }

        let app = api::build_router(self.state.clone());

        let listener = tokio::net::TcpListener::bind(self.config.api_addr).await?;
        tracing::info!("HTTP server listening on {}", self.config.api_addr);

        axum::serve(listener, app).await?;

        Ok(())
    }
}
