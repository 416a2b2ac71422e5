//! Server state and configuration.

use std::sync::Arc;
use std::time::Duration;

use crate::assets::{AssetContext, HttpImageSource};
use crate::batch::BatchDriver;
use crate::error::LabelError;
use crate::export::ExportEngine;
use crate::label::LabelCatalog;
use crate::store::{DesignStore, MemoryStore};

use super::auth::{AllowAnonymous, SessionProvider, StaticTokens};

/// Decoded images unused for this long are dropped from the cache.
pub const IMAGE_CACHE_TTL_SECS: u64 = 30 * 60;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:8080")
    pub listen_addr: String,
    /// Accepted bearer tokens. Empty means no authentication.
    pub tokens: Vec<String>,
    /// User agent for image fetches.
    pub user_agent: String,
    /// Per-request timeout for image fetches.
    pub fetch_timeout_secs: Option<u64>,
    pub max_batch_rows: usize,
    /// Persisted batch artifacts are dropped this long after creation.
    pub artifact_ttl_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            tokens: Vec::new(),
            user_agent: crate::assets::DEFAULT_USER_AGENT.to_string(),
            fetch_timeout_secs: Some(15),
            max_batch_rows: 1000,
            artifact_ttl_secs: 60 * 60,
        }
    }
}

/// Application state shared across handlers.
pub struct AppState {
    pub config: ServerConfig,
    pub engine: ExportEngine,
    pub batch: BatchDriver,
    pub store: Arc<dyn DesignStore>,
    pub sessions: Arc<dyn SessionProvider>,
}

impl AppState {
    /// State with an HTTP image source (remote URLs only, no `file://`),
    /// in-memory storage and sessions from the configured tokens.
    pub fn new(config: ServerConfig) -> Result<Self, LabelError> {
        let timeout = config.fetch_timeout_secs.map(Duration::from_secs);
        let source = HttpImageSource::new(&config.user_agent, timeout)
            .map_err(|e| LabelError::Server(e.to_string()))?;
        let engine = ExportEngine::new(AssetContext::standard(source));
        let sessions: Arc<dyn SessionProvider> = if config.tokens.is_empty() {
            Arc::new(AllowAnonymous)
        } else {
            Arc::new(StaticTokens::new(config.tokens.iter().cloned()))
        };
        Ok(Self::with_parts(config, engine, Arc::new(MemoryStore::new()), sessions))
    }

    pub fn with_parts(
        config: ServerConfig,
        engine: ExportEngine,
        store: Arc<dyn DesignStore>,
        sessions: Arc<dyn SessionProvider>,
    ) -> Self {
        Self {
            config,
            batch: BatchDriver::new(engine.clone()),
            engine,
            store,
            sessions,
        }
    }

    pub fn labels(&self) -> &LabelCatalog {
        self.engine.labels()
    }
}
