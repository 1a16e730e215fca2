use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use crate::core::cache::{InMemoryTableCache, TableCache};
use crate::core::fonts::FontChain;
use crate::core::render::{default_search_dirs, ComparisonRenderer, RenderSettings};
use crate::core::store::SimilarityStore;
use crate::error::{AppError, Result};

/// Configuration for the application
#[derive(Clone, Debug)]
pub struct Config {
    /// Interface to listen on
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Root directory of the persisted score tables
    pub data_dir: PathBuf,
    /// Root directory of the logo images
    pub image_root: PathBuf,
    /// Directory with the web front end and bundled fonts
    pub static_dir: PathBuf,
    /// Comparison image layout
    pub render: RenderSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: String::from("0.0.0.0"),
            port: 5001,
            data_dir: PathBuf::from("."),
            image_root: PathBuf::from("."),
            static_dir: PathBuf::from("static"),
            render: RenderSettings::default(),
        }
    }
}

impl Config {
    /// Build configuration from the environment, after loading `.env` if present.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] if `PORT` is not a valid port number.
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenv::dotenv() {
            log::debug!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(host) = lookup("LOGOSIM_HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("PORT") {
            config.port = port
                .parse()
                .map_err(|_| AppError::Config(format!("invalid PORT: {}", port)))?;
        }
        if let Some(dir) = lookup("LOGOSIM_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("LOGOSIM_IMAGE_ROOT") {
            config.image_root = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("LOGOSIM_STATIC_DIR") {
            config.static_dir = PathBuf::from(dir);
        }
        if let Some(max) = lookup("LOGOSIM_MAX_EXPORT_LOGOS") {
            config.render.max_logos = max
                .parse()
                .map_err(|_| AppError::Config(format!("invalid LOGOSIM_MAX_EXPORT_LOGOS: {}", max)))?;
        }
        Ok(config)
    }

    /// Socket address to bind.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid bind address {}:{}: {}", self.host, self.port, e)))
    }
}

/// Application state that can be shared across handlers
#[derive(Debug)]
pub struct AppState {
    /// Application configuration
    pub config: Config,
    /// Score-table store
    pub store: SimilarityStore,
    /// Comparison image renderer
    pub renderer: ComparisonRenderer,
}

impl AppState {
    /// Create a new application state with default configuration
    pub fn new() -> Arc<Self> {
        Self::with_config(Config::default())
    }

    /// Create a new application state with custom configuration
    pub fn with_config(config: Config) -> Arc<Self> {
        Self::with_cache(config, Arc::new(InMemoryTableCache::new()))
    }

    /// Create a new application state with a caller-supplied table cache
    pub fn with_cache(config: Config, cache: Arc<dyn TableCache>) -> Arc<Self> {
        let store = SimilarityStore::with_cache(config.data_dir.clone(), cache);
        let renderer = ComparisonRenderer::new(
            config.render.clone(),
            default_search_dirs(&config.image_root),
            &FontChain::standard(&config.static_dir),
        );

        Arc::new(Self {
            config,
            store,
            renderer,
        })
    }
}
