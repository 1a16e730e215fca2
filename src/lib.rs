#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

//! # logosim
//!
//! Browse precomputed visual-similarity scores between logo images and export
//! side-by-side comparison images.
//!
//! ## Features
//!
//! - **Similarity Store**: load block4 (feature cosine) or SSIM score tables per
//!   logo set, with path canonicalization and a pluggable table cache
//! - **Neighbor Queries**: every image paired with an anchor, ranked by score
//! - **Comparison Rendering**: rounded thumbnail cards with labels and scores,
//!   encoded as PNG, with graceful fallbacks for missing images and fonts
//! - **Web API**: HTTP endpoints for listing logos, querying neighbors, serving
//!   images and exporting comparisons
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use logosim::{Scheme, SetLabel, SimilarityStore, Result};
//!
//! fn main() -> Result<()> {
//!     let store = SimilarityStore::new("data");
//!     let set = SetLabel::new("A")?;
//!     for neighbor in store.similar(Scheme::Ssim, &set, "logo_001.png")? {
//!         println!("{} {:.3}", neighbor.identifier, neighbor.score);
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod core;
/// Defines the application's error types and result aliases.
pub mod error;
pub mod models;
mod state;
mod utils;

#[allow(dead_code, missing_docs, unreachable_pub)]
mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

// Public API exports
pub use crate::{
    core::{
        cache::{InMemoryTableCache, NoCache, TableCache},
        canonical::canonicalize,
        fonts::{FontChain, FontSource, TextRenderer},
        render::{ComparisonRenderer, RenderSettings},
        store::{find_neighbors, list_distinct_images, SimilarityStore},
    },
    error::{AppError, Result, ResultExt},
    models::{
        export::{ComparisonEntry, ExportRequest, SimilarLogo},
        scores::{NeighborResult, PairKey, Scheme, ScoreTable, SetLabel},
    },
    state::{AppState, Config},
};

#[cfg(feature = "web")]
pub use crate::api::{create_router, health_check};

/// Initialize logging
///
/// Installs a `tracing` subscriber filtered by `RUST_LOG` (default `info`).
/// Records emitted through the `log` macros are captured as well.
///
/// # Errors
///
/// Returns an error if a global subscriber has already been installed.
///
/// # Example
///
/// ```no_run
/// use logosim::init;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     init()?;
///     // Application code here
///     Ok(())
/// }
/// ```
pub fn init() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| AppError::Config(format!("logging already initialized: {}", e)))?;

    log::info!("Initializing logosim {}", built_info::PKG_VERSION);
    Ok(())
}
