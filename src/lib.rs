//! # Map Replacer
//!
//! Redirects the raster tiles a Leaflet map renders to an alternate tile
//! provider behind a local proxy, while masking that the alternate provider
//! stops at a lower zoom level than the original one.
//!
//! The crate is split into a pure rewrite engine ([`tiles`]), a layered
//! settings resolver ([`config`]), and a DOM interception layer ([`dom`])
//! that works against any tree implementing [`traits::TileElement`]. The
//! browser binding lives in `web` behind the `wasm` feature.

pub mod config;
pub mod core;
pub mod dom;
pub mod prelude;
pub mod tiles;
pub mod traits;
#[cfg(feature = "wasm")]
pub mod web;

pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    config::{QueryOverrides, Settings},
    geo::TileCoord,
};

pub use config::{ConfigResolver, HttpConfigSource};

pub use dom::{
    interceptor::{Hook, InterceptorStats, TileInterceptor, TileOutcome},
    memory::MemoryElement,
};

pub use tiles::{
    downgrade::{plan_rewrite, DowngradeKey, DowngradeResult},
    source::{CartoVoyagerSource, ProxyTileSource, TileSource},
};

pub use traits::{ConfigSource, ElementId, TileElement};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, ReplacerError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum ReplacerError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP status {0}")]
    HttpStatus(u16),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Malformed config document: {0}")]
    MalformedConfig(String),

    #[error("JavaScript error: {0}")]
    Js(String),
}

/// Error type alias for convenience
pub type Error = ReplacerError;

/// Install the logger for the current host.
///
/// In the browser, log records go to the developer console; native hosts use
/// `env_logger` when the `debug` feature is enabled. Calling it twice is
/// harmless.
pub fn init_logging() {
    #[cfg(feature = "wasm")]
    web::logging::init();

    #[cfg(all(feature = "debug", not(feature = "wasm")))]
    {
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .try_init();
    }
}
