pub mod downgrade;
pub mod source;

// Re-exports for convenience
pub use downgrade::{plan_rewrite, DowngradeKey, DowngradeResult};
pub use source::{CartoVoyagerSource, ProxyTileSource, TileSource};
