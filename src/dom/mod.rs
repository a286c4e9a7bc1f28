pub mod interceptor;
pub mod memory;
pub mod transform;

// Re-exports for convenience
pub use interceptor::{Hook, InterceptorStats, SeenTileSet, TileInterceptor, TileOutcome};
pub use memory::{MemoryDocument, MemoryElement};
