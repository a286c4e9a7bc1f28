pub mod resolver;
pub mod source;

// Re-exports for convenience
pub use resolver::ConfigResolver;
pub use source::{HttpConfigSource, StaticConfigSource};
