//! Prelude module for common map_replacer types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use map_replacer::prelude::*;`

pub use crate::core::{
    config::{QueryOverrides, Settings, SettingsDocument},
    geo::TileCoord,
};

pub use crate::config::{ConfigResolver, HttpConfigSource};

pub use crate::dom::{
    interceptor::{Hook, InterceptorStats, SeenTileSet, TileInterceptor, TileOutcome},
    memory::MemoryElement,
};

pub use crate::tiles::{
    downgrade::{plan_rewrite, DowngradeKey, DowngradeResult},
    source::{CartoVoyagerSource, ProxyTileSource, TileSource},
};

pub use crate::traits::{ConfigSource, ElementId, TileElement};

pub use crate::{Error as ReplacerError, Result};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};
