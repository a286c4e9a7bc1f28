use serde::{Deserialize, Serialize};

/// Identifies one raster tile in a standard XYZ web-map tiling scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub z: u8,
}

impl TileCoord {
    pub fn new(x: u32, y: u32, z: u8) -> Self {
        Self { x, y, z }
    }

    /// Gets the parent tile at a lower zoom level
    pub fn parent(&self) -> Option<TileCoord> {
        if self.z == 0 {
            None
        } else {
            Some(TileCoord::new(self.x / 2, self.y / 2, self.z - 1))
        }
    }

    /// Gets the ancestor tile at `zoom` that contains this tile.
    ///
    /// Returns `self` when `zoom` is not coarser than the tile's own level.
    pub fn ancestor(&self, zoom: u8) -> TileCoord {
        if zoom >= self.z {
            return *self;
        }
        let levels = u32::from(self.z - zoom).min(31);
        TileCoord::new(self.x >> levels, self.y >> levels, zoom)
    }

    /// Number of tiles along one axis at this zoom level, if it fits a `u64`.
    pub fn grid_size(&self) -> Option<u64> {
        1u64.checked_shl(u32::from(self.z))
    }

    /// Whether `x`/`y` lie inside the tile grid of this zoom level.
    pub fn is_valid(&self) -> bool {
        match self.grid_size() {
            Some(n) => u64::from(self.x) < n && u64::from(self.y) < n,
            None => true,
        }
    }
}

impl std::fmt::Display for TileCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}
