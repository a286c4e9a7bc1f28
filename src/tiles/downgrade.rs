//! Tile rewrite planning
//!
//! The alternate provider stops at `max_zoom`. Deeper tiles are served by
//! magnifying their ancestor at `max_zoom` and shifting it so the requested
//! sub-region lands under the requested tile's screen cell.

use crate::core::{config::Settings, geo::TileCoord};

/// The tile actually fetched for one requested tile, plus the visual
/// compensation needed to make it cover the requested cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DowngradeResult {
    /// Coordinate to fetch from the alternate provider.
    pub src: TileCoord,
    /// Magnification factor, `2^(z - max_zoom)` when downgrading, else 1.
    pub scale: u32,
    /// Horizontal pixel shift applied after magnification (never positive).
    pub dx: f64,
    /// Vertical pixel shift applied after magnification (never positive).
    pub dy: f64,
}

impl DowngradeResult {
    pub fn identity(coord: TileCoord) -> Self {
        Self { src: coord, scale: 1, dx: 0.0, dy: 0.0 }
    }

    pub fn is_downgrade(&self) -> bool {
        self.scale > 1
    }

    /// Identity of the synthesized tile for deduplication, keyed by the
    /// fetched tile and the zoom level that was requested.
    pub fn key(&self, requested_zoom: u8) -> DowngradeKey {
        DowngradeKey::new(self.src, requested_zoom)
    }
}

/// `"srcX,srcY,srcZ,z"` – one synthesized tile at one requested zoom level.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DowngradeKey(String);

impl DowngradeKey {
    pub fn new(src: TileCoord, requested_zoom: u8) -> Self {
        Self(format!("{},{},{},{}", src.x, src.y, src.z, requested_zoom))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DowngradeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Decide how to serve `coord` from a provider capped at `settings.max_zoom`.
///
/// Tiles at or below the cap pass through unchanged. Deeper tiles fetch the
/// ancestor at the cap; `dx`/`dy` are the negated offset of the requested
/// tile inside that ancestor, measured in magnified pixels.
pub fn plan_rewrite(coord: TileCoord, settings: &Settings) -> DowngradeResult {
    let max_zoom = settings.max_zoom;
    if coord.z <= max_zoom {
        return DowngradeResult::identity(coord);
    }

    // u32 tile coordinates cannot address anything finer than 31 levels down
    let levels = u32::from(coord.z - max_zoom).min(31);
    let scale = 1u32 << levels;

    let src = TileCoord::new(coord.x / scale, coord.y / scale, max_zoom);

    let tile_size = f64::from(settings.tile_size);
    let offset_x = f64::from(coord.x % scale) * tile_size / f64::from(scale);
    let offset_y = f64::from(coord.y % scale) * tile_size / f64::from(scale);

    DowngradeResult {
        src,
        scale,
        dx: -offset_x * f64::from(scale),
        dy: -offset_y * f64::from(scale),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(max_zoom: u8, tile_size: u32) -> Settings {
        Settings { max_zoom, tile_size, ..Settings::default() }
    }

    #[test]
    fn test_identity_at_and_below_max_zoom() {
        let s = settings(18, 256);
        for z in [0u8, 4, 17, 18] {
            let coord = TileCoord::new(3, 5, z);
            let plan = plan_rewrite(coord, &s);
            assert_eq!(plan, DowngradeResult::identity(coord));
            assert!(!plan.is_downgrade());
        }
    }

    #[test]
    fn test_downgrade_aligned_tile() {
        let plan = plan_rewrite(TileCoord::new(1000, 1000, 20), &settings(18, 256));
        assert_eq!(plan.scale, 4);
        assert_eq!(plan.src, TileCoord::new(250, 250, 18));
        assert_eq!(plan.dx, 0.0);
        assert_eq!(plan.dy, 0.0);
    }

    #[test]
    fn test_downgrade_offset_tile() {
        let plan = plan_rewrite(TileCoord::new(1001, 1003, 20), &settings(18, 256));
        assert_eq!(plan.src, TileCoord::new(250, 250, 18));
        assert_eq!(plan.dx, -256.0);
        assert_eq!(plan.dy, -768.0);
    }

    #[test]
    fn test_fractional_offsets_with_odd_tile_size() {
        let plan = plan_rewrite(TileCoord::new(1, 0, 4), &settings(1, 100));
        assert_eq!(plan.scale, 8);
        assert_eq!(plan.src, TileCoord::new(0, 0, 1));
        // offset 12.5 source pixels, magnified by 8
        assert_eq!(plan.dx, -100.0);
    }

    #[test]
    fn test_key_format() {
        let plan = plan_rewrite(TileCoord::new(1001, 1000, 20), &settings(18, 256));
        assert_eq!(plan.key(20).as_str(), "250,250,18,20");
    }

    #[test]
    fn test_siblings_share_key() {
        let s = settings(18, 256);
        let a = plan_rewrite(TileCoord::new(1000, 1000, 20), &s);
        let b = plan_rewrite(TileCoord::new(1003, 1002, 20), &s);
        assert_eq!(a.key(20), b.key(20));
        assert_ne!(a.dx, b.dx);
    }

    #[test]
    fn test_downgrade_properties_hold_across_levels() {
        let s = settings(10, 256);
        for z in 11u8..=22 {
            for (x, y) in [(0u32, 0u32), (7, 3), (12_345, 54_321), (u32::MAX, 1)] {
                let plan = plan_rewrite(TileCoord::new(x, y, z), &s);
                let scale = 1u32 << (z - 10);
                assert_eq!(plan.scale, scale);
                assert_eq!(plan.src, TileCoord::new(x / scale, y / scale, 10));
                assert!(plan.dx <= 0.0 && plan.dy <= 0.0);
                assert_eq!(plan, plan_rewrite(TileCoord::new(x, y, z), &s));
            }
        }
    }
}
