use map_replacer::{
    plan_rewrite, CartoVoyagerSource, ProxyTileSource, Settings, TileCoord, TileSource,
};

/// Rewrite planning from source URL to proxy URL
#[cfg(test)]
mod tile_rewrite_tests {
    use super::*;

    /// Parse a source URL, plan it and build the URL actually fetched.
    fn rewrite(url: &str, settings: &Settings) -> Option<String> {
        let coord = CartoVoyagerSource::new().parse(url)?;
        let plan = plan_rewrite(coord, settings);
        Some(ProxyTileSource::from_settings(settings).url(plan.src))
    }

    #[test]
    fn test_identity_round_trip() {
        let settings = Settings::default();
        assert_eq!(
            rewrite(
                "https://basemaps.cartocdn.com/rastertiles/voyager/4/13/6.png",
                &settings
            )
            .as_deref(),
            Some("http://localhost:8280/amap/4/13/6.jpg")
        );
    }

    #[test]
    fn test_downgraded_url_uses_fetched_coordinate() {
        let settings = Settings::default();
        assert_eq!(
            rewrite(
                "https://basemaps.cartocdn.com/rastertiles/voyager/20/1001/1000@2x.png",
                &settings
            )
            .as_deref(),
            Some("http://localhost:8280/amap/18/250/250.jpg")
        );
    }

    #[test]
    fn test_marker_is_not_rewritten() {
        assert_eq!(rewrite("https://unpkg.com/leaflet/dist/images/marker-icon.png", &Settings::default()), None);
    }

    #[test]
    fn test_identity_for_every_zoom_up_to_max() {
        for max_zoom in 1u8..=20 {
            let settings = Settings { max_zoom, ..Settings::default() };
            for z in 0..=max_zoom {
                let coord = TileCoord::new(1, 1, z);
                let plan = plan_rewrite(coord, &settings);
                assert_eq!(plan.src, coord);
                assert_eq!(plan.scale, 1);
                assert_eq!((plan.dx, plan.dy), (0.0, 0.0));
            }
        }
    }

    #[test]
    fn test_fetched_tile_is_the_ancestor() {
        let settings = Settings { max_zoom: 12, tile_size: 512, ..Settings::default() };
        for z in 13u8..=20 {
            let coord = TileCoord::new(123_456 % (1 << z), 654_321 % (1 << z), z);
            let plan = plan_rewrite(coord, &settings);
            assert_eq!(plan.src, coord.ancestor(12));
            assert_eq!(plan.scale, 1 << (z - 12));
            // the shifted image still covers the requested cell
            let span = f64::from(settings.tile_size) * f64::from(plan.scale);
            assert!(plan.dx > -span && plan.dy > -span);
        }
    }
}
