use crate::core::{
    config::Settings,
    constants::{MAX_TILE_ZOOM, PROXY_TILE_PATH, SOURCE_TILE_PATH, SOURCE_URL_PREFIX},
    geo::TileCoord,
};

/// Trait representing anything that can produce tile URLs for a given coordinate.
pub trait TileSource {
    /// Build a URL for the requested `coord`.
    fn url(&self, coord: TileCoord) -> String;
}

/// The provider whose tiles the map widget requests (CARTO Voyager raster tiles).
#[derive(Debug, Clone)]
pub struct CartoVoyagerSource {
    prefix: String,
    retina: bool,
}

impl CartoVoyagerSource {
    pub fn new() -> Self {
        Self { prefix: SOURCE_URL_PREFIX.to_string(), retina: false }
    }

    /// Match tiles served from a different host, e.g. a CARTO subdomain.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into(), retina: false }
    }

    /// Produce `@2x` URLs from [`TileSource::url`].
    pub fn retina(mut self, retina: bool) -> Self {
        self.retina = retina;
        self
    }

    /// Extract the tile coordinate from a source tile URL of the form
    /// `<prefix>.../rastertiles/voyager/{z}/{x}/{y}[@2x].png`.
    ///
    /// Anything else (markers, attribution images, already rewritten tiles)
    /// yields `None`.
    pub fn parse(&self, url: &str) -> Option<TileCoord> {
        let rest = url.strip_prefix(self.prefix.as_str())?;
        let start = rest.find(SOURCE_TILE_PATH)? + SOURCE_TILE_PATH.len();
        let rest = &rest[start..];

        let (z, rest) = take_number(rest)?;
        let rest = rest.strip_prefix('/')?;
        let (x, rest) = take_number(rest)?;
        let rest = rest.strip_prefix('/')?;
        let (y, rest) = take_number(rest)?;
        let rest = rest.strip_prefix("@2x").unwrap_or(rest);
        rest.strip_prefix(".png")?;

        let z = u8::try_from(z).ok().filter(|z| *z <= MAX_TILE_ZOOM)?;
        Some(TileCoord::new(x, y, z))
    }

    pub fn matches(&self, url: &str) -> bool {
        self.parse(url).is_some()
    }
}

impl Default for CartoVoyagerSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TileSource for CartoVoyagerSource {
    fn url(&self, coord: TileCoord) -> String {
        format!(
            "{}{}{}/{}/{}{}.png",
            self.prefix,
            SOURCE_TILE_PATH,
            coord.z,
            coord.x,
            coord.y,
            if self.retina { "@2x" } else { "" }
        )
    }
}

/// The alternate provider reached through the local proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyTileSource {
    base_url: String,
}

impl ProxyTileSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self { base_url: base_url.trim_end_matches('/').to_string() }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.proxy_url.as_str())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl TileSource for ProxyTileSource {
    fn url(&self, coord: TileCoord) -> String {
        format!(
            "{}{}/{}/{}/{}.jpg",
            self.base_url, PROXY_TILE_PATH, coord.z, coord.x, coord.y
        )
    }
}

/// Split a leading run of ASCII digits off `s`.
fn take_number(s: &str) -> Option<(u32, &str)> {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    let value = s[..end].parse().ok()?;
    Some((value, &s[end..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_source_urls() {
        let source = CartoVoyagerSource::new();
        assert_eq!(
            source.parse("https://basemaps.cartocdn.com/rastertiles/voyager/4/13/6.png"),
            Some(TileCoord::new(13, 6, 4))
        );
        assert_eq!(
            source.parse("https://basemaps.cartocdn.com/rastertiles/voyager/20/1001/1000@2x.png"),
            Some(TileCoord::new(1001, 1000, 20))
        );
        assert_eq!(
            source.parse("https://basemaps.cartocdn.com/rastertiles/voyager/3/1/2.png?v=2"),
            Some(TileCoord::new(1, 2, 3))
        );
    }

    #[test]
    fn test_parse_rejects_other_images() {
        let source = CartoVoyagerSource::new();
        for url in [
            "https://example.com/marker-icon.png",
            "https://basemaps.cartocdn.com/light_all/4/13/6.png",
            "https://basemaps.cartocdn.com/rastertiles/voyager/4/13/6.jpg",
            "https://basemaps.cartocdn.com/rastertiles/voyager/4/13.png",
            "https://basemaps.cartocdn.com/rastertiles/voyager/40/1/1.png",
            "http://localhost:8280/amap/4/13/6.jpg",
            "data:image/gif;base64,R0lGODlhAQABAAD/ACwAAAAAAQABAAACADs=",
            "",
        ] {
            assert_eq!(source.parse(url), None, "{url}");
        }
    }

    #[test]
    fn test_source_url_round_trips_through_parse() {
        let source = CartoVoyagerSource::new().retina(true);
        let coord = TileCoord::new(13, 6, 4);
        assert_eq!(
            source.url(coord),
            "https://basemaps.cartocdn.com/rastertiles/voyager/4/13/6@2x.png"
        );
        assert_eq!(source.parse(&source.url(coord)), Some(coord));
    }

    #[test]
    fn test_custom_prefix() {
        let source = CartoVoyagerSource::with_prefix("https://a.basemaps.cartocdn.com/");
        assert!(source.matches("https://a.basemaps.cartocdn.com/rastertiles/voyager/1/0/0.png"));
        assert!(!source.matches("https://basemaps.cartocdn.com/rastertiles/voyager/1/0/0.png"));
    }

    #[test]
    fn test_proxy_url() {
        let proxy = ProxyTileSource::new("http://localhost:8280/");
        assert_eq!(proxy.base_url(), "http://localhost:8280");
        assert_eq!(
            proxy.url(TileCoord::new(13, 6, 4)),
            "http://localhost:8280/amap/4/13/6.jpg"
        );
    }
}
