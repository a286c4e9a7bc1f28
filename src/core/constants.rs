//! Core constants shared by the config resolver, the rewrite engine and the
//! DOM interception layer. Keeping them in a single place makes it easier to
//! retarget the replacer at another tile provider.

/// Target name used for every log line emitted by the crate.
pub const LOG_TARGET: &str = "ha_map_replacer";

/// Default base URL of the local tile proxy.
pub const DEFAULT_PROXY_URL: &str = "http://localhost:8280";

/// Highest zoom level the alternate provider serves by default.
pub const DEFAULT_MAX_ZOOM: u8 = 18;

/// Default square tile size in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Accepted range for `max_zoom`.
pub const MAX_ZOOM_RANGE: (u8, u8) = (1, 20);

/// Accepted range for `tile_size`.
pub const TILE_SIZE_RANGE: (u32, u32) = (64, 1024);

/// Deepest zoom level a parsed tile URL may carry (`x`/`y` must fit in `u32`).
pub const MAX_TILE_ZOOM: u8 = 30;

/// Well-known path of the remote configuration document.
pub const CONFIG_PATH: &str = "/hacsfiles/ha-map-replacer/config.json";

/// Remote config / merged settings field names.
pub const FIELD_PROXY_URL: &str = "proxy_url";
pub const FIELD_MAX_ZOOM: &str = "max_zoom";
pub const FIELD_TILE_SIZE: &str = "tile_size";

/// Query-string override keys.
pub const QUERY_PROXY: &str = "amap_proxy";
pub const QUERY_MAX_ZOOM: &str = "amap_max_zoom";
pub const QUERY_TILE_SIZE: &str = "amap_tile_size";

/// Host prefix every source-provider tile URL starts with.
pub const SOURCE_URL_PREFIX: &str = "https://basemaps.cartocdn.com/";

/// Path segment preceding `{z}/{x}/{y}` in source-provider tile URLs.
pub const SOURCE_TILE_PATH: &str = "rastertiles/voyager/";

/// Path segment of the alternate provider behind the proxy.
pub const PROXY_TILE_PATH: &str = "/amap";

/// 1×1 transparent GIF rendered in place of duplicate downgraded tiles.
pub const PLACEHOLDER_IMAGE: &str = "data:image/gif;base64,R0lGODlhAQABAAD/ACwAAAAAAQABAAACADs=";

/// Leaflet class names of the elements the interception layer reacts to.
pub const TILE_LAYER_CLASS: &str = "leaflet-layer";
pub const TILE_CONTAINER_CLASS: &str = "leaflet-tile-container";
