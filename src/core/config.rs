//! Settings for the tile replacer and the layered document they are built from
//!
//! Settings are assembled from three layers of loosely-typed JSON fields:
//! compiled-in defaults, the remote configuration document and query-string
//! overrides. Layers are shallow-merged in that order and the result is
//! validated field by field, so a single bad field never discards the rest.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::core::constants::{
    DEFAULT_MAX_ZOOM, DEFAULT_PROXY_URL, DEFAULT_TILE_SIZE, FIELD_MAX_ZOOM, FIELD_PROXY_URL,
    FIELD_TILE_SIZE, MAX_ZOOM_RANGE, QUERY_MAX_ZOOM, QUERY_PROXY, QUERY_TILE_SIZE,
    TILE_SIZE_RANGE,
};

/// A loosely-typed settings layer (remote document, query overrides, ...).
pub type SettingsDocument = Map<String, Value>;

/// Validated, immutable settings for one page session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Base URL of the tile proxy, without a trailing slash.
    pub proxy_url: String,
    /// Highest zoom level the alternate provider serves.
    pub max_zoom: u8,
    /// Edge length of a tile in CSS pixels.
    pub tile_size: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            proxy_url: DEFAULT_PROXY_URL.to_string(),
            max_zoom: DEFAULT_MAX_ZOOM,
            tile_size: DEFAULT_TILE_SIZE,
        }
    }
}

impl Settings {
    /// Defaults expressed as a settings layer, the base of every merge.
    pub fn default_document() -> SettingsDocument {
        Settings::default().to_document()
    }

    pub fn to_document(&self) -> SettingsDocument {
        let mut doc = Map::new();
        doc.insert(FIELD_PROXY_URL.into(), Value::String(self.proxy_url.clone()));
        doc.insert(FIELD_MAX_ZOOM.into(), Value::Number(self.max_zoom.into()));
        doc.insert(FIELD_TILE_SIZE.into(), Value::Number(self.tile_size.into()));
        doc
    }

    /// Validate a merged document field by field.
    ///
    /// Missing, mistyped or out-of-range fields fall back to their default
    /// and a warning is logged for each replaced field.
    pub fn from_document(doc: &SettingsDocument) -> Self {
        let defaults = Settings::default();

        let proxy_url = match doc.get(FIELD_PROXY_URL) {
            None => defaults.proxy_url,
            Some(value) => validate_proxy_url(value).unwrap_or_else(|| {
                log::warn!(
                    "invalid {} {}, using default {}",
                    FIELD_PROXY_URL,
                    value,
                    defaults.proxy_url
                );
                defaults.proxy_url.clone()
            }),
        };

        let max_zoom = match doc.get(FIELD_MAX_ZOOM) {
            None => defaults.max_zoom,
            Some(value) => {
                let (min, max) = MAX_ZOOM_RANGE;
                validate_integer(value, i64::from(min), i64::from(max))
                    .and_then(|zoom| u8::try_from(zoom).ok())
                    .unwrap_or_else(|| {
                        log::warn!(
                            "{} should be between {} and {}, got {}; using default {}",
                            FIELD_MAX_ZOOM,
                            min,
                            max,
                            value,
                            defaults.max_zoom
                        );
                        defaults.max_zoom
                    })
            }
        };

        let tile_size = match doc.get(FIELD_TILE_SIZE) {
            None => defaults.tile_size,
            Some(value) => {
                let (min, max) = TILE_SIZE_RANGE;
                validate_integer(value, i64::from(min), i64::from(max))
                    .and_then(|size| u32::try_from(size).ok())
                    .unwrap_or_else(|| {
                        log::warn!(
                            "{} should be between {} and {}, got {}; using default {}",
                            FIELD_TILE_SIZE,
                            min,
                            max,
                            value,
                            defaults.tile_size
                        );
                        defaults.tile_size
                    })
            }
        };

        Self { proxy_url, max_zoom, tile_size }
    }

    /// Shallow-merge `layers` over the defaults and validate the result.
    /// Later layers win.
    pub fn resolve_layers<'a, I>(layers: I) -> Self
    where
        I: IntoIterator<Item = &'a SettingsDocument>,
    {
        let mut merged = Self::default_document();
        for layer in layers {
            merge_shallow(&mut merged, layer);
        }
        Self::from_document(&merged)
    }
}

/// Copy every top-level field of `overlay` into `base`, replacing existing ones.
pub fn merge_shallow(base: &mut SettingsDocument, overlay: &SettingsDocument) {
    for (key, value) in overlay {
        base.insert(key.clone(), value.clone());
    }
}

/// Accepts an absolute `http`/`https` URL; the trailing slash is trimmed.
pub fn validate_proxy_url(value: &Value) -> Option<String> {
    let raw = value.as_str()?.trim();
    let url = reqwest::Url::parse(raw).ok()?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return None;
    }
    Some(raw.trim_end_matches('/').to_string())
}

/// Accepts integers, and floats with no fractional part, inside `[min, max]`.
pub fn validate_integer(value: &Value, min: i64, max: i64) -> Option<i64> {
    let number = match value {
        Value::Number(n) => n,
        _ => return None,
    };
    let int = match number.as_i64() {
        Some(i) => i,
        None => {
            let float = number.as_f64()?;
            if float.fract() != 0.0 || !float.is_finite() {
                return None;
            }
            float as i64
        }
    };
    (min..=max).contains(&int).then_some(int)
}

/// Settings overrides carried by the page's query string.
///
/// Numeric parameters that do not parse are skipped with a warning so they
/// never shadow a valid value from the remote document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOverrides {
    fields: SettingsDocument,
}

impl QueryOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read overrides from the query of a full page URL.
    pub fn from_url(url: &reqwest::Url) -> Self {
        Self::from_pairs(url.query_pairs())
    }

    /// Parse a page `href`; an unparsable href yields no overrides.
    pub fn from_href(href: &str) -> Self {
        match reqwest::Url::parse(href) {
            Ok(url) => Self::from_url(&url),
            Err(e) => {
                log::warn!("cannot read query overrides from {}: {}", href, e);
                Self::default()
            }
        }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut fields = Map::new();
        for (key, value) in pairs {
            let value = value.as_ref();
            match key.as_ref() {
                QUERY_PROXY if !value.is_empty() => {
                    fields.insert(FIELD_PROXY_URL.into(), Value::String(value.to_string()));
                }
                QUERY_MAX_ZOOM => insert_numeric(&mut fields, FIELD_MAX_ZOOM, QUERY_MAX_ZOOM, value),
                QUERY_TILE_SIZE => {
                    insert_numeric(&mut fields, FIELD_TILE_SIZE, QUERY_TILE_SIZE, value)
                }
                _ => {}
            }
        }
        Self { fields }
    }

    pub fn with_field(mut self, field: &str, value: Value) -> Self {
        self.fields.insert(field.to_string(), value);
        self
    }

    pub fn as_document(&self) -> &SettingsDocument {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn insert_numeric(fields: &mut SettingsDocument, field: &str, param: &str, raw: &str) {
    if raw.is_empty() {
        return;
    }
    match parse_int_prefix(raw) {
        Some(n) => {
            fields.insert(field.to_string(), Value::Number(Number::from(n)));
        }
        None => log::warn!("ignoring non-numeric query parameter {}={}", param, raw),
    }
}

/// Reads the integer at the start of `raw`, ignoring whatever follows it,
/// so `"12.7"`, `"12px"` and `"1e1"` read as `12`, `12` and `1`.
fn parse_int_prefix(raw: &str) -> Option<i64> {
    let raw = raw.trim_start();
    let (negative, digits) = match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    };
    let end = digits.find(|c: char| !c.is_ascii_digit()).unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let value: i64 = digits[..end].parse().ok()?;
    Some(if negative { -value } else { value })
}
