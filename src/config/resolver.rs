//! Resolves the session's [`Settings`] once per page load
//!
//! Order of precedence: query-string overrides, then the remote document,
//! then compiled-in defaults. Failing to load the remote document is never an
//! error for the caller; it simply contributes no fields.

use futures::lock::Mutex;
use serde_json::Value;

use crate::{
    core::config::{QueryOverrides, Settings, SettingsDocument},
    traits::ConfigSource,
};

pub struct ConfigResolver {
    source: Option<Box<dyn ConfigSource>>,
    overrides: QueryOverrides,
    resolved: Mutex<Option<Settings>>,
}

impl ConfigResolver {
    pub fn new(source: impl ConfigSource + 'static, overrides: QueryOverrides) -> Self {
        Self {
            source: Some(Box::new(source)),
            overrides,
            resolved: Mutex::new(None),
        }
    }

    /// Resolver that skips the remote document entirely.
    pub fn without_remote(overrides: QueryOverrides) -> Self {
        Self {
            source: None,
            overrides,
            resolved: Mutex::new(None),
        }
    }

    /// Produce the validated settings, fetching the remote document at most once.
    ///
    /// Concurrent callers wait for the first resolution instead of issuing a
    /// second fetch.
    pub async fn resolve(&self) -> Settings {
        let mut resolved = self.resolved.lock().await;
        if let Some(settings) = resolved.as_ref() {
            return settings.clone();
        }

        let remote = self.load_remote().await;
        let settings = Settings::resolve_layers(
            remote
                .iter()
                .chain(std::iter::once(self.overrides.as_document())),
        );
        log::info!(
            "settings resolved: proxy {}, max zoom {}, tile size {}",
            settings.proxy_url,
            settings.max_zoom,
            settings.tile_size
        );

        *resolved = Some(settings.clone());
        settings
    }

    /// Settings of a finished resolution, without waiting.
    pub fn cached(&self) -> Option<Settings> {
        self.resolved.try_lock().and_then(|guard| (*guard).clone())
    }

    pub fn overrides(&self) -> &QueryOverrides {
        &self.overrides
    }

    async fn load_remote(&self) -> Option<SettingsDocument> {
        let source = self.source.as_ref()?;
        match source.fetch().await {
            Ok(Value::Object(document)) => {
                log::debug!("loaded {} field(s) from {}", document.len(), source.describe());
                Some(document)
            }
            Ok(other) => {
                log::warn!(
                    "config from {} is not a JSON object ({}), using defaults",
                    source.describe(),
                    json_kind(&other)
                );
                None
            }
            Err(e) => {
                log::warn!("failed to load config from {}, using defaults: {}", source.describe(), e);
                None
            }
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
