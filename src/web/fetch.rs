use async_trait::async_trait;
use serde_json::Value;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::Response;

use super::js_error;
use crate::{traits::ConfigSource, ReplacerError, Result};

/// Loads the configuration document with the page's own `fetch`.
pub struct FetchConfigSource {
    url: String,
}

impl FetchConfigSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait(?Send)]
impl ConfigSource for FetchConfigSource {
    async fn fetch(&self) -> Result<Value> {
        let window = web_sys::window().ok_or_else(|| ReplacerError::Js("no window".into()))?;
        let resp = JsFuture::from(window.fetch_with_str(&self.url))
            .await
            .map_err(js_error)?;
        let resp: Response = resp.dyn_into().map_err(js_error)?;
        if !resp.ok() {
            return Err(ReplacerError::HttpStatus(resp.status()));
        }
        let body = JsFuture::from(resp.text().map_err(js_error)?)
            .await
            .map_err(js_error)?;
        let body = body
            .as_string()
            .ok_or_else(|| ReplacerError::MalformedConfig("response body is not text".into()))?;
        Ok(serde_json::from_str(&body)?)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}
