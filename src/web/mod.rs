//! Browser binding
//!
//! Loaded as a page module: resolves settings first, then installs the
//! interceptor on the document.

pub mod element;
pub mod fetch;
pub mod logging;
pub mod page;

use std::cell::RefCell;

use wasm_bindgen::prelude::*;

pub use element::WebElement;
pub use fetch::FetchConfigSource;
pub use page::PageInterceptor;

use crate::{
    config::ConfigResolver,
    core::{config::QueryOverrides, constants::CONFIG_PATH},
    ReplacerError, Result,
};

thread_local! {
    /// Installed interceptors live as long as the page.
    static INSTALLED: RefCell<Vec<PageInterceptor>> = const { RefCell::new(Vec::new()) };
}

pub(crate) fn js_error(value: JsValue) -> ReplacerError {
    ReplacerError::Js(
        value
            .as_string()
            .unwrap_or_else(|| format!("{:?}", value)),
    )
}

/// Module entry point.
#[wasm_bindgen(start)]
pub fn start() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    crate::init_logging();

    wasm_bindgen_futures::spawn_local(async {
        match run().await {
            Ok(page) => INSTALLED.with(|installed| installed.borrow_mut().push(page)),
            Err(e) => log::error!("tile replacer not installed: {}", e),
        }
    });
}

/// Resolve settings for the current page, then install the interceptor.
pub async fn run() -> Result<PageInterceptor> {
    let window = web_sys::window().ok_or_else(|| ReplacerError::Js("no window".into()))?;
    let location = window.location();
    let href = location.href().map_err(js_error)?;
    let origin = location.origin().map_err(js_error)?;

    let resolver = ConfigResolver::new(
        FetchConfigSource::new(format!("{}{}", origin, CONFIG_PATH)),
        QueryOverrides::from_href(&href),
    );
    let settings = resolver.resolve().await;

    let document = window
        .document()
        .ok_or_else(|| ReplacerError::Js("no document".into()))?;
    log::info!("starting DOM observer");
    PageInterceptor::install(&document, settings).map_err(js_error)
}
