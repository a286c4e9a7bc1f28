use std::cell::Cell;
use std::rc::Rc;

use async_trait::async_trait;
use map_replacer::{
    config::{ConfigResolver, HttpConfigSource, StaticConfigSource},
    ConfigSource, QueryOverrides, ReplacerError, Result, Settings,
};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Configuration resolution: precedence, fallback and caching
#[cfg(test)]
mod config_resolver_tests {
    use super::*;

    /// Replays a fixed response and counts how often it was asked.
    struct ScriptedSource {
        response: fn() -> Result<Value>,
        fetches: Rc<Cell<usize>>,
    }

    #[async_trait(?Send)]
    impl ConfigSource for ScriptedSource {
        async fn fetch(&self) -> Result<Value> {
            self.fetches.set(self.fetches.get() + 1);
            (self.response)()
        }
    }

    fn scripted(response: fn() -> Result<Value>) -> (ScriptedSource, Rc<Cell<usize>>) {
        let fetches = Rc::new(Cell::new(0));
        (ScriptedSource { response, fetches: fetches.clone() }, fetches)
    }

    /// Serve exactly one HTTP response on a local port, returning its origin.
    async fn serve_once(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_query_overrides_win_over_remote() {
        let resolver = ConfigResolver::new(
            StaticConfigSource::new(json!({
                "proxy_url": "http://remote-proxy:9000",
                "max_zoom": 16,
                "tile_size": 512
            })),
            QueryOverrides::from_pairs([("amap_max_zoom", "14")]),
        );
        let settings = resolver.resolve().await;
        assert_eq!(settings.proxy_url, "http://remote-proxy:9000");
        assert_eq!(settings.max_zoom, 14);
        assert_eq!(settings.tile_size, 512);
    }

    #[tokio::test]
    async fn test_http_status_error_falls_back_to_defaults_and_query() {
        let (source, fetches) = scripted(|| Err(ReplacerError::HttpStatus(404)));
        let overrides = QueryOverrides::from_pairs([("amap_proxy", "https://query-proxy")]);
        let resolver = ConfigResolver::new(source, overrides);

        let settings = resolver.resolve().await;
        assert_eq!(
            settings,
            Settings { proxy_url: "https://query-proxy".into(), ..Settings::default() }
        );
        assert_eq!(fetches.get(), 1);
    }

    #[tokio::test]
    async fn test_malformed_json_falls_back() {
        let (source, _) = scripted(|| {
            serde_json::from_str::<Value>("{\"max_zoom\": ").map_err(ReplacerError::from)
        });
        let resolver = ConfigResolver::new(source, QueryOverrides::new());
        assert_eq!(resolver.resolve().await, Settings::default());
    }

    #[tokio::test]
    async fn test_resolution_is_cached() {
        let (source, fetches) = scripted(|| Ok(json!({"max_zoom": 17})));
        let resolver = ConfigResolver::new(source, QueryOverrides::new());

        let first = resolver.resolve().await;
        let second = resolver.resolve().await;
        let (third, fourth) = futures::join!(resolver.resolve(), resolver.resolve());

        assert_eq!(first.max_zoom, 17);
        assert_eq!(first, second);
        assert_eq!(third, fourth);
        assert_eq!(fetches.get(), 1);
    }

    #[tokio::test]
    async fn test_invalid_remote_field_keeps_valid_siblings() {
        let resolver = ConfigResolver::new(
            StaticConfigSource::new(json!({
                "proxy_url": "tiles.local",
                "max_zoom": 12,
                "tile_size": 4096
            })),
            QueryOverrides::new(),
        );
        let settings = resolver.resolve().await;
        assert_eq!(settings.proxy_url, "http://localhost:8280");
        assert_eq!(settings.max_zoom, 12);
        assert_eq!(settings.tile_size, 256);
    }

    #[tokio::test]
    async fn test_http_source_404() {
        let origin = serve_once(
            "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;
        let source = HttpConfigSource::for_origin(&origin).unwrap();
        assert!(matches!(source.fetch().await, Err(ReplacerError::HttpStatus(404))));
    }

    #[tokio::test]
    async fn test_http_source_loads_document() {
        let origin = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 34\r\nConnection: close\r\n\r\n{\"max_zoom\": 15, \"tile_size\": 512}",
        )
        .await;
        let resolver = ConfigResolver::new(
            HttpConfigSource::for_origin(&origin).unwrap(),
            QueryOverrides::new(),
        );
        let settings = resolver.resolve().await;
        assert_eq!(settings.max_zoom, 15);
        assert_eq!(settings.tile_size, 512);
    }
}
