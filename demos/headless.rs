//! Drive the tile interceptor against an in-memory page.
//!
//! `cargo run --example headless -- 20` renders a 4×4 block of zoom-20 tiles
//! and prints what each image was turned into.

use map_replacer::{
    config::ConfigResolver,
    dom::{MemoryDocument, MemoryElement, TileOutcome},
    CartoVoyagerSource, QueryOverrides, TileCoord, TileElement, TileSource,
};

fn main() {
    map_replacer::init_logging();

    let zoom: u8 = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(20);

    let resolver = ConfigResolver::without_remote(QueryOverrides::from_pairs(
        std::env::vars().filter(|(key, _)| key.starts_with("amap_")),
    ));
    let settings = futures::executor::block_on(resolver.resolve());
    let tile_size = f64::from(settings.tile_size);

    let mut doc = MemoryDocument::new(settings);
    let root = doc.root().clone();
    let layer = MemoryElement::div("leaflet-layer");
    doc.append_child(&root, &layer);
    let container = MemoryElement::div("leaflet-tile-container");
    doc.append_child(&layer, &container);

    let source = CartoVoyagerSource::new();
    let fragment = MemoryElement::fragment();
    let mut tiles = Vec::new();
    for dy in 0..4u32 {
        for dx in 0..4u32 {
            let coord = TileCoord::new(1000 + dx, 1000 + dy, zoom);
            let img = MemoryElement::tile_image(
                &source.url(coord),
                f64::from(dx) * tile_size,
                f64::from(dy) * tile_size,
            );
            fragment.append(&img);
            tiles.push((coord, img));
        }
    }
    let outcomes = doc.append_child(&container, &fragment);

    for ((coord, img), outcome) in tiles.iter().zip(&outcomes) {
        let verdict = match outcome {
            TileOutcome::Ignored => "ignored",
            TileOutcome::Passthrough { .. } => "passthrough",
            TileOutcome::Downgraded { .. } => "downgraded",
            TileOutcome::Suppressed { .. } => "suppressed",
        };
        println!(
            "{:<14} {:<11} src={} transform={:?}",
            coord.to_string(),
            verdict,
            img.src().unwrap_or_default(),
            img.style("transform")
        );
    }
    println!("{:?}", doc.interceptor().stats());
}
