//! Platform-independent DOM interception
//!
//! [`TileInterceptor`] decides what happens to every element the map widget
//! inserts. Hosts (the browser binding, the in-memory document) call into it
//! at three points:
//!
//! - after the tree observer reports added or removed nodes
//!   ([`TileInterceptor::handle_added`], [`TileInterceptor::handle_removed`]),
//! - synchronously before a hooked tile layer inserts a child
//!   ([`TileInterceptor::before_layer_insert`]),
//! - synchronously before a hooked tile container inserts tile images
//!   ([`TileInterceptor::before_container_insert`]).
//!
//! Whenever a call returns [`Hook`]s, the host must install the matching
//! insertion hook on that element. Each element is handed out at most once.

use fxhash::{FxHashMap, FxHashSet};

use crate::{
    core::{
        config::Settings,
        constants::{PLACEHOLDER_IMAGE, TILE_CONTAINER_CLASS, TILE_LAYER_CLASS},
        geo::TileCoord,
    },
    dom::transform::{shift_translate3d, with_scale},
    tiles::{
        downgrade::{plan_rewrite, DowngradeKey, DowngradeResult},
        source::{CartoVoyagerSource, ProxyTileSource, TileSource},
    },
    traits::{ElementId, TileElement},
};

/// Downgraded tiles currently rendered, at most one visible image per key.
pub type SeenTileSet = FxHashSet<DowngradeKey>;

/// Where one image ended up in the per-image state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum TileOutcome {
    /// Not a source-provider tile; the element was left untouched.
    Ignored,
    /// Served from the alternate provider at the requested zoom.
    Passthrough { requested: TileCoord, url: String },
    /// Served from a coarser ancestor, magnified and shifted into place.
    Downgraded { requested: TileCoord, key: DowngradeKey, url: String },
    /// A sibling already renders the same ancestor; blanked and hidden.
    Suppressed { requested: TileCoord, key: DowngradeKey },
}

impl TileOutcome {
    pub fn is_ignored(&self) -> bool {
        matches!(self, TileOutcome::Ignored)
    }
}

/// An insertion hook the host has to install.
#[derive(Debug, Clone, PartialEq)]
pub enum Hook<E> {
    /// Intercept children inserted into a tile layer.
    Layer(E),
    /// Intercept tile images inserted into a tile container.
    Container(E),
}

impl<E> Hook<E> {
    pub fn element(&self) -> &E {
        match self {
            Hook::Layer(e) | Hook::Container(e) => e,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InterceptorStats {
    pub passthrough: u64,
    pub downgraded: u64,
    pub suppressed: u64,
    pub released: u64,
}

/// Rewrites source tiles of one map widget to the alternate provider.
///
/// Duplicate suppression is scoped to one interceptor; the browser binding
/// runs a single interceptor per document.
pub struct TileInterceptor {
    settings: Settings,
    source: CartoVoyagerSource,
    proxy: ProxyTileSource,
    seen: SeenTileSet,
    /// Downgrade key held by each rendered downgraded image.
    tracked: FxHashMap<ElementId, DowngradeKey>,
    /// Layers and containers that already received their hook.
    hooked: FxHashSet<ElementId>,
    stats: InterceptorStats,
}

impl TileInterceptor {
    pub fn new(settings: Settings) -> Self {
        Self {
            proxy: ProxyTileSource::from_settings(&settings),
            settings,
            source: CartoVoyagerSource::new(),
            seen: SeenTileSet::default(),
            tracked: FxHashMap::default(),
            hooked: FxHashSet::default(),
            stats: InterceptorStats::default(),
        }
    }

    /// Recognize source tiles with a different URL prefix.
    pub fn with_source(mut self, source: CartoVoyagerSource) -> Self {
        self.source = source;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Swap in newly resolved settings. Images processed earlier keep the
    /// rewrite they already received.
    pub fn apply_settings(&mut self, settings: Settings) {
        self.proxy = ProxyTileSource::from_settings(&settings);
        self.settings = settings;
    }

    pub fn seen(&self) -> &SeenTileSet {
        &self.seen
    }

    pub fn stats(&self) -> InterceptorStats {
        self.stats
    }

    pub fn is_tracked(&self, id: ElementId) -> bool {
        self.tracked.contains_key(&id)
    }

    pub fn is_hooked(&self, id: ElementId) -> bool {
        self.hooked.contains(&id)
    }

    pub fn is_tile_layer<E: TileElement>(node: &E) -> bool {
        node.is_tag("div") && node.has_class(TILE_LAYER_CLASS)
    }

    pub fn is_tile_container<E: TileElement>(node: &E) -> bool {
        node.is_tag("div") && node.has_class(TILE_CONTAINER_CLASS)
    }

    /// Rewrite one candidate image.
    pub fn process_image<E: TileElement>(&mut self, img: &E) -> TileOutcome {
        if !img.is_tag("img") {
            return TileOutcome::Ignored;
        }
        let Some(original) = img.src() else {
            return TileOutcome::Ignored;
        };
        let Some(requested) = self.source.parse(&original) else {
            return TileOutcome::Ignored;
        };

        // the widget pointed a rendered image at a new tile
        self.release(img.element_id());

        let plan = plan_rewrite(requested, &self.settings);
        let url = self.proxy.url(plan.src);

        if !plan.is_downgrade() {
            img.set_src(&url);
            self.stats.passthrough += 1;
            log::debug!("replaced tile {} -> {}", original, url);
            return TileOutcome::Passthrough { requested, url };
        }

        let key = plan.key(requested.z);
        if self.seen.contains(&key) {
            img.set_src(PLACEHOLDER_IMAGE);
            img.set_style("display", "none");
            self.stats.suppressed += 1;
            log::debug!("suppressed duplicate tile {} ({})", requested, key);
            return TileOutcome::Suppressed { requested, key };
        }

        self.seen.insert(key.clone());
        self.tracked.insert(img.element_id(), key.clone());
        img.set_src(&url);
        self.apply_compensation(img, &plan);
        self.stats.downgraded += 1;
        log::debug!(
            "downgraded tile {} -> {} (zoom {} -> {}, scale {})",
            requested,
            url,
            requested.z,
            plan.src.z,
            plan.scale
        );
        TileOutcome::Downgraded { requested, key, url }
    }

    /// Magnify the fetched ancestor and shift it so the requested region
    /// lines up with the cell the widget positioned the image at.
    fn apply_compensation<E: TileElement>(&self, img: &E, plan: &DowngradeResult) {
        let transform = img.style("transform");
        // no translation to adjust: the widget positions tiles before insertion
        let transform = shift_translate3d(&transform, plan.dx, plan.dy).unwrap_or(transform);
        img.set_style("transform", &with_scale(&transform, plan.scale));

        let size = format!("{}px", self.settings.tile_size);
        img.set_style("width", &size);
        img.set_style("height", &size);
        img.set_style("transform-origin", "top left");
    }

    /// Inspect a node the tree observer reported as inserted, including its
    /// whole subtree. Tile layers found there are returned as hooks; source
    /// tiles that slipped past the insertion hooks are rewritten late.
    pub fn handle_added<E: TileElement>(&mut self, node: &E) -> Vec<Hook<E>> {
        let mut hooks = Vec::new();
        for element in std::iter::once(node.clone()).chain(node.descendants()) {
            if Self::is_tile_layer(&element) {
                hooks.extend(self.adopt_layer(&element));
            } else if element.is_tag("img") {
                let outcome = self.process_image(&element);
                if !outcome.is_ignored() {
                    log::debug!("rewrote tile after insertion: {:?}", outcome);
                }
            }
        }
        hooks
    }

    /// Initial pass over a tree that existed before installation.
    pub fn sweep<E: TileElement>(&mut self, root: &E) -> Vec<Hook<E>> {
        self.handle_added(root)
    }

    fn adopt_layer<E: TileElement>(&mut self, layer: &E) -> Vec<Hook<E>> {
        if !self.hooked.insert(layer.element_id()) {
            return Vec::new();
        }
        let mut hooks = vec![Hook::Layer(layer.clone())];
        for child in layer.children() {
            hooks.extend(self.before_layer_insert(&child));
        }
        hooks
    }

    /// Called by a hooked tile layer before `child` is inserted into it.
    ///
    /// Tile containers have their current images rewritten right away and
    /// are returned as a hook the first time they are seen.
    pub fn before_layer_insert<E: TileElement>(&mut self, child: &E) -> Option<Hook<E>> {
        if !Self::is_tile_container(child) {
            return None;
        }
        for img in child.descendants().iter().filter(|e| e.is_tag("img")) {
            self.process_image(img);
        }
        self.hooked
            .insert(child.element_id())
            .then(|| Hook::Container(child.clone()))
    }

    /// Called by a hooked tile container before `inserted` elements are
    /// attached to it (the children of a fragment, or a single element).
    pub fn before_container_insert<E: TileElement>(&mut self, inserted: &[E]) -> Vec<TileOutcome> {
        inserted
            .iter()
            .filter(|e| e.is_tag("img"))
            .map(|img| self.process_image(img))
            .collect()
    }

    /// Free the downgrade keys held by `node` and every element below it.
    ///
    /// Only call this for nodes that have left the document; a node that was
    /// moved within it still renders its tiles.
    ///
    /// Returns the layers and containers in the removed subtree whose hooks
    /// the host should uninstall; they are hooked afresh if re-inserted.
    pub fn handle_removed<E: TileElement>(&mut self, node: &E) -> Vec<ElementId> {
        let mut unhooked = Vec::new();
        for element in std::iter::once(node.clone()).chain(node.descendants()) {
            let id = element.element_id();
            self.release(id);
            if self.hooked.remove(&id) {
                unhooked.push(id);
            }
        }
        unhooked
    }

    fn release(&mut self, id: ElementId) {
        if let Some(key) = self.tracked.remove(&id) {
            self.seen.remove(&key);
            self.stats.released += 1;
            log::debug!("released downgraded tile {}", key);
        }
    }
}

impl Default for TileInterceptor {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}
