//! Headless element tree
//!
//! [`MemoryElement`] implements [`TileElement`] over a reference-counted
//! tree, and [`MemoryDocument`] hosts a [`TileInterceptor`] the same way the
//! browser binding does: insertion hooks run synchronously before a child is
//! attached, observer notifications run after attachment to the document.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use fxhash::FxHashMap;

use crate::{
    core::config::Settings,
    dom::interceptor::{Hook, TileInterceptor, TileOutcome},
    traits::{ElementId, TileElement},
};

const FRAGMENT_TAG: &str = "#document-fragment";

thread_local! {
    static NEXT_ID: Cell<u64> = const { Cell::new(1) };
}

#[derive(Debug)]
struct Node {
    id: ElementId,
    tag: String,
    classes: Vec<String>,
    src: Option<String>,
    style: Vec<(String, String)>,
    children: Vec<MemoryElement>,
    parent: Weak<RefCell<Node>>,
}

/// Shared handle onto one node of an in-memory tree.
#[derive(Debug, Clone)]
pub struct MemoryElement(Rc<RefCell<Node>>);

impl MemoryElement {
    pub fn new(tag: &str) -> Self {
        let id = NEXT_ID.with(|next| {
            let id = next.get();
            next.set(id + 1);
            ElementId(id)
        });
        Self(Rc::new(RefCell::new(Node {
            id,
            tag: tag.to_ascii_uppercase(),
            classes: Vec::new(),
            src: None,
            style: Vec::new(),
            children: Vec::new(),
            parent: Weak::new(),
        })))
    }

    /// A fragment whose children move into the parent on insertion.
    pub fn fragment() -> Self {
        Self::new(FRAGMENT_TAG)
    }

    pub fn div(class: &str) -> Self {
        Self::new("div").with_class(class)
    }

    /// An image positioned the way Leaflet positions tiles.
    pub fn tile_image(src: &str, left: f64, top: f64) -> Self {
        let img = Self::new("img").with_src(src);
        img.set_style("transform", &format!("translate3d({}px, {}px, 0px)", left, top));
        img
    }

    pub fn with_class(self, class: &str) -> Self {
        self.0.borrow_mut().classes.push(class.to_string());
        self
    }

    pub fn with_src(self, src: &str) -> Self {
        self.0.borrow_mut().src = Some(src.to_string());
        self
    }

    pub fn is_fragment(&self) -> bool {
        self.0.borrow().tag == FRAGMENT_TAG.to_ascii_uppercase()
    }

    pub fn parent(&self) -> Option<MemoryElement> {
        self.0.borrow().parent.upgrade().map(MemoryElement)
    }

    pub fn ptr_eq(&self, other: &MemoryElement) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Whether `ancestor` is this element or one of its ancestors.
    pub fn is_inside(&self, ancestor: &MemoryElement) -> bool {
        let mut current = Some(self.clone());
        while let Some(node) = current {
            if node.ptr_eq(ancestor) {
                return true;
            }
            current = node.parent();
        }
        false
    }

    /// Attach `child` (or a fragment's children) as last children, detaching
    /// them from any previous parent. Returns the elements attached.
    pub fn append(&self, child: &MemoryElement) -> Vec<MemoryElement> {
        let moved = if child.is_fragment() {
            std::mem::take(&mut child.0.borrow_mut().children)
        } else {
            child.detach();
            vec![child.clone()]
        };
        for node in &moved {
            node.0.borrow_mut().parent = Rc::downgrade(&self.0);
        }
        self.0.borrow_mut().children.extend(moved.iter().cloned());
        moved
    }

    /// Detach this element from its parent, if it has one.
    pub fn detach(&self) {
        if let Some(parent) = self.parent() {
            parent.0.borrow_mut().children.retain(|c| !c.ptr_eq(self));
        }
        self.0.borrow_mut().parent = Weak::new();
    }
}

impl TileElement for MemoryElement {
    fn element_id(&self) -> ElementId {
        self.0.borrow().id
    }

    fn tag_name(&self) -> String {
        self.0.borrow().tag.clone()
    }

    fn has_class(&self, class: &str) -> bool {
        self.0.borrow().classes.iter().any(|c| c == class)
    }

    fn src(&self) -> Option<String> {
        self.0.borrow().src.clone()
    }

    fn set_src(&self, src: &str) {
        self.0.borrow_mut().src = Some(src.to_string());
    }

    fn style(&self, property: &str) -> String {
        self.0
            .borrow()
            .style
            .iter()
            .find(|(name, _)| name == property)
            .map(|(_, value)| value.clone())
            .unwrap_or_default()
    }

    fn set_style(&self, property: &str, value: &str) {
        let mut node = self.0.borrow_mut();
        match node.style.iter_mut().find(|(name, _)| name == property) {
            Some(entry) => entry.1 = value.to_string(),
            None => node.style.push((property.to_string(), value.to_string())),
        }
    }

    fn children(&self) -> Vec<Self> {
        self.0.borrow().children.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HookKind {
    Layer,
    Container,
}

/// A document hosting one interceptor, wired like the browser binding.
pub struct MemoryDocument {
    root: MemoryElement,
    interceptor: TileInterceptor,
    hooks: FxHashMap<ElementId, HookKind>,
}

impl MemoryDocument {
    pub fn new(settings: Settings) -> Self {
        Self::with_interceptor(TileInterceptor::new(settings))
    }

    pub fn with_interceptor(interceptor: TileInterceptor) -> Self {
        Self {
            root: MemoryElement::new("html"),
            interceptor,
            hooks: FxHashMap::default(),
        }
    }

    /// Adopt an existing tree as the document and sweep it once.
    pub fn install(root: MemoryElement, interceptor: TileInterceptor) -> Self {
        let mut doc = Self { root, interceptor, hooks: FxHashMap::default() };
        let root = doc.root.clone();
        let hooks = doc.interceptor.sweep(&root);
        doc.register(hooks);
        doc
    }

    pub fn root(&self) -> &MemoryElement {
        &self.root
    }

    pub fn interceptor(&self) -> &TileInterceptor {
        &self.interceptor
    }

    pub fn interceptor_mut(&mut self) -> &mut TileInterceptor {
        &mut self.interceptor
    }

    pub fn is_connected(&self, node: &MemoryElement) -> bool {
        node.is_inside(&self.root)
    }

    /// Insert `child` into `parent`, running insertion hooks first and
    /// observer notifications afterwards. Returns the outcomes of tile images
    /// processed by a container hook.
    pub fn append_child(&mut self, parent: &MemoryElement, child: &MemoryElement) -> Vec<TileOutcome> {
        let mut outcomes = Vec::new();
        match self.hooks.get(&parent.element_id()).copied() {
            Some(HookKind::Layer) => {
                if let Some(hook) = self.interceptor.before_layer_insert(child) {
                    self.register(vec![hook]);
                }
            }
            Some(HookKind::Container) => {
                let inserted = if child.is_fragment() { child.children() } else { vec![child.clone()] };
                outcomes = self.interceptor.before_container_insert(&inserted);
            }
            None => {}
        }

        // a connected child being re-parented is reported as removed, then added
        let moved = !child.is_fragment() && self.is_connected(child);
        let attached = parent.append(child);
        if moved {
            self.notify_removed(child);
        }
        if self.is_connected(parent) {
            for node in &attached {
                let hooks = self.interceptor.handle_added(node);
                self.register(hooks);
            }
        }
        outcomes
    }

    /// Detach `child`, notifying the interceptor when it leaves the document.
    pub fn remove(&mut self, child: &MemoryElement) {
        let connected = self.is_connected(child);
        child.detach();
        if connected {
            self.notify_removed(child);
        }
    }

    /// Removal record for `node`. Nodes back in the document by the time the
    /// record is handled were moved, and keep their tiles and hooks.
    fn notify_removed(&mut self, node: &MemoryElement) {
        if self.is_connected(node) {
            return;
        }
        for id in self.interceptor.handle_removed(node) {
            self.hooks.remove(&id);
        }
    }

    pub fn is_hooked(&self, element: &MemoryElement) -> bool {
        self.hooks.contains_key(&element.element_id())
    }

    fn register(&mut self, hooks: Vec<Hook<MemoryElement>>) {
        for hook in hooks {
            let kind = match hook {
                Hook::Layer(_) => HookKind::Layer,
                Hook::Container(_) => HookKind::Container,
            };
            self.hooks.insert(hook.element().element_id(), kind);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_children_move_on_append() {
        let parent = MemoryElement::div("leaflet-tile-container");
        let fragment = MemoryElement::fragment();
        fragment.append(&MemoryElement::new("img"));
        fragment.append(&MemoryElement::new("img"));

        let attached = parent.append(&fragment);
        assert_eq!(attached.len(), 2);
        assert!(fragment.children().is_empty());
        assert_eq!(parent.children().len(), 2);
        assert!(attached[0].parent().unwrap().ptr_eq(&parent));
    }

    #[test]
    fn test_descendants_are_depth_first() {
        let root = MemoryElement::new("div");
        let a = MemoryElement::new("section");
        let b = MemoryElement::new("img");
        let c = MemoryElement::new("span");
        a.append(&b);
        root.append(&a);
        root.append(&c);
        let tags: Vec<_> = root.descendants().iter().map(|e| e.tag_name()).collect();
        assert_eq!(tags, ["SECTION", "IMG", "SPAN"]);
    }

    #[test]
    fn test_style_overwrite() {
        let img = MemoryElement::tile_image("x", 256.0, 0.0);
        assert_eq!(img.style("transform"), "translate3d(256px, 0px, 0px)");
        img.set_style("transform", "scale(2)");
        assert_eq!(img.style("transform"), "scale(2)");
        assert_eq!(img.style("display"), "");
    }

    #[test]
    fn test_ids_are_unique() {
        let a = MemoryElement::new("img");
        let b = MemoryElement::new("img");
        assert_ne!(a.element_id(), b.element_id());
        assert_eq!(a.element_id(), a.clone().element_id());
    }
}
