//! Browser host for [`TileInterceptor`]
//!
//! One mutation observer watches the document and every shadow root it can
//! reach. Tile layers and containers get their own `appendChild` wrapped on
//! the element instance (never on the prototype), so tile images are
//! rewritten before the browser starts loading the original URL.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use fxhash::{FxHashMap, FxHashSet};
use js_sys::{Array, Function, Reflect};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{
    Document, DocumentFragment, Element, MutationObserver, MutationObserverInit, MutationRecord,
    Node, ShadowRoot, ShadowRootInit, ShadowRootMode,
};

use super::element::WebElement;
use crate::{
    core::config::Settings,
    dom::interceptor::{Hook, TileInterceptor},
    traits::{ElementId, TileElement},
};

const APPEND_CHILD: &str = "appendChild";

type AppendChildFn = dyn FnMut(JsValue) -> Result<JsValue, JsValue>;
type MutationFn = dyn FnMut(JsValue, JsValue);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HookKind {
    Layer,
    Container,
}

/// An `appendChild` wrapper installed on one element instance.
struct InstalledHook {
    element: Element,
    _wrapper: Closure<AppendChildFn>,
}

impl Drop for InstalledHook {
    fn drop(&mut self) {
        // fall back to the prototype's appendChild
        let _ = Reflect::delete_property(&self.element, &JsValue::from_str(APPEND_CHILD));
    }
}

struct Inner {
    interceptor: RefCell<TileInterceptor>,
    observer: RefCell<Option<MutationObserver>>,
    callback: RefCell<Option<Closure<MutationFn>>>,
    hooks: RefCell<FxHashMap<ElementId, InstalledHook>>,
    shadow_hosts: RefCell<FxHashSet<ElementId>>,
}

/// A [`TileInterceptor`] wired into a live page.
#[derive(Clone)]
pub struct PageInterceptor {
    inner: Rc<Inner>,
}

impl PageInterceptor {
    /// Observe `document`, sweep what it already contains and hook every
    /// tile layer found.
    pub fn install(document: &Document, settings: Settings) -> Result<Self, JsValue> {
        let page = Self {
            inner: Rc::new(Inner {
                interceptor: RefCell::new(TileInterceptor::new(settings)),
                observer: RefCell::new(None),
                callback: RefCell::new(None),
                hooks: RefCell::new(FxHashMap::default()),
                shadow_hosts: RefCell::new(FxHashSet::default()),
            }),
        };

        let weak = Rc::downgrade(&page.inner);
        let callback = Closure::wrap(Box::new(move |records: JsValue, _observer: JsValue| {
            if let Some(page) = upgrade(&weak) {
                page.on_mutations(&records);
            }
        }) as Box<MutationFn>);
        let observer = MutationObserver::new(callback.as_ref().unchecked_ref())?;
        *page.inner.observer.borrow_mut() = Some(observer);
        *page.inner.callback.borrow_mut() = Some(callback);

        page.observe(document)?;
        if let Some(root) = document.document_element() {
            page.on_added(&root);
        }
        Ok(page)
    }

    pub fn settings(&self) -> Settings {
        self.inner.interceptor.borrow().settings().clone()
    }

    /// Swap in new settings; already rewritten tiles stay as they are.
    pub fn apply_settings(&self, settings: Settings) {
        self.inner.interceptor.borrow_mut().apply_settings(settings);
    }

    /// Watch `target` and its whole subtree for insertions and removals.
    pub fn observe(&self, target: &Node) -> Result<(), JsValue> {
        let init = MutationObserverInit::new();
        init.set_child_list(true);
        init.set_subtree(true);
        match self.inner.observer.borrow().as_ref() {
            Some(observer) => observer.observe_with_options(target, &init),
            None => Err(JsValue::from_str("mutation observer not initialised")),
        }
    }

    /// Create a shadow root on `host` that is observed from the start.
    ///
    /// Components created after installation should attach their shadow
    /// roots through here; roots created elsewhere are picked up when their
    /// host is inserted into an observed tree.
    ///
    /// A shadow root attached by other code to a host that is already in
    /// the document (a custom element upgraded after a late
    /// `customElements.define`) produces no mutation record and stays
    /// unobserved. Call [`PageInterceptor::observe_shadow_roots`] on such a
    /// host once it has upgraded.
    pub fn attach_shadow(&self, host: &Element, mode: ShadowRootMode) -> Result<ShadowRoot, JsValue> {
        let shadow = host.attach_shadow(&ShadowRootInit::new(mode))?;
        self.inner
            .shadow_hosts
            .borrow_mut()
            .insert(WebElement(host.clone()).element_id());
        self.observe(&shadow)?;
        Ok(shadow)
    }

    /// Observe every open shadow root at or below `root`, sweeping the
    /// content of roots seen for the first time.
    pub fn observe_shadow_roots(&self, root: &Element) {
        let mut queue = vec![root.clone()];
        while let Some(element) = queue.pop() {
            if let Some(shadow) = element.shadow_root() {
                let host_id = WebElement(element.clone()).element_id();
                let first_visit = self.inner.shadow_hosts.borrow_mut().insert(host_id);
                if first_visit {
                    if let Err(e) = self.observe(&shadow) {
                        log::warn!("cannot observe shadow root of <{}>: {:?}", element.tag_name(), e);
                    }
                }
                let children = fragment_children(&shadow);
                if first_visit {
                    for child in &children {
                        self.process_added(child);
                    }
                }
                queue.extend(children);
            }
            let children = element.children();
            queue.extend((0..children.length()).filter_map(|i| children.item(i)));
        }
    }

    fn on_mutations(&self, records: &JsValue) {
        let Some(records) = records.dyn_ref::<Array>() else {
            return;
        };
        for record in records.iter() {
            let Ok(record) = record.dyn_into::<MutationRecord>() else {
                continue;
            };
            let removed = record.removed_nodes();
            for node in (0..removed.length()).filter_map(|i| removed.item(i)) {
                if let Some(element) = node.dyn_ref::<Element>() {
                    self.on_removed(element);
                }
            }
            let added = record.added_nodes();
            for node in (0..added.length()).filter_map(|i| added.item(i)) {
                if let Some(element) = node.dyn_ref::<Element>() {
                    self.on_added(element);
                }
            }
        }
    }

    fn on_added(&self, element: &Element) {
        self.process_added(element);
        self.observe_shadow_roots(element);
    }

    fn process_added(&self, element: &Element) {
        let hooks = match self.inner.interceptor.try_borrow_mut() {
            Ok(mut interceptor) => interceptor.handle_added(&WebElement(element.clone())),
            Err(_) => {
                log::warn!("interceptor busy, skipping inserted <{}>", element.tag_name());
                return;
            }
        };
        self.install_hooks(hooks);
    }

    fn on_removed(&self, element: &Element) {
        // moved rather than removed: the matching added record follows
        if element.is_connected() {
            return;
        }
        let unhooked = match self.inner.interceptor.try_borrow_mut() {
            Ok(mut interceptor) => interceptor.handle_removed(&WebElement(element.clone())),
            Err(_) => return,
        };
        let mut hooks = self.inner.hooks.borrow_mut();
        for id in unhooked {
            hooks.remove(&id);
        }
    }

    fn install_hooks(&self, hooks: Vec<Hook<WebElement>>) {
        for hook in hooks {
            let (element, kind) = match hook {
                Hook::Layer(e) => (e, HookKind::Layer),
                Hook::Container(e) => (e, HookKind::Container),
            };
            let weak = Rc::downgrade(&self.inner);
            let installed = wrap_append_child(element.element(), move |child: &JsValue| {
                if let Some(page) = upgrade(&weak) {
                    page.before_insert(kind, child);
                }
            });
            match installed {
                Ok(hook) => {
                    self.inner.hooks.borrow_mut().insert(element.element_id(), hook);
                }
                Err(e) => log::warn!("failed to hook tile {:?}: {:?}", kind, e),
            }
        }
    }

    /// Runs inside a wrapped `appendChild`, before the original is called.
    fn before_insert(&self, kind: HookKind, child: &JsValue) {
        let Ok(mut interceptor) = self.inner.interceptor.try_borrow_mut() else {
            return;
        };
        match kind {
            HookKind::Layer => {
                let Some(element) = child.dyn_ref::<Element>() else {
                    return;
                };
                let hook = interceptor.before_layer_insert(&WebElement(element.clone()));
                drop(interceptor);
                if let Some(hook) = hook {
                    self.install_hooks(vec![hook]);
                }
            }
            HookKind::Container => {
                let inserted: Vec<WebElement> = if let Some(fragment) = child.dyn_ref::<DocumentFragment>() {
                    fragment_children(fragment).into_iter().map(WebElement).collect()
                } else if let Some(element) = child.dyn_ref::<Element>() {
                    vec![WebElement(element.clone())]
                } else {
                    Vec::new()
                };
                interceptor.before_container_insert(&inserted);
            }
        }
    }
}

fn upgrade(weak: &Weak<Inner>) -> Option<PageInterceptor> {
    weak.upgrade().map(|inner| PageInterceptor { inner })
}

fn fragment_children(fragment: &DocumentFragment) -> Vec<Element> {
    let children = fragment.children();
    (0..children.length()).filter_map(|i| children.item(i)).collect()
}

/// Replace `target.appendChild` with a wrapper that calls `before` with the
/// child and then forwards to the original method.
fn wrap_append_child<F>(target: &Element, before: F) -> Result<InstalledHook, JsValue>
where
    F: Fn(&JsValue) + 'static,
{
    let key = JsValue::from_str(APPEND_CHILD);
    let original: Function = Reflect::get(target, &key)?.dyn_into()?;
    let this = target.clone();
    let wrapper = Closure::wrap(Box::new(move |child: JsValue| {
        before(&child);
        original.call1(&this, &child)
    }) as Box<AppendChildFn>);
    Reflect::set(target, &key, wrapper.as_ref())?;
    Ok(InstalledHook { element: target.clone(), _wrapper: wrapper })
}
