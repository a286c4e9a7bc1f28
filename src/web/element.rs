use std::cell::Cell;

use js_sys::Reflect;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Element, HtmlElement, HtmlImageElement, Node};

use crate::traits::{ElementId, TileElement};

/// Expando property carrying the identity assigned to an element.
const ID_PROPERTY: &str = "__mapReplacerId";

thread_local! {
    static NEXT_ID: Cell<u64> = const { Cell::new(1) };
}

/// [`TileElement`] over a live DOM element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebElement(pub Element);

impl WebElement {
    pub fn from_node(node: &Node) -> Option<Self> {
        node.dyn_ref::<Element>().cloned().map(WebElement)
    }

    pub fn element(&self) -> &Element {
        &self.0
    }
}

impl TileElement for WebElement {
    fn element_id(&self) -> ElementId {
        let key = JsValue::from_str(ID_PROPERTY);
        if let Some(id) = Reflect::get(&self.0, &key).ok().and_then(|v| v.as_f64()) {
            return ElementId(id as u64);
        }
        let id = NEXT_ID.with(|next| {
            let id = next.get();
            next.set(id + 1);
            id
        });
        let _ = Reflect::set(&self.0, &key, &JsValue::from_f64(id as f64));
        ElementId(id)
    }

    fn tag_name(&self) -> String {
        self.0.tag_name()
    }

    fn has_class(&self, class: &str) -> bool {
        self.0.class_list().contains(class)
    }

    fn src(&self) -> Option<String> {
        match self.0.dyn_ref::<HtmlImageElement>() {
            Some(img) => Some(img.src()).filter(|src| !src.is_empty()),
            None => self.0.get_attribute("src"),
        }
    }

    fn set_src(&self, src: &str) {
        match self.0.dyn_ref::<HtmlImageElement>() {
            Some(img) => img.set_src(src),
            None => {
                if let Err(e) = self.0.set_attribute("src", src) {
                    log::warn!("cannot set src on <{}>: {:?}", self.0.tag_name(), e);
                }
            }
        }
    }

    fn style(&self, property: &str) -> String {
        self.0
            .dyn_ref::<HtmlElement>()
            .and_then(|e| e.style().get_property_value(property).ok())
            .unwrap_or_default()
    }

    fn set_style(&self, property: &str, value: &str) {
        if let Some(e) = self.0.dyn_ref::<HtmlElement>() {
            if let Err(err) = e.style().set_property(property, value) {
                log::warn!("cannot set style {} on <{}>: {:?}", property, self.0.tag_name(), err);
            }
        }
    }

    fn children(&self) -> Vec<Self> {
        let children = self.0.children();
        (0..children.length())
            .filter_map(|i| children.item(i))
            .map(WebElement)
            .collect()
    }

    fn descendants(&self) -> Vec<Self> {
        let Ok(nodes) = self.0.query_selector_all("*") else {
            return Vec::new();
        };
        (0..nodes.length())
            .filter_map(|i| nodes.item(i))
            .filter_map(|node| WebElement::from_node(&node))
            .collect()
    }
}
