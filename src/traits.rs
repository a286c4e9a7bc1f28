//! Shared trait abstractions
//!
//! These are the seams between the platform-independent logic and the hosts
//! it runs in: where settings come from, and what a DOM element looks like.

use async_trait::async_trait;

use crate::Result;

/// Anything that can produce the remote configuration document.
///
/// Futures are not required to be `Send`: in the browser every await point
/// runs on the page's single thread.
#[async_trait(?Send)]
pub trait ConfigSource {
    /// Fetch and decode the document. Network failures, non-success statuses
    /// and malformed JSON are all reported as errors.
    async fn fetch(&self) -> Result<serde_json::Value>;

    /// Human-readable origin of the document, for log lines.
    fn describe(&self) -> String {
        "remote config".to_string()
    }
}

/// Stable identity of one element for the lifetime of the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

/// The slice of a DOM element the interception layer reads and mutates.
///
/// Implementations are cheap handles onto a shared tree (like `web_sys`
/// elements), so mutation goes through `&self`.
pub trait TileElement: Clone {
    fn element_id(&self) -> ElementId;

    fn tag_name(&self) -> String;

    fn has_class(&self, class: &str) -> bool;

    /// Current image URL, if the element has one.
    fn src(&self) -> Option<String>;

    fn set_src(&self, src: &str);

    /// Inline style property, empty when unset.
    fn style(&self, property: &str) -> String;

    fn set_style(&self, property: &str, value: &str);

    /// Direct element children, in document order.
    fn children(&self) -> Vec<Self>;

    /// All element descendants, depth first, excluding `self`.
    fn descendants(&self) -> Vec<Self> {
        let mut out = Vec::new();
        let mut stack: Vec<Self> = self.children().into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            stack.extend(node.children().into_iter().rev());
            out.push(node);
        }
        out
    }

    fn is_tag(&self, tag: &str) -> bool {
        self.tag_name().eq_ignore_ascii_case(tag)
    }
}
