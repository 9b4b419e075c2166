// ABOUTME: Engine-owned shared state passed by reference to transforms.
// ABOUTME: Holds the monotonic IdRegistry and the pending focus request mailbox.

use std::cell::Cell;

use dom_query::{NodeId, NodeRef};

/// Default prefix for generated element identifiers.
const DEFAULT_ID_PREFIX: &str = "axg";

/// Assigns process-unique identifiers to elements that lack one.
///
/// The counter only ever moves forward: an identifier is never reassigned and
/// never reused within a document's lifetime. Elements that already carry an
/// `id` attribute keep it untouched.
#[derive(Debug)]
pub struct IdRegistry {
    prefix: String,
    counter: Cell<u64>,
}

impl IdRegistry {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: Cell::new(0),
        }
    }

    /// Returns the element's id, assigning a fresh `{prefix}-{n}` one if absent.
    pub fn ensure_id(&self, node: &NodeRef) -> String {
        if let Some(existing) = node.attr("id") {
            if !existing.is_empty() {
                return existing.to_string();
            }
        }
        let n = self.counter.get();
        self.counter.set(n + 1);
        let id = format!("{}-{}", self.prefix, n);
        node.set_attr("id", &id);
        id
    }

    /// Number of identifiers handed out so far.
    pub fn assigned(&self) -> u64 {
        self.counter.get()
    }
}

impl Default for IdRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_ID_PREFIX)
    }
}

/// Shared state the engine passes to every transform invocation.
///
/// Explicit state owned by the engine instance rather than ambient globals,
/// so independent engines (e.g. under test) never cross-contaminate.
#[derive(Debug, Default)]
pub struct EngineContext {
    ids: IdRegistry,
    focus: Cell<Option<NodeId>>,
}

impl EngineContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id_prefix(prefix: impl Into<String>) -> Self {
        Self {
            ids: IdRegistry::new(prefix),
            focus: Cell::new(None),
        }
    }

    pub fn ids(&self) -> &IdRegistry {
        &self.ids
    }

    /// Record that the host should move keyboard focus to `node`.
    ///
    /// A later request overwrites an earlier one within the same pass; focus
    /// is a single slot, not a queue.
    pub fn request_focus(&self, node: NodeId) {
        self.focus.set(Some(node));
    }

    /// Take the pending focus request, if any. The host polls this after each
    /// application pass and performs the actual focus movement.
    pub fn take_focus_request(&self) -> Option<NodeId> {
        self.focus.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dom_query::Document;

    #[test]
    fn ensure_id_assigns_monotonically() {
        let doc = Document::from("<div><span class='a'></span><span class='b'></span></div>");
        let ctx = EngineContext::new();

        let sel = doc.select("span");
        let nodes = sel.nodes();
        let first = ctx.ids().ensure_id(&nodes[0]);
        let second = ctx.ids().ensure_id(&nodes[1]);

        assert_eq!(first, "axg-0");
        assert_eq!(second, "axg-1");
        assert_eq!(ctx.ids().assigned(), 2);
    }

    #[test]
    fn ensure_id_keeps_existing_id() {
        let doc = Document::from("<div id='already'></div>");
        let ctx = EngineContext::new();

        let sel = doc.select("div");
        let id = ctx.ids().ensure_id(&sel.nodes()[0]);

        assert_eq!(id, "already");
        assert_eq!(ctx.ids().assigned(), 0);
    }

    #[test]
    fn ensure_id_is_stable_across_calls() {
        let doc = Document::from("<p></p>");
        let ctx = EngineContext::new();

        let sel = doc.select("p");
        let node = sel.nodes()[0];
        let first = ctx.ids().ensure_id(&node);
        let second = ctx.ids().ensure_id(&node);

        assert_eq!(first, second);
        assert_eq!(ctx.ids().assigned(), 1);
    }

    #[test]
    fn focus_request_is_single_slot() {
        let doc = Document::from("<a></a><b></b>");
        let ctx = EngineContext::new();
        let sel_a = doc.select("a");
        let sel_b = doc.select("b");

        ctx.request_focus(sel_a.nodes()[0].id);
        ctx.request_focus(sel_b.nodes()[0].id);

        assert_eq!(ctx.take_focus_request(), Some(sel_b.nodes()[0].id));
        assert_eq!(ctx.take_focus_request(), None);
    }
}
