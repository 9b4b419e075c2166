// ABOUTME: Catalog of transform factories for common accessibility tweaks.
// ABOUTME: Each factory binds its parameters and returns a unary Transform closure.

//! The standard transform catalog.
//!
//! Every function here is a pure parameterized factory returning a
//! [`Transform`]: a unary closure over an element. All transforms in this
//! catalog set attributes to fixed values and are therefore idempotent;
//! applying one twice leaves the document byte-identical.

use dom_query::Selection;

use crate::context::EngineContext;
use crate::error::Result;
use crate::rules::{compile_selector, Transform};

/// Mark an element as a heading at the given level.
pub fn make_heading(level: u8) -> Transform {
    let level = level.to_string();
    Box::new(move |el, _ctx| {
        el.set_attr("role", "heading");
        el.set_attr("aria-level", &level);
        Ok(())
    })
}

/// Mark an element as a labelled region.
pub fn make_region(label: impl Into<String>) -> Transform {
    let label = label.into();
    Box::new(move |el, _ctx| {
        el.set_attr("role", "region");
        el.set_attr("aria-label", &label);
        Ok(())
    })
}

/// Mark an element as a button, optionally labelling it.
pub fn make_button(label: Option<String>) -> Transform {
    Box::new(move |el, _ctx| {
        el.set_attr("role", "button");
        if let Some(ref label) = label {
            el.set_attr("aria-label", label);
        }
        Ok(())
    })
}

/// Mark an element as presentational.
pub fn make_presentational() -> Transform {
    Box::new(|el, _ctx| {
        el.set_attr("role", "presentation");
        Ok(())
    })
}

/// Set an accessible label on an element.
pub fn set_label(label: impl Into<String>) -> Transform {
    let label = label.into();
    Box::new(move |el, _ctx| {
        el.set_attr("aria-label", &label);
        Ok(())
    })
}

/// Hide an element from the accessibility tree.
pub fn make_hidden() -> Transform {
    Box::new(|el, _ctx| {
        el.set_attr("aria-hidden", "true");
        Ok(())
    })
}

/// Mark an element's expanded/collapsed state.
pub fn set_expanded(expanded: bool) -> Transform {
    let value = if expanded { "true" } else { "false" };
    Box::new(move |el, _ctx| {
        el.set_attr("aria-expanded", value);
        Ok(())
    })
}

/// Set an arbitrary attribute to a fixed value.
pub fn set_attr(name: impl Into<String>, value: impl Into<String>) -> Transform {
    let name = name.into();
    let value = value.into();
    Box::new(move |el, _ctx| {
        el.set_attr(&name, &value);
        Ok(())
    })
}

/// Establish an ownership relation from an element to the descendants
/// matching `child_selector`, via generated identifiers.
///
/// Children lacking an `id` get one from the engine's [`crate::IdRegistry`];
/// children that already have an id keep it, so repeated application yields
/// the same `aria-owns` value in the same order.
pub fn own_descendants(child_selector: &str) -> Result<Transform> {
    let matcher = compile_selector(child_selector)?;
    Ok(Box::new(move |el, ctx| {
        let children = Selection::from(*el).select_matcher(&matcher);
        let ids: Vec<String> = children
            .nodes()
            .iter()
            .map(|child| ctx.ids().ensure_id(child))
            .collect();
        el.set_attr("aria-owns", &ids.join(" "));
        Ok(())
    }))
}

/// Force keyboard focus onto an element not natively focusable.
///
/// The attribute half happens here (`tabindex="-1"` when the element has no
/// tabindex of its own); the actual focus movement is the host's job, picked
/// up via [`EngineContext::take_focus_request`].
pub fn force_focus() -> Transform {
    Box::new(|el, ctx: &EngineContext| {
        if el.attr("tabindex").is_none() {
            el.set_attr("tabindex", "-1");
        }
        ctx.request_focus(el.id);
        Ok(())
    })
}
