// ABOUTME: Main library entry point for the axgrease DOM-tweak engine.
// ABOUTME: Re-exports the public API: Engine, Rule, transforms catalog, mutation types, TweakError.

//! axgrease - a rule-driven engine for applying accessibility annotations to
//! live HTML documents.
//!
//! A [`Rule`] pairs a CSS selector with a [`Transform`]. The [`Engine`] runs
//! every rule over the document once at start, then keeps applying the
//! dynamic subset to elements that appear or change later, driven by
//! [`MutationBatch`] messages the host delivers from its notification source.
//! One broken selector or transform never stops the rest of the page from
//! being annotated.
//!
//! # Example
//!
//! ```
//! use axgrease::{Engine, Rule, transforms};
//! use dom_query::Document;
//!
//! fn main() -> Result<(), axgrease::TweakError> {
//!     let doc = Document::from(
//!         "<html><body><div class='items'><div>One</div></div></body></html>",
//!     );
//!     let mut engine = Engine::builder()
//!         .dynamic_rule(Rule::new("div.items", transforms::set_attr("role", "list"))?)
//!         .dynamic_rule(Rule::new("div.items > *", transforms::set_attr("role", "listitem"))?)
//!         .build();
//!
//!     let subscription = engine.start(&doc)?;
//!     assert!(!subscription.watches_attributes());
//!     assert_eq!(doc.select("div.items").attr("role").unwrap().to_string(), "list");
//!     Ok(())
//! }
//! ```

pub mod applicator;
pub mod context;
pub mod engine;
pub mod error;
pub mod loader;
pub mod router;
pub mod rules;
pub mod transforms;

pub use crate::applicator::{apply, ApplyReport, ApplyScope};
pub use crate::context::{EngineContext, IdRegistry};
pub use crate::engine::{Engine, EngineBuilder, Subscription};
pub use crate::error::{ErrorCode, Result, TweakError};
pub use crate::loader::{load_rules_json, RulePhase, RuleSpec, TransformSpec};
pub use crate::router::{BatchReport, MutationBatch, MutationRecord};
pub use crate::rules::{Rule, RuleSet, Transform};
