// ABOUTME: Engine lifecycle: load pass, dynamic pass, subscription handoff, batch handling.
// ABOUTME: EngineBuilder provides a fluent API for registering rules before start.

use std::collections::BTreeSet;

use dom_query::Document;
use tracing::debug;

use crate::applicator::{apply, ApplyScope};
use crate::context::EngineContext;
use crate::error::{Result, TweakError};
use crate::router::{route_batch, BatchReport, MutationBatch};
use crate::rules::{Rule, RuleSet};

/// The observation contract handed to the host at start.
///
/// Exactly one subscription per document is meaningful; the engine enforces
/// this by refusing a second `start`. The host installs its notification
/// source with these options and feeds the resulting batches back through
/// [`Engine::handle_batch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    /// Observe additions and removals of children.
    pub child_list: bool,
    /// Observe the whole subtree under the document, not just direct children.
    pub subtree: bool,
    /// Attribute names to observe. `None` disables attribute observation
    /// entirely, minimizing notification volume.
    attribute_filter: Option<BTreeSet<String>>,
}

impl Subscription {
    fn new(watched: BTreeSet<String>) -> Self {
        let attribute_filter = if watched.is_empty() {
            None
        } else {
            Some(watched)
        };
        Self {
            child_list: true,
            subtree: true,
            attribute_filter,
        }
    }

    pub fn watches_attributes(&self) -> bool {
        self.attribute_filter.is_some()
    }

    pub fn attribute_filter(&self) -> Option<&BTreeSet<String>> {
        self.attribute_filter.as_ref()
    }
}

/// The tweak engine. Lifecycle is `Uninitialized -> Running`, with no stop
/// state: the engine lives for the life of the hosting page and the host
/// recycles everything on navigation.
pub struct Engine {
    rules: RuleSet,
    ctx: EngineContext,
    watched: BTreeSet<String>,
    running: bool,
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Shared state handed to transforms; the host reads pending focus
    /// requests from here after each pass.
    pub fn context(&self) -> &EngineContext {
        &self.ctx
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Run the load pass and transition to Running.
    ///
    /// Applies the load-only rules once over the whole document, then the
    /// dynamic rules once, so elements present before start are tweaked
    /// exactly like freshly inserted ones. Returns the subscription the host
    /// should install. Calling `start` twice is a lifecycle error: a second
    /// subscription per document is a logic bug, not a configuration.
    pub fn start(&mut self, doc: &Document) -> Result<Subscription> {
        if self.running {
            return Err(TweakError::lifecycle(
                "start",
                Some(anyhow::anyhow!("engine already running")),
            ));
        }

        let mut report = apply(doc, ApplyScope::Document, self.rules.load(), &self.ctx);
        report.merge(apply(
            doc,
            ApplyScope::Document,
            self.rules.dynamic(),
            &self.ctx,
        ));
        debug!(
            applied = report.applied,
            failures = report.failures.len(),
            "load pass complete"
        );

        self.watched = self.rules.watched_attributes();
        self.running = true;
        Ok(Subscription::new(self.watched.clone()))
    }

    /// Feed one host-delivered mutation batch through the router.
    ///
    /// Synchronous and run-to-completion; records are processed in delivery
    /// order and failures are isolated per record.
    pub fn handle_batch(&self, doc: &Document, batch: &MutationBatch) -> Result<BatchReport> {
        if !self.running {
            return Err(TweakError::lifecycle(
                "handle_batch",
                Some(anyhow::anyhow!("engine not started")),
            ));
        }
        Ok(route_batch(
            doc,
            batch,
            self.rules.dynamic(),
            &self.watched,
            &self.ctx,
        ))
    }
}

/// Builder for constructing Engine instances.
#[derive(Debug, Default)]
pub struct EngineBuilder {
    rules: RuleSet,
    id_prefix: Option<String>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule applied once at start only.
    pub fn load_rule(mut self, rule: Rule) -> Self {
        self.rules.add_load(rule);
        self
    }

    /// Register a rule applied at start and on every qualifying mutation.
    pub fn dynamic_rule(mut self, rule: Rule) -> Self {
        self.rules.add_dynamic(rule);
        self
    }

    /// Register an already-partitioned rule set, appending to any rules
    /// registered so far.
    pub fn rules(mut self, rules: RuleSet) -> Self {
        let (load, dynamic) = rules.into_parts();
        for rule in load {
            self.rules.add_load(rule);
        }
        for rule in dynamic {
            self.rules.add_dynamic(rule);
        }
        self
    }

    /// Prefix for generated element identifiers.
    pub fn id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.id_prefix = Some(prefix.into());
        self
    }

    pub fn build(self) -> Engine {
        let ctx = match self.id_prefix {
            Some(prefix) => EngineContext::with_id_prefix(prefix),
            None => EngineContext::new(),
        };
        Engine {
            rules: self.rules,
            ctx,
            watched: BTreeSet::new(),
            running: false,
        }
    }
}
