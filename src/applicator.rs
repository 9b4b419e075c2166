// ABOUTME: The tweak applicator: runs rules over a scope and collects per-target outcomes.
// ABOUTME: Failures are captured as values so one broken transform never stops the rest.

use dom_query::{Document, NodeId, Selection};
use tracing::warn;

use crate::context::EngineContext;
use crate::error::TweakError;
use crate::rules::Rule;

/// What part of the document an application pass covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyScope {
    /// Every element in the document. The document root itself is not an
    /// element and is never a target.
    Document,
    /// Descendants of `root`, plus `root` itself when `include_root` is set.
    Subtree { root: NodeId, include_root: bool },
    /// Only the given element, with no descendant scan. Used for
    /// attribute-change dispatch.
    ElementOnly(NodeId),
}

/// Collected outcome of one application pass.
///
/// A transform failure lands in `failures` with its originating selector and
/// never prevents remaining targets, for that rule or subsequent rules, from
/// being processed.
#[derive(Debug, Default)]
pub struct ApplyReport {
    /// Number of successful transform invocations.
    pub applied: usize,
    /// One entry per failed (rule, element) pair.
    pub failures: Vec<TweakError>,
}

impl ApplyReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub(crate) fn merge(&mut self, other: ApplyReport) {
        self.applied += other.applied;
        self.failures.extend(other.failures);
    }
}

/// Apply `rules` in registration order to every element of `scope` they match.
///
/// For each rule the matching set is snapshotted before any of its transforms
/// run; because each rule re-queries, changes made by an earlier rule within
/// the same pass are visible to later rules. When the scope includes a root
/// element, the root is checked after its descendants.
pub fn apply<'r>(
    doc: &Document,
    scope: ApplyScope,
    rules: impl IntoIterator<Item = &'r Rule>,
    ctx: &EngineContext,
) -> ApplyReport {
    let mut report = ApplyReport::default();

    for rule in rules {
        let targets = collect_targets(doc, scope, rule);
        for id in targets {
            // The node can vanish mid-pass if the host mutates concurrently
            // with a transform; treat that as "no longer a target".
            let Some(node) = doc.tree.get(&id) else {
                continue;
            };
            match rule.invoke(&node, ctx) {
                Ok(()) => report.applied += 1,
                Err(source) => {
                    warn!(
                        selector = rule.selector(),
                        error = %source,
                        "transform failed, continuing with remaining targets"
                    );
                    report.failures.push(TweakError::transform(
                        rule.selector(),
                        "apply",
                        Some(source),
                    ));
                }
            }
        }
    }

    report
}

/// Snapshot the elements a rule targets within a scope, in document order.
fn collect_targets(doc: &Document, scope: ApplyScope, rule: &Rule) -> Vec<NodeId> {
    match scope {
        ApplyScope::Document => doc
            .select_matcher(rule.matcher())
            .nodes()
            .iter()
            .map(|n| n.id)
            .collect(),
        ApplyScope::Subtree { root, include_root } => {
            let Some(root_node) = doc.tree.get(&root) else {
                return Vec::new();
            };
            let mut ids: Vec<NodeId> = Selection::from(root_node)
                .select_matcher(rule.matcher())
                .nodes()
                .iter()
                .map(|n| n.id)
                .collect();
            if include_root && root_node.is_match(rule.matcher()) {
                ids.push(root);
            }
            ids
        }
        ApplyScope::ElementOnly(id) => match doc.tree.get(&id) {
            Some(node) if node.is_match(rule.matcher()) => vec![id],
            _ => Vec::new(),
        },
    }
}
