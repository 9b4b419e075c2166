// ABOUTME: The mutation router: turns host-delivered change batches into applicator calls.
// ABOUTME: Each record is handled independently so one bad record never aborts the batch.

use std::collections::BTreeSet;

use dom_query::{Document, NodeId};
use tracing::{debug, warn};

use crate::applicator::{apply, ApplyReport, ApplyScope};
use crate::context::EngineContext;
use crate::error::TweakError;
use crate::rules::Rule;

/// One raw change record, as delivered by the host's notification source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationRecord {
    /// Children were added under some element. Only additions matter to the
    /// engine; removals never need re-annotation.
    ChildList { added: Vec<NodeId> },
    /// A watched attribute changed on an element.
    Attribute { target: NodeId, attribute: String },
}

/// A set of change records delivered together for one tick of host-observed
/// change. Records are processed strictly in delivery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationBatch {
    pub records: Vec<MutationRecord>,
}

impl MutationBatch {
    pub fn new(records: Vec<MutationRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl From<Vec<MutationRecord>> for MutationBatch {
    fn from(records: Vec<MutationRecord>) -> Self {
        Self { records }
    }
}

/// Outcome of routing one mutation batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Records that produced at least one applicator call.
    pub handled: usize,
    /// Records ignored outright: non-element additions, unwatched attributes.
    pub skipped: usize,
    /// Merged outcome of every applicator call in the batch. Record-level
    /// failures (a node no longer in the tree) land here too.
    pub apply: ApplyReport,
}

/// Route a batch of mutation records to the applicator against the dynamic
/// rule set.
///
/// Structural additions are rescanned as whole subtrees, since an insertion
/// can bring in a pre-built fragment. An attribute change only re-checks the
/// changed element itself: it cannot introduce new descendants, and rules
/// with `applies_on_attribute_change` disabled are skipped entirely.
pub(crate) fn route_batch(
    doc: &Document,
    batch: &MutationBatch,
    dynamic: &[Rule],
    watched: &BTreeSet<String>,
    ctx: &EngineContext,
) -> BatchReport {
    let mut report = BatchReport::default();

    for record in &batch.records {
        match record {
            MutationRecord::ChildList { added } => {
                let mut touched = false;
                for &id in added {
                    let Some(node) = doc.tree.get(&id) else {
                        warn!(?id, "added node no longer in tree, skipping record entry");
                        report.apply.failures.push(TweakError::mutation(
                            "route childList",
                            Some(anyhow::anyhow!("added node {:?} not found", id)),
                        ));
                        continue;
                    };
                    if !node.is_element() {
                        continue;
                    }
                    touched = true;
                    report.apply.merge(apply(
                        doc,
                        ApplyScope::Subtree {
                            root: id,
                            include_root: true,
                        },
                        dynamic,
                        ctx,
                    ));
                }
                if touched {
                    report.handled += 1;
                } else {
                    report.skipped += 1;
                }
            }
            MutationRecord::Attribute { target, attribute } => {
                if !watched.contains(attribute) {
                    debug!(attribute, "attribute not watched, skipping record");
                    report.skipped += 1;
                    continue;
                }
                if doc.tree.get(target).is_none() {
                    warn!(?target, "attribute target no longer in tree");
                    report.apply.failures.push(TweakError::mutation(
                        "route attribute",
                        Some(anyhow::anyhow!("target node {:?} not found", target)),
                    ));
                    report.skipped += 1;
                    continue;
                }
                let eligible = dynamic.iter().filter(|r| r.applies_on_attribute_change());
                report
                    .apply
                    .merge(apply(doc, ApplyScope::ElementOnly(*target), eligible, ctx));
                report.handled += 1;
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use dom_query::Document;

    use super::*;
    use crate::rules::Rule;
    use crate::transforms;

    const HTML: &str = r#"
        <html><body>
            <div class="items">
                <div class="row">one</div>
                some text
            </div>
        </body></html>
    "#;

    fn watched(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn child_list_applies_to_added_subtree_and_root() {
        let doc = Document::from(HTML);
        let ctx = EngineContext::new();
        let rules = vec![
            Rule::new("div.items", transforms::set_attr("role", "list")).unwrap(),
            Rule::new("div.row", transforms::set_attr("role", "listitem")).unwrap(),
        ];

        let added = doc.select("div.items").nodes()[0].id;
        let batch = MutationBatch::from(vec![MutationRecord::ChildList { added: vec![added] }]);

        let report = route_batch(&doc, &batch, &rules, &watched(&[]), &ctx);

        assert_eq!(report.handled, 1);
        assert_eq!(report.apply.applied, 2);
        assert_eq!(
            doc.select("div.items").attr("role").unwrap().to_string(),
            "list"
        );
        assert_eq!(
            doc.select("div.row").attr("role").unwrap().to_string(),
            "listitem"
        );
    }

    #[test]
    fn unwatched_attribute_record_is_skipped() {
        let doc = Document::from(HTML);
        let ctx = EngineContext::new();
        let rules = vec![Rule::new("div.items", transforms::make_hidden()).unwrap()];

        let target = doc.select("div.items").nodes()[0].id;
        let batch = MutationBatch::from(vec![MutationRecord::Attribute {
            target,
            attribute: "style".to_string(),
        }]);

        let report = route_batch(&doc, &batch, &rules, &watched(&["class"]), &ctx);

        assert_eq!(report.handled, 0);
        assert_eq!(report.skipped, 1);
        assert!(doc.select("div.items").attr("aria-hidden").is_none());
    }

    #[test]
    fn attribute_record_skips_rules_opted_out_of_attr_dispatch() {
        let doc = Document::from(HTML);
        let ctx = EngineContext::new();
        let rules = vec![
            Rule::new("div.items", transforms::set_attr("data-a", "1"))
                .unwrap()
                .watch_attribute("class"),
            Rule::new("div.items", transforms::set_attr("data-b", "1"))
                .unwrap()
                .on_attribute_change(false),
        ];

        let target = doc.select("div.items").nodes()[0].id;
        let batch = MutationBatch::from(vec![MutationRecord::Attribute {
            target,
            attribute: "class".to_string(),
        }]);

        let report = route_batch(&doc, &batch, &rules, &watched(&["class"]), &ctx);

        assert_eq!(report.handled, 1);
        assert_eq!(report.apply.applied, 1);
        let items = doc.select("div.items");
        assert_eq!(items.attr("data-a").unwrap().to_string(), "1");
        assert!(items.attr("data-b").is_none());
    }

    #[test]
    fn stale_node_ids_are_recovered_mutation_failures() {
        let doc = Document::from(HTML);
        let ctx = EngineContext::new();
        let rules = vec![Rule::new("div.row", transforms::set_attr("role", "row")).unwrap()];

        // Mint an id from a much larger unrelated document; it names no node
        // in `doc`, like a node removed between observation and delivery.
        let big = format!("<html><body>{}</body></html>", "<span>x</span>".repeat(64));
        let other = Document::from(big.as_str());
        let stale = other.select("span").nodes().last().unwrap().id;
        assert!(doc.tree.get(&stale).is_none());

        let good = doc.select("div.items").nodes()[0].id;
        let batch = MutationBatch::from(vec![
            MutationRecord::ChildList {
                added: vec![stale],
            },
            MutationRecord::Attribute {
                target: stale,
                attribute: "class".to_string(),
            },
            MutationRecord::ChildList { added: vec![good] },
        ]);

        let report = route_batch(&doc, &batch, &rules, &watched(&["class"]), &ctx);

        // Both stale records surface as recovered mutation failures; the
        // final valid record is still routed and its rule applied.
        assert_eq!(report.apply.failures.len(), 2);
        assert!(report.apply.failures.iter().all(|e| e.is_mutation()));
        assert_eq!(report.handled, 1);
        assert_eq!(report.skipped, 2);
        assert_eq!(
            doc.select("div.row").attr("role").unwrap().to_string(),
            "row"
        );
    }

    #[test]
    fn records_after_a_failing_one_still_run() {
        let doc = Document::from(HTML);
        let ctx = EngineContext::new();
        let rules = vec![
            Rule::new(
                "div.items",
                Box::new(|_el, _ctx| Err(anyhow::anyhow!("broken tweak"))),
            )
            .unwrap(),
            Rule::new("div.row", transforms::set_attr("role", "row")).unwrap(),
        ];

        let root = doc.select("div.items").nodes()[0].id;
        let row = doc.select("div.row").nodes()[0].id;
        let batch = MutationBatch::from(vec![
            MutationRecord::ChildList { added: vec![root] },
            MutationRecord::ChildList { added: vec![row] },
        ]);

        let report = route_batch(&doc, &batch, &rules, &watched(&[]), &ctx);

        // The failure in the first record is recorded; the second record is
        // still processed and its rule applied.
        assert_eq!(report.handled, 2);
        assert!(!report.apply.is_clean());
        assert_eq!(
            doc.select("div.row").attr("role").unwrap().to_string(),
            "row"
        );
    }
}
