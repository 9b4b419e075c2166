// ABOUTME: The Rule record pairing a compiled selector with a transform closure.
// ABOUTME: RuleSet partitions rules into load-only and dynamic and derives the watched attribute union.

use std::collections::BTreeSet;
use std::fmt;

use dom_query::{Matcher, NodeRef};

use crate::context::EngineContext;
use crate::error::{Result, TweakError};

/// A transform is a unary operation over an element. Extra parameters are
/// bound at rule-construction time by the factories in [`crate::transforms`],
/// so dispatch never deals with argument lists.
pub type Transform = Box<dyn Fn(&NodeRef<'_>, &EngineContext) -> anyhow::Result<()>>;

/// Compile a selector into a matcher, surfacing malformed rule data
/// immediately instead of at apply time.
pub(crate) fn compile_selector(selector: &str) -> Result<Matcher> {
    Matcher::new(selector)
        .map_err(|e| TweakError::selector(selector, "compile", Some(anyhow::anyhow!("{:?}", e))))
}

/// A declarative rule: a selector, a transform, and change-tracking metadata.
///
/// Rules are immutable once registered. The selector is compiled eagerly;
/// a malformed selector is a programming error in rule data and surfaces
/// immediately rather than at apply time.
pub struct Rule {
    selector: String,
    matcher: Matcher,
    transform: Transform,
    watched_attributes: BTreeSet<String>,
    applies_on_attribute_change: bool,
}

impl Rule {
    pub fn new(selector: &str, transform: Transform) -> Result<Self> {
        let matcher = compile_selector(selector)?;
        Ok(Self {
            selector: selector.to_string(),
            matcher,
            transform,
            watched_attributes: BTreeSet::new(),
            applies_on_attribute_change: true,
        })
    }

    /// Add an attribute name whose changes should re-trigger dynamic rules.
    pub fn watch_attribute(mut self, name: impl Into<String>) -> Self {
        self.watched_attributes.insert(name.into());
        self
    }

    /// Control whether this rule runs when dispatch is triggered by an
    /// attribute change. Defaults to true.
    pub fn on_attribute_change(mut self, enabled: bool) -> Self {
        self.applies_on_attribute_change = enabled;
        self
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    pub fn applies_on_attribute_change(&self) -> bool {
        self.applies_on_attribute_change
    }

    pub fn watched_attributes(&self) -> &BTreeSet<String> {
        &self.watched_attributes
    }

    pub(crate) fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    pub(crate) fn invoke(&self, node: &NodeRef<'_>, ctx: &EngineContext) -> anyhow::Result<()> {
        (self.transform)(node, ctx)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("selector", &self.selector)
            .field("watched_attributes", &self.watched_attributes)
            .field(
                "applies_on_attribute_change",
                &self.applies_on_attribute_change,
            )
            .finish_non_exhaustive()
    }
}

/// An ordered sequence of rules, partitioned into load-only rules (applied
/// once at engine start) and dynamic rules (applied at start and again on
/// every qualifying mutation). Order within each partition is registration
/// order and is preserved by every application pass.
#[derive(Debug, Default)]
pub struct RuleSet {
    load: Vec<Rule>,
    dynamic: Vec<Rule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_load(&mut self, rule: Rule) {
        self.load.push(rule);
    }

    pub fn add_dynamic(&mut self, rule: Rule) {
        self.dynamic.push(rule);
    }

    pub fn load(&self) -> &[Rule] {
        &self.load
    }

    pub fn dynamic(&self) -> &[Rule] {
        &self.dynamic
    }

    pub fn is_empty(&self) -> bool {
        self.load.is_empty() && self.dynamic.is_empty()
    }

    /// Consume the set, yielding the load and dynamic partitions in
    /// registration order.
    pub fn into_parts(self) -> (Vec<Rule>, Vec<Rule>) {
        (self.load, self.dynamic)
    }

    /// Union of attribute names watched by dynamic rules. Derived on demand,
    /// never stored: it exists only to build the observation contract.
    pub fn watched_attributes(&self) -> BTreeSet<String> {
        let mut union = BTreeSet::new();
        for rule in &self.dynamic {
            union.extend(rule.watched_attributes.iter().cloned());
        }
        union
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transforms;

    #[test]
    fn malformed_selector_fails_fast() {
        let err = Rule::new("[[[nope", transforms::make_hidden()).unwrap_err();
        assert!(err.is_selector());
        assert!(err.to_string().contains("[[[nope"));
    }

    #[test]
    fn defaults_apply_on_attribute_change() {
        let rule = Rule::new("div", transforms::make_hidden()).unwrap();
        assert!(rule.applies_on_attribute_change());
        assert!(rule.watched_attributes().is_empty());
    }

    #[test]
    fn watched_attribute_union_spans_dynamic_rules() {
        let mut rules = RuleSet::new();
        rules.add_dynamic(
            Rule::new("a", transforms::make_hidden())
                .unwrap()
                .watch_attribute("class"),
        );
        rules.add_dynamic(
            Rule::new("b", transforms::make_hidden())
                .unwrap()
                .watch_attribute("class")
                .watch_attribute("aria-expanded"),
        );
        // Load-only rules never contribute to the union.
        rules.add_load(
            Rule::new("c", transforms::make_hidden())
                .unwrap()
                .watch_attribute("hidden"),
        );

        let union = rules.watched_attributes();
        assert_eq!(
            union.into_iter().collect::<Vec<_>>(),
            vec!["aria-expanded".to_string(), "class".to_string()]
        );
    }

    #[test]
    fn empty_ruleset_has_empty_union() {
        let rules = RuleSet::new();
        assert!(rules.is_empty());
        assert!(rules.watched_attributes().is_empty());
    }
}
