// ABOUTME: Declarative rule specs loadable from JSON and compiled into a RuleSet.
// ABOUTME: TransformSpec is a tagged enum with one variant per catalog factory.

//! Declarative rule definitions.
//!
//! Site-specific rule data is pure configuration: a JSON array of
//! [`RuleSpec`] records, each pairing a selector with a [`TransformSpec`]
//! naming a catalog transform and its parameters. Specs compile into real
//! [`Rule`]s at load time, so malformed selectors surface immediately.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TweakError};
use crate::rules::{Rule, RuleSet, Transform};
use crate::transforms;

/// When a rule runs: once at load, or at load plus on every qualifying
/// mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RulePhase {
    Load,
    #[default]
    Dynamic,
}

/// Specifies a catalog transform and its bound parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransformSpec {
    /// Mark as a heading at the given level.
    Heading { level: u8 },
    /// Mark as a labelled region.
    Region { label: String },
    /// Mark as a button, optionally labelled.
    Button {
        #[serde(default)]
        label: Option<String>,
    },
    /// Mark as presentational.
    Presentational,
    /// Set an accessible label.
    Label { value: String },
    /// Hide from the accessibility tree.
    Hidden,
    /// Mark expanded/collapsed state.
    Expanded { expanded: bool },
    /// Own the descendants matching `children` via generated ids.
    Owns { children: String },
    /// Force keyboard focus onto the element.
    ForceFocus,
    /// Set an arbitrary attribute to a fixed value.
    SetAttr { name: String, value: String },
}

impl TransformSpec {
    /// Build the closure this spec describes. `Owns` compiles its child
    /// selector here, so bad rule data fails at load time.
    pub fn build(&self) -> Result<Transform> {
        Ok(match self {
            TransformSpec::Heading { level } => transforms::make_heading(*level),
            TransformSpec::Region { label } => transforms::make_region(label.clone()),
            TransformSpec::Button { label } => transforms::make_button(label.clone()),
            TransformSpec::Presentational => transforms::make_presentational(),
            TransformSpec::Label { value } => transforms::set_label(value.clone()),
            TransformSpec::Hidden => transforms::make_hidden(),
            TransformSpec::Expanded { expanded } => transforms::set_expanded(*expanded),
            TransformSpec::Owns { children } => transforms::own_descendants(children)?,
            TransformSpec::ForceFocus => transforms::force_focus(),
            TransformSpec::SetAttr { name, value } => {
                transforms::set_attr(name.clone(), value.clone())
            }
        })
    }
}

/// One declarative rule record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSpec {
    pub selector: String,
    pub tweak: TransformSpec,
    #[serde(default)]
    pub watched_attributes: Vec<String>,
    #[serde(default = "default_true")]
    pub applies_on_attribute_change: bool,
    #[serde(default)]
    pub phase: RulePhase,
}

fn default_true() -> bool {
    true
}

impl RuleSpec {
    /// Compile this spec into a registered-form rule.
    pub fn compile(&self) -> Result<Rule> {
        let mut rule = Rule::new(&self.selector, self.tweak.build()?)?
            .on_attribute_change(self.applies_on_attribute_change);
        for attr in &self.watched_attributes {
            rule = rule.watch_attribute(attr);
        }
        Ok(rule)
    }
}

/// Parse a JSON array of rule specs and compile it into a partitioned rule
/// set. Fails fast on the first malformed spec or selector.
pub fn load_rules_json(json: &str) -> Result<RuleSet> {
    let specs: Vec<RuleSpec> = serde_json::from_str(json)
        .map_err(|e| TweakError::config("parse rules json", Some(e.into())))?;

    let mut rules = RuleSet::new();
    for spec in &specs {
        let rule = spec.compile()?;
        match spec.phase {
            RulePhase::Load => rules.add_load(rule),
            RulePhase::Dynamic => rules.add_dynamic(rule),
        }
    }
    Ok(rules)
}
