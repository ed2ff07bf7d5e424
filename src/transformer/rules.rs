//! Converter rules and the rule compiler
//!
//! A [`Rule`] binds one [`Transform`] to the metric parts it targets. The
//! compiler turns the grouped [`StringsConfig`] into a flat [`RuleSet`]:
//! groups in catalog order, entries in configured order within a group.
//!
//! # Example
//!
//! ```ignore
//! use strings_processor::transformer::{Rule, RuleSet, Transform};
//!
//! let rules = RuleSet::from_rules(vec![
//!     Rule::new(Transform::Lowercase).with_tag("method"),
//!     Rule::new(Transform::Uppercase).with_field_key("*"),
//! ]);
//! ```

use serde::{Serialize, Serializer};
use std::fmt;

use crate::config::{ConverterConfig, StringsConfig};

use super::transforms::{Transform, TransformKind};

/// Wildcard selector value
pub const WILDCARD: &str = "*";

/// Which key(s) a selector targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Every key present when the rule runs
    Any,
    /// A single key
    Exact(String),
}

impl Selector {
    /// Parse a configured selector; the empty string means "not set"
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "" => None,
            WILDCARD => Some(Selector::Any),
            name => Some(Selector::Exact(name.to_string())),
        }
    }

    /// Whether `name` is selected
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Selector::Any => true,
            Selector::Exact(exact) => exact == name,
        }
    }

    /// Whether this is the `"*"` selector
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Selector::Any)
    }

    /// The configured form of the selector
    pub fn as_str(&self) -> &str {
        match self {
            Selector::Any => WILDCARD,
            Selector::Exact(name) => name,
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for Selector {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// A compiled converter
///
/// All populated selectors are applied, in the order field value, field
/// key, tag value, tag key, measurement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rule {
    /// Field whose string value is transformed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<Selector>,
    /// Field whose key is transformed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_key: Option<Selector>,
    /// Tag whose value is transformed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<Selector>,
    /// Tag whose key is transformed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_key: Option<Selector>,
    /// Measurement name to transform
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measurement: Option<Selector>,
    /// Destination key for exact value selectors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dest: Option<String>,
    /// Bound transform
    pub transform: Transform,
}

impl Rule {
    /// Create a rule with no selectors
    pub fn new(transform: Transform) -> Self {
        Self {
            field: None,
            field_key: None,
            tag: None,
            tag_key: None,
            measurement: None,
            dest: None,
            transform,
        }
    }

    /// Compile a declared converter of the given kind
    ///
    /// Missing parameters fall back to their defaults rather than being
    /// rejected.
    pub fn from_config(kind: TransformKind, converter: &ConverterConfig) -> Self {
        let cutset = || Some(converter.cutset.clone()).filter(|c| !c.is_empty());
        let transform = match kind {
            TransformKind::Lowercase => Transform::Lowercase,
            TransformKind::Uppercase => Transform::Uppercase,
            TransformKind::Titlecase => Transform::Titlecase,
            TransformKind::Trim => Transform::Trim { cutset: cutset() },
            TransformKind::TrimLeft => Transform::TrimLeft { cutset: cutset() },
            TransformKind::TrimRight => Transform::TrimRight { cutset: cutset() },
            TransformKind::TrimPrefix => Transform::TrimPrefix {
                prefix: converter.prefix.clone(),
            },
            TransformKind::TrimSuffix => Transform::TrimSuffix {
                suffix: converter.suffix.clone(),
            },
            TransformKind::Replace => Transform::Replace {
                old: converter.old.clone(),
                new: converter.new.clone(),
            },
            TransformKind::Left => Transform::Left {
                width: converter.width,
            },
            TransformKind::Base64Decode => Transform::Base64Decode,
            TransformKind::ValidUtf8 => Transform::ValidUtf8 {
                replacement: converter.replacement.clone(),
            },
        };

        Self {
            field: Selector::parse(&converter.field),
            field_key: Selector::parse(&converter.field_key),
            tag: Selector::parse(&converter.tag),
            tag_key: Selector::parse(&converter.tag_key),
            measurement: Selector::parse(&converter.measurement),
            dest: Some(converter.dest.clone()).filter(|d| !d.is_empty()),
            transform,
        }
    }

    /// Target a field value
    pub fn with_field(mut self, selector: &str) -> Self {
        self.field = Selector::parse(selector);
        self
    }

    /// Target a field key
    pub fn with_field_key(mut self, selector: &str) -> Self {
        self.field_key = Selector::parse(selector);
        self
    }

    /// Target a tag value
    pub fn with_tag(mut self, selector: &str) -> Self {
        self.tag = Selector::parse(selector);
        self
    }

    /// Target a tag key
    pub fn with_tag_key(mut self, selector: &str) -> Self {
        self.tag_key = Selector::parse(selector);
        self
    }

    /// Target the measurement name
    pub fn with_measurement(mut self, selector: &str) -> Self {
        self.measurement = Selector::parse(selector);
        self
    }

    /// Write transformed values to `dest` instead of the source key
    pub fn with_dest(mut self, dest: impl Into<String>) -> Self {
        self.dest = Some(dest.into()).filter(|d: &String| !d.is_empty());
        self
    }

    /// Kind of the bound transform
    pub fn kind(&self) -> TransformKind {
        self.transform.kind()
    }

    /// Whether no selector is populated, i.e. the rule never applies
    pub fn has_no_selector(&self) -> bool {
        self.field.is_none()
            && self.field_key.is_none()
            && self.tag.is_none()
            && self.tag_key.is_none()
            && self.measurement.is_none()
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind())?;
        let selectors = [
            ("field", &self.field),
            ("field_key", &self.field_key),
            ("tag", &self.tag),
            ("tag_key", &self.tag_key),
            ("measurement", &self.measurement),
        ];
        for (name, selector) in selectors {
            if let Some(selector) = selector {
                write!(f, " {}={}", name, selector)?;
            }
        }
        if let Some(dest) = &self.dest {
            write!(f, " dest={}", dest)?;
        }
        Ok(())
    }
}

/// Ordered collection of compiled rules
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Create a new empty rule set
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Create a rule set from a vector of rules, keeping their order
    pub fn from_rules(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Compile the declared converter groups
    ///
    /// Groups are emitted in [`TransformKind::ALL`] order and entries keep
    /// their configured order, so the same configuration always yields the
    /// same sequence.
    pub fn compile(config: &StringsConfig) -> Self {
        config
            .groups()
            .flat_map(|(kind, group)| {
                group
                    .iter()
                    .map(move |converter| Rule::from_config(kind, converter))
            })
            .collect()
    }

    /// Add a rule to the end of the set
    pub fn add(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    /// Get the number of rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if the rule set is empty
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterate over all rules
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// Get a reference to the underlying rules
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Get a rule by index
    pub fn get(&self, index: usize) -> Option<&Rule> {
        self.rules.get(index)
    }
}

impl IntoIterator for RuleSet {
    type Item = Rule;
    type IntoIter = std::vec::IntoIter<Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.into_iter()
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

impl FromIterator<Rule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        Self {
            rules: iter.into_iter().collect(),
        }
    }
}
