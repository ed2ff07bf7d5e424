//! Strings processor - converter application engine
//!
//! [`StringsProcessor`] owns the declared configuration and compiles it into
//! a [`RuleSet`] the first time it is needed. Compilation goes through a
//! synchronized one-time cell, so a processor can be shared across threads
//! and will still compile exactly once.

use once_cell::sync::OnceCell;

use crate::config::StringsConfig;
use crate::metric::{FieldValue, MetricAdapter};

use super::rules::{Rule, RuleSet, Selector};

/// Applies the configured string converters to metrics
#[derive(Debug, Default)]
pub struct StringsProcessor {
    /// Declared converter groups
    config: StringsConfig,
    /// Compiled rules, populated on first use
    rules: OnceCell<RuleSet>,
}

impl StringsProcessor {
    /// Create a processor for the given converter groups
    ///
    /// Nothing is compiled until [`compile`](Self::compile) or
    /// [`apply`](Self::apply) is first called.
    pub fn new(config: StringsConfig) -> Self {
        Self {
            config,
            rules: OnceCell::new(),
        }
    }

    /// Create a processor from already compiled rules
    pub fn from_rules(rules: RuleSet) -> Self {
        Self {
            config: StringsConfig::default(),
            rules: OnceCell::with_value(rules),
        }
    }

    /// Compile the configuration if that has not happened yet
    ///
    /// Later calls return the same rule set without recompiling.
    pub fn compile(&self) -> &RuleSet {
        self.rules.get_or_init(|| {
            let rules = RuleSet::compile(&self.config);
            for (index, rule) in rules.iter().enumerate() {
                if rule.has_no_selector() {
                    tracing::warn!(index, kind = %rule.kind(), "Converter has no selector and will never apply");
                }
            }
            tracing::debug!(rules = rules.len(), "Compiled string converters");
            rules
        })
    }

    /// Check if the rules have been compiled
    pub fn is_compiled(&self) -> bool {
        self.rules.get().is_some()
    }

    /// Apply every rule to every metric
    ///
    /// Metrics are mutated in place and returned in the same order; none are
    /// added or removed.
    pub fn apply<M: MetricAdapter>(&self, mut metrics: Vec<M>) -> Vec<M> {
        let rules = self.compile();
        for metric in metrics.iter_mut() {
            apply_rules(rules, metric);
        }
        metrics
    }

    /// Apply every rule to a single metric
    pub fn process<M: MetricAdapter + ?Sized>(&self, metric: &mut M) {
        apply_rules(self.compile(), metric);
    }
}

fn apply_rules<M: MetricAdapter + ?Sized>(rules: &RuleSet, metric: &mut M) {
    for rule in rules {
        apply_rule(rule, metric);
    }
}

/// Apply one rule, selector by selector, in the fixed order
fn apply_rule<M: MetricAdapter + ?Sized>(rule: &Rule, metric: &mut M) {
    if let Some(selector) = &rule.field {
        convert_field(rule, selector, metric);
    }
    if let Some(selector) = &rule.field_key {
        convert_field_key(rule, selector, metric);
    }
    if let Some(selector) = &rule.tag {
        convert_tag(rule, selector, metric);
    }
    if let Some(selector) = &rule.tag_key {
        convert_tag_key(rule, selector, metric);
    }
    if let Some(selector) = &rule.measurement {
        convert_measurement(rule, selector, metric);
    }
}

/// Key that receives a transformed value
///
/// `dest` only redirects exact selectors; a wildcard always writes back to
/// the key it read from.
fn destination(rule: &Rule, selector: &Selector, key: String) -> String {
    match (selector, &rule.dest) {
        (Selector::Exact(_), Some(dest)) => dest.clone(),
        _ => key,
    }
}

fn select_fields<M: MetricAdapter + ?Sized>(
    selector: &Selector,
    metric: &M,
) -> Vec<(String, FieldValue)> {
    match selector {
        Selector::Any => metric.fields(),
        Selector::Exact(key) => metric
            .get_field(key)
            .map(|value| vec![(key.clone(), value.clone())])
            .unwrap_or_default(),
    }
}

fn select_tags<M: MetricAdapter + ?Sized>(selector: &Selector, metric: &M) -> Vec<(String, String)> {
    match selector {
        Selector::Any => metric.tags(),
        Selector::Exact(key) => metric
            .get_tag(key)
            .map(|value| vec![(key.clone(), value.to_string())])
            .unwrap_or_default(),
    }
}

fn convert_field<M: MetricAdapter + ?Sized>(rule: &Rule, selector: &Selector, metric: &mut M) {
    for (key, value) in select_fields(selector, metric) {
        let text = match value {
            FieldValue::String(text) => text,
            other => {
                tracing::trace!(field = %key, kind = other.type_name(), "Skipping non-string field");
                continue;
            }
        };
        let converted = rule.transform.apply(&text);
        metric.add_field(destination(rule, selector, key), FieldValue::String(converted));
    }
}

fn convert_field_key<M: MetricAdapter + ?Sized>(rule: &Rule, selector: &Selector, metric: &mut M) {
    for (key, value) in select_fields(selector, metric) {
        let renamed = rule.transform.apply(&key);
        if renamed.is_empty() {
            tracing::trace!(field = %key, "Skipping field rename to empty key");
            continue;
        }
        metric.remove_field(&key);
        metric.add_field(renamed, value);
    }
}

fn convert_tag<M: MetricAdapter + ?Sized>(rule: &Rule, selector: &Selector, metric: &mut M) {
    for (key, value) in select_tags(selector, metric) {
        let converted = rule.transform.apply(&value);
        metric.add_tag(destination(rule, selector, key), converted);
    }
}

fn convert_tag_key<M: MetricAdapter + ?Sized>(rule: &Rule, selector: &Selector, metric: &mut M) {
    for (key, value) in select_tags(selector, metric) {
        let renamed = rule.transform.apply(&key);
        if renamed.is_empty() {
            tracing::trace!(tag = %key, "Skipping tag rename to empty key");
            continue;
        }
        metric.remove_tag(&key);
        metric.add_tag(renamed, value);
    }
}

fn convert_measurement<M: MetricAdapter + ?Sized>(
    rule: &Rule,
    selector: &Selector,
    metric: &mut M,
) {
    if !selector.matches(metric.name()) {
        return;
    }
    let renamed = rule.transform.apply(metric.name());
    metric.set_name(renamed);
}
