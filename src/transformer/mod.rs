//! String transformation module
//!
//! This module compiles the configured converters and applies them to
//! metric names, tags and fields.

pub mod engine;
pub mod rules;
pub mod transforms;

pub use engine::StringsProcessor;
pub use rules::{Rule, RuleSet, Selector, WILDCARD};
pub use transforms::{to_valid_utf8, Transform, TransformKind};
