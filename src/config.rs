//! Configuration management for strings-processor
//!
//! Handles loading and validating configuration from YAML files.
//!
//! ```yaml
//! input_format: line
//! output_format: json
//! strings:
//!   lowercase:
//!     - tag: method
//!   replace:
//!     - measurement: "*"
//!       old: "."
//!       new: "_"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::codec::DataFormat;
use crate::transformer::TransformKind;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Error reading the configuration file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Error parsing the configuration file
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Configuration validation error
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Format of incoming metrics
    #[serde(default)]
    pub input_format: DataFormat,

    /// Format of emitted metrics
    #[serde(default)]
    pub output_format: DataFormat,

    /// Number of metrics handed to the processor at once
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// String converter groups
    #[serde(default)]
    pub strings: StringsConfig,
}

/// Converter lists, one per transform kind
///
/// Within a list, entries keep their configured order. Across lists the
/// compile order is fixed by [`TransformKind::ALL`], not by the order the
/// keys appear in the file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StringsConfig {
    pub lowercase: Vec<ConverterConfig>,
    pub uppercase: Vec<ConverterConfig>,
    pub titlecase: Vec<ConverterConfig>,
    pub trim: Vec<ConverterConfig>,
    pub trim_left: Vec<ConverterConfig>,
    pub trim_right: Vec<ConverterConfig>,
    pub trim_prefix: Vec<ConverterConfig>,
    pub trim_suffix: Vec<ConverterConfig>,
    pub replace: Vec<ConverterConfig>,
    pub left: Vec<ConverterConfig>,
    #[serde(rename = "base64decode")]
    pub base64_decode: Vec<ConverterConfig>,
    pub valid_utf8: Vec<ConverterConfig>,
}

/// A single declared converter
///
/// Empty strings mean "not set". Selectors accept an exact name or `"*"`.
/// Only the parameters relevant to the converter's kind are read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConverterConfig {
    /// Field whose string value is transformed
    pub field: String,
    /// Field whose key is transformed
    pub field_key: String,
    /// Tag whose value is transformed
    pub tag: String,
    /// Tag whose key is transformed
    pub tag_key: String,
    /// Measurement name to transform
    pub measurement: String,
    /// Destination key for exact `field` / `tag` selectors
    pub dest: String,
    /// Characters stripped by the trim kinds
    pub cutset: String,
    /// Prefix removed by `trim_prefix`
    pub prefix: String,
    /// Suffix removed by `trim_suffix`
    pub suffix: String,
    /// Substring replaced by `replace`
    pub old: String,
    /// Replacement text for `replace`
    pub new: String,
    /// Byte width kept by `left`
    pub width: usize,
    /// Replacement for invalid UTF-8 in `valid_utf8`
    pub replacement: String,
}

// Default value functions
fn default_batch_size() -> usize {
    1000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_format: DataFormat::default(),
            output_format: DataFormat::default(),
            batch_size: default_batch_size(),
            strings: StringsConfig::default(),
        }
    }
}

impl ConverterConfig {
    /// Whether any selector is populated
    pub fn has_selector(&self) -> bool {
        !(self.field.is_empty()
            && self.field_key.is_empty()
            && self.tag.is_empty()
            && self.tag_key.is_empty()
            && self.measurement.is_empty())
    }

    /// Whether `dest` can take effect
    ///
    /// `dest` only applies to an exact (non-wildcard) `field` or `tag`
    /// selector.
    fn dest_applies(&self) -> bool {
        let exact = |s: &str| !s.is_empty() && s != "*";
        exact(&self.field) || exact(&self.tag)
    }
}

impl StringsConfig {
    /// Converters declared for one kind
    pub fn group(&self, kind: TransformKind) -> &[ConverterConfig] {
        match kind {
            TransformKind::Lowercase => &self.lowercase,
            TransformKind::Uppercase => &self.uppercase,
            TransformKind::Titlecase => &self.titlecase,
            TransformKind::Trim => &self.trim,
            TransformKind::TrimLeft => &self.trim_left,
            TransformKind::TrimRight => &self.trim_right,
            TransformKind::TrimPrefix => &self.trim_prefix,
            TransformKind::TrimSuffix => &self.trim_suffix,
            TransformKind::Replace => &self.replace,
            TransformKind::Left => &self.left,
            TransformKind::Base64Decode => &self.base64_decode,
            TransformKind::ValidUtf8 => &self.valid_utf8,
        }
    }

    /// Mutable access to the converters of one kind
    pub fn group_mut(&mut self, kind: TransformKind) -> &mut Vec<ConverterConfig> {
        match kind {
            TransformKind::Lowercase => &mut self.lowercase,
            TransformKind::Uppercase => &mut self.uppercase,
            TransformKind::Titlecase => &mut self.titlecase,
            TransformKind::Trim => &mut self.trim,
            TransformKind::TrimLeft => &mut self.trim_left,
            TransformKind::TrimRight => &mut self.trim_right,
            TransformKind::TrimPrefix => &mut self.trim_prefix,
            TransformKind::TrimSuffix => &mut self.trim_suffix,
            TransformKind::Replace => &mut self.replace,
            TransformKind::Left => &mut self.left,
            TransformKind::Base64Decode => &mut self.base64_decode,
            TransformKind::ValidUtf8 => &mut self.valid_utf8,
        }
    }

    /// Append a converter to the group of `kind`
    pub fn push(&mut self, kind: TransformKind, converter: ConverterConfig) {
        self.group_mut(kind).push(converter);
    }

    /// All groups in compile order
    pub fn groups(&self) -> impl Iterator<Item = (TransformKind, &[ConverterConfig])> {
        TransformKind::ALL
            .into_iter()
            .map(move |kind| (kind, self.group(kind)))
    }

    /// Total number of declared converters
    pub fn converter_count(&self) -> usize {
        self.groups().map(|(_, group)| group.len()).sum()
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed or validated.
    /// A missing file is a `ConfigError::ReadError`; use
    /// `Config::load_or_default()` to fall back to defaults instead.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&contents)
    }

    /// Parse and validate configuration from a YAML document
    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file, falling back to defaults if not found
    ///
    /// The default configuration declares no converters, so the processor
    /// passes metrics through unchanged.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!(
                path = %path.display(),
                "Config file not found, using defaults"
            );
            return Ok(Self::default());
        }

        Self::load(path)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "batch_size must be greater than 0".to_string(),
            ));
        }

        for (kind, group) in self.strings.groups() {
            for (index, converter) in group.iter().enumerate() {
                if !converter.has_selector() {
                    return Err(ConfigError::ValidationError(format!(
                        "{}[{}] has no selector; set one of field, field_key, tag, tag_key or measurement",
                        kind, index
                    )));
                }

                if !converter.dest.is_empty() && !converter.dest_applies() {
                    tracing::warn!(
                        kind = %kind,
                        index,
                        dest = %converter.dest,
                        "dest only applies to an exact field or tag selector and will be ignored"
                    );
                }
            }
        }

        Ok(())
    }
}
