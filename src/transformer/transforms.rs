//! String transform catalog
//!
//! Every transform is a total `&str -> String` function: malformed input
//! never produces an error, the worst case is the input returned unchanged.
//! Parameters are captured in the [`Transform`] variant when a rule is
//! compiled and are never re-read from configuration afterwards.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use std::fmt;
use unicode_segmentation::UnicodeSegmentation;

/// Transform kinds in catalog order
///
/// The discriminant order is the order in which rule groups are compiled,
/// so it must not be rearranged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TransformKind {
    Lowercase,
    Uppercase,
    Titlecase,
    Trim,
    TrimLeft,
    TrimRight,
    TrimPrefix,
    TrimSuffix,
    Replace,
    Left,
    Base64Decode,
    ValidUtf8,
}

impl TransformKind {
    /// All kinds, in catalog order
    pub const ALL: [TransformKind; 12] = [
        TransformKind::Lowercase,
        TransformKind::Uppercase,
        TransformKind::Titlecase,
        TransformKind::Trim,
        TransformKind::TrimLeft,
        TransformKind::TrimRight,
        TransformKind::TrimPrefix,
        TransformKind::TrimSuffix,
        TransformKind::Replace,
        TransformKind::Left,
        TransformKind::Base64Decode,
        TransformKind::ValidUtf8,
    ];

    /// Configuration key of this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            TransformKind::Lowercase => "lowercase",
            TransformKind::Uppercase => "uppercase",
            TransformKind::Titlecase => "titlecase",
            TransformKind::Trim => "trim",
            TransformKind::TrimLeft => "trim_left",
            TransformKind::TrimRight => "trim_right",
            TransformKind::TrimPrefix => "trim_prefix",
            TransformKind::TrimSuffix => "trim_suffix",
            TransformKind::Replace => "replace",
            TransformKind::Left => "left",
            TransformKind::Base64Decode => "base64decode",
            TransformKind::ValidUtf8 => "valid_utf8",
        }
    }
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A bound string transform
///
/// `cutset: None` on the trim variants means "trim Unicode whitespace".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transform {
    Lowercase,
    Uppercase,
    Titlecase,
    Trim {
        #[serde(skip_serializing_if = "Option::is_none")]
        cutset: Option<String>,
    },
    TrimLeft {
        #[serde(skip_serializing_if = "Option::is_none")]
        cutset: Option<String>,
    },
    TrimRight {
        #[serde(skip_serializing_if = "Option::is_none")]
        cutset: Option<String>,
    },
    TrimPrefix {
        prefix: String,
    },
    TrimSuffix {
        suffix: String,
    },
    Replace {
        old: String,
        new: String,
    },
    Left {
        width: usize,
    },
    #[serde(rename = "base64decode")]
    Base64Decode,
    ValidUtf8 {
        replacement: String,
    },
}

impl Transform {
    /// The catalog kind of this transform
    pub fn kind(&self) -> TransformKind {
        match self {
            Transform::Lowercase => TransformKind::Lowercase,
            Transform::Uppercase => TransformKind::Uppercase,
            Transform::Titlecase => TransformKind::Titlecase,
            Transform::Trim { .. } => TransformKind::Trim,
            Transform::TrimLeft { .. } => TransformKind::TrimLeft,
            Transform::TrimRight { .. } => TransformKind::TrimRight,
            Transform::TrimPrefix { .. } => TransformKind::TrimPrefix,
            Transform::TrimSuffix { .. } => TransformKind::TrimSuffix,
            Transform::Replace { .. } => TransformKind::Replace,
            Transform::Left { .. } => TransformKind::Left,
            Transform::Base64Decode => TransformKind::Base64Decode,
            Transform::ValidUtf8 { .. } => TransformKind::ValidUtf8,
        }
    }

    /// Apply the transform to a string
    pub fn apply(&self, input: &str) -> String {
        match self {
            Transform::Lowercase => input.chars().map(simple_lower).collect(),
            Transform::Uppercase => input.chars().map(simple_upper).collect(),
            Transform::Titlecase => title_case(input),
            Transform::Trim { cutset } => match cutset {
                Some(set) => input.trim_matches(|c: char| set.contains(c)).to_string(),
                None => input.trim().to_string(),
            },
            Transform::TrimLeft { cutset } => match cutset {
                Some(set) => input
                    .trim_start_matches(|c: char| set.contains(c))
                    .to_string(),
                None => input.trim_start().to_string(),
            },
            Transform::TrimRight { cutset } => match cutset {
                Some(set) => input
                    .trim_end_matches(|c: char| set.contains(c))
                    .to_string(),
                None => input.trim_end().to_string(),
            },
            Transform::TrimPrefix { prefix } => {
                input.strip_prefix(prefix.as_str()).unwrap_or(input).to_string()
            }
            Transform::TrimSuffix { suffix } => {
                input.strip_suffix(suffix.as_str()).unwrap_or(input).to_string()
            }
            Transform::Replace { old, new } => {
                let replaced = input.replace(old.as_str(), new);
                if replaced.is_empty() {
                    input.to_string()
                } else {
                    replaced
                }
            }
            Transform::Left { width } => left(input, *width),
            Transform::Base64Decode => base64_decode(input),
            Transform::ValidUtf8 { replacement } => to_valid_utf8(input.as_bytes(), replacement),
        }
    }
}

/// Uppercase one character without changing the character count
///
/// Characters whose full mapping expands (such as `ß` to `SS`) keep their
/// simple case mapping instead, which for most of them is the character
/// itself.
fn simple_upper(c: char) -> char {
    match c {
        // Greek letters with ypogegrammeni map to their prosgegrammeni form
        '\u{1F80}'..='\u{1F87}' | '\u{1F90}'..='\u{1F97}' | '\u{1FA0}'..='\u{1FA7}' => {
            char::from_u32(c as u32 + 8).unwrap_or(c)
        }
        '\u{1FB3}' => '\u{1FBC}',
        '\u{1FC3}' => '\u{1FCC}',
        '\u{1FF3}' => '\u{1FFC}',
        _ => single_char(c.to_uppercase()).unwrap_or(c),
    }
}

/// Lowercase one character without changing the character count
fn simple_lower(c: char) -> char {
    match c {
        '\u{0130}' => 'i',
        _ => single_char(c.to_lowercase()).unwrap_or(c),
    }
}

fn single_char(mut mapping: impl Iterator<Item = char>) -> Option<char> {
    let first = mapping.next()?;
    match mapping.next() {
        None => Some(first),
        Some(_) => None,
    }
}

/// Title-case every word, leaving non-initial letters as they are
///
/// Word boundaries follow Unicode text segmentation (UAX #29).
pub fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for word in input.split_word_bounds() {
        let mut chars = word.chars();
        match chars.next() {
            Some(first) if first.is_alphabetic() => {
                push_title(&mut out, first);
                out.push_str(chars.as_str());
            }
            _ => out.push_str(word),
        }
    }
    out
}

/// Push the titlecase mapping of `c`
///
/// Titlecase differs from uppercase only for the Latin digraphs and the
/// sharp s; everything else maps through `to_uppercase`.
fn push_title(out: &mut String, c: char) {
    match c {
        '\u{01C4}'..='\u{01C6}' => out.push('\u{01C5}'),
        '\u{01C7}'..='\u{01C9}' => out.push('\u{01C8}'),
        '\u{01CA}'..='\u{01CC}' => out.push('\u{01CB}'),
        '\u{01F1}'..='\u{01F3}' => out.push('\u{01F2}'),
        'ß' => out.push_str("Ss"),
        _ => out.extend(c.to_uppercase()),
    }
}

/// Keep at most `width` bytes, cutting back to a character boundary
fn left(input: &str, width: usize) -> String {
    if input.len() <= width {
        return input.to_string();
    }

    let mut end = width;
    while !input.is_char_boundary(end) {
        end -= 1;
    }
    input[..end].to_string()
}

/// Decode standard (padded) base64, falling back to the input
fn base64_decode(input: &str) -> String {
    match STANDARD.decode(input) {
        Ok(bytes) => String::from_utf8(bytes).unwrap_or_else(|_| input.to_string()),
        Err(_) => input.to_string(),
    }
}

/// Replace each run of invalid UTF-8 bytes with `replacement`
///
/// Valid sequences are copied through unchanged.
pub fn to_valid_utf8(bytes: &[u8], replacement: &str) -> String {
    let mut out = String::with_capacity(bytes.len());
    let mut in_invalid_run = false;

    for chunk in bytes.utf8_chunks() {
        let valid = chunk.valid();
        if !valid.is_empty() {
            out.push_str(valid);
            in_invalid_run = false;
        }
        if !chunk.invalid().is_empty() {
            if !in_invalid_run {
                out.push_str(replacement);
            }
            in_invalid_run = true;
        }
    }

    out
}
