//! Influx line protocol
//!
//! ```text
//! <measurement>[,<tag_key>=<tag_value>...] <field_key>=<field_value>[,...] [<timestamp>]
//! ```
//!
//! Commas and spaces are backslash-escaped in measurement names; commas,
//! equals signs and spaces in tag keys, tag values and field keys. String
//! field values are double-quoted with `\"` and `\\` escapes. Everywhere,
//! a backslash is written as `\\` and line breaks as `\n` / `\r`, so one
//! metric always stays on one line.

use crate::error::{CodecError, CodecResult};
use crate::metric::{FieldValue, Metric};

const MEASUREMENT_ESCAPES: &[char] = &[',', ' '];
const KEY_ESCAPES: &[char] = &[',', '=', ' '];

/// Parse a single line into a metric
pub fn parse_line(line: &str) -> CodecResult<Metric> {
    let mut cursor = Cursor::new(line);

    let name = cursor.read_escaped(&[',', ' '], MEASUREMENT_ESCAPES);
    if name.is_empty() {
        return Err(invalid("missing measurement name"));
    }
    let mut metric = Metric::new(name);

    while cursor.eat(',') {
        let key = cursor.read_escaped(&['=', ',', ' '], KEY_ESCAPES);
        if !cursor.eat('=') {
            return Err(invalid(format!("tag '{}' has no value", key)));
        }
        let value = cursor.read_escaped(&[',', ' '], KEY_ESCAPES);
        if key.is_empty() || value.is_empty() {
            return Err(invalid("empty tag key or value"));
        }
        metric.tags.insert(key, value);
    }

    if !cursor.eat(' ') {
        return Err(invalid("missing field set"));
    }

    loop {
        let key = cursor.read_escaped(&['=', ',', ' '], KEY_ESCAPES);
        if key.is_empty() {
            return Err(invalid("empty field key"));
        }
        if !cursor.eat('=') {
            return Err(invalid(format!("field '{}' has no value", key)));
        }
        let value = parse_field_value(&mut cursor)?;
        metric.fields.insert(key, value);

        if !cursor.eat(',') {
            break;
        }
    }

    if cursor.eat(' ') {
        let rest = cursor.rest().trim();
        if !rest.is_empty() {
            let timestamp = rest
                .parse::<i64>()
                .map_err(|_| invalid(format!("invalid timestamp '{}'", rest)))?;
            metric.timestamp = Some(timestamp);
        }
    } else if !cursor.rest().is_empty() {
        return Err(invalid(format!("unexpected data '{}'", cursor.rest())));
    }

    Ok(metric)
}

/// Format a metric as a single line (without trailing newline)
///
/// Tags with an empty key or value cannot be represented and are left out.
///
/// # Errors
///
/// Fails if the metric has no name, no fields, or a non-finite float field.
pub fn format_line(metric: &Metric) -> CodecResult<String> {
    if metric.name.is_empty() {
        return Err(unencodable(metric, "empty measurement name"));
    }
    if metric.fields.is_empty() {
        return Err(unencodable(metric, "no fields"));
    }

    let mut line = String::with_capacity(64);
    push_escaped(&mut line, &metric.name, MEASUREMENT_ESCAPES);

    for (key, value) in &metric.tags {
        if key.is_empty() || value.is_empty() {
            tracing::trace!(measurement = %metric.name, tag = %key, "Dropping empty tag from output");
            continue;
        }
        line.push(',');
        push_escaped(&mut line, key, KEY_ESCAPES);
        line.push('=');
        push_escaped(&mut line, value, KEY_ESCAPES);
    }

    line.push(' ');
    for (index, (key, value)) in metric.fields.iter().enumerate() {
        if index > 0 {
            line.push(',');
        }
        push_escaped(&mut line, key, KEY_ESCAPES);
        line.push('=');
        push_field_value(&mut line, value).map_err(|reason| unencodable(metric, reason))?;
    }

    if let Some(timestamp) = metric.timestamp {
        line.push(' ');
        line.push_str(&timestamp.to_string());
    }

    Ok(line)
}

fn invalid(reason: impl Into<String>) -> CodecError {
    CodecError::LineProtocol(reason.into())
}

fn unencodable(metric: &Metric, reason: &str) -> CodecError {
    CodecError::Unencodable {
        name: metric.name.clone(),
        reason: reason.to_string(),
    }
}

fn parse_field_value(cursor: &mut Cursor<'_>) -> CodecResult<FieldValue> {
    if cursor.eat('"') {
        let mut text = String::new();
        loop {
            match cursor.bump() {
                None => return Err(invalid("unterminated string field")),
                Some('"') => break,
                Some('\\') => match cursor.peek().and_then(|c| unescape(c, &['"'])) {
                    Some(c) => {
                        cursor.bump();
                        text.push(c);
                    }
                    None => text.push('\\'),
                },
                Some(c) => text.push(c),
            }
        }
        return Ok(FieldValue::String(text));
    }

    let raw = cursor.read_escaped(&[',', ' '], &[]);
    parse_scalar(&raw)
}

fn parse_scalar(raw: &str) -> CodecResult<FieldValue> {
    match raw {
        "t" | "T" | "true" | "True" | "TRUE" => return Ok(FieldValue::Boolean(true)),
        "f" | "F" | "false" | "False" | "FALSE" => return Ok(FieldValue::Boolean(false)),
        "" => return Err(invalid("empty field value")),
        _ => {}
    }

    let bad_number = || invalid(format!("invalid field value '{}'", raw));

    if let Some(digits) = raw.strip_suffix('i') {
        return digits
            .parse::<i64>()
            .map(FieldValue::Integer)
            .map_err(|_| bad_number());
    }
    if let Some(digits) = raw.strip_suffix('u') {
        return digits
            .parse::<u64>()
            .map(FieldValue::Unsigned)
            .map_err(|_| bad_number());
    }

    // f64::from_str also accepts "inf" and "NaN", which line protocol does not
    let numeric = raw
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E'));
    if !numeric {
        return Err(bad_number());
    }
    raw.parse::<f64>()
        .map(FieldValue::Float)
        .map_err(|_| bad_number())
}

fn push_escaped(out: &mut String, value: &str, escapes: &[char]) {
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c if escapes.contains(&c) => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
}

/// Character produced by a backslash followed by `next`, if that is an escape
fn unescape(next: char, escapes: &[char]) -> Option<char> {
    match next {
        '\\' => Some('\\'),
        'n' => Some('\n'),
        'r' => Some('\r'),
        c if escapes.contains(&c) => Some(c),
        _ => None,
    }
}

fn push_field_value(out: &mut String, value: &FieldValue) -> Result<(), &'static str> {
    match value {
        FieldValue::Boolean(b) => out.push_str(if *b { "true" } else { "false" }),
        FieldValue::Integer(i) => {
            out.push_str(&i.to_string());
            out.push('i');
        }
        FieldValue::Unsigned(u) => {
            out.push_str(&u.to_string());
            out.push('u');
        }
        FieldValue::Float(f) => {
            if !f.is_finite() {
                return Err("non-finite float field");
            }
            out.push_str(&f.to_string());
        }
        FieldValue::String(s) => {
            out.push('"');
            push_escaped(out, s, &['"']);
            out.push('"');
        }
    }
    Ok(())
}

/// Character cursor over one input line
struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    /// Read up to the first unescaped stop character
    ///
    /// A backslash followed by one of `escapes`, another backslash, `n` or
    /// `r` yields the escaped character; any other backslash is kept
    /// literally.
    fn read_escaped(&mut self, stops: &[char], escapes: &[char]) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if stops.contains(&c) {
                break;
            }
            self.bump();
            if c == '\\' {
                match self.peek().and_then(|next| unescape(next, escapes)) {
                    Some(unescaped) => {
                        self.bump();
                        out.push(unescaped);
                    }
                    None => out.push('\\'),
                }
            } else {
                out.push(c);
            }
        }
        out
    }
}
