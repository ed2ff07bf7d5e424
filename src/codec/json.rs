//! JSON lines
//!
//! One metric object per line:
//!
//! ```json
//! {"name":"cpu","tags":{"host":"a"},"fields":{"usage":0.5},"timestamp":1700000000}
//! ```

use crate::error::{CodecError, CodecResult};
use crate::metric::{FieldValue, Metric};

/// Parse one JSON object into a metric
pub fn parse_json(line: &str) -> CodecResult<Metric> {
    Ok(serde_json::from_str(line)?)
}

/// Format a metric as a single-line JSON object
///
/// # Errors
///
/// Non-finite floats have no JSON representation and are rejected.
pub fn format_json(metric: &Metric) -> CodecResult<String> {
    let non_finite = metric
        .fields
        .values()
        .any(|v| matches!(v, FieldValue::Float(f) if !f.is_finite()));
    if non_finite {
        return Err(CodecError::Unencodable {
            name: metric.name.clone(),
            reason: "non-finite float field".to_string(),
        });
    }
    Ok(serde_json::to_string(metric)?)
}
