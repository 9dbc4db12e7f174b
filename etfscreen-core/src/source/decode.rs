//! Lenient payload decoding.
//!
//! Some screener payloads have been observed in a single-quoted, literal-dict
//! form rather than JSON. `lenient_decode` tries strict JSON first and only
//! falls back to a fixed set of quote substitutions when that fails.
//!
//! Limitation: the repair is plain string surgery. Any apostrophe inside a
//! value that sits next to a space, bracket, comma, colon or brace is rewritten
//! as a quote, which either corrupts the value or breaks the parse.

use crate::error::ParseError;
use serde_json::Value;

/// Substitutions applied in order, each to every occurrence.
pub const REPAIR_RULES: [(&str, &str); 10] = [
    ("' ", "\" "),
    (" '", " \""),
    ("['", "[\""),
    ("']", "\"]"),
    ("\\", "\\\\"),
    ("',", "\","),
    ("{'", "{\""),
    (":'", ":\""),
    ("':", "\":"),
    ("'}", "\"}"),
];

/// Rewrite single-quoted literal syntax into JSON using [`REPAIR_RULES`].
pub fn repair_quotes(text: &str) -> String {
    REPAIR_RULES
        .iter()
        .fold(text.to_string(), |acc, (from, to)| acc.replace(from, to))
}

/// Decode a payload, repairing single-quoted text when strict JSON fails.
pub fn lenient_decode(text: &str) -> Result<Value, ParseError> {
    if let Ok(value) = serde_json::from_str(text) {
        return Ok(value);
    }
    serde_json::from_str(&repair_quotes(text))
        .map_err(|e| ParseError::new(format!("payload is not valid JSON even after repair: {e}")))
}
