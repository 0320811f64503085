//! Job parameter resolution.
//!
//! Parameters arrive from two places: an ordered list of `key=value`
//! strings and an optional JSON object. The JSON object is applied first,
//! then the list, so list entries win on key collisions.

use std::collections::BTreeMap;

use crate::error::{TriggerError, TriggerResult};

/// Resolved build parameters, keyed by parameter name.
pub type Parameters = BTreeMap<String, String>;

/// Merge `key=value` pairs and a JSON object into one parameter map.
///
/// An entry without `=` contributes an empty value for that key. Only the
/// first `=` splits, so `a=b=c` yields key `a` and value `b=c`.
pub fn resolve_parameters(pairs: &[String], json: Option<&str>) -> TriggerResult<Parameters> {
    let mut params = match json {
        Some(raw) if !raw.is_empty() => parse_json_parameters(raw)?,
        _ => Parameters::new(),
    };

    for pair in pairs {
        let (key, value) = split_pair(pair);
        params.insert(key.to_string(), value.to_string());
    }

    Ok(params)
}

fn parse_json_parameters(raw: &str) -> TriggerResult<Parameters> {
    serde_json::from_str::<Parameters>(raw).map_err(|e| {
        TriggerError::MalformedParameters(format!("expected a JSON object of strings: {}", e))
    })
}

fn split_pair(pair: &str) -> (&str, &str) {
    pair.split_once('=').unwrap_or((pair, ""))
}
