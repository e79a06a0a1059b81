use std::fmt::{Display, Formatter};

use serde::Serialize;

use crate::api::benning::Entry;

/// Normalized entry value.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Scaled (or at least parsed) number.
    Number(f64),

    /// Raw value as received from the device.
    Raw(serde_json::Value),
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(number) => write!(f, "{number}"),
            Self::Raw(serde_json::Value::String(text)) => f.write_str(text),
            Self::Raw(value) => write!(f, "{value}"),
        }
    }
}

/// Convert the raw entry value into the value in native units.
///
/// Never fails: whatever cannot be parsed is returned as is.
/// Note that an unparseable factor still yields the parsed but unscaled value.
pub fn normalize(entry: &Entry) -> Value {
    if !entry.is_numeric() {
        return Value::Raw(entry.value.clone());
    }
    let Some(value) = parse_number(&entry.value) else {
        return Value::Raw(entry.value.clone());
    };
    let Some(factor) = parse_number(&entry.factor) else {
        return Value::Number(value);
    };
    Value::Number(value * factor)
}

fn parse_number(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(number) => number.as_f64(),
        serde_json::Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}
