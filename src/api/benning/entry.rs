use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{DefaultOnError, DisplayFromStr, PickFirst, serde_as};

use crate::prelude::*;

/// Measurement point as returned by `getentry.cgi` and `getentries.cgi`.
#[must_use]
#[serde_as]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Some firmware versions send it as a string.
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub oid: u32,

    #[serde(default)]
    pub label: String,

    /// One-character value type code, see [`Entry::is_numeric`].
    ///
    /// Anything but a string is treated as no code at all.
    #[serde_as(as = "DefaultOnError")]
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_code: Option<String>,

    #[serde(rename = "val", default)]
    pub value: Value,

    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub factor: Value,
}

impl Entry {
    const NUMERIC_TYPE_CODES: [&str; 5] = ["F", "L", "i", "w", "b"];

    /// Whether the value is a number which the factor applies to.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        self.type_code.as_deref().is_some_and(|code| Self::NUMERIC_TYPE_CODES.contains(&code))
    }

    /// Stable external identifier of the entry.
    ///
    /// There is no separator between the OID and the label, and it must stay this way:
    /// the identifiers are already persisted by consumers.
    #[must_use]
    pub fn entity_id(&self) -> String {
        format!("benning_{}{}", self.oid, self.label.replace('.', "_"))
    }

    /// Parse the bulk response array, skipping the items that do not look like entries.
    pub(super) fn from_array(items: Vec<Value>) -> Vec<Self> {
        items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<Self>(item) {
                Ok(entry) => Some(entry),
                Err(error) => {
                    warn!("skipping a malformed entry: {error:#}");
                    None
                }
            })
            .collect()
    }
}
