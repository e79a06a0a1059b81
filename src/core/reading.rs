use bon::Builder;
use chrono::{DateTime, Local};
use serde::Serialize;

use crate::{
    api::benning::Entry,
    core::value::{Value, normalize},
};

/// Normalized entry value at a point in time.
#[must_use]
#[derive(Clone, Debug, Serialize, Builder)]
pub struct Reading {
    pub oid: u32,
    pub label: String,
    pub value: Value,

    #[builder(default = Local::now())]
    pub fetched_at: DateTime<Local>,
}

impl From<&Entry> for Reading {
    fn from(entry: &Entry) -> Self {
        Self::builder()
            .oid(entry.oid)
            .label(entry.label.clone())
            .value(normalize(entry))
            .build()
    }
}
