use std::collections::BTreeMap;

use crate::{core::reading::Reading, prelude::*};

/// Consumer of the normalized readings, keyed by the stable entity ID.
pub trait EntityRegistry {
    fn publish(&mut self, entity_id: String, reading: Reading);
}

/// Latest reading of each entity.
#[derive(Default, derive_more::Deref)]
pub struct Readings(BTreeMap<String, Reading>);

impl EntityRegistry for Readings {
    fn publish(&mut self, entity_id: String, reading: Reading) {
        debug!(%entity_id, value = %reading.value, "updated");
        self.0.insert(entity_id, reading);
    }
}
