use std::{
    fs,
    path::{Path, PathBuf},
};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    api::benning::{Credentials, Entry},
    prelude::*,
};

/// Everything the setup produces and the poller needs.
#[derive(Serialize, Deserialize)]
pub struct Settings {
    #[serde(flatten)]
    pub credentials: Credentials,

    /// Entries found by the discovery scan, with their values at that moment.
    pub available_entries: Vec<Entry>,
}

impl Settings {
    #[must_use]
    pub fn oids(&self) -> Vec<u32> {
        self.available_entries.iter().map(|entry| entry.oid).collect_vec()
    }
}

pub trait ConfigStore {
    /// Load the settings, `None` if nothing was saved yet.
    fn load(&self) -> Result<Option<Settings>>;

    fn save(&self, settings: &Settings) -> Result;
}

/// Settings stored as a pretty-printed JSON file.
pub struct JsonFile(PathBuf);

impl JsonFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    fn path(&self) -> &Path {
        &self.0
    }
}

impl ConfigStore for JsonFile {
    #[instrument(skip_all, fields(path = %self.path().display()))]
    fn load(&self) -> Result<Option<Settings>> {
        if !self.path().is_file() {
            warn!("no settings saved yet");
            return Ok(None);
        }
        let contents = fs::read(self.path())
            .with_context(|| format!("failed to read `{}`", self.path().display()))?;
        let settings: Settings = serde_json::from_slice(&contents)
            .with_context(|| format!("failed to parse `{}`", self.path().display()))?;
        info!(n_entries = settings.available_entries.len(), "loaded the settings");
        Ok(Some(settings))
    }

    #[instrument(skip_all, fields(path = %self.path().display()))]
    fn save(&self, settings: &Settings) -> Result {
        fs::write(self.path(), serde_json::to_vec_pretty(settings)?)
            .with_context(|| format!("failed to write `{}`", self.path().display()))?;
        info!(n_entries = settings.available_entries.len(), "saved the settings");
        Ok(())
    }
}
