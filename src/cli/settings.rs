use std::path::PathBuf;

use clap::Parser;

use crate::config::JsonFile;

#[derive(Parser)]
pub struct SettingsArgs {
    /// Where the credentials and the discovered entries are stored.
    #[clap(long = "settings-path", env = "BENNING_SETTINGS_PATH", default_value = "benning.json")]
    pub path: PathBuf,
}

impl SettingsArgs {
    pub fn store(&self) -> JsonFile {
        JsonFile::new(&self.path)
    }
}
