use clap::Parser;

use crate::{
    cli::{
        device::{DeviceArgs, explain_login_error},
        settings::SettingsArgs,
    },
    config::{ConfigStore, Settings},
    prelude::*,
    tables::build_entries_table,
};

#[derive(Parser)]
pub struct SetupArgs {
    #[clap(flatten)]
    device: DeviceArgs,

    #[clap(flatten)]
    settings: SettingsArgs,

    /// Only print the discovered entries, do not save the settings.
    #[clap(long)]
    dry_run: bool,
}

impl SetupArgs {
    #[instrument(skip_all, fields(host = %self.device.host))]
    pub async fn run(self) -> Result {
        let client = self.device.new_client()?;
        client.authenticate().await.map_err(|error| explain_login_error(error, &self.device.host))?;

        let available_entries =
            client.get_available_entries().await.context("failed to discover the entries")?;
        ensure!(!available_entries.is_empty(), "the inverter has no entries");
        println!("{}", build_entries_table(&available_entries));

        if self.dry_run {
            warn!("dry run, not saving the settings");
            return Ok(());
        }
        self.settings
            .store()
            .save(&Settings { credentials: self.device.credentials(), available_entries })
    }
}
