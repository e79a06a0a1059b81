use std::{
    os::raw::c_int,
    sync::{Arc, atomic::AtomicBool},
    time::Duration,
};

use clap::Parser;
use reqwest::Url;
use signal_hook::consts::SIGTERM;

use crate::{
    api::{benning, heartbeat},
    cli::settings::SettingsArgs,
    config::ConfigStore,
    core::registry::Readings,
    poller::Poller,
    prelude::*,
    tables::build_readings_table,
};

#[derive(Parser)]
pub struct PollArgs {
    #[clap(flatten)]
    settings: SettingsArgs,

    #[clap(long, env = "POLLING_INTERVAL", default_value = "30s")]
    polling_interval: humantime::Duration,

    /// Fetch the entries once, print them, and exit.
    #[clap(long)]
    once: bool,

    #[clap(long = "heartbeat-url", env = "HEARTBEAT_URL")]
    heartbeat_url: Option<Url>,
}

impl PollArgs {
    pub async fn run(self) -> Result {
        let settings = self.settings.store().load()?.with_context(|| {
            format!(
                "no settings found at `{}`, run `benning setup` first",
                self.settings.path.display(),
            )
        })?;
        let oids = settings.oids();
        ensure!(!oids.is_empty(), "no entries were discovered, run `benning setup` again");

        let mut poller = Poller::builder()
            .client(benning::Client::new(settings.credentials)?)
            .oids(oids)
            .registry(Readings::default())
            .heartbeat(heartbeat::Client::new(self.heartbeat_url)?)
            .build();

        if self.once {
            poller.refresh().await?;
            println!("{}", build_readings_table(&poller.into_registry()));
            return Ok(());
        }

        let should_terminate = register_termination_flag()?;

        let period: Duration = self.polling_interval.into();
        info!(?period, "polling…");
        let readings = poller.run(period, &should_terminate).await?;
        println!("{}", build_readings_table(&readings));
        Ok(())
    }
}

/// SIGINT keeps its default behaviour, so that Ctrl+C exits immediately.
const TERMINATION_SIGNALS: [c_int; 1] = [SIGTERM];

/// Raise the flag on termination signals, the poller checks it between the ticks.
fn register_termination_flag() -> Result<Arc<AtomicBool>> {
    let should_terminate = Arc::new(AtomicBool::new(false));
    for signal in TERMINATION_SIGNALS {
        signal_hook::flag::register(signal, Arc::clone(&should_terminate))?;
    }
    Ok(should_terminate)
}
