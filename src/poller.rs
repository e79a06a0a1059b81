use std::{
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

use bon::Builder;
use tokio::time::{MissedTickBehavior, interval};

use crate::{
    api::{benning, heartbeat},
    core::{reading::Reading, registry::EntityRegistry},
    prelude::*,
};

/// Periodically re-fetches the known entries and republishes their normalized values.
///
/// Discovery is never re-run here: the OIDs are fixed for the poller lifetime.
#[derive(Builder)]
pub struct Poller<R> {
    client: benning::Client,
    oids: Vec<u32>,
    registry: R,
    heartbeat: heartbeat::Client,
}

impl<R: EntityRegistry> Poller<R> {
    /// Fetch the known entries once and publish what the device returned.
    ///
    /// Entries missing from the response are simply not published.
    #[instrument(skip_all, fields(n_oids = self.oids.len()))]
    pub async fn refresh(&mut self) -> Result<usize> {
        let entries =
            self.client.get_entries(&self.oids).await.context("failed to fetch the entries")?;
        for entry in &entries {
            self.registry.publish(entry.entity_id(), Reading::from(entry));
        }
        if entries.len() < self.oids.len() {
            warn!(n_absent = self.oids.len() - entries.len(), "some entries are absent");
        }
        info!(n_entries = entries.len(), "refreshed");
        self.heartbeat.send().await;
        Ok(entries.len())
    }

    /// Refresh until the termination flag is raised.
    ///
    /// The first refresh must succeed, later failures are logged and retried on the next tick.
    pub async fn run(mut self, period: Duration, should_terminate: &AtomicBool) -> Result<R> {
        self.refresh().await?;

        let mut interval = interval(period);
        interval.reset_after(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while !should_terminate.load(Ordering::Relaxed) {
            interval.tick().await;
            if let Err(error) = self.refresh().await {
                error!("refresh failed: {error:#}");
            }
        }

        info!("terminating…");
        Ok(self.registry)
    }

    pub fn into_registry(self) -> R {
        self.registry
    }
}
