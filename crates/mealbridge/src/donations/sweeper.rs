//! Background task that forces stale donations into `expired`.
//!
//! Runs on its own fixed wall-clock interval, independent of request
//! traffic. Each cycle is one idempotent bulk update; a failed cycle is
//! logged and the loop keeps going.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

use crate::store::StoreError;

use super::repository::DonationRepository;

pub struct ExpirySweeper<D> {
    donations: Arc<D>,
    interval: Duration,
}

impl<D> ExpirySweeper<D>
where
    D: DonationRepository + 'static,
{
    pub fn new(donations: Arc<D>, interval: Duration) -> Self {
        Self { donations, interval }
    }

    /// One sweep cycle: everything due at `now` and still `available`
    /// or `claimed` becomes `expired`. Already-expired records are left
    /// untouched, so re-sweeping is harmless.
    pub fn sweep_once(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        self.donations.expire_due(now)
    }

    /// Run the sweep loop forever. Spawn as a background tokio task.
    pub async fn run(self) {
        info!(interval = ?self.interval, "expiry sweeper starting");
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match self.sweep_once(Utc::now()) {
                Ok(0) => debug!("expiry sweep found nothing due"),
                Ok(expired) => info!(expired, "expiry sweep marked donations expired"),
                Err(err) => error!(error = %err, "expiry sweep cycle failed"),
            }
        }
    }
}
