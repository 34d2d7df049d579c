//! Time-triggered upkeep scheduler.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::errors::LotteryError;
use crate::lottery::Lottery;
use crate::types::RequestId;

/// What a single keeper pass did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeeperReport {
    pub expired: Option<RequestId>,
    pub requested: Option<RequestId>,
}

pub struct Keeper {
    lottery: Arc<Lottery>,
    period: Duration,
}

impl Keeper {
    pub fn new(lottery: Arc<Lottery>, period: Duration) -> Self {
        Self { lottery, period }
    }

    /// One pass: expire a stale request, then start a draw if upkeep is needed
    pub async fn run_one(&self) -> Result<KeeperReport, LotteryError> {
        let mut report = KeeperReport {
            expired: self.lottery.expire_pending_request().await?,
            ..Default::default()
        };

        if !self.lottery.check_upkeep().await {
            return Ok(report);
        }

        match self.lottery.perform_upkeep().await {
            Ok(request_id) => report.requested = Some(request_id),
            // another caller got there between the check and the trigger
            Err(LotteryError::UpkeepNotNeeded { .. }) => {}
            Err(e) => return Err(e),
        }
        Ok(report)
    }

    /// Tick until `shutdown` flips to true
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval_at(Instant::now(), self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("keeper stopping");
                        return;
                    }
                    continue;
                }
            }

            match self.run_one().await {
                Ok(report) => {
                    if let Some(request_id) = report.expired {
                        info!(request_id = %request_id, "expired stale request");
                    }
                    if let Some(request_id) = report.requested {
                        info!(request_id = %request_id, "upkeep performed");
                    } else {
                        debug!("no upkeep needed");
                    }
                }
                Err(e) => {
                    error!(error = %e, "run_one error");
                }
            }
        }
    }
}
