use std::{
    any::Any,
    collections::VecDeque,
    panic::AssertUnwindSafe,
    sync::{Arc, Mutex, PoisonError},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::FutureExt as _;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::reminder::ReminderSender;

use super::registry::Job;

/// Prefix of the error line written when a weekly reminder run fails.
pub const FAILURE_PREFIX: &str = "Haftalık e-posta gönderimi hatası:";

/// How many recent runs a [`RunLog`] keeps.
const RUN_LOG_CAPACITY: usize = 20;

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum RunOutcome {
    Succeeded,
    Failed { message: String },
    /// The previous run was still in flight when the trigger fired.
    Skipped,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    pub fired_at: DateTime<Utc>,
    #[serde(flatten)]
    pub outcome: RunOutcome,
}

/// Most recent run outcomes, newest first.
#[derive(Clone, Default)]
pub struct RunLog(Arc<Mutex<VecDeque<RunRecord>>>);

impl RunLog {
    pub fn record(&self, fired_at: DateTime<Utc>, outcome: RunOutcome) {
        let mut runs = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        runs.push_front(RunRecord { fired_at, outcome });
        runs.truncate(RUN_LOG_CAPACITY);
    }

    pub fn snapshot(&self) -> Vec<RunRecord> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }
}

/// Sends the weekly check-in reminders, one run at a time.
pub struct WeeklyCheckinJob {
    sender: Arc<dyn ReminderSender>,
    in_flight: tokio::sync::Mutex<()>,
    log: RunLog,
}

impl WeeklyCheckinJob {
    pub fn new(sender: Arc<dyn ReminderSender>, log: RunLog) -> Self {
        Self {
            sender,
            in_flight: tokio::sync::Mutex::new(()),
            log,
        }
    }

    /// Runs the reminder routine once. Errors and panics are logged and
    /// reported in the outcome, never propagated.
    pub async fn run_once(&self) -> RunOutcome {
        let Ok(_guard) = self.in_flight.try_lock() else {
            warn!("previous weekly check-in run still in flight, skipping");
            return RunOutcome::Skipped;
        };

        let send = self.sender.send_weekly_checkin_reminder_emails();
        match AssertUnwindSafe(send).catch_unwind().await {
            Ok(Ok(())) => {
                info!("weekly check-in reminders sent");
                RunOutcome::Succeeded
            }
            Ok(Err(e)) => {
                error!("{FAILURE_PREFIX} {e}");
                RunOutcome::Failed {
                    message: e.to_string(),
                }
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!("{FAILURE_PREFIX} {message}");
                RunOutcome::Failed { message }
            }
        }
    }
}

#[async_trait]
impl Job for WeeklyCheckinJob {
    async fn run(&self, fired_at: DateTime<Utc>) {
        let outcome = self.run_once().await;
        self.log.record(fired_at, outcome);
    }
}

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "panicked".to_owned()
    }
}
