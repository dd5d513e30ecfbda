use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use croner::{errors::CronError, Cron};
use tokio::{sync::watch, task, time};
use tracing::{debug, info, warn};

/// When a registered job fires: a five-field cron expression evaluated in
/// wall-clock time of `timezone`.
#[derive(Clone)]
pub struct Schedule {
    pub expression: String,
    pub timezone: Tz,
    cron: Cron,
}

impl Schedule {
    pub fn new(expression: &str, timezone: Tz) -> Result<Self, CronError> {
        Ok(Self {
            expression: expression.to_owned(),
            timezone,
            cron: Cron::new(expression).parse()?,
        })
    }

    /// First trigger strictly after `after`.
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.cron
            .find_next_occurrence(&after.with_timezone(&self.timezone), false)
            .ok()
            .map(|at| at.with_timezone(&Utc))
    }
}

#[async_trait]
pub trait Job: Send + Sync + 'static {
    /// Invoked once per trigger. `fired_at` is the instant the trigger was
    /// scheduled for.
    async fn run(&self, fired_at: DateTime<Utc>);
}

/// Time-based registry that owns recurring jobs once they are scheduled.
pub trait JobRegistry: Send + Sync {
    fn schedule(&self, schedule: Schedule, job: Arc<dyn Job>);
}

/// Runs every scheduled job on its own tokio task until shutdown.
///
/// Each trigger spawns the job body separately, so a slow run never delays
/// the following trigger.
pub struct TokioRegistry {
    shutdown: watch::Receiver<bool>,
}

impl TokioRegistry {
    pub fn new(shutdown: watch::Receiver<bool>) -> Self {
        Self { shutdown }
    }
}

/// Next trigger after the last one, ignoring triggers missed while the
/// process was stalled.
fn next_fire(
    schedule: &Schedule,
    last: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    schedule.next_after(last.max(now))
}

impl JobRegistry for TokioRegistry {
    fn schedule(&self, schedule: Schedule, job: Arc<dyn Job>) {
        let mut shutdown = self.shutdown.clone();

        task::spawn(async move {
            let mut last = Utc::now();
            loop {
                let Some(next) = next_fire(&schedule, last, Utc::now()) else {
                    warn!(
                        expression = %schedule.expression,
                        "schedule has no future trigger",
                    );
                    break;
                };
                debug!(%next, "waiting for next trigger");

                let wait = (next - Utc::now()).to_std().unwrap_or_default();
                tokio::select! {
                    () = time::sleep(wait) => {}
                    _ = shutdown.changed() => {
                        info!(
                            expression = %schedule.expression,
                            "scheduled job stopped",
                        );
                        break;
                    }
                }

                let job = Arc::clone(&job);
                task::spawn(async move { job.run(next).await });
                last = next;
            }
        });
    }
}
