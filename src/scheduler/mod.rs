//! Weekly check-in reminder scheduling.
//!
//! [`MailScheduler`] is built once by the application's startup sequence and
//! registers the reminder job with a [`JobRegistry`] the first time
//! [`MailScheduler::ensure`] succeeds. Later calls are no-ops.

pub mod job;
pub mod registry;

use std::{
    env,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, OnceLock,
    },
};

use chrono_tz::Tz;
use croner::errors::CronError;
use derive_more::{Display, From};
use tracing::info;

use crate::{api, reminder::ReminderSender};

pub use self::{
    job::{RunLog, RunOutcome, RunRecord, WeeklyCheckinJob},
    registry::{Job, JobRegistry, Schedule, TokioRegistry},
};

/// 09:00 on Monday and Friday.
pub const WEEKLY_CHECKIN_CRON: &str = "0 9 * * 1,5";

pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Europe::Istanbul;

/// Scheduler options read from the environment.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Settings {
    /// `DISABLE_CRON` is exactly `"true"`.
    pub disabled: bool,
    /// `CRON_TIMEZONE`, if set and non-empty.
    pub timezone: Option<String>,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            disabled: lookup("DISABLE_CRON").as_deref() == Some("true"),
            timezone: lookup("CRON_TIMEZONE").filter(|tz| !tz.is_empty()),
        }
    }

    fn timezone(&self) -> Result<Tz, Error> {
        match &self.timezone {
            Some(name) => name
                .parse()
                .map_err(|_| Error::InvalidTimezone(name.clone())),
            None => Ok(DEFAULT_TIMEZONE),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Registration {
    Registered,
    AlreadyInitialized,
    Disabled,
}

#[derive(Debug, Display, From)]
pub enum Error {
    #[display("unknown timezone `{_0}`")]
    InvalidTimezone(String),
    #[from]
    #[display("invalid cron expression: {_0}")]
    InvalidExpression(CronError),
}

impl std::error::Error for Error {}

pub struct MailScheduler {
    initialized: AtomicBool,
    registry: Arc<dyn JobRegistry>,
    sender: Arc<dyn ReminderSender>,
    runs: RunLog,
    schedule: OnceLock<Schedule>,
}

impl MailScheduler {
    pub fn new(
        registry: Arc<dyn JobRegistry>,
        sender: Arc<dyn ReminderSender>,
    ) -> Self {
        Self {
            initialized: AtomicBool::new(false),
            registry,
            sender,
            runs: RunLog::default(),
            schedule: OnceLock::new(),
        }
    }

    /// Registers the weekly check-in job unless it is disabled or already
    /// registered.
    ///
    /// A disabled or failed call leaves the scheduler uninitialized, so a
    /// later call may still register.
    pub fn ensure(&self, settings: &Settings) -> Result<Registration, Error> {
        if self.is_initialized() {
            return Ok(Registration::AlreadyInitialized);
        }
        if settings.disabled {
            info!("weekly check-in scheduler disabled by DISABLE_CRON");
            return Ok(Registration::Disabled);
        }

        let timezone = settings.timezone()?;
        let schedule = Schedule::new(WEEKLY_CHECKIN_CRON, timezone)?;

        if self
            .initialized
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(Registration::AlreadyInitialized);
        }

        info!(
            expression = %schedule.expression,
            timezone = %schedule.timezone,
            "registering weekly check-in reminders",
        );
        let job = WeeklyCheckinJob::new(self.sender.clone(), self.runs.clone());
        self.registry.schedule(schedule.clone(), Arc::new(job));
        let _ = self.schedule.set(schedule);

        Ok(Registration::Registered)
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    pub fn status(&self) -> api::scheduler::Status {
        api::scheduler::Status {
            initialized: self.is_initialized(),
            expression: WEEKLY_CHECKIN_CRON.to_owned(),
            timezone: self.schedule.get().map(|s| s.timezone.name().to_owned()),
            runs: self.runs.snapshot(),
        }
    }
}
