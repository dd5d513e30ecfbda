use serde::{Deserialize, Serialize};

pub use crate::scheduler::job::{RunOutcome, RunRecord};

/// Snapshot of the weekly check-in scheduler.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    pub initialized: bool,
    pub expression: String,
    pub timezone: Option<String>,
    pub runs: Vec<RunRecord>,
}
