use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::state::CallState;
use crate::provider::{CallHandle, CallStatus, Recording};

/// Configuration for the status polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Delay between two status fetches, in milliseconds.
    pub interval_ms: u64,
    /// Maximum number of status fetches. 0 polls until a terminal status.
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: 2000,
            max_attempts: 900,
        }
    }
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Whether `attempts` fetches used up the budget.
    pub fn is_exhausted(&self, attempts: u32) -> bool {
        self.max_attempts != 0 && attempts >= self.max_attempts
    }
}

/// A recording written to local storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadedArtifact {
    pub path: PathBuf,
    pub bytes: u64,
}

/// How a call run ended, when it did not end in an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallOutcome {
    Downloaded(DownloadedArtifact),
    /// The call completed but the provider holds no recording for it.
    NoRecording,
    /// The call ended in failed, busy or no-answer.
    NotCompleted(CallStatus),
    TimedOut { attempts: u32 },
    /// The recording exists but fetching its content returned a non-200 status.
    DownloadFailed { status: u16 },
}

impl CallOutcome {
    /// Process exit code for this outcome.
    pub fn exit_code(&self) -> u8 {
        match self {
            CallOutcome::Downloaded(_) => 0,
            CallOutcome::NoRecording => 2,
            CallOutcome::NotCompleted(_) => 3,
            CallOutcome::TimedOut { .. } => 4,
            CallOutcome::DownloadFailed { .. } => 5,
        }
    }
}

/// Everything known about the single call placed by one invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRun {
    pub id: String,
    pub to: String,
    pub from: String,
    pub call: Option<CallHandle>,
    pub state: CallState,
    pub state_history: Vec<CallState>,
    /// Every status observed while polling, in order.
    pub statuses: Vec<CallStatus>,
    pub poll_attempts: u32,
    pub recording: Option<Recording>,
    pub artifact: Option<DownloadedArtifact>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CallRun {
    pub fn new(to: String, from: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            to,
            from,
            call: None,
            state: CallState::Submitted,
            state_history: Vec::new(),
            statuses: Vec::new(),
            poll_attempts: 0,
            recording: None,
            artifact: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Last status observed from the provider.
    pub fn last_status(&self) -> Option<CallStatus> {
        self.statuses.last().copied()
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Structured audit record produced when a run ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub run_id: String,
    pub call_sid: Option<String>,
    pub to: String,
    pub from: String,
    pub state_transitions: Vec<CallState>,
    pub final_status: Option<CallStatus>,
    pub poll_attempts: u32,
    pub recording_sid: Option<String>,
    pub artifact: Option<DownloadedArtifact>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: i64,
}

impl AuditRecord {
    pub fn from_run(run: &CallRun) -> Self {
        let now = Utc::now();
        let duration = now - run.created_at;
        let mut transitions = run.state_history.clone();
        transitions.push(run.state);

        Self {
            run_id: run.id.clone(),
            call_sid: run.call.as_ref().map(|c| c.to_string()),
            to: run.to.clone(),
            from: run.from.clone(),
            state_transitions: transitions,
            final_status: run.last_status(),
            poll_attempts: run.poll_attempts,
            recording_sid: run.recording.as_ref().map(|r| r.sid.clone()),
            artifact: run.artifact.clone(),
            started_at: run.created_at,
            completed_at: now,
            duration_ms: duration.num_milliseconds(),
        }
    }
}
