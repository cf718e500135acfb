mod run;
mod state;

pub use run::{AuditRecord, CallOutcome, CallRun, DownloadedArtifact, PollConfig};
pub use state::{CallEvent, CallMachine, CallState, Transition};
