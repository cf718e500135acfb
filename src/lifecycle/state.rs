use std::fmt;

use serde::{Deserialize, Serialize};

use super::run::CallRun;
use crate::provider::CallStatus;

/// States of one outbound call, from submission to the downloaded recording.
///
/// SUBMITTED → IN_PROGRESS → COMPLETED → RECORDING_FOUND → DOWNLOADED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallState {
    Submitted,
    InProgress,
    Completed,
    RecordingFound,
    RecordingNotFound,
    Downloaded,
    DownloadFailed,
    Failed,
    Busy,
    NoAnswer,
    TimedOut,
}

impl CallState {
    /// Whether no further event is accepted in this state.
    pub fn is_terminal(self) -> bool {
        !matches!(
            self,
            CallState::Submitted
                | CallState::InProgress
                | CallState::Completed
                | CallState::RecordingFound
        )
    }
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallState::Submitted => write!(f, "SUBMITTED"),
            CallState::InProgress => write!(f, "IN_PROGRESS"),
            CallState::Completed => write!(f, "COMPLETED"),
            CallState::RecordingFound => write!(f, "RECORDING_FOUND"),
            CallState::RecordingNotFound => write!(f, "RECORDING_NOT_FOUND"),
            CallState::Downloaded => write!(f, "DOWNLOADED"),
            CallState::DownloadFailed => write!(f, "DOWNLOAD_FAILED"),
            CallState::Failed => write!(f, "FAILED"),
            CallState::Busy => write!(f, "BUSY"),
            CallState::NoAnswer => write!(f, "NO_ANSWER"),
            CallState::TimedOut => write!(f, "TIMED_OUT"),
        }
    }
}

/// Something the orchestrator observed while driving a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallEvent {
    /// A status fetched from the provider.
    StatusObserved(CallStatus),
    /// The poll attempt limit was reached without a terminal status.
    PollingExhausted,
    RecordingFound,
    RecordingMissing,
    Downloaded,
    DownloadFailed,
}

/// The result of applying an event to a call.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Moved to a new state.
    Next(CallState),
    /// Event accepted, state unchanged (a non-terminal status while in progress).
    Stay(CallState),
    /// The event is not valid in the current state; nothing changed.
    Rejected { from: CallState, event: CallEvent },
}

/// Drives a [`CallRun`] through the call state machine.
pub struct CallMachine;

impl CallMachine {
    /// Compute and apply the transition for `event`.
    ///
    /// - While `Submitted`/`InProgress`, a terminal status moves to the
    ///   matching end state, any other status keeps polling.
    /// - Only `Completed` accepts a recording lookup result.
    /// - Only `RecordingFound` accepts a download result.
    pub fn next(run: &mut CallRun, event: CallEvent) -> Transition {
        let transition = match (run.state, event) {
            (CallState::Submitted | CallState::InProgress, CallEvent::StatusObserved(status)) => {
                match status {
                    CallStatus::Completed => Transition::Next(CallState::Completed),
                    CallStatus::Failed => Transition::Next(CallState::Failed),
                    CallStatus::Busy => Transition::Next(CallState::Busy),
                    CallStatus::NoAnswer => Transition::Next(CallState::NoAnswer),
                    _ if run.state == CallState::Submitted => {
                        Transition::Next(CallState::InProgress)
                    }
                    _ => Transition::Stay(CallState::InProgress),
                }
            }
            (CallState::Submitted | CallState::InProgress, CallEvent::PollingExhausted) => {
                Transition::Next(CallState::TimedOut)
            }
            (CallState::Completed, CallEvent::RecordingFound) => {
                Transition::Next(CallState::RecordingFound)
            }
            (CallState::Completed, CallEvent::RecordingMissing) => {
                Transition::Next(CallState::RecordingNotFound)
            }
            (CallState::RecordingFound, CallEvent::Downloaded) => {
                Transition::Next(CallState::Downloaded)
            }
            (CallState::RecordingFound, CallEvent::DownloadFailed) => {
                Transition::Next(CallState::DownloadFailed)
            }
            (from, event) => Transition::Rejected { from, event },
        };

        if let (CallEvent::StatusObserved(status), Transition::Next(_) | Transition::Stay(_)) =
            (event, &transition)
        {
            run.statuses.push(status);
        }

        if let Transition::Next(next_state) = &transition {
            run.state_history.push(run.state);
            run.state = *next_state;
            run.touch();
        }

        transition
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_run() -> CallRun {
        CallRun::new("+15550001111".into(), "+15550002222".into())
    }

    #[test]
    fn happy_path_walks_to_downloaded() {
        let mut run = make_run();
        assert_eq!(run.state, CallState::Submitted);

        let t = CallMachine::next(&mut run, CallEvent::StatusObserved(CallStatus::Queued));
        assert_eq!(t, Transition::Next(CallState::InProgress));

        let t = CallMachine::next(&mut run, CallEvent::StatusObserved(CallStatus::Ringing));
        assert_eq!(t, Transition::Stay(CallState::InProgress));

        let t = CallMachine::next(&mut run, CallEvent::StatusObserved(CallStatus::Completed));
        assert_eq!(t, Transition::Next(CallState::Completed));

        let t = CallMachine::next(&mut run, CallEvent::RecordingFound);
        assert_eq!(t, Transition::Next(CallState::RecordingFound));

        let t = CallMachine::next(&mut run, CallEvent::Downloaded);
        assert_eq!(t, Transition::Next(CallState::Downloaded));
        assert!(run.state.is_terminal());

        assert_eq!(
            run.state_history,
            vec![
                CallState::Submitted,
                CallState::InProgress,
                CallState::Completed,
                CallState::RecordingFound,
            ]
        );
        assert_eq!(
            run.statuses,
            vec![CallStatus::Queued, CallStatus::Ringing, CallStatus::Completed]
        );
    }

    #[test]
    fn immediate_terminal_status_skips_in_progress() {
        let mut run = make_run();
        let t = CallMachine::next(&mut run, CallEvent::StatusObserved(CallStatus::Busy));
        assert_eq!(t, Transition::Next(CallState::Busy));
        assert_eq!(run.state_history, vec![CallState::Submitted]);
    }

    #[test]
    fn unsuccessful_statuses_end_the_call() {
        for (status, state) in [
            (CallStatus::Failed, CallState::Failed),
            (CallStatus::Busy, CallState::Busy),
            (CallStatus::NoAnswer, CallState::NoAnswer),
        ] {
            let mut run = make_run();
            CallMachine::next(&mut run, CallEvent::StatusObserved(CallStatus::Ringing));
            let t = CallMachine::next(&mut run, CallEvent::StatusObserved(status));
            assert_eq!(t, Transition::Next(state));
            assert!(run.state.is_terminal());
        }
    }

    #[test]
    fn canceled_keeps_polling() {
        let mut run = make_run();
        CallMachine::next(&mut run, CallEvent::StatusObserved(CallStatus::Queued));
        let t = CallMachine::next(&mut run, CallEvent::StatusObserved(CallStatus::Canceled));
        assert_eq!(t, Transition::Stay(CallState::InProgress));
    }

    #[test]
    fn recording_lookup_rejected_unless_completed() {
        let mut run = make_run();
        CallMachine::next(&mut run, CallEvent::StatusObserved(CallStatus::Failed));

        let t = CallMachine::next(&mut run, CallEvent::RecordingFound);
        assert_eq!(
            t,
            Transition::Rejected {
                from: CallState::Failed,
                event: CallEvent::RecordingFound,
            }
        );
        assert_eq!(run.state, CallState::Failed);
    }

    #[test]
    fn download_rejected_without_recording() {
        let mut run = make_run();
        CallMachine::next(&mut run, CallEvent::StatusObserved(CallStatus::Completed));
        CallMachine::next(&mut run, CallEvent::RecordingMissing);
        assert_eq!(run.state, CallState::RecordingNotFound);

        let t = CallMachine::next(&mut run, CallEvent::Downloaded);
        assert!(matches!(t, Transition::Rejected { .. }));
    }

    #[test]
    fn status_after_completion_is_rejected() {
        let mut run = make_run();
        CallMachine::next(&mut run, CallEvent::StatusObserved(CallStatus::Completed));
        let t = CallMachine::next(&mut run, CallEvent::StatusObserved(CallStatus::Failed));
        assert!(matches!(t, Transition::Rejected { .. }));
        assert_eq!(run.statuses, vec![CallStatus::Completed]);
    }

    #[test]
    fn polling_exhausted_times_out() {
        let mut run = make_run();
        CallMachine::next(&mut run, CallEvent::StatusObserved(CallStatus::Ringing));
        let t = CallMachine::next(&mut run, CallEvent::PollingExhausted);
        assert_eq!(t, Transition::Next(CallState::TimedOut));
    }

    #[test]
    fn download_failure_is_terminal() {
        let mut run = make_run();
        CallMachine::next(&mut run, CallEvent::StatusObserved(CallStatus::Completed));
        CallMachine::next(&mut run, CallEvent::RecordingFound);
        let t = CallMachine::next(&mut run, CallEvent::DownloadFailed);
        assert_eq!(t, Transition::Next(CallState::DownloadFailed));
        assert!(run.state.is_terminal());
    }

    #[test]
    fn state_display() {
        assert_eq!(CallState::Submitted.to_string(), "SUBMITTED");
        assert_eq!(CallState::InProgress.to_string(), "IN_PROGRESS");
        assert_eq!(CallState::RecordingNotFound.to_string(), "RECORDING_NOT_FOUND");
        assert_eq!(CallState::NoAnswer.to_string(), "NO_ANSWER");
        assert_eq!(CallState::TimedOut.to_string(), "TIMED_OUT");
    }
}
