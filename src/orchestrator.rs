use std::path::PathBuf;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::error::CallwatchError;
use crate::lifecycle::{
    AuditRecord, CallEvent, CallMachine, CallOutcome, CallRun, CallState, DownloadedArtifact,
    PollConfig, Transition,
};
use crate::provider::{CallHandle, CallProvider, CallRequest, CallStatus, Recording, RecordingFormat};

/// Receives the observable steps of a call run.
///
/// Every method has an empty default so observers only implement what they show.
pub trait CallObserver {
    fn submitted(&self, _call: &CallHandle) {}
    fn status(&self, _attempt: u32, _status: CallStatus) {}
    fn recording(&self, _recording: Option<&Recording>) {}
    fn finished(&self, _outcome: &CallOutcome) {}
}

/// Observer that ignores everything.
impl CallObserver for () {}

/// How the polling loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollResult {
    Terminal(CallStatus),
    TimedOut { attempts: u32 },
}

/// Outcome of a run together with its audit record.
#[derive(Debug, Clone)]
pub struct CallReport {
    pub outcome: CallOutcome,
    pub audit: AuditRecord,
}

/// Drives one outbound call from submission to the downloaded recording.
pub struct CallOrchestrator<P> {
    provider: P,
    poll: PollConfig,
    output_path: PathBuf,
    format: RecordingFormat,
}

/// Apply `event` to the run, refusing events the current state does not accept.
fn advance(run: &mut CallRun, event: CallEvent) -> Result<CallState, CallwatchError> {
    match CallMachine::next(run, event) {
        Transition::Next(state) => {
            info!(run_id = %run.id, %state, "call state changed");
            Ok(state)
        }
        Transition::Stay(state) => Ok(state),
        Transition::Rejected { from, event } => Err(CallwatchError::InvalidState { state: from, event }),
    }
}

impl<P: CallProvider> CallOrchestrator<P> {
    pub fn new(provider: P, poll: PollConfig, output_path: PathBuf, format: RecordingFormat) -> Self {
        Self {
            provider,
            poll,
            output_path,
            format,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Place a call and follow it to its outcome.
    pub async fn run(
        &self,
        req: &CallRequest,
        observer: &impl CallObserver,
    ) -> Result<CallReport, CallwatchError> {
        let mut run = CallRun::new(req.to.clone(), req.from.clone());
        let call = self.submit_call(&mut run, req, observer).await?;
        let outcome = self.follow(&mut run, &call, observer).await?;
        Ok(Self::finish(&run, outcome, observer))
    }

    /// Check a call placed earlier, e.g. by another invocation.
    ///
    /// The status is fetched once; recordings are only looked up when the call
    /// is already completed.
    pub async fn retrieve(
        &self,
        call: CallHandle,
        observer: &impl CallObserver,
    ) -> Result<CallReport, CallwatchError> {
        let details = self.provider.fetch_call(&call).await?;
        let mut run = CallRun::new(
            details.to.unwrap_or_default(),
            details.from.unwrap_or_default(),
        );
        run.call = Some(call.clone());
        run.poll_attempts = 1;

        let status = details.status;
        debug!(call_sid = %call, %status, "fetched call status");
        observer.status(run.poll_attempts, status);
        advance(&mut run, CallEvent::StatusObserved(status))?;

        let outcome = if status == CallStatus::Completed {
            self.retrieve_recording(&mut run, &call, observer).await?
        } else {
            if !run.state.is_terminal() {
                warn!(call_sid = %call, %status, "call has not finished yet");
            }
            CallOutcome::NotCompleted(status)
        };
        Ok(Self::finish(&run, outcome, observer))
    }

    fn finish(run: &CallRun, outcome: CallOutcome, observer: &impl CallObserver) -> CallReport {
        info!(run_id = %run.id, state = %run.state, "call run finished");
        observer.finished(&outcome);
        CallReport {
            outcome,
            audit: AuditRecord::from_run(run),
        }
    }

    /// Validate and submit the request. Auth and transport failures are returned as is.
    pub async fn submit_call(
        &self,
        run: &mut CallRun,
        req: &CallRequest,
        observer: &impl CallObserver,
    ) -> Result<CallHandle, CallwatchError> {
        req.validate().map_err(CallwatchError::InvalidRequest)?;

        let call = self.provider.create_call(req).await?;
        info!(run_id = %run.id, call_sid = %call, "call submitted");
        run.call = Some(call.clone());
        observer.submitted(&call);
        Ok(call)
    }

    /// Poll until the provider reports a terminal status or the attempt budget runs out.
    pub async fn poll_status(
        &self,
        run: &mut CallRun,
        call: &CallHandle,
        observer: &impl CallObserver,
    ) -> Result<PollResult, CallwatchError> {
        loop {
            let status = self.provider.fetch_call(call).await?.status;
            run.poll_attempts += 1;
            debug!(call_sid = %call, attempt = run.poll_attempts, %status, "polled call status");
            observer.status(run.poll_attempts, status);
            advance(run, CallEvent::StatusObserved(status))?;

            if status.is_terminal() {
                return Ok(PollResult::Terminal(status));
            }

            if self.poll.is_exhausted(run.poll_attempts) {
                advance(run, CallEvent::PollingExhausted)?;
                warn!(
                    call_sid = %call,
                    attempts = run.poll_attempts,
                    "gave up waiting for a terminal call status"
                );
                return Ok(PollResult::TimedOut {
                    attempts: run.poll_attempts,
                });
            }

            sleep(self.poll.interval()).await;
        }
    }

    /// Look up the first recording of a completed call, in provider order.
    pub async fn fetch_recording(
        &self,
        run: &mut CallRun,
        call: &CallHandle,
        observer: &impl CallObserver,
    ) -> Result<Option<Recording>, CallwatchError> {
        if run.state != CallState::Completed {
            return Err(CallwatchError::InvalidState {
                state: run.state,
                event: CallEvent::RecordingFound,
            });
        }

        let recording = self.provider.list_recordings(call).await?.into_iter().next();
        observer.recording(recording.as_ref());

        match &recording {
            Some(rec) => {
                info!(call_sid = %call, recording_sid = %rec.sid, "recording found");
                advance(run, CallEvent::RecordingFound)?;
                run.recording = Some(rec.clone());
            }
            None => {
                info!(call_sid = %call, "no recording found");
                advance(run, CallEvent::RecordingMissing)?;
            }
        }
        Ok(recording)
    }

    /// Fetch the recording content and write it verbatim to the output path.
    ///
    /// Nothing is written unless the provider answers 200.
    pub async fn download_recording(
        &self,
        run: &mut CallRun,
        recording: &Recording,
    ) -> Result<DownloadedArtifact, CallwatchError> {
        if run.state != CallState::RecordingFound {
            return Err(CallwatchError::InvalidState {
                state: run.state,
                event: CallEvent::Downloaded,
            });
        }

        let media_path = recording.media_path(self.format);
        let media = self.provider.fetch_media(&media_path).await?;

        if media.status != 200 {
            warn!(recording_sid = %recording.sid, status = media.status, "recording download failed");
            advance(run, CallEvent::DownloadFailed)?;
            return Err(CallwatchError::Download {
                status: media.status,
            });
        }

        tokio::fs::write(&self.output_path, &media.body).await?;
        let artifact = DownloadedArtifact {
            path: self.output_path.clone(),
            bytes: media.body.len() as u64,
        };
        info!(path = %artifact.path.display(), bytes = artifact.bytes, "recording downloaded");
        advance(run, CallEvent::Downloaded)?;
        run.artifact = Some(artifact.clone());
        Ok(artifact)
    }

    async fn follow(
        &self,
        run: &mut CallRun,
        call: &CallHandle,
        observer: &impl CallObserver,
    ) -> Result<CallOutcome, CallwatchError> {
        let status = match self.poll_status(run, call, observer).await? {
            PollResult::Terminal(status) => status,
            PollResult::TimedOut { attempts } => return Ok(CallOutcome::TimedOut { attempts }),
        };

        if status != CallStatus::Completed {
            return Ok(CallOutcome::NotCompleted(status));
        }
        self.retrieve_recording(run, call, observer).await
    }

    /// FetchRecording then DownloadRecording for a call in `Completed`.
    async fn retrieve_recording(
        &self,
        run: &mut CallRun,
        call: &CallHandle,
        observer: &impl CallObserver,
    ) -> Result<CallOutcome, CallwatchError> {
        let Some(recording) = self.fetch_recording(run, call, observer).await? else {
            return Ok(CallOutcome::NoRecording);
        };

        match self.download_recording(run, &recording).await {
            Ok(artifact) => Ok(CallOutcome::Downloaded(artifact)),
            Err(CallwatchError::Download { status }) => Ok(CallOutcome::DownloadFailed { status }),
            Err(e) => Err(e),
        }
    }
}
