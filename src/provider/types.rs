//! Request and response types for the provider's Calls and Recordings APIs.
//!
//! Wire structs mirror the JSON the `2010-04-01` REST API returns and are only
//! used inside the adapter. The rest of the crate sees the domain types
//! ([`CallHandle`], [`CallStatus`], [`Recording`]) they are converted into.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::ProviderError;

/// TwiML spoken when a call only carries DTMF digits.
pub const DEFAULT_DTMF_TWIML: &str = "<Response><Say>Sending DTMF tones now.</Say></Response>";

/// What the provider should do once the callee answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instructions {
    /// Inline TwiML document.
    Twiml(String),
    /// URL the provider fetches TwiML from.
    Url(String),
}

impl Instructions {
    /// Build a TwiML document that speaks `text`.
    pub fn say(text: &str) -> Self {
        Instructions::Twiml(format!("<Response><Say>{}</Say></Response>", escape_xml(text)))
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// An outbound call to submit. Immutable once handed to the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRequest {
    pub to: String,
    pub from: String,
    pub instructions: Option<Instructions>,
    /// DTMF tones played once the call connects (`0-9`, `*`, `#`, `w`/`W` pauses).
    pub send_digits: Option<String>,
    pub record: bool,
}

impl CallRequest {
    /// Check the request before anything is sent.
    pub fn validate(&self) -> Result<(), String> {
        if self.to.trim().is_empty() {
            return Err("destination number must not be empty".into());
        }
        if self.from.trim().is_empty() {
            return Err("origin number must not be empty".into());
        }
        match (&self.instructions, &self.send_digits) {
            (None, None) => {
                return Err("a call needs voice instructions, an instructions URL or DTMF digits".into());
            }
            (Some(Instructions::Twiml(doc)), _) if doc.trim().is_empty() => {
                return Err("TwiML instructions must not be empty".into());
            }
            (Some(Instructions::Url(url)), _) if url.trim().is_empty() => {
                return Err("instructions URL must not be empty".into());
            }
            _ => {}
        }
        if let Some(digits) = &self.send_digits {
            if digits.is_empty() {
                return Err("DTMF digit string must not be empty".into());
            }
            if let Some(bad) = digits
                .chars()
                .find(|c| !(c.is_ascii_digit() || matches!(c, '*' | '#' | 'w' | 'W')))
            {
                return Err(format!("invalid DTMF character '{bad}'"));
            }
        }
        Ok(())
    }

    /// Form fields for `POST .../Calls.json`.
    pub fn form_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("To", self.to.clone()), ("From", self.from.clone())];
        match &self.instructions {
            Some(Instructions::Twiml(doc)) => params.push(("Twiml", doc.clone())),
            Some(Instructions::Url(url)) => params.push(("Url", url.clone())),
            None => params.push(("Twiml", DEFAULT_DTMF_TWIML.to_string())),
        }
        if let Some(digits) = &self.send_digits {
            params.push(("SendDigits", digits.clone()));
        }
        if self.record {
            params.push(("Record", "true".to_string()));
        }
        params
    }
}

/// Provider identifier of a submitted call. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallHandle(String);

impl CallHandle {
    pub fn new(sid: impl Into<String>) -> Result<Self, ProviderError> {
        let sid = sid.into();
        if sid.trim().is_empty() {
            return Err(ProviderError::Decode("provider returned an empty call SID".into()));
        }
        Ok(Self(sid))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Call status as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CallStatus {
    Queued,
    Ringing,
    InProgress,
    Completed,
    Failed,
    Busy,
    NoAnswer,
    Canceled,
    /// Any value this crate does not know about yet.
    #[serde(other)]
    Unknown,
}

impl CallStatus {
    /// Statuses that end the polling loop.
    pub const TERMINAL: [CallStatus; 4] = [
        CallStatus::Completed,
        CallStatus::Failed,
        CallStatus::Busy,
        CallStatus::NoAnswer,
    ];

    pub fn is_terminal(self) -> bool {
        Self::TERMINAL.contains(&self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CallStatus::Queued => "queued",
            CallStatus::Ringing => "ringing",
            CallStatus::InProgress => "in-progress",
            CallStatus::Completed => "completed",
            CallStatus::Failed => "failed",
            CallStatus::Busy => "busy",
            CallStatus::NoAnswer => "no-answer",
            CallStatus::Canceled => "canceled",
            CallStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Representation of a recording to download.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingFormat {
    /// Recording metadata.
    #[default]
    Json,
    Mp3,
    Wav,
}

impl RecordingFormat {
    pub fn extension(self) -> &'static str {
        match self {
            RecordingFormat::Json => "json",
            RecordingFormat::Mp3 => "mp3",
            RecordingFormat::Wav => "wav",
        }
    }
}

/// A recording stored by the provider for one call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recording {
    pub sid: String,
    pub call_sid: Option<String>,
    /// Provider-relative resource path, e.g. `/2010-04-01/Accounts/AC.../Recordings/RE....json`.
    pub uri: String,
    pub duration_secs: Option<u32>,
}

impl Recording {
    /// Path of the recording content in `format`, relative to the API base URL.
    pub fn media_path(&self, format: RecordingFormat) -> String {
        let stem = self.uri.strip_suffix(".json").unwrap_or(&self.uri);
        format!("{stem}.{}", format.extension())
    }
}

/// Raw result of an authenticated GET on recording content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Status of an existing call together with its endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallDetails {
    pub status: CallStatus,
    pub to: Option<String>,
    pub from: Option<String>,
}

/// Call resource as returned by the Calls API.
#[derive(Debug, Clone, Deserialize)]
pub struct CallResource {
    pub sid: String,
    pub status: CallStatus,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
}

impl From<CallResource> for CallDetails {
    fn from(res: CallResource) -> Self {
        Self {
            status: res.status,
            to: res.to.filter(|n| !n.is_empty()),
            from: res.from.filter(|n| !n.is_empty()),
        }
    }
}

/// One page of the Recordings list API.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordingPage {
    #[serde(default)]
    pub recordings: Vec<RecordingResource>,
}

/// Recording resource as returned by the Recordings API.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordingResource {
    pub sid: String,
    #[serde(default)]
    pub call_sid: Option<String>,
    pub uri: String,
    /// Sent as a string of seconds, or null while the recording is processing.
    #[serde(default)]
    pub duration: Option<String>,
}

impl From<RecordingResource> for Recording {
    fn from(res: RecordingResource) -> Self {
        Self {
            sid: res.sid,
            call_sid: res.call_sid,
            uri: res.uri,
            duration_secs: res.duration.and_then(|d| d.parse().ok()),
        }
    }
}

/// Error body the provider attaches to 4xx/5xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub message: String,
}
