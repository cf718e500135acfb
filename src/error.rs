use thiserror::Error;

use crate::lifecycle::{CallEvent, CallState};
use crate::provider::ProviderError;

#[derive(Debug, Error)]
pub enum CallwatchError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid call request: {0}")]
    InvalidRequest(String),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Failed to download recording: status {status}")]
    Download { status: u16 },

    #[error("Call in state {state} cannot accept {event:?}")]
    InvalidState { state: CallState, event: CallEvent },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl CallwatchError {
    /// Process exit code for this error.
    ///
    /// Codes 2-5 belong to non-error outcomes, see
    /// [`CallOutcome::exit_code`](crate::lifecycle::CallOutcome::exit_code).
    pub fn exit_code(&self) -> u8 {
        match self {
            CallwatchError::Download { .. } => 5,
            CallwatchError::Provider(ProviderError::Auth { .. }) => 6,
            CallwatchError::Provider(ProviderError::Transport(_)) => 7,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_error_has_its_own_exit_code() {
        let err = CallwatchError::from(ProviderError::Auth {
            status: 401,
            message: "Authenticate".into(),
        });
        assert_eq!(err.exit_code(), 6);
        assert_eq!(
            err.to_string(),
            "Provider error: authentication failed (status 401): Authenticate"
        );
    }

    #[test]
    fn api_and_config_errors_use_generic_exit_code() {
        let api = CallwatchError::from(ProviderError::Api {
            status: 500,
            message: "boom".into(),
        });
        assert_eq!(api.exit_code(), 1);
        assert_eq!(CallwatchError::Config("missing".into()).exit_code(), 1);
    }

    #[test]
    fn download_error_display() {
        let err = CallwatchError::Download { status: 404 };
        assert_eq!(err.to_string(), "Failed to download recording: status 404");
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn json_error_uses_generic_exit_code() {
        let err = CallwatchError::from(serde_json::from_str::<u8>("x").unwrap_err());
        assert!(err.to_string().starts_with("JSON error:"));
        assert_eq!(err.exit_code(), 1);
    }
}
