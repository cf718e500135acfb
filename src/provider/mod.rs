pub mod client;
pub mod error;
pub mod types;

pub use client::{API_URL, CallProvider, TwilioClient};
pub use error::ProviderError;
pub use types::{
    CallDetails, CallHandle, CallRequest, CallStatus, Instructions, MediaResponse, Recording, RecordingFormat,
};
