use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::error::ProviderError;
use super::types::{
    ApiErrorBody, CallDetails, CallHandle, CallRequest, CallResource, MediaResponse, Recording,
    RecordingPage,
};

pub const API_URL: &str = "https://api.twilio.com";
const API_VERSION: &str = "2010-04-01";

/// The provider operations the orchestrator depends on.
pub trait CallProvider {
    /// Submit an outbound call and return its identifier.
    async fn create_call(&self, req: &CallRequest) -> Result<CallHandle, ProviderError>;

    /// Fetch the current status of a call and its endpoints.
    async fn fetch_call(&self, call: &CallHandle) -> Result<CallDetails, ProviderError>;

    /// List recordings of a call, in provider order.
    async fn list_recordings(&self, call: &CallHandle) -> Result<Vec<Recording>, ProviderError>;

    /// Authenticated GET of recording content. Non-success statuses are
    /// returned in the response, not as errors.
    async fn fetch_media(&self, path: &str) -> Result<MediaResponse, ProviderError>;
}

pub struct TwilioClient {
    account_sid: String,
    auth_token: String,
    client: Client,
    base_url: String,
}

impl TwilioClient {
    /// Create a client for `base_url`, normally [`API_URL`] or a local mock server.
    pub fn with_base_url(
        account_sid: String,
        auth_token: String,
        base_url: String,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            account_sid,
            auth_token,
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn account_url(&self, resource: &str) -> String {
        format!(
            "{}/{API_VERSION}/Accounts/{}/{resource}",
            self.base_url, self.account_sid
        )
    }

    /// Resolve a recording path against the base URL.
    ///
    /// Absolute URLs must live under the base URL; basic auth is never sent elsewhere.
    fn media_url(&self, path: &str) -> Result<String, ProviderError> {
        if !(path.starts_with("http://") || path.starts_with("https://")) {
            return Ok(format!("{}{path}", self.base_url));
        }
        match path.strip_prefix(&self.base_url) {
            Some(rest) if rest.is_empty() || rest.starts_with('/') => Ok(path.to_string()),
            _ => Err(ProviderError::Decode(format!(
                "recording URL {path} is outside {}",
                self.base_url
            ))),
        }
    }
}

/// Read a JSON body, turning non-success statuses into [`ProviderError`].
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ProviderError> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<ApiErrorBody>(&text)
            .map(|body| body.message)
            .unwrap_or(text);
        return Err(ProviderError::from_status(status.as_u16(), message));
    }

    serde_json::from_str(&text).map_err(|e| ProviderError::Decode(e.to_string()))
}

impl CallProvider for TwilioClient {
    async fn create_call(&self, req: &CallRequest) -> Result<CallHandle, ProviderError> {
        let url = self.account_url("Calls.json");
        debug!(%url, to = %req.to, from = %req.from, "creating call");

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&req.form_params())
            .send()
            .await?;

        let call: CallResource = read_json(response).await?;
        CallHandle::new(call.sid)
    }

    async fn fetch_call(&self, call: &CallHandle) -> Result<CallDetails, ProviderError> {
        let url = self.account_url(&format!("Calls/{call}.json"));
        debug!(%url, "fetching call");

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .send()
            .await?;

        let resource: CallResource = read_json(response).await?;
        Ok(CallDetails::from(resource))
    }

    async fn list_recordings(&self, call: &CallHandle) -> Result<Vec<Recording>, ProviderError> {
        let url = self.account_url("Recordings.json");
        debug!(%url, call_sid = %call, "listing recordings");

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .query(&[("CallSid", call.as_str())])
            .send()
            .await?;

        let page: RecordingPage = read_json(response).await?;
        Ok(page.recordings.into_iter().map(Recording::from).collect())
    }

    async fn fetch_media(&self, path: &str) -> Result<MediaResponse, ProviderError> {
        let url = self.media_url(path)?;
        debug!(%url, "fetching recording content");

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        Ok(MediaResponse { status, body })
    }
}
