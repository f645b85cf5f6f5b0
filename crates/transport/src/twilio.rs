//! Twilio Programmable Messaging transport
//!
//! Sends one SMS per call through the Messages resource of the REST API.

use std::time::Duration;

use contracts::{MessageId, MessagePayload, SenderIdentity, Transport, TransportError};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

const DEFAULT_BASE_URL: &str = "https://api.twilio.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Account credentials, passed in explicitly by the caller
#[derive(Clone)]
pub struct TwilioCredentials {
    pub account_sid: String,
    pub auth_token: String,
}

impl std::fmt::Debug for TwilioCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioCredentials")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct MessageResource {
    sid: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: Option<u32>,
    message: String,
}

/// Transport backed by the Twilio REST API
pub struct TwilioTransport {
    client: reqwest::Client,
    credentials: TwilioCredentials,
    base_url: String,
}

impl TwilioTransport {
    /// Create a transport against the public API
    pub fn new(credentials: TwilioCredentials) -> Result<Self, TransportError> {
        Self::with_base_url(credentials, DEFAULT_BASE_URL)
    }

    /// Create a transport against another endpoint (e.g. a local stub)
    pub fn with_base_url(
        credentials: TwilioCredentials,
        base_url: impl Into<String>,
    ) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TransportError::network(e.to_string()))?;

        Ok(Self {
            client,
            credentials,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.credentials.account_sid
        )
    }
}

impl Transport for TwilioTransport {
    fn name(&self) -> &str {
        "twilio"
    }

    #[instrument(
        name = "twilio_transport_send",
        skip(self, payload),
        fields(sender = %sender, recipient = %recipient)
    )]
    async fn send(
        &self,
        sender: &SenderIdentity,
        recipient: &str,
        payload: &MessagePayload,
    ) -> Result<MessageId, TransportError> {
        let form = [
            ("From", sender.as_str()),
            ("To", recipient),
            ("Body", payload.body.as_str()),
        ];

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.credentials.account_sid, Some(&self.credentials.auth_token))
            .form(&form[..])
            .send()
            .await
            .map_err(|e| TransportError::network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            let resource: MessageResource = response
                .json()
                .await
                .map_err(|e| TransportError::network(format!("unreadable response: {e}")))?;
            debug!(sid = %resource.sid, "Message accepted");
            return Ok(MessageId::new(resource.sid));
        }

        let reason = match response.json::<ApiError>().await {
            Ok(ApiError {
                code: Some(code),
                message,
            }) => format!("{message} (code {code})"),
            Ok(ApiError { code: None, message }) => message,
            Err(_) => format!("HTTP {status}"),
        };
        warn!(status = %status, reason = %reason, "Message rejected");
        Err(TransportError::rejected(reason))
    }
}
