use crate::config::ClientConfig;
use crate::error::VoiceError;
use crate::media::Signaling;
use crate::realtime::RealtimeSessionGrant;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde_json::json;

/// [`Signaling`] over HTTP: credentials from the relay, SDP with the provider.
///
/// Neither call is retried or given a timeout; a hung provider leaves the
/// session in `connecting` until the caller gives up.
#[derive(Debug, Clone)]
pub struct HttpSignaling {
    client: Client,
    session_url: String,
    realtime_url: String,
    model: String,
}

impl HttpSignaling {
    pub fn new(config: &ClientConfig) -> Result<Self, VoiceError> {
        let client = Client::builder()
            .build()
            .map_err(|e| VoiceError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: Client, config: &ClientConfig) -> Self {
        Self {
            client,
            session_url: config.session_endpoint(),
            realtime_url: config.realtime_url.clone(),
            model: config.model.clone(),
        }
    }
}

#[async_trait]
impl Signaling for HttpSignaling {
    async fn request_credential(&self, preferred_lang: Option<&str>) -> Result<String, VoiceError> {
        let body = match preferred_lang {
            Some(lang) => json!({ "preferredLang": lang }),
            None => json!({}),
        };

        let response = self
            .client
            .post(&self.session_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| VoiceError::Credential(format!("session request failed: {}", e)))?;

        let status = response.status();
        let grant = response.json::<RealtimeSessionGrant>().await.map_err(|e| {
            VoiceError::Credential(format!("relay answered {} without a session: {}", status, e))
        })?;

        let token = grant
            .token()
            .ok_or_else(|| VoiceError::Credential("client_secret.value is empty".to_string()))?;

        tracing::debug!(session = grant.id.as_deref().unwrap_or("<none>"), "received realtime credential");
        Ok(token.to_string())
    }

    async fn exchange_sdp(&self, token: &str, offer_sdp: &str) -> Result<String, VoiceError> {
        let response = self
            .client
            .post(&self.realtime_url)
            .query(&[("model", self.model.as_str())])
            .bearer_auth(token)
            .header(CONTENT_TYPE, "application/sdp")
            .body(offer_sdp.to_string())
            .send()
            .await
            .map_err(|e| VoiceError::Negotiation(format!("SDP exchange failed: {}", e)))?;

        let status = response.status();
        let answer = response
            .text()
            .await
            .map_err(|e| VoiceError::Negotiation(format!("failed to read SDP answer: {}", e)))?;

        if !status.is_success() {
            return Err(VoiceError::Negotiation(format!(
                "provider returned {}: {}",
                status, answer
            )));
        }
        if answer.trim().is_empty() {
            return Err(VoiceError::Negotiation("provider returned an empty answer".to_string()));
        }

        Ok(answer)
    }
}
