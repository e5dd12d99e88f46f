use super::{
    CallRecord, CallRegistrar, RegisterCallRequest, RegisteredCall, ResponseStore, ResponseUpdate,
};
use crate::error::{ProviderError, RegistrationError};
use crate::transport::TranscriptTurn;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::HashSet;
use tracing::{debug, warn};

/// REST client for the call provider.
pub struct ProviderClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl ProviderClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }
}

/// Call record as the provider returns it.
#[derive(Debug, Deserialize)]
struct WireCallRecord {
    call_id: String,
    #[serde(default)]
    transcript_object: Vec<TranscriptTurn>,
    #[serde(default)]
    call_analysis: Option<serde_json::Value>,
    #[serde(default)]
    duration_ms: Option<u64>,
}

#[async_trait]
impl CallRegistrar for ProviderClient {
    async fn register_call(
        &self,
        req: &RegisterCallRequest,
    ) -> Result<RegisteredCall, RegistrationError> {
        let url = format!("{}/v2/create-web-call", self.base_url);
        debug!("Registering call with agent {}", req.agent_id);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(req)
            .send()
            .await
            .map_err(|e| RegistrationError::Other(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::PAYMENT_REQUIRED || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(RegistrationError::QuotaExhausted);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!("Call registration rejected ({}): {}", status, message);
            return Err(RegistrationError::Other(format!("{status}: {message}")));
        }

        response
            .json::<RegisteredCall>()
            .await
            .map_err(|e| RegistrationError::Other(e.to_string()))
    }

    async fn retrieve_call(&self, call_id: &str) -> Result<CallRecord, ProviderError> {
        let url = format!("{}/v2/get-call/{}", self.base_url, call_id);

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let wire = response.json::<WireCallRecord>().await?;

        Ok(CallRecord {
            call_id: wire.call_id,
            transcript: wire.transcript_object,
            analytics: wire.call_analysis,
            duration_ms: wire.duration_ms,
        })
    }
}

/// REST client for the response backend.
pub struct BackendStore {
    http: Client,
    base_url: String,
}

impl BackendStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ResponseStore for BackendStore {
    async fn upsert_response(&self, update: &ResponseUpdate) -> Result<(), ProviderError> {
        let url = format!("{}/responses/upsert", self.base_url);

        let response = self.http.post(&url).json(update).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        Ok(())
    }

    async fn responded_emails(&self, interview_id: &str) -> Result<HashSet<String>, ProviderError> {
        let url = format!("{}/interviews/{}/responded-emails", self.base_url, interview_id);

        let response = self.http.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        Ok(response.json::<HashSet<String>>().await?)
    }
}
