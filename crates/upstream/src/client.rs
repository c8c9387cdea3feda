//! The shared upstream HTTP client: submit a generation request, fetch
//! its history record. Behind a trait so the Generation Controller's
//! tests drive a fake instead of a live network call (spec §12), the
//! same pattern as `gateway_upload::UploadTransport`.

use crate::models::{GenerateResponse, HistoryRecord};
use async_trait::async_trait;
use gateway_gax::GatewayError;
use gateway_session::Region;
use gateway_upload::RegionEndpoints;
use serde_json::Value;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[cfg_attr(any(test, feature = "test-util"), mockall::automock)]
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// `POST /mweb/v1/aigc_draft/generate`. Returns the upstream history
    /// id; missing id is the caller's `UpstreamProtocolError` to raise.
    async fn submit(
        &self,
        refresh_token: &str,
        region: Region,
        envelope: Value,
    ) -> Result<Option<String>, GatewayError>;

    /// `POST /mweb/v1/get_history_by_ids`, for a single id.
    async fn get_history(
        &self,
        refresh_token: &str,
        region: Region,
        history_id: &str,
    ) -> Result<HistoryRecord, GatewayError>;
}

pub struct ReqwestUpstreamClient {
    client: reqwest::Client,
    endpoints: Box<dyn Fn(Region) -> RegionEndpoints + Send + Sync>,
}

impl ReqwestUpstreamClient {
    pub fn new(
        client: reqwest::Client,
        endpoints: impl Fn(Region) -> RegionEndpoints + Send + Sync + 'static,
    ) -> Self {
        Self {
            client,
            endpoints: Box::new(endpoints),
        }
    }

    fn network_error(step: &'static str, source: reqwest::Error) -> GatewayError {
        GatewayError::UploadNetwork {
            step,
            source: Box::new(source),
        }
    }
}

#[async_trait]
impl UpstreamClient for ReqwestUpstreamClient {
    async fn submit(
        &self,
        refresh_token: &str,
        region: Region,
        envelope: Value,
    ) -> Result<Option<String>, GatewayError> {
        let endpoints = (self.endpoints)(region);
        let url = format!("{}/mweb/v1/aigc_draft/generate", endpoints.mweb_host);

        let response: GenerateResponse = self
            .client
            .post(&url)
            .timeout(REQUEST_TIMEOUT)
            .bearer_auth(refresh_token)
            .json(&envelope)
            .send()
            .await
            .map_err(|e| Self::network_error("submit", e))?
            .error_for_status()
            .map_err(|e| Self::network_error("submit", e))?
            .json()
            .await
            .map_err(|e| Self::network_error("submit", e))?;

        Ok(response.aigc_data.history_record_id)
    }

    async fn get_history(
        &self,
        refresh_token: &str,
        region: Region,
        history_id: &str,
    ) -> Result<HistoryRecord, GatewayError> {
        let endpoints = (self.endpoints)(region);
        let url = format!("{}/mweb/v1/get_history_by_ids", endpoints.mweb_host);

        #[derive(serde::Serialize)]
        struct Body<'a> {
            history_ids: [&'a str; 1],
        }

        let mut response: std::collections::HashMap<String, HistoryRecord> = self
            .client
            .post(&url)
            .timeout(REQUEST_TIMEOUT)
            .bearer_auth(refresh_token)
            .json(&Body {
                history_ids: [history_id],
            })
            .send()
            .await
            .map_err(|e| Self::network_error("get_history_by_ids", e))?
            .error_for_status()
            .map_err(|e| Self::network_error("get_history_by_ids", e))?
            .json()
            .await
            .map_err(|e| Self::network_error("get_history_by_ids", e))?;

        response.remove(history_id).ok_or_else(|| {
            GatewayError::UpstreamProtocolError(format!(
                "get_history_by_ids response missing id {history_id}"
            ))
        })
    }
}
