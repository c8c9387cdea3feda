//! The live `reqwest`-backed [`UploadTransport`].

use crate::models::{ApplyResponse, CommitRequest, CommitResponse};
use crate::region::RegionEndpoints;
use crate::sigv4::{sign, RequestToSign, SigningCredentials};
use crate::transport::UploadTransport;
use async_trait::async_trait;
use gateway_gax::GatewayError;
use gateway_session::Region;
use std::time::Duration;

/// Per-attempt HTTP timeout for every upload-pipeline call (spec §5).
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct ReqwestUploadTransport {
    client: reqwest::Client,
    endpoints: Box<dyn Fn(Region) -> RegionEndpoints + Send + Sync>,
}

impl ReqwestUploadTransport {
    pub fn new(client: reqwest::Client, endpoints: impl Fn(Region) -> RegionEndpoints + Send + Sync + 'static) -> Self {
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
impl UploadTransport for ReqwestUploadTransport {
    async fn acquire_token(
        &self,
        refresh_token: &str,
        region: Region,
    ) -> Result<SigningCredentials, GatewayError> {
        let endpoints = (self.endpoints)(region);
        let url = format!("{}/mweb/v1/get_upload_token", endpoints.mweb_host);

        #[derive(serde::Serialize)]
        struct Body<'a> {
            scene: &'a str,
        }
        #[derive(serde::Deserialize)]
        struct Response {
            access_key: String,
            secret_key: String,
            session_token: String,
        }

        let response = self
            .client
            .post(&url)
            .timeout(REQUEST_TIMEOUT)
            .bearer_auth(refresh_token)
            .json(&Body {
                scene: "AIGC image upload",
            })
            .send()
            .await
            .map_err(|e| Self::network_error("acquire_token", e))?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(GatewayError::UploadAuth(
                "credential service rejected the refresh token".into(),
            ));
        }
        let parsed: Response = response
            .error_for_status()
            .map_err(|e| Self::network_error("acquire_token", e))?
            .json()
            .await
            .map_err(|e| Self::network_error("acquire_token", e))?;

        Ok(SigningCredentials {
            access_key: parsed.access_key,
            secret_key: parsed.secret_key,
            session_token: parsed.session_token,
        })
    }

    async fn apply(
        &self,
        _refresh_token: &str,
        region: Region,
        credentials: &SigningCredentials,
        service_id: &str,
        file_size: usize,
    ) -> Result<ApplyResponse, GatewayError> {
        let endpoints = (self.endpoints)(region);
        let host = endpoints
            .imagex_host
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .to_string();
        let query = format!(
            "Action=ApplyImageUpload&Version=2018-08-01&ServiceId={service_id}&FileSize={file_size}"
        );
        let signed = sign(
            &RequestToSign {
                method: "GET",
                host: &host,
                canonical_uri: "/",
                canonical_query_string: &query,
                body: b"",
            },
            credentials,
            &endpoints.aws_region,
            "imagex",
            chrono::Utc::now(),
        );

        let url = format!("{}/?{}", endpoints.imagex_host, query);
        let response = self
            .client
            .get(&url)
            .timeout(REQUEST_TIMEOUT)
            .header("x-amz-date", signed.x_amz_date)
            .header("x-amz-security-token", signed.x_amz_security_token)
            .header("Authorization", signed.authorization)
            .header("Referer", &endpoints.referer)
            .send()
            .await
            .map_err(|e| Self::network_error("apply", e))?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED
            || response.status() == reqwest::StatusCode::FORBIDDEN
        {
            return Err(GatewayError::UploadAuth(format!(
                "apply rejected with status {}",
                response.status()
            )));
        }

        #[derive(serde::Deserialize)]
        struct Envelope {
            #[serde(rename = "Result")]
            result: ApplyResponse,
        }
        let envelope: Envelope = response
            .error_for_status()
            .map_err(|e| Self::network_error("apply", e))?
            .json()
            .await
            .map_err(|e| Self::network_error("apply", e))?;
        Ok(envelope.result)
    }

    async fn put_bytes(
        &self,
        upload_host: &str,
        store_uri: &str,
        authorization: &str,
        crc32: u32,
        bytes: &[u8],
    ) -> Result<(), GatewayError> {
        let url = format!("{upload_host}/upload/v1/{store_uri}");
        let response = self
            .client
            .post(&url)
            .timeout(REQUEST_TIMEOUT)
            .header("Content-Type", "application/octet-stream")
            .header("Content-CRC32", format!("{crc32:08x}"))
            .header("Authorization", authorization)
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(|e| Self::network_error("put_bytes", e))?;

        if !response.status().is_success() {
            return Err(GatewayError::UploadNetwork {
                step: "put_bytes",
                source: format!("upstream returned status {}", response.status()).into(),
            });
        }
        Ok(())
    }

    async fn commit(
        &self,
        _refresh_token: &str,
        region: Region,
        credentials: &SigningCredentials,
        service_id: &str,
        session_key: &str,
    ) -> Result<CommitResponse, GatewayError> {
        let endpoints = (self.endpoints)(region);
        let host = endpoints
            .imagex_host
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .to_string();
        let query = format!("Action=CommitImageUpload&Version=2018-08-01&ServiceId={service_id}");
        let body = serde_json::to_vec(&CommitRequest {
            session_key: session_key.to_string(),
        })
        .expect("CommitRequest always serializes");

        let signed = sign(
            &RequestToSign {
                method: "POST",
                host: &host,
                canonical_uri: "/",
                canonical_query_string: &query,
                body: &body,
            },
            credentials,
            &endpoints.aws_region,
            "imagex",
            chrono::Utc::now(),
        );

        let url = format!("{}/?{}", endpoints.imagex_host, query);
        let response = self
            .client
            .post(&url)
            .timeout(REQUEST_TIMEOUT)
            .header("x-amz-date", signed.x_amz_date)
            .header("x-amz-security-token", signed.x_amz_security_token)
            .header("Authorization", signed.authorization)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| Self::network_error("commit", e))?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(GatewayError::UploadAuth("commit signature rejected".into()));
        }

        #[derive(serde::Deserialize)]
        struct Envelope {
            #[serde(rename = "Result")]
            result: CommitResponse,
        }
        let envelope: Envelope = response
            .error_for_status()
            .map_err(|e| Self::network_error("commit", e))?
            .json()
            .await
            .map_err(|e| Self::network_error("commit", e))?;
        Ok(envelope.result)
    }
}

/// Computes the standard CRC-32 (IEEE 802.3) checksum the `Content-CRC32`
/// header expects.
pub fn crc32_of(bytes: &[u8]) -> u32 {
    crc32fast::hash(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crc32_is_deterministic() {
        assert_eq!(crc32_of(b"hello"), crc32_of(b"hello"));
        assert_ne!(crc32_of(b"hello"), crc32_of(b"world"));
    }
}
