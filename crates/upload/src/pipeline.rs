//! Orchestrates the four-step signed-upload handshake, with retries on
//! the PUT/commit steps and fixed inter-upload pacing (spec §4.2).

use crate::models::{UploadedAsset, URI_STATUS_OK};
use crate::region::RegionEndpoints;
use crate::transport::UploadTransport;
use crate::transport_http::crc32_of;
use gateway_gax::GatewayError;
use gateway_session::Region;
use std::sync::Arc;
use std::time::Duration;

/// Maximum retry attempts for the PUT-bytes and commit steps (spec §4.2).
const MAX_RETRIES: u32 = 3;

/// The pause between uploading successive images in a multi-image
/// request. Named per spec §9's instruction to make this an explicit,
/// documented constant rather than an inline delay: it exists to avoid
/// overloading the upstream blob store when a request references several
/// source images.
pub const INTER_UPLOAD_PAUSE: Duration = Duration::from_secs(2);

pub struct UploadPipeline {
    transport: Arc<dyn UploadTransport>,
    region_endpoints: Arc<dyn Fn(Region) -> RegionEndpoints + Send + Sync>,
}

impl UploadPipeline {
    pub fn new(
        transport: Arc<dyn UploadTransport>,
        region_endpoints: Arc<dyn Fn(Region) -> RegionEndpoints + Send + Sync>,
    ) -> Self {
        Self {
            transport,
            region_endpoints,
        }
    }

    /// Uploads one image and returns its opaque upstream URI.
    pub async fn upload_one(
        &self,
        refresh_token: &str,
        region: Region,
        bytes: &[u8],
    ) -> Result<UploadedAsset, GatewayError> {
        let endpoints = (self.region_endpoints)(region);

        // Step 1: acquire token. Not retried (spec §4.2: usually credential-related).
        let credentials = self
            .transport
            .acquire_token(refresh_token, region)
            .await?;

        // Step 2: apply. Also not retried.
        let apply = self
            .transport
            .apply(refresh_token, region, &credentials, &endpoints.service_id, bytes.len())
            .await?;

        let store = apply
            .store_infos
            .first()
            .ok_or_else(|| GatewayError::UpstreamProtocolError("apply returned no StoreInfos".into()))?;
        let upload_host = apply
            .upload_hosts
            .first()
            .ok_or_else(|| GatewayError::UpstreamProtocolError("apply returned no UploadHosts".into()))?;

        let crc32 = crc32_of(bytes);

        // Step 3: PUT bytes, retried.
        self.with_retries("put_bytes", |_attempt| {
            let transport = self.transport.clone();
            let upload_host = upload_host.clone();
            let store_uri = store.store_uri.clone();
            let auth = store.auth.clone();
            let bytes = bytes.to_vec();
            async move {
                transport
                    .put_bytes(&upload_host, &store_uri, &auth, crc32, &bytes)
                    .await
            }
        })
        .await?;

        // Step 4: commit, retried.
        let commit = self
            .with_retries("commit", |_attempt| {
                let transport = self.transport.clone();
                let refresh_token = refresh_token.to_string();
                let credentials = credentials.clone();
                let service_id = endpoints.service_id.clone();
                let session_key = apply.session_key.clone();
                async move {
                    transport
                        .commit(&refresh_token, region, &credentials, &service_id, &session_key)
                        .await
                }
            })
            .await?;

        let result = commit
            .results
            .first()
            .ok_or_else(|| GatewayError::UpstreamProtocolError("commit returned no Results".into()))?;

        if result.uri_status != URI_STATUS_OK {
            return Err(GatewayError::UploadCommitFailed {
                uri_status: result.uri_status,
                detail: format!("uri={}", result.uri),
            });
        }

        Ok(UploadedAsset {
            uri: result.uri.clone(),
        })
    }

    /// Uploads each of `images` in order, pausing [`INTER_UPLOAD_PAUSE`]
    /// between uploads (never after the last one, and never when there
    /// is only one image, per spec S3).
    pub async fn upload_many(
        &self,
        refresh_token: &str,
        region: Region,
        images: &[Vec<u8>],
    ) -> Result<Vec<UploadedAsset>, GatewayError> {
        let mut assets = Vec::with_capacity(images.len());
        for (i, bytes) in images.iter().enumerate() {
            assets.push(self.upload_one(refresh_token, region, bytes).await?);
            if i + 1 < images.len() {
                tokio::time::sleep(INTER_UPLOAD_PAUSE).await;
            }
        }
        Ok(assets)
    }

    /// Linear backoff retry loop: `attempt * 2s` for ordinary failures,
    /// `attempt * 3s` for network-classified errors (spec §4.2).
    async fn with_retries<T, F, Fut>(&self, step: &'static str, mut f: F) -> Result<T, GatewayError>
    where
        F: FnMut(u32) -> Fut,
        Fut: std::future::Future<Output = Result<T, GatewayError>>,
    {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match f(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) if attempt >= MAX_RETRIES || !err.is_retryable() => {
                    return Err(err);
                }
                Err(err) => {
                    let is_network = matches!(err, GatewayError::UploadNetwork { .. });
                    let multiplier = if is_network { 3 } else { 2 };
                    tracing::warn!(step, attempt, %err, "upload step failed, retrying");
                    tokio::time::sleep(Duration::from_secs((attempt * multiplier) as u64)).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ApplyResponse, CommitResponse, CommitResult, StoreInfo};
    use crate::sigv4::SigningCredentials;
    use crate::transport::MockUploadTransport;

    fn endpoints(_region: Region) -> RegionEndpoints {
        RegionEndpoints::for_region(Region::Cn)
    }

    fn creds() -> SigningCredentials {
        SigningCredentials {
            access_key: "ak".into(),
            secret_key: "sk".into(),
            session_token: "st".into(),
        }
    }

    #[tokio::test]
    async fn happy_path_returns_committed_uri() {
        let mut mock = MockUploadTransport::new();
        mock.expect_acquire_token().returning(|_, _| Ok(creds()));
        mock.expect_apply().returning(|_, _, _, _, _| {
            Ok(ApplyResponse {
                store_infos: vec![StoreInfo {
                    store_uri: "store/abc".into(),
                    auth: "auth-token".into(),
                }],
                upload_hosts: vec!["https://upload.example.com".into()],
                session_key: "session-key".into(),
            })
        });
        mock.expect_put_bytes().returning(|_, _, _, _, _| Ok(()));
        mock.expect_commit().returning(|_, _, _, _, _| {
            Ok(CommitResponse {
                results: vec![CommitResult {
                    uri_status: 2000,
                    uri: "tos-cn/final.png".into(),
                }],
            })
        });

        let pipeline = UploadPipeline::new(Arc::new(mock), Arc::new(endpoints));
        let asset = pipeline.upload_one("refresh", Region::Cn, b"bytes").await.unwrap();
        assert_eq!(asset.uri, "tos-cn/final.png");
    }

    #[tokio::test]
    async fn non_2000_uri_status_fails_as_commit_failed() {
        let mut mock = MockUploadTransport::new();
        mock.expect_acquire_token().returning(|_, _| Ok(creds()));
        mock.expect_apply().returning(|_, _, _, _, _| {
            Ok(ApplyResponse {
                store_infos: vec![StoreInfo {
                    store_uri: "store/abc".into(),
                    auth: "auth-token".into(),
                }],
                upload_hosts: vec!["https://upload.example.com".into()],
                session_key: "session-key".into(),
            })
        });
        mock.expect_put_bytes().returning(|_, _, _, _, _| Ok(()));
        mock.expect_commit().returning(|_, _, _, _, _| {
            Ok(CommitResponse {
                results: vec![CommitResult {
                    uri_status: 2001,
                    uri: String::new(),
                }],
            })
        });

        let pipeline = UploadPipeline::new(Arc::new(mock), Arc::new(endpoints));
        let err = pipeline.upload_one("refresh", Region::Cn, b"bytes").await.unwrap_err();
        assert!(matches!(err, GatewayError::UploadCommitFailed { uri_status: 2001, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn put_bytes_retries_network_errors_up_to_the_cap() {
        let mut mock = MockUploadTransport::new();
        mock.expect_acquire_token().returning(|_, _| Ok(creds()));
        mock.expect_apply().returning(|_, _, _, _, _| {
            Ok(ApplyResponse {
                store_infos: vec![StoreInfo {
                    store_uri: "store/abc".into(),
                    auth: "auth-token".into(),
                }],
                upload_hosts: vec!["https://upload.example.com".into()],
                session_key: "session-key".into(),
            })
        });
        let mut call_count = 0;
        mock.expect_put_bytes().returning(move |_, _, _, _, _| {
            call_count += 1;
            Err(GatewayError::UploadNetwork {
                step: "put_bytes",
                source: Box::new(std::io::Error::other("boom")),
            })
        });

        let pipeline = UploadPipeline::new(Arc::new(mock), Arc::new(endpoints));
        let err = pipeline.upload_one("refresh", Region::Cn, b"bytes").await.unwrap_err();
        assert!(matches!(err, GatewayError::UploadNetwork { .. }));
    }

    #[tokio::test]
    async fn upload_auth_is_never_retried() {
        let mut mock = MockUploadTransport::new();
        mock.expect_acquire_token()
            .returning(|_, _| Err(GatewayError::UploadAuth("bad token".into())));

        let pipeline = UploadPipeline::new(Arc::new(mock), Arc::new(endpoints));
        let err = pipeline.upload_one("refresh", Region::Cn, b"bytes").await.unwrap_err();
        assert!(matches!(err, GatewayError::UploadAuth(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn upload_many_pauses_between_but_not_after_last() {
        let mut mock = MockUploadTransport::new();
        mock.expect_acquire_token().returning(|_, _| Ok(creds()));
        mock.expect_apply().returning(|_, _, _, _, _| {
            Ok(ApplyResponse {
                store_infos: vec![StoreInfo {
                    store_uri: "store/abc".into(),
                    auth: "auth-token".into(),
                }],
                upload_hosts: vec!["https://upload.example.com".into()],
                session_key: "session-key".into(),
            })
        });
        mock.expect_put_bytes().returning(|_, _, _, _, _| Ok(()));
        mock.expect_commit().returning(|_, _, _, _, _| {
            Ok(CommitResponse {
                results: vec![CommitResult {
                    uri_status: 2000,
                    uri: "tos-cn/final.png".into(),
                }],
            })
        });

        let pipeline = UploadPipeline::new(Arc::new(mock), Arc::new(endpoints));
        let start = tokio::time::Instant::now();
        let assets = pipeline
            .upload_many("refresh", Region::Cn, &[b"a".to_vec(), b"b".to_vec()])
            .await
            .unwrap();
        assert_eq!(assets.len(), 2);
        assert!(start.elapsed() >= INTER_UPLOAD_PAUSE);
    }

    #[tokio::test]
    async fn single_image_upload_many_has_no_pause() {
        let mut mock = MockUploadTransport::new();
        mock.expect_acquire_token().returning(|_, _| Ok(creds()));
        mock.expect_apply().returning(|_, _, _, _, _| {
            Ok(ApplyResponse {
                store_infos: vec![StoreInfo {
                    store_uri: "store/abc".into(),
                    auth: "auth-token".into(),
                }],
                upload_hosts: vec!["https://upload.example.com".into()],
                session_key: "session-key".into(),
            })
        });
        mock.expect_put_bytes().returning(|_, _, _, _, _| Ok(()));
        mock.expect_commit().returning(|_, _, _, _, _| {
            Ok(CommitResponse {
                results: vec![CommitResult {
                    uri_status: 2000,
                    uri: "tos-cn/final.png".into(),
                }],
            })
        });

        let pipeline = UploadPipeline::new(Arc::new(mock), Arc::new(endpoints));
        let start = std::time::Instant::now();
        let assets = pipeline
            .upload_many("refresh", Region::Cn, &[b"a".to_vec()])
            .await
            .unwrap();
        assert_eq!(assets.len(), 1);
        assert!(start.elapsed() < INTER_UPLOAD_PAUSE);
    }
}
