//! The Generation Controller: orchestrates region/model resolution,
//! quota enforcement, uploads, payload construction, submission, and
//! smart-polling for each of the three generation operations (spec
//! §4.5).

use crate::model_registry::{resolve_model, ModelKind};
use crate::request::{CompositionRequest, ImageRequest, VideoRequest};
use gateway_gax::GatewayError;
use gateway_payload::builder::{build, BuildRequest, GenerationMode};
use gateway_payload::multi_image::resolve_count;
use gateway_poller::policy::{ImagePollPolicy, PollIntervalPolicy, VideoPollPolicy};
use gateway_poller::status::{PollOutcome, PollStatus};
use gateway_poller::{poll_until_done, PollSpec};
use gateway_quota::{QuotaLedger, ServiceType};
use gateway_session::{Credential, Region};
use gateway_upload::UploadPipeline;
use gateway_upstream::UpstreamClient;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub struct GenerationController {
    quota: Arc<QuotaLedger>,
    upload: Arc<UploadPipeline>,
    upstream: Arc<dyn UpstreamClient>,
}

impl GenerationController {
    pub fn new(quota: Arc<QuotaLedger>, upload: Arc<UploadPipeline>, upstream: Arc<dyn UpstreamClient>) -> Self {
        Self {
            quota,
            upload,
            upstream,
        }
    }

    pub async fn generate_image(
        &self,
        req: ImageRequest<'_>,
        credential: &Credential,
        cancel: &CancellationToken,
        mut on_progress: impl FnMut(u8),
    ) -> Result<Vec<String>, GatewayError> {
        let session = credential.session_id.clone();
        info!(session = %session, "generate_image started");

        let upstream_model = resolve_model(req.model, credential.region, ModelKind::Image)?;
        self.check_quota(&credential.session_id, ServiceType::Image).await?;

        let count = resolve_count(req.explicit_count, req.prompt);
        let mode = if count.is_some() {
            GenerationMode::MultiImg
        } else {
            GenerationMode::Text2Img
        };
        // Plain text-to-image returns a batch of 4 by upstream convention
        // (spec §4.5 step 6); multi-image uses the resolved count.
        let expected = count.unwrap_or(4) as usize;

        let envelope = build(&BuildRequest {
            mode,
            upstream_model: &upstream_model,
            prompt: req.prompt,
            negative_prompt: req.negative_prompt,
            region: credential.region,
            ratio: req.ratio,
            resolution_tier: req.resolution_tier,
            sample_strength: req.sample_strength,
            seed: req.seed,
            intelligent_ratio: req.intelligent_ratio,
            uploaded_image_uris: &[],
            explicit_count: req.explicit_count,
            submit_id: new_id(),
            component_id: new_id(),
        })?;

        let policy = ImagePollPolicy::default();
        let urls = self
            .submit_and_poll(credential, envelope, expected, &policy, "generate_image", cancel, &mut on_progress)
            .await?;
        self.increment_quota_logged(&credential.session_id, ServiceType::Image).await;
        Ok(urls)
    }

    pub async fn generate_image_composition(
        &self,
        req: CompositionRequest<'_>,
        credential: &Credential,
        cancel: &CancellationToken,
        mut on_progress: impl FnMut(u8),
    ) -> Result<Vec<String>, GatewayError> {
        let session = credential.session_id.clone();
        info!(session = %session, "generate_image_composition started");

        let upstream_model = resolve_model(req.model, credential.region, ModelKind::Image)?;
        self.check_quota(&credential.session_id, ServiceType::Image).await?;

        let uploaded = self
            .upload
            .upload_many(&credential.refresh_token, credential.region, req.images)
            .await?;
        let uris: Vec<String> = uploaded.into_iter().map(|asset| asset.uri).collect();

        let envelope = build(&BuildRequest {
            mode: GenerationMode::Img2Img,
            upstream_model: &upstream_model,
            prompt: req.prompt,
            negative_prompt: req.negative_prompt,
            region: credential.region,
            ratio: req.ratio,
            resolution_tier: req.resolution_tier,
            sample_strength: req.sample_strength,
            seed: req.seed,
            intelligent_ratio: req.intelligent_ratio,
            uploaded_image_uris: &uris,
            explicit_count: None,
            submit_id: new_id(),
            component_id: new_id(),
        })?;

        let policy = ImagePollPolicy::default();
        let urls = self
            .submit_and_poll(
                credential,
                envelope,
                1,
                &policy,
                "generate_image_composition",
                cancel,
                &mut on_progress,
            )
            .await?;
        self.increment_quota_logged(&credential.session_id, ServiceType::Image).await;
        Ok(urls)
    }

    pub async fn generate_video(
        &self,
        req: VideoRequest<'_>,
        credential: &Credential,
        cancel: &CancellationToken,
        mut on_progress: impl FnMut(u8),
    ) -> Result<Vec<String>, GatewayError> {
        let session = credential.session_id.clone();
        info!(session = %session, "generate_video started");

        let upstream_model = resolve_model(req.model, credential.region, ModelKind::Video)?;
        self.check_quota(&credential.session_id, ServiceType::Video).await?;

        let uploaded = self
            .upload
            .upload_many(&credential.refresh_token, credential.region, req.images)
            .await?;
        let uris: Vec<String> = uploaded.into_iter().map(|asset| asset.uri).collect();

        let envelope = build(&BuildRequest {
            mode: GenerationMode::Img2Video,
            upstream_model: &upstream_model,
            prompt: req.prompt,
            negative_prompt: None,
            region: credential.region,
            ratio: req.ratio,
            resolution_tier: req.resolution_tier,
            sample_strength: req.sample_strength,
            seed: req.seed,
            intelligent_ratio: false,
            uploaded_image_uris: &uris,
            explicit_count: None,
            submit_id: new_id(),
            component_id: new_id(),
        })?;

        let policy = VideoPollPolicy::default();
        let urls = self
            .submit_and_poll(credential, envelope, 1, &policy, "generate_video", cancel, &mut on_progress)
            .await?;
        self.increment_quota_logged(&credential.session_id, ServiceType::Video).await;
        Ok(urls)
    }

    async fn check_quota(&self, session_id: &str, service: ServiceType) -> Result<(), GatewayError> {
        let check = self.quota.check(session_id, service).await?;
        if !check.allowed {
            return Err(GatewayError::QuotaExceeded {
                session: session_id.to_string(),
                service: service.as_str().to_string(),
                current: check.current,
                limit: check.limit,
            });
        }
        Ok(())
    }

    /// Increment-after-success is logged, never surfaced: the caller
    /// already has their result (spec §4.5 step 8, §7).
    async fn increment_quota_logged(&self, session_id: &str, service: ServiceType) {
        if let Err(err) = self.quota.increment(session_id, service).await {
            warn!(session_id = %session_id, service = service.as_str(), error = %err, "quota increment after success failed");
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn submit_and_poll(
        &self,
        credential: &Credential,
        envelope: gateway_payload::GenerationEnvelope,
        expected_item_count: usize,
        policy: &dyn PollIntervalPolicy,
        operation: &'static str,
        cancel: &CancellationToken,
        on_progress: &mut impl FnMut(u8),
    ) -> Result<Vec<String>, GatewayError> {
        let envelope_json = serde_json::to_value(&envelope)
            .map_err(|e| GatewayError::UpstreamProtocolError(format!("envelope serialization: {e}")))?;

        let history_id = self
            .upstream
            .submit(&credential.refresh_token, credential.region, envelope_json)
            .await?
            .ok_or_else(|| GatewayError::UpstreamProtocolError("submit returned no history_record_id".into()))?;
        info!(operation, session = %credential.session_id, history_id, "submitted to upstream");

        let deadline = poll_deadline(policy);
        let upstream = Arc::clone(&self.upstream);
        let refresh_token = credential.refresh_token.clone();
        let region = credential.region;
        let history_id_for_fetch = history_id.clone();

        let (record, summary) = poll_until_done(
            policy,
            &PollSpec {
                expected_item_count,
                deadline,
            },
            cancel,
            |p| on_progress(p),
            || {
                let upstream = Arc::clone(&upstream);
                let refresh_token = refresh_token.clone();
                let history_id = history_id_for_fetch.clone();
                async move {
                    let record = upstream.get_history(&refresh_token, region, &history_id).await?;
                    let status = PollStatus {
                        state: record.status.clone(),
                        fail_code: record.fail_code,
                        item_count: record.item_list.len(),
                        finish_time: record.task.finish_time,
                        correlation_id: None,
                    };
                    Ok(PollOutcome { status, data: record })
                }
            },
        )
        .await?;

        info!(
            operation,
            history_id,
            poll_count = summary.poll_count,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "generation completed"
        );

        let urls = record.asset_urls();
        if !record.item_list.is_empty() && urls.is_empty() {
            return Err(GatewayError::ResultExtractionFailed {
                item_count: record.item_list.len(),
            });
        }
        Ok(urls)
    }
}

fn poll_deadline(policy: &dyn PollIntervalPolicy) -> Duration {
    policy.steady_interval(1) * policy.max_poll_count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway_quota::ServiceLimits;
    use gateway_upload::transport::MockUploadTransport;
    use gateway_upstream::client::MockUpstreamClient;
    use serde_json::json;
    use tempfile::tempdir;

    fn credential(region: Region) -> Credential {
        Credential {
            region,
            session_id: "session_test".into(),
            refresh_token: "token".into(),
        }
    }

    async fn ledger() -> (Arc<QuotaLedger>, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let ledger = QuotaLedger::open(dir.path().join("usage.json"), ServiceLimits::default())
            .await
            .unwrap();
        (Arc::new(ledger), dir)
    }

    fn image_request() -> ImageRequest<'static> {
        ImageRequest {
            model: "jimeng-4.5",
            prompt: "sunset over mountains",
            negative_prompt: None,
            ratio: Some("16:9"),
            resolution_tier: Some("1080p"),
            sample_strength: 0.5,
            seed: 42,
            intelligent_ratio: false,
            explicit_count: None,
        }
    }

    fn completed_history(item_count: usize) -> gateway_upstream::HistoryRecord {
        let items = (0..item_count)
            .map(|i| gateway_upstream::models::HistoryItem {
                image_url: Some(format!("https://x/{i}.png")),
                video_url: None,
            })
            .collect();
        gateway_upstream::HistoryRecord {
            status: "success".into(),
            fail_code: 0,
            item_list: items,
            task: gateway_upstream::models::HistoryTask { finish_time: 1234 },
        }
    }

    #[tokio::test(start_paused = true)]
    async fn happy_path_text_to_image_returns_four_urls_and_increments_quota() {
        let (quota, _dir) = ledger().await;
        let upload = Arc::new(UploadPipeline::new(
            Arc::new(MockUploadTransport::new()),
            Arc::new(gateway_upload::RegionEndpoints::for_region),
        ));
        let mut upstream = MockUpstreamClient::new();
        upstream.expect_submit().returning(|_, _, _| Ok(Some("h1".into())));
        upstream
            .expect_get_history()
            .returning(|_, _, _| Ok(completed_history(4)));

        let controller = GenerationController::new(quota.clone(), upload, Arc::new(upstream));
        let cancel = CancellationToken::new();
        let urls = controller
            .generate_image(image_request(), &credential(Region::Cn), &cancel, |_| {})
            .await
            .unwrap();

        assert_eq!(urls.len(), 4);
        let check = quota.check("session_test", ServiceType::Image).await.unwrap();
        assert_eq!(check.current, 1);
    }

    #[tokio::test]
    async fn quota_exceeded_never_calls_upstream() {
        let (quota, _dir) = ledger().await;
        for _ in 0..10 {
            quota.increment("session_test", ServiceType::Image).await.unwrap();
        }
        let upload = Arc::new(UploadPipeline::new(
            Arc::new(MockUploadTransport::new()),
            Arc::new(gateway_upload::RegionEndpoints::for_region),
        ));
        let mut upstream = MockUpstreamClient::new();
        upstream.expect_submit().times(0);

        let controller = GenerationController::new(quota, upload, Arc::new(upstream));
        let cancel = CancellationToken::new();
        let err = controller
            .generate_image(image_request(), &credential(Region::Cn), &cancel, |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::QuotaExceeded { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn upstream_failure_does_not_increment_quota() {
        let (quota, _dir) = ledger().await;
        let upload = Arc::new(UploadPipeline::new(
            Arc::new(MockUploadTransport::new()),
            Arc::new(gateway_upload::RegionEndpoints::for_region),
        ));
        let mut upstream = MockUpstreamClient::new();
        upstream.expect_submit().returning(|_, _, _| Ok(Some("h1".into())));
        upstream.expect_get_history().returning(|_, _, _| {
            Ok(gateway_upstream::HistoryRecord {
                status: "failed".into(),
                fail_code: 5000,
                item_list: vec![],
                task: gateway_upstream::models::HistoryTask { finish_time: 0 },
            })
        });

        let controller = GenerationController::new(quota.clone(), upload, Arc::new(upstream));
        let cancel = CancellationToken::new();
        let err = controller
            .generate_image(image_request(), &credential(Region::Cn), &cancel, |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::UpstreamGenerationFailed { fail_code: 5000 }));
        let check = quota.check("session_test", ServiceType::Image).await.unwrap();
        assert_eq!(check.current, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn composition_uploads_images_before_submitting() {
        let (quota, _dir) = ledger().await;
        let mut transport = MockUploadTransport::new();
        transport.expect_acquire_token().returning(|_, _| {
            Ok(gateway_upload::sigv4::SigningCredentials {
                access_key: "ak".into(),
                secret_key: "sk".into(),
                session_token: "st".into(),
            })
        });
        transport.expect_apply().returning(|_, _, _, _, _| {
            Ok(gateway_upload::models::ApplyResponse {
                store_infos: vec![gateway_upload::models::StoreInfo {
                    store_uri: "store/abc".into(),
                    auth: "auth".into(),
                }],
                upload_hosts: vec!["https://upload.example.com".into()],
                session_key: "sk".into(),
            })
        });
        transport.expect_put_bytes().returning(|_, _, _, _, _| Ok(()));
        transport.expect_commit().returning(|_, _, _, _, _| {
            Ok(gateway_upload::models::CommitResponse {
                results: vec![gateway_upload::models::CommitResult {
                    uri_status: 2000,
                    uri: "tos-cn/in.png".into(),
                }],
            })
        });

        let upload = Arc::new(UploadPipeline::new(
            Arc::new(transport),
            Arc::new(gateway_upload::RegionEndpoints::for_region),
        ));
        let mut upstream = MockUpstreamClient::new();
        upstream.expect_submit().returning(|_, _, _| Ok(Some("h1".into())));
        upstream
            .expect_get_history()
            .returning(|_, _, _| Ok(completed_history(1)));

        let controller = GenerationController::new(quota, upload, Arc::new(upstream));
        let cancel = CancellationToken::new();
        let req = CompositionRequest {
            model: "jimeng-4.5",
            prompt: "blend these",
            negative_prompt: None,
            images: &[b"img-bytes".to_vec()],
            ratio: None,
            resolution_tier: None,
            sample_strength: 0.5,
            seed: 1,
            intelligent_ratio: false,
        };
        let urls = controller
            .generate_image_composition(req, &credential(Region::Cn), &cancel, |_| {})
            .await
            .unwrap();
        assert_eq!(urls, vec!["https://x/0.png".to_string()]);
    }

    #[tokio::test]
    async fn unsupported_model_fails_before_touching_quota_or_upstream() {
        let (quota, _dir) = ledger().await;
        let upload = Arc::new(UploadPipeline::new(
            Arc::new(MockUploadTransport::new()),
            Arc::new(gateway_upload::RegionEndpoints::for_region),
        ));
        let mut upstream = MockUpstreamClient::new();
        upstream.expect_submit().times(0);

        let controller = GenerationController::new(quota, upload, Arc::new(upstream));
        let cancel = CancellationToken::new();
        let mut req = image_request();
        req.model = "not-a-real-model";
        let err = controller
            .generate_image(req, &credential(Region::Us), &cancel, |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::UnsupportedModel { .. }));
    }
}
