//! The upstream HTTP boundary the pipeline drives, abstracted behind a
//! trait so tests exercise retry/pacing logic with a fake instead of a
//! live network call (spec §12).

use crate::models::{ApplyResponse, CommitResponse};
use crate::sigv4::SigningCredentials;
use async_trait::async_trait;
use gateway_gax::GatewayError;
use gateway_session::Region;

/// The four upstream calls the upload pipeline makes, one method each.
#[cfg_attr(any(test, feature = "test-util"), mockall::automock)]
#[async_trait]
pub trait UploadTransport: Send + Sync {
    /// `POST /mweb/v1/get_upload_token`. Not retried (spec §4.2 step 2).
    async fn acquire_token(
        &self,
        refresh_token: &str,
        region: Region,
    ) -> Result<SigningCredentials, GatewayError>;

    /// Signed `GET ApplyImageUpload`.
    async fn apply(
        &self,
        refresh_token: &str,
        region: Region,
        credentials: &SigningCredentials,
        service_id: &str,
        file_size: usize,
    ) -> Result<ApplyResponse, GatewayError>;

    /// `POST upload/v1/{StoreUri}` with the raw bytes.
    async fn put_bytes(
        &self,
        upload_host: &str,
        store_uri: &str,
        authorization: &str,
        crc32: u32,
        bytes: &[u8],
    ) -> Result<(), GatewayError>;

    /// Signed `POST CommitImageUpload`.
    async fn commit(
        &self,
        refresh_token: &str,
        region: Region,
        credentials: &SigningCredentials,
        service_id: &str,
        session_key: &str,
    ) -> Result<CommitResponse, GatewayError>;
}
