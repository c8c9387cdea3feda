//! Wire types for the three-step upload handshake (spec §4.2, §6).

use serde::{Deserialize, Serialize};

/// Temporary credentials returned by `POST /mweb/v1/get_upload_token`.
#[derive(Clone, Debug, Deserialize)]
pub struct UploadToken {
    pub access_key: String,
    pub secret_key: String,
    pub session_token: String,
    pub service_id: String,
}

/// One candidate store location returned by `ApplyImageUpload`.
#[derive(Clone, Debug, Deserialize)]
pub struct StoreInfo {
    #[serde(rename = "StoreUri")]
    pub store_uri: String,
    #[serde(rename = "Auth")]
    pub auth: String,
}

/// The `ApplyImageUpload` response.
#[derive(Clone, Debug, Deserialize)]
pub struct ApplyResponse {
    #[serde(rename = "StoreInfos")]
    pub store_infos: Vec<StoreInfo>,
    #[serde(rename = "UploadHosts")]
    pub upload_hosts: Vec<String>,
    #[serde(rename = "SessionKey")]
    pub session_key: String,
}

/// One result entry from `CommitImageUpload`.
#[derive(Clone, Debug, Deserialize)]
pub struct CommitResult {
    #[serde(rename = "UriStatus")]
    pub uri_status: i64,
    #[serde(rename = "Uri")]
    pub uri: String,
}

/// The `CommitImageUpload` response.
#[derive(Clone, Debug, Deserialize)]
pub struct CommitResponse {
    #[serde(rename = "Results")]
    pub results: Vec<CommitResult>,
}

/// The body sent to `CommitImageUpload`.
#[derive(Clone, Debug, Serialize)]
pub struct CommitRequest {
    #[serde(rename = "SessionKey")]
    pub session_key: String,
}

/// `UriStatus` value meaning the upload finalized successfully.
pub const URI_STATUS_OK: i64 = 2000;

/// An opaque URI the upstream blob store returned for a committed
/// upload, bound to the credential that uploaded it (spec §3).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedAsset {
    pub uri: String,
}
