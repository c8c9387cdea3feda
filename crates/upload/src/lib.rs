//! The upload pipeline: acquires signed upstream credentials, uploads
//! bytes to the blob store, and commits the result to an opaque URI.

pub mod models;
pub mod pipeline;
pub mod region;
pub mod sigv4;
pub mod transport;
pub mod transport_http;

pub use models::UploadedAsset;
pub use pipeline::{UploadPipeline, INTER_UPLOAD_PAUSE};
pub use region::RegionEndpoints;
pub use transport::UploadTransport;
pub use transport_http::ReqwestUploadTransport;
