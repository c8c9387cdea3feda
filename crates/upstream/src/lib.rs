//! The shared upstream client used by the Generation Controller to
//! submit drafts and poll their history records.

pub mod client;
pub mod models;

pub use client::{ReqwestUpstreamClient, UpstreamClient};
pub use models::{GenerateResponse, HistoryRecord};
