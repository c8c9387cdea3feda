//! The Generation Controller: the single place that turns a parsed
//! credential and a generation request into upstream calls, gluing
//! together region/model resolution, the quota ledger, the upload
//! pipeline, the payload builder, the upstream client, and the smart
//! poller (spec §4.5).

pub mod controller;
pub mod model_registry;
pub mod request;

pub use controller::GenerationController;
pub use model_registry::{available_models, ModelInfo, ModelKind};
pub use request::{CompositionRequest, ImageRequest, VideoRequest};
