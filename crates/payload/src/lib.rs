//! The payload builder: pure construction of upstream request envelopes
//! for each generation mode, plus the resolution-resolution rules and
//! multi-image intent detection it depends on.

pub mod builder;
pub mod models;
pub mod multi_image;
pub mod resolution;

pub use builder::{build, BuildRequest, GenerationMode};
pub use models::GenerationEnvelope;
