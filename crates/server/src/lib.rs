//! The gateway's HTTP surface and supporting application layer: wire
//! DTOs, auth extraction, layered config, logging, task/controller
//! bridging, and the axum router — everything the `gateway` binary
//! needs to construct and serve (spec §4.9, §4.10).

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod files;
pub mod handlers;
pub mod logging;
pub mod router;
pub mod runners;
pub mod state;

pub use config::GatewayConfig;
pub use error::ApiError;
pub use state::AppState;
