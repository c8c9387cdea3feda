pub mod batch;
pub mod chat;
pub mod health;
pub mod images;
pub mod models;
pub mod tasks;
pub mod usage;
pub mod videos;
