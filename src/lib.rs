// Shared infrastructure
pub mod config;
pub mod error;
pub mod metrics;

// Domain layer
pub mod store;
pub mod template;

// Application layer
pub mod api;
pub mod server;
