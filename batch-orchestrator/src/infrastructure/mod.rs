pub mod config;
pub mod console;
pub mod secret;
pub mod service_provider;
pub mod telemetry;
