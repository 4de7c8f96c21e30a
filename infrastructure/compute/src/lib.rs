mod auth;
mod client;
mod dto;

pub use auth::BatchCredential;
pub use client::BatchRestClient;
