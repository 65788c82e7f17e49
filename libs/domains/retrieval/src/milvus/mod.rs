mod client;
mod config;

pub use client::MilvusStore;
pub use config::MilvusConfig;
