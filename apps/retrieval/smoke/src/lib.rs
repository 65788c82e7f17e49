//! Retrieval Smoke Run
//!
//! Checks that an embedding model and a vector store are wired together correctly: connect,
//! create the collection if it is missing, seed it once, then answer a similarity query.
//!
//! ## Flow
//!
//! ```text
//! CLI flags + environment (settings.rs)
//!   ↓
//! StoreConfig::connect / EmbedderConfig::build
//!   ↓
//! RetrievalService::seed_and_query
//!   ↓
//! SmokeReport as JSON on stdout (logs on stderr)
//! ```
//!
//! ## Modules
//!
//! - `cli`: command line flags and the built-in sample records
//! - `settings`: backend selection from the environment
//! - `runner`: wiring and the smoke run itself

pub mod cli;
pub mod runner;
pub mod settings;

pub use cli::Cli;
pub use runner::{execute, run};
pub use settings::Settings;
