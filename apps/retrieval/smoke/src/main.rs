//! Retrieval Smoke Run - Entry Point
//!
//! Minimal entry point that delegates to the runner module.

#[tokio::main]
async fn main() -> eyre::Result<()> {
    retrieval_smoke::run().await
}
