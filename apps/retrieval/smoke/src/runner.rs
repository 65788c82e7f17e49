//! Smoke run wiring
//!
//! - Tracing and color-eyre initialization
//! - Store connection and embedder construction
//! - The seed-and-query run, reported as JSON on stdout

use clap::Parser;
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_retrieval::{EmbedderConfig, RetrievalService, SmokeReport, StoreConfig};
use eyre::{Result, WrapErr};
use tracing::info;

use crate::cli::{Cli, load_records};
use crate::settings::Settings;

/// Run the smoke binary
///
/// Logs go to stderr so stdout carries only the report.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the store is unreachable, or any pipeline
/// step fails.
pub async fn run() -> Result<()> {
    install_color_eyre();

    let cli = Cli::parse();
    let settings = Settings::resolve(&cli).wrap_err("Failed to load settings")?;
    init_tracing(&settings.environment);

    let report = execute(&cli, &settings).await?;

    let json = if cli.pretty {
        serde_json::to_string_pretty(&report)
    } else {
        serde_json::to_string(&report)
    }
    .wrap_err("Failed to serialize report")?;
    println!("{}", json);

    Ok(())
}

/// Connect, seed if needed and query, returning the report instead of printing it.
pub async fn execute(cli: &Cli, settings: &Settings) -> Result<SmokeReport> {
    let store = StoreConfig::for_backend(settings.store)
        .wrap_err("Failed to load vector store configuration")?
        .connect()
        .await
        .wrap_err_with(|| format!("Failed to connect to {} vector store", settings.store))?;
    info!(backend = %store.backend(), "Vector store ready");

    let embedder = EmbedderConfig::for_provider(settings.embedder)
        .and_then(EmbedderConfig::build)
        .wrap_err("Failed to configure embedding provider")?;

    let records = load_records(cli.records.as_deref())?;
    let service = RetrievalService::new(store, embedder);
    let spec = service.collection_spec(cli.collection.as_str());

    let report = service
        .seed_and_query(&spec, &records, &cli.query, cli.top_k, cli.consistency)
        .await
        .wrap_err_with(|| format!("Smoke run against collection '{}' failed", spec.name))?;

    info!(
        status = report.status.as_str(),
        results = report.results.len(),
        "Smoke run complete"
    );
    Ok(report)
}
