use std::path::{Path, PathBuf};

use clap::Parser;
use domain_retrieval::{ConsistencyLevel, EmbeddingProviderType, StoreBackend, TextRecord};
use eyre::{Result, WrapErr};

#[derive(Debug, Clone, Parser)]
#[command(name = "retrieval-smoke")]
#[command(about = "Embed sample text, store it in a vector database and query it back")]
pub struct Cli {
    /// Collection to create (if missing) and query
    #[arg(long, default_value = "test_collection")]
    pub collection: String,

    /// Query text
    #[arg(short, long, default_value = "Who was Alan Turing?")]
    pub query: String,

    /// Number of results to return
    #[arg(short = 'k', long, default_value_t = 2)]
    pub top_k: usize,

    /// Read consistency: Strong, Session, Bounded or Eventually
    #[arg(long, default_value = "Eventually")]
    pub consistency: ConsistencyLevel,

    /// Vector store backend (milvus, qdrant, memory). Overrides VECTOR_STORE.
    #[arg(long)]
    pub store: Option<StoreBackend>,

    /// Embedding provider (openai, hashing). Overrides EMBEDDING_PROVIDER.
    #[arg(long)]
    pub embedder: Option<EmbeddingProviderType>,

    /// JSON file with `[{"text": ..., "subject": ...}]` records to seed instead of the samples
    #[arg(long)]
    pub records: Option<PathBuf>,

    /// Pretty-print the JSON report
    #[arg(long)]
    pub pretty: bool,
}

/// Seed documents used when no records file is given.
pub fn sample_records() -> Vec<TextRecord> {
    [
        "Artificial intelligence was founded as an academic discipline in 1956.",
        "Alan Turing was the first person to conduct substantial research in AI.",
        "Born in Maida Vale, London, Turing was raised in southern England.",
    ]
    .into_iter()
    .map(|text| TextRecord::new(text, "ai"))
    .collect()
}

pub fn load_records(path: Option<&Path>) -> Result<Vec<TextRecord>> {
    let Some(path) = path else {
        return Ok(sample_records());
    };

    let raw = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read records file {}", path.display()))?;
    serde_json::from_str(&raw)
        .wrap_err_with(|| format!("Failed to parse records file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["retrieval-smoke"]);
        assert_eq!(cli.collection, "test_collection");
        assert_eq!(cli.query, "Who was Alan Turing?");
        assert_eq!(cli.top_k, 2);
        assert_eq!(cli.consistency, ConsistencyLevel::Eventually);
        assert!(cli.store.is_none());
        assert!(cli.embedder.is_none());
        assert!(!cli.pretty);
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::parse_from([
            "retrieval-smoke",
            "--store",
            "memory",
            "--embedder",
            "hashing",
            "--consistency",
            "strong",
            "-k",
            "5",
            "--pretty",
        ]);
        assert_eq!(cli.store, Some(StoreBackend::Memory));
        assert_eq!(cli.embedder, Some(EmbeddingProviderType::Hashing));
        assert_eq!(cli.consistency, ConsistencyLevel::Strong);
        assert_eq!(cli.top_k, 5);
        assert!(cli.pretty);
    }

    #[test]
    fn test_rejects_unknown_store() {
        assert!(Cli::try_parse_from(["retrieval-smoke", "--store", "faiss"]).is_err());
    }

    #[test]
    fn test_sample_records() {
        let records = sample_records();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.subject == "ai"));
    }

    #[test]
    fn test_load_records_from_file() {
        let path = std::env::temp_dir().join(format!("retrieval-smoke-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"[{"text": "Rust was first released in 2015.", "subject": "rust"}]"#,
        )
        .unwrap();

        let records = load_records(Some(&path)).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(
            records,
            vec![TextRecord::new("Rust was first released in 2015.", "rust")]
        );
    }

    #[test]
    fn test_load_records_missing_file() {
        let err = load_records(Some(Path::new("/nonexistent/records.json"))).unwrap_err();
        assert!(err.to_string().contains("records file"));
    }
}
