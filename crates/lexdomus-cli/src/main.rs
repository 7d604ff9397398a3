mod display;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{ArgAction, Parser, Subcommand};
use lexdomus_core::{AnalysisRequest, Policy, RelevanceModel};
use lexdomus_engine::{Pipeline, filter};
use lexdomus_store::{Corpus, HybridRetriever, Ledger, RetrievalContext, VectorScorer, ledger};
use tracing::{info, warn};
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "lexdomus", version, about = "Source-required analysis of copyright clauses")]
struct Cli {
    /// Policy YAML (sources, thresholds, EEE gate)
    #[arg(long, env = "LEXDOMUS_POLICY", default_value = "policies/policy.yaml", global = true)]
    policy: PathBuf,

    /// Chunk corpus in JSONL
    #[arg(long, env = "LEXDOMUS_CORPUS", default_value = "data/corpus/chunks.jsonl", global = true)]
    corpus: PathBuf,

    /// Vector index: a `.jsonl` file of `{doc_id, vector}` or a LanceDB directory
    #[arg(long, env = "LEXDOMUS_VECTORS", global = true)]
    vectors: Option<PathBuf>,

    /// Directory holding one subdirectory per ONNX model
    #[arg(long, env = "LEXDOMUS_MODELS", default_value = "models", global = true)]
    models: PathBuf,

    /// Base URL of a remote `/rerank` service
    #[arg(long, env = "LEXDOMUS_RERANK_URL", global = true)]
    rerank_url: Option<String>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyse a clause; reads stdin when neither CLAUSE nor --file is given
    Analyze {
        clause: Option<String>,
        #[arg(long, conflicts_with = "clause")]
        file: Option<PathBuf>,
        /// ES, EU, US or INT
        #[arg(short, long, default_value = "ES")]
        jurisdiction: String,
        /// Append the result to this hash-chained ledger
        #[arg(long, env = "LEXDOMUS_LEDGER")]
        ledger: Option<PathBuf>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Rank corpus chunks for a query
    Search {
        query: String,
        /// Number of hits (defaults to the policy's top_k)
        #[arg(short)]
        k: Option<usize>,
        /// Drop chunks the policy would not admit as citations
        #[arg(long)]
        admissible: bool,
        #[arg(long)]
        json: bool,
    },
    /// Recompute every hash in a ledger and check the chain
    VerifyLedger {
        #[arg(env = "LEXDOMUS_LEDGER")]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
    info!("lexdomus v{}", env!("CARGO_PKG_VERSION"));

    match &cli.command {
        Command::Analyze {
            clause,
            file,
            jurisdiction,
            ledger,
            json,
        } => {
            let clause = read_clause(clause.as_deref(), file.as_deref())?;
            let policy = Policy::load_or_default(&cli.policy);
            let retriever = build_retriever(&cli, &policy).await;
            let context = Arc::new(RetrievalContext::new(retriever));

            let mut pipeline = Pipeline::standard(policy, context);
            if let Some(path) = ledger {
                let ledger = Ledger::open(path)
                    .with_context(|| format!("opening ledger {}", path.display()))?;
                pipeline = pipeline.with_ledger(Arc::new(ledger));
            }

            let result = pipeline
                .analyze(&AnalysisRequest::new(clause, jurisdiction.as_str()))
                .await?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print!("{}", display::analysis_card(&result));
            }
        }
        Command::Search {
            query,
            k,
            admissible,
            json,
        } => {
            let policy = Policy::load_or_default(&cli.policy);
            let retriever = build_retriever(&cli, &policy).await;
            let k = k.unwrap_or_else(|| policy.top_k());

            let mut hits = retriever.retrieve(query, k).await;
            if *admissible {
                hits = filter::filter(hits, &policy);
            }
            if *json {
                println!("{}", serde_json::to_string_pretty(&hits)?);
            } else {
                print!("{}", display::search_hits(query, &hits));
            }
        }
        Command::VerifyLedger { path } => {
            let count = ledger::verify(path)
                .with_context(|| format!("verifying ledger {}", path.display()))?;
            println!("{}: {count} records, chain intact", path.display());
        }
    }

    Ok(())
}

fn read_clause(clause: Option<&str>, file: Option<&Path>) -> anyhow::Result<String> {
    if let Some(clause) = clause {
        return Ok(clause.to_string());
    }
    if let Some(path) = file {
        return std::fs::read_to_string(path)
            .with_context(|| format!("reading clause from {}", path.display()));
    }
    let mut text = String::new();
    std::io::stdin()
        .read_to_string(&mut text)
        .context("reading clause from stdin")?;
    if text.trim().is_empty() {
        bail!("no clause given: pass CLAUSE, --file, or pipe text on stdin");
    }
    Ok(text)
}

/// Corpus plus whichever optional scorers this build and environment support.
/// An unreadable corpus leaves the retriever empty.
async fn build_retriever(cli: &Cli, policy: &Policy) -> HybridRetriever {
    let corpus = match Corpus::load_jsonl(&cli.corpus) {
        Ok(corpus) => corpus,
        Err(e) => {
            warn!(error = %e, path = %cli.corpus.display(), "unreadable corpus, using empty corpus");
            Corpus::empty()
        }
    };
    info!(chunks = corpus.len(), path = %cli.corpus.display(), "corpus ready");

    let mut retriever =
        HybridRetriever::new(Arc::new(corpus)).with_settings(&policy.rag.retrieval);
    if let Some(path) = &cli.vectors
        && let Some(scorer) = vector_scorer(&cli.models, path).await
    {
        retriever = retriever.with_vectors(scorer);
    }
    if let Some(model) = remote_reranker(cli).or_else(|| local_reranker(&cli.models)) {
        info!(model = model.name(), "reranking enabled");
        retriever = retriever.with_relevance_model(model);
    }
    retriever
}

#[cfg(feature = "onnx")]
async fn vector_scorer(models: &Path, path: &Path) -> Option<VectorScorer> {
    use lexdomus_ai::{DEFAULT_EMBEDDING_MODEL, Embedder};
    use lexdomus_core::TextEncoder;

    let encoder = match Embedder::load(&models.join(DEFAULT_EMBEDDING_MODEL)) {
        Ok(e) => Arc::new(e),
        Err(e) => {
            warn!(error = %e, "embedding model unavailable, lexical retrieval only");
            return None;
        }
    };
    let index = match open_vector_index(path).await {
        Ok(index) => index,
        Err(e) => {
            warn!(error = %e, path = %path.display(), "vector index unavailable, lexical retrieval only");
            return None;
        }
    };
    if index.dim() != encoder.dim() {
        warn!(
            index_dim = index.dim(),
            model_dim = encoder.dim(),
            "vector index does not match embedding model, lexical retrieval only"
        );
        return None;
    }
    info!(vectors = index.len(), dim = index.dim(), "vector index ready");
    Some(VectorScorer::new(encoder, index))
}

#[cfg(not(feature = "onnx"))]
async fn vector_scorer(_models: &Path, path: &Path) -> Option<VectorScorer> {
    warn!(path = %path.display(), "built without `onnx`, ignoring vector index");
    None
}

#[cfg(feature = "onnx")]
async fn open_vector_index(path: &Path) -> anyhow::Result<Arc<dyn lexdomus_store::VectorIndex>> {
    if path.extension().is_some_and(|ext| ext == "jsonl") {
        return Ok(Arc::new(lexdomus_store::FlatIndex::load_jsonl(path)?));
    }
    open_lance_index(path).await
}

#[cfg(all(feature = "onnx", feature = "lancedb"))]
async fn open_lance_index(path: &Path) -> anyhow::Result<Arc<dyn lexdomus_store::VectorIndex>> {
    Ok(Arc::new(lexdomus_store::LanceIndex::open(path).await?))
}

#[cfg(all(feature = "onnx", not(feature = "lancedb")))]
async fn open_lance_index(path: &Path) -> anyhow::Result<Arc<dyn lexdomus_store::VectorIndex>> {
    bail!(
        "{} is not a .jsonl vector file and this build has no `lancedb` feature",
        path.display()
    )
}

#[cfg(feature = "http")]
fn remote_reranker(cli: &Cli) -> Option<Arc<dyn RelevanceModel>> {
    let url = cli.rerank_url.as_ref()?;
    Some(Arc::new(lexdomus_ai::RemoteReranker::new(url.clone())))
}

#[cfg(not(feature = "http"))]
fn remote_reranker(cli: &Cli) -> Option<Arc<dyn RelevanceModel>> {
    if cli.rerank_url.is_some() {
        warn!("built without `http`, ignoring --rerank-url");
    }
    None
}

#[cfg(feature = "onnx")]
fn local_reranker(models: &Path) -> Option<Arc<dyn RelevanceModel>> {
    let dir = models.join(lexdomus_ai::DEFAULT_RERANK_MODEL);
    if !dir.exists() {
        return None;
    }
    match lexdomus_ai::CrossEncoder::load(&dir) {
        Ok(model) => Some(Arc::new(model)),
        Err(e) => {
            warn!(error = %e, "cross-encoder unavailable, using token-overlap rerank");
            None
        }
    }
}

#[cfg(not(feature = "onnx"))]
fn local_reranker(_models: &Path) -> Option<Arc<dyn RelevanceModel>> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn verbosity_and_globals() {
        let cli = Cli::try_parse_from([
            "lexdomus", "-vv", "search", "derechos morales", "-k", "3", "--corpus", "c.jsonl",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.corpus, PathBuf::from("c.jsonl"));
        assert!(matches!(cli.command, Command::Search { k: Some(3), .. }));
    }

    #[test]
    fn clause_and_file_conflict() {
        let parsed = Cli::try_parse_from(["lexdomus", "analyze", "texto", "--file", "c.txt"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn inline_clause_wins() {
        assert_eq!(read_clause(Some("cesión"), None).unwrap(), "cesión");
    }

    #[tokio::test]
    async fn missing_corpus_gives_empty_retriever() {
        let cli = Cli::try_parse_from([
            "lexdomus", "search", "x", "--corpus", "/nonexistent/chunks.jsonl",
        ])
        .unwrap();
        let retriever = build_retriever(&cli, &Policy::default()).await;
        assert!(retriever.corpus().is_empty());
        assert!(!retriever.has_vectors());
    }

    #[tokio::test]
    async fn unreadable_corpus_gives_empty_retriever() {
        // A directory opens but cannot be read as lines.
        let mut cli = Cli::try_parse_from(["lexdomus", "search", "x"]).unwrap();
        cli.corpus = std::env::temp_dir();
        let retriever = build_retriever(&cli, &Policy::default()).await;
        assert!(retriever.corpus().is_empty());
    }
}
