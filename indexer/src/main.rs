use anyhow::Result;
use clap::{Parser, Subcommand};
use search_core::source::{index_documents, load_documents};
use search_core::tokenizer::{TextProcessor, Tokenizer};
use search_core::{Bm25Params, ScoredDocument, SearchEngine};
use serde::Serialize;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build an in-memory BM25 index from JSON/JSONL documents and query it", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index the input and print corpus statistics
    Stats {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        /// Text processing pipeline: basic, stopwords, stem, lemmatize
        #[arg(long, default_value_t = TextProcessor::Lemmatize)]
        tokenizer: TextProcessor,
    },
    /// Index the input and print the best matches for a query
    Search {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        /// Free-text query
        #[arg(long)]
        query: String,
        /// Number of results to print
        #[arg(long, default_value_t = 10)]
        k: usize,
        /// Term frequency saturation
        #[arg(long, default_value_t = search_core::ranker::DEFAULT_K1)]
        k1: f64,
        /// Document length normalization
        #[arg(long, default_value_t = search_core::ranker::DEFAULT_B)]
        b: f64,
        /// Text processing pipeline: basic, stopwords, stem, lemmatize
        #[arg(long, default_value_t = TextProcessor::Lemmatize)]
        tokenizer: TextProcessor,
    },
}

#[derive(Serialize)]
struct SearchOutput<'a> {
    query: &'a str,
    terms: Vec<String>,
    total_hits: usize,
    results: Vec<ScoredDocument>,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Stats { input, tokenizer } => {
            let engine = build_engine(&input, Bm25Params::default(), tokenizer)?;
            println!("{}", serde_json::to_string_pretty(&engine.stats())?);
            Ok(())
        }
        Commands::Search { input, query, k, k1, b, tokenizer } => {
            let params = Bm25Params::new(k1, b)?;
            let engine = build_engine(&input, params, tokenizer)?;
            run_search(&engine, &query, k, tokenizer)
        }
    }
}

fn build_engine(input: &str, params: Bm25Params, tokenizer: TextProcessor) -> Result<SearchEngine> {
    let docs = load_documents(input)?;
    let engine = SearchEngine::new(params);
    index_documents(&engine, &docs, &tokenizer)?;
    let stats = engine.stats();
    tracing::info!(num_docs = stats.number_of_documents, num_terms = stats.number_of_terms, %tokenizer, "index build complete");
    Ok(engine)
}

fn run_search(engine: &SearchEngine, query: &str, k: usize, tokenizer: TextProcessor) -> Result<()> {
    let terms = tokenizer.tokenize(query);
    let top = engine.search_top_k(&terms, k.max(1))?;
    let out = SearchOutput { query, terms, total_hits: top.total_hits, results: top.results };
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
