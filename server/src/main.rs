use anyhow::Result;
use axum::Router;
use clap::Parser;
use search_core::{Bm25Params, TextProcessor};
use server::{build_app, ServerConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// JSON/JSONL file or directory to index at startup
    #[arg(long)]
    input: Option<PathBuf>,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
    /// BM25 term frequency saturation
    #[arg(long, default_value_t = search_core::ranker::DEFAULT_K1)]
    k1: f64,
    /// BM25 document length normalization
    #[arg(long, default_value_t = search_core::ranker::DEFAULT_B)]
    b: f64,
    /// Text processing pipeline: basic, stopwords, stem, lemmatize
    #[arg(long, default_value_t = TextProcessor::Lemmatize)]
    tokenizer: TextProcessor,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let config = ServerConfig {
        input: args.input,
        params: Bm25Params::new(args.k1, args.b)?,
        tokenizer: args.tokenizer,
        admin_token: std::env::var("ADMIN_TOKEN").ok(),
        cors_allow_origin: std::env::var("CORS_ALLOW_ORIGIN").ok(),
    };
    let app: Router = build_app(config)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
