//! In-memory inverted index and BM25 ranking.

pub mod engine;
pub mod error;
pub mod index;
pub mod indexer;
pub mod ranker;
pub mod source;
pub mod tokenizer;

pub use engine::SearchEngine;
pub use error::CoreError;
pub use index::{CorpusIndex, DocId, IndexStats, Posting, TermPostingList};
pub use ranker::{Bm25Params, ScoredDocument, TopHits};
pub use tokenizer::{TextProcessor, Tokenizer};
