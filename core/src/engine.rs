//! Shared search engine with copy-on-write index swaps.
//!
//! Writers are serialized by a mutex, clone the current index, apply their
//! changes to the clone and publish it with a single pointer swap. Readers only
//! hold the read lock long enough to clone the `Arc`, so a search always runs
//! against one complete index version.

use crate::error::Result;
use crate::index::{CorpusIndex, IndexStats};
use crate::indexer::{process_batch, process_document};
use crate::ranker::{rank_documents, top_k, Bm25Params, ScoredDocument, TopHits};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

pub struct SearchEngine {
    current: RwLock<Arc<CorpusIndex>>,
    writer: Mutex<()>,
    params: Bm25Params,
}

impl Default for SearchEngine {
    fn default() -> Self { Self::new(Bm25Params::default()) }
}

impl SearchEngine {
    pub fn new(params: Bm25Params) -> Self {
        Self::with_index(CorpusIndex::new(), params)
    }

    pub fn with_index(index: CorpusIndex, params: Bm25Params) -> Self {
        Self { current: RwLock::new(Arc::new(index)), writer: Mutex::new(()), params }
    }

    /// The index version searches currently read from.
    pub fn snapshot(&self) -> Arc<CorpusIndex> {
        self.current.read().clone()
    }

    pub fn stats(&self) -> IndexStats { self.snapshot().stats() }

    pub fn ingest<S: AsRef<str>>(&self, document_id: &str, tokens: &[S]) -> Result<()> {
        self.update(|index| process_document(index, document_id, tokens))
    }

    /// Ingest several documents and publish them together.
    pub fn ingest_batch<I, S>(&self, documents: &[(I, Vec<S>)]) -> Result<()>
    where
        I: AsRef<str>,
        S: AsRef<str>,
    {
        self.update(|index| process_batch(index, documents))
    }

    /// Replace the whole index with one built from `documents`.
    pub fn rebuild<I, S>(&self, documents: &[(I, Vec<S>)]) -> Result<()>
    where
        I: AsRef<str>,
        S: AsRef<str>,
    {
        let mut fresh = CorpusIndex::new();
        process_batch(&mut fresh, documents)?;
        let _guard = self.writer.lock();
        *self.current.write() = Arc::new(fresh);
        tracing::info!(num_docs = documents.len(), "index rebuilt");
        Ok(())
    }

    /// Drop every document.
    pub fn reset(&self) {
        let _guard = self.writer.lock();
        *self.current.write() = Arc::new(CorpusIndex::new());
    }

    pub fn search<S: AsRef<str>>(&self, query_tokens: &[S]) -> Result<Vec<ScoredDocument>> {
        let index = self.snapshot();
        rank_documents(query_tokens, &index, &self.params)
    }

    /// Search and keep only the best `k` hits.
    pub fn search_top_k<S: AsRef<str>>(&self, query_tokens: &[S], k: usize) -> Result<TopHits> {
        let index = self.snapshot();
        top_k(query_tokens, &index, &self.params, k)
    }

    fn update<F>(&self, apply: F) -> Result<()>
    where
        F: FnOnce(&mut CorpusIndex) -> Result<()>,
    {
        let _guard = self.writer.lock();
        let mut next = CorpusIndex::clone(&self.snapshot());
        apply(&mut next)?;
        *self.current.write() = Arc::new(next);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    #[test]
    fn empty_engine_reports_empty_corpus() {
        let engine = SearchEngine::default();
        assert_eq!(engine.search(&["fox"]).unwrap_err(), CoreError::EmptyCorpus);
    }

    #[test]
    fn search_top_k_reports_total_matches() {
        let engine = SearchEngine::default();
        engine.ingest("A", &["fox", "den"]).unwrap();
        engine.ingest("B", &["fox", "fox"]).unwrap();
        engine.ingest("C", &["owl"]).unwrap();
        let top = engine.search_top_k(&["fox"], 1).unwrap();
        assert_eq!(top.total_hits, 2);
        assert_eq!(top.results.len(), 1);
        assert_eq!(top.results[0], engine.search(&["fox"]).unwrap()[0]);
    }

    #[test]
    fn snapshots_are_isolated_from_later_writes() {
        let engine = SearchEngine::default();
        engine.ingest("A", &["the", "quick", "fox"]).unwrap();
        let before = engine.snapshot();
        engine.ingest("B", &["the", "lazy", "dog"]).unwrap();
        assert_eq!(before.number_of_documents(), 1);
        assert_eq!(engine.snapshot().number_of_documents(), 2);
        assert_eq!(engine.snapshot().document_frequency("the"), 2);
    }

    #[test]
    fn failed_batch_publishes_nothing() {
        let engine = SearchEngine::default();
        engine.ingest("A", &["x"]).unwrap();
        let batch = vec![("B".to_string(), vec!["y"]), (" ".to_string(), vec!["z"])];
        assert!(engine.ingest_batch(&batch).is_err());
        assert_eq!(engine.stats().number_of_documents, 1);
        assert_eq!(engine.snapshot().document_frequency("y"), 0);
    }

    #[test]
    fn rebuild_replaces_wholesale() {
        let engine = SearchEngine::default();
        engine.ingest("old", &["stale"]).unwrap();
        engine.rebuild(&[("new", vec!["fresh", "text"])]).unwrap();
        let index = engine.snapshot();
        assert_eq!(index.number_of_documents(), 1);
        assert_eq!(index.document_frequency("stale"), 0);
        assert_eq!(index.document_frequency("fresh"), 1);
        engine.reset();
        assert!(engine.snapshot().is_empty());
    }

    #[test]
    fn concurrent_readers_see_whole_versions() {
        let engine = Arc::new(SearchEngine::default());
        engine.ingest("seed", &["alpha"]).unwrap();
        std::thread::scope(|s| {
            let writer = engine.clone();
            s.spawn(move || {
                for i in 0..50 {
                    writer.ingest(&format!("doc{i}"), &["alpha", "beta"]).unwrap();
                }
            });
            for _ in 0..4 {
                let reader = engine.clone();
                s.spawn(move || {
                    for _ in 0..50 {
                        let index = reader.snapshot();
                        let lengths: u64 = index.document_lengths().iter().map(|&l| l as u64).sum();
                        assert_eq!(index.number_of_documents() as usize, index.document_lengths().len());
                        assert_eq!(index.corpus_size().unwrap(), lengths);
                    }
                });
            }
        });
        assert_eq!(engine.stats().number_of_documents, 51);
    }
}
