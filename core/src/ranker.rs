//! BM25 ranking over a [`CorpusIndex`].
//!
//! ```text
//! idf(n, N)   = ln((N - n + 0.5) / (n + 0.5))
//! length_norm = (1 - b) + b * (dl / avgdl)
//! score       = tf / (k1 * length_norm + tf) * idf
//! ```
//!
//! `idf` goes negative for terms present in more than half the corpus and is
//! never clamped.

use crate::error::{CoreError, Result};
use crate::index::{CorpusIndex, DocId, Posting};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

pub const DEFAULT_K1: f64 = 2.0;
pub const DEFAULT_B: f64 = 0.8;

/// Tunable BM25 constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bm25Params {
    /// Term-frequency saturation.
    pub k1: f64,
    /// Document-length normalization strength, 0 (none) to 1 (full).
    pub b: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: DEFAULT_K1, b: DEFAULT_B }
    }
}

impl Bm25Params {
    pub fn new(k1: f64, b: f64) -> Result<Self> {
        let params = Self { k1, b };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.k1.is_finite() || self.k1 < 0.0 {
            return Err(CoreError::InvalidParameter(format!("k1 must be finite and >= 0, got {}", self.k1)));
        }
        if !self.b.is_finite() || !(0.0..=1.0).contains(&self.b) {
            return Err(CoreError::InvalidParameter(format!("b must be within [0, 1], got {}", self.b)));
        }
        Ok(())
    }

    /// Score of one (term, document) pair. `n` documents out of `total` contain the term.
    pub fn term_score(&self, posting: &Posting, n: usize, total: u32, avgdl: f64) -> f64 {
        let tf = posting.term_frequency as f64;
        let dl = posting.document_length as f64;
        // avgdl is 0 only when every document is empty, in which case no posting exists.
        let relative_length = if avgdl > 0.0 { dl / avgdl } else { 1.0 };
        let length_norm = (1.0 - self.b) + self.b * relative_length;
        let saturation = self.k1 * length_norm + tf;
        if saturation == 0.0 {
            return 0.0;
        }
        (tf / saturation) * idf(n, total)
    }
}

pub fn idf(n: usize, total: u32) -> f64 {
    let n = n as f64;
    let total = total as f64;
    ((total - n + 0.5) / (n + 0.5)).ln()
}

/// One ranked hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub doc_id: DocId,
    pub score: f64,
}

/// Rank every document sharing at least one term with the query.
///
/// Repeated query terms count once per occurrence. Terms unknown to the index
/// contribute nothing. Results are ordered by descending score, ties by
/// ascending document id.
pub fn rank_documents<S: AsRef<str>>(query_tokens: &[S], index: &CorpusIndex, params: &Bm25Params) -> Result<Vec<ScoredDocument>> {
    let avgdl = index.average_document_length()?;
    let total = index.number_of_documents();

    let mut query_tf: HashMap<&str, u32> = HashMap::new();
    for token in query_tokens {
        *query_tf.entry(token.as_ref()).or_insert(0) += 1;
    }

    let mut candidates: BTreeSet<&str> = BTreeSet::new();
    for term in query_tf.keys() {
        if let Some(list) = index.term(term) {
            candidates.extend(list.documents());
        }
    }

    let mut scored: Vec<ScoredDocument> = Vec::with_capacity(candidates.len());
    for doc_id in candidates {
        let mut total_score = 0.0;
        for (term, multiplicity) in query_tf.iter() {
            let Some(list) = index.term(term) else { continue };
            let Some(posting) = list.get_document_info(doc_id) else { continue };
            let score = params.term_score(posting, list.document_frequency(), total, avgdl);
            total_score += score * *multiplicity as f64;
        }
        scored.push(ScoredDocument { doc_id: doc_id.to_owned(), score: total_score });
    }

    sort_by_score(&mut scored);
    tracing::debug!(query_terms = query_tf.len(), hits = scored.len(), "ranked documents");
    Ok(scored)
}

/// Descending score, ascending id on ties.
pub fn sort_by_score(hits: &mut [ScoredDocument]) {
    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.doc_id.cmp(&b.doc_id))
    });
}

/// The best `k` hits of a ranking, plus how many documents matched in total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopHits {
    pub total_hits: usize,
    pub results: Vec<ScoredDocument>,
}

/// Rank and keep the best `k`.
pub fn top_k<S: AsRef<str>>(query_tokens: &[S], index: &CorpusIndex, params: &Bm25Params, k: usize) -> Result<TopHits> {
    let mut results = rank_documents(query_tokens, index, params)?;
    let total_hits = results.len();
    results.truncate(k);
    Ok(TopHits { total_hits, results })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::process_document;

    fn build_corpus() -> CorpusIndex {
        let mut idx = CorpusIndex::new();
        process_document(&mut idx, "0", &["rust", "programming", "systems", "language", "fast"]).unwrap();
        process_document(&mut idx, "1", &["python", "programming", "scripting", "easy"]).unwrap();
        process_document(&mut idx, "2", &["java", "enterprise", "programming", "verbose"]).unwrap();
        process_document(&mut idx, "3", &["rust", "memory", "safety", "zero", "cost"]).unwrap();
        process_document(&mut idx, "4", &["haskell", "functional", "programming"]).unwrap();
        idx
    }

    #[test]
    fn idf_is_negative_for_common_terms() {
        assert!(idf(1, 10) > 0.0);
        assert!(idf(9, 10) < 0.0);
        assert_eq!(idf(2, 4), (2.5f64 / 2.5).ln());
    }

    #[test]
    fn term_score_matches_formula() {
        let params = Bm25Params::default();
        let posting = Posting { term_frequency: 2, document_length: 6 };
        let expected = {
            let norm = (1.0 - 0.8) + 0.8 * (6.0 / 4.0);
            (2.0 / (2.0 * norm + 2.0)) * ((10.0 - 3.0 + 0.5f64) / 3.5).ln()
        };
        let got = params.term_score(&posting, 3, 10, 4.0);
        assert!((got - expected).abs() < 1e-12);
    }

    #[test]
    fn rejects_out_of_range_params() {
        assert!(Bm25Params::new(1.2, 0.75).is_ok());
        assert!(Bm25Params::new(-1.0, 0.5).is_err());
        assert!(Bm25Params::new(1.0, 1.5).is_err());
        assert!(Bm25Params::new(f64::NAN, 0.5).is_err());
    }

    #[test]
    fn finds_matching_docs() {
        let idx = build_corpus();
        let hits = rank_documents(&["rust"], &idx, &Bm25Params::default()).unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.doc_id.as_str()).collect();
        assert_eq!(ids, vec!["0", "3"]);
        assert!(hits.iter().all(|h| h.score > 0.0));
    }

    #[test]
    fn higher_tf_ranks_first() {
        let mut idx = CorpusIndex::new();
        process_document(&mut idx, "0", &["rust", "rust", "rust"]).unwrap();
        process_document(&mut idx, "1", &["rust", "programming"]).unwrap();
        process_document(&mut idx, "2", &["go", "programming"]).unwrap();
        process_document(&mut idx, "3", &["zig", "language"]).unwrap();
        process_document(&mut idx, "4", &["c", "language"]).unwrap();
        let hits = rank_documents(&["rust"], &idx, &Bm25Params::default()).unwrap();
        assert_eq!(hits[0].doc_id, "0");
    }

    #[test]
    fn repeated_query_terms_multiply() {
        let idx = build_corpus();
        let params = Bm25Params::default();
        let once = rank_documents(&["memory"], &idx, &params).unwrap();
        let twice = rank_documents(&["memory", "memory"], &idx, &params).unwrap();
        assert!((twice[0].score - 2.0 * once[0].score).abs() < 1e-12);
    }

    #[test]
    fn ties_break_by_document_id() {
        let mut idx = CorpusIndex::new();
        process_document(&mut idx, "b", &["x", "y"]).unwrap();
        process_document(&mut idx, "a", &["x", "y"]).unwrap();
        process_document(&mut idx, "c", &["z", "w"]).unwrap();
        let hits = rank_documents(&["x"], &idx, &Bm25Params::default()).unwrap();
        assert_eq!(hits[0].score, hits[1].score);
        assert_eq!(hits[0].doc_id, "a");
        assert_eq!(hits[1].doc_id, "b");
    }

    #[test]
    fn empty_index_is_an_error() {
        let idx = CorpusIndex::new();
        let err = rank_documents(&["rust"], &idx, &Bm25Params::default()).unwrap_err();
        assert_eq!(err, CoreError::EmptyCorpus);
    }

    #[test]
    fn top_k_truncates() {
        let idx = build_corpus();
        let top = top_k(&["programming"], &idx, &Bm25Params::default(), 2).unwrap();
        assert_eq!(top.total_hits, 4);
        assert_eq!(top.results.len(), 2);
        let all = rank_documents(&["programming"], &idx, &Bm25Params::default()).unwrap();
        assert_eq!(top.results, all[..2]);
    }
}
