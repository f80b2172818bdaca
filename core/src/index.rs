use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub type DocId = String;

/// Frequency of one term in one document, plus that document's length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub term_frequency: u32,
    pub document_length: u32,
}

/// Every posting recorded for a single term, keyed by document id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TermPostingList {
    postings: BTreeMap<DocId, Posting>,
}

impl TermPostingList {
    pub fn new() -> Self { Self::default() }

    /// Insert or overwrite the posting for `document_id`. Last write wins.
    pub fn add_document_info(&mut self, document_id: &str, term_frequency: u32, document_length: u32) {
        let posting = Posting { term_frequency, document_length };
        match self.postings.get_mut(document_id) {
            Some(existing) => *existing = posting,
            None => {
                self.postings.insert(document_id.to_owned(), posting);
            }
        }
    }

    /// `None` when the document does not contain this term.
    pub fn get_document_info(&self, document_id: &str) -> Option<&Posting> {
        self.postings.get(document_id)
    }

    pub fn document_frequency(&self) -> usize { self.postings.len() }

    /// Ids of the documents containing the term, ascending.
    pub fn documents(&self) -> impl Iterator<Item = &str> + '_ {
        self.postings.keys().map(String::as_str)
    }

    /// Total occurrences of the term across the corpus.
    pub fn corpus_term_frequency(&self) -> u64 {
        self.postings.values().map(|p| p.term_frequency as u64).sum()
    }
}

/// In-memory inverted index over tokenized documents.
///
/// Derived statistics are kept current on every mutation: `corpus_size` is a
/// running total and document frequencies are read straight from the posting
/// maps, so a read after ingestion never sees an old value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorpusIndex {
    terms: HashMap<String, TermPostingList>,
    number_of_documents: u32,
    document_lengths: Vec<u32>,
    corpus_size: u64,
}

impl CorpusIndex {
    pub fn new() -> Self { Self::default() }

    pub fn number_of_documents(&self) -> u32 { self.number_of_documents }

    pub fn number_of_terms(&self) -> usize { self.terms.len() }

    pub fn is_empty(&self) -> bool { self.number_of_documents == 0 }

    /// Lengths in ingestion order.
    pub fn document_lengths(&self) -> &[u32] { &self.document_lengths }

    /// Sum of all document lengths.
    pub fn corpus_size(&self) -> Result<u64> {
        if self.is_empty() {
            return Err(CoreError::EmptyCorpus);
        }
        Ok(self.corpus_size)
    }

    pub fn average_document_length(&self) -> Result<f64> {
        let size = self.corpus_size()?;
        Ok(size as f64 / self.number_of_documents as f64)
    }

    pub fn term(&self, term: &str) -> Option<&TermPostingList> { self.terms.get(term) }

    /// 0 for terms never seen.
    pub fn document_frequency(&self, term: &str) -> usize {
        self.terms.get(term).map_or(0, TermPostingList::document_frequency)
    }

    pub fn terms(&self) -> impl Iterator<Item = (&str, &TermPostingList)> + '_ {
        self.terms.iter().map(|(t, list)| (t.as_str(), list))
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            number_of_documents: self.number_of_documents,
            number_of_terms: self.terms.len(),
            corpus_size: self.corpus_size,
            average_document_length: self.average_document_length().ok(),
        }
    }

    pub(crate) fn record_document_length(&mut self, document_length: u32) {
        self.number_of_documents += 1;
        self.document_lengths.push(document_length);
        self.corpus_size += document_length as u64;
    }

    /// Fetch or lazily create the posting list for `term`.
    pub(crate) fn term_mut(&mut self, term: &str) -> &mut TermPostingList {
        self.terms.entry(term.to_owned()).or_default()
    }
}

/// Corpus-level numbers reported by the CLI and the HTTP service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    pub number_of_documents: u32,
    pub number_of_terms: usize,
    pub corpus_size: u64,
    /// Absent while the corpus is empty.
    pub average_document_length: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn posting_list_last_write_wins() {
        let mut list = TermPostingList::new();
        list.add_document_info("a", 1, 10);
        list.add_document_info("b", 2, 5);
        list.add_document_info("a", 3, 12);
        assert_eq!(list.document_frequency(), 2);
        assert_eq!(list.get_document_info("a"), Some(&Posting { term_frequency: 3, document_length: 12 }));
        assert_eq!(list.corpus_term_frequency(), 5);
        assert!(list.get_document_info("missing").is_none());
    }

    #[test]
    fn document_frequency_tracks_inserts_after_read() {
        let mut list = TermPostingList::new();
        list.add_document_info("a", 1, 1);
        assert_eq!(list.document_frequency(), 1);
        list.add_document_info("b", 1, 1);
        assert_eq!(list.document_frequency(), 2);
        assert_eq!(list.documents().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn empty_index_has_no_average() {
        let index = CorpusIndex::new();
        assert_eq!(index.corpus_size(), Err(CoreError::EmptyCorpus));
        assert_eq!(index.average_document_length(), Err(CoreError::EmptyCorpus));
        assert_eq!(index.stats().average_document_length, None);
    }

    #[test]
    fn recorded_lengths_feed_the_aggregates() {
        let mut index = CorpusIndex::new();
        index.record_document_length(3);
        assert_eq!(index.average_document_length(), Ok(3.0));
        index.record_document_length(5);
        assert_eq!(index.number_of_documents(), 2);
        assert_eq!(index.document_lengths(), &[3, 5]);
        assert_eq!(index.corpus_size(), Ok(8));
        assert_eq!(index.average_document_length(), Ok(4.0));
    }
}
