use crate::error::{CoreError, Result};
use crate::index::CorpusIndex;
use std::collections::HashMap;

/// Reject input that must never reach the index.
pub fn validate_document<S: AsRef<str>>(document_id: &str, tokens: &[S]) -> Result<()> {
    if document_id.trim().is_empty() {
        return Err(CoreError::InvalidDocument("document id must not be blank".into()));
    }
    if u32::try_from(tokens.len()).is_err() {
        return Err(CoreError::InvalidDocument(format!("document {document_id} has too many tokens")));
    }
    Ok(())
}

/// Ingest one tokenized document.
///
/// Tokens are counted as given: case-sensitive, no further normalization.
/// Re-ingesting an id counts as another document and overwrites that id's
/// postings only for the terms it now contains.
pub fn process_document<S: AsRef<str>>(index: &mut CorpusIndex, document_id: &str, tokens: &[S]) -> Result<()> {
    validate_document(document_id, tokens)?;
    let document_length = tokens.len() as u32;

    let mut tf_counts: HashMap<&str, u32> = HashMap::new();
    for token in tokens {
        *tf_counts.entry(token.as_ref()).or_insert(0) += 1;
    }

    index.record_document_length(document_length);
    for (term, tf) in tf_counts {
        index.term_mut(term).add_document_info(document_id, tf, document_length);
    }
    tracing::debug!(document_id, document_length, "indexed document");
    Ok(())
}

/// Ingest a batch. Every document is validated before any is applied, so a
/// rejected batch leaves the index as it was.
pub fn process_batch<I, S>(index: &mut CorpusIndex, documents: &[(I, Vec<S>)]) -> Result<()>
where
    I: AsRef<str>,
    S: AsRef<str>,
{
    for (id, tokens) in documents {
        validate_document(id.as_ref(), tokens)?;
    }
    for (id, tokens) in documents {
        process_document(index, id.as_ref(), tokens)?;
    }
    tracing::info!(batch = documents.len(), num_docs = index.number_of_documents(), "ingested batch");
    Ok(())
}
