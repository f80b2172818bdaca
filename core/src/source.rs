//! Loading raw documents from JSON / JSONL files and handing them to the engine.

use crate::engine::SearchEngine;
use crate::tokenizer::Tokenizer;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A raw document as supplied by the document source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDocument {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
}

impl SourceDocument {
    /// Title and body joined; both are searchable.
    pub fn text(&self) -> String {
        if self.title.is_empty() {
            self.body.clone()
        } else {
            format!("{}\n{}", self.title, self.body)
        }
    }
}

/// Load documents from a `.json` file (object or array), a `.jsonl` file, or a
/// directory searched recursively for both.
pub fn load_documents<P: AsRef<Path>>(input: P) -> Result<Vec<SourceDocument>> {
    let input_path = input.as_ref();
    let mut files: Vec<PathBuf> = Vec::new();
    if input_path.is_dir() {
        for entry in WalkDir::new(input_path).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() {
                if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                    if matches!(ext, "json" | "jsonl") {
                        files.push(p.to_path_buf());
                    }
                }
            }
        }
    } else if input_path.is_file() {
        files.push(input_path.to_path_buf());
    } else {
        anyhow::bail!("input path {} does not exist", input_path.display());
    }

    let mut docs = Vec::new();
    for file in files {
        if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            read_jsonl(&file, &mut docs)?;
        } else {
            read_json(&file, &mut docs)?;
        }
    }
    tracing::info!(input = %input_path.display(), num_docs = docs.len(), "loaded documents");
    Ok(docs)
}

fn read_jsonl(file: &Path, docs: &mut Vec<SourceDocument>) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let doc: SourceDocument = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: invalid document", file.display(), line_no + 1))?;
        docs.push(doc);
    }
    Ok(())
}

fn read_json(file: &Path, docs: &mut Vec<SourceDocument>) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    let json: serde_json::Value = serde_json::from_reader(reader)
        .with_context(|| format!("{}: invalid JSON", file.display()))?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                docs.push(serde_json::from_value(v).with_context(|| format!("{}: invalid document", file.display()))?);
            }
        }
        serde_json::Value::Object(_) => {
            docs.push(serde_json::from_value(json).with_context(|| format!("{}: invalid document", file.display()))?);
        }
        _ => tracing::warn!(file = %file.display(), "skipping JSON that is neither an object nor an array"),
    }
    Ok(())
}

/// Run every document through the tokenizer, keeping source order.
pub fn tokenize_documents<T: Tokenizer + ?Sized>(docs: &[SourceDocument], tokenizer: &T) -> Vec<(String, Vec<String>)> {
    docs.iter().map(|d| (d.id.clone(), tokenizer.tokenize(&d.text()))).collect()
}

/// Tokenize and ingest `docs` as one batch.
pub fn index_documents<T: Tokenizer + ?Sized>(engine: &SearchEngine, docs: &[SourceDocument], tokenizer: &T) -> Result<()> {
    let batch = tokenize_documents(docs, tokenizer);
    engine.ingest_batch(&batch)?;
    Ok(())
}
