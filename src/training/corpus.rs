use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledText {
    pub text: String,
    pub label: String,
}

impl LabeledText {
    pub fn new(text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            label: label.into(),
        }
    }

    pub fn usable_text(&self) -> Option<&str> {
        let trimmed = self.text.trim();
        if trimmed.is_empty() {
            return None;
        }
        match trimmed.to_lowercase().as_str() {
            "nan" | "null" | "none" => None,
            _ => Some(trimmed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Spam,
    Ham,
}

impl Label {
    /// Unrecognized labels count as ham; the flag reports whether the raw
    /// value was one of the known labels.
    pub fn parse(raw: &str) -> (Self, bool) {
        match raw.trim().to_lowercase().as_str() {
            "spam" => (Self::Spam, true),
            "ham" => (Self::Ham, true),
            _ => (Self::Ham, false),
        }
    }

    pub fn is_spam(&self) -> bool {
        matches!(self, Self::Spam)
    }
}

pub fn find_dataset(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates.iter().find(|path| path.is_file()).cloned()
}

/// Reads a CSV with `category` and `message` columns. Header names are
/// matched case-insensitively and ignoring surrounding whitespace.
pub fn load_corpus(path: &Path) -> Result<Vec<LabeledText>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("failed to open dataset {}", path.display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("failed to read header of {}", path.display()))?
        .clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|header| header.trim().eq_ignore_ascii_case(name))
    };
    let (Some(category), Some(message)) = (column("category"), column("message")) else {
        bail!(
            "dataset {} must have `category` and `message` columns",
            path.display()
        );
    };

    let mut records = Vec::new();
    for (line, row) in reader.records().enumerate() {
        let row = row.with_context(|| format!("malformed row {} in {}", line + 2, path.display()))?;
        records.push(LabeledText::new(
            row.get(message).unwrap_or_default(),
            row.get(category).unwrap_or_default(),
        ));
    }

    tracing::info!(
        target: "training",
        path = %path.display(),
        rows = records.len(),
        "dataset loaded"
    );
    Ok(records)
}
