use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::text::CanonicalText;

pub const DEFAULT_MAX_FEATURES: usize = 5_000;

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    dimension: usize,
    entries: Vec<(usize, f64)>,
}

impl FeatureVector {
    #[cfg(test)]
    pub fn zeros(dimension: usize) -> Self {
        Self {
            dimension,
            entries: Vec::new(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    pub fn is_zero(&self) -> bool {
        self.entries.iter().all(|(_, weight)| *weight == 0.0)
    }

    pub fn dot(&self, weights: &[f64]) -> f64 {
        self.entries
            .iter()
            .map(|(index, value)| weights.get(*index).copied().unwrap_or(0.0) * value)
            .sum()
    }
}

#[derive(Debug, Error)]
pub enum VocabularyError {
    #[error("vocabulary has {terms} terms but {weights} idf weights")]
    LengthMismatch { terms: usize, weights: usize },
    #[error("vocabulary term {0:?} appears more than once")]
    DuplicateTerm(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct VocabularyState {
    terms: Vec<String>,
    idf: Vec<f64>,
}

/// Vocabulary plus idf weights. Only obtainable by fitting or by loading a
/// trained artifact, so a transform always has a frozen vocabulary behind it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "VocabularyState", into = "VocabularyState")]
pub struct Vectorizer {
    terms: Vec<String>,
    idf: Vec<f64>,
    index: HashMap<String, usize>,
}

impl Vectorizer {
    pub fn fit(corpus: &[CanonicalText], max_features: usize) -> Self {
        let documents = corpus.len() as f64;
        let mut document_frequency: HashMap<String, usize> = HashMap::new();
        let mut term_frequency: HashMap<String, usize> = HashMap::new();

        for text in corpus {
            let terms = extract_terms(text);
            let mut seen = HashSet::new();
            for term in terms {
                *term_frequency.entry(term.clone()).or_insert(0) += 1;
                if seen.insert(term.clone()) {
                    *document_frequency.entry(term).or_insert(0) += 1;
                }
            }
        }

        let mut ranked: Vec<(String, f64, f64)> = document_frequency
            .into_iter()
            .map(|(term, df)| {
                let idf = smoothed_idf(documents, df as f64);
                let mass = term_frequency.get(&term).copied().unwrap_or(0) as f64 * idf;
                (term, idf, mass)
            })
            .collect();
        ranked.sort_by(|a, b| b.2.total_cmp(&a.2).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(max_features);

        let retained: BTreeMap<String, f64> =
            ranked.into_iter().map(|(term, idf, _)| (term, idf)).collect();
        let (terms, idf): (Vec<_>, Vec<_>) = retained.into_iter().unzip();

        tracing::debug!(
            target: "model",
            features = terms.len(),
            documents = corpus.len(),
            "vocabulary fitted"
        );
        Self::from_parts(terms, idf)
    }

    fn from_parts(terms: Vec<String>, idf: Vec<f64>) -> Self {
        let index = terms
            .iter()
            .enumerate()
            .map(|(position, term)| (term.clone(), position))
            .collect();
        Self { terms, idf, index }
    }

    pub fn dimension(&self) -> usize {
        self.terms.len()
    }

    #[cfg(test)]
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    #[cfg(test)]
    pub fn contains(&self, term: &str) -> bool {
        self.index.contains_key(term)
    }

    /// Term counts weighted by idf and L2 normalized. Unknown terms are dropped.
    pub fn transform(&self, text: &CanonicalText) -> FeatureVector {
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for term in extract_terms(text) {
            if let Some(&position) = self.index.get(&term) {
                *counts.entry(position).or_insert(0.0) += 1.0;
            }
        }

        let mut entries: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(position, count)| (position, count * self.idf[position]))
            .collect();
        let norm = entries.iter().map(|(_, v)| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, value) in &mut entries {
                *value /= norm;
            }
        }

        FeatureVector {
            dimension: self.dimension(),
            entries,
        }
    }

    pub fn transform_all(&self, corpus: &[CanonicalText]) -> Vec<FeatureVector> {
        corpus.iter().map(|text| self.transform(text)).collect()
    }
}

impl TryFrom<VocabularyState> for Vectorizer {
    type Error = VocabularyError;

    fn try_from(state: VocabularyState) -> Result<Self, Self::Error> {
        if state.terms.len() != state.idf.len() {
            return Err(VocabularyError::LengthMismatch {
                terms: state.terms.len(),
                weights: state.idf.len(),
            });
        }
        let mut seen = HashSet::new();
        for term in &state.terms {
            if !seen.insert(term.as_str()) {
                return Err(VocabularyError::DuplicateTerm(term.clone()));
            }
        }
        Ok(Self::from_parts(state.terms, state.idf))
    }
}

impl From<Vectorizer> for VocabularyState {
    fn from(vectorizer: Vectorizer) -> Self {
        Self {
            terms: vectorizer.terms,
            idf: vectorizer.idf,
        }
    }
}

fn smoothed_idf(documents: f64, document_frequency: f64) -> f64 {
    ((1.0 + documents) / (1.0 + document_frequency)).ln() + 1.0
}

fn extract_terms(text: &CanonicalText) -> Vec<String> {
    let tokens: Vec<&str> = text.tokens().collect();
    let mut terms: Vec<String> = tokens.iter().map(|token| token.to_string()).collect();
    terms.extend(tokens.windows(2).map(|pair| format!("{} {}", pair[0], pair[1])));
    terms
}
