use std::{path::Path, sync::Arc};

use anyhow::{Context, Result};

use super::{
    artifact::{load_model, TrainedModel},
    classifier::SpamScorer,
    decision::decide,
};
use crate::{
    domain::Verdict,
    text::{CanonicalText, Normalizer},
};

#[derive(Clone)]
pub struct SpamClassifier {
    normalizer: Normalizer,
    model: Option<Arc<TrainedModel>>,
    threshold: f64,
}

impl SpamClassifier {
    pub fn new(normalizer: Normalizer, model: Option<Arc<TrainedModel>>, threshold: f64) -> Self {
        Self {
            normalizer,
            model,
            threshold,
        }
    }

    /// Loads the artifact at `path`. A missing artifact leaves the classifier
    /// unloaded; a corrupt one is an error.
    pub fn load(normalizer: Normalizer, path: &Path, threshold: f64) -> Result<Self> {
        let model = load_model(path)
            .with_context(|| format!("failed to load model artifact {}", path.display()))?;
        if model.is_none() {
            tracing::warn!(
                target: "model",
                path = %path.display(),
                "model artifact not found; train first with `spam-triage train`"
            );
        }
        Ok(Self::new(normalizer, model.map(Arc::new), threshold))
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn classify(&self, text: &CanonicalText) -> Verdict {
        let Some(model) = &self.model else {
            return Verdict::unknown();
        };
        let vector = model.vectorizer.transform(text);
        if vector.is_zero() {
            tracing::debug!(target: "model", "no known terms; scoring on priors only");
        }
        let probabilities = model.classifier.score(&vector);
        decide(probabilities.spam, self.threshold)
    }

    pub fn predict(&self, raw: &str) -> Verdict {
        self.classify(&self.normalizer.normalize(raw))
    }
}
