use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::Serialize;
use thiserror::Error;

use super::{
    corpus::{Label, LabeledText},
    metrics::Evaluation,
};
use crate::{
    config::TrainingConfig,
    model::{
        classifier::FitError, ArtifactError, ClassifierModel, FeatureVector, SpamScorer,
        TrainedModel, Vectorizer,
    },
    text::{CanonicalText, Normalizer},
};

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("no usable records in the training corpus")]
    NoUsableRecords,
    #[error(transparent)]
    Fit(#[from] FitError),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CorpusStats {
    pub rows: usize,
    pub valid: usize,
    pub spam: usize,
    pub ham: usize,
    pub dropped_records: usize,
    pub unrecognized_labels: usize,
}

#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub model: TrainedModel,
    pub stats: CorpusStats,
    /// Absent when the corpus is too small to hold out a usable split.
    pub evaluation: Option<Evaluation>,
}

pub struct Trainer {
    normalizer: Normalizer,
    config: TrainingConfig,
}

impl Trainer {
    pub fn new(normalizer: Normalizer, config: TrainingConfig) -> Self {
        Self { normalizer, config }
    }

    pub fn train(&self, corpus: &[LabeledText]) -> Result<TrainingReport, TrainingError> {
        let mut stats = CorpusStats {
            rows: corpus.len(),
            ..CorpusStats::default()
        };
        let mut texts: Vec<CanonicalText> = Vec::with_capacity(corpus.len());
        let mut labels: Vec<bool> = Vec::with_capacity(corpus.len());

        for record in corpus {
            let Some(text) = record.usable_text() else {
                stats.dropped_records += 1;
                continue;
            };
            let (label, recognized) = Label::parse(&record.label);
            if !recognized {
                stats.unrecognized_labels += 1;
            }
            if label.is_spam() {
                stats.spam += 1;
            } else {
                stats.ham += 1;
            }
            texts.push(self.normalizer.normalize(text));
            labels.push(label.is_spam());
        }
        stats.valid = texts.len();

        if stats.dropped_records > 0 {
            tracing::warn!(
                target: "training",
                dropped = stats.dropped_records,
                "records with empty text dropped"
            );
        }
        if stats.unrecognized_labels > 0 {
            tracing::warn!(
                target: "training",
                count = stats.unrecognized_labels,
                "records with unrecognized labels were treated as ham"
            );
        }
        if texts.is_empty() {
            return Err(TrainingError::NoUsableRecords);
        }
        tracing::info!(
            target: "training",
            valid = stats.valid,
            spam = stats.spam,
            ham = stats.ham,
            kind = %self.config.model_kind,
            "training corpus prepared"
        );

        let vectorizer = Vectorizer::fit(&texts, self.config.max_features);
        let features = vectorizer.transform_all(&texts);

        let evaluation = self.evaluate(&features, &labels, vectorizer.dimension());
        match &evaluation {
            Some(eval) => tracing::info!(
                target: "training",
                test_size = eval.test_size,
                accuracy = eval.accuracy,
                spam_precision = eval.spam.precision,
                spam_recall = eval.spam.recall,
                ham_precision = eval.ham.precision,
                ham_recall = eval.ham.recall,
                "held-out evaluation"
            ),
            None => tracing::info!(target: "training", "corpus too small for a held-out split"),
        }

        let classifier = ClassifierModel::fit(
            self.config.model_kind,
            &features,
            &labels,
            vectorizer.dimension(),
            self.config.seed,
        )?;
        let model = TrainedModel::new(vectorizer, classifier, stats.valid)?;

        Ok(TrainingReport {
            model,
            stats,
            evaluation,
        })
    }

    fn evaluate(
        &self,
        features: &[FeatureVector],
        labels: &[bool],
        dimension: usize,
    ) -> Option<Evaluation> {
        let (train, test) =
            split_indices(labels.len(), self.config.holdout_ratio, self.config.seed);
        if test.is_empty() || train.is_empty() {
            return None;
        }

        let pick_features = |indices: &[usize]| -> Vec<FeatureVector> {
            indices.iter().map(|&i| features[i].clone()).collect()
        };
        let pick_labels =
            |indices: &[usize]| -> Vec<bool> { indices.iter().map(|&i| labels[i]).collect() };

        let model = ClassifierModel::fit(
            self.config.model_kind,
            &pick_features(&train),
            &pick_labels(&train),
            dimension,
            self.config.seed,
        )
        .ok()?;

        let actual = pick_labels(&test);
        let predicted: Vec<bool> = test
            .iter()
            .map(|&i| model.score(&features[i]).spam >= 0.5)
            .collect();
        Some(Evaluation::from_predictions(&actual, &predicted))
    }
}

/// Seeded shuffle, then the first `ceil(n * ratio)` indices become the test set.
fn split_indices(n: usize, ratio: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut StdRng::seed_from_u64(seed));
    let test_len = ((n as f64) * ratio).ceil() as usize;
    if test_len == 0 || test_len >= n {
        return (indices, Vec::new());
    }
    let train = indices.split_off(test_len);
    (train, indices)
}
