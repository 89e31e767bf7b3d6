use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{
    bayes::NaiveBayesModel, logistic::LogisticModel, svm::LinearSvmModel,
    vectorizer::FeatureVector,
};
use crate::domain::Probabilities;

pub trait SpamScorer: Send + Sync {
    fn score(&self, vector: &FeatureVector) -> Probabilities;

    fn dimension(&self) -> usize;
}

#[derive(Debug, Error)]
pub enum FitError {
    #[error("cannot fit a classifier on an empty training set")]
    Empty,
    #[error("training set has {features} feature rows but {labels} labels")]
    LabelCount { features: usize, labels: usize },
    #[error("training set contains no {0} examples")]
    MissingClass(&'static str),
}

pub(crate) fn check_training_set(
    features: &[FeatureVector],
    labels: &[bool],
) -> Result<(), FitError> {
    if features.is_empty() {
        return Err(FitError::Empty);
    }
    if features.len() != labels.len() {
        return Err(FitError::LabelCount {
            features: features.len(),
            labels: labels.len(),
        });
    }
    if !labels.iter().any(|spam| *spam) {
        return Err(FitError::MissingClass("spam"));
    }
    if labels.iter().all(|spam| *spam) {
        return Err(FitError::MissingClass("ham"));
    }
    Ok(())
}

pub(crate) fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    #[default]
    NaiveBayes,
    Logistic,
    Svm,
}

impl ModelKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NaiveBayes => "naive_bayes",
            Self::Logistic => "logistic",
            Self::Svm => "svm",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "naive_bayes" | "bayes" | "nb" => Ok(Self::NaiveBayes),
            "logistic" | "logreg" => Ok(Self::Logistic),
            "svm" | "linear_svm" => Ok(Self::Svm),
            other => Err(format!("unknown model type {other:?}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierModel {
    NaiveBayes(NaiveBayesModel),
    Logistic(LogisticModel),
    Svm(LinearSvmModel),
}

impl ClassifierModel {
    pub fn fit(
        kind: ModelKind,
        features: &[FeatureVector],
        labels: &[bool],
        dimension: usize,
        seed: u64,
    ) -> Result<Self, FitError> {
        check_training_set(features, labels)?;
        let model = match kind {
            ModelKind::NaiveBayes => Self::NaiveBayes(NaiveBayesModel::fit(
                features,
                labels,
                dimension,
                NaiveBayesModel::DEFAULT_ALPHA,
            )),
            ModelKind::Logistic => Self::Logistic(LogisticModel::fit(features, labels, dimension)),
            ModelKind::Svm => Self::Svm(LinearSvmModel::fit(features, labels, dimension, seed)),
        };
        Ok(model)
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            Self::NaiveBayes(_) => ModelKind::NaiveBayes,
            Self::Logistic(_) => ModelKind::Logistic,
            Self::Svm(_) => ModelKind::Svm,
        }
    }

    fn scorer(&self) -> &dyn SpamScorer {
        match self {
            Self::NaiveBayes(model) => model,
            Self::Logistic(model) => model,
            Self::Svm(model) => model,
        }
    }
}

impl SpamScorer for ClassifierModel {
    fn score(&self, vector: &FeatureVector) -> Probabilities {
        self.scorer().score(vector)
    }

    fn dimension(&self) -> usize {
        self.scorer().dimension()
    }
}
