use serde::{Deserialize, Serialize};

use super::{
    classifier::{sigmoid, SpamScorer},
    vectorizer::FeatureVector,
};
use crate::domain::Probabilities;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NaiveBayesModel {
    pub alpha: f64,
    pub spam_log_prior: f64,
    pub ham_log_prior: f64,
    pub spam_feature_log_prob: Vec<f64>,
    pub ham_feature_log_prob: Vec<f64>,
}

impl NaiveBayesModel {
    pub const DEFAULT_ALPHA: f64 = 0.1;

    pub fn fit(features: &[FeatureVector], labels: &[bool], dimension: usize, alpha: f64) -> Self {
        let mut spam_mass = vec![0.0; dimension];
        let mut ham_mass = vec![0.0; dimension];
        let mut spam_docs = 0usize;

        for (vector, is_spam) in features.iter().zip(labels) {
            let mass = if *is_spam {
                spam_docs += 1;
                &mut spam_mass
            } else {
                &mut ham_mass
            };
            for (index, value) in vector.entries() {
                mass[*index] += value;
            }
        }

        let total = features.len() as f64;
        let ham_docs = features.len() - spam_docs;

        Self {
            alpha,
            spam_log_prior: (spam_docs as f64 / total).ln(),
            ham_log_prior: (ham_docs as f64 / total).ln(),
            spam_feature_log_prob: log_probabilities(&spam_mass, alpha),
            ham_feature_log_prob: log_probabilities(&ham_mass, alpha),
        }
    }
}

fn log_probabilities(mass: &[f64], alpha: f64) -> Vec<f64> {
    let denominator = (mass.iter().sum::<f64>() + alpha * mass.len() as f64).ln();
    mass.iter()
        .map(|value| (value + alpha).ln() - denominator)
        .collect()
}

impl SpamScorer for NaiveBayesModel {
    fn score(&self, vector: &FeatureVector) -> Probabilities {
        let spam = self.spam_log_prior + vector.dot(&self.spam_feature_log_prob);
        let ham = self.ham_log_prior + vector.dot(&self.ham_feature_log_prob);
        Probabilities::from_spam(sigmoid(spam - ham))
    }

    fn dimension(&self) -> usize {
        self.spam_feature_log_prob.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::classifier::fixtures::*;

    #[test]
    fn balanced_priors_for_balanced_corpus() {
        let (vectorizer, features, labels) = training_set();
        let model = NaiveBayesModel::fit(&features, &labels, vectorizer.dimension(), 1.0);
        assert!((model.spam_log_prior - model.ham_log_prior).abs() < 1e-12);
        assert_eq!(model.dimension(), vectorizer.dimension());
    }

    #[test]
    fn smaller_alpha_sharpens_the_verdict() {
        let (vectorizer, features, labels) = training_set();
        let probe = vector(&vectorizer, "free cash");
        let smooth = NaiveBayesModel::fit(&features, &labels, vectorizer.dimension(), 1.0);
        let sharp = NaiveBayesModel::fit(&features, &labels, vectorizer.dimension(), 0.1);
        assert!(sharp.score(&probe).spam > smooth.score(&probe).spam);
        assert!(smooth.score(&probe).spam > 0.5);
    }
}
