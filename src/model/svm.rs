use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};

use super::{
    classifier::{sigmoid, SpamScorer},
    vectorizer::FeatureVector,
};
use crate::domain::Probabilities;

const EPOCHS: usize = 100;
const LEARNING_RATE: f64 = 0.1;
const L2_PENALTY: f64 = 1e-4;
const CALIBRATION_STEPS: usize = 2_000;
const CALIBRATION_RATE: f64 = 0.5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearSvmModel {
    pub weights: Vec<f64>,
    pub bias: f64,
    /// `P(spam) = 1 / (1 + exp(platt_a * f + platt_b))`.
    pub platt_a: f64,
    pub platt_b: f64,
}

impl LinearSvmModel {
    pub fn fit(features: &[FeatureVector], labels: &[bool], dimension: usize, seed: u64) -> Self {
        let mut weights = vec![0.0; dimension];
        let mut bias = 0.0;
        let mut order: Vec<usize> = (0..features.len()).collect();
        let mut rng = StdRng::seed_from_u64(seed);

        for _ in 0..EPOCHS {
            order.shuffle(&mut rng);
            for &i in &order {
                let y = if labels[i] { 1.0 } else { -1.0 };
                let margin = y * (features[i].dot(&weights) + bias);
                for weight in weights.iter_mut() {
                    *weight *= 1.0 - LEARNING_RATE * L2_PENALTY;
                }
                if margin < 1.0 {
                    for (index, value) in features[i].entries() {
                        weights[*index] += LEARNING_RATE * y * value;
                    }
                    bias += LEARNING_RATE * y;
                }
            }
        }

        let decisions: Vec<f64> = features
            .iter()
            .map(|vector| vector.dot(&weights) + bias)
            .collect();
        let (platt_a, platt_b) = fit_platt(&decisions, labels);

        Self {
            weights,
            bias,
            platt_a,
            platt_b,
        }
    }

    pub fn decision_value(&self, vector: &FeatureVector) -> f64 {
        vector.dot(&self.weights) + self.bias
    }
}

fn fit_platt(decisions: &[f64], labels: &[bool]) -> (f64, f64) {
    let positives = labels.iter().filter(|spam| **spam).count() as f64;
    let negatives = labels.len() as f64 - positives;
    let hi = (positives + 1.0) / (positives + 2.0);
    let lo = 1.0 / (negatives + 2.0);
    let n = decisions.len().max(1) as f64;

    let mut a = -1.0;
    let mut b = 0.0;
    for _ in 0..CALIBRATION_STEPS {
        let mut grad_a = 0.0;
        let mut grad_b = 0.0;
        for (f, is_spam) in decisions.iter().zip(labels) {
            let target = if *is_spam { hi } else { lo };
            let p = sigmoid(-(a * f + b));
            grad_a += (target - p) * f;
            grad_b += target - p;
        }
        a -= CALIBRATION_RATE * grad_a / n;
        b -= CALIBRATION_RATE * grad_b / n;
    }
    (a, b)
}

impl SpamScorer for LinearSvmModel {
    fn score(&self, vector: &FeatureVector) -> Probabilities {
        let f = self.decision_value(vector);
        Probabilities::from_spam(sigmoid(-(self.platt_a * f + self.platt_b)))
    }

    fn dimension(&self) -> usize {
        self.weights.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::classifier::fixtures::*;

    #[test]
    fn same_seed_same_parameters() {
        let (vectorizer, features, labels) = training_set();
        let first = LinearSvmModel::fit(&features, &labels, vectorizer.dimension(), 42);
        let second = LinearSvmModel::fit(&features, &labels, vectorizer.dimension(), 42);
        assert_eq!(first.weights, second.weights);
        assert_eq!(first.platt_a, second.platt_a);
    }

    #[test]
    fn margins_separate_training_set_and_calibration_is_monotone() {
        let (vectorizer, features, labels) = training_set();
        let model = LinearSvmModel::fit(&features, &labels, vectorizer.dimension(), 42);
        for (vector, is_spam) in features.iter().zip(&labels) {
            assert_eq!(model.decision_value(vector) > 0.0, *is_spam);
        }
        assert!(model.platt_a < 0.0);
    }
}
