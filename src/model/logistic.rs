use serde::{Deserialize, Serialize};

use super::{
    classifier::{sigmoid, SpamScorer},
    vectorizer::FeatureVector,
};
use crate::domain::Probabilities;

const EPOCHS: usize = 500;
const LEARNING_RATE: f64 = 1.0;
const L2_PENALTY: f64 = 1e-4;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticModel {
    pub weights: Vec<f64>,
    pub bias: f64,
}

impl LogisticModel {
    pub fn fit(features: &[FeatureVector], labels: &[bool], dimension: usize) -> Self {
        let mut weights = vec![0.0; dimension];
        let mut bias = 0.0;
        let n = features.len() as f64;

        for _ in 0..EPOCHS {
            let mut gradient = vec![0.0; dimension];
            let mut bias_gradient = 0.0;
            for (vector, is_spam) in features.iter().zip(labels) {
                let target = if *is_spam { 1.0 } else { 0.0 };
                let error = sigmoid(vector.dot(&weights) + bias) - target;
                for (index, value) in vector.entries() {
                    gradient[*index] += error * value;
                }
                bias_gradient += error;
            }
            for (weight, grad) in weights.iter_mut().zip(&gradient) {
                *weight -= LEARNING_RATE * (grad / n + L2_PENALTY * *weight);
            }
            bias -= LEARNING_RATE * bias_gradient / n;
        }

        Self { weights, bias }
    }
}

impl SpamScorer for LogisticModel {
    fn score(&self, vector: &FeatureVector) -> Probabilities {
        Probabilities::from_spam(sigmoid(vector.dot(&self.weights) + self.bias))
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
    fn separates_the_training_set() {
        let (vectorizer, features, labels) = training_set();
        let model = LogisticModel::fit(&features, &labels, vectorizer.dimension());
        for (vector, is_spam) in features.iter().zip(&labels) {
            let p = model.score(vector).spam;
            assert_eq!(p >= 0.5, *is_spam, "p = {p}");
        }
    }
}
