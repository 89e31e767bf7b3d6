use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub test_size: usize,
    pub accuracy: f64,
    pub spam: ClassMetrics,
    pub ham: ClassMetrics,
}

impl Evaluation {
    pub fn from_predictions(actual: &[bool], predicted: &[bool]) -> Self {
        let test_size = actual.len();
        let correct = actual
            .iter()
            .zip(predicted)
            .filter(|(a, p)| a == p)
            .count();
        Self {
            test_size,
            accuracy: ratio(correct, test_size),
            spam: class_metrics(actual, predicted, true),
            ham: class_metrics(actual, predicted, false),
        }
    }
}

fn class_metrics(actual: &[bool], predicted: &[bool], class: bool) -> ClassMetrics {
    let mut true_positive = 0;
    let mut false_positive = 0;
    let mut false_negative = 0;
    for (a, p) in actual.iter().zip(predicted) {
        match (*a == class, *p == class) {
            (true, true) => true_positive += 1,
            (false, true) => false_positive += 1,
            (true, false) => false_negative += 1,
            (false, false) => {}
        }
    }
    let precision = ratio(true_positive, true_positive + false_positive);
    let recall = ratio(true_positive, true_positive + false_negative);
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };
    ClassMetrics {
        precision,
        recall,
        f1,
        support: true_positive + false_negative,
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
