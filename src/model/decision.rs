use crate::domain::{Verdict, VerdictLabel};

pub const DEFAULT_THRESHOLD: f64 = 0.7;

pub fn decide(spam_probability: f64, threshold: f64) -> Verdict {
    let label = if spam_probability >= threshold {
        VerdictLabel::Spam
    } else {
        VerdictLabel::NotSpam
    };
    Verdict {
        label,
        spam_probability,
        confidence: spam_probability.max(1.0 - spam_probability),
    }
}
