use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::message::MessageId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictLabel {
    Spam,
    NotSpam,
    Unknown,
}

impl VerdictLabel {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Spam => "spam",
            Self::NotSpam => "not_spam",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for VerdictLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub label: VerdictLabel,
    pub spam_probability: f64,
    pub confidence: f64,
}

impl Verdict {
    pub const fn unknown() -> Self {
        Self {
            label: VerdictLabel::Unknown,
            spam_probability: 0.0,
            confidence: 0.0,
        }
    }
}

/// Output of a probabilistic classifier. `spam + ham == 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Probabilities {
    pub spam: f64,
    pub ham: f64,
}

impl Probabilities {
    pub fn from_spam(spam: f64) -> Self {
        let spam = if spam.is_nan() { 0.5 } else { spam.clamp(0.0, 1.0) };
        Self {
            spam,
            ham: 1.0 - spam,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Quarantine,
    MarkReviewed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum ActionOutcome {
    Applied { action: ActionKind },
    Failed { action: ActionKind, error: String },
    /// Quarantine disabled by configuration.
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageOutcome {
    pub id: MessageId,
    pub verdict: Verdict,
    pub used_snippet: bool,
    pub action: ActionOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub total: usize,
    pub spam: usize,
    pub not_spam: usize,
    pub action_failures: usize,
    pub skipped_actions: usize,
    pub cancelled: bool,
    pub outcomes: Vec<MessageOutcome>,
}

impl RunSummary {
    pub fn start() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            total: 0,
            spam: 0,
            not_spam: 0,
            action_failures: 0,
            skipped_actions: 0,
            cancelled: false,
            outcomes: Vec::new(),
        }
    }

    pub fn record(&mut self, outcome: MessageOutcome) {
        self.total += 1;
        match outcome.verdict.label {
            VerdictLabel::Spam => self.spam += 1,
            VerdictLabel::NotSpam => self.not_spam += 1,
            VerdictLabel::Unknown => {}
        }
        match outcome.action {
            ActionOutcome::Failed { .. } => self.action_failures += 1,
            ActionOutcome::Skipped => self.skipped_actions += 1,
            ActionOutcome::Applied { .. } => {}
        }
        self.outcomes.push(outcome);
    }

    pub fn finish(mut self) -> Self {
        self.finished_at = Some(Utc::now());
        self
    }
}
