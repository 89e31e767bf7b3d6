use std::path::PathBuf;

use thiserror::Error;

use crate::model::{ModelKind, DEFAULT_MAX_FEATURES, DEFAULT_THRESHOLD};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub triage: TriageConfig,
    pub model: ModelConfig,
    pub training: TrainingConfig,
    pub mailbox: MailboxConfig,
    pub directories: DirectoryConfig,
    pub logging: LoggingConfig,
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone)]
pub struct TriageConfig {
    pub confidence_threshold: f64,
    pub enable_quarantine_action: bool,
    pub fetch_limit: usize,
    pub query: String,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_THRESHOLD,
            enable_quarantine_action: true,
            fetch_limit: 50,
            query: "is:unread".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub model_path: PathBuf,
}

impl ModelConfig {
    pub fn artifact_path(&self) -> &PathBuf {
        &self.model_path
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/spam_classifier.json"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrainingConfig {
    pub model_kind: ModelKind,
    pub max_features: usize,
    pub holdout_ratio: f64,
    pub seed: u64,
    pub dataset_candidates: Vec<PathBuf>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            model_kind: ModelKind::NaiveBayes,
            max_features: DEFAULT_MAX_FEATURES,
            holdout_ratio: 0.2,
            seed: 42,
            dataset_candidates: vec![PathBuf::from("data/spam.csv"), PathBuf::from("spam.csv")],
        }
    }
}

#[derive(Debug, Clone)]
pub struct MailboxConfig {
    pub root: PathBuf,
}

#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub logs_dir: String,
    pub data_dir: String,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub cron_spec: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error(
        "VOCABULARY_PATH ({vocabulary}) differs from MODEL_PATH ({model}); \
         the vocabulary is stored inside the model artifact"
    )]
    SplitArtifact { model: String, vocabulary: String },
}
