use std::{env, path::PathBuf, str::FromStr};

use super::env::{
    AppConfig, ConfigError, DirectoryConfig, LoggingConfig, MailboxConfig, ModelConfig,
    SchedulerConfig, TrainingConfig, TriageConfig,
};

pub fn load_config() -> Result<AppConfig, ConfigError> {
    AppConfig::from_env()
}

impl AppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let triage_defaults = TriageConfig::default();
        let confidence_threshold = parse_or(
            &var,
            "CONFIDENCE_THRESHOLD",
            triage_defaults.confidence_threshold,
        )?;
        if !(confidence_threshold > 0.0 && confidence_threshold < 1.0) {
            return Err(ConfigError::Invalid {
                key: "CONFIDENCE_THRESHOLD",
                value: confidence_threshold.to_string(),
                reason: "must be strictly between 0 and 1".to_string(),
            });
        }
        let triage = TriageConfig {
            confidence_threshold,
            enable_quarantine_action: parse_bool(
                &var,
                "ENABLE_QUARANTINE_ACTION",
                triage_defaults.enable_quarantine_action,
            )?,
            fetch_limit: parse_or(&var, "FETCH_LIMIT", triage_defaults.fetch_limit)?,
            query: var("EMAIL_QUERY").unwrap_or(triage_defaults.query),
        };

        let model_defaults = ModelConfig::default();
        let model_path = var("MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or(model_defaults.model_path);
        // The vocabulary is stored inside the model artifact.
        if let Some(vocabulary) = var("VOCABULARY_PATH").map(PathBuf::from) {
            if vocabulary != model_path {
                return Err(ConfigError::SplitArtifact {
                    model: model_path.display().to_string(),
                    vocabulary: vocabulary.display().to_string(),
                });
            }
        }
        let model = ModelConfig { model_path };

        let training_defaults = TrainingConfig::default();
        let holdout_ratio = parse_or(&var, "HOLDOUT_RATIO", training_defaults.holdout_ratio)?;
        if !(0.0..1.0).contains(&holdout_ratio) {
            return Err(ConfigError::Invalid {
                key: "HOLDOUT_RATIO",
                value: holdout_ratio.to_string(),
                reason: "must be in [0, 1)".to_string(),
            });
        }
        let training = TrainingConfig {
            model_kind: parse_or(&var, "MODEL_TYPE", training_defaults.model_kind)?,
            max_features: parse_or(&var, "MAX_FEATURES", training_defaults.max_features)?,
            holdout_ratio,
            seed: parse_or(&var, "SPLIT_SEED", training_defaults.seed)?,
            dataset_candidates: training_defaults.dataset_candidates,
        };

        let mailbox = MailboxConfig {
            root: PathBuf::from(var("MAILBOX_DIR").unwrap_or_else(|| "mailbox".to_string())),
        };

        let directories = DirectoryConfig {
            logs_dir: var("LOGS_DIR").unwrap_or_else(|| "logs".to_string()),
            data_dir: var("DATA_DIR").unwrap_or_else(|| "data".to_string()),
        };

        let logging = LoggingConfig {
            level: var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        };

        let scheduler = SchedulerConfig {
            cron_spec: var("TRIAGE_CRON").unwrap_or_else(|| "0 0 */6 * * *".to_string()),
        };

        Ok(Self {
            triage,
            model,
            training,
            mailbox,
            directories,
            logging,
            scheduler,
        })
    }
}

fn parse_or<T, V>(var: &V, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    V: Fn(&str) -> Option<String>,
{
    match var(key) {
        None => Ok(default),
        Some(value) => value.parse::<T>().map_err(|err| ConfigError::Invalid {
            key,
            value,
            reason: err.to_string(),
        }),
    }
}

fn parse_bool<V>(var: &V, key: &'static str, default: bool) -> Result<bool, ConfigError>
where
    V: Fn(&str) -> Option<String>,
{
    match var(key) {
        None => Ok(default),
        Some(value) => match value.to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid {
                key,
                value,
                reason: "expected a boolean".to_string(),
            }),
        },
    }
}
