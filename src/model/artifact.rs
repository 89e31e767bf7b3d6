//! The trained model artifact: vocabulary and classifier parameters stored as
//! one checksummed, versioned file.

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::{
    classifier::{ClassifierModel, ModelKind, SpamScorer},
    vectorizer::Vectorizer,
};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to access model artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("model artifact {path} is malformed: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(
        "model artifact format version {found} is not supported (expected {expected})",
        expected = FORMAT_VERSION
    )]
    UnsupportedVersion { found: u32 },
    #[error("model artifact checksum mismatch: recorded {recorded}, computed {computed}")]
    ChecksumMismatch { recorded: String, computed: String },
    #[error("vocabulary has {vocabulary} features but classifier expects {classifier}")]
    DimensionMismatch { vocabulary: usize, classifier: usize },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    pub trained_at: DateTime<Utc>,
    pub training_records: usize,
    pub vectorizer: Vectorizer,
    pub classifier: ClassifierModel,
}

impl TrainedModel {
    pub fn new(
        vectorizer: Vectorizer,
        classifier: ClassifierModel,
        training_records: usize,
    ) -> Result<Self, ArtifactError> {
        let model = Self {
            trained_at: Utc::now(),
            training_records,
            vectorizer,
            classifier,
        };
        model.check_dimensions()?;
        Ok(model)
    }

    pub fn kind(&self) -> ModelKind {
        self.classifier.kind()
    }

    fn check_dimensions(&self) -> Result<(), ArtifactError> {
        let vocabulary = self.vectorizer.dimension();
        let classifier = self.classifier.dimension();
        if vocabulary != classifier {
            return Err(ArtifactError::DimensionMismatch {
                vocabulary,
                classifier,
            });
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
struct ArtifactEnvelope {
    format_version: u32,
    checksum: String,
    payload: Box<RawValue>,
}

fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

/// Returns `Ok(None)` when no artifact exists at `path`.
pub fn load_model(path: &Path) -> Result<Option<TrainedModel>, ArtifactError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ArtifactError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let malformed = |source| ArtifactError::Malformed {
        path: path.to_path_buf(),
        source,
    };
    let envelope: ArtifactEnvelope = serde_json::from_slice(&bytes).map_err(malformed)?;
    if envelope.format_version != FORMAT_VERSION {
        return Err(ArtifactError::UnsupportedVersion {
            found: envelope.format_version,
        });
    }

    let computed = sha256_hex(envelope.payload.get().as_bytes());
    if computed != envelope.checksum {
        return Err(ArtifactError::ChecksumMismatch {
            recorded: envelope.checksum,
            computed,
        });
    }

    let model: TrainedModel = serde_json::from_str(envelope.payload.get()).map_err(malformed)?;
    model.check_dimensions()?;
    tracing::info!(
        target: "model",
        path = %path.display(),
        kind = %model.kind(),
        features = model.vectorizer.dimension(),
        trained_at = %model.trained_at,
        "model artifact loaded"
    );
    Ok(Some(model))
}

pub fn save_model(path: &Path, model: &TrainedModel) -> Result<(), ArtifactError> {
    let io_err = |source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    };
    let malformed = |source| ArtifactError::Malformed {
        path: path.to_path_buf(),
        source,
    };

    let payload = serde_json::to_string(model).map_err(malformed)?;
    let envelope = ArtifactEnvelope {
        format_version: FORMAT_VERSION,
        checksum: sha256_hex(payload.as_bytes()),
        payload: RawValue::from_string(payload).map_err(malformed)?,
    };
    let bytes = serde_json::to_vec(&envelope).map_err(malformed)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let staging = path.with_extension("partial");
    fs::write(&staging, bytes).map_err(io_err)?;
    fs::rename(&staging, path).map_err(io_err)?;

    tracing::info!(target: "model", path = %path.display(), "model artifact saved");
    Ok(())
}
