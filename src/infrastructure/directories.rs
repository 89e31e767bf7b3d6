use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

use crate::config::AppConfig;

#[derive(Debug, Clone)]
pub struct ResolvedPaths {
    pub logs_dir: PathBuf,
    pub data_dir: PathBuf,
    pub mailbox_dir: PathBuf,
}

pub fn ensure_directories(config: &AppConfig) -> Result<ResolvedPaths> {
    let logs_dir = ensure_dir(Path::new(&config.directories.logs_dir))?;
    let data_dir = ensure_dir(Path::new(&config.directories.data_dir))?;
    let mailbox_dir = ensure_dir(&config.mailbox.root)?;
    if let Some(parent) = config
        .model
        .artifact_path()
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
    {
        ensure_dir(parent)?;
    }
    Ok(ResolvedPaths {
        logs_dir,
        data_dir,
        mailbox_dir,
    })
}

fn ensure_dir(dir: &Path) -> Result<PathBuf> {
    if !dir.exists() {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create directory {}", dir.display()))?;
    }
    Ok(dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_missing_directories() {
        let root = tempfile::tempdir().unwrap();
        let base = root.path().display().to_string();
        let config = AppConfig::from_lookup(|key| match key {
            "LOGS_DIR" => Some(format!("{base}/logs")),
            "DATA_DIR" => Some(format!("{base}/data")),
            "MAILBOX_DIR" => Some(format!("{base}/mail")),
            "MODEL_PATH" => Some(format!("{base}/models/spam.json")),
            _ => None,
        })
        .unwrap();
        let paths = ensure_directories(&config).unwrap();
        assert!(paths.logs_dir.is_dir());
        assert!(paths.data_dir.is_dir());
        assert!(paths.mailbox_dir.is_dir());
        assert!(root.path().join("models").is_dir());
    }
}
