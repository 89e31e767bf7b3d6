use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};

use super::Mailbox;
use crate::domain::{Message, MessageId};

const INBOX: &str = "inbox";
const SPAM: &str = "spam";
const REVIEWED: &str = "reviewed";
const REJECTED: &str = "rejected";

/// Filesystem mailbox: one JSON message per file under `inbox/`, named after
/// its id. Unreadable or misnamed files are moved to `rejected/` when listed.
/// The query string is ignored.
pub struct SpoolMailbox {
    root: PathBuf,
}

impl SpoolMailbox {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        for folder in [INBOX, SPAM, REVIEWED, REJECTED] {
            let dir = root.join(folder);
            fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create mailbox folder {}", dir.display()))?;
        }
        Ok(Self { root })
    }

    pub fn deliver(&self, message: &Message) -> Result<()> {
        let path = self.message_path(INBOX, &message.id)?;
        let json = serde_json::to_vec_pretty(message)?;
        fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))
    }

    fn message_path(&self, folder: &str, id: &MessageId) -> Result<PathBuf> {
        let valid = !id.as_str().is_empty()
            && id
                .as_str()
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !id.as_str().starts_with('.');
        if !valid {
            bail!("message id {id:?} is not a valid spool file name");
        }
        Ok(self.root.join(folder).join(format!("{id}.json")))
    }

    fn move_message(&self, id: &MessageId, folder: &str) -> Result<()> {
        let from = self.message_path(INBOX, id)?;
        let to = self.message_path(folder, id)?;
        if !from.exists() {
            bail!("message {id} is not in the inbox");
        }
        fs::rename(&from, &to)
            .with_context(|| format!("failed to move message {id} to {folder}"))?;
        Ok(())
    }

    fn read_spooled(path: &Path) -> Result<Message> {
        let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let message: Message = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        let stem = path.file_stem().and_then(|stem| stem.to_str());
        if stem != Some(message.id.as_str()) {
            bail!(
                "message id {} does not match file name {}",
                message.id,
                path.display()
            );
        }
        Ok(message)
    }

    fn reject(&self, path: &Path, reason: &anyhow::Error) {
        tracing::warn!(
            target: "mailbox",
            path = %path.display(),
            error = %format!("{reason:#}"),
            "moving unusable spool file to rejected/"
        );
        let Some(name) = path.file_name() else {
            return;
        };
        let target = self.root.join(REJECTED).join(name);
        if let Err(err) = fs::rename(path, &target) {
            tracing::error!(
                target: "mailbox",
                path = %path.display(),
                error = %err,
                "failed to move spool file to rejected/"
            );
        }
    }
}

impl Mailbox for SpoolMailbox {
    fn list_unread(&self, _query: &str, limit: usize) -> Result<Vec<Message>> {
        let inbox = self.root.join(INBOX);
        let mut paths: Vec<PathBuf> = fs::read_dir(&inbox)
            .with_context(|| format!("failed to read {}", inbox.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut messages = Vec::new();
        for path in paths {
            if messages.len() >= limit {
                break;
            }
            match Self::read_spooled(&path) {
                Ok(message) => messages.push(message),
                Err(err) => self.reject(&path, &err),
            }
        }
        Ok(messages)
    }

    fn quarantine(&self, id: &MessageId) -> Result<()> {
        self.move_message(id, SPAM)
    }

    fn mark_reviewed(&self, id: &MessageId) -> Result<()> {
        self.move_message(id, REVIEWED)
    }
}
