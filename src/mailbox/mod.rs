pub mod spool;

use anyhow::Result;

use crate::domain::{Message, MessageId};

pub trait Mailbox: Send + Sync {
    /// Unread messages matching `query`, at most `limit`, in mailbox order.
    fn list_unread(&self, query: &str, limit: usize) -> Result<Vec<Message>>;

    fn quarantine(&self, id: &MessageId) -> Result<()>;

    fn mark_reviewed(&self, id: &MessageId) -> Result<()>;
}

pub use spool::SpoolMailbox;
