//! File content port (driven/secondary port)
//!
//! Given an entry, produces a sequential byte stream of its current content.
//! Implementations may fetch chunks from volume servers lazily; the engine
//! only ever reads front to back.

use tokio::io::AsyncRead;

use crate::domain::Entry;

/// Sequential reader over an entry's content
pub type ContentReader = Box<dyn AsyncRead + Send + Unpin>;

/// Port trait for reading local file content
#[async_trait::async_trait]
pub trait IFileContentSource: Send + Sync {
    /// Opens a reader over the content of `entry`
    async fn open(&self, entry: &Entry) -> anyhow::Result<ContentReader>;
}
