use async_trait::async_trait;

use crate::error::Result;
use crate::types::Item;

/// Where scraped items come from.
///
/// `Ok(None)` means the source is exhausted. A
/// [`CatalogError::MalformedDocument`](crate::error::CatalogError::MalformedDocument)
/// error rejects one entry; the next call moves on to the following one.
#[async_trait]
pub trait ItemSource: Send + Sync {
    async fn dequeue(&self) -> Result<Option<Item>>;
}

/// Where processed items go.
#[async_trait]
pub trait ItemSink: Send + Sync {
    async fn enqueue(&self, item: &Item) -> Result<()>;

    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// Out-of-band notification, e.g. a run summary for operators.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, title: &str, message: &str) -> Result<()>;
}
