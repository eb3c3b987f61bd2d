use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::app::ports::{ItemSink, ItemSource};
use crate::error::Result;
use crate::types::Item;

/// FIFO queue usable as both source and sink. Clones share the same queue.
#[derive(Clone, Default)]
pub struct InMemoryQueue {
    items: Arc<Mutex<VecDeque<Item>>>,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: impl IntoIterator<Item = Item>) -> Self {
        Self {
            items: Arc::new(Mutex::new(items.into_iter().collect())),
        }
    }

    pub async fn len(&self) -> usize {
        self.items.lock().await.len()
    }

    /// Remove and return everything currently queued
    pub async fn drain(&self) -> Vec<Item> {
        self.items.lock().await.drain(..).collect()
    }
}

#[async_trait]
impl ItemSource for InMemoryQueue {
    async fn dequeue(&self) -> Result<Option<Item>> {
        Ok(self.items.lock().await.pop_front())
    }
}

#[async_trait]
impl ItemSink for InMemoryQueue {
    async fn enqueue(&self, item: &Item) -> Result<()> {
        self.items.lock().await.push_back(item.clone());
        Ok(())
    }
}
