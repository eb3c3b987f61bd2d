use async_trait::async_trait;
use tracing::info;

use crate::app::ports::Notifier;
use crate::error::Result;

/// Notifier that writes notifications to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, title: &str, message: &str) -> Result<()> {
        info!(notification = title, "{}", message);
        Ok(())
    }
}
