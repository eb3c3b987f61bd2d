use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::Mutex;
use tracing::info;

use crate::app::ports::{ItemSink, ItemSource};
use crate::error::{CatalogError, Result};
use crate::types::Item;

struct LineCursor {
    reader: BufReader<File>,
    buf: Vec<u8>,
    line_no: usize,
}

/// Reads one JSON item per line; blank lines are ignored.
///
/// Lines are parsed from raw bytes, so a line that is not valid UTF-8 is
/// rejected as a malformed item like any other undecodable line.
pub struct JsonLinesSource {
    path: PathBuf,
    cursor: Mutex<LineCursor>,
}

impl JsonLinesSource {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).await.map_err(|e| CatalogError::Queue {
            message: format!("Failed to open '{}': {}", path.display(), e),
        })?;
        info!("Reading items from {}", path.display());
        Ok(Self {
            path,
            cursor: Mutex::new(LineCursor {
                reader: BufReader::new(file),
                buf: Vec::new(),
                line_no: 0,
            }),
        })
    }
}

#[async_trait]
impl ItemSource for JsonLinesSource {
    async fn dequeue(&self) -> Result<Option<Item>> {
        let mut guard = self.cursor.lock().await;
        let cursor = &mut *guard;
        loop {
            cursor.buf.clear();
            if cursor.reader.read_until(b'\n', &mut cursor.buf).await? == 0 {
                return Ok(None);
            }
            cursor.line_no += 1;
            if cursor.buf.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            return serde_json::from_slice(&cursor.buf).map(Some).map_err(|e| {
                CatalogError::malformed(
                    "item",
                    format!("{}:{}", self.path.display(), cursor.line_no),
                    e.to_string(),
                )
            });
        }
    }
}

/// Appends one JSON item per line.
pub struct JsonLinesSink {
    writer: Mutex<BufWriter<File>>,
}

impl JsonLinesSink {
    /// Create (or truncate) the output file
    pub async fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let file = File::create(path).await.map_err(|e| CatalogError::Queue {
            message: format!("Failed to create '{}': {}", path.display(), e),
        })?;
        info!("Writing items to {}", path.display());
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
        })
    }
}

#[async_trait]
impl ItemSink for JsonLinesSink {
    async fn enqueue(&self, item: &Item) -> Result<()> {
        let mut line = serde_json::to_vec(item)?;
        line.push(b'\n');
        self.writer.lock().await.write_all(&line).await?;
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        self.writer.lock().await.flush().await?;
        Ok(())
    }
}
