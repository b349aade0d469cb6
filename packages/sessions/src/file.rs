// ABOUTME: Filesystem session recorder
// ABOUTME: Writes {timestamp}_{label}.jsonl files under a sessions directory, never overwriting

use async_trait::async_trait;
use chrono::Utc;
use kiln_core::Event;
use serde_json::{Map, Value};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::{Result, SessionError, SessionRecorder};

/// Type tag of the header line
const METADATA_TYPE: &str = "_metadata";

/// Numbered suffixes tried when a file name is already taken
const MAX_NAME_ATTEMPTS: u32 = 100;

pub struct FileSessionRecorder {
    sessions_dir: PathBuf,
}

impl FileSessionRecorder {
    pub fn new(sessions_dir: impl Into<PathBuf>) -> Self {
        Self {
            sessions_dir: sessions_dir.into(),
        }
    }

    /// Keep labels usable as a single path component
    fn sanitize_label(label: &str) -> String {
        label
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }

    /// Create `{stem}.jsonl`, or `{stem}-N.jsonl` if that name is taken
    async fn create_unique(dir: &Path, stem: &str) -> Result<(PathBuf, File)> {
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let name = if attempt == 0 {
                format!("{}.jsonl", stem)
            } else {
                format!("{}-{}.jsonl", stem, attempt)
            };
            let path = dir.join(name);

            // create_new: an existing session artifact is never overwritten
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(io::Error::new(
            ErrorKind::AlreadyExists,
            format!("no free session file name for {}", stem),
        )
        .into())
    }

    fn render(metadata: &Value, events: &[Event]) -> Result<String> {
        let fields = metadata.as_object().ok_or(SessionError::InvalidMetadata)?;

        let mut header = Map::new();
        header.insert("type".to_string(), Value::String(METADATA_TYPE.to_string()));
        for (key, value) in fields {
            if key != "type" {
                header.insert(key.clone(), value.clone());
            }
        }

        let mut out = serde_json::to_string(&Value::Object(header))?;
        out.push('\n');
        for event in events {
            out.push_str(&serde_json::to_string(event)?);
            out.push('\n');
        }
        Ok(out)
    }
}

#[async_trait]
impl SessionRecorder for FileSessionRecorder {
    async fn save(&self, label: &str, metadata: &Value, events: &[Event]) -> Result<PathBuf> {
        let contents = Self::render(metadata, events)?;

        fs::create_dir_all(&self.sessions_dir).await?;
        let stem = format!(
            "{}_{}",
            Utc::now().format("%Y%m%d_%H%M%S_%3f"),
            Self::sanitize_label(label)
        );
        let (path, mut file) = Self::create_unique(&self.sessions_dir, &stem).await?;
        file.write_all(contents.as_bytes()).await?;
        file.flush().await?;

        info!(
            "Session log saved: {} ({} events)",
            path.display(),
            events.len()
        );
        Ok(path)
    }
}
