use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::debug;

use crate::platform::TelegramFile;

/// Directory served as static media, plus the public URL it is served under.
#[derive(Debug, Clone)]
pub struct MediaArchive {
    directory: PathBuf,
    base_url: String,
}

impl MediaArchive {
    pub fn new(directory: PathBuf, base_url: &str) -> Self {
        Self {
            directory,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Write the file under its base name and return its public link.
    pub async fn store(&self, file: &TelegramFile) -> Result<String> {
        let name = file.file_name();
        if name.is_empty() || name == "." || name == ".." {
            anyhow::bail!("Refusing to store file with path '{}'", file.file_path);
        }

        let target = self.directory.join(name);
        tokio::fs::write(&target, &file.bytes)
            .await
            .with_context(|| format!("Failed to write media file: {}", target.display()))?;
        debug!("Stored {} bytes at {}", file.bytes.len(), target.display());

        Ok(self.public_url(name))
    }

    pub fn public_url(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_writes_basename_and_returns_link() {
        let dir = tempfile::tempdir().unwrap();
        let archive = MediaArchive::new(dir.path().to_path_buf(), "http://media.unreal4u.com/");
        let file = TelegramFile {
            file_path: "stickers/pic.webp".to_string(),
            bytes: vec![1, 2, 3],
        };

        let link = archive.store(&file).await.unwrap();
        assert_eq!(link, "http://media.unreal4u.com/pic.webp");
        assert_eq!(std::fs::read(dir.path().join("pic.webp")).unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_store_rejects_empty_name() {
        let dir = tempfile::tempdir().unwrap();
        let archive = MediaArchive::new(dir.path().to_path_buf(), "http://m");
        let file = TelegramFile {
            file_path: "stickers/".to_string(),
            bytes: Vec::new(),
        };
        assert!(archive.store(&file).await.is_err());
    }

    #[tokio::test]
    async fn test_store_fails_on_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let archive = MediaArchive::new(dir.path().join("missing"), "http://m");
        let file = TelegramFile {
            file_path: "a.webp".to_string(),
            bytes: Vec::new(),
        };
        assert!(archive.store(&file).await.is_err());
    }
}
