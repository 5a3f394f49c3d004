use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use dcx_core::ports::adapter::{AdapterError, DirEntry, FileSystemAdapter, ProtocolAdapter};

use crate::error::FsAdapterError;

/// `tokio::fs`-backed filesystem adapter. Every relative path is resolved
/// against `root`, the same way `dcx-http`'s adapter resolves every request
/// against a base URL.
pub struct TokioFileSystemAdapter {
    root: PathBuf,
    connected: AtomicBool,
}

impl TokioFileSystemAdapter {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            connected: AtomicBool::new(false),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }

    fn io_err(path: &Path, source: std::io::Error) -> AdapterError {
        FsAdapterError::Io {
            path: path.display().to_string(),
            source,
        }
        .into()
    }
}

#[async_trait]
impl ProtocolAdapter for TokioFileSystemAdapter {
    async fn connect(&self) -> Result<(), AdapterError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| Self::io_err(&self.root, e))?;
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), AdapterError> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FileSystemAdapter for TokioFileSystemAdapter {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>, AdapterError> {
        let resolved = self.resolve(path);
        tokio::fs::read(&resolved).await.map_err(|e| Self::io_err(&resolved, e))
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<(), AdapterError> {
        let resolved = self.resolve(path);
        if let Some(parent) = resolved.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| Self::io_err(parent, e))?;
        }
        tokio::fs::write(&resolved, data).await.map_err(|e| Self::io_err(&resolved, e))
    }

    async fn delete_file(&self, path: &str) -> Result<(), AdapterError> {
        let resolved = self.resolve(path);
        tokio::fs::remove_file(&resolved).await.map_err(|e| Self::io_err(&resolved, e))
    }

    async fn list_directory(&self, path: &str) -> Result<Vec<DirEntry>, AdapterError> {
        let resolved = self.resolve(path);
        let mut read_dir = tokio::fs::read_dir(&resolved).await.map_err(|e| Self::io_err(&resolved, e))?;

        let mut entries = Vec::new();
        while let Some(entry) = read_dir.next_entry().await.map_err(|e| Self::io_err(&resolved, e))? {
            let file_type = entry.file_type().await.map_err(|e| Self::io_err(&resolved, e))?;
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_file: file_type.is_file(),
                is_directory: file_type.is_dir(),
            });
        }
        Ok(entries)
    }

    async fn create_directory(&self, path: &str) -> Result<(), AdapterError> {
        let resolved = self.resolve(path);
        tokio::fs::create_dir_all(&resolved).await.map_err(|e| Self::io_err(&resolved, e))
    }

    async fn delete_directory(&self, path: &str, recursive: bool) -> Result<(), AdapterError> {
        let resolved = self.resolve(path);
        if recursive {
            tokio::fs::remove_dir_all(&resolved).await.map_err(|e| Self::io_err(&resolved, e))
        } else {
            tokio::fs::remove_dir(&resolved).await.map_err(|e| Self::io_err(&resolved, e))
        }
    }

    async fn exists(&self, path: &str) -> Result<bool, AdapterError> {
        Ok(tokio::fs::metadata(self.resolve(path)).await.is_ok())
    }

    async fn is_file(&self, path: &str) -> Result<bool, AdapterError> {
        Ok(tokio::fs::metadata(self.resolve(path))
            .await
            .map(|m| m.is_file())
            .unwrap_or(false))
    }

    async fn is_directory(&self, path: &str) -> Result<bool, AdapterError> {
        Ok(tokio::fs::metadata(self.resolve(path))
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false))
    }
}
