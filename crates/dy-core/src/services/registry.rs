use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use crate::error::{PlatformError, Result};

pub const HEADER: &str = "folder_name";

/// Flat record store of created folder names: a `folder_name` header line
/// followed by one name per line.
pub struct FolderRegistry {
    path: PathBuf,
}

impl FolderRegistry {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the store exists. Anything other than a regular file at its
    /// path is malformed.
    async fn exists(&self) -> Result<bool> {
        match tokio::fs::metadata(&self.path).await {
            Ok(meta) if meta.is_file() => Ok(true),
            Ok(_) => Err(PlatformError::MalformedRegistry {
                path: self.path.clone(),
                reason: "not a regular file".into(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(PlatformError::Registry(format!("failed to stat registry: {e}"))),
        }
    }

    pub async fn load(&self) -> Result<Vec<String>> {
        if !self.exists().await? {
            return Ok(Vec::new());
        }
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| PlatformError::Registry(format!("failed to read registry: {e}")))?;
        self.parse(&contents)
    }

    fn parse(&self, contents: &str) -> Result<Vec<String>> {
        let mut lines = contents.lines().map(|l| l.trim_end_matches('\r'));
        match lines.next() {
            Some(HEADER) => {}
            Some(other) => {
                return Err(PlatformError::MalformedRegistry {
                    path: self.path.clone(),
                    reason: format!("expected header '{HEADER}', found '{other}'"),
                })
            }
            None => {
                return Err(PlatformError::MalformedRegistry {
                    path: self.path.clone(),
                    reason: "file is empty".into(),
                })
            }
        }
        Ok(lines
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Append one record, creating the store with its header if absent.
    /// Does not check for an existing record of the same name.
    pub async fn save(&self, name: &str) -> Result<()> {
        if !self.exists().await? {
            return self.write_all(&[name.to_string()]).await;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| PlatformError::Registry(format!("failed to open registry: {e}")))?;
        file.write_all(format!("{name}\n").as_bytes())
            .await
            .map_err(|e| PlatformError::Registry(format!("failed to append to registry: {e}")))?;
        Ok(())
    }

    /// Rewrite the store without any record of `name`.
    pub async fn remove(&self, name: &str) -> Result<()> {
        if !self.exists().await? {
            return Ok(());
        }
        let names = self.load().await?;
        let kept: Vec<String> = names.into_iter().filter(|n| n != name).collect();
        self.write_all(&kept).await
    }

    pub async fn contains(&self, name: &str) -> Result<bool> {
        Ok(self.load().await?.iter().any(|n| n == name))
    }

    /// Bring the store in line with the directories under `root`: records
    /// without a directory and repeated records are dropped. The store is
    /// only rewritten when something changed.
    pub async fn reconcile(&self, root: &Path) -> Result<Vec<String>> {
        let names = self.load().await?;
        let mut seen = HashSet::new();
        let mut kept = Vec::with_capacity(names.len());
        for name in &names {
            if !root.join(name).is_dir() {
                tracing::warn!(folder = %name, "dropping registry record with no folder on disk");
                continue;
            }
            if !seen.insert(name.as_str()) {
                tracing::warn!(folder = %name, "dropping duplicate registry record");
                continue;
            }
            kept.push(name.clone());
        }
        if kept.len() != names.len() {
            self.write_all(&kept).await?;
        }
        Ok(kept)
    }

    async fn write_all(&self, names: &[String]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                PlatformError::Registry(format!("failed to create registry dir: {e}"))
            })?;
        }
        let mut contents = String::from(HEADER);
        contents.push('\n');
        for name in names {
            contents.push_str(name);
            contents.push('\n');
        }
        tokio::fs::write(&self.path, contents)
            .await
            .map_err(|e| PlatformError::Registry(format!("failed to write registry: {e}")))?;
        Ok(())
    }
}
