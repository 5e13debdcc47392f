use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::BaseDirs;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::APP_NAME;

const SESSION_FILE_NAME: &str = "session.toml";

#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionFile {
    #[serde(rename = "apiKey", skip_serializing_if = "Option::is_none")]
    api_key: Option<String>,
}

/// The access key for the current user, mirrored to disk so it survives
/// restarts.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
    key: Option<String>,
}

impl SessionStore {
    /// Reads the persisted key at `path`; a missing file is an empty session.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let key = if path.exists() {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("failed to read session file {}", path.display()))?;
            let file: SessionFile = toml::from_str(&raw)
                .with_context(|| format!("failed to parse session file {}", path.display()))?;
            file.api_key.filter(|key| !key.trim().is_empty())
        } else {
            None
        };

        debug!(
            "session loaded from {} (key present: {})",
            path.display(),
            key.is_some()
        );
        Ok(Self { path, key })
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.key.is_some()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn commit(&mut self, key: &str) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create session dir: {}", dir.display()))?;
        }
        let file = SessionFile {
            api_key: Some(key.to_string()),
        };
        let raw = toml::to_string(&file).context("failed to serialize session")?;
        fs::write(&self.path, raw)
            .with_context(|| format!("failed to write session file {}", self.path.display()))?;
        self.key = Some(key.to_string());
        info!("session stored");
        Ok(())
    }

    /// Forgets the key in memory and on disk.
    pub fn clear(&mut self) -> Result<()> {
        self.key = None;
        if self.path.exists() {
            fs::remove_file(&self.path).with_context(|| {
                format!("failed to remove session file {}", self.path.display())
            })?;
        }
        info!("session cleared");
        Ok(())
    }
}

pub fn data_root() -> Result<PathBuf> {
    let base = BaseDirs::new().context("unable to determine base directories")?;
    Ok(base.data_dir().join(APP_NAME))
}

pub fn default_path() -> Result<PathBuf> {
    Ok(data_root()?.join(SESSION_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty_session() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::load(dir.path().join("session.toml")).unwrap();
        assert!(!store.is_active());
        assert_eq!(store.key(), None);
    }

    #[test]
    fn test_commit_persists_across_loads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("session.toml");

        let mut store = SessionStore::load(&path).unwrap();
        store.commit("me@example.com").unwrap();
        assert_eq!(store.key(), Some("me@example.com"));

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("apiKey = \"me@example.com\""));

        let reloaded = SessionStore::load(&path).unwrap();
        assert_eq!(reloaded.key(), Some("me@example.com"));
    }

    #[test]
    fn test_clear_removes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.toml");
        let mut store = SessionStore::load(&path).unwrap();
        store.commit("me@example.com").unwrap();

        store.clear().unwrap();
        assert!(!store.is_active());
        assert!(!path.exists());
        assert!(!SessionStore::load(&path).unwrap().is_active());
    }

    #[test]
    fn test_blank_key_is_ignored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.toml");
        fs::write(&path, "apiKey = \"  \"\n").unwrap();
        assert!(!SessionStore::load(&path).unwrap().is_active());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.toml");
        fs::write(&path, "apiKey = [").unwrap();
        let err = SessionStore::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse session file"));
    }
}
