//! src/repositories/json_file.rs
//!
//! Ledger stored as a single JSON document on local disk.

use std::path::{Path, PathBuf};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use couponbook_common::models::Ledger;
use couponbook_common::traits::LedgerRepository;
use crate::Error;

pub const LEDGER_FILE_VERSION: u32 = 1;

/// On-disk layout: `{ "version": 1, "entries": { "<id>": { ... } } }`.
#[derive(Debug, Serialize, Deserialize)]
struct LedgerFile {
    version: u32,
    entries: Ledger,
}

pub struct JsonFileLedgerRepository {
    path: PathBuf,
}

impl JsonFileLedgerRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "ledger.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn write_snapshot(&self, contents: &[u8]) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let tmp = self.temp_path();
        if let Err(e) = self.replace_with(&tmp, contents).await {
            tokio::fs::remove_file(&tmp).await.ok();
            return Err(e);
        }
        Ok(())
    }

    async fn replace_with(&self, tmp: &Path, contents: &[u8]) -> Result<(), Error> {
        let mut file = tokio::fs::File::create(tmp).await?;
        file.write_all(contents).await?;
        file.sync_all().await?;
        drop(file);

        // Readers see either the previous snapshot or this one, never a mix.
        tokio::fs::rename(tmp, &self.path).await?;
        Ok(())
    }
}

fn parse_ledger_file(contents: &str) -> Result<Ledger, String> {
    let parsed: LedgerFile = serde_json::from_str(contents).map_err(|e| e.to_string())?;
    if parsed.version != LEDGER_FILE_VERSION {
        return Err(format!("unsupported ledger version {}", parsed.version));
    }
    Ok(parsed.entries)
}

#[async_trait]
impl LedgerRepository for JsonFileLedgerRepository {
    async fn load(&self) -> Ledger {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No ledger file at {:?}; starting with an empty ledger.", self.path);
                return Ledger::new();
            }
            Err(e) => {
                warn!("Could not read ledger file at {:?}: {:?}; using an empty ledger.", self.path, e);
                return Ledger::new();
            }
        };

        match parse_ledger_file(&contents) {
            Ok(ledger) => {
                info!("Loaded {} ledger entr(ies) from {:?}", ledger.len(), self.path);
                ledger
            }
            Err(e) => {
                warn!("Could not parse ledger file at {:?}: {}; using an empty ledger.", self.path, e);
                Ledger::new()
            }
        }
    }

    async fn persist(&self, ledger: &Ledger) -> Result<(), Error> {
        let file = LedgerFile { version: LEDGER_FILE_VERSION, entries: ledger.clone() };
        let contents = serde_json::to_vec_pretty(&file)
            .map_err(|e| Error::PersistenceUnavailable(format!("serialize ledger: {}", e)))?;

        self.write_snapshot(&contents)
            .await
            .map_err(|e| Error::PersistenceUnavailable(format!("{:?}: {}", self.path, e)))?;

        debug!("Persisted {} ledger entr(ies) to {:?}", ledger.len(), self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        let repo = JsonFileLedgerRepository::new(dir.path().join("ledger.json"));
        assert!(repo.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_persist_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("ledger.json");
        let repo = JsonFileLedgerRepository::new(&path);

        let ledger = Ledger::new().record_use(1, 1000).record_use(1, 6001).record_use(4, 77);
        repo.persist(&ledger).await.unwrap();

        let reloaded = JsonFileLedgerRepository::new(&path).load().await;
        assert_eq!(reloaded, ledger);
        assert!(!repo.temp_path().exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_loads_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(JsonFileLedgerRepository::new(&path).load().await.is_empty());
    }

    #[tokio::test]
    async fn test_wrong_shape_loads_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        std::fs::write(&path, r#"{"version": 1, "entries": {"1": {"use_count": -3}}}"#).unwrap();
        assert!(JsonFileLedgerRepository::new(&path).load().await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_version_loads_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        std::fs::write(&path, r#"{"version": 99, "entries": {}}"#).unwrap();
        assert!(JsonFileLedgerRepository::new(&path).load().await.is_empty());
    }

    #[tokio::test]
    async fn test_persist_into_unwritable_location_fails() {
        let dir = tempdir().unwrap();
        // A regular file where the parent directory should be.
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();
        let repo = JsonFileLedgerRepository::new(blocker.join("ledger.json"));

        let err = repo.persist(&Ledger::new().record_use(1, 1)).await.unwrap_err();
        assert!(matches!(err, Error::PersistenceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_failed_replace_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        // A non-empty directory sits where the ledger file should go, so the
        // final rename fails after the temp file was written.
        let path = dir.path().join("ledger.json");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), "x").unwrap();
        let repo = JsonFileLedgerRepository::new(&path);

        let err = repo.persist(&Ledger::new().record_use(1, 1)).await.unwrap_err();
        assert!(matches!(err, Error::PersistenceUnavailable(_)));
        assert!(!repo.temp_path().exists());
        assert!(path.join("keep").exists());
    }

    #[test]
    fn test_file_layout() {
        let file = LedgerFile { version: 1, entries: Ledger::new().record_use(1, 6001) };
        let json = serde_json::to_value(&file).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "version": 1,
                "entries": { "1": { "use_count": 1, "last_used_at_ms": 6001 } }
            })
        );
    }
}
