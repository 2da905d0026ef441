//! Custody state persistence
//!
//! Saves and loads the whole custody state (wallet, ledgers, event log) as
//! pretty JSON, with rotating backups.
//!
//! A process that mutates the state (a CLI command or the API server) holds
//! the data directory's lock file for as long as it may save, so two writers
//! never overwrite each other's commits.

use crate::multisig::CustodyManager;
use std::fs;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

const LOCK_FILE: &str = "custody.lock";

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Data directory is locked by another process ({0}); remove the file if that process is gone")]
    Locked(PathBuf),
}

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub state_file: String,
    pub backup_enabled: bool,
    pub max_backups: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".custody_data"),
            state_file: "custody.json".to_string(),
            backup_enabled: true,
            max_backups: 5,
        }
    }
}

/// Custody state storage
pub struct Storage {
    config: StorageConfig,
}

impl Storage {
    /// Create a storage manager, creating the data directory if needed
    pub fn new(config: StorageConfig) -> Result<Self, StorageError> {
        fs::create_dir_all(&config.data_dir)?;
        Ok(Self { config })
    }

    pub fn with_defaults() -> Result<Self, StorageError> {
        Self::new(StorageConfig::default())
    }

    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    fn lock_path(&self) -> PathBuf {
        self.config.data_dir.join(LOCK_FILE)
    }

    /// Take exclusive write access to the data directory
    ///
    /// Fails with `Locked` while another guard is alive.
    pub fn lock(&self) -> Result<StorageLock, StorageError> {
        let path = self.lock_path();
        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(StorageError::Locked(path));
            }
            Err(e) => return Err(e.into()),
        };
        writeln!(file, "{}", std::process::id())?;

        log::debug!("Acquired lock {}", path.display());
        Ok(StorageLock { path })
    }

    pub fn is_locked(&self) -> bool {
        self.lock_path().exists()
    }

    fn state_path(&self) -> PathBuf {
        self.config.data_dir.join(&self.config.state_file)
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        self.config
            .data_dir
            .join(format!("{}.backup.{}", self.config.state_file, index))
    }

    /// Save the custody state
    ///
    /// The previous state becomes backup 0. The new state is written to a
    /// temporary file and renamed into place.
    pub fn save(&self, custody: &CustodyManager) -> Result<(), StorageError> {
        let path = self.state_path();

        if self.config.backup_enabled && self.config.max_backups > 0 && path.exists() {
            self.rotate_backups()?;
            fs::copy(&path, self.backup_path(0))?;
        }

        let temp_path = self.config.data_dir.join("custody.tmp");
        write_json(custody, &temp_path)?;
        fs::rename(&temp_path, &path)?;

        log::debug!("Custody state saved to {}", path.display());
        Ok(())
    }

    /// Load the custody state
    ///
    /// The signer registry is re-validated while deserializing.
    pub fn load(&self) -> Result<CustodyManager, StorageError> {
        let path = self.state_path();

        if !path.exists() {
            return Err(StorageError::InvalidData(format!(
                "Custody state not found at {}",
                path.display()
            )));
        }

        read_json(&path)
    }

    pub fn exists(&self) -> bool {
        self.state_path().exists()
    }

    /// Delete the saved state (backups are kept)
    pub fn delete(&self) -> Result<(), StorageError> {
        let path = self.state_path();
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn rotate_backups(&self) -> Result<(), StorageError> {
        let oldest = self.backup_path(self.config.max_backups - 1);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }

        for i in (0..self.config.max_backups - 1).rev() {
            let current = self.backup_path(i);
            if current.exists() {
                fs::rename(&current, self.backup_path(i + 1))?;
            }
        }

        Ok(())
    }

    /// Load a backup (0 is the most recent)
    pub fn restore_backup(&self, backup_index: usize) -> Result<CustodyManager, StorageError> {
        let backup_path = self.backup_path(backup_index);

        if !backup_path.exists() {
            return Err(StorageError::InvalidData(format!(
                "Backup {} not found",
                backup_index
            )));
        }

        read_json(&backup_path)
    }

    /// Indices of existing backups
    pub fn list_backups(&self) -> Vec<usize> {
        (0..self.config.max_backups)
            .filter(|&i| self.backup_path(i).exists())
            .collect()
    }

    pub fn stats(&self) -> Result<StorageStats, StorageError> {
        let path = self.state_path();

        let file_size = if path.exists() {
            fs::metadata(&path)?.len()
        } else {
            0
        };

        Ok(StorageStats {
            file_size,
            backup_count: self.list_backups().len(),
            data_dir: self.config.data_dir.clone(),
        })
    }
}

/// Exclusive write access to a data directory, released on drop
#[derive(Debug)]
pub struct StorageLock {
    path: PathBuf,
}

impl Drop for StorageLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            log::warn!("Failed to release lock {}: {}", self.path.display(), e);
        }
    }
}

/// Storage statistics
#[derive(Debug)]
pub struct StorageStats {
    pub file_size: u64,
    pub backup_count: usize,
    pub data_dir: PathBuf,
}

fn write_json(custody: &CustodyManager, path: &Path) -> Result<(), StorageError> {
    let file = fs::File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, custody)?;
    Ok(())
}

fn read_json(path: &Path) -> Result<CustodyManager, StorageError> {
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);
    Ok(serde_json::from_reader(reader)?)
}

/// Export custody state to a specific file path
pub fn save_to_file(custody: &CustodyManager, path: &Path) -> Result<(), StorageError> {
    write_json(custody, path)
}

/// Import custody state from a specific file path
pub fn load_from_file(path: &Path) -> Result<CustodyManager, StorageError> {
    read_json(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Address;
    use crate::multisig::WalletConfig;

    fn addr(s: &str) -> Address {
        Address::new(s)
    }

    fn create_test_custody() -> CustodyManager {
        let signers = vec![addr("alice"), addr("bob"), addr("carol")];
        CustodyManager::new(WalletConfig::new(2, signers, Some("vault".into()))).unwrap()
    }

    fn test_storage(dir: &Path, max_backups: usize) -> Storage {
        Storage::new(StorageConfig {
            data_dir: dir.to_path_buf(),
            max_backups,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_save_load_custody() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = test_storage(temp_dir.path(), 5);

        let mut custody = create_test_custody();
        custody.native_mut().credit(&addr("funder"), 100).unwrap();
        custody.deposit_native(&addr("funder"), 100).unwrap();
        custody
            .initiate_native_transfer(&addr("alice"), &addr("dave"), 60)
            .unwrap();

        assert!(!storage.exists());
        storage.save(&custody).unwrap();
        assert!(storage.exists());

        let loaded = storage.load().unwrap();
        assert_eq!(loaded.custody_address(), custody.custody_address());
        assert_eq!(loaded.native_custody_balance(), 100);
        assert_eq!(loaded.wallet().transaction_count(), 1);
        assert_eq!(loaded.wallet().events().len(), 1);

        // Executed transactions and their events load back too
        custody.approve_native_transfer(1, &addr("bob")).unwrap();
        storage.save(&custody).unwrap();

        let loaded = storage.load().unwrap();
        assert!(loaded.wallet().transaction(1).unwrap().is_executed());
        assert_eq!(loaded.wallet().events(), custody.wallet().events());
        assert_eq!(loaded.native().balance_of(&addr("dave")), 60);
    }

    #[test]
    fn test_lock_is_exclusive() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = test_storage(temp_dir.path(), 5);
        let other = test_storage(temp_dir.path(), 5);

        let guard = storage.lock().unwrap();
        assert!(other.is_locked());
        assert!(matches!(other.lock(), Err(StorageError::Locked(_))));

        drop(guard);
        assert!(!storage.is_locked());
        let _guard = other.lock().unwrap();
    }

    #[test]
    fn test_load_missing_state() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = test_storage(temp_dir.path(), 5);

        assert!(matches!(storage.load(), Err(StorageError::InvalidData(_))));
    }

    #[test]
    fn test_load_rejects_corrupted_registry() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = test_storage(temp_dir.path(), 5);
        storage.save(&create_test_custody()).unwrap();

        let path = temp_dir.path().join("custody.json");
        let mut value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        value["wallet"]["registry"]["signers"] = serde_json::json!(["alice", "alice"]);
        fs::write(&path, value.to_string()).unwrap();

        assert!(matches!(
            storage.load(),
            Err(StorageError::SerializationError(_))
        ));
    }

    #[test]
    fn test_backup_rotation() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = test_storage(temp_dir.path(), 3);
        let mut custody = create_test_custody();

        for i in 1..=5 {
            custody.native_mut().credit(&addr("funder"), i).unwrap();
            storage.save(&custody).unwrap();
        }

        assert_eq!(storage.list_backups(), vec![0, 1, 2]);

        // Backup 0 is the state before the last save: 1+2+3+4
        let previous = storage.restore_backup(0).unwrap();
        assert_eq!(previous.native().balance_of(&addr("funder")), 10);

        assert!(storage.restore_backup(3).is_err());

        let stats = storage.stats().unwrap();
        assert_eq!(stats.backup_count, 3);
        assert!(stats.file_size > 0);
    }

    #[test]
    fn test_delete() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = test_storage(temp_dir.path(), 5);
        storage.save(&create_test_custody()).unwrap();

        storage.delete().unwrap();
        assert!(!storage.exists());
        storage.delete().unwrap();
    }

    #[test]
    fn test_export_import() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("export.json");
        let custody = create_test_custody();

        save_to_file(&custody, &path).unwrap();
        let imported = load_from_file(&path).unwrap();

        assert_eq!(imported.wallet().quorum(), 2);
        assert_eq!(
            imported.wallet().registry().config().label.as_deref(),
            Some("vault")
        );
    }
}
