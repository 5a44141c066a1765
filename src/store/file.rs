/*!
 * File-backed key store
 *
 * All entries live in one JSON document. Every change rewrites the document to a
 * uniquely named temporary file next to it and renames it into place, so readers
 * see either the old or the new document and never a partial one. Writers take
 * an advisory lock on a sibling `.lock` file for the whole read-modify-write, so
 * separate handles and separate processes on one path never drop each other's
 * entries.
 */

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use fd_lock::RwLock as FileLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zeroize::Zeroizing;

use super::sealing::{SealedBlob, Sealer};
use super::{SecureStore, StoredKeyMaterial, WriteMode};
use crate::config::{SealingParams, StoreConfig};
use crate::error::{error_codes, KeyPairError, KeyPairResult};

/// Version of the key store file format
const STORE_FORMAT_VERSION: u8 = 1;

/// Key store file format
#[derive(Debug, Serialize, Deserialize)]
struct KeyStoreFile {
    /// Version of the key store format
    version: u8,
    /// Entries by identifier
    keys: BTreeMap<String, FileEntry>,
}

impl KeyStoreFile {
    fn empty() -> Self {
        Self {
            version: STORE_FORMAT_VERSION,
            keys: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct FileEntry {
    key_size_in_bits: usize,
    /// Base64 PKCS#1 DER
    public_key: String,
    private_key: PrivateKeyEntry,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "encoding", rename_all = "snake_case")]
enum PrivateKeyEntry {
    Plain {
        data: String,
    },
    Sealed {
        salt: String,
        nonce: String,
        ciphertext: String,
        /// Argon2id parameters the entry was sealed with
        #[serde(default)]
        params: Option<SealingParams>,
    },
}

/// Key store persisted as a JSON file, optionally sealing private keys with a passphrase
pub struct FileStore {
    path: PathBuf,
    write_mode: WriteMode,
    sealer: Option<Sealer>,
    lock: Mutex<()>,
}

impl FileStore {
    /// Unsealed store at `path` that replaces existing entries on save
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_mode: WriteMode::Replace,
            sealer: None,
            lock: Mutex::new(()),
        }
    }

    /// Store at `path` whose private keys are sealed with `passphrase`
    pub fn with_passphrase<P: AsRef<Path>>(path: P, passphrase: &str, params: SealingParams) -> Self {
        Self {
            sealer: Some(Sealer::new(passphrase, params)),
            ..Self::new(path)
        }
    }

    /// Open a store described by `config`, creating its directory if needed
    ///
    /// A config with sealing parameters needs a passphrase. A passphrase
    /// without sealing parameters seals with the default parameters.
    pub fn open(config: &StoreConfig, passphrase: Option<&str>) -> KeyPairResult<Self> {
        let sealer = match (passphrase, config.sealing) {
            (Some(passphrase), params) => Some(Sealer::new(passphrase, params.unwrap_or_default())),
            (None, Some(_)) => {
                return Err(KeyPairError::precondition(
                    "open_store",
                    "a passphrase for a sealed key store",
                    error_codes::PASSPHRASE_MISSING,
                ))
            }
            (None, None) => None,
        };

        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                log::warn!("Creating missing key store directory {}", parent.display());
                fs::create_dir_all(parent).map_err(|e| {
                    KeyPairError::store_access_error(
                        "*",
                        &format!("Failed to create key store directory: {}", e),
                        error_codes::STORE_READ_FAILED,
                    )
                    .with_context("path", &parent.display().to_string())
                })?;
            }
        }

        Ok(Self {
            path: config.path.clone(),
            write_mode: config.write_mode,
            sealer,
            lock: Mutex::new(()),
        })
    }

    /// Use `write_mode` for subsequent saves
    pub fn write_mode(mut self, write_mode: WriteMode) -> Self {
        self.write_mode = write_mode;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_sealed(&self) -> bool {
        self.sealer.is_some()
    }

    fn guard(&self, identifier: &str) -> KeyPairResult<MutexGuard<'_, ()>> {
        self.lock.lock().map_err(|_| {
            KeyPairError::store_write_error(identifier, "store lock poisoned", error_codes::STORE_WRITE_FAILED)
        })
    }

    fn lock_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "keystore".to_string());
        self.path.with_file_name(format!(".{}.lock", file_name))
    }

    /// Run a read-modify-write of the store file while holding both the
    /// in-process mutex and the advisory file lock
    fn locked_update<T>(
        &self,
        identifier: &str,
        update: impl FnOnce() -> KeyPairResult<T>,
    ) -> KeyPairResult<T> {
        let _guard = self.guard(identifier)?;

        let lock_path = self.lock_path();
        let lock_error = |e: std::io::Error| {
            KeyPairError::store_write_error(
                identifier,
                &format!("Failed to lock key store: {}", e),
                error_codes::STORE_WRITE_FAILED,
            )
            .with_context("path", &lock_path.display().to_string())
        };

        let lock_file = open_lock_file(&lock_path).map_err(lock_error)?;
        let mut lock = FileLock::new(lock_file);
        let _file_guard = lock.write().map_err(lock_error)?;

        update()
    }

    fn read_file(&self, identifier: &str) -> KeyPairResult<KeyStoreFile> {
        if !self.path.exists() {
            return Ok(KeyStoreFile::empty());
        }

        let contents = fs::read_to_string(&self.path).map_err(|e| {
            KeyPairError::store_access_error(
                identifier,
                &format!("Failed to read key store: {}", e),
                error_codes::STORE_READ_FAILED,
            )
            .with_context("path", &self.path.display().to_string())
        })?;

        let store: KeyStoreFile = serde_json::from_str(&contents).map_err(|e| {
            KeyPairError::store_access_error(
                identifier,
                &format!("Failed to parse key store: {}", e),
                error_codes::STORE_ENTRY_CORRUPT,
            )
            .with_context("path", &self.path.display().to_string())
        })?;

        if store.version != STORE_FORMAT_VERSION {
            return Err(KeyPairError::store_access_error(
                identifier,
                &format!("Unsupported key store version {}", store.version),
                error_codes::STORE_ENTRY_CORRUPT,
            ));
        }

        log::debug!("Read {} key store entries from {}", store.keys.len(), self.path.display());
        Ok(store)
    }

    fn write_file(&self, identifier: &str, store: &KeyStoreFile) -> KeyPairResult<()> {
        let write_error = |cause: String| {
            KeyPairError::store_write_error(identifier, &cause, error_codes::STORE_WRITE_FAILED)
                .with_context("path", &self.path.display().to_string())
        };

        let serialized = serde_json::to_string_pretty(store)
            .map_err(|e| write_error(format!("Failed to serialize key store: {}", e)))?;

        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "keystore".to_string());
        let temp_path = self
            .path
            .with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));

        let result = write_private_file(&temp_path, serialized.as_bytes())
            .and_then(|()| fs::rename(&temp_path, &self.path));

        if let Err(e) = result {
            let _ = fs::remove_file(&temp_path);
            return Err(write_error(format!("Failed to write key store: {}", e)));
        }

        log::debug!("Wrote {} key store entries to {}", store.keys.len(), self.path.display());
        Ok(())
    }

    fn encode_entry(&self, identifier: &str, material: &StoredKeyMaterial) -> KeyPairResult<FileEntry> {
        let private_key = match &self.sealer {
            Some(sealer) => {
                let blob = sealer.seal(identifier, &material.private_key)?;
                PrivateKeyEntry::Sealed {
                    salt: base64::encode(&blob.salt),
                    nonce: base64::encode(&blob.nonce),
                    ciphertext: base64::encode(&blob.ciphertext),
                    params: Some(blob.params),
                }
            }
            None => PrivateKeyEntry::Plain {
                data: base64::encode(material.private_key.as_slice()),
            },
        };

        Ok(FileEntry {
            key_size_in_bits: material.key_size_in_bits,
            public_key: base64::encode(&material.public_key),
            private_key,
            created_at: material.created_at,
            modified_at: Utc::now(),
        })
    }

    fn decode_entry(&self, identifier: &str, entry: &FileEntry) -> KeyPairResult<StoredKeyMaterial> {
        let decode = |field: &str, value: &str| {
            base64::decode(value).map_err(|e| {
                KeyPairError::store_access_error(
                    identifier,
                    &format!("Invalid base64 in {}: {}", field, e),
                    error_codes::STORE_ENTRY_CORRUPT,
                )
            })
        };

        let private_key = match &entry.private_key {
            PrivateKeyEntry::Plain { data } => Zeroizing::new(decode("private_key", data)?),
            PrivateKeyEntry::Sealed {
                salt,
                nonce,
                ciphertext,
                params,
            } => {
                let sealer = self.sealer.as_ref().ok_or_else(|| {
                    KeyPairError::store_access_error(
                        identifier,
                        "entry is sealed and the store was opened without a passphrase",
                        error_codes::STORE_UNSEAL_FAILED,
                    )
                })?;
                let blob = SealedBlob {
                    salt: decode("salt", salt)?,
                    nonce: decode("nonce", nonce)?,
                    ciphertext: decode("ciphertext", ciphertext)?,
                    params: params.unwrap_or_else(|| sealer.params()),
                };
                sealer.unseal(identifier, &blob)?
            }
        };

        Ok(StoredKeyMaterial {
            public_key: decode("public_key", &entry.public_key)?,
            private_key,
            key_size_in_bits: entry.key_size_in_bits,
            created_at: entry.created_at,
        })
    }
}

#[cfg(unix)]
fn open_lock_file(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;

    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_lock_file(path: &Path) -> std::io::Result<fs::File> {
    OpenOptions::new().read(true).write(true).create(true).open(path)
}

#[cfg(unix)]
fn write_private_file(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(contents)?;
    file.sync_all()
}

#[cfg(not(unix))]
fn write_private_file(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    file.write_all(contents)?;
    file.sync_all()
}

/// Errors reading the store during a write are reported as write failures
fn as_write_error(identifier: &str, err: KeyPairError) -> KeyPairError {
    KeyPairError::store_write_error(identifier, &err.to_string(), error_codes::STORE_WRITE_FAILED)
}

impl SecureStore for FileStore {
    fn put(&self, identifier: &str, material: &StoredKeyMaterial) -> KeyPairResult<()> {
        self.locked_update(identifier, || {
            let mut store = self
                .read_file(identifier)
                .map_err(|e| as_write_error(identifier, e))?;

            let existing = store.keys.get(identifier).map(|entry| entry.created_at);
            if self.write_mode == WriteMode::CreateNew && existing.is_some() {
                return Err(KeyPairError::store_write_error(
                    identifier,
                    "an entry with this identifier already exists",
                    error_codes::STORE_DUPLICATE_ENTRY,
                ));
            }

            let mut entry = self.encode_entry(identifier, material)?;
            if let Some(created_at) = existing {
                entry.created_at = created_at;
            }
            store.keys.insert(identifier.to_string(), entry);
            self.write_file(identifier, &store)
        })
    }

    fn get(&self, identifier: &str) -> KeyPairResult<Option<StoredKeyMaterial>> {
        let store = self.read_file(identifier)?;
        match store.keys.get(identifier) {
            Some(entry) => self.decode_entry(identifier, entry).map(Some),
            None => Ok(None),
        }
    }

    fn exists(&self, identifier: &str) -> bool {
        match self.read_file(identifier) {
            Ok(store) => store.keys.contains_key(identifier),
            Err(e) => {
                log::warn!("Treating '{}' as absent: {}", identifier, e);
                false
            }
        }
    }

    fn delete(&self, identifier: &str) -> KeyPairResult<()> {
        self.locked_update(identifier, || {
            let mut store = self
                .read_file(identifier)
                .map_err(|e| as_write_error(identifier, e))?;

            if store.keys.remove(identifier).is_none() {
                return Ok(());
            }

            self.write_file(identifier, &store)
        })
    }

    fn list(&self) -> KeyPairResult<Vec<String>> {
        let store = self.read_file("*")?;
        Ok(store.keys.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn material(tag: u8) -> StoredKeyMaterial {
        StoredKeyMaterial::new(&[tag; 16], &[tag; 32], 1024)
    }

    #[test]
    fn test_file_store_put_get() {
        let temp_dir = tempdir().unwrap();
        let store = FileStore::new(temp_dir.path().join("keystore.json"));

        store.put("alice", &material(7)).unwrap();

        let loaded = store.get("alice").unwrap().unwrap();
        assert_eq!(loaded.public_key, vec![7; 16]);
        assert_eq!(*loaded.private_key, vec![7; 32]);
        assert_eq!(loaded.key_size_in_bits, 1024);
        assert!(store.get("bob").unwrap().is_none());
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("keystore.json");

        FileStore::new(&path).put("alice", &material(1)).unwrap();

        let reopened = FileStore::new(&path);
        assert!(reopened.exists("alice"));
        assert_eq!(reopened.list().unwrap(), vec!["alice"]);
    }

    #[test]
    fn test_file_store_leaves_no_temp_files() {
        let temp_dir = tempdir().unwrap();
        let store = FileStore::new(temp_dir.path().join("keystore.json"));

        store.put("alice", &material(1)).unwrap();
        store.put("bob", &material(2)).unwrap();
        store.delete("alice").unwrap();

        let mut names: Vec<String> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec![".keystore.json.lock", "keystore.json"]);
    }

    #[test]
    fn test_file_store_delete_is_idempotent() {
        let temp_dir = tempdir().unwrap();
        let store = FileStore::new(temp_dir.path().join("keystore.json"));

        store.delete("nobody").unwrap();
        store.put("alice", &material(1)).unwrap();
        store.delete("alice").unwrap();
        store.delete("alice").unwrap();
        assert!(!store.exists("alice"));
    }

    #[test]
    fn test_file_store_create_new_rejects_duplicate() {
        let temp_dir = tempdir().unwrap();
        let store =
            FileStore::new(temp_dir.path().join("keystore.json")).write_mode(WriteMode::CreateNew);

        store.put("alice", &material(1)).unwrap();
        let err = store.put("alice", &material(2)).unwrap_err();
        assert_eq!(err.error_code(), error_codes::STORE_DUPLICATE_ENTRY);
    }

    #[test]
    fn test_corrupt_file_is_access_error() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("keystore.json");
        fs::write(&path, "{ not json").unwrap();

        let store = FileStore::new(&path);
        let err = store.get("alice").unwrap_err();
        assert_eq!(err.error_type(), "StoreAccessError");
        assert_eq!(err.error_code(), error_codes::STORE_ENTRY_CORRUPT);

        // exists never fails
        assert!(!store.exists("alice"));

        // a write must not clobber the unreadable file
        let err = store.put("alice", &material(1)).unwrap_err();
        assert_eq!(err.error_type(), "StoreWriteError");
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[test]
    fn test_sealed_store_hides_private_key() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("keystore.json");
        let store = FileStore::with_passphrase(&path, "hunter2", SealingParams::low_resource());

        store.put("alice", &material(9)).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"encoding\": \"sealed\""));
        assert!(!raw.contains(&base64::encode([9u8; 32])));

        let loaded = store.get("alice").unwrap().unwrap();
        assert_eq!(*loaded.private_key, vec![9; 32]);
    }

    #[test]
    fn test_sealed_entry_without_passphrase() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("keystore.json");
        FileStore::with_passphrase(&path, "hunter2", SealingParams::low_resource())
            .put("alice", &material(9))
            .unwrap();

        let err = FileStore::new(&path).get("alice").unwrap_err();
        assert_eq!(err.error_code(), error_codes::STORE_UNSEAL_FAILED);

        let wrong = FileStore::with_passphrase(&path, "letmein", SealingParams::low_resource());
        let err = wrong.get("alice").unwrap_err();
        assert_eq!(err.error_code(), error_codes::STORE_UNSEAL_FAILED);
    }

    #[test]
    fn test_separate_handles_keep_each_others_entries() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("keystore.json");

        for round in 0..5 {
            let writers: Vec<_> = (0..8)
                .map(|i| {
                    let path = path.clone();
                    std::thread::spawn(move || {
                        let store = FileStore::new(&path);
                        store
                            .put(&format!("round-{}-key-{}", round, i), &material(i as u8))
                            .unwrap();
                    })
                })
                .collect();
            for writer in writers {
                writer.join().unwrap();
            }

            let identifiers = FileStore::new(&path).list().unwrap();
            assert_eq!(identifiers.len(), 8 * (round + 1));
        }
    }

    #[test]
    fn test_replace_keeps_creation_time() {
        let temp_dir = tempdir().unwrap();
        let store = FileStore::new(temp_dir.path().join("keystore.json"));

        store.put("alice", &material(1)).unwrap();
        let created_at = store.get("alice").unwrap().unwrap().created_at;

        let mut replacement = material(2);
        replacement.created_at = created_at + chrono::Duration::hours(1);
        store.put("alice", &replacement).unwrap();

        let loaded = store.get("alice").unwrap().unwrap();
        assert_eq!(loaded.created_at, created_at);
        assert_eq!(loaded.public_key, vec![2; 16]);
    }

    #[test]
    fn test_sealed_entry_opens_under_other_default_params() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("keystore.json");
        FileStore::with_passphrase(&path, "hunter2", SealingParams::low_resource())
            .put("alice", &material(9))
            .unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"memory_cost\": 19456"));

        let reopened = FileStore::open(&StoreConfig::at(&path), Some("hunter2")).unwrap();
        let loaded = reopened.get("alice").unwrap().unwrap();
        assert_eq!(*loaded.private_key, vec![9; 32]);
    }

    #[test]
    fn test_open_sealed_config_requires_passphrase() {
        let temp_dir = tempdir().unwrap();
        let config = StoreConfig {
            path: temp_dir.path().join("nested").join("keystore.json"),
            write_mode: WriteMode::Replace,
            sealing: Some(SealingParams::low_resource()),
        };

        let err = FileStore::open(&config, None).err().unwrap();
        assert_eq!(err.error_code(), error_codes::PASSPHRASE_MISSING);

        let store = FileStore::open(&config, Some("hunter2")).unwrap();
        assert!(store.is_sealed());
        assert!(temp_dir.path().join("nested").is_dir());
    }
}
