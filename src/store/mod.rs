/*!
 * Secure Key Stores
 *
 * A store keeps one record per identifier holding both halves of a key pair,
 * so a pair is always written or removed as a unit.
 */

use std::fmt;

use chrono::{DateTime, Utc};
use zeroize::Zeroizing;

use crate::error::KeyPairResult;

pub mod file;
pub mod memory;
pub mod sealing;

pub use crate::config::WriteMode;
pub use file::FileStore;
pub use memory::MemoryStore;

/// Raw key material as persisted by a store
#[derive(Clone)]
pub struct StoredKeyMaterial {
    /// PKCS#1 DER public key
    pub public_key: Vec<u8>,
    /// PKCS#1 DER private key
    pub private_key: Zeroizing<Vec<u8>>,
    /// Modulus size in bits
    pub key_size_in_bits: usize,
    /// When the entry was first written
    pub created_at: DateTime<Utc>,
}

impl StoredKeyMaterial {
    pub fn new(public_key: &[u8], private_key: &[u8], key_size_in_bits: usize) -> Self {
        Self {
            public_key: public_key.to_vec(),
            private_key: Zeroizing::new(private_key.to_vec()),
            key_size_in_bits,
            created_at: Utc::now(),
        }
    }
}

impl fmt::Debug for StoredKeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredKeyMaterial")
            .field("public_key_len", &self.public_key.len())
            .field("private_key", &"[REDACTED]")
            .field("key_size_in_bits", &self.key_size_in_bits)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Persistent storage for key pairs, keyed by identifier
///
/// Implementations must make `put` and `delete` atomic per identifier and
/// must be safe to share between threads.
pub trait SecureStore: Send + Sync {
    /// Store both halves of a key pair under `identifier`
    ///
    /// Replacing an entry keeps the `created_at` of the entry it replaces.
    fn put(&self, identifier: &str, material: &StoredKeyMaterial) -> KeyPairResult<()>;

    /// Fetch the entry for `identifier`, or `None` if there is none
    fn get(&self, identifier: &str) -> KeyPairResult<Option<StoredKeyMaterial>>;

    /// Whether an entry exists; never fails
    fn exists(&self, identifier: &str) -> bool;

    /// Remove the entry for `identifier`; removing a missing entry is not an error
    fn delete(&self, identifier: &str) -> KeyPairResult<()>;

    /// Identifiers of all stored entries, sorted
    fn list(&self) -> KeyPairResult<Vec<String>>;
}
