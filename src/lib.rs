/*!
 * Keysmith
 *
 * RSA key-pair management for a single local identity: generate a pair, keep it
 * in a secure store, and use it to encrypt, decrypt, sign and verify.
 *
 * - Encryption uses RSAES-PKCS1-v1_5; payloads are limited to `bits/8 - 11` bytes
 * - Signatures are RSASSA-PKCS1-v1_5 over a SHA-256 digest
 * - Key material is exchanged and stored as PKCS#1 DER
 *
 * All RSA arithmetic is delegated to the `rsa` crate.
 */

/// Key pair entity, lifecycle and operations
pub mod keypair;

/// RSA provider handles and primitives
pub mod provider;

/// Secure stores for key material
pub mod store;

/// Key sizes and store configuration
pub mod config;

/// Error types for key-pair operations
pub mod error;

pub use config::{StoreConfig, WriteMode, DEFAULT_KEY_SIZE};
pub use error::{KeyPairError, KeyPairResult};
pub use keypair::KeyPair;
pub use store::{FileStore, MemoryStore, SecureStore, StoredKeyMaterial};

/// Commonly used types in one import
///
/// ```
/// use keysmith::prelude::*;
///
/// fn main() -> Result<(), KeyPairError> {
///     let store = MemoryStore::new();
///     let key_pair = KeyPair::generate(Some("device-key"), 1024)?;
///     key_pair.save_to_store(&store)?;
///
///     let signature = key_pair.sign(b"server nonce")?;
///     assert!(key_pair.verify(&signature, b"server nonce")?);
///     Ok(())
/// }
/// ```
pub mod prelude {
    pub use crate::config::{SealingParams, StoreConfig, WriteMode, DEFAULT_KEY_SIZE};
    pub use crate::error::{KeyPairError, KeyPairResult};
    pub use crate::keypair::KeyPair;
    pub use crate::store::{FileStore, MemoryStore, SecureStore, StoredKeyMaterial};
}
