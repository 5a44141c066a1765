//! Configuration for key generation and key stores.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Recommended RSA modulus size in bits
pub const DEFAULT_KEY_SIZE: usize = 2048;

/// Modulus sizes the provider accepts
pub const SUPPORTED_KEY_SIZES: [usize; 4] = [1024, 2048, 3072, 4096];

/// Bytes consumed by PKCS#1 v1.5 encryption padding
pub const PKCS1_PADDING_OVERHEAD: usize = 11;

/// Returns true if `bits` is one of [`SUPPORTED_KEY_SIZES`]
pub fn is_supported_key_size(bits: usize) -> bool {
    SUPPORTED_KEY_SIZES.contains(&bits)
}

/// Largest plaintext, in bytes, that PKCS#1 v1.5 can encrypt under a `bits` modulus
pub fn max_plaintext_len(bits: usize) -> usize {
    (bits / 8).saturating_sub(PKCS1_PADDING_OVERHEAD)
}

/// How a store treats a save under an identifier it already holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// The new entry replaces the old one
    #[default]
    Replace,
    /// The save fails with a duplicate-entry error
    CreateNew,
}

/// Argon2id parameters used to seal private keys at rest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealingParams {
    /// Memory cost (in KB)
    pub memory_cost: u32,
    /// Time cost (iterations)
    pub time_cost: u32,
    /// Parallelism factor
    pub parallelism: u32,
}

impl Default for SealingParams {
    fn default() -> Self {
        Self {
            memory_cost: 65536, // 64 MB
            time_cost: 3,
            parallelism: 4,
        }
    }
}

impl SealingParams {
    /// Low-resource mode for constrained environments
    pub fn low_resource() -> Self {
        Self {
            memory_cost: 19456, // 19 MB
            time_cost: 2,
            parallelism: 1,
        }
    }

    /// High-security mode for long-lived identities
    pub fn high_security() -> Self {
        Self {
            memory_cost: 262144, // 256 MB
            time_cost: 4,
            parallelism: 8,
        }
    }
}

/// File key store configuration
///
/// Deserializable so applications can embed it in their own config files.
/// The passphrase is never part of the config and is supplied when the
/// store is opened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Location of the key store file
    pub path: PathBuf,
    /// Behaviour on a save under an existing identifier
    pub write_mode: WriteMode,
    /// Sealing parameters; `None` stores private keys unsealed
    pub sealing: Option<SealingParams>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            write_mode: WriteMode::default(),
            sealing: None,
        }
    }
}

impl StoreConfig {
    /// Config for a store file at `path` with default settings
    pub fn at<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }
}

/// Default key store location: `~/.keysmith/keys/keystore.json`
pub fn default_store_path() -> PathBuf {
    let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(".keysmith");
    path.push("keys");
    path.push("keystore.json");
    path
}
