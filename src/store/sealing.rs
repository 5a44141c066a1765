/*!
 * Passphrase sealing of private keys at rest
 *
 * Each sealed blob gets its own random salt and nonce and records the Argon2id
 * parameters it was sealed with. The derived key encrypts the private key with
 * ChaCha20-Poly1305, and the entry identifier is bound as associated data so a
 * blob cannot be moved to another entry.
 */

use argon2::{Algorithm, Argon2, Params, Version};
use chacha20poly1305::{
    aead::{Aead, AeadCore, KeyInit, OsRng, Payload},
    ChaCha20Poly1305, Key, Nonce,
};
use rand::RngCore;
use zeroize::Zeroizing;

use crate::config::SealingParams;
use crate::error::{error_codes, KeyPairError, KeyPairResult};

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

/// Sealed private key as written to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedBlob {
    pub salt: Vec<u8>,
    pub nonce: Vec<u8>,
    pub ciphertext: Vec<u8>,
    /// Key derivation parameters used at sealing time
    pub params: SealingParams,
}

/// Seals and unseals private keys with a passphrase
pub struct Sealer {
    passphrase: Zeroizing<String>,
    params: SealingParams,
}

impl Sealer {
    pub fn new(passphrase: &str, params: SealingParams) -> Self {
        Self {
            passphrase: Zeroizing::new(passphrase.to_string()),
            params,
        }
    }

    /// Parameters applied to newly sealed blobs
    pub fn params(&self) -> SealingParams {
        self.params
    }

    fn derive_key(
        &self,
        salt: &[u8],
        params: SealingParams,
    ) -> Result<Zeroizing<[u8; KEY_LEN]>, argon2::Error> {
        let params = Params::new(
            params.memory_cost,
            params.time_cost,
            params.parallelism,
            Some(KEY_LEN),
        )?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        argon2.hash_password_into(self.passphrase.as_bytes(), salt, &mut key[..])?;
        Ok(key)
    }

    /// Encrypt `plaintext` for the entry `identifier`
    pub fn seal(&self, identifier: &str, plaintext: &[u8]) -> KeyPairResult<SealedBlob> {
        let mut salt = vec![0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);

        let key = self.derive_key(&salt, self.params).map_err(|e| {
            KeyPairError::store_write_error(
                identifier,
                &format!("Failed to derive sealing key: {}", e),
                error_codes::STORE_SEAL_FAILED,
            )
        })?;

        let cipher = ChaCha20Poly1305::new(Key::from_slice(&key[..]));
        let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
        let ciphertext = cipher
            .encrypt(
                &nonce,
                Payload {
                    msg: plaintext,
                    aad: identifier.as_bytes(),
                },
            )
            .map_err(|e| {
                KeyPairError::store_write_error(
                    identifier,
                    &format!("Failed to seal private key: {}", e),
                    error_codes::STORE_SEAL_FAILED,
                )
            })?;

        Ok(SealedBlob {
            salt,
            nonce: nonce.to_vec(),
            ciphertext,
            params: self.params,
        })
    }

    /// Decrypt a blob sealed for the entry `identifier`
    ///
    /// The key is derived with the parameters stored in the blob, not the
    /// sealer's own. A wrong passphrase and a tampered blob are
    /// indistinguishable and both fail.
    pub fn unseal(&self, identifier: &str, blob: &SealedBlob) -> KeyPairResult<Zeroizing<Vec<u8>>> {
        if blob.nonce.len() != NONCE_LEN {
            return Err(KeyPairError::store_access_error(
                identifier,
                &format!("sealed entry has a {}-byte nonce", blob.nonce.len()),
                error_codes::STORE_ENTRY_CORRUPT,
            ));
        }

        let key = self.derive_key(&blob.salt, blob.params).map_err(|e| {
            KeyPairError::store_access_error(
                identifier,
                &format!("Failed to derive sealing key: {}", e),
                error_codes::STORE_UNSEAL_FAILED,
            )
        })?;

        let cipher = ChaCha20Poly1305::new(Key::from_slice(&key[..]));
        let plaintext = cipher
            .decrypt(
                Nonce::from_slice(&blob.nonce),
                Payload {
                    msg: &blob.ciphertext,
                    aad: identifier.as_bytes(),
                },
            )
            .map_err(|_| {
                KeyPairError::store_access_error(
                    identifier,
                    "wrong passphrase or tampered entry",
                    error_codes::STORE_UNSEAL_FAILED,
                )
            })?;

        Ok(Zeroizing::new(plaintext))
    }
}
