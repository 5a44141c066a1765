/*!
 * RSA key pair for a local identity
 *
 * Raw PKCS#1 DER material is the source of truth; provider handles are derived
 * from it once and kept for repeated operations. Persistence is always an
 * explicit step through a `SecureStore`.
 */

use std::fmt;
use std::sync::OnceLock;

use zeroize::Zeroizing;

use crate::config::{is_supported_key_size, max_plaintext_len, SUPPORTED_KEY_SIZES};
use crate::error::{error_codes, KeyPairError, KeyPairResult};
use crate::provider::{self, PrivateKeyHandle, ProviderHandles, PublicKeyHandle};
use crate::store::{SecureStore, StoredKeyMaterial};

/// RSA public/private key pair
///
/// Both halves are always present and consistent with `key_size_in_bits`.
/// Cryptographic operations take `&self` and may run concurrently.
#[derive(Clone)]
pub struct KeyPair {
    identifier: Option<String>,
    key_size_in_bits: usize,
    public_key_material: Vec<u8>,
    private_key_material: Zeroizing<Vec<u8>>,
    handles: OnceLock<ProviderHandles>,
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("identifier", &self.identifier)
            .field("key_size_in_bits", &self.key_size_in_bits)
            .field("public_key_material", &hex::encode(&self.public_key_material))
            .field("private_key_material", &"[REDACTED]")
            .field("registered", &self.is_registered())
            .finish()
    }
}

impl KeyPair {
    /// Generate a new RSA key pair
    ///
    /// # Arguments
    ///
    /// * `identifier` - Name of the pair within a store, or `None` for an ephemeral pair
    /// * `bits` - Modulus size; one of 1024, 2048, 3072 or 4096 (2048 recommended)
    ///
    /// # Returns
    ///
    /// A new, unsaved KeyPair or an error if the size is unsupported or generation failed
    pub fn generate(identifier: Option<&str>, bits: usize) -> KeyPairResult<Self> {
        if !is_supported_key_size(bits) {
            return Err(KeyPairError::generation_error(
                "generate",
                &format!("{} bits is not one of {:?}", bits, SUPPORTED_KEY_SIZES),
                error_codes::KEY_SIZE_UNSUPPORTED,
            ));
        }

        let (exported, handles) = provider::generate(bits)?;

        log::info!(
            "Generated {}-bit RSA key pair {}",
            bits,
            identifier.unwrap_or("(ephemeral)")
        );

        Ok(Self {
            identifier: identifier.map(str::to_string),
            key_size_in_bits: bits,
            public_key_material: exported.public_key,
            private_key_material: exported.private_key,
            handles: OnceLock::from(handles),
        })
    }

    /// Wrap previously exported PKCS#1 DER material without touching any store
    ///
    /// Only structural validation is performed: both halves must decode as
    /// PKCS#1 DER, have a `bits`-bit modulus and share their public parameters.
    /// Provider keys are not built until the first operation or an explicit
    /// [`KeyPair::register`], which is also where an internally inconsistent
    /// private key is detected.
    pub fn from_raw_material(
        identifier: Option<&str>,
        private_key_bytes: &[u8],
        public_key_bytes: &[u8],
        bits: usize,
    ) -> KeyPairResult<Self> {
        provider::validate_material(public_key_bytes, private_key_bytes, bits)?;

        Ok(Self {
            identifier: identifier.map(str::to_string),
            key_size_in_bits: bits,
            public_key_material: public_key_bytes.to_vec(),
            private_key_material: Zeroizing::new(private_key_bytes.to_vec()),
            handles: OnceLock::new(),
        })
    }

    /// Load a previously saved key pair
    pub fn load_from_store(store: &dyn SecureStore, identifier: &str) -> KeyPairResult<Self> {
        let material = store
            .get(identifier)?
            .ok_or_else(|| KeyPairError::not_found(identifier))?;

        log::debug!("Loaded key pair {} from store", identifier);

        Self::from_raw_material(
            Some(identifier),
            &material.private_key,
            &material.public_key,
            material.key_size_in_bits,
        )
        .map_err(|e| {
            KeyPairError::store_access_error(
                identifier,
                &format!("Stored key material is invalid: {}", e),
                error_codes::STORE_ENTRY_CORRUPT,
            )
        })
    }

    /// Whether this pair's identifier is present in `store`
    ///
    /// Never fails; an ephemeral pair is never in a store.
    pub fn exists_in_store(&self, store: &dyn SecureStore) -> bool {
        match &self.identifier {
            Some(identifier) => store.exists(identifier),
            None => false,
        }
    }

    /// Persist both halves of the pair under its identifier
    pub fn save_to_store(&self, store: &dyn SecureStore) -> KeyPairResult<()> {
        let identifier = self
            .identifier
            .as_deref()
            .ok_or_else(|| KeyPairError::missing_identifier("save_to_store"))?;

        let material = StoredKeyMaterial::new(
            &self.public_key_material,
            &self.private_key_material,
            self.key_size_in_bits,
        );
        store.put(identifier, &material)?;

        log::info!("Saved key pair {} to store", identifier);
        Ok(())
    }

    /// Remove the pair from `store`; removing a pair that is not stored succeeds
    pub fn delete(&self, store: &dyn SecureStore) -> KeyPairResult<()> {
        let identifier = self
            .identifier
            .as_deref()
            .ok_or_else(|| KeyPairError::missing_identifier("delete"))?;

        store.delete(identifier)?;

        log::info!("Deleted key pair {} from store", identifier);
        Ok(())
    }

    /// The same key material under a different identifier
    pub fn with_identifier(&self, identifier: &str) -> Self {
        Self {
            identifier: Some(identifier.to_string()),
            ..self.clone()
        }
    }

    /// Create provider handles for the raw material if not done yet
    pub fn register(&self) -> KeyPairResult<()> {
        self.handles().map(|_| ())
    }

    /// Whether provider handles exist for this pair
    pub fn is_registered(&self) -> bool {
        self.handles.get().is_some()
    }

    fn handles(&self) -> KeyPairResult<&ProviderHandles> {
        if let Some(handles) = self.handles.get() {
            return Ok(handles);
        }

        let handles = provider::register(
            &self.public_key_material,
            &self.private_key_material,
            self.key_size_in_bits,
        )
        .map_err(|e| {
            KeyPairError::provider_error(
                "register",
                &e.to_string(),
                error_codes::KEY_IMPORT_FAILED,
            )
        })?;

        Ok(self.handles.get_or_init(|| handles))
    }

    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    pub fn key_size_in_bits(&self) -> usize {
        self.key_size_in_bits
    }

    /// PKCS#1 DER public key
    pub fn public_key_data(&self) -> &[u8] {
        &self.public_key_material
    }

    /// PKCS#1 DER private key
    pub fn private_key_data(&self) -> &[u8] {
        &self.private_key_material
    }

    pub fn public_key_handle(&self) -> Option<&PublicKeyHandle> {
        self.handles.get().map(|handles| &handles.public)
    }

    pub fn private_key_handle(&self) -> Option<&PrivateKeyHandle> {
        self.handles.get().map(|handles| &handles.private)
    }

    /// Largest plaintext `encrypt` accepts, in bytes
    pub fn max_plaintext_len(&self) -> usize {
        max_plaintext_len(self.key_size_in_bits)
    }

    /// Lowercase hex SHA-256 of the public key
    pub fn fingerprint(&self) -> String {
        hex::encode(provider::sha256(&self.public_key_material))
    }

    /// PKCS#1 PEM encoding of the public key, for sharing with peers
    pub fn public_key_pem(&self) -> KeyPairResult<String> {
        provider::public_key_pem(&self.handles()?.public)
    }

    /// Encrypt `plaintext` with the public key using PKCS#1 v1.5 padding
    ///
    /// # Returns
    ///
    /// A ciphertext as long as the modulus, or an `EncryptionError` if the
    /// plaintext is longer than [`KeyPair::max_plaintext_len`]
    pub fn encrypt(&self, plaintext: &[u8]) -> KeyPairResult<Vec<u8>> {
        let max_len = self.max_plaintext_len();
        if plaintext.len() > max_len {
            return Err(KeyPairError::payload_too_large(max_len, plaintext.len()));
        }

        provider::encrypt(&self.handles()?.public, plaintext)
    }

    /// Decrypt a PKCS#1 v1.5 ciphertext with the private key
    pub fn decrypt(&self, ciphertext: &[u8]) -> KeyPairResult<Vec<u8>> {
        provider::decrypt(&self.handles()?.private, ciphertext)
    }

    /// Sign the SHA-256 digest of `data` with PKCS#1 v1.5 padding
    ///
    /// Signing is deterministic: the same key and data always give the same signature.
    pub fn sign(&self, data: &[u8]) -> KeyPairResult<Vec<u8>> {
        let handles = self
            .handles()
            .map_err(|e| KeyPairError::signing_error(&e.to_string()))?;
        provider::sign_sha256(&handles.private, data)
    }

    /// Verify a PKCS#1 v1.5 SHA-256 signature with the public key
    ///
    /// # Returns
    ///
    /// Ok(true) if the signature matches, Ok(false) if it does not, and
    /// Err(VerificationError) only if the signature is malformed
    pub fn verify(&self, signature: &[u8], data: &[u8]) -> KeyPairResult<bool> {
        provider::verify_sha256(&self.handles()?.public, signature, data)
    }

    /// Verify a signature against a peer's PKCS#1 DER public key
    ///
    /// Same semantics as [`KeyPair::verify`], for callers that only hold the
    /// public half of someone else's pair.
    pub fn verify_with_public_key(
        public_key_bytes: &[u8],
        signature: &[u8],
        data: &[u8],
    ) -> KeyPairResult<bool> {
        let public = provider::import_public(public_key_bytes)?;
        provider::verify_sha256(&public, signature, data)
    }
}
