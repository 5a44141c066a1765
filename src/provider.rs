/*!
 * RSA Cryptographic Provider
 *
 * Thin layer over the `rsa` crate. Key material crosses this boundary as PKCS#1
 * DER bytes; inside it, keys are parsed once into handles that the key pair keeps
 * for repeated operations. No RSA arithmetic is implemented here.
 */

use std::fmt;
use std::sync::Arc;

use rand::rngs::OsRng;
use rsa::pkcs1::{
    DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey, EncodeRsaPublicKey, LineEnding,
    RsaPrivateKey as Pkcs1PrivateKey, RsaPublicKey as Pkcs1PublicKey,
};
use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Encrypt, Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::error::{error_codes, KeyPairError, KeyPairResult};

/// DER prefix of the PKCS#1 v1.5 `DigestInfo` for SHA-256 (RFC 8017, section 9.2).
/// The 32 digest bytes follow it.
pub const SHA256_DIGEST_INFO_PREFIX: [u8; 19] = [
    0x30, 0x31, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x01,
    0x05, 0x00, 0x04, 0x20,
];

/// Provider-owned reference to a parsed public key
#[derive(Clone)]
pub struct PublicKeyHandle(Arc<RsaPublicKey>);

/// Provider-owned reference to a parsed private key
#[derive(Clone)]
pub struct PrivateKeyHandle(Arc<RsaPrivateKey>);

/// Both halves of a registered key pair
#[derive(Clone)]
pub struct ProviderHandles {
    pub public: PublicKeyHandle,
    pub private: PrivateKeyHandle,
}

/// Raw key material exported by the provider
pub struct ExportedKeys {
    pub public_key: Vec<u8>,
    pub private_key: Zeroizing<Vec<u8>>,
}

impl PublicKeyHandle {
    /// Modulus length in bits
    pub fn modulus_bits(&self) -> usize {
        self.0.n().bits()
    }

    /// Modulus length in bytes; also the ciphertext and signature length
    pub fn modulus_len(&self) -> usize {
        self.0.size()
    }
}

impl PrivateKeyHandle {
    pub fn modulus_bits(&self) -> usize {
        self.0.n().bits()
    }
}

impl fmt::Debug for PublicKeyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKeyHandle")
            .field("modulus_bits", &self.modulus_bits())
            .finish()
    }
}

impl fmt::Debug for PrivateKeyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKeyHandle")
            .field("modulus_bits", &self.modulus_bits())
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl fmt::Debug for ProviderHandles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderHandles")
            .field("public", &self.public)
            .field("private", &self.private)
            .finish()
    }
}

/// Generate a fresh RSA key pair using the operating system RNG
///
/// The caller is responsible for checking `bits` against the supported sizes.
pub fn generate(bits: usize) -> KeyPairResult<(ExportedKeys, ProviderHandles)> {
    let private_key = RsaPrivateKey::new(&mut OsRng, bits).map_err(|e| {
        KeyPairError::provider_error(
            "RSA key generation",
            &format!("Failed to generate RSA key: {}", e),
            error_codes::KEY_GENERATION_FAILED,
        )
    })?;
    let public_key = RsaPublicKey::from(&private_key);

    let exported = ExportedKeys {
        public_key: export_public(&public_key)?,
        private_key: export_private(&private_key)?,
    };

    let handles = ProviderHandles {
        public: PublicKeyHandle(Arc::new(public_key)),
        private: PrivateKeyHandle(Arc::new(private_key)),
    };

    Ok((exported, handles))
}

fn export_public(key: &RsaPublicKey) -> KeyPairResult<Vec<u8>> {
    let der = key.to_pkcs1_der().map_err(|e| {
        KeyPairError::provider_error(
            "RSA encoding",
            &format!("Failed to encode RSA public key: {}", e),
            error_codes::KEY_EXPORT_FAILED,
        )
    })?;
    Ok(der.as_bytes().to_vec())
}

fn export_private(key: &RsaPrivateKey) -> KeyPairResult<Zeroizing<Vec<u8>>> {
    let der = key.to_pkcs1_der().map_err(|e| {
        KeyPairError::provider_error(
            "RSA encoding",
            &format!("Failed to encode RSA private key: {}", e),
            error_codes::KEY_EXPORT_FAILED,
        )
    })?;
    Ok(Zeroizing::new(der.as_bytes().to_vec()))
}

/// Parse a PKCS#1 DER public key into a handle
pub fn import_public(der: &[u8]) -> KeyPairResult<PublicKeyHandle> {
    let key = RsaPublicKey::from_pkcs1_der(der).map_err(|e| {
        KeyPairError::invalid_key_material(
            "public_key",
            "PKCS#1 DER RSAPublicKey",
            &e.to_string(),
            error_codes::INVALID_KEY_ENCODING,
        )
    })?;
    Ok(PublicKeyHandle(Arc::new(key)))
}

/// Parse a PKCS#1 DER private key into a handle
pub fn import_private(der: &[u8]) -> KeyPairResult<PrivateKeyHandle> {
    let key = RsaPrivateKey::from_pkcs1_der(der).map_err(|e| {
        KeyPairError::invalid_key_material(
            "private_key",
            "PKCS#1 DER RSAPrivateKey",
            &e.to_string(),
            error_codes::INVALID_KEY_ENCODING,
        )
    })?;
    Ok(PrivateKeyHandle(Arc::new(key)))
}

/// Structural check of exported key material
///
/// Both halves must decode as PKCS#1 DER, have a `bits`-bit modulus and share
/// the same modulus and public exponent. Only the ASN.1 structure is decoded;
/// no provider key is built and the private key's internal consistency is
/// left to [`register`].
pub fn validate_material(public_der: &[u8], private_der: &[u8], bits: usize) -> KeyPairResult<()> {
    let public = Pkcs1PublicKey::try_from(public_der).map_err(|e| {
        KeyPairError::invalid_key_material(
            "public_key",
            "PKCS#1 DER RSAPublicKey",
            &e.to_string(),
            error_codes::INVALID_KEY_ENCODING,
        )
    })?;
    let private = Pkcs1PrivateKey::try_from(private_der).map_err(|e| {
        KeyPairError::invalid_key_material(
            "private_key",
            "PKCS#1 DER RSAPrivateKey",
            &e.to_string(),
            error_codes::INVALID_KEY_ENCODING,
        )
    })?;

    for (parameter, modulus) in [
        ("public_key", public.modulus.as_bytes()),
        ("private_key", private.modulus.as_bytes()),
    ] {
        let actual = bit_length(modulus);
        if actual != bits {
            return Err(KeyPairError::invalid_key_material(
                parameter,
                &format!("{}-bit modulus", bits),
                &format!("{}-bit modulus", actual),
                error_codes::KEY_SIZE_MISMATCH,
            ));
        }
    }

    if public.modulus.as_bytes() != private.modulus.as_bytes()
        || public.public_exponent.as_bytes() != private.public_exponent.as_bytes()
    {
        return Err(KeyPairError::invalid_key_material(
            "public_key",
            "public half of the supplied private key",
            "a different public key",
            error_codes::KEY_HALVES_MISMATCH,
        ));
    }

    Ok(())
}

/// Bit length of a big-endian unsigned integer
fn bit_length(be_bytes: &[u8]) -> usize {
    match be_bytes.iter().position(|b| *b != 0) {
        Some(first) => (be_bytes.len() - first) * 8 - be_bytes[first].leading_zeros() as usize,
        None => 0,
    }
}

/// Validate both halves and parse them into provider handles
///
/// Parsing the private key checks its internal consistency (primes, exponents)
/// and precomputes the CRT values, which makes this the expensive step.
pub fn register(public_der: &[u8], private_der: &[u8], bits: usize) -> KeyPairResult<ProviderHandles> {
    validate_material(public_der, private_der, bits)?;

    let public = import_public(public_der)?;
    let private = import_private(private_der)?;

    log::debug!("Registered {}-bit RSA key pair with provider", bits);

    Ok(ProviderHandles { public, private })
}

/// RSAES-PKCS1-v1_5 encryption with randomized padding
pub fn encrypt(key: &PublicKeyHandle, plaintext: &[u8]) -> KeyPairResult<Vec<u8>> {
    key.0
        .encrypt(&mut OsRng, Pkcs1v15Encrypt, plaintext)
        .map_err(|e| KeyPairError::encryption_error(&format!("RSA-PKCS1 encryption: {}", e)))
}

/// RSAES-PKCS1-v1_5 decryption
///
/// The private-key exponentiation is blinded and unpadding is constant time
/// inside the `rsa` crate. Every failure maps to the same error so callers
/// cannot tell padding faults apart.
pub fn decrypt(key: &PrivateKeyHandle, ciphertext: &[u8]) -> KeyPairResult<Vec<u8>> {
    key.0
        .decrypt_blinded(&mut OsRng, Pkcs1v15Encrypt, ciphertext)
        .map_err(|_| KeyPairError::decryption_error("ciphertext rejected by RSA-PKCS1 decryption"))
}

/// SHA-256 digest of `data`
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// RSASSA-PKCS1-v1_5 signature over the SHA-256 digest of `data`
///
/// Blinded with `OsRng`; the signature itself is still deterministic.
pub fn sign_sha256(key: &PrivateKeyHandle, data: &[u8]) -> KeyPairResult<Vec<u8>> {
    let digest = sha256(data);
    key.0
        .sign_with_rng(&mut OsRng, Pkcs1v15Sign::new::<Sha256>(), &digest)
        .map_err(|e| KeyPairError::signing_error(&format!("RSA-PKCS1 SHA-256 signing: {}", e)))
}

/// Check an RSASSA-PKCS1-v1_5 SHA-256 signature
///
/// Returns `Ok(false)` for any signature that does not match, including one
/// whose integer value is not below the modulus. Only a signature whose length
/// differs from the modulus length is reported as malformed.
pub fn verify_sha256(key: &PublicKeyHandle, signature: &[u8], data: &[u8]) -> KeyPairResult<bool> {
    let expected_len = key.modulus_len();
    if signature.len() != expected_len {
        return Err(KeyPairError::malformed_signature(
            &format!("{} bytes", expected_len),
            &format!("{} bytes", signature.len()),
        ));
    }

    let digest = sha256(data);
    match key.0.verify(Pkcs1v15Sign::new::<Sha256>(), &digest, signature) {
        Ok(()) => Ok(true),
        Err(_) => Ok(false),
    }
}

/// PKCS#1 PEM encoding of the public key
pub fn public_key_pem(key: &PublicKeyHandle) -> KeyPairResult<String> {
    key.0.to_pkcs1_pem(LineEnding::LF).map_err(|e| {
        KeyPairError::provider_error(
            "RSA encoding",
            &format!("Failed to encode RSA public key as PEM: {}", e),
            error_codes::KEY_EXPORT_FAILED,
        )
    })
}
