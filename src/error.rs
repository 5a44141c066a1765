/*!
 * Error Handling for Keysmith
 *
 * Every fallible operation returns a `KeyPairError` describing which stage failed,
 * a numeric error code, and enough context to tell caller-fixable conditions
 * (oversized payload, missing identifier) apart from infrastructure faults
 * (unreadable store, provider failure).
 */

use std::collections::HashMap;
use thiserror::Error;

/// Error type for all key-pair lifecycle and cryptographic operations
#[derive(Debug, Error)]
pub enum KeyPairError {
    #[error("Key generation failed: {operation} - {cause}")]
    GenerationError {
        operation: String,
        cause: String,
        error_code: u32,
    },

    #[error("Cryptographic provider failure: {operation} - {cause}")]
    ProviderError {
        operation: String,
        cause: String,
        error_code: u32,
    },

    #[error("Key pair '{identifier}' not found in store")]
    NotFound { identifier: String, error_code: u32 },

    #[error("Key store could not be read: {identifier} - {cause}")]
    StoreAccessError {
        identifier: String,
        cause: String,
        error_code: u32,
        context: HashMap<String, String>,
    },

    #[error("Key store rejected write: {identifier} - {cause}")]
    StoreWriteError {
        identifier: String,
        cause: String,
        error_code: u32,
        context: HashMap<String, String>,
    },

    #[error("Precondition failed: {operation} requires {requirement}")]
    PreconditionError {
        operation: String,
        requirement: String,
        error_code: u32,
    },

    #[error("Encryption failed: {cause}")]
    EncryptionError {
        cause: String,
        error_code: u32,
        context: HashMap<String, String>,
    },

    #[error("Decryption failed: {cause}")]
    DecryptionError { cause: String, error_code: u32 },

    #[error("Signing failed: {cause}")]
    SigningError { cause: String, error_code: u32 },

    #[error("Malformed signature: expected {expected} - got {actual}")]
    VerificationError {
        expected: String,
        actual: String,
        error_code: u32,
    },

    #[error("Invalid key material: {parameter} - {expected} - got {actual}")]
    InvalidKeyMaterial {
        parameter: String,
        expected: String,
        actual: String,
        error_code: u32,
    },
}

/// Error code constants for different error categories
pub mod error_codes {
    // Generation errors: 1000-1999
    pub const KEY_SIZE_UNSUPPORTED: u32 = 1001;
    pub const KEY_GENERATION_FAILED: u32 = 1002;

    // Provider errors: 2000-2999
    pub const KEY_EXPORT_FAILED: u32 = 2002;
    pub const KEY_IMPORT_FAILED: u32 = 2003;

    // Store errors: 3000-3999
    pub const KEY_NOT_FOUND: u32 = 3001;
    pub const STORE_READ_FAILED: u32 = 3002;
    pub const STORE_ENTRY_CORRUPT: u32 = 3003;
    pub const STORE_UNSEAL_FAILED: u32 = 3004;
    pub const STORE_WRITE_FAILED: u32 = 3101;
    pub const STORE_DUPLICATE_ENTRY: u32 = 3102;
    pub const STORE_SEAL_FAILED: u32 = 3103;

    // Precondition errors: 4000-4999
    pub const IDENTIFIER_MISSING: u32 = 4001;
    pub const PASSPHRASE_MISSING: u32 = 4002;

    // Operation errors: 5000-5999
    pub const PAYLOAD_TOO_LARGE: u32 = 5001;
    pub const ENCRYPTION_FAILED: u32 = 5002;
    pub const DECRYPTION_FAILED: u32 = 5101;
    pub const SIGNING_FAILED: u32 = 5201;
    pub const SIGNATURE_MALFORMED: u32 = 5301;

    // Key material errors: 6000-6999
    pub const INVALID_KEY_ENCODING: u32 = 6001;
    pub const KEY_SIZE_MISMATCH: u32 = 6002;
    pub const KEY_HALVES_MISMATCH: u32 = 6003;
}

impl KeyPairError {
    /// Get the numeric error code for this error
    pub fn error_code(&self) -> u32 {
        match self {
            KeyPairError::GenerationError { error_code, .. } => *error_code,
            KeyPairError::ProviderError { error_code, .. } => *error_code,
            KeyPairError::NotFound { error_code, .. } => *error_code,
            KeyPairError::StoreAccessError { error_code, .. } => *error_code,
            KeyPairError::StoreWriteError { error_code, .. } => *error_code,
            KeyPairError::PreconditionError { error_code, .. } => *error_code,
            KeyPairError::EncryptionError { error_code, .. } => *error_code,
            KeyPairError::DecryptionError { error_code, .. } => *error_code,
            KeyPairError::SigningError { error_code, .. } => *error_code,
            KeyPairError::VerificationError { error_code, .. } => *error_code,
            KeyPairError::InvalidKeyMaterial { error_code, .. } => *error_code,
        }
    }

    /// Get the error category/type as a string
    pub fn error_type(&self) -> &'static str {
        match self {
            KeyPairError::GenerationError { .. } => "GenerationError",
            KeyPairError::ProviderError { .. } => "ProviderError",
            KeyPairError::NotFound { .. } => "NotFound",
            KeyPairError::StoreAccessError { .. } => "StoreAccessError",
            KeyPairError::StoreWriteError { .. } => "StoreWriteError",
            KeyPairError::PreconditionError { .. } => "PreconditionError",
            KeyPairError::EncryptionError { .. } => "EncryptionError",
            KeyPairError::DecryptionError { .. } => "DecryptionError",
            KeyPairError::SigningError { .. } => "SigningError",
            KeyPairError::VerificationError { .. } => "VerificationError",
            KeyPairError::InvalidKeyMaterial { .. } => "InvalidKeyMaterial",
        }
    }

    /// Whether the caller can fix this condition by changing its input,
    /// as opposed to an infrastructure fault in the store or provider.
    pub fn is_user_actionable(&self) -> bool {
        match self {
            KeyPairError::GenerationError { error_code, .. } => {
                *error_code == error_codes::KEY_SIZE_UNSUPPORTED
            }
            KeyPairError::StoreWriteError { error_code, .. } => {
                *error_code == error_codes::STORE_DUPLICATE_ENTRY
            }
            KeyPairError::EncryptionError { error_code, .. } => {
                *error_code == error_codes::PAYLOAD_TOO_LARGE
            }
            KeyPairError::NotFound { .. }
            | KeyPairError::PreconditionError { .. }
            | KeyPairError::DecryptionError { .. }
            | KeyPairError::VerificationError { .. }
            | KeyPairError::InvalidKeyMaterial { .. } => true,
            KeyPairError::ProviderError { .. }
            | KeyPairError::StoreAccessError { .. }
            | KeyPairError::SigningError { .. } => false,
        }
    }

    /// Get a user-friendly error message
    pub fn user_friendly_message(&self) -> String {
        match self {
            KeyPairError::GenerationError { error_code, .. }
                if *error_code == error_codes::KEY_SIZE_UNSUPPORTED =>
            {
                "The requested key size is not supported. Use 1024, 2048, 3072 or 4096 bits."
                    .to_string()
            }
            KeyPairError::GenerationError { .. } => {
                "A new key pair could not be generated.".to_string()
            }
            KeyPairError::ProviderError { operation, .. } => {
                format!(
                    "The cryptographic provider failed during '{}'. The key pair could not be used.",
                    operation
                )
            }
            KeyPairError::NotFound { identifier, .. } => {
                format!("No key pair named '{}' exists in the key store.", identifier)
            }
            KeyPairError::StoreAccessError { identifier, .. } => {
                format!(
                    "The key store entry '{}' could not be read. It may be corrupted or locked.",
                    identifier
                )
            }
            KeyPairError::StoreWriteError {
                identifier,
                error_code,
                ..
            } => {
                if *error_code == error_codes::STORE_DUPLICATE_ENTRY {
                    format!("A key pair named '{}' is already stored.", identifier)
                } else {
                    format!("The key pair '{}' could not be saved.", identifier)
                }
            }
            KeyPairError::PreconditionError {
                operation,
                requirement,
                ..
            } => format!("Operation '{}' requires {}.", operation, requirement),
            KeyPairError::EncryptionError {
                error_code,
                context,
                ..
            } if *error_code == error_codes::PAYLOAD_TOO_LARGE => {
                let limit = context.get("max_len").map(String::as_str).unwrap_or("?");
                format!(
                    "The payload is too large for this key: at most {} bytes can be encrypted.",
                    limit
                )
            }
            KeyPairError::EncryptionError { .. } => "The data could not be encrypted.".to_string(),
            KeyPairError::DecryptionError { .. } => {
                "The ciphertext could not be decrypted with this key pair.".to_string()
            }
            KeyPairError::SigningError { .. } => {
                "The data could not be signed with this key pair.".to_string()
            }
            KeyPairError::VerificationError { .. } => {
                "The signature is malformed and cannot be checked.".to_string()
            }
            KeyPairError::InvalidKeyMaterial { parameter, .. } => {
                format!("The supplied key material ('{}') is not valid.", parameter)
            }
        }
    }

    /// Get suggested remediation steps
    pub fn suggested_remediation(&self) -> Option<String> {
        match self {
            KeyPairError::GenerationError { error_code, .. } => match *error_code {
                error_codes::KEY_SIZE_UNSUPPORTED => {
                    Some("Generate the key pair with a supported size, 2048 bits is recommended.".to_string())
                }
                _ => Some("Check the system random number generator and retry.".to_string()),
            },
            KeyPairError::NotFound { .. } => {
                Some("Generate a new key pair and save it, or check the identifier.".to_string())
            }
            KeyPairError::StoreAccessError { error_code, .. } => match *error_code {
                error_codes::STORE_UNSEAL_FAILED => {
                    Some("Open the key store with the passphrase it was sealed with.".to_string())
                }
                _ => Some("Check key store permissions and integrity.".to_string()),
            },
            KeyPairError::StoreWriteError { error_code, .. } => match *error_code {
                error_codes::STORE_DUPLICATE_ENTRY => Some(
                    "Delete the existing entry first or open the store in replace mode.".to_string(),
                ),
                _ => Some("Check key store permissions and available disk space.".to_string()),
            },
            KeyPairError::PreconditionError { error_code, .. } => match *error_code {
                error_codes::PASSPHRASE_MISSING => {
                    Some("Supply the passphrase when opening a sealed key store.".to_string())
                }
                _ => Some("Assign an identifier with `with_identifier` before saving.".to_string()),
            },
            KeyPairError::EncryptionError { error_code, .. } => match *error_code {
                error_codes::PAYLOAD_TOO_LARGE => Some(
                    "Split the payload or use hybrid encryption: encrypt a symmetric key with RSA and the payload with the symmetric key."
                        .to_string(),
                ),
                _ => None,
            },
            KeyPairError::DecryptionError { .. } => Some(
                "Make sure the ciphertext was produced for this key pair and was not modified."
                    .to_string(),
            ),
            KeyPairError::VerificationError { .. } => Some(
                "Pass the signature bytes exactly as produced; its length must equal the key size in bytes."
                    .to_string(),
            ),
            KeyPairError::InvalidKeyMaterial { .. } => Some(
                "Supply PKCS#1 DER encoded keys from the same pair, with the declared size.".to_string(),
            ),
            KeyPairError::ProviderError { .. } | KeyPairError::SigningError { .. } => None,
        }
    }

    /// Get technical details for debugging
    pub fn technical_details(&self) -> HashMap<String, String> {
        let mut details = HashMap::new();

        details.insert("error_code".to_string(), self.error_code().to_string());
        details.insert("error_type".to_string(), self.error_type().to_string());
        details.insert("timestamp".to_string(), chrono::Utc::now().to_rfc3339());

        match self {
            KeyPairError::GenerationError {
                operation, cause, ..
            }
            | KeyPairError::ProviderError {
                operation, cause, ..
            } => {
                details.insert("operation".to_string(), operation.clone());
                details.insert("cause".to_string(), cause.clone());
            }
            KeyPairError::NotFound { identifier, .. } => {
                details.insert("identifier".to_string(), identifier.clone());
            }
            KeyPairError::StoreAccessError {
                identifier,
                cause,
                context,
                ..
            }
            | KeyPairError::StoreWriteError {
                identifier,
                cause,
                context,
                ..
            } => {
                details.insert("identifier".to_string(), identifier.clone());
                details.insert("cause".to_string(), cause.clone());
                details.extend(context.clone());
            }
            KeyPairError::EncryptionError { cause, context, .. } => {
                details.insert("cause".to_string(), cause.clone());
                details.extend(context.clone());
            }
            KeyPairError::InvalidKeyMaterial {
                parameter,
                expected,
                actual,
                ..
            } => {
                details.insert("parameter".to_string(), parameter.clone());
                details.insert("expected".to_string(), expected.clone());
                details.insert("actual".to_string(), actual.clone());
            }
            _ => {
                details.insert("details".to_string(), format!("{:?}", self));
            }
        }

        details
    }
}

/// Convenience constructors for common error types
impl KeyPairError {
    pub fn generation_error(operation: &str, cause: &str, error_code: u32) -> Self {
        KeyPairError::GenerationError {
            operation: operation.to_string(),
            cause: cause.to_string(),
            error_code,
        }
    }

    pub fn provider_error(operation: &str, cause: &str, error_code: u32) -> Self {
        KeyPairError::ProviderError {
            operation: operation.to_string(),
            cause: cause.to_string(),
            error_code,
        }
    }

    pub fn not_found(identifier: &str) -> Self {
        KeyPairError::NotFound {
            identifier: identifier.to_string(),
            error_code: error_codes::KEY_NOT_FOUND,
        }
    }

    pub fn store_access_error(identifier: &str, cause: &str, error_code: u32) -> Self {
        KeyPairError::StoreAccessError {
            identifier: identifier.to_string(),
            cause: cause.to_string(),
            error_code,
            context: HashMap::new(),
        }
    }

    pub fn store_write_error(identifier: &str, cause: &str, error_code: u32) -> Self {
        KeyPairError::StoreWriteError {
            identifier: identifier.to_string(),
            cause: cause.to_string(),
            error_code,
            context: HashMap::new(),
        }
    }

    pub fn precondition(operation: &str, requirement: &str, error_code: u32) -> Self {
        KeyPairError::PreconditionError {
            operation: operation.to_string(),
            requirement: requirement.to_string(),
            error_code,
        }
    }

    pub fn missing_identifier(operation: &str) -> Self {
        Self::precondition(operation, "an identifier", error_codes::IDENTIFIER_MISSING)
    }

    pub fn payload_too_large(max_len: usize, actual_len: usize) -> Self {
        let mut context = HashMap::new();
        context.insert("max_len".to_string(), max_len.to_string());
        context.insert("actual_len".to_string(), actual_len.to_string());

        KeyPairError::EncryptionError {
            cause: format!(
                "plaintext of {} bytes exceeds the {} byte limit of the key",
                actual_len, max_len
            ),
            error_code: error_codes::PAYLOAD_TOO_LARGE,
            context,
        }
    }

    pub fn encryption_error(cause: &str) -> Self {
        KeyPairError::EncryptionError {
            cause: cause.to_string(),
            error_code: error_codes::ENCRYPTION_FAILED,
            context: HashMap::new(),
        }
    }

    pub fn decryption_error(cause: &str) -> Self {
        KeyPairError::DecryptionError {
            cause: cause.to_string(),
            error_code: error_codes::DECRYPTION_FAILED,
        }
    }

    pub fn signing_error(cause: &str) -> Self {
        KeyPairError::SigningError {
            cause: cause.to_string(),
            error_code: error_codes::SIGNING_FAILED,
        }
    }

    pub fn malformed_signature(expected: &str, actual: &str) -> Self {
        KeyPairError::VerificationError {
            expected: expected.to_string(),
            actual: actual.to_string(),
            error_code: error_codes::SIGNATURE_MALFORMED,
        }
    }

    pub fn invalid_key_material(parameter: &str, expected: &str, actual: &str, error_code: u32) -> Self {
        KeyPairError::InvalidKeyMaterial {
            parameter: parameter.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
            error_code,
        }
    }

    /// Attach a key/value pair to the context of a store or encryption error.
    /// Other variants are returned unchanged.
    pub fn with_context(mut self, key: &str, value: &str) -> Self {
        match &mut self {
            KeyPairError::StoreAccessError { context, .. }
            | KeyPairError::StoreWriteError { context, .. }
            | KeyPairError::EncryptionError { context, .. } => {
                context.insert(key.to_string(), value.to_string());
            }
            _ => {}
        }
        self
    }
}

/// Result type alias for key-pair operations
pub type KeyPairResult<T> = Result<T, KeyPairError>;
