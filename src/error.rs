//! Error type shared across the crate.

use std::path::PathBuf;

use thiserror::Error;

/// Represents errors that can occur in the certy store.
///
/// Variants are grouped by who is at fault: bad caller input, corrupt on-disk
/// state, or a failing primitive / filesystem.
#[derive(Debug, Error)]
pub enum CertyError {
    /// The validity string is not `<integer><unit>`.
    #[error("Invalid duration format: {0:?}")]
    InvalidFormat(String),

    /// The validity unit is not one of `h`, `d`, `w`, `m` or `y`.
    #[error("Invalid duration unit: {0:?}")]
    InvalidUnit(String),

    /// The validity number does not fit in a duration.
    #[error("Invalid duration number: {0:?}")]
    InvalidNumber(String),

    /// No certificate exists at the given path.
    #[error("Certificate not found: {0:?}")]
    CertificateNotFound(String),

    /// `cert.pem` does not hold a single PEM `CERTIFICATE` block.
    #[error("File is not a PEM-encoded certificate: {}", .0.display())]
    NotACertificate(PathBuf),

    /// The certificate DER could not be parsed.
    #[error("Malformed certificate in {}: {message}", path.display())]
    MalformedCertificate { path: PathBuf, message: String },

    /// A certificate directory is not named after the certificate it holds.
    #[error("Directory {} does not match certificate id {id}", path.display())]
    DirectoryMismatch { path: PathBuf, id: String },

    /// `key.pem` could not be read.
    #[error("Unable to read private key {}: {message}", path.display())]
    KeyUnreadable { path: PathBuf, message: String },

    /// `key.pem` is not a PKCS#8 private key.
    #[error("Malformed private key: {0}")]
    MalformedKey(String),

    /// The PKCS#8 key is not an RSA key.
    #[error("Private key is not an RSA key")]
    NotAnRsaKey,

    /// Error during key generation.
    #[error("Key generation error: {0}")]
    KeyGenerationError(String),

    /// Error during certificate signing.
    #[error("Signing error: {0}")]
    SigningError(String),

    /// Error during data encoding.
    #[error("Failed to encode data: {0}")]
    EncodingError(String),

    /// The issuer's serial counter cannot be incremented any further.
    #[error("Serial numbers exhausted in {}", .0.display())]
    SerialExhausted(PathBuf),

    /// A filesystem operation failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The final rename of a new certificate directory failed.
    ///
    /// The on-disk tree may no longer match memory; the store should not be
    /// used for further writes until it is reopened.
    #[error("Fatal storage error moving {} to {}: {source}", from.display(), to.display())]
    Fatal {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, CertyError>;

impl CertyError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CertyError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<der::Error> for CertyError {
    /// Converts a `der::Error` into a `CertyError`.
    fn from(err: der::Error) -> Self {
        CertyError::EncodingError(err.to_string())
    }
}

impl From<rsa::Error> for CertyError {
    fn from(err: rsa::Error) -> Self {
        CertyError::KeyGenerationError(err.to_string())
    }
}

impl From<pkcs8::Error> for CertyError {
    fn from(err: pkcs8::Error) -> Self {
        CertyError::MalformedKey(err.to_string())
    }
}

impl From<pkcs8::spki::Error> for CertyError {
    fn from(err: pkcs8::spki::Error) -> Self {
        CertyError::EncodingError(err.to_string())
    }
}
