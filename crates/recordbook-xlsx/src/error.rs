//! XLSX error types

use thiserror::Error;

/// Result type for XLSX operations
pub type XlsxResult<T> = std::result::Result<T, XlsxError>;

/// Errors that can occur during package reading/writing
#[derive(Debug, Error)]
pub enum XlsxError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// XML error
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Empty-string password supplied
    #[error("Invalid password: an empty password cannot protect a package")]
    InvalidPassword,

    /// Encrypted package with a missing or wrong password, or failed integrity check
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    /// Structurally invalid package, with or without decryption
    #[error("Corrupt package: {0}")]
    CorruptPackage(String),

    /// Encryption envelope could not be produced
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Core error
    #[error("Core error: {0}")]
    Core(#[from] recordbook_core::Error),
}

impl XlsxError {
    pub(crate) fn corrupt<S: Into<String>>(msg: S) -> Self {
        XlsxError::CorruptPackage(msg.into())
    }

    /// Fold every failure that is not password related into `CorruptPackage`
    ///
    /// Applied at the reader's public boundary.
    pub(crate) fn into_read_error(self) -> Self {
        match self {
            XlsxError::InvalidPassword
            | XlsxError::DecryptionFailed(_)
            | XlsxError::CorruptPackage(_) => self,
            other => XlsxError::CorruptPackage(other.to_string()),
        }
    }

    /// Check if the caller should retry with a different password
    pub fn is_password_error(&self) -> bool {
        matches!(
            self,
            XlsxError::InvalidPassword | XlsxError::DecryptionFailed(_)
        )
    }
}
