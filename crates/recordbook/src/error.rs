//! Error type for the recordbook facade

use recordbook_xlsx::XlsxError;
use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Any failure raised while building, writing or reading a workbook
#[derive(Debug, Error)]
pub enum Error {
    /// Model error: unsupported value, missing columns, bad sheet name...
    #[error(transparent)]
    Core(#[from] recordbook_core::Error),

    /// Package error: password, encryption or archive structure
    #[error(transparent)]
    Xlsx(#[from] XlsxError),
}

impl Error {
    /// Whether asking the user for another password could help
    pub fn is_password_error(&self) -> bool {
        matches!(self, Error::Xlsx(e) if e.is_password_error())
    }

    /// Whether the input bytes are unusable as a workbook
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Error::Xlsx(XlsxError::CorruptPackage(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let err: Error = XlsxError::DecryptionFailed("bad verifier".into()).into();
        assert!(err.is_password_error());
        assert!(!err.is_corrupt());

        let err: Error = XlsxError::InvalidPassword.into();
        assert!(err.is_password_error());

        let err: Error = XlsxError::CorruptPackage("truncated".into()).into();
        assert!(err.is_corrupt());
        assert!(!err.is_password_error());

        let err: Error = recordbook_core::Error::NoColumnsDefined("People".into()).into();
        assert!(!err.is_corrupt());
        assert!(!err.is_password_error());
        assert_eq!(err.to_string(), "Sheet 'People' has no columns defined");
    }
}
