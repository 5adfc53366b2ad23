//! Password encryption envelope (ECMA-376 Agile encryption)
//!
//! An encrypted package is a compound file holding two streams:
//! `EncryptionInfo` (version header plus an XML descriptor of salts, key
//! sizes and encrypted verifiers) and `EncryptedPackage` (the plain zip
//! package, AES-CBC encrypted in 4096-byte segments). An HMAC over the
//! encrypted stream is stored in the descriptor and checked before
//! decryption.

mod agile;
mod container;
mod info;

use hmac::{Hmac, Mac};
use log::debug;
use sha2::Digest;

use crate::error::{XlsxError, XlsxResult};

pub use info::AgileEncryptionInfo;

/// Signature of a compound file (the encrypted envelope)
pub(crate) const CFB_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Largest spin count accepted, on write and in read descriptors
pub const MAX_SPIN_COUNT: u32 = 10_000_000;

/// Check whether `bytes` start like an encrypted envelope
pub fn is_encrypted_package(bytes: &[u8]) -> bool {
    bytes.starts_with(&CFB_SIGNATURE)
}

/// Hash algorithm used for key derivation and integrity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HashAlgorithm {
    Sha1,
    Sha256,
    Sha384,
    #[default]
    Sha512,
}

impl HashAlgorithm {
    /// Name used in the encryption descriptor
    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha1 => "SHA1",
            HashAlgorithm::Sha256 => "SHA256",
            HashAlgorithm::Sha384 => "SHA384",
            HashAlgorithm::Sha512 => "SHA512",
        }
    }

    /// Parse a descriptor name (`SHA-512` and `SHA512` are both accepted)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.replace('-', "").to_ascii_uppercase().as_str() {
            "SHA1" => Some(HashAlgorithm::Sha1),
            "SHA256" => Some(HashAlgorithm::Sha256),
            "SHA384" => Some(HashAlgorithm::Sha384),
            "SHA512" => Some(HashAlgorithm::Sha512),
            _ => None,
        }
    }

    /// Digest size in bytes
    pub fn size(&self) -> usize {
        match self {
            HashAlgorithm::Sha1 => 20,
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha384 => 48,
            HashAlgorithm::Sha512 => 64,
        }
    }

    pub(crate) fn digest(&self, data: &[u8]) -> Vec<u8> {
        self.digest_parts(&[data])
    }

    /// Digest of the concatenation of `parts`
    pub(crate) fn digest_parts(&self, parts: &[&[u8]]) -> Vec<u8> {
        fn run<D: Digest>(parts: &[&[u8]]) -> Vec<u8> {
            let mut hasher = D::new();
            for part in parts {
                hasher.update(part);
            }
            hasher.finalize().to_vec()
        }

        match self {
            HashAlgorithm::Sha1 => run::<sha1::Sha1>(parts),
            HashAlgorithm::Sha256 => run::<sha2::Sha256>(parts),
            HashAlgorithm::Sha384 => run::<sha2::Sha384>(parts),
            HashAlgorithm::Sha512 => run::<sha2::Sha512>(parts),
        }
    }

    pub(crate) fn hmac(&self, key: &[u8], data: &[u8]) -> XlsxResult<Vec<u8>> {
        fn run<M: Mac + hmac::digest::KeyInit>(key: &[u8], data: &[u8]) -> XlsxResult<Vec<u8>> {
            let mut mac = <M as hmac::digest::KeyInit>::new_from_slice(key)
                .map_err(|e| XlsxError::Encryption(format!("HMAC key: {}", e)))?;
            mac.update(data);
            Ok(mac.finalize().into_bytes().to_vec())
        }

        match self {
            HashAlgorithm::Sha1 => run::<Hmac<sha1::Sha1>>(key, data),
            HashAlgorithm::Sha256 => run::<Hmac<sha2::Sha256>>(key, data),
            HashAlgorithm::Sha384 => run::<Hmac<sha2::Sha384>>(key, data),
            HashAlgorithm::Sha512 => run::<Hmac<sha2::Sha512>>(key, data),
        }
    }
}

/// Parameters of the encryption envelope
///
/// The default matches current Office releases: AES-256, SHA-512 and
/// 100 000 hashing rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncryptionOptions {
    /// Rounds of the iterated password hash
    pub spin_count: u32,
    /// AES key size: 128, 192 or 256
    pub key_bits: u32,
    pub hash_algorithm: HashAlgorithm,
}

impl Default for EncryptionOptions {
    fn default() -> Self {
        Self {
            spin_count: 100_000,
            key_bits: 256,
            hash_algorithm: HashAlgorithm::Sha512,
        }
    }
}

impl EncryptionOptions {
    /// Set the number of password hashing rounds
    pub fn with_spin_count(mut self, spin_count: u32) -> Self {
        self.spin_count = spin_count;
        self
    }

    /// Set the AES key size in bits
    pub fn with_key_bits(mut self, key_bits: u32) -> Self {
        self.key_bits = key_bits;
        self
    }

    /// Set the hash algorithm
    pub fn with_hash_algorithm(mut self, hash_algorithm: HashAlgorithm) -> Self {
        self.hash_algorithm = hash_algorithm;
        self
    }

    pub(crate) fn validate(&self) -> XlsxResult<()> {
        if !matches!(self.key_bits, 128 | 192 | 256) {
            return Err(XlsxError::Encryption(format!(
                "unsupported AES key size {}",
                self.key_bits
            )));
        }
        if self.spin_count == 0 || self.spin_count > MAX_SPIN_COUNT {
            return Err(XlsxError::Encryption(format!(
                "spin count must be between 1 and {}",
                MAX_SPIN_COUNT
            )));
        }
        Ok(())
    }
}

/// Wrap a plain package into the encrypted envelope
pub(crate) fn encrypt_package(
    package: &[u8],
    password: &str,
    options: &EncryptionOptions,
) -> XlsxResult<Vec<u8>> {
    if password.is_empty() {
        return Err(XlsxError::InvalidPassword);
    }
    options.validate()?;

    let (info, encrypted) = agile::encrypt(package, password, options)?;
    let envelope = container::write_envelope(&info.to_bytes(), &encrypted)?;
    debug!(
        "encrypted package: {} plain bytes, {} envelope bytes, AES-{}/{}",
        package.len(),
        envelope.len(),
        options.key_bits,
        options.hash_algorithm.name()
    );
    Ok(envelope)
}

/// Encrypted envelope whose streams and descriptor have been parsed
///
/// Opening checks the container alone, so a damaged or foreign compound
/// file is reported as `CorruptPackage` before any password is involved.
#[derive(Debug)]
pub(crate) struct Envelope {
    info: AgileEncryptionInfo,
    encrypted: Vec<u8>,
}

impl Envelope {
    pub(crate) fn open(bytes: &[u8]) -> XlsxResult<Self> {
        let (info_bytes, encrypted) = container::read_envelope(bytes)?;
        let info = AgileEncryptionInfo::parse(&info_bytes)?;
        Ok(Self { info, encrypted })
    }

    /// Decrypt to the plain package bytes
    ///
    /// A wrong password or failed integrity check gives `DecryptionFailed`.
    pub(crate) fn decrypt(&self, password: &str) -> XlsxResult<Vec<u8>> {
        if password.is_empty() {
            return Err(XlsxError::InvalidPassword);
        }
        debug!(
            "decrypting package: AES-{}/{}, {} spins",
            self.info.password.key_bits,
            self.info.password.hash_algorithm.name(),
            self.info.password.spin_count
        );
        agile::decrypt(&self.info, &self.encrypted, password)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_names() {
        assert_eq!(HashAlgorithm::from_name("SHA512"), Some(HashAlgorithm::Sha512));
        assert_eq!(HashAlgorithm::from_name("SHA-256"), Some(HashAlgorithm::Sha256));
        assert_eq!(HashAlgorithm::from_name("sha1"), Some(HashAlgorithm::Sha1));
        assert_eq!(HashAlgorithm::from_name("MD5"), None);
    }

    #[test]
    fn test_digest_sizes() {
        for alg in [
            HashAlgorithm::Sha1,
            HashAlgorithm::Sha256,
            HashAlgorithm::Sha384,
            HashAlgorithm::Sha512,
        ] {
            assert_eq!(alg.digest(b"abc").len(), alg.size());
            assert_eq!(alg.hmac(b"key", b"abc").unwrap().len(), alg.size());
            assert_eq!(alg.digest_parts(&[b"a".as_slice(), b"bc".as_slice()]), alg.digest(b"abc"));
        }
    }

    #[test]
    fn test_options_validation() {
        assert!(EncryptionOptions::default().validate().is_ok());
        assert!(EncryptionOptions::default().with_key_bits(100).validate().is_err());
        assert!(EncryptionOptions::default().with_spin_count(0).validate().is_err());
        assert!(EncryptionOptions::default()
            .with_spin_count(MAX_SPIN_COUNT + 1)
            .validate()
            .is_err());
    }

    #[test]
    fn test_empty_password_rejected() {
        let err = encrypt_package(b"PK", "", &EncryptionOptions::default()).unwrap_err();
        assert!(matches!(err, XlsxError::InvalidPassword));
    }

    #[test]
    fn test_envelope_round_trip() {
        let options = EncryptionOptions::default().with_spin_count(10);
        let package: Vec<u8> = b"PK\x03\x04".iter().copied().cycle().take(10_000).collect();

        let envelope = encrypt_package(&package, "secret", &options).unwrap();
        assert!(is_encrypted_package(&envelope));
        let opened = Envelope::open(&envelope).unwrap();
        assert_eq!(opened.decrypt("secret").unwrap(), package);

        let err = opened.decrypt("wrongpass").unwrap_err();
        assert!(matches!(err, XlsxError::DecryptionFailed(_)));
    }

    #[test]
    fn test_open_checks_container_first() {
        let mut truncated = CFB_SIGNATURE.to_vec();
        truncated.extend_from_slice(b"garbage");
        let err = Envelope::open(&truncated).unwrap_err();
        assert!(matches!(err, XlsxError::CorruptPackage(_)));

        let mut cfb = cfb::CompoundFile::create(std::io::Cursor::new(Vec::new())).unwrap();
        std::io::Write::write_all(&mut cfb.create_stream("/Workbook").unwrap(), b"BIFF").unwrap();
        cfb.flush().unwrap();
        let foreign = cfb.into_inner().into_inner();
        assert!(is_encrypted_package(&foreign));
        let err = Envelope::open(&foreign).unwrap_err();
        assert!(matches!(err, XlsxError::CorruptPackage(_)));
    }
}
