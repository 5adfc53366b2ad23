//! `EncryptionInfo` stream: version header plus XML descriptor

use base64::{engine::general_purpose::STANDARD, Engine as _};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use super::{HashAlgorithm, MAX_SPIN_COUNT};
use crate::error::{XlsxError, XlsxResult};
use crate::xml::escape_xml;

const AGILE_VERSION: (u16, u16) = (4, 4);
const AGILE_FLAGS: u32 = 0x40;

const NS_ENCRYPTION: &str = "http://schemas.microsoft.com/office/2006/encryption";
const NS_PASSWORD: &str = "http://schemas.microsoft.com/office/2006/keyEncryptor/password";

/// Parameters of the intermediate key (`keyData`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyData {
    pub salt: Vec<u8>,
    pub block_size: u32,
    pub key_bits: u32,
    pub hash_algorithm: HashAlgorithm,
}

/// Password key encryptor (`p:encryptedKey`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordKeyEncryptor {
    pub spin_count: u32,
    pub salt: Vec<u8>,
    pub block_size: u32,
    pub key_bits: u32,
    pub hash_algorithm: HashAlgorithm,
    pub encrypted_verifier_hash_input: Vec<u8>,
    pub encrypted_verifier_hash_value: Vec<u8>,
    pub encrypted_key_value: Vec<u8>,
}

/// Parsed Agile `EncryptionInfo`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgileEncryptionInfo {
    pub key_data: KeyData,
    pub encrypted_hmac_key: Vec<u8>,
    pub encrypted_hmac_value: Vec<u8>,
    pub password: PasswordKeyEncryptor,
}

impl AgileEncryptionInfo {
    /// Serialize the full stream (header followed by the XML descriptor)
    pub fn to_bytes(&self) -> Vec<u8> {
        let xml = self.to_xml();
        let mut out = Vec::with_capacity(8 + xml.len());
        out.extend_from_slice(&AGILE_VERSION.0.to_le_bytes());
        out.extend_from_slice(&AGILE_VERSION.1.to_le_bytes());
        out.extend_from_slice(&AGILE_FLAGS.to_le_bytes());
        out.extend_from_slice(xml.as_bytes());
        out
    }

    fn to_xml(&self) -> String {
        let kd = &self.key_data;
        let pw = &self.password;
        let mut xml = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n",
        );
        xml.push_str(&format!(
            "<encryption xmlns=\"{}\" xmlns:p=\"{}\">",
            NS_ENCRYPTION, NS_PASSWORD
        ));
        xml.push_str(&format!(
            "<keyData saltSize=\"{}\" blockSize=\"{}\" keyBits=\"{}\" hashSize=\"{}\" \
             cipherAlgorithm=\"AES\" cipherChaining=\"ChainingModeCBC\" hashAlgorithm=\"{}\" saltValue=\"{}\"/>",
            kd.salt.len(),
            kd.block_size,
            kd.key_bits,
            kd.hash_algorithm.size(),
            kd.hash_algorithm.name(),
            STANDARD.encode(&kd.salt)
        ));
        xml.push_str(&format!(
            "<dataIntegrity encryptedHmacKey=\"{}\" encryptedHmacValue=\"{}\"/>",
            STANDARD.encode(&self.encrypted_hmac_key),
            STANDARD.encode(&self.encrypted_hmac_value)
        ));
        xml.push_str(&format!(
            "<keyEncryptors><keyEncryptor uri=\"{}\">",
            escape_xml(NS_PASSWORD)
        ));
        xml.push_str(&format!(
            "<p:encryptedKey spinCount=\"{}\" saltSize=\"{}\" blockSize=\"{}\" keyBits=\"{}\" hashSize=\"{}\" \
             cipherAlgorithm=\"AES\" cipherChaining=\"ChainingModeCBC\" hashAlgorithm=\"{}\" saltValue=\"{}\" \
             encryptedVerifierHashInput=\"{}\" encryptedVerifierHashValue=\"{}\" encryptedKeyValue=\"{}\"/>",
            pw.spin_count,
            pw.salt.len(),
            pw.block_size,
            pw.key_bits,
            pw.hash_algorithm.size(),
            pw.hash_algorithm.name(),
            STANDARD.encode(&pw.salt),
            STANDARD.encode(&pw.encrypted_verifier_hash_input),
            STANDARD.encode(&pw.encrypted_verifier_hash_value),
            STANDARD.encode(&pw.encrypted_key_value)
        ));
        xml.push_str("</keyEncryptor></keyEncryptors></encryption>");
        xml
    }

    /// Parse the stream contents
    ///
    /// Only Agile (4.4) descriptors with an AES/CBC password key encryptor
    /// are accepted; anything else is reported as a corrupt package.
    pub fn parse(bytes: &[u8]) -> XlsxResult<Self> {
        if bytes.len() < 8 {
            return Err(XlsxError::corrupt("EncryptionInfo stream is truncated"));
        }
        let major = u16::from_le_bytes([bytes[0], bytes[1]]);
        let minor = u16::from_le_bytes([bytes[2], bytes[3]]);
        if (major, minor) != AGILE_VERSION {
            return Err(XlsxError::corrupt(format!(
                "unsupported encryption version {}.{}",
                major, minor
            )));
        }

        let mut reader = Reader::from_reader(&bytes[8..]);
        reader.trim_text(true);

        let mut key_data = None;
        let mut integrity = None;
        let mut password = None;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                    match e.local_name().as_ref() {
                        b"keyData" => key_data = Some(parse_key_data(&e)?),
                        b"dataIntegrity" => {
                            integrity = Some((
                                required_b64(&e, b"encryptedHmacKey")?,
                                required_b64(&e, b"encryptedHmacValue")?,
                            ));
                        }
                        b"encryptedKey" => password = Some(parse_encrypted_key(&e)?),
                        _ => {}
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => return Err(XlsxError::corrupt(format!("EncryptionInfo XML: {}", e))),
            }
            buf.clear();
        }

        let key_data = key_data.ok_or_else(|| XlsxError::corrupt("EncryptionInfo has no keyData"))?;
        let (encrypted_hmac_key, encrypted_hmac_value) =
            integrity.ok_or_else(|| XlsxError::corrupt("EncryptionInfo has no dataIntegrity"))?;
        let password =
            password.ok_or_else(|| XlsxError::corrupt("EncryptionInfo has no password key encryptor"))?;

        Ok(Self {
            key_data,
            encrypted_hmac_key,
            encrypted_hmac_value,
            password,
        })
    }
}

fn attr(e: &BytesStart<'_>, name: &[u8]) -> XlsxResult<Option<String>> {
    for a in e.attributes() {
        let a = a.map_err(|err| XlsxError::corrupt(format!("EncryptionInfo attribute: {}", err)))?;
        if a.key.local_name().as_ref() == name {
            let value = a
                .unescape_value()
                .map_err(|err| XlsxError::corrupt(format!("EncryptionInfo attribute: {}", err)))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn required(e: &BytesStart<'_>, name: &[u8]) -> XlsxResult<String> {
    attr(e, name)?.ok_or_else(|| {
        XlsxError::corrupt(format!(
            "EncryptionInfo is missing {}",
            String::from_utf8_lossy(name)
        ))
    })
}

fn required_u32(e: &BytesStart<'_>, name: &[u8]) -> XlsxResult<u32> {
    let raw = required(e, name)?;
    raw.trim().parse().map_err(|_| {
        XlsxError::corrupt(format!(
            "EncryptionInfo {} is not a number: {}",
            String::from_utf8_lossy(name),
            raw
        ))
    })
}

fn required_b64(e: &BytesStart<'_>, name: &[u8]) -> XlsxResult<Vec<u8>> {
    let raw = required(e, name)?;
    STANDARD.decode(raw.trim()).map_err(|err| {
        XlsxError::corrupt(format!(
            "EncryptionInfo {} is not base64: {}",
            String::from_utf8_lossy(name),
            err
        ))
    })
}

fn required_hash(e: &BytesStart<'_>) -> XlsxResult<HashAlgorithm> {
    let name = required(e, b"hashAlgorithm")?;
    HashAlgorithm::from_name(&name)
        .ok_or_else(|| XlsxError::corrupt(format!("unsupported hash algorithm {}", name)))
}

fn check_cipher(e: &BytesStart<'_>) -> XlsxResult<()> {
    if let Some(cipher) = attr(e, b"cipherAlgorithm")? {
        if cipher != "AES" {
            return Err(XlsxError::corrupt(format!("unsupported cipher {}", cipher)));
        }
    }
    if let Some(chaining) = attr(e, b"cipherChaining")? {
        if chaining != "ChainingModeCBC" {
            return Err(XlsxError::corrupt(format!("unsupported chaining mode {}", chaining)));
        }
    }
    Ok(())
}

fn check_key_bits(key_bits: u32) -> XlsxResult<u32> {
    match key_bits {
        128 | 192 | 256 => Ok(key_bits),
        other => Err(XlsxError::corrupt(format!("unsupported AES key size {}", other))),
    }
}

fn parse_key_data(e: &BytesStart<'_>) -> XlsxResult<KeyData> {
    check_cipher(e)?;
    Ok(KeyData {
        salt: required_b64(e, b"saltValue")?,
        block_size: required_u32(e, b"blockSize")?,
        key_bits: check_key_bits(required_u32(e, b"keyBits")?)?,
        hash_algorithm: required_hash(e)?,
    })
}

fn check_spin_count(spin_count: u32) -> XlsxResult<u32> {
    if spin_count > MAX_SPIN_COUNT {
        return Err(XlsxError::corrupt(format!(
            "spin count {} exceeds the limit of {}",
            spin_count, MAX_SPIN_COUNT
        )));
    }
    Ok(spin_count)
}

fn parse_encrypted_key(e: &BytesStart<'_>) -> XlsxResult<PasswordKeyEncryptor> {
    check_cipher(e)?;
    Ok(PasswordKeyEncryptor {
        spin_count: check_spin_count(required_u32(e, b"spinCount")?)?,
        salt: required_b64(e, b"saltValue")?,
        block_size: required_u32(e, b"blockSize")?,
        key_bits: check_key_bits(required_u32(e, b"keyBits")?)?,
        hash_algorithm: required_hash(e)?,
        encrypted_verifier_hash_input: required_b64(e, b"encryptedVerifierHashInput")?,
        encrypted_verifier_hash_value: required_b64(e, b"encryptedVerifierHashValue")?,
        encrypted_key_value: required_b64(e, b"encryptedKeyValue")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> AgileEncryptionInfo {
        AgileEncryptionInfo {
            key_data: KeyData {
                salt: vec![1; 16],
                block_size: 16,
                key_bits: 256,
                hash_algorithm: HashAlgorithm::Sha512,
            },
            encrypted_hmac_key: vec![2; 64],
            encrypted_hmac_value: vec![3; 64],
            password: PasswordKeyEncryptor {
                spin_count: 100_000,
                salt: vec![4; 16],
                block_size: 16,
                key_bits: 256,
                hash_algorithm: HashAlgorithm::Sha512,
                encrypted_verifier_hash_input: vec![5; 16],
                encrypted_verifier_hash_value: vec![6; 64],
                encrypted_key_value: vec![7; 32],
            },
        }
    }

    #[test]
    fn test_header_and_parse() {
        let info = sample();
        let bytes = info.to_bytes();
        assert_eq!(&bytes[..8], &[4, 0, 4, 0, 0x40, 0, 0, 0]);
        assert_eq!(AgileEncryptionInfo::parse(&bytes).unwrap(), info);
    }

    #[test]
    fn test_rejects_standard_encryption() {
        let mut bytes = sample().to_bytes();
        bytes[0] = 3;
        bytes[2] = 2;
        let err = AgileEncryptionInfo::parse(&bytes).unwrap_err();
        assert!(matches!(err, XlsxError::CorruptPackage(_)));
    }

    #[test]
    fn test_rejects_missing_key_encryptor() {
        let xml = format!(
            "<encryption xmlns=\"{}\"><keyData saltSize=\"16\" blockSize=\"16\" keyBits=\"128\" \
             hashSize=\"20\" cipherAlgorithm=\"AES\" cipherChaining=\"ChainingModeCBC\" \
             hashAlgorithm=\"SHA1\" saltValue=\"AAAAAAAAAAAAAAAAAAAAAA==\"/>\
             <dataIntegrity encryptedHmacKey=\"AA==\" encryptedHmacValue=\"AA==\"/></encryption>",
            NS_ENCRYPTION
        );
        let mut bytes = vec![4, 0, 4, 0, 0x40, 0, 0, 0];
        bytes.extend_from_slice(xml.as_bytes());

        let err = AgileEncryptionInfo::parse(&bytes).unwrap_err();
        assert!(matches!(err, XlsxError::CorruptPackage(_)));
    }

    #[test]
    fn test_rejects_huge_spin_count() {
        let mut info = sample();
        info.password.spin_count = MAX_SPIN_COUNT;
        assert_eq!(AgileEncryptionInfo::parse(&info.to_bytes()).unwrap(), info);

        info.password.spin_count = u32::MAX;
        let err = AgileEncryptionInfo::parse(&info.to_bytes()).unwrap_err();
        assert!(matches!(err, XlsxError::CorruptPackage(ref msg) if msg.contains("spin count")));
    }
}
