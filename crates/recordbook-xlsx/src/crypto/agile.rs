//! Agile key derivation and package encryption

use cipher::{block_padding::NoPadding, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::rngs::OsRng;
use rand::RngCore;

use super::info::{AgileEncryptionInfo, KeyData, PasswordKeyEncryptor};
use super::{EncryptionOptions, HashAlgorithm};
use crate::error::{XlsxError, XlsxResult};

const SEGMENT_LENGTH: usize = 4096;
const BLOCK_SIZE: usize = 16;
const SALT_SIZE: usize = 16;

const BLOCK_KEY_VERIFIER_INPUT: [u8; 8] = [0xfe, 0xa7, 0xd2, 0x76, 0x3b, 0x4b, 0x9e, 0x79];
const BLOCK_KEY_VERIFIER_HASH: [u8; 8] = [0xd7, 0xaa, 0x0f, 0x6d, 0x30, 0x61, 0x34, 0x4e];
const BLOCK_KEY_KEY_VALUE: [u8; 8] = [0x14, 0x6e, 0x0b, 0xe7, 0xab, 0xac, 0xd0, 0xd6];
const BLOCK_KEY_INTEGRITY_KEY: [u8; 8] = [0x5f, 0xb2, 0xad, 0x01, 0x0c, 0xb9, 0xe1, 0xf6];
const BLOCK_KEY_INTEGRITY_VALUE: [u8; 8] = [0xa0, 0x67, 0x7f, 0x02, 0xb2, 0x2c, 0x84, 0x33];

/// Encrypt a plain package, returning the descriptor and the
/// `EncryptedPackage` stream
pub(super) fn encrypt(
    package: &[u8],
    password: &str,
    options: &EncryptionOptions,
) -> XlsxResult<(AgileEncryptionInfo, Vec<u8>)> {
    let hash = options.hash_algorithm;
    let key_len = options.key_bits as usize / 8;

    let key_salt = random_bytes(SALT_SIZE)?;
    let password_salt = random_bytes(SALT_SIZE)?;
    let secret_key = random_bytes(key_len)?;
    let verifier_input = random_bytes(SALT_SIZE)?;
    let hmac_key = random_bytes(hash.size())?;

    let password_hash = hash_password(hash, &password_salt, password, options.spin_count);
    let verifier_hash = hash.digest(&verifier_input);

    let password_encryptor = PasswordKeyEncryptor {
        spin_count: options.spin_count,
        salt: password_salt.clone(),
        block_size: BLOCK_SIZE as u32,
        key_bits: options.key_bits,
        hash_algorithm: hash,
        encrypted_verifier_hash_input: aes_cbc_encrypt(
            &derive_key(hash, &password_hash, &BLOCK_KEY_VERIFIER_INPUT, key_len),
            &password_salt,
            &verifier_input,
        )?,
        encrypted_verifier_hash_value: aes_cbc_encrypt(
            &derive_key(hash, &password_hash, &BLOCK_KEY_VERIFIER_HASH, key_len),
            &password_salt,
            &verifier_hash,
        )?,
        encrypted_key_value: aes_cbc_encrypt(
            &derive_key(hash, &password_hash, &BLOCK_KEY_KEY_VALUE, key_len),
            &password_salt,
            &secret_key,
        )?,
    };

    let stream = encrypt_stream(hash, &secret_key, &key_salt, package)?;

    let hmac_value = hash.hmac(&hmac_key, &stream)?;
    let encrypted_hmac_key = aes_cbc_encrypt(
        &secret_key,
        &derive_iv(hash, &key_salt, &BLOCK_KEY_INTEGRITY_KEY),
        &hmac_key,
    )?;
    let encrypted_hmac_value = aes_cbc_encrypt(
        &secret_key,
        &derive_iv(hash, &key_salt, &BLOCK_KEY_INTEGRITY_VALUE),
        &hmac_value,
    )?;

    let info = AgileEncryptionInfo {
        key_data: KeyData {
            salt: key_salt,
            block_size: BLOCK_SIZE as u32,
            key_bits: options.key_bits,
            hash_algorithm: hash,
        },
        encrypted_hmac_key,
        encrypted_hmac_value,
        password: password_encryptor,
    };
    Ok((info, stream))
}

/// Recover the plain package from the `EncryptedPackage` stream
pub(super) fn decrypt(
    info: &AgileEncryptionInfo,
    stream: &[u8],
    password: &str,
) -> XlsxResult<Vec<u8>> {
    let secret_key = unlock_secret_key(&info.password, &info.key_data, password)?;
    verify_integrity(info, &secret_key, stream)?;

    let package = decrypt_stream(&info.key_data, &secret_key, stream)?;
    if !package.starts_with(b"PK") {
        return Err(XlsxError::corrupt("decrypted payload is not a zip package"));
    }
    Ok(package)
}

/// Check the password against the verifier and decrypt the secret key
fn unlock_secret_key(
    encryptor: &PasswordKeyEncryptor,
    key_data: &KeyData,
    password: &str,
) -> XlsxResult<Vec<u8>> {
    let hash = encryptor.hash_algorithm;
    let key_len = encryptor.key_bits as usize / 8;
    let password_hash = hash_password(hash, &encryptor.salt, password, encryptor.spin_count);

    let verifier_input = aes_cbc_decrypt(
        &derive_key(hash, &password_hash, &BLOCK_KEY_VERIFIER_INPUT, key_len),
        &encryptor.salt,
        &encryptor.encrypted_verifier_hash_input,
    )?;
    let verifier_hash = aes_cbc_decrypt(
        &derive_key(hash, &password_hash, &BLOCK_KEY_VERIFIER_HASH, key_len),
        &encryptor.salt,
        &encryptor.encrypted_verifier_hash_value,
    )?;

    let input = truncated(&verifier_input, encryptor.salt.len(), "verifier input")?;
    let expected = truncated(&verifier_hash, hash.size(), "verifier hash")?;
    if !ct_eq(&hash.digest(input), expected) {
        return Err(XlsxError::DecryptionFailed("incorrect password".into()));
    }

    let key_value = aes_cbc_decrypt(
        &derive_key(hash, &password_hash, &BLOCK_KEY_KEY_VALUE, key_len),
        &encryptor.salt,
        &encryptor.encrypted_key_value,
    )?;
    Ok(truncated(&key_value, key_data.key_bits as usize / 8, "secret key")?.to_vec())
}

fn verify_integrity(
    info: &AgileEncryptionInfo,
    secret_key: &[u8],
    stream: &[u8],
) -> XlsxResult<()> {
    let kd = &info.key_data;
    let hash = kd.hash_algorithm;

    let hmac_key = aes_cbc_decrypt(
        secret_key,
        &derive_iv(hash, &kd.salt, &BLOCK_KEY_INTEGRITY_KEY),
        &info.encrypted_hmac_key,
    )?;
    let hmac_value = aes_cbc_decrypt(
        secret_key,
        &derive_iv(hash, &kd.salt, &BLOCK_KEY_INTEGRITY_VALUE),
        &info.encrypted_hmac_value,
    )?;

    let hmac_key = truncated(&hmac_key, hash.size(), "HMAC key")?;
    let expected = truncated(&hmac_value, hash.size(), "HMAC value")?;
    let actual = hash.hmac(hmac_key, stream)?;
    if !ct_eq(&actual, expected) {
        return Err(XlsxError::DecryptionFailed(
            "integrity check failed".into(),
        ));
    }
    Ok(())
}

/// Size prefix followed by the package encrypted in 4096-byte segments
fn encrypt_stream(
    hash: HashAlgorithm,
    key: &[u8],
    key_salt: &[u8],
    package: &[u8],
) -> XlsxResult<Vec<u8>> {
    let mut out = Vec::with_capacity(8 + package.len() + BLOCK_SIZE);
    out.extend_from_slice(&(package.len() as u64).to_le_bytes());
    for (index, segment) in package.chunks(SEGMENT_LENGTH).enumerate() {
        let iv = derive_iv(hash, key_salt, &(index as u32).to_le_bytes());
        out.extend_from_slice(&aes_cbc_encrypt(key, &iv, segment)?);
    }
    Ok(out)
}

fn decrypt_stream(key_data: &KeyData, key: &[u8], stream: &[u8]) -> XlsxResult<Vec<u8>> {
    if stream.len() < 8 {
        return Err(XlsxError::corrupt("EncryptedPackage stream is truncated"));
    }
    let mut size_bytes = [0u8; 8];
    size_bytes.copy_from_slice(&stream[..8]);
    let size = u64::from_le_bytes(size_bytes);
    let data = &stream[8..];

    if size > data.len() as u64 {
        return Err(XlsxError::corrupt(format!(
            "EncryptedPackage declares {} bytes but holds {}",
            size,
            data.len()
        )));
    }

    let mut out = Vec::with_capacity(data.len());
    for (index, segment) in data.chunks(SEGMENT_LENGTH).enumerate() {
        let iv = derive_iv(key_data.hash_algorithm, &key_data.salt, &(index as u32).to_le_bytes());
        out.extend_from_slice(&aes_cbc_decrypt(key, &iv, segment)?);
    }
    out.truncate(size as usize);
    Ok(out)
}

/// Iterated password hash: H(salt || password), then H(iterator || h)
fn hash_password(hash: HashAlgorithm, salt: &[u8], password: &str, spin_count: u32) -> Vec<u8> {
    let utf16: Vec<u8> = password
        .encode_utf16()
        .flat_map(|unit| unit.to_le_bytes())
        .collect();

    let mut h = hash.digest_parts(&[salt, utf16.as_slice()]);
    for i in 0..spin_count {
        h = hash.digest_parts(&[&i.to_le_bytes()[..], h.as_slice()]);
    }
    h
}

fn derive_key(hash: HashAlgorithm, password_hash: &[u8], block_key: &[u8], key_len: usize) -> Vec<u8> {
    fit(hash.digest_parts(&[password_hash, block_key]), key_len)
}

fn derive_iv(hash: HashAlgorithm, salt: &[u8], block_key: &[u8]) -> Vec<u8> {
    fit(hash.digest_parts(&[salt, block_key]), BLOCK_SIZE)
}

/// Truncate, or pad with 0x36, to exactly `len` bytes
fn fit(mut bytes: Vec<u8>, len: usize) -> Vec<u8> {
    bytes.resize(len, 0x36);
    bytes
}

fn aes_cbc_encrypt(key: &[u8], iv: &[u8], data: &[u8]) -> XlsxResult<Vec<u8>> {
    let mut padded = data.to_vec();
    let rem = padded.len() % BLOCK_SIZE;
    if rem != 0 {
        padded.resize(padded.len() + BLOCK_SIZE - rem, 0);
    }

    let bad_key = |e| XlsxError::Encryption(format!("AES key/IV: {}", e));
    let out = match key.len() {
        16 => cbc::Encryptor::<aes::Aes128>::new_from_slices(key, iv)
            .map_err(bad_key)?
            .encrypt_padded_vec_mut::<NoPadding>(&padded),
        24 => cbc::Encryptor::<aes::Aes192>::new_from_slices(key, iv)
            .map_err(bad_key)?
            .encrypt_padded_vec_mut::<NoPadding>(&padded),
        32 => cbc::Encryptor::<aes::Aes256>::new_from_slices(key, iv)
            .map_err(bad_key)?
            .encrypt_padded_vec_mut::<NoPadding>(&padded),
        other => {
            return Err(XlsxError::Encryption(format!(
                "unsupported AES key length {}",
                other
            )))
        }
    };
    Ok(out)
}

fn aes_cbc_decrypt(key: &[u8], iv: &[u8], data: &[u8]) -> XlsxResult<Vec<u8>> {
    if data.len() % BLOCK_SIZE != 0 {
        return Err(XlsxError::corrupt(format!(
            "ciphertext length {} is not a multiple of the block size",
            data.len()
        )));
    }

    let bad_key = |e| XlsxError::corrupt(format!("AES key/IV: {}", e));
    let result = match key.len() {
        16 => cbc::Decryptor::<aes::Aes128>::new_from_slices(key, iv)
            .map_err(bad_key)?
            .decrypt_padded_vec_mut::<NoPadding>(data),
        24 => cbc::Decryptor::<aes::Aes192>::new_from_slices(key, iv)
            .map_err(bad_key)?
            .decrypt_padded_vec_mut::<NoPadding>(data),
        32 => cbc::Decryptor::<aes::Aes256>::new_from_slices(key, iv)
            .map_err(bad_key)?
            .decrypt_padded_vec_mut::<NoPadding>(data),
        other => {
            return Err(XlsxError::corrupt(format!(
                "unsupported AES key length {}",
                other
            )))
        }
    };
    result.map_err(|e| XlsxError::corrupt(format!("AES-CBC: {}", e)))
}

fn truncated<'a>(bytes: &'a [u8], len: usize, what: &str) -> XlsxResult<&'a [u8]> {
    bytes
        .get(..len)
        .ok_or_else(|| XlsxError::corrupt(format!("{} is too short", what)))
}

fn random_bytes(len: usize) -> XlsxResult<Vec<u8>> {
    let mut buf = vec![0u8; len];
    OsRng
        .try_fill_bytes(&mut buf)
        .map_err(|e| XlsxError::Encryption(format!("random source: {}", e)))?;
    Ok(buf)
}

/// Constant-time equality
fn ct_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
