//! Compound file holding the encrypted streams
//!
//! Besides `EncryptionInfo` and `EncryptedPackage`, the `\u{6}DataSpaces`
//! storage describes the encryption transform so that spreadsheet
//! applications recognise the file as a protected workbook.

use std::io::{Cursor, Read, Write};

use cfb::CompoundFile;

use crate::error::{XlsxError, XlsxResult};

const ENCRYPTION_INFO: &str = "/EncryptionInfo";
const ENCRYPTED_PACKAGE: &str = "/EncryptedPackage";
const DATA_SPACES: &str = "/\u{6}DataSpaces";

/// Build the compound file
pub(super) fn write_envelope(info: &[u8], package: &[u8]) -> XlsxResult<Vec<u8>> {
    let mut cfb = CompoundFile::create(Cursor::new(Vec::new()))?;

    write_stream(&mut cfb, ENCRYPTION_INFO, info)?;
    write_stream(&mut cfb, ENCRYPTED_PACKAGE, package)?;

    cfb.create_storage(DATA_SPACES)?;
    cfb.create_storage(format!("{}/DataSpaceInfo", DATA_SPACES))?;
    cfb.create_storage(format!("{}/TransformInfo", DATA_SPACES))?;
    cfb.create_storage(format!(
        "{}/TransformInfo/StrongEncryptionTransform",
        DATA_SPACES
    ))?;

    write_stream(&mut cfb, &format!("{}/Version", DATA_SPACES), &version_stream())?;
    write_stream(
        &mut cfb,
        &format!("{}/DataSpaceMap", DATA_SPACES),
        &data_space_map_stream(),
    )?;
    write_stream(
        &mut cfb,
        &format!("{}/DataSpaceInfo/StrongEncryptionDataSpace", DATA_SPACES),
        &data_space_definition_stream(),
    )?;
    write_stream(
        &mut cfb,
        &format!(
            "{}/TransformInfo/StrongEncryptionTransform/\u{6}Primary",
            DATA_SPACES
        ),
        &transform_primary_stream(),
    )?;

    cfb.flush()?;
    Ok(cfb.into_inner().into_inner())
}

/// Pull `EncryptionInfo` and `EncryptedPackage` out of the compound file
pub(super) fn read_envelope(bytes: &[u8]) -> XlsxResult<(Vec<u8>, Vec<u8>)> {
    let mut cfb = CompoundFile::open(Cursor::new(bytes))
        .map_err(|e| XlsxError::corrupt(format!("not a compound file: {}", e)))?;
    let info = read_stream(&mut cfb, ENCRYPTION_INFO)?;
    let package = read_stream(&mut cfb, ENCRYPTED_PACKAGE)?;
    Ok((info, package))
}

fn write_stream<F>(cfb: &mut CompoundFile<F>, path: &str, data: &[u8]) -> XlsxResult<()>
where
    F: Read + Write + std::io::Seek,
{
    let mut stream = cfb.create_stream(path)?;
    stream.write_all(data)?;
    Ok(())
}

fn read_stream<F>(cfb: &mut CompoundFile<F>, path: &str) -> XlsxResult<Vec<u8>>
where
    F: Read + std::io::Seek,
{
    let mut stream = cfb
        .open_stream(path)
        .map_err(|e| XlsxError::corrupt(format!("missing {} stream: {}", &path[1..], e)))?;
    let mut data = Vec::new();
    stream
        .read_to_end(&mut data)
        .map_err(|e| XlsxError::corrupt(format!("unreadable {} stream: {}", &path[1..], e)))?;
    Ok(data)
}

/// Length-prefixed UTF-16LE string padded to a 4-byte boundary
fn write_unicode_lpp4(buf: &mut Vec<u8>, s: &str) {
    let bytes: Vec<u8> = s.encode_utf16().flat_map(|unit| unit.to_le_bytes()).collect();
    buf.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
    buf.extend_from_slice(&bytes);
    if bytes.len() % 4 == 2 {
        buf.extend_from_slice(&[0, 0]);
    }
}

/// Reader, updater and writer versions, all 1.0
fn push_versions(buf: &mut Vec<u8>) {
    for _ in 0..3 {
        buf.extend_from_slice(&1u16.to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes());
    }
}

fn version_stream() -> Vec<u8> {
    let mut buf = Vec::new();
    write_unicode_lpp4(&mut buf, "Microsoft.Container.DataSpaces");
    push_versions(&mut buf);
    buf
}

fn data_space_map_stream() -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&8u32.to_le_bytes());
    buf.extend_from_slice(&1u32.to_le_bytes());

    let mut entry = Vec::new();
    // one reference component of type "stream"
    entry.extend_from_slice(&1u32.to_le_bytes());
    entry.extend_from_slice(&0u32.to_le_bytes());
    write_unicode_lpp4(&mut entry, "EncryptedPackage");
    write_unicode_lpp4(&mut entry, "StrongEncryptionDataSpace");

    buf.extend_from_slice(&(entry.len() as u32 + 4).to_le_bytes());
    buf.extend_from_slice(&entry);
    buf
}

fn data_space_definition_stream() -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&8u32.to_le_bytes());
    buf.extend_from_slice(&1u32.to_le_bytes());
    write_unicode_lpp4(&mut buf, "StrongEncryptionTransform");
    buf
}

fn transform_primary_stream() -> Vec<u8> {
    let mut header = Vec::new();
    header.extend_from_slice(&1u32.to_le_bytes());
    write_unicode_lpp4(&mut header, "{FF9A3F03-56EF-4613-BDD5-5A41C1D07246}");

    let mut buf = Vec::new();
    buf.extend_from_slice(&(header.len() as u32 + 4).to_le_bytes());
    buf.extend_from_slice(&header);
    write_unicode_lpp4(&mut buf, "Microsoft.Container.EncryptionTransform");
    push_versions(&mut buf);

    // empty cipher name, block size 0, then the reserved value 4
    buf.extend_from_slice(&0u32.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes());
    buf.extend_from_slice(&4u32.to_le_bytes());
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_lpp4_padding() {
        let mut buf = Vec::new();
        write_unicode_lpp4(&mut buf, "abc");
        assert_eq!(buf, vec![6, 0, 0, 0, b'a', 0, b'b', 0, b'c', 0, 0, 0]);

        let mut buf = Vec::new();
        write_unicode_lpp4(&mut buf, "ab");
        assert_eq!(buf.len(), 8);
    }

    #[test]
    fn test_envelope_streams() {
        let bytes = write_envelope(b"info", b"package").unwrap();
        assert!(super::super::is_encrypted_package(&bytes));

        let (info, package) = read_envelope(&bytes).unwrap();
        assert_eq!(info, b"info");
        assert_eq!(package, b"package");

        let mut cfb = CompoundFile::open(Cursor::new(&bytes)).unwrap();
        assert!(cfb.is_stream(format!("{}/DataSpaceMap", DATA_SPACES)));
        let map = read_stream(&mut cfb, &format!("{}/DataSpaceMap", DATA_SPACES)).unwrap();
        assert_eq!(&map[..8], &[8, 0, 0, 0, 1, 0, 0, 0]);
    }

    #[test]
    fn test_not_a_compound_file() {
        let err = read_envelope(b"PK\x03\x04 not ole").unwrap_err();
        assert!(matches!(err, XlsxError::CorruptPackage(_)));
    }
}
