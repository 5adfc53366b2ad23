//! Package reader

mod worksheet;

use std::collections::HashMap;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;

use chrono::{DateTime, NaiveDateTime};
use log::{debug, trace, warn};
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use zip::ZipArchive;

use crate::crypto;
use crate::error::{XlsxError, XlsxResult};
use crate::shared_strings::read_shared_strings_xml;
use crate::styles::read_styles_xml;
use recordbook_core::{SharedStringTable, StyleTable, Workbook, WorkbookSettings, Worksheet};

use worksheet::{read_worksheet_xml, SheetContext};

/// Sheet entry from xl/workbook.xml
struct SheetEntry {
    name: String,
    rel_id: String,
}

/// XLSX package reader
///
/// Every failure other than a password problem is reported as
/// [`XlsxError::CorruptPackage`]. I/O errors of the source itself (a missing
/// file, a failing stream) keep their own variant.
pub struct PackageReader;

impl PackageReader {
    /// Check whether `bytes` hold a password protected package
    pub fn is_encrypted(bytes: &[u8]) -> bool {
        crypto::is_encrypted_package(bytes)
    }

    /// Read a workbook from package bytes
    ///
    /// Encrypted packages need the password they were written with; a
    /// password given for a plain package is ignored.
    pub fn read(bytes: &[u8], password: Option<&str>) -> XlsxResult<Workbook> {
        Self::read_bytes(bytes, password).map_err(XlsxError::into_read_error)
    }

    /// Read a workbook from a stream
    pub fn read_from<R: Read>(mut reader: R, password: Option<&str>) -> XlsxResult<Workbook> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::read(&bytes, password)
    }

    /// Read a workbook from a file path
    pub fn read_file<P: AsRef<Path>>(path: P, password: Option<&str>) -> XlsxResult<Workbook> {
        let bytes = std::fs::read(path.as_ref())?;
        debug!("read {} bytes from {}", bytes.len(), path.as_ref().display());
        Self::read(&bytes, password)
    }

    fn read_bytes(bytes: &[u8], password: Option<&str>) -> XlsxResult<Workbook> {
        if password == Some("") {
            return Err(XlsxError::InvalidPassword);
        }

        if crypto::is_encrypted_package(bytes) {
            let envelope = crypto::Envelope::open(bytes)?;
            debug!("package is encrypted");
            let password = password.ok_or_else(|| {
                XlsxError::DecryptionFailed("package is password protected".into())
            })?;
            let plain = envelope.decrypt(password)?;
            Self::read_package(Cursor::new(plain))
        } else if bytes.starts_with(b"PK") {
            if password.is_some() {
                debug!("package is not encrypted; ignoring the supplied password");
            }
            Self::read_package(Cursor::new(bytes))
        } else {
            Err(XlsxError::corrupt("not a spreadsheet package"))
        }
    }

    fn read_package<R: Read + Seek>(reader: R) -> XlsxResult<Workbook> {
        let mut archive = ZipArchive::new(reader)?;

        if archive.by_name("[Content_Types].xml").is_err() {
            return Err(XlsxError::corrupt("missing [Content_Types].xml"));
        }

        let strings = match archive.by_name("xl/sharedStrings.xml") {
            Ok(file) => read_shared_strings_xml(file)?,
            Err(_) => SharedStringTable::new(),
        };
        let styles = match archive.by_name("xl/styles.xml") {
            Ok(file) => read_styles_xml(file)?,
            Err(_) => StyleTable::new(),
        };

        let (entries, date_1904) = Self::read_workbook_xml(&mut archive)?;
        let sheet_paths = Self::read_workbook_rels(&mut archive)?;
        let mut settings = Self::read_core_properties(&mut archive)?;
        settings.date_1904 = date_1904;

        trace!(
            "package parts: {} sheets, {} strings, {} styles",
            entries.len(),
            strings.len(),
            styles.len()
        );

        let ctx = SheetContext {
            strings: &strings,
            styles: &styles,
            date_1904,
        };
        let mut sheets = Vec::with_capacity(entries.len());
        for entry in entries {
            let Some(path) = sheet_paths.get(&entry.rel_id) else {
                warn!(
                    "sheet '{}' points at missing relationship {}",
                    entry.name, entry.rel_id
                );
                continue;
            };
            let file = archive
                .by_name(path)
                .map_err(|_| XlsxError::corrupt(format!("missing part {}", path)))?;
            let mut sheet = Worksheet::new(entry.name);
            read_worksheet_xml(file, &mut sheet, &ctx)?;
            sheets.push(sheet);
        }

        let mut workbook = Workbook::with_styles(styles);
        *workbook.settings_mut() = settings;
        for sheet in sheets {
            workbook.add_sheet(sheet)?;
        }

        debug!("package read: {} sheets", workbook.sheet_count());
        Ok(workbook)
    }

    /// Sheet names with their relationship ids, and the date system flag
    fn read_workbook_xml<R: Read + Seek>(
        archive: &mut ZipArchive<R>,
    ) -> XlsxResult<(Vec<SheetEntry>, bool)> {
        let file = archive
            .by_name("xl/workbook.xml")
            .map_err(|_| XlsxError::corrupt("missing xl/workbook.xml"))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut sheets = Vec::new();
        let mut date_1904 = false;

        loop {
            match xml_reader.read_event_into(&mut buf)? {
                Event::Empty(e) | Event::Start(e) => match e.local_name().as_ref() {
                    b"workbookPr" => {
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"date1904" {
                                let v = attr.unescape_value()?;
                                date_1904 = v.as_ref() == "1" || v.as_ref() == "true";
                            }
                        }
                    }
                    b"sheet" => {
                        let mut name = None;
                        let mut rel_id = None;
                        for attr in e.attributes().flatten() {
                            match attr.key.as_ref() {
                                b"name" => name = Some(attr.unescape_value()?.into_owned()),
                                _ if attr.key.local_name().as_ref() == b"id" => {
                                    rel_id = Some(attr.unescape_value()?.into_owned())
                                }
                                _ => {}
                            }
                        }
                        match (name, rel_id) {
                            (Some(name), Some(rel_id)) => sheets.push(SheetEntry { name, rel_id }),
                            _ => warn!("skipping <sheet> without name or relationship id"),
                        }
                    }
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok((sheets, date_1904))
    }

    /// Worksheet relationship ids mapped to archive paths
    fn read_workbook_rels<R: Read + Seek>(
        archive: &mut ZipArchive<R>,
    ) -> XlsxResult<HashMap<String, String>> {
        let file = archive
            .by_name("xl/_rels/workbook.xml.rels")
            .map_err(|_| XlsxError::corrupt("missing xl/_rels/workbook.xml.rels"))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut rels = HashMap::new();

        loop {
            match xml_reader.read_event_into(&mut buf)? {
                Event::Empty(e) | Event::Start(e) if e.local_name().as_ref() == b"Relationship" => {
                    let mut id = None;
                    let mut target = None;
                    let mut rel_type = None;
                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"Id" => id = Some(attr.unescape_value()?.into_owned()),
                            b"Target" => target = Some(attr.unescape_value()?.into_owned()),
                            b"Type" => rel_type = Some(attr.unescape_value()?.into_owned()),
                            _ => {}
                        }
                    }

                    if let (Some(id), Some(target), Some(rel_type)) = (id, target, rel_type) {
                        if rel_type.ends_with("/worksheet") {
                            rels.insert(id, resolve_target(&target));
                        }
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(rels)
    }

    /// Author and creation date from docProps/core.xml, when present
    fn read_core_properties<R: Read + Seek>(
        archive: &mut ZipArchive<R>,
    ) -> XlsxResult<WorkbookSettings> {
        let mut settings = WorkbookSettings::default();
        let file = match archive.by_name("docProps/core.xml") {
            Ok(file) => file,
            Err(_) => return Ok(settings),
        };

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut current: Option<Vec<u8>> = None;

        loop {
            match xml_reader.read_event_into(&mut buf)? {
                Event::Start(e) => current = Some(e.local_name().as_ref().to_vec()),
                Event::End(_) => current = None,
                Event::Text(t) => {
                    let text = t.unescape()?;
                    match current.as_deref() {
                        Some(b"creator") => settings.creator = Some(text.into_owned()),
                        Some(b"created") => {
                            settings.created = parse_w3c_datetime(text.trim());
                            if settings.created.is_none() {
                                warn!("unparseable creation date '{}'", text);
                            }
                        }
                        _ => {}
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(settings)
    }
}

/// Relationship targets are relative to xl/ unless absolute
fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{}", target),
    }
}

fn parse_w3c_datetime(s: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.naive_utc())
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn minimal_package(workbook_xml: &str, sheet_xml: &str) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let cursor = Cursor::new(&mut buf);
            let mut zip = zip::ZipWriter::new(cursor);
            let options = zip::write::SimpleFileOptions::default();

            zip.start_file("[Content_Types].xml", options).unwrap();
            zip.write_all(br#"<?xml version="1.0"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/></Types>"#).unwrap();

            zip.start_file("_rels/.rels", options).unwrap();
            zip.write_all(br#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#).unwrap();

            zip.start_file("xl/workbook.xml", options).unwrap();
            zip.write_all(workbook_xml.as_bytes()).unwrap();

            zip.start_file("xl/_rels/workbook.xml.rels", options).unwrap();
            zip.write_all(br#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#).unwrap();

            zip.start_file("xl/worksheets/sheet1.xml", options).unwrap();
            zip.write_all(sheet_xml.as_bytes()).unwrap();

            zip.finish().unwrap();
        }
        buf
    }

    const WORKBOOK: &str = r#"<?xml version="1.0"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets></workbook>"#;

    #[test]
    fn test_read_minimal_package() {
        let bytes = minimal_package(
            WORKBOOK,
            r#"<?xml version="1.0"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData><row r="1"><c r="A1" t="inlineStr"><is><t>hi</t></is></c></row></sheetData></worksheet>"#,
        );

        let workbook = PackageReader::read(&bytes, None).unwrap();
        assert_eq!(workbook.sheet_count(), 1);
        let sheet = workbook.sheet(0).unwrap();
        assert_eq!(sheet.name(), "Sheet1");
        assert_eq!(sheet.get_value("A1").unwrap().as_string(), Some("hi"));
        assert_eq!(workbook.styles().len(), 1);
        assert!(!workbook.settings().date_1904);
    }

    #[test]
    fn test_date1904_flag() {
        let workbook_xml = WORKBOOK.replace("<sheets>", "<workbookPr date1904=\"1\"/><sheets>");
        let bytes = minimal_package(
            &workbook_xml,
            r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData/></worksheet>"#,
        );
        let workbook = PackageReader::read(&bytes, None).unwrap();
        assert!(workbook.settings().date_1904);
    }

    #[test]
    fn test_password_for_plain_package_is_ignored() {
        let bytes = minimal_package(
            WORKBOOK,
            r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData/></worksheet>"#,
        );
        assert!(PackageReader::read(&bytes, Some("secret")).is_ok());

        let err = PackageReader::read(&bytes, Some("")).unwrap_err();
        assert!(matches!(err, XlsxError::InvalidPassword));
    }

    #[test]
    fn test_malformed_inputs_are_corrupt() {
        for bytes in [
            b"".to_vec(),
            b"plain text".to_vec(),
            b"PK\x03\x04truncated".to_vec(),
            crypto::CFB_SIGNATURE.to_vec(),
        ] {
            let err = PackageReader::read(&bytes, Some("pw")).unwrap_err();
            assert!(
                matches!(err, XlsxError::CorruptPackage(_)),
                "unexpected {:?}",
                err
            );
        }
    }

    #[test]
    fn test_malformed_sheet_is_corrupt() {
        let bytes = minimal_package(
            WORKBOOK,
            r#"<worksheet><sheetData><row r="1"><c r="A1"><v>not a number</v></c></row></sheetData></worksheet>"#,
        );
        let err = PackageReader::read(&bytes, None).unwrap_err();
        assert!(matches!(err, XlsxError::CorruptPackage(_)));
    }

    #[test]
    fn test_encrypted_without_password() {
        let mut wb = Workbook::new();
        wb.add_worksheet_with_name("Data").unwrap();
        let options = crate::WriteOptions::new()
            .with_password("secret")
            .with_encryption(crypto::EncryptionOptions::default().with_spin_count(10));
        let bytes = crate::PackageWriter::write_with(&wb, &options).unwrap();

        assert!(PackageReader::is_encrypted(&bytes));
        let err = PackageReader::read(&bytes, None).unwrap_err();
        assert!(matches!(err, XlsxError::DecryptionFailed(_)));
    }

    #[test]
    fn test_compound_file_without_envelope_is_corrupt() {
        let mut truncated = crypto::CFB_SIGNATURE.to_vec();
        truncated.extend_from_slice(b"garbage");

        let mut cfb = cfb::CompoundFile::create(Cursor::new(Vec::new())).unwrap();
        cfb.create_stream("/Workbook").unwrap().write_all(b"BIFF").unwrap();
        cfb.flush().unwrap();
        let legacy = cfb.into_inner().into_inner();

        for bytes in [truncated, legacy] {
            for password in [None, Some("pw")] {
                let err = PackageReader::read(&bytes, password).unwrap_err();
                assert!(
                    matches!(err, XlsxError::CorruptPackage(_)),
                    "{:?} gave {:?}",
                    password,
                    err
                );
            }
        }
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(resolve_target("worksheets/sheet1.xml"), "xl/worksheets/sheet1.xml");
        assert_eq!(resolve_target("/xl/worksheets/sheet2.xml"), "xl/worksheets/sheet2.xml");
    }
}
