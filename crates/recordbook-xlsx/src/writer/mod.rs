//! Package writer

mod worksheet;

use std::fs::File;
use std::io::{Cursor, Seek, Write};
use std::path::Path;

use log::{debug, trace, warn};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::crypto::{self, EncryptionOptions};
use crate::error::{XlsxError, XlsxResult};
use crate::shared_strings::write_shared_strings_xml;
use crate::styles::StylesPart;
use crate::xml::escape_xml;
use recordbook_core::{CellEncoder, SharedStringTable, Workbook};

use worksheet::write_worksheet_xml;

/// Options for a single write
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    /// Password protecting the package; `None` writes a plain package
    pub password: Option<String>,
    /// Envelope parameters, used only when a password is set
    pub encryption: EncryptionOptions,
}

impl WriteOptions {
    /// Plain package, no password
    pub fn new() -> Self {
        Self::default()
    }

    /// Protect the package with a password
    pub fn with_password<S: Into<String>>(mut self, password: S) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Override the encryption parameters
    pub fn with_encryption(mut self, encryption: EncryptionOptions) -> Self {
        self.encryption = encryption;
        self
    }
}

/// XLSX package writer
///
/// The writer borrows the workbook; its style table cannot change while a
/// package is produced. Output is deterministic for unencrypted packages:
/// zip entries carry a fixed timestamp and the core properties only carry a
/// creation date when the workbook settings set one.
pub struct PackageWriter;

impl PackageWriter {
    /// Serialize a workbook, encrypting it when `password` is given
    ///
    /// `Some("")` fails with `InvalidPassword` before any bytes are produced.
    pub fn write(workbook: &Workbook, password: Option<&str>) -> XlsxResult<Vec<u8>> {
        let options = WriteOptions {
            password: password.map(str::to_string),
            ..WriteOptions::default()
        };
        Self::write_with(workbook, &options)
    }

    /// Serialize a workbook with explicit options
    pub fn write_with(workbook: &Workbook, options: &WriteOptions) -> XlsxResult<Vec<u8>> {
        let password = options.password.as_deref();
        if password == Some("") {
            return Err(XlsxError::InvalidPassword);
        }
        if password.is_some() {
            options.encryption.validate()?;
        }

        let package = Self::write_package(workbook)?;
        match password {
            Some(password) => crypto::encrypt_package(&package, password, &options.encryption),
            None => Ok(package),
        }
    }

    /// Serialize a workbook into a writer
    pub fn write_to<W: Write>(
        workbook: &Workbook,
        options: &WriteOptions,
        mut writer: W,
    ) -> XlsxResult<()> {
        let bytes = Self::write_with(workbook, options)?;
        writer.write_all(&bytes)?;
        writer.flush()?;
        Ok(())
    }

    /// Serialize a workbook to a file path
    pub fn write_file<P: AsRef<Path>>(
        workbook: &Workbook,
        path: P,
        options: &WriteOptions,
    ) -> XlsxResult<()> {
        let bytes = Self::write_with(workbook, options)?;
        let mut file = File::create(path.as_ref())?;
        file.write_all(&bytes)?;
        debug!("wrote {} bytes to {}", bytes.len(), path.as_ref().display());
        Ok(())
    }

    /// Build the plain zip package
    fn write_package(workbook: &Workbook) -> XlsxResult<Vec<u8>> {
        let sheet_count = workbook.sheet_count();
        if sheet_count == 0 {
            warn!("writing a workbook without sheets");
        }

        // Date cells may add derived styles; the workbook's own table stays untouched.
        let mut styles = workbook.styles().clone();
        let mut strings = SharedStringTable::new();
        let mut sheet_parts = Vec::with_capacity(sheet_count);
        {
            let mut encoder = CellEncoder::new(&mut strings, workbook.settings().date_1904);
            for (i, sheet) in workbook.sheets().enumerate() {
                let xml = write_worksheet_xml(sheet, i == 0, &mut encoder, &mut styles)?;
                trace!(
                    "sheet {} '{}': {} rows, {} bytes of XML",
                    i + 1,
                    sheet.name(),
                    sheet.row_count(),
                    xml.len()
                );
                sheet_parts.push(xml);
            }
        }
        let styles_xml = StylesPart::build(&styles).to_xml();

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

        Self::write_part(&mut zip, "[Content_Types].xml", &Self::content_types_xml(sheet_count))?;
        Self::write_part(&mut zip, "_rels/.rels", ROOT_RELS)?;
        Self::write_part(&mut zip, "docProps/app.xml", APP_PROPERTIES)?;
        Self::write_part(&mut zip, "docProps/core.xml", &Self::core_properties_xml(workbook))?;
        Self::write_part(&mut zip, "xl/workbook.xml", &Self::workbook_xml(workbook))?;
        Self::write_part(
            &mut zip,
            "xl/_rels/workbook.xml.rels",
            &Self::workbook_rels_xml(sheet_count),
        )?;
        for (i, xml) in sheet_parts.iter().enumerate() {
            Self::write_part(&mut zip, &format!("xl/worksheets/sheet{}.xml", i + 1), xml)?;
        }
        Self::write_part(&mut zip, "xl/styles.xml", &styles_xml)?;
        Self::write_part(
            &mut zip,
            "xl/sharedStrings.xml",
            &write_shared_strings_xml(&strings),
        )?;

        let bytes = zip.finish()?.into_inner();
        debug!(
            "package written: {} sheets, {} styles, {} unique strings, {} bytes",
            sheet_count,
            styles.len(),
            strings.len(),
            bytes.len()
        );
        Ok(bytes)
    }

    fn write_part<W: Write + Seek>(
        zip: &mut ZipWriter<W>,
        name: &str,
        content: &str,
    ) -> XlsxResult<()> {
        let options = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default());
        zip.start_file(name, options)?;
        zip.write_all(content.as_bytes())?;
        trace!("wrote part {} ({} bytes)", name, content.len());
        Ok(())
    }

    fn content_types_xml(sheet_count: usize) -> String {
        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Default Extension="xml" ContentType="application/xml"/>
    <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
        );

        for i in 0..sheet_count {
            content.push_str(&format!(
                r#"
    <Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
                i + 1
            ));
        }

        content.push_str(
            r#"
    <Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>
    <Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>
    <Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
    <Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>
</Types>"#,
        );
        content
    }

    fn core_properties_xml(workbook: &Workbook) -> String {
        let settings = workbook.settings();
        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
        );
        if let Some(creator) = &settings.creator {
            content.push_str(&format!(
                "\n    <dc:creator>{}</dc:creator>",
                escape_xml(creator)
            ));
        }
        if let Some(created) = settings.created {
            content.push_str(&format!(
                "\n    <dcterms:created xsi:type=\"dcterms:W3CDTF\">{}</dcterms:created>",
                created.format("%Y-%m-%dT%H:%M:%SZ")
            ));
        }
        content.push_str("\n</cp:coreProperties>");
        content
    }

    fn workbook_xml(workbook: &Workbook) -> String {
        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
        );
        if workbook.settings().date_1904 {
            content.push_str("\n    <workbookPr date1904=\"1\"/>");
        }
        content.push_str("\n    <bookViews>\n        <workbookView activeTab=\"0\"/>\n    </bookViews>");
        content.push_str("\n    <sheets>");

        for (i, sheet) in workbook.sheets().enumerate() {
            content.push_str(&format!(
                r#"
        <sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                escape_xml(sheet.name()),
                i + 1,
                i + 1
            ));
        }

        content.push_str(
            r#"
    </sheets>
</workbook>"#,
        );
        content
    }

    /// Sheets take rId1..n, then styles and shared strings
    fn workbook_rels_xml(sheet_count: usize) -> String {
        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );

        for i in 0..sheet_count {
            content.push_str(&format!(
                r#"
    <Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
                i + 1,
                i + 1
            ));
        }

        content.push_str(&format!(
            r#"
    <Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
    <Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>
</Relationships>"#,
            sheet_count + 1,
            sheet_count + 2
        ));
        content
    }
}

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
    <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
    <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/>
</Relationships>"#;

const APP_PROPERTIES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">
    <Application>recordbook</Application>
    <DocSecurity>0</DocSecurity>
</Properties>"#;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use recordbook_core::{CellValue, Worksheet};
    use std::io::Read;

    fn sample_workbook() -> Workbook {
        let mut wb = Workbook::new();
        let mut people = Worksheet::new("People & Co");
        people.set_cell(0, 0, CellValue::string("Name"), 0).unwrap();
        people.set_cell(1, 0, CellValue::string("Field"), 0).unwrap();
        wb.add_sheet(people).unwrap();
        wb.add_worksheet_with_name("Empty").unwrap();
        wb
    }

    fn part(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut content = String::new();
        file.read_to_string(&mut content).unwrap();
        content
    }

    #[test]
    fn test_parts_present() {
        let bytes = PackageWriter::write(&sample_workbook(), None).unwrap();
        assert!(bytes.starts_with(b"PK"));

        let archive = zip::ZipArchive::new(Cursor::new(&bytes)).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        for expected in [
            "[Content_Types].xml",
            "_rels/.rels",
            "docProps/app.xml",
            "docProps/core.xml",
            "xl/workbook.xml",
            "xl/_rels/workbook.xml.rels",
            "xl/worksheets/sheet1.xml",
            "xl/worksheets/sheet2.xml",
            "xl/styles.xml",
            "xl/sharedStrings.xml",
        ] {
            assert!(names.contains(&expected), "missing {}", expected);
        }

        let content_types = part(&bytes, "[Content_Types].xml");
        assert!(content_types.contains("/xl/worksheets/sheet2.xml"));
        assert!(content_types.contains("/xl/sharedStrings.xml"));
    }

    #[test]
    fn test_workbook_part() {
        let mut wb = sample_workbook();
        wb.settings_mut().date_1904 = true;
        let bytes = PackageWriter::write(&wb, None).unwrap();

        let workbook = part(&bytes, "xl/workbook.xml");
        assert!(workbook.contains("<workbookPr date1904=\"1\"/>"));
        assert!(workbook.contains("name=\"People &amp; Co\" sheetId=\"1\" r:id=\"rId1\""));
        assert!(workbook.contains("name=\"Empty\" sheetId=\"2\" r:id=\"rId2\""));

        let rels = part(&bytes, "xl/_rels/workbook.xml.rels");
        assert!(rels.contains("Id=\"rId3\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles\""));
        assert!(rels.contains("Id=\"rId4\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings\""));
    }

    #[test]
    fn test_core_properties() {
        let mut wb = sample_workbook();
        let bytes = PackageWriter::write(&wb, None).unwrap();
        assert!(!part(&bytes, "docProps/core.xml").contains("dcterms:created"));

        wb.settings_mut().creator = Some("Ops <team>".into());
        wb.settings_mut().created = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(8, 30, 0);
        let bytes = PackageWriter::write(&wb, None).unwrap();
        let core = part(&bytes, "docProps/core.xml");
        assert!(core.contains("<dc:creator>Ops &lt;team&gt;</dc:creator>"));
        assert!(core.contains(">2024-03-01T08:30:00Z</dcterms:created>"));
    }

    #[test]
    fn test_deterministic_output() {
        let wb = sample_workbook();
        let first = PackageWriter::write(&wb, None).unwrap();
        let second = PackageWriter::write(&wb, None).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_shared_strings_deduplicated() {
        let bytes = PackageWriter::write(&sample_workbook(), None).unwrap();
        let sst = part(&bytes, "xl/sharedStrings.xml");
        assert!(sst.contains("count=\"2\" uniqueCount=\"2\""));
    }

    #[test]
    fn test_empty_password_rejected() {
        let err = PackageWriter::write(&sample_workbook(), Some("")).unwrap_err();
        assert!(matches!(err, XlsxError::InvalidPassword));

        let mut out = Vec::new();
        let options = WriteOptions::new().with_password("");
        assert!(PackageWriter::write_to(&sample_workbook(), &options, &mut out).is_err());
        assert!(out.is_empty());
    }

    #[test]
    fn test_encrypted_output_is_compound_file() {
        let options = WriteOptions::new()
            .with_password("secret")
            .with_encryption(EncryptionOptions::default().with_spin_count(10));
        let bytes = PackageWriter::write_with(&sample_workbook(), &options).unwrap();
        assert!(crypto::is_encrypted_package(&bytes));
    }

    #[test]
    fn test_workbook_styles_untouched() {
        let mut wb = Workbook::new();
        let mut sheet = Worksheet::new("Dates");
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        sheet.set_cell(0, 0, CellValue::date(date), 0).unwrap();
        wb.add_sheet(sheet).unwrap();

        let bytes = PackageWriter::write(&wb, None).unwrap();
        assert_eq!(wb.styles().len(), 1);
        assert!(part(&bytes, "xl/styles.xml").contains("<cellXfs count=\"2\">"));
    }
}
