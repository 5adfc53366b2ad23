//! # recordbook
//!
//! Turn sequences of records into styled XLSX workbooks, optionally
//! password protected, and read such workbooks back.
//!
//! ## Features
//!
//! - Explicit column mappings, or a per-type schema through [`Record`]
//! - Title rows merged across the sheet, an optional bold header row
//! - Styling callbacks for titles, columns, header cells and data cells
//! - One deduplicated style table and one shared-string table per workbook
//! - Agile (AES) password encryption of the written package
//!
//! ## Example
//!
//! ```rust
//! use recordbook::prelude::*;
//!
//! struct Person {
//!     last_name: String,
//!     year_born: i32,
//! }
//!
//! impl Record for Person {
//!     fn columns() -> ColumnMapping<Self> {
//!         ColumnMapping::new()
//!             .column("Last Name", |p: &Person| p.last_name.as_str().into())
//!             .column("Year of Birth", |p: &Person| p.year_born.into())
//!     }
//! }
//!
//! let people = vec![
//!     Person { last_name: "Field".into(), year_born: 1946 },
//!     Person { last_name: "Spader".into(), year_born: 1960 },
//! ];
//!
//! let bytes = WorkbookBuilder::new()
//!     .sheet(SheetBuilder::for_record("Actors").with_title("Actors"), &people)?
//!     .to_xlsx(Some("Test1234"))?;
//!
//! let workbook = recordbook::read_xlsx(&bytes, Some("Test1234"))?;
//! let sheet = workbook.sheet(0).unwrap();
//! assert_eq!(sheet.row_count(), 4);
//! assert_eq!(sheet.get_value("A2")?, CellValue::string("Last Name"));
//! # Ok::<(), recordbook::Error>(())
//! ```

pub mod columns;
pub mod config;
pub mod error;
pub mod prelude;
pub mod sheet;
pub mod workbook;

pub use columns::{ColumnDef, ColumnMapping, Record};
pub use config::{ColumnFormat, SheetConfig};
pub use error::{Error, Result};
pub use sheet::SheetBuilder;
pub use workbook::WorkbookBuilder;

// Re-export core types
pub use recordbook_core::{
    Alignment, BorderEdge, BorderLineStyle, BorderSide, BorderStyle, CellAddress, CellRange,
    CellValue, Color, Column, FieldValue, FillStyle, FontStyle, HorizontalAlignment, NumberFormat,
    PatternType, Row, RowKind, Style, StyleTable, Underline, VerticalAlignment, Workbook,
    WorkbookSettings, Worksheet, MAX_COLS, MAX_ROWS, MAX_SHEET_NAME_LEN,
};

// Re-export package types
pub use recordbook_xlsx::{
    EncryptionOptions, HashAlgorithm, PackageReader, PackageWriter, WriteOptions, XlsxError,
};

use std::path::Path;

/// Name of the sheet created by the one-call helpers
pub const DEFAULT_SHEET_NAME: &str = "Sheet1";

/// Build a single-sheet workbook from records using their schema columns
pub fn to_workbook<R: Record>(records: &[R], include_header: bool) -> Result<Workbook> {
    let mut sheet = SheetBuilder::for_record(DEFAULT_SHEET_NAME);
    if !include_header {
        sheet = sheet.without_header();
    }
    Ok(WorkbookBuilder::new().sheet(sheet, records)?.build())
}

/// Serialize records to unencrypted package bytes using their schema columns
pub fn to_xlsx<R: Record>(records: &[R], include_header: bool) -> Result<Vec<u8>> {
    let workbook = to_workbook(records, include_header)?;
    Ok(PackageWriter::write(&workbook, None)?)
}

/// Parse package bytes, decrypting them when a password is given
pub fn read_xlsx(bytes: &[u8], password: Option<&str>) -> Result<Workbook> {
    Ok(PackageReader::read(bytes, password)?)
}

/// Extension trait for Workbook to add file I/O
pub trait WorkbookExt: Sized {
    /// Open a workbook file, decrypting it when a password is given
    fn open<P: AsRef<Path>>(path: P, password: Option<&str>) -> Result<Self>;

    /// Save the workbook to a file, encrypting it when a password is given
    fn save<P: AsRef<Path>>(&self, path: P, password: Option<&str>) -> Result<()>;
}

impl WorkbookExt for Workbook {
    fn open<P: AsRef<Path>>(path: P, password: Option<&str>) -> Result<Workbook> {
        Ok(PackageReader::read_file(path, password)?)
    }

    fn save<P: AsRef<Path>>(&self, path: P, password: Option<&str>) -> Result<()> {
        let mut options = WriteOptions::new();
        if let Some(password) = password {
            options = options.with_password(password);
        }
        Ok(PackageWriter::write_file(self, path, &options)?)
    }
}
