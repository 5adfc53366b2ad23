//! # recordbook-xlsx
//!
//! XLSX (Office Open XML) package writer and reader for recordbook
//! workbooks, with optional password protection using ECMA-376 Agile
//! encryption.
//!
//! ```rust
//! use recordbook_core::{CellValue, Workbook, Worksheet};
//! use recordbook_xlsx::{PackageReader, PackageWriter};
//!
//! let mut workbook = Workbook::new();
//! let mut sheet = Worksheet::new("Data");
//! sheet.set_cell(0, 0, CellValue::string("hello"), 0).unwrap();
//! workbook.add_sheet(sheet).unwrap();
//!
//! let bytes = PackageWriter::write(&workbook, None).unwrap();
//! let back = PackageReader::read(&bytes, None).unwrap();
//! assert_eq!(back.sheet(0).unwrap().get_value("A1").unwrap(), CellValue::string("hello"));
//! ```

pub mod crypto;
pub mod error;
pub mod reader;
pub mod writer;

mod shared_strings;
mod styles;
mod xml;

pub use crypto::{EncryptionOptions, HashAlgorithm};
pub use error::{XlsxError, XlsxResult};
pub use reader::PackageReader;
pub use writer::{PackageWriter, WriteOptions};
