//! # recordbook-core
//!
//! In-memory workbook model used by the recordbook serializer.
//!
//! - [`CellValue`] and [`FieldValue`] - cell values and the dynamic values column accessors produce
//! - [`CellEncoder`] - turns cell values into package primitives plus an inferred number format
//! - [`SharedStringTable`] - workbook-wide string dedup table
//! - [`Style`] and [`StyleTable`] - formatting records and their dedup registry
//! - [`Workbook`], [`Worksheet`], [`Row`], [`Column`] - the document structure
//!
//! ## Example
//!
//! ```rust
//! use recordbook_core::{CellValue, RowKind, Style, Workbook, Worksheet};
//!
//! let mut workbook = Workbook::new();
//! let bold = workbook.styles_mut().intern(Style::new().bold(true));
//!
//! let mut sheet = Worksheet::new("People");
//! let header = sheet.push_row(RowKind::Header);
//! sheet.set_cell(header, 0, CellValue::string("Name"), bold).unwrap();
//! let row = sheet.push_row(RowKind::Data);
//! sheet.set_cell(row, 0, CellValue::string("Field"), 0).unwrap();
//!
//! workbook.add_sheet(sheet).unwrap();
//! assert_eq!(workbook.sheet(0).unwrap().row_count(), 2);
//! ```

pub mod cell;
pub mod column;
pub mod error;
pub mod row;
pub mod style;
pub mod workbook;
pub mod worksheet;

// Re-exports for convenience
pub use cell::{
    CellAddress, CellEncoder, CellRange, CellValue, Encoded, FieldValue, Primitive,
    SharedString, SharedStringTable,
};
pub use column::Column;
pub use error::{Error, Result};
pub use row::{Cell, Row, RowKind};
pub use workbook::{validate_sheet_name, Workbook, WorkbookSettings};
pub use worksheet::Worksheet;

pub use style::{
    Alignment, BorderEdge, BorderLineStyle, BorderSide, BorderStyle, Color, FillStyle, FontStyle,
    HorizontalAlignment, NumberFormat, PatternType, Style, StyleTable, Underline,
    VerticalAlignment,
};

/// Maximum number of rows in a worksheet
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet
pub const MAX_COLS: u16 = 16_384;

/// Maximum length of a sheet name
pub const MAX_SHEET_NAME_LEN: usize = 31;
