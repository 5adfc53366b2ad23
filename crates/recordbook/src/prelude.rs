//! Prelude module - common imports for recordbook users
//!
//! ```rust
//! use recordbook::prelude::*;
//! ```

pub use crate::{
    // Style types
    BorderLineStyle,
    CellRange,
    // Cell types
    CellValue,
    Color,
    // Sheet building
    ColumnFormat,
    ColumnMapping,
    // Error types
    Error,
    FieldValue,
    HorizontalAlignment,
    NumberFormat,
    // I/O types
    PackageReader,
    PackageWriter,
    Record,
    Result,
    SheetBuilder,
    SheetConfig,
    Style,
    StyleTable,
    VerticalAlignment,
    // Main types
    Workbook,
    WorkbookBuilder,
    // Extension traits
    WorkbookExt,
    WorkbookSettings,
    Worksheet,
    WriteOptions,
};
