//! Cell-related types and utilities
//!
//! This module contains:
//! - [`CellValue`] - The value stored in a cell
//! - [`FieldValue`] - The dynamic value a column accessor yields for a record
//! - [`CellAddress`] / [`CellRange`] - Cell locations (e.g., "A1", "A1:C1")
//! - [`CellEncoder`] - Conversion of values into package primitives
//! - [`SharedStringTable`] - Workbook-wide string dedup

mod address;
pub mod date;
mod encoder;
mod shared_strings;
mod value;

pub use address::{CellAddress, CellRange};
pub use encoder::{CellEncoder, Encoded, Primitive};
pub use shared_strings::SharedStringTable;
pub use value::{CellValue, FieldValue, SharedString};
