//! Sheet configuration: titles, header switch, columns and styling callbacks

use crate::columns::{ColumnDef, ColumnMapping};
use recordbook_core::{CellValue, FieldValue, Style};
use std::fmt;

/// Formatting for one mapped column, handed to the column callback
///
/// `style` is the base style of every data cell in the column. When it
/// differs from the default, or a width is set, the column settings are
/// written to the sheet as well.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnFormat {
    /// 0-based column index
    pub index: u16,
    /// Display name of the column
    pub header: String,
    pub style: Style,
    /// Width in characters
    pub width: Option<f64>,
}

impl ColumnFormat {
    pub(crate) fn new(index: u16, header: &str) -> Self {
        Self {
            index,
            header: header.to_string(),
            style: Style::default(),
            width: None,
        }
    }
}

pub(crate) type StyleFn = Box<dyn Fn(&mut Style)>;
pub(crate) type ColumnFn = Box<dyn Fn(&mut ColumnFormat)>;
pub(crate) type HeaderFn = Box<dyn Fn(&mut Style, &str)>;
pub(crate) type TransformFn<R> = Box<dyn Fn(&R, u16, CellValue) -> CellValue>;
pub(crate) type CellFn<R> = Box<dyn Fn(&mut Style, &CellValue, &R)>;

/// Configuration of one sheet built from records of type `R`
///
/// Styling happens in a fixed order. For title rows: bold 14pt centred,
/// then `configure_title`. For header cells: bold, then
/// `configure_header_row`, then `configure_header`. For data cells the
/// value is produced first (accessor, conversion, `transform_value`) and
/// then styled: column style from `configure_column`, the value's date
/// format if the style still uses General, then `configure_cell`.
pub struct SheetConfig<R> {
    /// Caption rows above the header, one row per entry
    pub titles: Vec<String>,
    pub include_header: bool,
    /// Explicit columns; when empty the record's schema columns are used
    pub columns: ColumnMapping<R>,
    pub configure_title: Option<StyleFn>,
    pub configure_column: Option<ColumnFn>,
    pub configure_header_row: Option<StyleFn>,
    pub configure_header: Option<HeaderFn>,
    /// Value pass: may replace a converted value before it is styled
    pub transform_value: Option<TransformFn<R>>,
    /// Last styling stage for each data cell
    pub configure_cell: Option<CellFn<R>>,
}

impl<R> SheetConfig<R> {
    /// Create a configuration with a header row and no titles or columns
    pub fn new() -> Self {
        Self {
            titles: Vec::new(),
            include_header: true,
            columns: ColumnMapping::new(),
            configure_title: None,
            configure_column: None,
            configure_header_row: None,
            configure_header: None,
            transform_value: None,
            configure_cell: None,
        }
    }

    /// Add a title row
    pub fn with_title<S: Into<String>>(mut self, title: S) -> Self {
        self.titles.push(title.into());
        self
    }

    pub fn with_header(mut self, include_header: bool) -> Self {
        self.include_header = include_header;
        self
    }

    /// Add a column
    pub fn with_column<S, F>(mut self, header: S, accessor: F) -> Self
    where
        S: Into<String>,
        F: Fn(&R) -> FieldValue + 'static,
    {
        self.columns.push(ColumnDef::new(header, accessor));
        self
    }

    /// Replace the explicit columns
    pub fn with_columns(mut self, columns: ColumnMapping<R>) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_configure_title<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Style) + 'static,
    {
        self.configure_title = Some(Box::new(f));
        self
    }

    pub fn with_configure_column<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut ColumnFormat) + 'static,
    {
        self.configure_column = Some(Box::new(f));
        self
    }

    pub fn with_configure_header_row<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Style) + 'static,
    {
        self.configure_header_row = Some(Box::new(f));
        self
    }

    /// Style each header cell; receives the column's display name
    pub fn with_configure_header<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Style, &str) + 'static,
    {
        self.configure_header = Some(Box::new(f));
        self
    }

    /// Rewrite data values; receives the record and the 0-based column index
    pub fn with_transform_value<F>(mut self, f: F) -> Self
    where
        F: Fn(&R, u16, CellValue) -> CellValue + 'static,
    {
        self.transform_value = Some(Box::new(f));
        self
    }

    /// Style each data cell; receives its final value and source record
    pub fn with_configure_cell<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Style, &CellValue, &R) + 'static,
    {
        self.configure_cell = Some(Box::new(f));
        self
    }
}

impl<R> Default for SheetConfig<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> fmt::Debug for SheetConfig<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SheetConfig")
            .field("titles", &self.titles)
            .field("include_header", &self.include_header)
            .field("columns", &self.columns)
            .field("configure_title", &self.configure_title.is_some())
            .field("configure_column", &self.configure_column.is_some())
            .field("configure_header_row", &self.configure_header_row.is_some())
            .field("configure_header", &self.configure_header.is_some())
            .field("transform_value", &self.transform_value.is_some())
            .field("configure_cell", &self.configure_cell.is_some())
            .finish()
    }
}
