//! Workbook builder: chains sheets into one workbook sharing a style table

use crate::error::Result;
use crate::sheet::SheetBuilder;
use log::debug;
use recordbook_core::{Workbook, WorkbookSettings};
use recordbook_xlsx::{PackageWriter, WriteOptions};

/// Assembles sheets, in call order, into a [`Workbook`]
///
/// ```rust
/// use recordbook::{SheetBuilder, WorkbookBuilder};
///
/// let before = [1946u32, 1949];
/// let after = [1957u32, 1960, 1981];
///
/// let workbook = WorkbookBuilder::new()
///     .sheet(
///         SheetBuilder::new("< 1950")
///             .with_title("< 1950")
///             .with_column("Year", |y: &u32| (*y).into()),
///         &before,
///     )?
///     .sheet(
///         SheetBuilder::new("> 1950")
///             .with_column("Year", |y: &u32| (*y).into())
///             .without_header(),
///         &after,
///     )?
///     .build();
///
/// assert_eq!(workbook.sheet_count(), 2);
/// assert_eq!(workbook.sheet(0).unwrap().row_count(), 4);
/// assert_eq!(workbook.sheet(1).unwrap().row_count(), 3);
/// # Ok::<(), recordbook::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct WorkbookBuilder {
    workbook: Workbook,
}

impl WorkbookBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a sheet from `records` and append it
    ///
    /// Fails with `DuplicateSheetName` when a sheet with the same name
    /// (ignoring case) was already added.
    pub fn sheet<R>(mut self, builder: SheetBuilder<R>, records: &[R]) -> Result<Self> {
        let sheet = builder.build_for(&mut self.workbook, records)?;
        let index = self.workbook.add_sheet(sheet)?;
        debug!("added sheet '{}' at position {}", builder.name(), index);
        Ok(self)
    }

    pub fn with_settings(mut self, settings: WorkbookSettings) -> Self {
        *self.workbook.settings_mut() = settings;
        self
    }

    /// Finish and return the workbook model
    pub fn build(self) -> Workbook {
        self.workbook
    }

    /// Serialize straight to package bytes, encrypted when a password is given
    pub fn to_xlsx(&self, password: Option<&str>) -> Result<Vec<u8>> {
        Ok(PackageWriter::write(&self.workbook, password)?)
    }

    /// Serialize with explicit write options
    pub fn to_xlsx_with(&self, options: &WriteOptions) -> Result<Vec<u8>> {
        Ok(PackageWriter::write_with(&self.workbook, options)?)
    }
}

impl From<WorkbookBuilder> for Workbook {
    fn from(builder: WorkbookBuilder) -> Self {
        builder.build()
    }
}
