//! Workbook type - the main document structure

use crate::error::{Error, Result};
use crate::style::StyleTable;
use crate::worksheet::Worksheet;
use crate::MAX_SHEET_NAME_LEN;
use chrono::NaiveDateTime;

/// Characters a sheet name may not contain
const INVALID_SHEET_NAME_CHARS: &[char] = &[':', '\\', '/', '?', '*', '[', ']'];

/// A workbook: an ordered list of sheets sharing one style table
///
/// Sheet order is insertion order, which is also display order. Sheets never
/// carry private styles; every cell style index resolves in [`Workbook::styles`].
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    worksheets: Vec<Worksheet>,
    styles: StyleTable,
    settings: WorkbookSettings,
}

impl Workbook {
    /// Create an empty workbook with no worksheets
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty workbook around an existing style table
    pub fn with_styles(styles: StyleTable) -> Self {
        Self {
            styles,
            ..Self::default()
        }
    }

    /// Get the number of worksheets
    pub fn sheet_count(&self) -> usize {
        self.worksheets.len()
    }

    /// Check if the workbook has no worksheets
    pub fn is_empty(&self) -> bool {
        self.worksheets.is_empty()
    }

    /// Get a worksheet by index
    pub fn sheet(&self, index: usize) -> Option<&Worksheet> {
        self.worksheets.get(index)
    }

    /// Get a mutable worksheet by index
    pub fn sheet_mut(&mut self, index: usize) -> Option<&mut Worksheet> {
        self.worksheets.get_mut(index)
    }

    /// Get a worksheet by name (case-insensitive)
    pub fn sheet_by_name(&self, name: &str) -> Option<&Worksheet> {
        self.sheet_index(name).map(|i| &self.worksheets[i])
    }

    /// Position of a sheet by name (case-insensitive)
    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        let lower = name.to_lowercase();
        self.worksheets
            .iter()
            .position(|ws| ws.name().to_lowercase() == lower)
    }

    /// Iterate over worksheets in order
    pub fn sheets(&self) -> impl Iterator<Item = &Worksheet> {
        self.worksheets.iter()
    }

    /// Append a worksheet and return its position
    ///
    /// Fails with [`Error::DuplicateSheetName`] when a sheet with the same
    /// name (ignoring case) already exists, and with
    /// [`Error::InvalidStyleIndex`] when a cell refers to a style slot this
    /// workbook's table does not have.
    pub fn add_sheet(&mut self, worksheet: Worksheet) -> Result<usize> {
        self.validate_sheet_name(worksheet.name())?;
        if let Some(max) = worksheet.max_style_index() {
            if max as usize >= self.styles.len() {
                return Err(Error::InvalidStyleIndex(max));
            }
        }
        self.worksheets.push(worksheet);
        Ok(self.worksheets.len() - 1)
    }

    /// Append an empty worksheet with the given name
    pub fn add_worksheet_with_name(&mut self, name: &str) -> Result<usize> {
        self.add_sheet(Worksheet::new(name))
    }

    /// Shared style table
    pub fn styles(&self) -> &StyleTable {
        &self.styles
    }

    /// Mutable access to the shared style table
    pub fn styles_mut(&mut self) -> &mut StyleTable {
        &mut self.styles
    }

    /// Get workbook settings
    pub fn settings(&self) -> &WorkbookSettings {
        &self.settings
    }

    /// Get mutable workbook settings
    pub fn settings_mut(&mut self) -> &mut WorkbookSettings {
        &mut self.settings
    }

    fn validate_sheet_name(&self, name: &str) -> Result<()> {
        validate_sheet_name(name)?;
        if self.sheet_index(name).is_some() {
            return Err(Error::DuplicateSheetName(name.into()));
        }
        Ok(())
    }
}

/// Check a sheet name against the package rules
///
/// Names must be 1 to 31 characters long and must not contain `:\/?*[]`
/// or control characters.
pub fn validate_sheet_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidSheetName("Sheet name cannot be empty".into()));
    }
    if name.chars().count() > MAX_SHEET_NAME_LEN {
        return Err(Error::InvalidSheetName(format!(
            "'{}' is too long (max {} characters)",
            name, MAX_SHEET_NAME_LEN
        )));
    }
    if let Some(c) = name.chars().find(|c| INVALID_SHEET_NAME_CHARS.contains(c)) {
        return Err(Error::InvalidSheetName(format!(
            "'{}' cannot contain '{}'",
            name, c
        )));
    }
    if let Some(c) = name.chars().find(|c| c.is_control()) {
        return Err(Error::InvalidSheetName(format!(
            "'{}' cannot contain control character U+{:04X}",
            name.escape_debug(),
            c as u32
        )));
    }
    Ok(())
}

/// Workbook-level settings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkbookSettings {
    /// Date system: false = 1900, true = 1904
    pub date_1904: bool,
    /// Document author written to the core properties
    pub creator: Option<String>,
    /// Creation timestamp written to the core properties
    ///
    /// Left unset, no timestamp is written and output stays byte-identical
    /// across runs.
    pub created: Option<NaiveDateTime>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellValue;
    use crate::style::Style;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_workbook() {
        let wb = Workbook::new();
        assert_eq!(wb.sheet_count(), 0);
        assert_eq!(wb.styles().len(), 1);
    }

    #[test]
    fn test_add_sheets_in_order() {
        let mut wb = Workbook::new();
        assert_eq!(wb.add_worksheet_with_name("Pre 1950").unwrap(), 0);
        assert_eq!(wb.add_worksheet_with_name("Post 1950").unwrap(), 1);

        let names: Vec<&str> = wb.sheets().map(|s| s.name()).collect();
        assert_eq!(names, vec!["Pre 1950", "Post 1950"]);
        assert_eq!(wb.sheet_index("post 1950"), Some(1));
    }

    #[test]
    fn test_duplicate_name() {
        let mut wb = Workbook::new();
        wb.add_worksheet_with_name("Sheet1").unwrap();

        let err = wb.add_worksheet_with_name("SHEET1").unwrap_err();
        assert!(matches!(err, Error::DuplicateSheetName(_)));
        assert_eq!(wb.sheet_count(), 1);
    }

    #[test]
    fn test_invalid_sheet_name() {
        let mut wb = Workbook::new();

        for name in [
            "",
            "Sheet/1",
            "Sheet:1",
            "Sheet[1]",
            "a?b",
            "x*",
            "Tab\tName",
            "Bell\u{7}",
            "Line\nBreak",
        ] {
            let err = wb.add_worksheet_with_name(name).unwrap_err();
            assert!(matches!(err, Error::InvalidSheetName(_)), "{name}");
        }

        let long_name = "A".repeat(MAX_SHEET_NAME_LEN + 1);
        assert!(wb.add_worksheet_with_name(&long_name).is_err());
        // Length counts characters, not bytes
        let accented = "é".repeat(MAX_SHEET_NAME_LEN);
        assert!(wb.add_worksheet_with_name(&accented).is_ok());
    }

    #[test]
    fn test_rejects_unknown_style_index() {
        let mut wb = Workbook::new();
        let bold = wb.styles_mut().intern(Style::new().bold(true));

        let mut ok = Worksheet::new("Ok");
        ok.set_cell(0, 0, CellValue::string("x"), bold).unwrap();
        assert!(wb.add_sheet(ok).is_ok());

        let mut bad = Worksheet::new("Bad");
        bad.set_cell(0, 0, CellValue::string("x"), 7).unwrap();
        let err = wb.add_sheet(bad).unwrap_err();
        assert!(matches!(err, Error::InvalidStyleIndex(7)));
    }
}
