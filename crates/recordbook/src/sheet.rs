//! Sheet builder: lays records out as title, header and data rows

use crate::columns::{ColumnMapping, Record};
use crate::config::{ColumnFormat, SheetConfig};
use crate::error::Result;
use log::debug;
use recordbook_core::{
    CellRange, CellValue, Column, Error as CoreError, FieldValue, HorizontalAlignment, RowKind,
    Style, StyleTable, Workbook, Worksheet, MAX_COLS,
};

/// Font size of title rows
const TITLE_FONT_SIZE: f64 = 14.0;

/// Builds one [`Worksheet`] from a slice of records
///
/// ```rust
/// use recordbook::{SheetBuilder, StyleTable};
///
/// let years = [1946u32, 1949];
/// let sheet = SheetBuilder::new("Years")
///     .with_title("Born before 1950")
///     .with_column("Year", |y: &u32| (*y).into())
///     .build(&mut StyleTable::new(), &years)
///     .unwrap();
///
/// // title + header + two records
/// assert_eq!(sheet.row_count(), 4);
/// ```
pub struct SheetBuilder<R> {
    name: String,
    config: SheetConfig<R>,
    schema: Option<fn() -> ColumnMapping<R>>,
}

impl<R> SheetBuilder<R> {
    /// Create a builder that only uses explicitly added columns
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            config: SheetConfig::new(),
            schema: None,
        }
    }

    /// Name of the sheet being built
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &SheetConfig<R> {
        &self.config
    }

    pub fn with_column<S, F>(mut self, header: S, accessor: F) -> Self
    where
        S: Into<String>,
        F: Fn(&R) -> FieldValue + 'static,
    {
        self.config = self.config.with_column(header, accessor);
        self
    }

    pub fn with_title<S: Into<String>>(mut self, title: S) -> Self {
        self.config.titles.push(title.into());
        self
    }

    /// Leave out the header row
    pub fn without_header(mut self) -> Self {
        self.config.include_header = false;
        self
    }

    /// Replace the whole configuration
    pub fn with_config(mut self, config: SheetConfig<R>) -> Self {
        self.config = config;
        self
    }

    /// Change the configuration in place
    pub fn configure<F: FnOnce(SheetConfig<R>) -> SheetConfig<R>>(mut self, f: F) -> Self {
        self.config = f(self.config);
        self
    }

    /// Lay out `records` as a worksheet, interning its styles into `styles`
    ///
    /// Fails with `NoColumnsDefined` when neither explicit nor schema
    /// columns exist, and with `UnsupportedValueType` on the first field
    /// that has no cell representation. Dates are checked against the 1900
    /// epoch; [`build_for`](Self::build_for) follows the workbook's epoch.
    pub fn build(&self, styles: &mut StyleTable, records: &[R]) -> Result<Worksheet> {
        self.layout(styles, false, records)
    }

    /// Lay out `records` for `workbook`, using its style table and date epoch
    ///
    /// The sheet is returned, not added.
    pub fn build_for(&self, workbook: &mut Workbook, records: &[R]) -> Result<Worksheet> {
        let date_1904 = workbook.settings().date_1904;
        self.layout(workbook.styles_mut(), date_1904, records)
    }

    fn layout(&self, styles: &mut StyleTable, date_1904: bool, records: &[R]) -> Result<Worksheet> {
        let schema;
        let columns = match self.schema {
            Some(schema_fn) if self.config.columns.is_empty() => {
                schema = schema_fn();
                &schema
            }
            _ => &self.config.columns,
        };
        if columns.is_empty() {
            return Err(CoreError::NoColumnsDefined(self.name.clone()).into());
        }
        let last_col = match u16::try_from(columns.len() - 1) {
            Ok(col) if col < MAX_COLS => col,
            _ => {
                return Err(CoreError::other(format!(
                    "sheet '{}' maps {} columns, more than the {} a sheet holds",
                    self.name,
                    columns.len(),
                    MAX_COLS
                ))
                .into())
            }
        };

        let mut sheet = Worksheet::new(self.name.as_str());
        self.write_titles(&mut sheet, styles, last_col)?;

        let formats = self.column_formats(columns);
        for format in &formats {
            let mut column = Column::new(format.index);
            if format.style != Style::default() {
                column = column.with_style(styles.intern(format.style.clone()));
            }
            if let Some(width) = format.width {
                column = column.with_width(width);
            }
            if column.has_custom_settings() {
                sheet.set_column(column);
            }
        }

        if self.config.include_header {
            self.write_header(&mut sheet, styles, columns)?;
        }

        for record in records {
            let row = sheet.push_row(RowKind::Data);
            for ((col, column), format) in (0u16..).zip(columns.iter()).zip(&formats) {
                let mut value = CellValue::try_from(column.value(record))?;
                if let Some(transform) = &self.config.transform_value {
                    value = transform(record, col, value);
                }
                value.check(date_1904)?;

                let mut style = format.style.clone();
                if style.number_format.is_general() && value.is_temporal() {
                    style.number_format = value.default_number_format();
                }
                if let Some(configure) = &self.config.configure_cell {
                    configure(&mut style, &value, record);
                }
                sheet.set_cell(row, col, value, styles.intern(style))?;
            }
        }

        debug!(
            "built sheet '{}': {} titles, header {}, {} records, {} columns",
            self.name,
            self.config.titles.len(),
            self.config.include_header,
            records.len(),
            columns.len()
        );
        Ok(sheet)
    }

    fn write_titles(
        &self,
        sheet: &mut Worksheet,
        styles: &mut StyleTable,
        last_col: u16,
    ) -> Result<()> {
        if self.config.titles.is_empty() {
            return Ok(());
        }
        let mut style = Style::new()
            .bold(true)
            .font_size(TITLE_FONT_SIZE)
            .horizontal_alignment(HorizontalAlignment::Center);
        if let Some(configure) = &self.config.configure_title {
            configure(&mut style);
        }
        let style = styles.intern(style);

        for title in &self.config.titles {
            let row = sheet.push_row(RowKind::Title);
            sheet.set_cell(row, 0, CellValue::string(title), style)?;
            for col in 1..=last_col {
                sheet.set_cell(row, col, CellValue::Empty, style)?;
            }
            if last_col > 0 {
                sheet.merge_cells(CellRange::from_indices(row, 0, row, last_col))?;
            }
        }
        Ok(())
    }

    fn column_formats(&self, columns: &ColumnMapping<R>) -> Vec<ColumnFormat> {
        (0u16..)
            .zip(columns.iter())
            .map(|(index, column)| {
                let mut format = ColumnFormat::new(index, column.header());
                if let Some(configure) = &self.config.configure_column {
                    configure(&mut format);
                }
                format.index = index;
                format
            })
            .collect()
    }

    fn write_header(
        &self,
        sheet: &mut Worksheet,
        styles: &mut StyleTable,
        columns: &ColumnMapping<R>,
    ) -> Result<()> {
        let mut row_style = Style::new().bold(true);
        if let Some(configure) = &self.config.configure_header_row {
            configure(&mut row_style);
        }

        let row = sheet.push_row(RowKind::Header);
        for (col, header) in (0u16..).zip(columns.headers()) {
            let mut style = row_style.clone();
            if let Some(configure) = &self.config.configure_header {
                configure(&mut style, header);
            }
            sheet.set_cell(row, col, CellValue::string(header), styles.intern(style))?;
        }
        Ok(())
    }
}

impl<R: Record> SheetBuilder<R> {
    /// Create a builder falling back to the record's schema columns
    ///
    /// Explicitly added columns replace the schema entirely.
    pub fn for_record<S: Into<String>>(name: S) -> Self {
        Self {
            schema: Some(R::columns as fn() -> ColumnMapping<R>),
            ..Self::new(name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use recordbook_core::{Color, NumberFormat};

    #[derive(Clone)]
    struct Person {
        first_name: &'static str,
        last_name: &'static str,
        year_born: i32,
    }

    impl Record for Person {
        fn columns() -> ColumnMapping<Self> {
            ColumnMapping::new()
                .column("Last Name", |p: &Person| p.last_name.into())
                .column("Year of Birth", |p: &Person| p.year_born.into())
        }
    }

    fn people() -> Vec<Person> {
        vec![
            Person {
                first_name: "Sally",
                last_name: "Field",
                year_born: 1946,
            },
            Person {
                first_name: "David",
                last_name: "Strathairn",
                year_born: 1949,
            },
        ]
    }

    #[test]
    fn test_schema_columns() {
        let mut styles = StyleTable::new();
        let sheet = SheetBuilder::<Person>::for_record("People")
            .build(&mut styles, &people())
            .unwrap();

        assert_eq!(sheet.column_count(), 2);
        assert_eq!(sheet.row_count(), 3);
        assert_eq!(sheet.get_value("A1").unwrap(), CellValue::string("Last Name"));
        assert_eq!(sheet.get_value("B3").unwrap(), CellValue::Number(1949.0));
        assert_eq!(sheet.row(0).map(|r| r.kind), Some(RowKind::Header));
        assert_eq!(sheet.row(1).map(|r| r.kind), Some(RowKind::Data));
    }

    #[test]
    fn test_explicit_columns_replace_schema() {
        let sheet = SheetBuilder::for_record("People")
            .with_column("First Name", |p: &Person| p.first_name.into())
            .build(&mut StyleTable::new(), &people())
            .unwrap();

        assert_eq!(sheet.column_count(), 1);
        assert_eq!(sheet.get_value("A2").unwrap(), CellValue::string("Sally"));
    }

    #[test]
    fn test_no_columns() {
        let err = SheetBuilder::<Person>::new("Empty")
            .build(&mut StyleTable::new(), &people())
            .unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Core(CoreError::NoColumnsDefined(ref name)) if name == "Empty"
        ));
    }

    #[test]
    fn test_titles_are_merged_across_columns() {
        let mut styles = StyleTable::new();
        let sheet = SheetBuilder::<Person>::for_record("People")
            .with_title("Actors")
            .with_title("In the movie Lincoln")
            .build(&mut styles, &people())
            .unwrap();

        assert_eq!(sheet.row_count(), 2 + 1 + 2);
        let merged: Vec<String> = sheet
            .merged_regions()
            .iter()
            .map(|r| r.to_a1_string())
            .collect();
        assert_eq!(merged, vec!["A1:B1", "A2:B2"]);

        let title = sheet.cell_at(0, 0).unwrap();
        let filler = sheet.cell_at(0, 1).unwrap();
        assert_eq!(title.value, CellValue::string("Actors"));
        assert!(filler.value.is_empty());
        assert_eq!(title.style, filler.style);

        let style = styles.get(title.style).unwrap();
        assert!(style.font.bold);
        assert_eq!(style.font.size, TITLE_FONT_SIZE);
        assert_eq!(style.alignment.horizontal, HorizontalAlignment::Center);
    }

    #[test]
    fn test_single_column_title_is_not_merged() {
        let sheet = SheetBuilder::new("One")
            .with_title("Only")
            .with_column("Name", |p: &Person| p.last_name.into())
            .build(&mut StyleTable::new(), &people())
            .unwrap();
        assert!(sheet.merged_regions().is_empty());
        assert_eq!(sheet.row_count(), 4);
    }

    #[test]
    fn test_empty_records_keep_title_and_header() {
        let sheet = SheetBuilder::<Person>::for_record("People")
            .with_title("Nobody")
            .build(&mut StyleTable::new(), &[])
            .unwrap();
        assert_eq!(sheet.row_count(), 2);
        assert_eq!(sheet.column_count(), 2);
    }

    #[test]
    fn test_header_style_precedence() {
        let config = SheetConfig::new()
            .with_columns(Person::columns())
            .with_configure_header_row(|style| {
                style.font.name = "Verdana".to_string();
                style.font.italic = true;
            })
            .with_configure_header(|style, header| {
                if header == "Last Name" {
                    style.font.italic = false;
                }
            });

        let mut styles = StyleTable::new();
        let sheet = SheetBuilder::new("People")
            .with_config(config)
            .build(&mut styles, &people())
            .unwrap();

        let a1 = styles.get(sheet.cell_at(0, 0).unwrap().style).unwrap();
        let b1 = styles.get(sheet.cell_at(0, 1).unwrap().style).unwrap();
        assert!(a1.font.bold);
        assert_eq!(a1.font.name, "Verdana");
        assert!(!a1.font.italic);
        assert!(b1.font.italic);
    }

    #[test]
    fn test_value_pass_runs_before_cell_styling() {
        let config = SheetConfig::new()
            .with_columns(Person::columns())
            .with_transform_value(|person: &Person, col, value| {
                if col == 1 && person.year_born % 2 != 0 {
                    CellValue::Number(1990.0)
                } else {
                    value
                }
            })
            .with_configure_cell(|style, value, _| {
                if value.as_number() == Some(1990.0) {
                    style.font.color = Color::rgb(0xFF, 0, 0);
                }
            });

        let mut styles = StyleTable::new();
        let sheet = SheetBuilder::new("People")
            .with_config(config)
            .without_header()
            .build(&mut styles, &people())
            .unwrap();

        assert_eq!(sheet.get_value("B1").unwrap(), CellValue::Number(1946.0));
        assert_eq!(sheet.get_value("B2").unwrap(), CellValue::Number(1990.0));
        let flagged = styles.get(sheet.cell_at(1, 1).unwrap().style).unwrap();
        assert_eq!(flagged.font.color, Color::rgb(0xFF, 0, 0));
        assert_eq!(sheet.cell_at(0, 1).unwrap().style, 0);
    }

    #[test]
    fn test_column_format_applies_to_data_cells() {
        let mut styles = StyleTable::new();
        let sheet = SheetBuilder::<Person>::for_record("People")
            .configure(|config| {
                config.with_configure_column(|format| {
                    if format.header == "Year of Birth" {
                        format.style.number_format =
                            NumberFormat::BuiltIn(NumberFormat::ID_NUMBER_INT);
                        format.width = Some(14.0);
                    }
                })
            })
            .build(&mut styles, &people())
            .unwrap();

        assert!(sheet.column(0).is_none());
        let column = sheet.column(1).unwrap();
        assert_eq!(column.width, Some(14.0));
        let column_style = column.style.unwrap();
        assert_eq!(sheet.cell_at(1, 1).unwrap().style, column_style);
        // Header cells keep the header style
        assert_ne!(sheet.cell_at(0, 1).unwrap().style, column_style);
    }

    #[test]
    fn test_dates_get_a_date_format() {
        let born = NaiveDate::from_ymd_opt(1946, 11, 6).unwrap();
        let mut styles = StyleTable::new();
        let sheet = SheetBuilder::new("Dates")
            .with_column("Born", move |_: &Person| born.into())
            .with_column("Custom", move |_: &Person| born.into())
            .configure(|config| {
                config.with_configure_column(|format| {
                    if format.index == 1 {
                        format.style.number_format = NumberFormat::custom("yyyy");
                    }
                })
            })
            .build(&mut styles, &people()[..1])
            .unwrap();

        let inferred = styles.get(sheet.cell_at(1, 0).unwrap().style).unwrap();
        assert_eq!(
            inferred.number_format,
            NumberFormat::BuiltIn(NumberFormat::ID_DATE_SHORT)
        );
        let custom = styles.get(sheet.cell_at(1, 1).unwrap().style).unwrap();
        assert_eq!(custom.number_format, NumberFormat::custom("yyyy"));
    }

    #[test]
    fn test_unsupported_value() {
        let err = SheetBuilder::new("Blobs")
            .with_column("Raw", |_: &Person| vec![0u8, 1, 2].into())
            .build(&mut StyleTable::new(), &people())
            .unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Core(CoreError::UnsupportedValueType(_))
        ));
    }

    #[test]
    fn test_transformed_value_is_checked() {
        let err = SheetBuilder::<Person>::for_record("People")
            .configure(|config| {
                config.with_transform_value(|_, _, _| CellValue::Number(f64::NAN))
            })
            .build(&mut StyleTable::new(), &people())
            .unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Core(CoreError::UnsupportedValueType(_))
        ));
    }

    #[test]
    fn test_dates_follow_workbook_epoch() {
        let born = |_: &Person| -> FieldValue {
            NaiveDate::from_ymd_opt(1902, 1, 1).unwrap().into()
        };
        let builder = SheetBuilder::new("Born").with_column("Born", born);

        let mut workbook = Workbook::new();
        assert!(builder.build_for(&mut workbook, &people()).is_ok());

        workbook.settings_mut().date_1904 = true;
        let err = builder.build_for(&mut workbook, &people()).unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Core(CoreError::UnsupportedValueType(_))
        ));
    }

    #[test]
    fn test_equal_styles_share_an_index() {
        let mut styles = StyleTable::new();
        let first = SheetBuilder::<Person>::for_record("First")
            .build(&mut styles, &people())
            .unwrap();
        let second = SheetBuilder::<Person>::for_record("Second")
            .build(&mut styles, &people())
            .unwrap();

        assert_eq!(
            first.cell_at(0, 0).unwrap().style,
            second.cell_at(0, 0).unwrap().style
        );
        // default + bold header
        assert_eq!(styles.len(), 2);
    }
}
