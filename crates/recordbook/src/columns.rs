//! Column mappings: how a record type turns into sheet columns

use recordbook_core::FieldValue;
use std::fmt;

type Accessor<R> = Box<dyn Fn(&R) -> FieldValue>;

/// One mapped column: a display name plus the accessor producing its values
pub struct ColumnDef<R> {
    header: String,
    accessor: Accessor<R>,
}

impl<R> ColumnDef<R> {
    /// Create a column from a header text and an accessor
    pub fn new<S, F>(header: S, accessor: F) -> Self
    where
        S: Into<String>,
        F: Fn(&R) -> FieldValue + 'static,
    {
        Self {
            header: header.into(),
            accessor: Box::new(accessor),
        }
    }

    /// Display name written in the header row
    pub fn header(&self) -> &str {
        &self.header
    }

    /// Read this column's field from a record
    pub fn value(&self, record: &R) -> FieldValue {
        (self.accessor)(record)
    }
}

impl<R> fmt::Debug for ColumnDef<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDef")
            .field("header", &self.header)
            .finish_non_exhaustive()
    }
}

/// Ordered list of mapped columns
///
/// Column order here is column order in the sheet.
pub struct ColumnMapping<R> {
    columns: Vec<ColumnDef<R>>,
}

impl<R> ColumnMapping<R> {
    /// Create an empty mapping
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
        }
    }

    /// Append a column
    pub fn column<S, F>(mut self, header: S, accessor: F) -> Self
    where
        S: Into<String>,
        F: Fn(&R) -> FieldValue + 'static,
    {
        self.push(ColumnDef::new(header, accessor));
        self
    }

    pub fn push(&mut self, column: ColumnDef<R>) {
        self.columns.push(column);
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Iterate over the columns in sheet order
    pub fn iter(&self) -> impl Iterator<Item = &ColumnDef<R>> {
        self.columns.iter()
    }

    /// Header texts in sheet order
    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(ColumnDef::header)
    }
}

impl<R> Default for ColumnMapping<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> fmt::Debug for ColumnMapping<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.columns.iter()).finish()
    }
}

/// A record type with a known default column layout
///
/// Used when a sheet is built without explicit columns.
///
/// ```rust
/// use recordbook::{ColumnMapping, Record};
///
/// struct Person {
///     first_name: String,
///     last_name: String,
///     year_born: i32,
/// }
///
/// impl Record for Person {
///     fn columns() -> ColumnMapping<Self> {
///         ColumnMapping::new()
///             .column("Last Name", |p: &Person| p.last_name.as_str().into())
///             .column("Year of Birth", |p: &Person| p.year_born.into())
///     }
/// }
///
/// assert_eq!(Person::columns().len(), 2);
/// ```
pub trait Record: Sized {
    fn columns() -> ColumnMapping<Self>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Pair {
        left: i64,
        right: Option<String>,
    }

    #[test]
    fn test_mapping_order_and_values() {
        let mapping = ColumnMapping::new()
            .column("Right", |p: &Pair| p.right.clone().into())
            .column("Left", |p: &Pair| p.left.into());

        assert_eq!(mapping.headers().collect::<Vec<_>>(), vec!["Right", "Left"]);

        let record = Pair {
            left: 7,
            right: None,
        };
        let values: Vec<FieldValue> = mapping.iter().map(|c| c.value(&record)).collect();
        assert_eq!(values, vec![FieldValue::Null, FieldValue::Int(7)]);
    }

    #[test]
    fn test_empty_mapping() {
        let mapping: ColumnMapping<Pair> = ColumnMapping::default();
        assert!(mapping.is_empty());
        assert_eq!(format!("{:?}", mapping), "[]");
    }
}
