//! Cell value types

use crate::error::{Error, Result};
use crate::style::NumberFormat;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Largest integer magnitude a cell number holds exactly (2^53)
const MAX_EXACT_INTEGER: u64 = 1 << 53;

/// Represents the value stored in a cell
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// Empty cell (no value)
    #[default]
    Empty,

    /// Boolean value (TRUE/FALSE)
    Boolean(bool),

    /// Numeric value
    Number(f64),

    /// String value
    String(SharedString),

    /// Calendar date and time of day
    DateTime(NaiveDateTime),

    /// Time of day without a date
    Time(NaiveTime),
}

impl CellValue {
    /// Create a new string value
    pub fn string<S: AsRef<str>>(s: S) -> Self {
        CellValue::String(SharedString::new(s))
    }

    /// Check that the value can be stored in a workbook with the given epoch
    ///
    /// Numbers must be finite and dates must not precede the epoch.
    pub fn check(&self, date_1904: bool) -> Result<()> {
        match self {
            CellValue::Number(n) if !n.is_finite() => Err(Error::UnsupportedValueType(format!(
                "non-finite number {}",
                n
            ))),
            CellValue::DateTime(dt) if super::date::datetime_to_serial(*dt, date_1904).is_none() => {
                Err(Error::UnsupportedValueType(format!(
                    "date {} precedes the {} epoch",
                    dt,
                    if date_1904 { 1904 } else { 1900 }
                )))
            }
            _ => Ok(()),
        }
    }

    /// Create a date value at midnight
    pub fn date(date: NaiveDate) -> Self {
        CellValue::DateTime(date.and_time(NaiveTime::MIN))
    }

    /// Check if the cell is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Try to get the value as a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Try to get the value as a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get the value as a string
    pub fn as_string(&self) -> Option<&str> {
        match self {
            CellValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Try to get the value as a date-time
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            CellValue::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    /// Check whether the value is a calendar or clock value
    pub fn is_temporal(&self) -> bool {
        matches!(self, CellValue::DateTime(_) | CellValue::Time(_))
    }

    /// Display format implied by the value type
    ///
    /// Midnight date-times get the short date format, other date-times the
    /// date-and-time format, and times of day the 24-hour clock format.
    pub fn default_number_format(&self) -> NumberFormat {
        match self {
            CellValue::DateTime(dt) if dt.time() == NaiveTime::MIN => {
                NumberFormat::BuiltIn(NumberFormat::ID_DATE_SHORT)
            }
            CellValue::DateTime(_) => NumberFormat::BuiltIn(NumberFormat::ID_DATETIME),
            CellValue::Time(_) => NumberFormat::BuiltIn(NumberFormat::ID_TIME_24H_SEC),
            _ => NumberFormat::General,
        }
    }

    /// Get the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::Empty => "empty",
            CellValue::Boolean(_) => "boolean",
            CellValue::Number(_) => "number",
            CellValue::String(_) => "string",
            CellValue::DateTime(_) => "datetime",
            CellValue::Time(_) => "time",
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::String(s) => write!(f, "{}", s),
            CellValue::DateTime(dt) if dt.time() == NaiveTime::MIN => {
                write!(f, "{}", dt.date())
            }
            CellValue::DateTime(dt) => write!(f, "{}", dt),
            CellValue::Time(t) => write!(f, "{}", t),
        }
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::string(s)
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::string(s)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(d: NaiveDate) -> Self {
        CellValue::date(d)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(dt: NaiveDateTime) -> Self {
        CellValue::DateTime(dt)
    }
}

/// A dynamically typed field value, as returned by a column accessor
///
/// Every record field a column maps is funneled through this type before it
/// becomes a [`CellValue`]. The conversion is fallible: some values have no
/// cell representation and are rejected instead of being stringified.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldValue {
    /// Absent value; becomes an empty cell
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
    /// Raw bytes; never representable in a cell
    Bytes(Vec<u8>),
}

impl FieldValue {
    /// Get the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Bool(_) => "bool",
            FieldValue::Int(_) => "int",
            FieldValue::UInt(_) => "uint",
            FieldValue::Float(_) => "float",
            FieldValue::Text(_) => "text",
            FieldValue::Date(_) => "date",
            FieldValue::DateTime(_) => "datetime",
            FieldValue::Time(_) => "time",
            FieldValue::Bytes(_) => "bytes",
        }
    }
}

impl TryFrom<FieldValue> for CellValue {
    type Error = Error;

    fn try_from(value: FieldValue) -> Result<Self> {
        let cell = match value {
            FieldValue::Null => CellValue::Empty,
            FieldValue::Bool(b) => CellValue::Boolean(b),
            FieldValue::Int(n) if n.unsigned_abs() > MAX_EXACT_INTEGER => {
                return Err(Error::UnsupportedValueType(format!(
                    "integer {} is not exactly representable",
                    n
                )))
            }
            FieldValue::Int(n) => CellValue::Number(n as f64),
            FieldValue::UInt(n) if n > MAX_EXACT_INTEGER => {
                return Err(Error::UnsupportedValueType(format!(
                    "integer {} is not exactly representable",
                    n
                )))
            }
            FieldValue::UInt(n) => CellValue::Number(n as f64),
            FieldValue::Float(f) if !f.is_finite() => {
                return Err(Error::UnsupportedValueType(format!(
                    "non-finite number {}",
                    f
                )))
            }
            FieldValue::Float(f) => CellValue::Number(f),
            FieldValue::Text(s) => CellValue::string(s),
            FieldValue::Date(d) => checked_datetime(d.and_time(NaiveTime::MIN))?,
            FieldValue::DateTime(dt) => checked_datetime(dt)?,
            FieldValue::Time(t) => CellValue::Time(t),
            FieldValue::Bytes(b) => {
                return Err(Error::UnsupportedValueType(format!(
                    "binary value ({} bytes)",
                    b.len()
                )))
            }
        };
        Ok(cell)
    }
}

fn checked_datetime(dt: NaiveDateTime) -> Result<CellValue> {
    let cell = CellValue::DateTime(dt);
    cell.check(false)?;
    Ok(cell)
}

macro_rules! field_from {
    ($($ty:ty => $variant:ident),+ $(,)?) => {
        $(
            impl From<$ty> for FieldValue {
                fn from(v: $ty) -> Self {
                    FieldValue::$variant(v.into())
                }
            }
        )+
    };
}

field_from!(
    i8 => Int, i16 => Int, i32 => Int, i64 => Int,
    u8 => UInt, u16 => UInt, u32 => UInt, u64 => UInt,
    f32 => Float, f64 => Float,
    String => Text, &str => Text, &String => Text,
);

impl From<usize> for FieldValue {
    fn from(v: usize) -> Self {
        FieldValue::UInt(v as u64)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(v: NaiveDate) -> Self {
        FieldValue::Date(v)
    }
}

impl From<NaiveDateTime> for FieldValue {
    fn from(v: NaiveDateTime) -> Self {
        FieldValue::DateTime(v)
    }
}

impl From<NaiveTime> for FieldValue {
    fn from(v: NaiveTime) -> Self {
        FieldValue::Time(v)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(v: Vec<u8>) -> Self {
        FieldValue::Bytes(v)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(FieldValue::Null, Into::into)
    }
}

/// Reference-counted immutable string
///
/// Cells holding the same text share one allocation when built through the
/// same source string.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SharedString(Arc<str>);

impl SharedString {
    /// Create a new shared string
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        SharedString(Arc::from(s.as_ref()))
    }

    /// Get the string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the length of the string in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the string is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SharedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl fmt::Display for SharedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for SharedString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for SharedString {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SharedString {
    fn from(s: &str) -> Self {
        SharedString::new(s)
    }
}

impl From<String> for SharedString {
    fn from(s: String) -> Self {
        SharedString(Arc::from(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cell_value_conversions() {
        assert_eq!(CellValue::from(42), CellValue::Number(42.0));
        assert_eq!(CellValue::from(true), CellValue::Boolean(true));
        assert_eq!(CellValue::from("hello").as_string(), Some("hello"));
        assert_eq!(CellValue::Empty.to_string(), "");
    }

    #[test]
    fn test_field_value_from_scalars() {
        assert_eq!(FieldValue::from(1957), FieldValue::Int(1957));
        assert_eq!(FieldValue::from(7u8), FieldValue::UInt(7));
        assert_eq!(FieldValue::from("Field"), FieldValue::Text("Field".into()));
        assert_eq!(FieldValue::from(None::<i32>), FieldValue::Null);
        assert_eq!(FieldValue::from(Some(2.5)), FieldValue::Float(2.5));
    }

    #[test]
    fn test_try_from_field_value() {
        assert_eq!(
            CellValue::try_from(FieldValue::Int(1946)).unwrap(),
            CellValue::Number(1946.0)
        );
        assert_eq!(
            CellValue::try_from(FieldValue::Null).unwrap(),
            CellValue::Empty
        );

        let date = NaiveDate::from_ymd_opt(1957, 4, 29).unwrap();
        assert_eq!(
            CellValue::try_from(FieldValue::Date(date)).unwrap(),
            CellValue::date(date)
        );
    }

    #[test]
    fn test_unsupported_values_are_rejected() {
        for value in [
            FieldValue::Bytes(vec![1, 2, 3]),
            FieldValue::Float(f64::NAN),
            FieldValue::Float(f64::INFINITY),
            FieldValue::UInt(u64::MAX),
            FieldValue::Int(i64::MIN),
            FieldValue::Date(NaiveDate::from_ymd_opt(1899, 12, 30).unwrap()),
        ] {
            let err = CellValue::try_from(value).unwrap_err();
            assert!(matches!(err, Error::UnsupportedValueType(_)), "{err}");
        }
    }

    #[test]
    fn test_check_follows_epoch() {
        let early = CellValue::date(NaiveDate::from_ymd_opt(1902, 1, 1).unwrap());
        assert!(early.check(false).is_ok());
        let err = early.check(true).unwrap_err();
        assert!(matches!(err, Error::UnsupportedValueType(ref msg) if msg.contains("1904")));

        let epoch = CellValue::date(NaiveDate::from_ymd_opt(1904, 1, 1).unwrap());
        assert!(epoch.check(true).is_ok());

        assert!(CellValue::Number(f64::NAN).check(false).is_err());
        assert!(CellValue::Number(f64::NEG_INFINITY).check(true).is_err());
        assert!(CellValue::string("text").check(true).is_ok());
    }
}
