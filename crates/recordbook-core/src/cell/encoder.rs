//! Cell encoder: typed values to package primitives

use super::{date, CellValue, SharedStringTable};
use crate::error::{Error, Result};
use crate::style::NumberFormat;

/// Primitive cell representation stored in a worksheet part
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    /// Cell occupies its coordinate but carries no value
    Blank,
    Number(f64),
    Boolean(bool),
    /// Index into the shared string table
    SharedString(u32),
}

/// Result of encoding one cell value
#[derive(Debug, Clone, PartialEq)]
pub struct Encoded {
    pub primitive: Primitive,
    /// Display format inferred from the value type
    pub number_format: NumberFormat,
}

/// Encodes cell values against one workbook's shared string table
pub struct CellEncoder<'a> {
    strings: &'a mut SharedStringTable,
    date_1904: bool,
}

impl<'a> CellEncoder<'a> {
    /// Create an encoder writing strings into `strings`
    pub fn new(strings: &'a mut SharedStringTable, date_1904: bool) -> Self {
        Self { strings, date_1904 }
    }

    /// Encode a value into its primitive form and inferred number format
    pub fn encode(&mut self, value: &CellValue) -> Result<Encoded> {
        let primitive = match value {
            CellValue::Empty => Primitive::Blank,
            CellValue::Boolean(b) => Primitive::Boolean(*b),
            CellValue::Number(n) if !n.is_finite() => {
                return Err(Error::UnsupportedValueType(format!(
                    "non-finite number {}",
                    n
                )))
            }
            CellValue::Number(n) => Primitive::Number(*n),
            CellValue::String(s) => Primitive::SharedString(self.strings.intern(s.as_str())),
            CellValue::DateTime(dt) => {
                let serial = date::datetime_to_serial(*dt, self.date_1904).ok_or_else(|| {
                    Error::UnsupportedValueType(format!(
                        "date {} precedes the workbook epoch",
                        dt
                    ))
                })?;
                Primitive::Number(serial)
            }
            CellValue::Time(t) => Primitive::Number(date::time_to_serial(*t)),
        };

        Ok(Encoded {
            primitive,
            number_format: value.default_number_format(),
        })
    }

    /// The string table this encoder writes into
    pub fn strings(&self) -> &SharedStringTable {
        self.strings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    #[test]
    fn test_encode_scalars() {
        let mut strings = SharedStringTable::new();
        let mut encoder = CellEncoder::new(&mut strings, false);

        let encoded = encoder.encode(&CellValue::Number(1957.0)).unwrap();
        assert_eq!(encoded.primitive, Primitive::Number(1957.0));
        assert_eq!(encoded.number_format, NumberFormat::General);

        let encoded = encoder.encode(&CellValue::Boolean(true)).unwrap();
        assert_eq!(encoded.primitive, Primitive::Boolean(true));

        let encoded = encoder.encode(&CellValue::Empty).unwrap();
        assert_eq!(encoded.primitive, Primitive::Blank);
    }

    #[test]
    fn test_strings_share_entries() {
        let mut strings = SharedStringTable::new();
        let mut encoder = CellEncoder::new(&mut strings, false);

        let a = encoder.encode(&CellValue::string("Field")).unwrap();
        let b = encoder.encode(&CellValue::string("Spader")).unwrap();
        let c = encoder.encode(&CellValue::string("Field")).unwrap();

        assert_eq!(a.primitive, Primitive::SharedString(0));
        assert_eq!(b.primitive, Primitive::SharedString(1));
        assert_eq!(c.primitive, a.primitive);
        assert_eq!(encoder.strings().len(), 2);
    }

    #[test]
    fn test_encode_dates() {
        let mut strings = SharedStringTable::new();
        let mut encoder = CellEncoder::new(&mut strings, false);

        let date = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        let encoded = encoder.encode(&CellValue::date(date)).unwrap();
        assert_eq!(encoded.primitive, Primitive::Number(36526.0));
        assert_eq!(
            encoded.number_format,
            NumberFormat::BuiltIn(NumberFormat::ID_DATE_SHORT)
        );

        let dt = date.and_hms_opt(12, 0, 0).unwrap();
        let encoded = encoder.encode(&CellValue::DateTime(dt)).unwrap();
        assert_eq!(encoded.primitive, Primitive::Number(36526.5));
        assert_eq!(
            encoded.number_format,
            NumberFormat::BuiltIn(NumberFormat::ID_DATETIME)
        );

        let t = NaiveTime::from_hms_opt(6, 0, 0).unwrap();
        let encoded = encoder.encode(&CellValue::Time(t)).unwrap();
        assert_eq!(encoded.primitive, Primitive::Number(0.25));
        assert_eq!(
            encoded.number_format,
            NumberFormat::BuiltIn(NumberFormat::ID_TIME_24H_SEC)
        );
    }

    #[test]
    fn test_date_before_1904_epoch() {
        let mut strings = SharedStringTable::new();
        let mut encoder = CellEncoder::new(&mut strings, true);

        let date = NaiveDate::from_ymd_opt(1900, 6, 1).unwrap();
        let err = encoder.encode(&CellValue::date(date)).unwrap_err();
        assert!(matches!(err, Error::UnsupportedValueType(_)));
    }
}
