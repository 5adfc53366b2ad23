//! Worksheet part parsing

use std::io::{BufReader, Read};

use chrono::{DateTime, NaiveDateTime};
use log::{trace, warn};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use crate::xml::decode_excel_escapes;
use recordbook_core::cell::date::{serial_to_datetime, serial_to_time};
use recordbook_core::{
    CellAddress, CellRange, CellValue, Column, SharedStringTable, StyleTable, Worksheet, MAX_COLS,
};

/// Everything a sheet needs from the rest of the package
pub(crate) struct SheetContext<'a> {
    pub strings: &'a SharedStringTable,
    pub styles: &'a StyleTable,
    pub date_1904: bool,
}

/// Attributes and text collected for the `<c>` element being read
#[derive(Default)]
struct PendingCell {
    reference: Option<String>,
    cell_type: Option<String>,
    style: u32,
    value: Option<String>,
    inline: Option<String>,
}

fn attr_value(e: &BytesStart<'_>, name: &[u8]) -> XlsxResult<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| XlsxError::corrupt(format!("bad attribute: {}", err)))?;
        if attr.key.as_ref() == name {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn is_true(value: Option<&str>) -> bool {
    matches!(value, Some("1") | Some("true"))
}

/// Parse one worksheet part into `sheet`
pub(crate) fn read_worksheet_xml<R: Read>(
    reader: R,
    sheet: &mut Worksheet,
    ctx: &SheetContext<'_>,
) -> XlsxResult<()> {
    let mut xml_reader = Reader::from_reader(BufReader::new(reader));
    xml_reader.trim_text(false);

    let mut buf = Vec::new();
    let mut cell: Option<PendingCell> = None;
    let mut in_value = false;
    let mut in_inline_text = false;
    let mut in_phonetic = false;

    // Position used for rows and cells that omit their `r` attribute
    let mut row_index: u32 = 0;
    let mut next_row: u32 = 0;
    let mut next_col: u16 = 0;

    loop {
        let event = xml_reader.read_event_into(&mut buf)?;
        let is_empty = matches!(event, Event::Empty(_));
        match event {
            Event::Start(e) | Event::Empty(e) => match e.name().as_ref() {
                b"row" => {
                    row_index = match attr_value(&e, b"r")? {
                        Some(r) => r
                            .parse::<u32>()
                            .ok()
                            .and_then(|r| r.checked_sub(1))
                            .ok_or_else(|| XlsxError::corrupt(format!("bad row number '{}'", r)))?,
                        None => next_row,
                    };
                    next_row = row_index + 1;
                    next_col = 0;

                    let height = attr_value(&e, b"ht")?.and_then(|h| h.parse::<f64>().ok());
                    let custom = is_true(attr_value(&e, b"customHeight")?.as_deref());
                    if let (Some(height), true) = (height, custom) {
                        sheet.ensure_row(row_index)?.height = Some(height);
                    }
                }
                b"c" => {
                    let style = match attr_value(&e, b"s")? {
                        Some(s) => s
                            .parse::<u32>()
                            .map_err(|_| XlsxError::corrupt(format!("bad style index '{}'", s)))?,
                        None => 0,
                    };
                    let pending = PendingCell {
                        reference: attr_value(&e, b"r")?,
                        cell_type: attr_value(&e, b"t")?,
                        style,
                        ..PendingCell::default()
                    };
                    if is_empty {
                        finish_cell(sheet, pending, ctx, row_index, &mut next_col)?;
                    } else {
                        cell = Some(pending);
                    }
                }
                b"v" if cell.is_some() && !is_empty => in_value = true,
                b"rPh" if !is_empty => in_phonetic = true,
                b"t" if !is_empty && !in_phonetic => {
                    if let Some(pending) = cell.as_mut() {
                        in_inline_text = true;
                        pending.inline.get_or_insert_with(String::new);
                    }
                }
                b"col" => read_col(&e, sheet, ctx)?,
                b"mergeCell" => {
                    if let Some(reference) = attr_value(&e, b"ref")? {
                        sheet.merge_cells(CellRange::parse(&reference)?)?;
                    }
                }
                _ => {}
            },
            Event::Text(t) => {
                if let Some(pending) = cell.as_mut() {
                    if in_value {
                        pending
                            .value
                            .get_or_insert_with(String::new)
                            .push_str(&t.unescape()?);
                    } else if in_inline_text {
                        pending
                            .inline
                            .get_or_insert_with(String::new)
                            .push_str(&t.unescape()?);
                    }
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"v" => in_value = false,
                b"t" => in_inline_text = false,
                b"rPh" => in_phonetic = false,
                b"c" => {
                    if let Some(pending) = cell.take() {
                        finish_cell(sheet, pending, ctx, row_index, &mut next_col)?;
                    }
                    in_value = false;
                    in_inline_text = false;
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    trace!(
        "read sheet '{}': {} cells, {} merged regions",
        sheet.name(),
        sheet.cell_count(),
        sheet.merged_regions().len()
    );
    Ok(())
}

fn read_col(e: &BytesStart<'_>, sheet: &mut Worksheet, ctx: &SheetContext<'_>) -> XlsxResult<()> {
    let parse_index = |v: Option<String>| -> Option<u16> {
        v.and_then(|v| v.parse::<u16>().ok())
            .and_then(|v| v.checked_sub(1))
    };
    let (Some(min), Some(max)) = (
        parse_index(attr_value(e, b"min")?),
        parse_index(attr_value(e, b"max")?),
    ) else {
        warn!("ignoring <col> without a valid min/max");
        return Ok(());
    };

    let width = if is_true(attr_value(e, b"customWidth")?.as_deref()) {
        attr_value(e, b"width")?.and_then(|w| w.parse::<f64>().ok())
    } else {
        None
    };
    let hidden = is_true(attr_value(e, b"hidden")?.as_deref());
    let style = match attr_value(e, b"style")?.and_then(|s| s.parse::<u32>().ok()) {
        Some(s) if ctx.styles.get(s).is_some() => Some(s),
        Some(s) => {
            warn!("column style {} is not in the style table", s);
            None
        }
        None => None,
    };

    for index in min..=max.min(MAX_COLS - 1) {
        let mut column = Column::new(index);
        column.width = width;
        column.hidden = hidden;
        column.style = style;
        if column.has_custom_settings() {
            sheet.set_column(column);
        }
    }
    Ok(())
}

fn finish_cell(
    sheet: &mut Worksheet,
    pending: PendingCell,
    ctx: &SheetContext<'_>,
    row_index: u32,
    next_col: &mut u16,
) -> XlsxResult<()> {
    let (row, col) = match pending.reference.as_deref() {
        Some(reference) => {
            let addr = CellAddress::parse(reference)?;
            (addr.row, addr.col)
        }
        None => (row_index, *next_col),
    };
    *next_col = col.saturating_add(1);

    let style = if ctx.styles.get(pending.style).is_some() {
        pending.style
    } else {
        warn!(
            "cell {} refers to missing style {}",
            CellAddress::new(row, col).to_a1_string(),
            pending.style
        );
        0
    };

    let value = cell_value(&pending, style, ctx)?;
    sheet.set_cell(row, col, value, style)?;
    Ok(())
}

fn cell_value(pending: &PendingCell, style: u32, ctx: &SheetContext<'_>) -> XlsxResult<CellValue> {
    let raw = pending.value.as_deref();
    let value = match (pending.cell_type.as_deref(), raw) {
        (Some("inlineStr"), _) => match &pending.inline {
            Some(text) => CellValue::string(decode_excel_escapes(text)),
            None => CellValue::Empty,
        },
        (_, None) => CellValue::Empty,
        (Some("s"), Some(v)) => {
            let index: u32 = v
                .trim()
                .parse()
                .map_err(|_| XlsxError::corrupt(format!("bad shared string index '{}'", v)))?;
            let s = ctx.strings.get(index).ok_or_else(|| {
                XlsxError::corrupt(format!("shared string index {} out of range", index))
            })?;
            CellValue::String(s.clone())
        }
        (Some("b"), Some(v)) => CellValue::Boolean(matches!(v.trim(), "1" | "true")),
        (Some("str"), Some(v)) => CellValue::string(decode_excel_escapes(v)),
        (Some("d"), Some(v)) => match parse_iso_datetime(v.trim()) {
            Some(dt) => CellValue::DateTime(dt),
            None => {
                warn!("unparseable ISO date cell '{}'", v);
                CellValue::string(v)
            }
        },
        (Some("e"), Some(v)) => {
            warn!("error cell {} read as text", v);
            CellValue::string(v)
        }
        (None, Some(v)) | (Some("n"), Some(v)) => {
            let n = v
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .ok_or_else(|| XlsxError::corrupt(format!("bad numeric cell value '{}'", v)))?;
            number_value(n, style, ctx)
        }
        (Some(other), Some(v)) => {
            warn!("unknown cell type '{}', reading value as text", other);
            CellValue::string(v)
        }
    };
    Ok(value)
}

/// Numbers whose style carries a date format come back as dates or times
fn number_value(n: f64, style: u32, ctx: &SheetContext<'_>) -> CellValue {
    let format = match ctx.styles.get(style) {
        Some(style) if style.number_format.is_date_format() => &style.number_format,
        _ => return CellValue::Number(n),
    };

    if format.is_time_only() && (0.0..1.0).contains(&n) {
        if let Some(time) = serial_to_time(n) {
            return CellValue::Time(time);
        }
    }
    serial_to_datetime(n, ctx.date_1904).map_or(CellValue::Number(n), CellValue::DateTime)
}

fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use recordbook_core::{NumberFormat, Style};

    fn read(xml: &str, strings: &SharedStringTable, styles: &StyleTable) -> Worksheet {
        let mut sheet = Worksheet::new("Sheet1");
        let ctx = SheetContext {
            strings,
            styles,
            date_1904: false,
        };
        read_worksheet_xml(xml.as_bytes(), &mut sheet, &ctx).unwrap();
        sheet
    }

    #[test]
    fn test_cell_types() {
        let mut strings = SharedStringTable::new();
        strings.intern("shared");
        let styles = StyleTable::new();

        let sheet = read(
            r#"<worksheet><sheetData>
<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="b"><v>1</v></c><c r="C1"><v>2.5</v></c></row>
<row r="2"><c r="A2" t="inlineStr"><is><t>in_x000D_line</t></is></c><c r="B2" t="str"><v>formula text</v></c><c r="C2"/></row>
</sheetData></worksheet>"#,
            &strings,
            &styles,
        );

        assert_eq!(sheet.get_value("A1").unwrap(), CellValue::string("shared"));
        assert_eq!(sheet.get_value("B1").unwrap(), CellValue::Boolean(true));
        assert_eq!(sheet.get_value("C1").unwrap(), CellValue::Number(2.5));
        assert_eq!(sheet.get_value("A2").unwrap(), CellValue::string("in\rline"));
        assert_eq!(sheet.get_value("B2").unwrap(), CellValue::string("formula text"));
        assert!(sheet.cell_at(1, 2).is_some());
        assert_eq!(sheet.dimension().unwrap().to_a1_string(), "A1:C2");
    }

    #[test]
    fn test_dates_from_number_format() {
        let strings = SharedStringTable::new();
        let mut styles = StyleTable::new();
        let date = styles.intern(Style::new().number_format(NumberFormat::BuiltIn(14)));
        let time = styles.intern(Style::new().number_format(NumberFormat::BuiltIn(21)));

        let xml = format!(
            r#"<worksheet><sheetData><row r="1"><c r="A1" s="{}"><v>36526</v></c><c r="B1" s="{}"><v>0.5</v></c><c r="C1"><v>36526</v></c></row></sheetData></worksheet>"#,
            date, time
        );
        let sheet = read(&xml, &strings, &styles);

        let expected = NaiveDate::from_ymd_opt(2000, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(sheet.get_value("A1").unwrap(), CellValue::DateTime(expected));
        assert_eq!(
            sheet.get_value("B1").unwrap(),
            CellValue::Time(chrono::NaiveTime::from_hms_opt(12, 0, 0).unwrap())
        );
        assert_eq!(sheet.get_value("C1").unwrap(), CellValue::Number(36526.0));
    }

    #[test]
    fn test_merges_cols_and_heights() {
        let strings = SharedStringTable::new();
        let styles = StyleTable::new();
        let sheet = read(
            r#"<worksheet>
<cols><col min="1" max="2" width="20" customWidth="1"/><col min="3" max="3" width="8.43"/></cols>
<sheetData><row r="1" ht="30" customHeight="1"><c r="A1"><v>1</v></c></row><row r="4" ht="18" customHeight="1"/></sheetData>
<mergeCells count="1"><mergeCell ref="A1:C1"/></mergeCells>
</worksheet>"#,
            &strings,
            &styles,
        );

        assert_eq!(sheet.column(0).and_then(|c| c.width), Some(20.0));
        assert_eq!(sheet.column(1).and_then(|c| c.width), Some(20.0));
        assert!(sheet.column(2).is_none());
        assert_eq!(sheet.row(0).and_then(|r| r.height), Some(30.0));
        assert_eq!(sheet.row(3).and_then(|r| r.height), Some(18.0));
        assert_eq!(sheet.merged_regions()[0].to_a1_string(), "A1:C1");
    }

    #[test]
    fn test_missing_style_falls_back_to_default() {
        let strings = SharedStringTable::new();
        let styles = StyleTable::new();
        let sheet = read(
            r#"<worksheet><sheetData><row><c s="9"><v>3</v></c><c><v>4</v></c></row></sheetData></worksheet>"#,
            &strings,
            &styles,
        );
        assert_eq!(sheet.cell_at(0, 0).map(|c| c.style), Some(0));
        assert_eq!(sheet.get_value("B1").unwrap(), CellValue::Number(4.0));
    }

    #[test]
    fn test_bad_shared_string_index() {
        let strings = SharedStringTable::new();
        let styles = StyleTable::new();
        let mut sheet = Worksheet::new("Sheet1");
        let ctx = SheetContext {
            strings: &strings,
            styles: &styles,
            date_1904: false,
        };
        let xml = r#"<worksheet><sheetData><row r="1"><c r="A1" t="s"><v>7</v></c></row></sheetData></worksheet>"#;
        let err = read_worksheet_xml(xml.as_bytes(), &mut sheet, &ctx).unwrap_err();
        assert!(matches!(err, XlsxError::CorruptPackage(_)));
    }

    #[test]
    fn test_non_finite_numbers_are_corrupt() {
        let strings = SharedStringTable::new();
        let styles = StyleTable::new();
        let ctx = SheetContext {
            strings: &strings,
            styles: &styles,
            date_1904: false,
        };
        for raw in ["NaN", "inf", "-infinity"] {
            let mut sheet = Worksheet::new("Sheet1");
            let xml = format!(
                r#"<worksheet><sheetData><row r="1"><c r="A1"><v>{}</v></c></row></sheetData></worksheet>"#,
                raw
            );
            let err = read_worksheet_xml(xml.as_bytes(), &mut sheet, &ctx).unwrap_err();
            assert!(matches!(err, XlsxError::CorruptPackage(_)), "{}", raw);
        }
    }
}
