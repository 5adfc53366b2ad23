//! Worksheet part (xl/worksheets/sheetN.xml)

use recordbook_core::style::{NumberFormat, StyleTable};
use recordbook_core::{CellAddress, CellEncoder, CellValue, Primitive, Worksheet};

use crate::error::XlsxResult;

/// Width written for columns that carry a style but no custom width
const DEFAULT_COLUMN_WIDTH: f64 = 8.43;

/// Serialize one worksheet
///
/// Strings go into the encoder's shared pool. Date cells whose style leaves
/// the number format at General get a copy of that style carrying the
/// inferred date format, appended to `styles`; existing slots keep their
/// index.
pub(crate) fn write_worksheet_xml(
    sheet: &Worksheet,
    selected: bool,
    encoder: &mut CellEncoder<'_>,
    styles: &mut StyleTable,
) -> XlsxResult<String> {
    let mut content = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
    );

    let dimension = sheet
        .dimension()
        .map_or_else(|| "A1".to_string(), |d| d.to_a1_string());
    content.push_str(&format!("\n    <dimension ref=\"{}\"/>", dimension));

    content.push_str(&format!(
        "\n    <sheetViews>\n        <sheetView{} workbookViewId=\"0\"/>\n    </sheetViews>",
        if selected { " tabSelected=\"1\"" } else { "" }
    ));
    content.push_str("\n    <sheetFormatPr defaultRowHeight=\"15\"/>");

    write_cols(&mut content, sheet);

    content.push_str("\n    <sheetData>");
    for row in sheet.rows() {
        if row.is_empty() && row.height.is_none() {
            continue;
        }

        let mut row_attrs = format!(" r=\"{}\"", row.index + 1);
        if let Some((first, last)) = row.column_span() {
            row_attrs.push_str(&format!(" spans=\"{}:{}\"", first + 1, last + 1));
        }
        if let Some(height) = row.height {
            row_attrs.push_str(&format!(" ht=\"{}\" customHeight=\"1\"", height));
        }
        content.push_str(&format!("\n        <row{}>", row_attrs));

        for (col, cell) in row.cells() {
            let cell_ref = CellAddress::new(row.index, col).to_a1_string();
            let encoded = encoder.encode(&cell.value)?;

            let xf_id = resolve_xf(styles, cell.style, &cell.value, &encoded.number_format);
            let style_attr = if xf_id != 0 {
                format!(" s=\"{}\"", xf_id)
            } else {
                String::new()
            };

            match encoded.primitive {
                Primitive::Blank => {
                    content.push_str(&format!("\n            <c r=\"{}\"{}/>", cell_ref, style_attr));
                }
                Primitive::Number(n) => {
                    content.push_str(&format!(
                        "\n            <c r=\"{}\"{}><v>{}</v></c>",
                        cell_ref, style_attr, n
                    ));
                }
                Primitive::Boolean(b) => {
                    content.push_str(&format!(
                        "\n            <c r=\"{}\"{} t=\"b\"><v>{}</v></c>",
                        cell_ref,
                        style_attr,
                        if b { 1 } else { 0 }
                    ));
                }
                Primitive::SharedString(idx) => {
                    content.push_str(&format!(
                        "\n            <c r=\"{}\"{} t=\"s\"><v>{}</v></c>",
                        cell_ref, style_attr, idx
                    ));
                }
            }
        }

        content.push_str("\n        </row>");
    }
    content.push_str("\n    </sheetData>");

    let merged_regions = sheet.merged_regions();
    if !merged_regions.is_empty() {
        content.push_str(&format!(
            "\n    <mergeCells count=\"{}\">",
            merged_regions.len()
        ));
        for range in merged_regions {
            content.push_str(&format!("\n        <mergeCell ref=\"{}\"/>", range));
        }
        content.push_str("\n    </mergeCells>");
    }

    content.push_str(
        "\n    <pageMargins left=\"0.7\" right=\"0.7\" top=\"0.75\" bottom=\"0.75\" header=\"0.3\" footer=\"0.3\"/>",
    );
    content.push_str("\n</worksheet>");
    Ok(content)
}

fn write_cols(content: &mut String, sheet: &Worksheet) {
    let columns: Vec<_> = sheet.columns().filter(|c| c.has_custom_settings()).collect();
    if columns.is_empty() {
        return;
    }

    content.push_str("\n    <cols>");
    for column in columns {
        let mut attrs = format!(" min=\"{}\" max=\"{}\"", column.index + 1, column.index + 1);
        match column.width {
            Some(width) => attrs.push_str(&format!(" width=\"{}\" customWidth=\"1\"", width)),
            None => attrs.push_str(&format!(" width=\"{}\"", DEFAULT_COLUMN_WIDTH)),
        }
        if let Some(style) = column.style {
            attrs.push_str(&format!(" style=\"{}\"", style));
        }
        if column.hidden {
            attrs.push_str(" hidden=\"1\"");
        }
        content.push_str(&format!("\n        <col{}/>", attrs));
    }
    content.push_str("\n    </cols>");
}

/// Style index to write for a cell
fn resolve_xf(
    styles: &mut StyleTable,
    style_index: u32,
    value: &CellValue,
    inferred: &NumberFormat,
) -> u32 {
    if !value.is_temporal() || inferred.is_general() {
        return style_index;
    }
    match styles.get(style_index) {
        Some(style) if style.number_format.is_general() => {
            let mut dated = style.clone();
            dated.number_format = inferred.clone();
            styles.intern(dated)
        }
        _ => style_index,
    }
}
