//! Styles part (xl/styles.xml) read/write helpers

use std::collections::HashMap;
use std::io::{BufReader, Read};

use log::{trace, warn};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::XlsxResult;
use crate::xml::escape_xml;
use recordbook_core::style::{
    Alignment, BorderEdge, BorderLineStyle, BorderSide, BorderStyle, Color, FillStyle, FontStyle,
    HorizontalAlignment, NumberFormat, PatternType, Style, StyleTable, Underline,
    VerticalAlignment,
};

// === Writing ===

#[derive(Debug, Clone, Copy)]
struct ResolvedXfIds {
    font_id: u32,
    fill_id: u32,
    border_id: u32,
    num_fmt_id: u32,
}

/// Component tables derived from a [`StyleTable`]
///
/// Fonts, fills, borders and custom number formats are deduplicated
/// separately; each style becomes one `cellXfs` entry at the same index it
/// has in the table.
#[derive(Debug)]
pub(crate) struct StylesPart<'a> {
    styles: &'a StyleTable,
    fonts: Vec<&'a FontStyle>,
    fills: Vec<FillStyle>,
    borders: Vec<&'a BorderStyle>,
    numfmts: Vec<(u32, &'a str)>,
    resolved: Vec<ResolvedXfIds>,
}

impl<'a> StylesPart<'a> {
    pub(crate) fn build(styles: &'a StyleTable) -> Self {
        let mut font_ids: HashMap<&FontStyle, u32> = HashMap::new();
        let mut fonts: Vec<&FontStyle> = Vec::new();

        // Excel requires the first two fills to be: none and gray125
        let mut fill_ids: HashMap<FillStyle, u32> = HashMap::new();
        let mut fills = vec![
            FillStyle::None,
            FillStyle::pattern(PatternType::Gray125, Color::Auto, Color::Auto),
        ];
        fill_ids.insert(FillStyle::None, 0);

        let mut border_ids: HashMap<&BorderStyle, u32> = HashMap::new();
        let mut borders: Vec<&BorderStyle> = Vec::new();

        let mut numfmt_ids: HashMap<&str, u32> = HashMap::new();
        let mut numfmts: Vec<(u32, &str)> = Vec::new();

        let mut resolved = Vec::with_capacity(styles.len());

        for (_, style) in styles.iter() {
            let font_id = *font_ids.entry(&style.font).or_insert_with(|| {
                fonts.push(&style.font);
                fonts.len() as u32 - 1
            });

            let fill_id = *fill_ids.entry(style.fill).or_insert_with(|| {
                fills.push(style.fill);
                fills.len() as u32 - 1
            });

            let border_id = *border_ids.entry(&style.border).or_insert_with(|| {
                borders.push(&style.border);
                borders.len() as u32 - 1
            });

            let num_fmt_id = match &style.number_format {
                NumberFormat::General => 0,
                NumberFormat::BuiltIn(id) => *id,
                NumberFormat::Custom(code) => *numfmt_ids.entry(code.as_str()).or_insert_with(|| {
                    let id = NumberFormat::FIRST_CUSTOM_ID + numfmts.len() as u32;
                    numfmts.push((id, code.as_str()));
                    id
                }),
            };

            resolved.push(ResolvedXfIds {
                font_id,
                fill_id,
                border_id,
                num_fmt_id,
            });
        }

        Self {
            styles,
            fonts,
            fills,
            borders,
            numfmts,
            resolved,
        }
    }

    #[cfg(test)]
    fn font_count(&self) -> usize {
        self.fonts.len()
    }

    pub(crate) fn to_xml(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        );

        if !self.numfmts.is_empty() {
            xml.push_str(&format!("\n  <numFmts count=\"{}\">", self.numfmts.len()));
            for (id, code) in &self.numfmts {
                xml.push_str(&format!(
                    "\n    <numFmt numFmtId=\"{}\" formatCode=\"{}\"/>",
                    id,
                    escape_xml(code)
                ));
            }
            xml.push_str("\n  </numFmts>");
        }

        xml.push_str(&format!("\n  <fonts count=\"{}\">", self.fonts.len()));
        for font in &self.fonts {
            xml.push_str("\n    ");
            xml.push_str(&write_font(font));
        }
        xml.push_str("\n  </fonts>");

        xml.push_str(&format!("\n  <fills count=\"{}\">", self.fills.len()));
        for fill in &self.fills {
            xml.push_str("\n    ");
            xml.push_str(&write_fill(fill));
        }
        xml.push_str("\n  </fills>");

        xml.push_str(&format!("\n  <borders count=\"{}\">", self.borders.len()));
        for border in &self.borders {
            xml.push_str("\n    ");
            xml.push_str(&write_border(border));
        }
        xml.push_str("\n  </borders>");

        xml.push_str(
            r#"
  <cellStyleXfs count="1">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0"/>
  </cellStyleXfs>"#,
        );

        xml.push_str(&format!("\n  <cellXfs count=\"{}\">", self.resolved.len()));
        for ((_, style), ids) in self.styles.iter().zip(&self.resolved) {
            xml.push_str("\n    ");
            xml.push_str(&write_xf(style, *ids));
        }
        xml.push_str("\n  </cellXfs>");

        xml.push_str(
            r#"
  <cellStyles count="1">
    <cellStyle name="Normal" xfId="0" builtinId="0"/>
  </cellStyles>
  <dxfs count="0"/>
  <tableStyles count="0" defaultTableStyle="TableStyleMedium9" defaultPivotStyle="PivotStyleLight16"/>
</styleSheet>"#,
        );
        xml
    }
}

fn color_attrs(color: &Color) -> String {
    match color {
        Color::Auto => " auto=\"1\"".to_string(),
        Color::Rgb { .. } | Color::Argb { .. } => {
            format!(" rgb=\"{}\"", color.to_argb_hex().unwrap_or_default())
        }
        Color::Indexed(i) => format!(" indexed=\"{}\"", i),
        Color::Theme { index, tint: 0 } => format!(" theme=\"{}\"", index),
        Color::Theme { index, tint } => {
            format!(" theme=\"{}\" tint=\"{}\"", index, (*tint as f64) / 100.0)
        }
    }
}

fn write_color(tag: &str, color: &Color) -> String {
    format!("<{tag}{}/>", color_attrs(color))
}

fn write_font(font: &FontStyle) -> String {
    let mut s = String::from("<font>");
    if font.bold {
        s.push_str("<b/>");
    }
    if font.italic {
        s.push_str("<i/>");
    }
    if font.strikethrough {
        s.push_str("<strike/>");
    }
    match font.underline {
        Underline::None => {}
        Underline::Single => s.push_str("<u/>"),
        other => s.push_str(&format!("<u val=\"{}\"/>", other.token())),
    }
    s.push_str(&format!("<sz val=\"{}\"/>", font.size));
    if !font.color.is_auto() {
        s.push_str(&write_color("color", &font.color));
    }
    s.push_str(&format!("<name val=\"{}\"/>", escape_xml(&font.name)));
    s.push_str("</font>");
    s
}

fn write_fill(fill: &FillStyle) -> String {
    match fill {
        FillStyle::None => "<fill><patternFill patternType=\"none\"/></fill>".to_string(),
        FillStyle::Solid { color } => format!(
            "<fill><patternFill patternType=\"solid\">{}<bgColor indexed=\"64\"/></patternFill></fill>",
            write_color("fgColor", color)
        ),
        FillStyle::Pattern {
            pattern,
            foreground,
            background,
        } => format!(
            "<fill><patternFill patternType=\"{}\">{}{}</patternFill></fill>",
            pattern.token(),
            write_color("fgColor", foreground),
            write_color("bgColor", background)
        ),
    }
}

fn write_border(border: &BorderStyle) -> String {
    let mut s = String::from("<border>");
    for &side in BorderSide::ALL {
        let tag = side.token();
        match border.edge(side) {
            Some(edge) if edge.style != BorderLineStyle::None => s.push_str(&format!(
                "<{tag} style=\"{}\">{}</{tag}>",
                edge.style.token(),
                write_color("color", &edge.color)
            )),
            _ => s.push_str(&format!("<{tag}/>")),
        }
    }
    s.push_str("<diagonal/></border>");
    s
}

/// `textRotation` stores downward angles as 91..=180
fn rotation_to_xml(degrees: i16) -> i16 {
    if degrees < 0 {
        90 - degrees
    } else {
        degrees
    }
}

fn rotation_from_xml(value: i16) -> i16 {
    if value > 90 {
        90 - value
    } else {
        value
    }
}

fn write_alignment(al: &Alignment) -> String {
    if al.is_default() {
        return String::new();
    }
    let default = Alignment::default();

    let mut s = String::from("<alignment");
    if al.horizontal != default.horizontal {
        s.push_str(&format!(" horizontal=\"{}\"", al.horizontal.token()));
    }
    if al.vertical != default.vertical {
        s.push_str(&format!(" vertical=\"{}\"", al.vertical.token()));
    }
    if al.wrap_text {
        s.push_str(" wrapText=\"1\"");
    }
    if al.shrink_to_fit {
        s.push_str(" shrinkToFit=\"1\"");
    }
    if al.indent != 0 {
        s.push_str(&format!(" indent=\"{}\"", al.indent));
    }
    if al.rotation != 0 {
        s.push_str(&format!(" textRotation=\"{}\"", rotation_to_xml(al.rotation)));
    }
    s.push_str("/>");
    s
}

fn write_xf(style: &Style, ids: ResolvedXfIds) -> String {
    let mut attrs = String::new();
    if ids.num_fmt_id != 0 {
        attrs.push_str(" applyNumberFormat=\"1\"");
    }
    if style.font.is_custom() {
        attrs.push_str(" applyFont=\"1\"");
    }
    if !style.fill.is_none() {
        attrs.push_str(" applyFill=\"1\"");
    }
    if !style.border.is_empty() {
        attrs.push_str(" applyBorder=\"1\"");
    }
    if !style.alignment.is_default() {
        attrs.push_str(" applyAlignment=\"1\"");
    }

    let mut s = format!(
        "<xf numFmtId=\"{}\" fontId=\"{}\" fillId=\"{}\" borderId=\"{}\" xfId=\"0\"{}",
        ids.num_fmt_id, ids.font_id, ids.fill_id, ids.border_id, attrs
    );

    let alignment_xml = write_alignment(&style.alignment);
    if alignment_xml.is_empty() {
        s.push_str("/>");
    } else {
        s.push('>');
        s.push_str(&alignment_xml);
        s.push_str("</xf>");
    }
    s
}

// === Reading ===

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Other,
    Fonts,
    Fills,
    Borders,
    CellXfs,
}

#[derive(Debug, Default)]
struct PendingFill {
    pattern: Option<PatternType>,
    fg: Color,
    bg: Color,
}

/// Incremental parser state for styles.xml
#[derive(Debug)]
struct StylesParser {
    section: Section,
    numfmts: HashMap<u32, String>,
    fonts: Vec<FontStyle>,
    fills: Vec<FillStyle>,
    borders: Vec<BorderStyle>,
    cell_xfs: Vec<Style>,

    current_font: Option<FontStyle>,
    current_fill: Option<PendingFill>,
    current_border: Option<BorderStyle>,
    current_edge: Option<BorderSide>,
    current_xf: Option<Style>,
}

fn attr_string(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == name)
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}

fn attr_parse<T: std::str::FromStr>(e: &BytesStart<'_>, name: &[u8]) -> Option<T> {
    attr_string(e, name).and_then(|v| v.parse().ok())
}

fn attr_flag(e: &BytesStart<'_>, name: &[u8]) -> bool {
    matches!(attr_string(e, name).as_deref(), Some("1") | Some("true"))
}

impl StylesParser {
    fn new() -> Self {
        Self {
            section: Section::Other,
            numfmts: HashMap::new(),
            fonts: Vec::new(),
            fills: Vec::new(),
            borders: Vec::new(),
            cell_xfs: Vec::new(),
            current_font: None,
            current_fill: None,
            current_border: None,
            current_edge: None,
            current_xf: None,
        }
    }

    fn start(&mut self, e: &BytesStart<'_>) {
        match e.name().as_ref() {
            b"fonts" => self.section = Section::Fonts,
            b"fills" => self.section = Section::Fills,
            b"borders" => self.section = Section::Borders,
            b"cellXfs" => self.section = Section::CellXfs,
            b"cellStyleXfs" | b"dxfs" | b"cellStyles" | b"colors" => {
                self.section = Section::Other
            }

            b"numFmt" => {
                if let (Some(id), Some(code)) = (
                    attr_parse::<u32>(e, b"numFmtId"),
                    attr_string(e, b"formatCode"),
                ) {
                    self.numfmts.insert(id, code);
                }
            }

            b"font" if self.section == Section::Fonts => {
                self.current_font = Some(FontStyle::default());
            }
            b"b" | b"i" | b"strike" | b"u" | b"sz" | b"name" => {
                if let Some(font) = self.current_font.as_mut() {
                    apply_font_child(font, e);
                }
            }

            b"fill" if self.section == Section::Fills => {
                self.current_fill = Some(PendingFill::default());
            }
            b"patternFill" => {
                if let Some(fill) = self.current_fill.as_mut() {
                    fill.pattern = attr_string(e, b"patternType")
                        .as_deref()
                        .and_then(PatternType::from_token);
                }
            }
            b"fgColor" => {
                if let Some(fill) = self.current_fill.as_mut() {
                    fill.fg = parse_color_attrs(e);
                }
            }
            b"bgColor" => {
                if let Some(fill) = self.current_fill.as_mut() {
                    fill.bg = parse_color_attrs(e);
                }
            }

            b"border" if self.section == Section::Borders => {
                self.current_border = Some(BorderStyle::default());
            }
            b"left" | b"right" | b"top" | b"bottom" => {
                let side = std::str::from_utf8(e.name().as_ref())
                    .ok()
                    .and_then(BorderSide::from_token);
                if let (Some(border), Some(side)) = (self.current_border.as_mut(), side) {
                    let style = attr_string(e, b"style")
                        .as_deref()
                        .and_then(BorderLineStyle::from_token)
                        .filter(|style| *style != BorderLineStyle::None);
                    if let Some(style) = style {
                        // a nested <color> fills in the color
                        *border.edge_mut(side) = Some(BorderEdge::new(style, Color::Auto));
                        self.current_edge = Some(side);
                    }
                }
            }

            b"color" => {
                let color = parse_color_attrs(e);
                if let Some(font) = self.current_font.as_mut() {
                    font.color = color;
                } else if let (Some(border), Some(side)) =
                    (self.current_border.as_mut(), self.current_edge)
                {
                    if let Some(edge) = border.edge_mut(side).as_mut() {
                        edge.color = color;
                    }
                }
            }

            b"xf" if self.section == Section::CellXfs => {
                let num_fmt_id = attr_parse::<u32>(e, b"numFmtId").unwrap_or(0);
                let font_id = attr_parse::<usize>(e, b"fontId").unwrap_or(0);
                let fill_id = attr_parse::<usize>(e, b"fillId").unwrap_or(0);
                let border_id = attr_parse::<usize>(e, b"borderId").unwrap_or(0);

                let mut style = Style::default();
                style.font = self.fonts.get(font_id).cloned().unwrap_or_else(|| {
                    warn!("cellXfs entry refers to missing font {}", font_id);
                    FontStyle::default()
                });
                style.fill = self.fills.get(fill_id).copied().unwrap_or_default();
                style.border = self.borders.get(border_id).cloned().unwrap_or_default();
                style.number_format = NumberFormat::from_id(
                    num_fmt_id,
                    self.numfmts.get(&num_fmt_id).map(String::as_str),
                );
                self.current_xf = Some(style);
            }
            b"alignment" => {
                if let Some(style) = self.current_xf.as_mut() {
                    apply_alignment_attrs(&mut style.alignment, e);
                }
            }

            _ => {}
        }
    }

    fn end(&mut self, name: &[u8]) {
        match name {
            b"fonts" | b"fills" | b"borders" | b"cellXfs" => self.section = Section::Other,
            b"font" => {
                if let Some(font) = self.current_font.take() {
                    self.fonts.push(font);
                }
            }
            b"fill" => {
                if let Some(fill) = self.current_fill.take() {
                    let pattern = fill.pattern.unwrap_or_default();
                    self.fills.push(FillStyle::pattern(pattern, fill.fg, fill.bg));
                }
            }
            b"border" => {
                if let Some(border) = self.current_border.take() {
                    self.borders.push(border);
                }
                self.current_edge = None;
            }
            b"left" | b"right" | b"top" | b"bottom" => self.current_edge = None,
            b"xf" => {
                if let Some(style) = self.current_xf.take() {
                    self.cell_xfs.push(style);
                }
            }
            _ => {}
        }
    }

    fn into_table(self) -> StyleTable {
        trace!(
            "styles part: {} fonts, {} fills, {} borders, {} cellXfs",
            self.fonts.len(),
            self.fills.len(),
            self.borders.len(),
            self.cell_xfs.len()
        );

        let mut table = StyleTable::new();
        let mut xfs = self.cell_xfs.into_iter();
        if let Some(first) = xfs.next() {
            if first != Style::default() {
                warn!("first cellXfs entry is not the default style; it is read as default");
            }
        }
        for style in xfs {
            table.push_raw(style);
        }
        table
    }
}

fn apply_font_child(font: &mut FontStyle, e: &BytesStart<'_>) {
    // Boolean toggles may carry val="0"
    let enabled = attr_string(e, b"val").map_or(true, |v| v != "0" && v != "false");
    match e.name().as_ref() {
        b"b" => font.bold = enabled,
        b"i" => font.italic = enabled,
        b"strike" => font.strikethrough = enabled,
        b"u" => {
            font.underline = attr_string(e, b"val")
                .as_deref()
                .and_then(Underline::from_token)
                .unwrap_or(Underline::Single)
        }
        b"sz" => {
            if let Some(size) = attr_parse::<f64>(e, b"val") {
                font.size = FontStyle::clamp_size(size);
            }
        }
        b"name" => {
            if let Some(name) = attr_string(e, b"val") {
                font.name = name;
            }
        }
        _ => {}
    }
}

fn apply_alignment_attrs(align: &mut Alignment, e: &BytesStart<'_>) {
    if let Some(h) = attr_string(e, b"horizontal")
        .as_deref()
        .and_then(HorizontalAlignment::from_token)
    {
        align.horizontal = h;
    }
    if let Some(v) = attr_string(e, b"vertical")
        .as_deref()
        .and_then(VerticalAlignment::from_token)
    {
        align.vertical = v;
    }
    align.wrap_text = attr_flag(e, b"wrapText");
    align.shrink_to_fit = attr_flag(e, b"shrinkToFit");
    align.indent = attr_parse::<u8>(e, b"indent").unwrap_or(0);
    align.rotation = attr_parse::<i16>(e, b"textRotation")
        .map(rotation_from_xml)
        .unwrap_or(0);
}

/// Parse xl/styles.xml into a style table indexed like `cellXfs`
pub(crate) fn read_styles_xml<R: Read>(reader: R) -> XlsxResult<StyleTable> {
    let mut xml_reader = Reader::from_reader(BufReader::new(reader));
    xml_reader.trim_text(true);

    let mut parser = StylesParser::new();
    let mut buf = Vec::new();

    loop {
        match xml_reader.read_event_into(&mut buf)? {
            Event::Start(e) => parser.start(&e),
            Event::Empty(e) => {
                parser.start(&e);
                parser.end(e.name().as_ref());
            }
            Event::End(e) => parser.end(e.name().as_ref()),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(parser.into_table())
}

fn parse_color_attrs(e: &BytesStart<'_>) -> Color {
    // Priority: rgb > theme > indexed > auto
    if let Some(color) = attr_string(e, b"rgb").and_then(|hex| Color::from_hex(&hex)) {
        return match color {
            Color::Argb { a: 0xFF, r, g, b } => Color::Rgb { r, g, b },
            other => other,
        };
    }

    if let Some(index) = attr_parse::<u8>(e, b"theme") {
        let tint = attr_parse::<f64>(e, b"tint")
            .map(|t| (t * 100.0).round() as i8)
            .unwrap_or(0);
        return Color::Theme { index, tint };
    }

    if let Some(i) = attr_parse::<u8>(e, b"indexed") {
        return Color::Indexed(i);
    }

    Color::Auto
}
