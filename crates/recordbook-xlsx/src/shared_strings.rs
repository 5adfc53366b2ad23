//! Shared strings part (xl/sharedStrings.xml)

use std::io::{BufReader, Read};

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::XlsxResult;
use crate::xml::{decode_excel_escapes, encode_excel_escapes, escape_xml, needs_space_preserve};
use recordbook_core::{SharedString, SharedStringTable};

/// Serialize the workbook's string pool
pub(crate) fn write_shared_strings_xml(strings: &SharedStringTable) -> String {
    let mut xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{}" uniqueCount="{}">"#,
        strings.count(),
        strings.len()
    );

    for s in strings.iter() {
        let text = escape_xml(&encode_excel_escapes(s.as_str()));
        if needs_space_preserve(s.as_str()) {
            xml.push_str(&format!("<si><t xml:space=\"preserve\">{}</t></si>", text));
        } else {
            xml.push_str(&format!("<si><t>{}</t></si>", text));
        }
    }

    xml.push_str("</sst>");
    xml
}

/// Parse the string pool, keeping every entry at its original position
///
/// Rich text runs are concatenated; phonetic hints are skipped.
pub(crate) fn read_shared_strings_xml<R: Read>(reader: R) -> XlsxResult<SharedStringTable> {
    let mut xml_reader = Reader::from_reader(BufReader::new(reader));
    // Whitespace inside <t> is significant
    xml_reader.trim_text(false);

    let mut strings = SharedStringTable::new();
    let mut buf = Vec::new();
    let mut current = String::new();
    let mut in_si = false;
    let mut in_t = false;
    let mut in_phonetic = false;

    loop {
        match xml_reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"si" => {
                    in_si = true;
                    current.clear();
                }
                b"rPh" => in_phonetic = true,
                b"t" if in_si && !in_phonetic => in_t = true,
                _ => {}
            },
            Event::Empty(e) if e.name().as_ref() == b"si" => {
                strings.push(SharedString::new(""));
            }
            Event::End(e) => match e.name().as_ref() {
                b"si" => {
                    strings.push(SharedString::new(decode_excel_escapes(&current)));
                    current.clear();
                    in_si = false;
                }
                b"rPh" => in_phonetic = false,
                b"t" => in_t = false,
                _ => {}
            },
            Event::Text(e) if in_t => current.push_str(&e.unescape()?),
            Event::CData(e) if in_t => current.push_str(&String::from_utf8_lossy(&e)),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(strings)
}
