//! Writes a header row plus value rows as a single-sheet `.xlsx` package.
//!
//! Strings are written inline so no shared string table is needed. Dates
//! use built-in format 14, timestamps format 22.

use crate::error::ReadingLogError;
use crate::helpers::zip::write_entry;
use crate::spreadsheet::cell::datetime_to_serial;
use crate::spreadsheet::cell::is_date_only;
use crate::spreadsheet::reference::index_to_reference;
use crate::spreadsheet::Value;
use quick_xml::events::BytesDecl;
use quick_xml::events::BytesEnd;
use quick_xml::events::BytesStart;
use quick_xml::events::BytesText;
use quick_xml::events::Event;
use quick_xml::Writer;
use std::fs::File;
use std::io::BufWriter;
use std::io::Seek;
use std::io::Write;
use std::path::Path;
use zip::ZipWriter;

const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_RELATIONSHIPS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_PACKAGE_RELATIONSHIPS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

const TYPE_OFFICE_DOCUMENT: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const TYPE_WORKSHEET: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
const TYPE_STYLES: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";

const CONTENT_WORKBOOK: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
const CONTENT_WORKSHEET: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";
const CONTENT_STYLES: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml";

/// Style index of date cells in the generated `cellXfs` table.
const STYLE_DATE: &str = "1";
/// Style index of timestamp cells in the generated `cellXfs` table.
const STYLE_DATETIME: &str = "2";

/// Sheet names are limited to 31 characters and may not contain `[]:*?/\`.
fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if "[]:*?/\\".contains(c) { '_' } else { c })
        .take(31)
        .collect();
    if cleaned.trim().is_empty() {
        "Sheet1".to_owned()
    } else {
        cleaned
    }
}

/// Thin wrapper over the quick-xml writer for one package part.
struct PartWriter {
    writer: Writer<Vec<u8>>,
}

impl PartWriter {
    fn new() -> Result<Self, ReadingLogError> {
        let mut writer = Writer::new(Vec::new());
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
        Ok(PartWriter { writer })
    }

    fn start(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<(), ReadingLogError> {
        let element = BytesStart::new(name).with_attributes(attributes.iter().copied());
        self.writer.write_event(Event::Start(element))?;
        Ok(())
    }

    fn empty(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<(), ReadingLogError> {
        let element = BytesStart::new(name).with_attributes(attributes.iter().copied());
        self.writer.write_event(Event::Empty(element))?;
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<(), ReadingLogError> {
        self.writer.write_event(Event::Text(BytesText::new(text)))?;
        Ok(())
    }

    fn end(&mut self, name: &str) -> Result<(), ReadingLogError> {
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    fn element(&mut self, name: &str, attributes: &[(&str, &str)], text: &str) -> Result<(), ReadingLogError> {
        self.start(name, attributes)?;
        self.text(text)?;
        self.end(name)
    }

    fn finish(self) -> Vec<u8> {
        self.writer.into_inner()
    }
}

fn content_types() -> Result<Vec<u8>, ReadingLogError> {
    let mut part = PartWriter::new()?;
    part.start("Types", &[("xmlns", NS_CONTENT_TYPES)])?;
    part.empty("Default", &[("Extension", "rels"), ("ContentType", "application/vnd.openxmlformats-package.relationships+xml")])?;
    part.empty("Default", &[("Extension", "xml"), ("ContentType", "application/xml")])?;
    part.empty("Override", &[("PartName", "/xl/workbook.xml"), ("ContentType", CONTENT_WORKBOOK)])?;
    part.empty("Override", &[("PartName", "/xl/worksheets/sheet1.xml"), ("ContentType", CONTENT_WORKSHEET)])?;
    part.empty("Override", &[("PartName", "/xl/styles.xml"), ("ContentType", CONTENT_STYLES)])?;
    part.end("Types")?;
    Ok(part.finish())
}

fn root_relationships() -> Result<Vec<u8>, ReadingLogError> {
    let mut part = PartWriter::new()?;
    part.start("Relationships", &[("xmlns", NS_PACKAGE_RELATIONSHIPS)])?;
    part.empty("Relationship", &[("Id", "rId1"), ("Type", TYPE_OFFICE_DOCUMENT), ("Target", "xl/workbook.xml")])?;
    part.end("Relationships")?;
    Ok(part.finish())
}

fn workbook(sheet_name: &str) -> Result<Vec<u8>, ReadingLogError> {
    let mut part = PartWriter::new()?;
    part.start("workbook", &[("xmlns", NS_MAIN), ("xmlns:r", NS_RELATIONSHIPS)])?;
    part.start("sheets", &[])?;
    part.empty("sheet", &[("name", sheet_name), ("sheetId", "1"), ("r:id", "rId1")])?;
    part.end("sheets")?;
    part.end("workbook")?;
    Ok(part.finish())
}

fn workbook_relationships() -> Result<Vec<u8>, ReadingLogError> {
    let mut part = PartWriter::new()?;
    part.start("Relationships", &[("xmlns", NS_PACKAGE_RELATIONSHIPS)])?;
    part.empty("Relationship", &[("Id", "rId1"), ("Type", TYPE_WORKSHEET), ("Target", "worksheets/sheet1.xml")])?;
    part.empty("Relationship", &[("Id", "rId2"), ("Type", TYPE_STYLES), ("Target", "styles.xml")])?;
    part.end("Relationships")?;
    Ok(part.finish())
}

fn styles() -> Result<Vec<u8>, ReadingLogError> {
    let mut part = PartWriter::new()?;
    part.start("styleSheet", &[("xmlns", NS_MAIN)])?;
    part.start("fonts", &[("count", "1")])?;
    part.start("font", &[])?;
    part.empty("sz", &[("val", "11")])?;
    part.empty("name", &[("val", "Calibri")])?;
    part.end("font")?;
    part.end("fonts")?;
    part.start("fills", &[("count", "2")])?;
    for pattern in ["none", "gray125"] {
        part.start("fill", &[])?;
        part.empty("patternFill", &[("patternType", pattern)])?;
        part.end("fill")?;
    }
    part.end("fills")?;
    part.start("borders", &[("count", "1")])?;
    part.empty("border", &[])?;
    part.end("borders")?;
    part.start("cellStyleXfs", &[("count", "1")])?;
    part.empty("xf", &[("numFmtId", "0"), ("fontId", "0"), ("fillId", "0"), ("borderId", "0")])?;
    part.end("cellStyleXfs")?;
    part.start("cellXfs", &[("count", "3")])?;
    part.empty("xf", &[("numFmtId", "0"), ("fontId", "0"), ("fillId", "0"), ("borderId", "0"), ("xfId", "0")])?;
    part.empty("xf", &[("numFmtId", "14"), ("fontId", "0"), ("fillId", "0"), ("borderId", "0"), ("xfId", "0"), ("applyNumberFormat", "1")])?;
    part.empty("xf", &[("numFmtId", "22"), ("fontId", "0"), ("fillId", "0"), ("borderId", "0"), ("xfId", "0"), ("applyNumberFormat", "1")])?;
    part.end("cellXfs")?;
    part.start("cellStyles", &[("count", "1")])?;
    part.empty("cellStyle", &[("name", "Normal"), ("xfId", "0"), ("builtinId", "0")])?;
    part.end("cellStyles")?;
    part.end("styleSheet")?;
    Ok(part.finish())
}

/// `<c ...><v>raw</v></c>`
fn value_cell(part: &mut PartWriter, attributes: &[(&str, &str)], raw: &str) -> Result<(), ReadingLogError> {
    part.start("c", attributes)?;
    part.element("v", &[], raw)?;
    part.end("c")
}

fn write_cell(part: &mut PartWriter, reference: &str, value: &Value) -> Result<(), ReadingLogError> {
    match value {
        Value::Empty => Ok(()),
        Value::Bool(flag) => value_cell(part, &[("r", reference), ("t", "b")], if *flag { "1" } else { "0" }),
        Value::Number(number) => value_cell(part, &[("r", reference)], &number.to_string()),
        Value::DateTime(datetime) => {
            let style = if is_date_only(datetime) { STYLE_DATE } else { STYLE_DATETIME };
            let serial = datetime_to_serial(datetime).to_string();
            value_cell(part, &[("r", reference), ("s", style)], &serial)
        }
        Value::Text(text) => {
            part.start("c", &[("r", reference), ("t", "inlineStr")])?;
            part.start("is", &[])?;
            if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
                part.element("t", &[("xml:space", "preserve")], text)?;
            } else {
                part.element("t", &[], text)?;
            }
            part.end("is")?;
            part.end("c")
        }
    }
}

fn worksheet<I>(headers: &[&str], rows: I) -> Result<Vec<u8>, ReadingLogError>
where
    I: IntoIterator<Item = Vec<Value>>,
{
    let mut part = PartWriter::new()?;
    part.start("worksheet", &[("xmlns", NS_MAIN), ("xmlns:r", NS_RELATIONSHIPS)])?;
    part.start("sheetData", &[])?;

    let header = headers.iter().map(|label| Value::text(*label)).collect::<Vec<_>>();
    for (row, values) in std::iter::once(header).chain(rows).enumerate() {
        let number = (row + 1).to_string();
        part.start("row", &[("r", number.as_str())])?;
        for (col, value) in values.iter().enumerate() {
            write_cell(&mut part, &index_to_reference(row, col), value)?;
        }
        part.end("row")?;
    }

    part.end("sheetData")?;
    part.end("worksheet")?;
    Ok(part.finish())
}

/// Writes `headers` and `rows` as one worksheet into any seekable sink.
pub(crate) fn write_package<W, I>(sink: W, sheet_name: &str, headers: &[&str], rows: I) -> Result<W, ReadingLogError>
where
    W: Write + Seek,
    I: IntoIterator<Item = Vec<Value>>,
{
    let mut zip = ZipWriter::new(sink);
    write_entry(&mut zip, "[Content_Types].xml", &content_types()?)?;
    write_entry(&mut zip, "_rels/.rels", &root_relationships()?)?;
    write_entry(&mut zip, "xl/workbook.xml", &workbook(&sanitize_sheet_name(sheet_name))?)?;
    write_entry(&mut zip, "xl/_rels/workbook.xml.rels", &workbook_relationships()?)?;
    write_entry(&mut zip, "xl/styles.xml", &styles()?)?;
    write_entry(&mut zip, "xl/worksheets/sheet1.xml", &worksheet(headers, rows)?)?;
    Ok(zip.finish()?)
}

/// Writes `headers` and `rows` to an `.xlsx` file, replacing any existing file.
pub fn write_table<P, I>(path: P, sheet_name: &str, headers: &[&str], rows: I) -> Result<(), ReadingLogError>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = Vec<Value>>,
{
    let file = File::create(path.as_ref())?;
    let mut writer = write_package(BufWriter::new(file), sheet_name, headers, rows)?;
    writer.flush()?;
    Ok(())
}
