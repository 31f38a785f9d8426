use std::fs::File;
use std::io::Write;
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

fn column_name(mut col: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'A' + (col % 26) as u8);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    name.reverse();
    String::from_utf8(name).unwrap()
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn sheet_xml(rows: &[Vec<String>]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );
    for (row, cells) in rows.iter().enumerate() {
        xml.push_str(&format!(r#"<row r="{}">"#, row + 1));
        for (col, text) in cells.iter().enumerate() {
            if text.is_empty() {
                continue;
            }
            let reference = format!("{}{}", column_name(col), row + 1);
            if text.parse::<f64>().is_ok() {
                xml.push_str(&format!(r#"<c r="{reference}"><v>{text}</v></c>"#));
            } else {
                xml.push_str(&format!(r#"<c r="{reference}" t="inlineStr"><is><t>{}</t></is></c>"#, escape(text)));
            }
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}

/// Writes a workbook with one worksheet per `(name, rows)` pair.
/// Numeric-looking cells are stored as numbers, everything else as inline text.
pub fn write_workbook(path: &Path, sheets: &[(&str, Rows)]) {
    let mut zip = ZipWriter::new(File::create(path).unwrap());
    let options = SimpleFileOptions::default();
    let mut workbook = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>"#,
    );
    let mut relationships = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for (index, (name, rows)) in sheets.iter().enumerate() {
        let number = index + 1;
        workbook.push_str(&format!(r#"<sheet name="{}" sheetId="{number}" r:id="rId{number}"/>"#, escape(name)));
        relationships.push_str(&format!(
            r#"<Relationship Id="rId{number}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{number}.xml"/>"#
        ));
        zip.start_file(format!("xl/worksheets/sheet{number}.xml"), options).unwrap();
        zip.write_all(sheet_xml(rows).as_bytes()).unwrap();
    }
    workbook.push_str("</sheets></workbook>");
    relationships.push_str("</Relationships>");
    zip.start_file("xl/workbook.xml", options).unwrap();
    zip.write_all(workbook.as_bytes()).unwrap();
    zip.start_file("xl/_rels/workbook.xml.rels", options).unwrap();
    zip.write_all(relationships.as_bytes()).unwrap();
    zip.finish().unwrap();
}

/// Owned sheet rows.
pub type Rows = Vec<Vec<String>>;

pub fn rows(rows: &[&[&str]]) -> Rows {
    rows.iter().map(|row| row.iter().map(|cell| cell.to_string()).collect()).collect()
}

/// A typical reading log sheet: title, metadata block, header at row 5, entries below.
pub fn log_sheet(school: &str, grade: &str, name: &str, entries: &[&[&str]]) -> Rows {
    let mut sheet = rows(&[
        &["독서 기록장"],
        &[],
        &["학교", school, "", "학년", grade],
        &["이름", name],
        &[],
        &["년", "월", "날짜", "Date", "순번", "코드번호", "책제목", "레벨 ", "저자", "시리즈", "구분"],
    ]);
    sheet.extend(rows(entries));
    sheet
}
