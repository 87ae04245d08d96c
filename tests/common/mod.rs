#![allow(dead_code)]

use docx_batch::ooxml::docx::Package;
use std::path::{Path, PathBuf};

/// Write a `.docx` whose body is `body` (WordprocessingML, `w:` prefix).
pub fn write_docx(path: &Path, body: &str) -> PathBuf {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    Package::from_body_xml(body).unwrap().save(path).unwrap();
    path.to_path_buf()
}

pub fn paragraph(text: &str) -> String {
    format!(r#"<w:p><w:r><w:t xml:space="preserve">{text}</w:t></w:r></w:p>"#)
}

/// "Hello World 2024", a 2x2 table of "Cell N - 2024", then
/// "More text 2024 here".
pub fn sample_body() -> String {
    let cell = |n: usize| format!("<w:tc>{}</w:tc>", paragraph(&format!("Cell {n} - 2024")));
    format!(
        "{}<w:tbl><w:tr>{}{}</w:tr><w:tr>{}{}</w:tr></w:tbl>{}",
        paragraph("Hello World 2024"),
        cell(1),
        cell(2),
        cell(3),
        cell(4),
        paragraph("More text 2024 here")
    )
}

pub fn text_of(path: &Path) -> String {
    Package::open(path).unwrap().document().text()
}
