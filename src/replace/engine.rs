use crate::ooxml::docx::{CellId, Document, FormatSnapshot, ParagraphId, RunFormat, RunId, TableId};
use crate::replace::{ReplaceRule, find_match};
use smallvec::SmallVec;
use tracing::trace;

/// Replace every occurrence of the rule's search text in one paragraph.
///
/// Matches are resolved left to right. After each replacement the scan
/// resumes right after the inserted text, so a replacement that contains the
/// search text is never matched again.
pub fn replace_in_paragraph(doc: &mut Document, paragraph: ParagraphId, rule: &ReplaceRule) -> usize {
    let runs: SmallVec<[RunId; 8]> = doc.paragraph(paragraph).runs().iter().copied().collect();
    if runs.is_empty() {
        return 0;
    }

    let mut count = 0;
    let mut cursor = 0;
    loop {
        let texts: SmallVec<[String; 8]> = runs.iter().map(|&id| doc.run(id).text()).collect();
        let Some(found) = find_match(&texts, rule, cursor) else {
            break;
        };

        let start_id = runs[found.start_run];
        let format = RunFormat::capture(doc.run(start_id));

        let head = &texts[found.start_run][..found.start_offset];
        let tail = &texts[found.end_run][found.end_offset..];
        let mut updated = String::with_capacity(head.len() + rule.replace().len() + tail.len());
        updated.push_str(head);
        updated.push_str(rule.replace());
        updated.push_str(tail);

        let start_run = doc.run_mut(start_id);
        start_run.set_text(updated);
        format.apply(start_run);

        for &id in &runs[found.start_run + 1..=found.end_run] {
            doc.run_mut(id).set_text(String::new());
        }

        trace!(
            paragraph = paragraph.index(),
            start = found.start,
            runs = found.end_run - found.start_run + 1,
            "replaced match"
        );
        count += 1;
        cursor = found.start + rule.replace().len();
    }
    count
}

/// Replace inside one table cell: its paragraphs first, then its nested tables.
pub fn replace_in_cell(doc: &mut Document, cell: CellId, rule: &ReplaceRule) -> usize {
    let paragraphs: Vec<ParagraphId> = doc.cell(cell).paragraphs().collect();
    let tables: Vec<TableId> = doc.cell(cell).tables().collect();

    let mut count = 0;
    for paragraph in paragraphs {
        count += replace_in_paragraph(doc, paragraph, rule);
    }
    for table in tables {
        count += replace_in_table(doc, table, rule);
    }
    count
}

/// Replace in every cell of a table, row by row, descending into nested tables.
pub fn replace_in_table(doc: &mut Document, table: TableId, rule: &ReplaceRule) -> usize {
    let cells: Vec<CellId> = doc.table(table).cells().collect();
    cells.into_iter().map(|cell| replace_in_cell(doc, cell, rule)).sum()
}

/// Replace throughout the document body.
///
/// Top-level paragraphs are processed first, then top-level tables. The
/// progress callback fires once per top-level item with `(done, total)`.
pub fn replace_text(
    doc: &mut Document,
    rule: &ReplaceRule,
    mut progress: Option<&mut (dyn FnMut(usize, usize) + '_)>,
) -> usize {
    let paragraphs: Vec<ParagraphId> = doc.body_paragraphs().collect();
    let tables: Vec<TableId> = doc.body_tables().collect();
    let total = paragraphs.len() + tables.len();

    let mut count = 0;
    let mut done = 0;
    for paragraph in paragraphs {
        count += replace_in_paragraph(doc, paragraph, rule);
        done += 1;
        if let Some(report) = progress.as_deref_mut() {
            report(done, total);
        }
    }
    for table in tables {
        count += replace_in_table(doc, table, rule);
        done += 1;
        if let Some(report) = progress.as_deref_mut() {
            report(done, total);
        }
    }
    count
}

/// Apply rules in order, each over the whole document.
///
/// A later rule sees the text produced by earlier ones.
pub fn replace_multiple(
    doc: &mut Document,
    rules: &[ReplaceRule],
    mut progress: Option<&mut (dyn FnMut(usize, usize) + '_)>,
) -> usize {
    rules
        .iter()
        .map(|rule| replace_text(doc, rule, progress.as_deref_mut()))
        .sum()
}
