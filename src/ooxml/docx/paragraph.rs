/// Paragraph and Run structures for Word documents.
use crate::common::xml::escape_xml;
use crate::ooxml::docx::document::RunId;
use crate::ooxml::docx::parts::Edit;
use crate::ooxml::docx::properties::{PropertyBlock, qualify};
use smallvec::SmallVec;
use std::ops::Range;

/// A paragraph in a Word document.
///
/// Represents a `<w:p>` element. The runs listed here are every `w:r`
/// reachable inside the paragraph, including those nested in hyperlinks,
/// tracked insertions and similar wrappers, in document order.
///
/// # Example
///
/// ```rust
/// use docx_batch::ooxml::docx::Package;
///
/// let pkg = Package::from_body_xml(r#"<w:p><w:r><w:t>Hello </w:t></w:r><w:r><w:t>World</w:t></w:r></w:p>"#)?;
/// let doc = pkg.document();
/// let para = doc.body_paragraphs().next().unwrap();
/// assert_eq!(doc.paragraph(para).runs().len(), 2);
/// assert_eq!(doc.paragraph_text(para), "Hello World");
/// # Ok::<(), docx_batch::ooxml::OoxmlError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Paragraph {
    runs: SmallVec<[RunId; 8]>,
    properties: PropertyBlock,
}

impl Paragraph {
    pub(crate) fn new(runs: SmallVec<[RunId; 8]>, properties: PropertyBlock) -> Self {
        Self { runs, properties }
    }

    /// Runs in document order.
    #[inline]
    pub fn runs(&self) -> &[RunId] {
        &self.runs
    }

    /// The paragraph's `w:pPr`.
    #[inline]
    pub fn properties(&self) -> &PropertyBlock {
        &self.properties
    }

    #[inline]
    pub fn properties_mut(&mut self) -> &mut PropertyBlock {
        &mut self.properties
    }

    pub(crate) fn collect_edits(&self, edits: &mut Vec<Edit>) {
        if let Some((span, text)) = self.properties.edit() {
            edits.push(Edit::new(span, text));
        }
    }
}

/// One `<w:t>` element of a run.
#[derive(Debug, Clone)]
pub(crate) struct TextSlot {
    /// Byte range of the whole element, or an empty range for a slot that
    /// does not exist in the source yet.
    span: Range<usize>,
    qname: String,
    original: String,
    value: String,
}

impl TextSlot {
    pub(crate) fn parsed(span: Range<usize>, qname: &str, text: String) -> Self {
        Self {
            span,
            qname: qname.to_string(),
            value: text.clone(),
            original: text,
        }
    }

    #[inline]
    fn is_modified(&self) -> bool {
        self.value != self.original
    }

    /// Write the slot back. Tab and newline characters in the value become
    /// `w:tab` and `w:br` elements between the text pieces.
    fn render(&self, prefix: &str, out: &mut String) {
        if self.value.is_empty() {
            out.push('<');
            out.push_str(&self.qname);
            out.push_str("/>");
            return;
        }

        let mut rest = self.value.as_str();
        while let Some(at) = rest.find(is_separator) {
            self.render_piece(&rest[..at], out);
            let local = if rest.as_bytes()[at] == b'\t' { "tab" } else { "br" };
            out.push('<');
            out.push_str(&qualify(prefix, local));
            out.push_str("/>");
            rest = &rest[at + 1..];
        }
        self.render_piece(rest, out);
    }

    fn render_piece(&self, piece: &str, out: &mut String) {
        if piece.is_empty() {
            return;
        }
        out.push('<');
        out.push_str(&self.qname);
        out.push_str(" xml:space=\"preserve\">");
        out.push_str(&escape_xml(piece));
        out.push_str("</");
        out.push_str(&self.qname);
        out.push('>');
    }
}

/// A run child that reads as a single character: `w:tab` and `w:ptab` as
/// `\t`, text-wrapping `w:br` and `w:cr` as `\n`.
#[derive(Debug, Clone)]
pub(crate) struct Separator {
    span: Range<usize>,
    ch: char,
    /// Number of text slots that precede this element in the run.
    slots_before: usize,
    removed: bool,
}

impl Separator {
    pub(crate) fn parsed(span: Range<usize>, ch: char, slots_before: usize) -> Self {
        Self {
            span,
            ch,
            slots_before,
            removed: false,
        }
    }
}

#[inline]
fn is_separator(ch: char) -> bool {
    matches!(ch, '\t' | '\n')
}

/// How a run element is written in the source.
#[derive(Debug, Clone)]
pub(crate) enum RunShape {
    /// `<w:r ...>...</w:r>`; `close_at` is the offset of the end tag.
    Open { close_at: usize },
    /// `<w:r .../>`; `attrs` is the raw attribute text of the start tag.
    SelfClosing { element: Range<usize>, attrs: String },
}

/// A text run within a paragraph.
///
/// A run's text is its `w:t` content and separators in document order, with
/// `\t` for a tab and `\n` for a line break. Drawings, fields and page
/// breaks are not part of the text and are left in place when the text
/// changes.
#[derive(Debug, Clone)]
pub struct Run {
    prefix: String,
    slots: SmallVec<[TextSlot; 1]>,
    separators: SmallVec<[Separator; 2]>,
    properties: PropertyBlock,
    shape: RunShape,
}

impl Run {
    pub(crate) fn new(
        prefix: &str,
        slots: SmallVec<[TextSlot; 1]>,
        separators: SmallVec<[Separator; 2]>,
        properties: PropertyBlock,
        shape: RunShape,
    ) -> Self {
        Self {
            prefix: prefix.to_string(),
            slots,
            separators,
            properties,
            shape,
        }
    }

    /// Get the text content of this run.
    pub fn text(&self) -> String {
        if self.separators.is_empty() {
            return match self.slots.as_slice() {
                [] => String::new(),
                [only] => only.value.clone(),
                slots => slots.iter().map(|s| s.value.as_str()).collect(),
            };
        }

        let mut text = String::with_capacity(self.text_len());
        let mut next = 0;
        for sep in &self.separators {
            for slot in &self.slots[next..sep.slots_before] {
                text.push_str(&slot.value);
            }
            next = sep.slots_before;
            if !sep.removed {
                text.push(sep.ch);
            }
        }
        for slot in &self.slots[next..] {
            text.push_str(&slot.value);
        }
        text
    }

    /// Byte length of [`Run::text`] without building it.
    pub fn text_len(&self) -> usize {
        let separators: usize = self
            .separators
            .iter()
            .filter(|s| !s.removed)
            .map(|s| s.ch.len_utf8())
            .sum();
        self.slots.iter().map(|s| s.value.len()).sum::<usize>() + separators
    }

    /// Replace the run's text.
    ///
    /// When the new text carries the same tabs and breaks as the run, in the
    /// same order, each piece between them goes back to the `w:t` elements
    /// in its own gap and the separator elements stay where they are.
    /// Otherwise the first `w:t` receives all of the text, further ones are
    /// emptied, and the run's separators are re-emitted inline from the text.
    /// A run without a `w:t` gets one inserted.
    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        let aligned = !self.separators.is_empty()
            && self.separators.iter().all(|s| !s.removed)
            && text
                .chars()
                .filter(|&c| is_separator(c))
                .eq(self.separators.iter().map(|s| s.ch));

        if aligned {
            self.fill_gaps(&text);
        } else {
            self.fill_first_slot(text);
        }
    }

    fn fill_gaps(&mut self, text: &str) {
        for (gap, piece) in text.split(is_separator).enumerate() {
            let (from, to) = self.gap_bounds(gap);
            if from == to {
                if piece.is_empty() {
                    continue;
                }
                let at = match self.separators.get(gap) {
                    Some(next) => next.span.start,
                    None => self.separators[gap - 1].span.end,
                };
                self.insert_slot(from, at, gap);
                self.slots[from].value = piece.to_string();
                continue;
            }

            self.slots[from].value = piece.to_string();
            for slot in &mut self.slots[from + 1..to] {
                slot.value.clear();
            }
        }
    }

    fn fill_first_slot(&mut self, text: String) {
        for sep in &mut self.separators {
            sep.removed = true;
        }
        if self.slots.is_empty() {
            if text.is_empty() {
                return;
            }
            let at = match (self.separators.first(), &self.shape) {
                (Some(first), _) => first.span.start,
                (None, RunShape::Open { close_at }) => *close_at,
                (None, RunShape::SelfClosing { element, .. }) => element.end,
            };
            self.insert_slot(0, at, 0);
        }

        let mut slots = self.slots.iter_mut();
        if let Some(first) = slots.next() {
            first.value = text;
        }
        for slot in slots {
            slot.value.clear();
        }
    }

    /// Slot index range of the text between separator `gap - 1` and `gap`.
    fn gap_bounds(&self, gap: usize) -> (usize, usize) {
        let from = match gap {
            0 => 0,
            _ => self.separators[gap - 1].slots_before,
        };
        let to = self
            .separators
            .get(gap)
            .map_or(self.slots.len(), |sep| sep.slots_before);
        (from, to)
    }

    /// Insert an empty, not yet written `w:t` at slot `index`, positioned at
    /// byte offset `at`, ahead of separator `gap` and all later ones.
    fn insert_slot(&mut self, index: usize, at: usize, gap: usize) {
        let qname = qualify(&self.prefix, "t");
        self.slots.insert(index, TextSlot::parsed(at..at, &qname, String::new()));
        for sep in self.separators.iter_mut().skip(gap) {
            sep.slots_before += 1;
        }
    }

    /// The run's `w:rPr`.
    #[inline]
    pub fn properties(&self) -> &PropertyBlock {
        &self.properties
    }

    #[inline]
    pub fn properties_mut(&mut self) -> &mut PropertyBlock {
        &mut self.properties
    }

    /// Whether text or formatting differ from the source.
    pub fn is_modified(&self) -> bool {
        self.properties.is_dirty()
            || self.slots.iter().any(TextSlot::is_modified)
            || self.separators.iter().any(|s| s.removed)
    }

    pub(crate) fn collect_edits(&self, edits: &mut Vec<Edit>) {
        match &self.shape {
            RunShape::Open { .. } => {
                if let Some((span, text)) = self.properties.edit() {
                    edits.push(Edit::new(span, text));
                }
                for slot in self.slots.iter().filter(|s| s.is_modified()) {
                    let mut text = String::with_capacity(slot.value.len() + 48);
                    slot.render(&self.prefix, &mut text);
                    edits.push(Edit::new(slot.span.clone(), text));
                }
                for sep in self.separators.iter().filter(|s| s.removed) {
                    edits.push(Edit::new(sep.span.clone(), String::new()));
                }
            },
            RunShape::SelfClosing { element, attrs } => {
                if !self.is_modified() {
                    return;
                }
                // No room for children inside `<w:r/>`; write the run out whole.
                let name = qualify(&self.prefix, "r");
                let mut text = format!("<{name}{attrs}>");
                if self.properties.is_present() {
                    text.push_str(&self.properties.render());
                }
                for slot in &self.slots {
                    slot.render(&self.prefix, &mut text);
                }
                text.push_str(&format!("</{name}>"));
                edits.push(Edit::new(element.clone(), text));
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::docx::properties::PropertyKind;

    fn open_run(slots: &[(Range<usize>, &str)], close_at: usize) -> Run {
        run_with_separators(slots, &[], close_at)
    }

    /// `separators` holds (span, char, slots before).
    fn run_with_separators(
        slots: &[(Range<usize>, &str)],
        separators: &[(Range<usize>, char, usize)],
        close_at: usize,
    ) -> Run {
        let slots = slots
            .iter()
            .map(|(span, text)| TextSlot::parsed(span.clone(), "w:t", text.to_string()))
            .collect();
        let separators = separators
            .iter()
            .map(|(span, ch, before)| Separator::parsed(span.clone(), *ch, *before))
            .collect();
        Run::new(
            "w",
            slots,
            separators,
            PropertyBlock::absent(PropertyKind::Run, "w", Some(5)),
            RunShape::Open { close_at },
        )
    }

    fn edits_of(run: &Run) -> Vec<Edit> {
        let mut edits = Vec::new();
        run.collect_edits(&mut edits);
        edits.sort_by_key(|e| (e.span.start, e.span.end));
        edits
    }

    #[test]
    fn test_text_concatenates_slots() {
        let run = open_run(&[(5..20, "Hello "), (20..35, "World")], 35);
        assert_eq!(run.text(), "Hello World");
        assert_eq!(run.text_len(), 11);
        assert!(!run.is_modified());
    }

    #[test]
    fn test_set_text_fills_first_slot_and_empties_rest() {
        let mut run = open_run(&[(5..20, "Hello "), (20..35, "World")], 35);
        run.set_text("Hi <you>");
        assert_eq!(run.text(), "Hi <you>");

        let mut edits = Vec::new();
        run.collect_edits(&mut edits);
        assert_eq!(edits.len(), 2);
        assert_eq!(edits[0].span, 5..20);
        assert_eq!(edits[0].text, r#"<w:t xml:space="preserve">Hi &lt;you&gt;</w:t>"#);
        assert_eq!(edits[1].text, "<w:t/>");
    }

    #[test]
    fn test_set_same_text_is_not_a_modification() {
        let mut run = open_run(&[(5..20, "same")], 20);
        run.set_text("same");
        assert!(!run.is_modified());
    }

    #[test]
    fn test_slotless_run_gets_text_before_end_tag() {
        let mut run = open_run(&[], 42);
        run.set_text("");
        assert!(!run.is_modified());

        run.set_text("new");
        let mut edits = Vec::new();
        run.collect_edits(&mut edits);
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].span, 42..42);
    }

    #[test]
    fn test_self_closing_run_is_rewritten_whole() {
        let mut run = Run::new(
            "w",
            SmallVec::new(),
            SmallVec::new(),
            PropertyBlock::absent(PropertyKind::Run, "w", None),
            RunShape::SelfClosing {
                element: 10..26,
                attrs: r#" w:rsidR="00AB""#.to_string(),
            },
        );
        run.set_text("x");
        run.properties_mut().set_toggle("b", true);

        let mut edits = Vec::new();
        run.collect_edits(&mut edits);
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].span, 10..26);
        assert_eq!(
            edits[0].text,
            r#"<w:r w:rsidR="00AB"><w:rPr><w:b/></w:rPr><w:t xml:space="preserve">x</w:t></w:r>"#
        );
    }

    // <w:t>Year:</w:t><w:tab/><w:t>2024</w:t>
    fn tabbed_run() -> Run {
        run_with_separators(&[(5..18, "Year:"), (25..37, "2024")], &[(18..25, '\t', 1)], 37)
    }

    #[test]
    fn test_separators_are_part_of_text() {
        let run = tabbed_run();
        assert_eq!(run.text(), "Year:\t2024");
        assert_eq!(run.text_len(), 10);
    }

    #[test]
    fn test_tab_stays_between_its_text_pieces() {
        let mut run = tabbed_run();
        run.set_text("Year:\t2025");
        assert_eq!(run.text(), "Year:\t2025");

        let edits = edits_of(&run);
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].span, 25..37);
        assert_eq!(edits[0].text, r#"<w:t xml:space="preserve">2025</w:t>"#);
    }

    #[test]
    fn test_empty_gap_gets_a_new_slot_next_to_the_separator() {
        // <w:tab/><w:t>x</w:t>
        let mut run = run_with_separators(&[(12..24, "x")], &[(5..12, '\t', 0)], 24);
        run.set_text("a\tx");
        assert_eq!(run.text(), "a\tx");

        let edits = edits_of(&run);
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].span, 5..5);
        assert_eq!(edits[0].text, r#"<w:t xml:space="preserve">a</w:t>"#);

        // <w:t>x</w:t><w:br/>
        let mut run = run_with_separators(&[(5..17, "x")], &[(17..23, '\n', 1)], 23);
        run.set_text("x\ny");
        let edits = edits_of(&run);
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].span, 23..23);
        assert_eq!(run.text(), "x\ny");
    }

    #[test]
    fn test_changed_separators_are_rewritten_inline() {
        let mut run = tabbed_run();
        run.set_text("Year 2025");
        assert_eq!(run.text(), "Year 2025");
        let edits = edits_of(&run);
        assert_eq!(edits.len(), 3);
        assert_eq!(edits[0].text, r#"<w:t xml:space="preserve">Year 2025</w:t>"#);
        assert_eq!((edits[1].span.clone(), edits[1].text.as_str()), (18..25, ""));
        assert_eq!(edits[2].text, "<w:t/>");

        let mut run = open_run(&[(5..20, "a")], 20);
        run.set_text("a\tb\nc");
        assert_eq!(run.text(), "a\tb\nc");
        let edits = edits_of(&run);
        assert_eq!(
            edits[0].text,
            r#"<w:t xml:space="preserve">a</w:t><w:tab/><w:t xml:space="preserve">b</w:t><w:br/><w:t xml:space="preserve">c</w:t>"#
        );
    }

    #[test]
    fn test_emptying_a_run_removes_its_separators() {
        let mut run = run_with_separators(&[], &[(5..12, '\t', 0)], 12);
        assert_eq!(run.text(), "\t");
        run.set_text("");
        assert_eq!(run.text(), "");
        assert!(run.is_modified());
        let edits = edits_of(&run);
        assert_eq!(edits, vec![Edit::new(5..12, String::new())]);
    }
}
