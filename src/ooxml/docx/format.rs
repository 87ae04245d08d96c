/// Format snapshots: capture the formatting of a run, paragraph or cell and
/// replay it onto another element of the same kind.
///
/// Every field is optional. `None` means the source did not set that
/// property, and applying the snapshot leaves the target's value alone.
use crate::common::{RGBColor, VerticalPosition};
use crate::ooxml::docx::paragraph::{Paragraph, Run};
use crate::ooxml::docx::properties::PropertyBlock;
use crate::ooxml::docx::table::Cell;
use serde::Serialize;

/// Capture-and-apply over one kind of formattable element.
///
/// `apply(capture(x), x)` is a no-op, and applying a snapshot only ever
/// writes the properties it carries.
pub trait FormatSnapshot: Sized {
    type Target;

    fn capture(target: &Self::Target) -> Self;

    fn apply(&self, target: &mut Self::Target);

    /// True when no property was captured.
    fn is_empty(&self) -> bool;
}

/// Text color of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TextColor {
    /// `w:val="auto"`
    Auto,
    Rgb(RGBColor),
}

impl TextColor {
    fn from_ooxml(val: &str) -> Option<Self> {
        if val.eq_ignore_ascii_case("auto") {
            return Some(Self::Auto);
        }
        RGBColor::from_hex(val).map(Self::Rgb)
    }

    fn as_ooxml(&self) -> String {
        match self {
            Self::Auto => "auto".to_string(),
            Self::Rgb(rgb) => rgb.to_hex(),
        }
    }
}

/// Underline styles for text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum UnderlineStyle {
    /// Explicitly no underline (`w:val="none"`)
    None,
    Single,
    Double,
    Thick,
    Dotted,
    Dashed,
    Wave,
    Words,
    /// Any other `ST_Underline` value, kept verbatim.
    Other(String),
}

impl UnderlineStyle {
    fn from_ooxml(val: &str) -> Self {
        match val {
            "none" => Self::None,
            "single" => Self::Single,
            "double" => Self::Double,
            "thick" => Self::Thick,
            "dotted" => Self::Dotted,
            "dash" => Self::Dashed,
            "wave" => Self::Wave,
            "words" => Self::Words,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::None => "none",
            Self::Single => "single",
            Self::Double => "double",
            Self::Thick => "thick",
            Self::Dotted => "dotted",
            Self::Dashed => "dash",
            Self::Wave => "wave",
            Self::Words => "words",
            Self::Other(val) => val.as_str(),
        }
    }
}

/// Font slots of `w:rFonts`. Word picks a slot per character class, so
/// each one is kept on its own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunFonts {
    pub ascii: Option<String>,
    pub h_ansi: Option<String>,
    pub east_asia: Option<String>,
    pub cs: Option<String>,
}

impl RunFonts {
    const SLOTS: [&'static str; 4] = ["ascii", "hAnsi", "eastAsia", "cs"];

    fn from_properties(props: &PropertyBlock) -> Self {
        let slot = |name: &str| props.attr("rFonts", name).map(str::to_string);
        Self {
            ascii: slot("ascii"),
            h_ansi: slot("hAnsi"),
            east_asia: slot("eastAsia"),
            cs: slot("cs"),
        }
    }

    fn write_properties(&self, props: &mut PropertyBlock) {
        let values = [&self.ascii, &self.h_ansi, &self.east_asia, &self.cs];
        for (name, value) in Self::SLOTS.into_iter().zip(values) {
            if let Some(value) = value {
                props.set_attr("rFonts", name, value);
            }
        }
    }
}

/// Character formatting of a run (`w:rPr`).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunFormat {
    pub fonts: RunFonts,
    /// Size in half-points (`w:sz`)
    pub font_size: Option<u32>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub strike: Option<bool>,
    pub underline: Option<UnderlineStyle>,
    pub vertical_position: Option<VerticalPosition>,
    pub color: Option<TextColor>,
    /// Highlight color name, e.g. `yellow`
    pub highlight: Option<String>,
}

impl FormatSnapshot for RunFormat {
    type Target = Run;

    fn capture(run: &Run) -> Self {
        Self::from_properties(run.properties())
    }

    fn apply(&self, run: &mut Run) {
        self.write_properties(run.properties_mut());
    }

    fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl RunFormat {
    pub fn from_properties(props: &PropertyBlock) -> Self {
        Self {
            fonts: RunFonts::from_properties(props),
            font_size: props.attr("sz", "val").and_then(|v| v.parse().ok()),
            bold: props.toggle("b"),
            italic: props.toggle("i"),
            strike: props.toggle("strike"),
            underline: props.attr("u", "val").map(UnderlineStyle::from_ooxml),
            vertical_position: props.attr("vertAlign", "val").and_then(VerticalPosition::from_ooxml),
            color: props.attr("color", "val").and_then(TextColor::from_ooxml),
            highlight: props.attr("highlight", "val").map(str::to_string),
        }
    }

    /// The Latin font: `ascii`, else `hAnsi`.
    pub fn font_name(&self) -> Option<&str> {
        self.fonts.ascii.as_deref().or(self.fonts.h_ansi.as_deref())
    }

    pub fn write_properties(&self, props: &mut PropertyBlock) {
        self.fonts.write_properties(props);
        if let Some(size) = self.font_size {
            props.set_attr("sz", "val", &size.to_string());
        }
        if let Some(bold) = self.bold {
            props.set_toggle("b", bold);
        }
        if let Some(italic) = self.italic {
            props.set_toggle("i", italic);
        }
        if let Some(strike) = self.strike {
            props.set_toggle("strike", strike);
        }
        if let Some(underline) = &self.underline {
            props.set_attr("u", "val", underline.as_str());
        }
        if let Some(position) = self.vertical_position {
            props.set_attr("vertAlign", "val", position.as_ooxml());
        }
        if let Some(color) = self.color {
            props.set_attr("color", "val", &color.as_ooxml());
        }
        if let Some(highlight) = &self.highlight {
            props.set_attr("highlight", "val", highlight);
        }
    }
}

/// Paragraph alignment options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParagraphAlignment {
    Left,
    Center,
    Right,
    Justify,
    Distribute,
}

impl ParagraphAlignment {
    fn from_ooxml(val: &str) -> Option<Self> {
        match val {
            "left" | "start" => Some(Self::Left),
            "center" => Some(Self::Center),
            "right" | "end" => Some(Self::Right),
            "both" => Some(Self::Justify),
            "distribute" => Some(Self::Distribute),
            _ => None,
        }
    }

    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
            Self::Justify => "both",
            Self::Distribute => "distribute",
        }
    }
}

/// Line spacing options for paragraphs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum LineSpacing {
    /// Single line spacing
    Single,
    /// 1.5 line spacing
    OneAndHalf,
    /// Double line spacing
    Double,
    /// Multiple line spacing (e.g., 1.15)
    Multiple(f64),
    /// Exact spacing in points
    Exact(f64),
    /// At least spacing in points
    AtLeast(f64),
}

impl LineSpacing {
    /// Interpret `w:spacing/@w:line` together with `@w:lineRule`.
    fn from_ooxml(line: &str, rule: Option<&str>) -> Option<Self> {
        let line: f64 = line.parse().ok()?;
        Some(match rule.unwrap_or("auto") {
            "exact" => Self::Exact(line / 20.0),
            "atLeast" => Self::AtLeast(line / 20.0),
            _ => match line as i64 {
                240 => Self::Single,
                360 => Self::OneAndHalf,
                480 => Self::Double,
                _ => Self::Multiple(line / 240.0),
            },
        })
    }

    /// The `(line, lineRule)` attribute pair.
    fn to_ooxml(self) -> (String, &'static str) {
        let twips = |points: f64| ((points * 20.0).round() as i64).to_string();
        match self {
            Self::Single => ("240".to_string(), "auto"),
            Self::OneAndHalf => ("360".to_string(), "auto"),
            Self::Double => ("480".to_string(), "auto"),
            Self::Multiple(factor) => (((factor * 240.0).round() as i64).to_string(), "auto"),
            Self::Exact(points) => (twips(points), "exact"),
            Self::AtLeast(points) => (twips(points), "atLeast"),
        }
    }
}

/// Paragraph formatting (`w:pPr`). Lengths are in twips.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParagraphFormat {
    pub alignment: Option<ParagraphAlignment>,
    pub left_indent: Option<i32>,
    pub right_indent: Option<i32>,
    /// Positive for a first-line indent, negative for a hanging indent
    pub first_line_indent: Option<i32>,
    pub space_before: Option<u32>,
    pub space_after: Option<u32>,
    pub line_spacing: Option<LineSpacing>,
    /// Paragraph style id (`w:pStyle`)
    pub style: Option<String>,
}

impl FormatSnapshot for ParagraphFormat {
    type Target = Paragraph;

    fn capture(paragraph: &Paragraph) -> Self {
        let props = paragraph.properties();
        let indent = |primary: &str, alternate: &str| -> Option<i32> {
            props
                .attr("ind", primary)
                .or_else(|| props.attr("ind", alternate))
                .and_then(|v| v.parse().ok())
        };
        let first_line = props
            .attr("ind", "hanging")
            .and_then(|v| v.parse::<i32>().ok())
            .map(|hanging| -hanging)
            .or_else(|| props.attr("ind", "firstLine").and_then(|v| v.parse().ok()));

        Self {
            alignment: props.attr("jc", "val").and_then(ParagraphAlignment::from_ooxml),
            left_indent: indent("left", "start"),
            right_indent: indent("right", "end"),
            first_line_indent: first_line,
            space_before: props.attr("spacing", "before").and_then(|v| v.parse().ok()),
            space_after: props.attr("spacing", "after").and_then(|v| v.parse().ok()),
            line_spacing: props
                .attr("spacing", "line")
                .and_then(|line| LineSpacing::from_ooxml(line, props.attr("spacing", "lineRule"))),
            style: props.attr("pStyle", "val").map(str::to_string),
        }
    }

    fn apply(&self, paragraph: &mut Paragraph) {
        let props = paragraph.properties_mut();
        if let Some(style) = &self.style {
            props.set_attr("pStyle", "val", style);
        }
        if let Some(alignment) = self.alignment {
            props.set_attr("jc", "val", alignment.as_str());
        }
        if let Some(left) = self.left_indent {
            props.set_attr("ind", "left", &left.to_string());
        }
        if let Some(right) = self.right_indent {
            props.set_attr("ind", "right", &right.to_string());
        }
        if let Some(first) = self.first_line_indent {
            if first < 0 {
                props.remove_attr("ind", "firstLine");
                props.set_attr("ind", "hanging", &(-first).to_string());
            } else {
                props.remove_attr("ind", "hanging");
                props.set_attr("ind", "firstLine", &first.to_string());
            }
        }
        if let Some(before) = self.space_before {
            props.set_attr("spacing", "before", &before.to_string());
        }
        if let Some(after) = self.space_after {
            props.set_attr("spacing", "after", &after.to_string());
        }
        if let Some(spacing) = self.line_spacing {
            let (line, rule) = spacing.to_ooxml();
            props.set_attr("spacing", "line", &line);
            props.set_attr("spacing", "lineRule", rule);
        }
    }

    fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Vertical alignment of cell content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CellVerticalAlignment {
    Top,
    Center,
    Bottom,
}

impl CellVerticalAlignment {
    fn from_ooxml(val: &str) -> Option<Self> {
        match val {
            "top" => Some(Self::Top),
            "center" => Some(Self::Center),
            "bottom" => Some(Self::Bottom),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Center => "center",
            Self::Bottom => "bottom",
        }
    }
}

/// Preferred cell width (`w:tcW`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellWidth {
    pub value: u32,
    /// `dxa`, `pct`, `auto` or `nil`
    pub unit: String,
}

/// Table cell formatting (`w:tcPr`).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CellFormat {
    pub width: Option<CellWidth>,
    pub vertical_alignment: Option<CellVerticalAlignment>,
    /// Shading fill, hex or `auto`
    pub background: Option<String>,
}

impl FormatSnapshot for CellFormat {
    type Target = Cell;

    fn capture(cell: &Cell) -> Self {
        let props = cell.properties();
        Self {
            width: props.attr("tcW", "w").and_then(|w| w.parse().ok()).map(|value| CellWidth {
                value,
                unit: props.attr("tcW", "type").unwrap_or("dxa").to_string(),
            }),
            vertical_alignment: props.attr("vAlign", "val").and_then(CellVerticalAlignment::from_ooxml),
            background: props.attr("shd", "fill").map(str::to_string),
        }
    }

    fn apply(&self, cell: &mut Cell) {
        let props = cell.properties_mut();
        if let Some(width) = &self.width {
            props.set_attr("tcW", "w", &width.value.to_string());
            props.set_attr("tcW", "type", &width.unit);
        }
        if let Some(alignment) = self.vertical_alignment {
            props.set_attr("vAlign", "val", alignment.as_str());
        }
        if let Some(fill) = &self.background {
            if props.attr("shd", "val").is_none() {
                props.set_attr("shd", "val", "clear");
            }
            props.set_attr("shd", "fill", fill);
        }
    }

    fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::docx::document::Document;

    fn parse(body: &str) -> Document {
        let xml = format!(r#"<w:document xmlns:w="x"><w:body>{body}</w:body></w:document>"#);
        Document::parse(xml.into_bytes()).unwrap()
    }

    fn first_runs(doc: &Document) -> Vec<crate::ooxml::docx::document::RunId> {
        let para = doc.body_paragraphs().next().unwrap();
        doc.paragraph(para).runs().to_vec()
    }

    #[test]
    fn test_capture_run_format() {
        let doc = parse(
            r#"<w:p><w:r><w:rPr><w:rFonts w:ascii="Arial" w:hAnsi="Arial"/><w:b/><w:i w:val="0"/><w:color w:val="FF0000"/><w:sz w:val="28"/><w:highlight w:val="yellow"/><w:u w:val="double"/><w:vertAlign w:val="superscript"/></w:rPr><w:t>x</w:t></w:r></w:p>"#,
        );
        let format = RunFormat::capture(doc.run(first_runs(&doc)[0]));
        assert_eq!(format.font_name(), Some("Arial"));
        assert_eq!(format.fonts.east_asia, None);
        assert_eq!(format.font_size, Some(28));
        assert_eq!(format.bold, Some(true));
        assert_eq!(format.italic, Some(false));
        assert_eq!(format.strike, None);
        assert_eq!(format.underline, Some(UnderlineStyle::Double));
        assert_eq!(format.vertical_position, Some(VerticalPosition::Superscript));
        assert_eq!(format.color, Some(TextColor::Rgb(RGBColor::new(255, 0, 0))));
        assert_eq!(format.highlight.as_deref(), Some("yellow"));
    }

    #[test]
    fn test_apply_captured_to_self_is_noop() {
        let mut doc = parse(
            r#"<w:p><w:r><w:rPr><w:b w:val="true"/><w:sz w:val="20"/></w:rPr><w:t>x</w:t></w:r></w:p>"#,
        );
        let run = first_runs(&doc)[0];
        let format = RunFormat::capture(doc.run(run));
        format.apply(doc.run_mut(run));
        assert!(!doc.is_modified());
    }

    #[test]
    fn test_apply_only_writes_captured_fields() {
        let mut doc = parse(
            r#"<w:p><w:r><w:rPr><w:b/></w:rPr><w:t>a</w:t></w:r><w:r><w:rPr><w:i/><w:sz w:val="40"/></w:rPr><w:t>b</w:t></w:r></w:p>"#,
        );
        let runs = first_runs(&doc);
        let format = RunFormat::capture(doc.run(runs[0]));
        format.apply(doc.run_mut(runs[1]));

        let after = RunFormat::capture(doc.run(runs[1]));
        assert_eq!(after.bold, Some(true));
        assert_eq!(after.italic, Some(true));
        assert_eq!(after.font_size, Some(40));
    }

    #[test]
    fn test_font_slots_are_written_back_separately() {
        let mut doc = parse(
            r#"<w:p><w:r><w:rPr><w:rFonts w:ascii="Arial" w:hAnsi="Times New Roman"/></w:rPr><w:t>a</w:t></w:r><w:r><w:rPr><w:rFonts w:hAnsi="Consolas"/></w:rPr><w:t>b</w:t></w:r><w:r><w:t>c</w:t></w:r></w:p>"#,
        );
        let before = doc.to_xml();
        let runs = first_runs(&doc);

        let mixed = RunFormat::capture(doc.run(runs[0]));
        assert_eq!(mixed.fonts.ascii.as_deref(), Some("Arial"));
        assert_eq!(mixed.fonts.h_ansi.as_deref(), Some("Times New Roman"));
        mixed.apply(doc.run_mut(runs[0]));

        let h_ansi_only = RunFormat::capture(doc.run(runs[1]));
        assert_eq!(h_ansi_only.fonts.ascii, None);
        assert_eq!(h_ansi_only.font_name(), Some("Consolas"));
        h_ansi_only.apply(doc.run_mut(runs[1]));

        assert!(!doc.is_modified());
        assert_eq!(doc.to_xml(), before);

        h_ansi_only.apply(doc.run_mut(runs[2]));
        let xml = String::from_utf8(doc.to_xml()).unwrap();
        assert!(
            xml.contains(r#"<w:r><w:rPr><w:rFonts w:hAnsi="Consolas"/></w:rPr><w:t>c</w:t></w:r>"#),
            "{xml}"
        );
    }

    #[test]
    fn test_empty_snapshot() {
        let doc = parse(r#"<w:p><w:r><w:t>plain</w:t></w:r></w:p>"#);
        assert!(RunFormat::capture(doc.run(first_runs(&doc)[0])).is_empty());
    }

    #[test]
    fn test_paragraph_format_round_trip() {
        let mut doc = parse(
            r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/><w:spacing w:before="120" w:after="240" w:line="360" w:lineRule="auto"/><w:ind w:left="720" w:hanging="360"/><w:jc w:val="center"/></w:pPr></w:p><w:p/><w:p><w:r><w:t>t</w:t></w:r></w:p>"#,
        );
        let paras: Vec<_> = doc.body_paragraphs().collect();
        let format = ParagraphFormat::capture(doc.paragraph(paras[0]));
        assert_eq!(format.alignment, Some(ParagraphAlignment::Center));
        assert_eq!(format.left_indent, Some(720));
        assert_eq!(format.first_line_indent, Some(-360));
        assert_eq!(format.space_before, Some(120));
        assert_eq!(format.line_spacing, Some(LineSpacing::OneAndHalf));
        assert_eq!(format.style.as_deref(), Some("Heading1"));

        format.apply(doc.paragraph_mut(paras[2]));
        assert_eq!(ParagraphFormat::capture(doc.paragraph(paras[2])), format);
        let xml = String::from_utf8(doc.to_xml()).unwrap();
        assert!(xml.contains(
            r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/><w:spacing w:before="120" w:after="240" w:line="360" w:lineRule="auto"/><w:ind w:left="720" w:hanging="360"/><w:jc w:val="center"/></w:pPr><w:r><w:t>t</w:t></w:r></w:p>"#
        ));
    }

    #[test]
    fn test_line_spacing_rules() {
        assert_eq!(LineSpacing::from_ooxml("276", None), Some(LineSpacing::Multiple(1.15)));
        assert_eq!(LineSpacing::from_ooxml("300", Some("exact")), Some(LineSpacing::Exact(15.0)));
        assert_eq!(LineSpacing::AtLeast(12.0).to_ooxml(), ("240".to_string(), "atLeast"));
        assert_eq!(LineSpacing::from_ooxml("abc", None), None);
    }

    #[test]
    fn test_cell_format() {
        let mut doc = parse(
            r#"<w:tbl><w:tr><w:tc><w:tcPr><w:tcW w:w="2000" w:type="dxa"/><w:shd w:val="clear" w:fill="D9D9D9"/><w:vAlign w:val="bottom"/></w:tcPr><w:p/></w:tc><w:tc><w:p/></w:tc></w:tr></w:tbl>"#,
        );
        let table = doc.body_tables().next().unwrap();
        let cells: Vec<_> = doc.table(table).cells().collect();
        let format = CellFormat::capture(doc.cell(cells[0]));
        assert_eq!(format.vertical_alignment, Some(CellVerticalAlignment::Bottom));
        assert_eq!(format.background.as_deref(), Some("D9D9D9"));

        format.apply(doc.cell_mut(cells[1]));
        assert_eq!(CellFormat::capture(doc.cell(cells[1])), format);
        let xml = String::from_utf8(doc.to_xml()).unwrap();
        assert!(xml.contains(
            r#"<w:tc><w:tcPr><w:tcW w:w="2000" w:type="dxa"/><w:shd w:val="clear" w:fill="D9D9D9"/><w:vAlign w:val="bottom"/></w:tcPr><w:p/></w:tc></w:tr>"#
        ));
    }
}
