//! Editable property blocks (`w:rPr`, `w:pPr`, `w:tcPr`).
//!
//! A block keeps each child element as it appeared in the source so that
//! untouched children are re-emitted byte for byte. Edited children are
//! regenerated from their attribute list; new children are inserted at the
//! position the WordprocessingML schema sequence requires.
use crate::common::xml::escape_xml;
use phf::phf_map;
use std::ops::Range;

/// Schema sequence of `CT_RPr` children.
static RUN_PROPERTY_ORDER: phf::Map<&'static str, u8> = phf_map! {
    "rStyle" => 0, "rFonts" => 1, "b" => 2, "bCs" => 3, "i" => 4, "iCs" => 5,
    "caps" => 6, "smallCaps" => 7, "strike" => 8, "dstrike" => 9, "outline" => 10,
    "shadow" => 11, "emboss" => 12, "imprint" => 13, "noProof" => 14, "snapToGrid" => 15,
    "vanish" => 16, "webHidden" => 17, "color" => 18, "spacing" => 19, "w" => 20,
    "kern" => 21, "position" => 22, "sz" => 23, "szCs" => 24, "highlight" => 25,
    "u" => 26, "effect" => 27, "bdr" => 28, "shd" => 29, "fitText" => 30,
    "vertAlign" => 31, "rtl" => 32, "cs" => 33, "em" => 34, "lang" => 35,
    "eastAsianLayout" => 36, "specVanish" => 37, "oMath" => 38, "rPrChange" => 39,
};

/// Schema sequence of `CT_PPr` children.
static PARAGRAPH_PROPERTY_ORDER: phf::Map<&'static str, u8> = phf_map! {
    "pStyle" => 0, "keepNext" => 1, "keepLines" => 2, "pageBreakBefore" => 3,
    "framePr" => 4, "widowControl" => 5, "numPr" => 6, "suppressLineNumbers" => 7,
    "pBdr" => 8, "shd" => 9, "tabs" => 10, "suppressAutoHyphens" => 11, "kinsoku" => 12,
    "wordWrap" => 13, "overflowPunct" => 14, "topLinePunct" => 15, "autoSpaceDE" => 16,
    "autoSpaceDN" => 17, "bidi" => 18, "adjustRightInd" => 19, "snapToGrid" => 20,
    "spacing" => 21, "ind" => 22, "contextualSpacing" => 23, "mirrorIndents" => 24,
    "suppressOverlap" => 25, "jc" => 26, "textDirection" => 27, "textAlignment" => 28,
    "textboxTightWrap" => 29, "outlineLvl" => 30, "divId" => 31, "cnfStyle" => 32,
    "rPr" => 33, "sectPr" => 34, "pPrChange" => 35,
};

/// Schema sequence of `CT_TcPr` children.
static CELL_PROPERTY_ORDER: phf::Map<&'static str, u8> = phf_map! {
    "cnfStyle" => 0, "tcW" => 1, "gridSpan" => 2, "hMerge" => 3, "vMerge" => 4,
    "tcBorders" => 5, "shd" => 6, "noWrap" => 7, "tcMar" => 8, "textDirection" => 9,
    "tcFitText" => 10, "vAlign" => 11, "hideMark" => 12, "headers" => 13,
    "cellIns" => 14, "cellDel" => 15, "cellMerge" => 16, "tcPrChange" => 17,
};

/// Which property element a block represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    /// `w:rPr`
    Run,
    /// `w:pPr`
    Paragraph,
    /// `w:tcPr`
    Cell,
}

impl PropertyKind {
    pub fn local_name(self) -> &'static str {
        match self {
            Self::Run => "rPr",
            Self::Paragraph => "pPr",
            Self::Cell => "tcPr",
        }
    }

    /// Position of `child` in the schema sequence; unknown children sort last.
    fn rank(self, child: &str) -> u8 {
        let order = match self {
            Self::Run => &RUN_PROPERTY_ORDER,
            Self::Paragraph => &PARAGRAPH_PROPERTY_ORDER,
            Self::Cell => &CELL_PROPERTY_ORDER,
        };
        order.get(child).copied().unwrap_or(u8::MAX)
    }
}

/// One child element of a property block, such as `<w:sz w:val="24"/>`.
#[derive(Debug, Clone)]
pub struct PropertyChild {
    local: String,
    qname: String,
    attrs: Vec<(String, String)>,
    /// Source text; `None` once the child has been edited or was created.
    raw: Option<String>,
}

impl PropertyChild {
    pub(crate) fn parsed(qname: &str, attrs: Vec<(String, String)>, raw: &str) -> Self {
        Self {
            local: local_part(qname).to_string(),
            qname: qname.to_string(),
            attrs,
            raw: Some(raw.to_string()),
        }
    }

    fn created(prefix: &str, local: &str) -> Self {
        Self {
            local: local.to_string(),
            qname: qualify(prefix, local),
            attrs: Vec::new(),
            raw: None,
        }
    }

    #[inline]
    pub fn local_name(&self) -> &str {
        &self.local
    }

    /// Attribute value by local name, ignoring the namespace prefix.
    pub fn attr(&self, local: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| local_part(key) == local)
            .map(|(_, value)| value.as_str())
    }

    fn set_attr(&mut self, prefix: &str, local: &str, value: &str) {
        match self.attrs.iter_mut().find(|(key, _)| local_part(key) == local) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.attrs.push((qualify(prefix, local), value.to_string())),
        }
        self.raw = None;
    }

    fn remove_attr(&mut self, local: &str) -> bool {
        let before = self.attrs.len();
        self.attrs.retain(|(key, _)| local_part(key) != local);
        let removed = self.attrs.len() != before;
        if removed {
            self.raw = None;
        }
        removed
    }

    fn render(&self, out: &mut String) {
        if let Some(raw) = &self.raw {
            out.push_str(raw);
            return;
        }
        out.push('<');
        out.push_str(&self.qname);
        push_attrs(out, &self.attrs);
        out.push_str("/>");
    }
}

/// An editable `w:rPr`, `w:pPr` or `w:tcPr` element.
///
/// Absent blocks remember where they would be inserted, so the first edit
/// materializes the element in the right place.
#[derive(Debug, Clone)]
pub struct PropertyBlock {
    kind: PropertyKind,
    prefix: String,
    /// Byte range of the element in the source part.
    span: Option<Range<usize>>,
    /// Insertion point used when the element does not exist yet.
    insert_at: Option<usize>,
    attrs: Vec<(String, String)>,
    children: Vec<PropertyChild>,
    dirty: bool,
}

impl PropertyBlock {
    pub(crate) fn absent(kind: PropertyKind, prefix: &str, insert_at: Option<usize>) -> Self {
        Self {
            kind,
            prefix: prefix.to_string(),
            span: None,
            insert_at,
            attrs: Vec::new(),
            children: Vec::new(),
            dirty: false,
        }
    }

    pub(crate) fn parsed(
        kind: PropertyKind,
        prefix: &str,
        span: Range<usize>,
        attrs: Vec<(String, String)>,
        children: Vec<PropertyChild>,
    ) -> Self {
        Self {
            kind,
            prefix: prefix.to_string(),
            span: Some(span),
            insert_at: None,
            attrs,
            children,
            dirty: false,
        }
    }

    /// A detached block, not tied to any source position.
    pub fn new(kind: PropertyKind) -> Self {
        Self::absent(kind, "w", None)
    }

    #[inline]
    pub fn kind(&self) -> PropertyKind {
        self.kind
    }

    /// Whether the element exists in the source or has been given children.
    pub fn is_present(&self) -> bool {
        self.span.is_some() || !self.children.is_empty()
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn children(&self) -> &[PropertyChild] {
        &self.children
    }

    pub fn child(&self, local: &str) -> Option<&PropertyChild> {
        self.children.iter().find(|c| c.local == local)
    }

    /// Attribute `attr` of child `child`, e.g. `attr("sz", "val")`.
    pub fn attr(&self, child: &str, attr: &str) -> Option<&str> {
        self.child(child).and_then(|c| c.attr(attr))
    }

    /// Value of an `ST_OnOff` toggle such as `<w:b/>` or `<w:i w:val="0"/>`.
    pub fn toggle(&self, child: &str) -> Option<bool> {
        let element = self.child(child)?;
        Some(match element.attr("val") {
            None => true,
            Some(val) => !matches!(val, "0" | "false" | "off"),
        })
    }

    /// Set an attribute, creating the child when needed.
    ///
    /// Does nothing when the attribute already holds `value`.
    pub fn set_attr(&mut self, child: &str, attr: &str, value: &str) {
        if self.attr(child, attr) == Some(value) {
            return;
        }
        let prefix = self.prefix.clone();
        self.child_or_insert(child).set_attr(&prefix, attr, value);
        self.dirty = true;
    }

    /// Remove an attribute from a child, if present.
    pub fn remove_attr(&mut self, child: &str, attr: &str) {
        if let Some(element) = self.children.iter_mut().find(|c| c.local == child)
            && element.remove_attr(attr)
        {
            self.dirty = true;
        }
    }

    /// Set a toggle property explicitly on or off.
    pub fn set_toggle(&mut self, child: &str, on: bool) {
        if self.toggle(child) == Some(on) {
            return;
        }
        let prefix = self.prefix.clone();
        let element = self.child_or_insert(child);
        if on {
            element.remove_attr("val");
            element.raw = None;
        } else {
            element.set_attr(&prefix, "val", "0");
        }
        self.dirty = true;
    }

    fn child_or_insert(&mut self, local: &str) -> &mut PropertyChild {
        if let Some(index) = self.children.iter().position(|c| c.local == local) {
            return &mut self.children[index];
        }

        let rank = self.kind.rank(local);
        let index = self
            .children
            .iter()
            .position(|c| self.kind.rank(&c.local) > rank)
            .unwrap_or(self.children.len());
        self.children
            .insert(index, PropertyChild::created(&self.prefix, local));
        &mut self.children[index]
    }

    /// Serialize the whole element.
    pub fn render(&self) -> String {
        let name = qualify(&self.prefix, self.kind.local_name());
        let mut out = String::with_capacity(32 + self.children.len() * 32);
        out.push('<');
        out.push_str(&name);
        push_attrs(&mut out, &self.attrs);
        if self.children.is_empty() {
            out.push_str("/>");
            return out;
        }
        out.push('>');
        for child in &self.children {
            child.render(&mut out);
        }
        out.push_str("</");
        out.push_str(&name);
        out.push('>');
        out
    }

    /// The splice needed to bring the source in line with this block.
    pub(crate) fn edit(&self) -> Option<(Range<usize>, String)> {
        if !self.dirty {
            return None;
        }
        let span = match (&self.span, self.insert_at) {
            (Some(span), _) => span.clone(),
            (None, Some(at)) => at..at,
            (None, None) => return None,
        };
        Some((span, self.render()))
    }
}

fn push_attrs(out: &mut String, attrs: &[(String, String)]) {
    for (key, value) in attrs {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape_xml(value));
        out.push('"');
    }
}

pub(crate) fn local_part(qname: &str) -> &str {
    qname.rsplit_once(':').map_or(qname, |(_, local)| local)
}

pub(crate) fn qualify(prefix: &str, local: &str) -> String {
    if prefix.is_empty() {
        local.to_string()
    } else {
        format!("{prefix}:{local}")
    }
}
