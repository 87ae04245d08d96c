/// Vertical text position (superscript/subscript).
///
/// Mirrors the `w:val` of a `<w:vertAlign>` run property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub enum VerticalPosition {
    /// Baseline
    #[default]
    Normal,
    /// Superscript
    Superscript,
    /// Subscript
    Subscript,
}

impl VerticalPosition {
    /// Parse the `w:val` of a `<w:vertAlign>` element.
    ///
    /// Returns `None` for values outside the three known positions.
    pub fn from_ooxml(val: &str) -> Option<Self> {
        match val {
            "baseline" => Some(Self::Normal),
            "superscript" => Some(Self::Superscript),
            "subscript" => Some(Self::Subscript),
            _ => None,
        }
    }

    /// The `w:val` spelling of this position.
    pub fn as_ooxml(&self) -> &'static str {
        match self {
            Self::Normal => "baseline",
            Self::Superscript => "superscript",
            Self::Subscript => "subscript",
        }
    }

    #[inline]
    pub fn is_superscript(&self) -> bool {
        matches!(self, VerticalPosition::Superscript)
    }

    #[inline]
    pub fn is_subscript(&self) -> bool {
        matches!(self, VerticalPosition::Subscript)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ooxml_spelling() {
        for pos in [
            VerticalPosition::Normal,
            VerticalPosition::Superscript,
            VerticalPosition::Subscript,
        ] {
            assert_eq!(VerticalPosition::from_ooxml(pos.as_ooxml()), Some(pos));
        }
        assert_eq!(VerticalPosition::from_ooxml("raised"), None);
    }
}
