use std::fmt;
use std::str::FromStr;

/// RGB color as stored in `w:color`, `w:shd` and similar attributes.
///
/// WordprocessingML spells colors as six hex digits without a leading `#`.
///
/// ```rust
/// use docx_batch::common::RGBColor;
///
/// let red: RGBColor = "FF0000".parse().unwrap();
/// assert_eq!(red, RGBColor::new(255, 0, 0));
/// assert_eq!(red.to_hex(), "FF0000");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub struct RGBColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RGBColor {
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `RRGGBB`, optionally prefixed with `#`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }

        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
        Some(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    /// Uppercase `RRGGBB`, the form Word writes.
    pub fn to_hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl FromStr for RGBColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s).ok_or_else(|| format!("invalid RGB hex color: {s:?}"))
    }
}

impl fmt::Display for RGBColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_parsing() {
        assert_eq!(RGBColor::from_hex("#00ff80"), Some(RGBColor::new(0, 255, 128)));
        assert_eq!(RGBColor::from_hex("auto"), None);
        assert_eq!(RGBColor::from_hex("FFFFFFFF"), None);
        assert_eq!(RGBColor::from_hex("ÄÄÄ"), None);
    }

    #[test]
    fn test_display_uses_hash_prefix() {
        assert_eq!(RGBColor::new(1, 2, 3).to_string(), "#010203");
    }
}
