use aho_corasick::AhoCorasick;
use once_cell::sync::Lazy;
use std::borrow::Cow;

// Built once, shared by every worker thread.
static XML_ESCAPER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .build(["&", "<", ">", "\"", "'"])
        .expect("Failed to build XML escaper")
});

/// Escape XML special characters for use in text content or attribute values.
///
/// ```
/// use docx_batch::common::xml::escape_xml;
/// assert_eq!(escape_xml("a & b"), "a &amp; b");
/// assert_eq!(escape_xml("plain"), "plain");
/// ```
#[inline]
pub fn escape_xml(s: &str) -> Cow<'_, str> {
    if !XML_ESCAPER.is_match(s) {
        return Cow::Borrowed(s);
    }
    Cow::Owned(XML_ESCAPER.replace_all(s, &["&amp;", "&lt;", "&gt;", "&quot;", "&apos;"]))
}

/// Resolve the five predefined entities and numeric character references.
///
/// Unknown or malformed references are kept verbatim, matching what a
/// lenient reader would display.
///
/// ```
/// use docx_batch::common::xml::unescape_xml;
/// assert_eq!(unescape_xml("&lt;a &amp; b&gt;"), "<a & b>");
/// assert_eq!(unescape_xml("&#x4E2D;&#25991;"), "中文");
/// assert_eq!(unescape_xml("&invalid;"), "&invalid;");
/// assert_eq!(unescape_xml("&amp"), "&amp");
/// ```
pub fn unescape_xml(s: &str) -> Cow<'_, str> {
    let bytes = s.as_bytes();
    let Some(first) = memchr::memchr(b'&', bytes) else {
        return Cow::Borrowed(s);
    };

    let mut out = String::with_capacity(s.len());
    out.push_str(&s[..first]);
    let mut pos = first;

    while pos < s.len() {
        let rest = &s[pos..];
        if let Some(amp) = memchr::memchr(b'&', rest.as_bytes()) {
            out.push_str(&rest[..amp]);
            let candidate = &rest[amp..];
            match decode_reference(candidate) {
                Some((ch, consumed)) => {
                    out.push(ch);
                    pos += amp + consumed;
                },
                None => {
                    out.push('&');
                    pos += amp + 1;
                },
            }
        } else {
            out.push_str(rest);
            break;
        }
    }

    Cow::Owned(out)
}

/// Decode a reference at the start of `s` (which begins with `&`).
///
/// Returns the character and the number of bytes consumed including `;`.
fn decode_reference(s: &str) -> Option<(char, usize)> {
    // Longest legal reference is `&#x10FFFF;`.
    let window = &s.as_bytes()[..s.len().min(12)];
    let semi = memchr::memchr(b';', window)?;
    let body = &s[1..semi];

    let ch = match body {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        _ => {
            let code = if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok()?
            } else if let Some(dec) = body.strip_prefix('#') {
                dec.parse::<u32>().ok()?
            } else {
                return None;
            };
            char::from_u32(code)?
        },
    };

    Some((ch, semi + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_round_trip_specials() {
        let raw = r#"<Tom & "Jerry's">"#;
        let escaped = escape_xml(raw);
        assert_eq!(escaped, "&lt;Tom &amp; &quot;Jerry&apos;s&quot;&gt;");
        assert_eq!(unescape_xml(&escaped), raw);
    }

    #[test]
    fn test_unescape_borrows_when_clean() {
        assert!(matches!(unescape_xml("no entities"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_unescape_keeps_malformed_references() {
        assert_eq!(unescape_xml("a && b"), "a && b");
        assert_eq!(unescape_xml("&#xZZ;"), "&#xZZ;");
        assert_eq!(unescape_xml("&#xD800;"), "&#xD800;");
        assert_eq!(unescape_xml("tail &"), "tail &");
    }

    #[test]
    fn test_unescape_multibyte_neighbours() {
        assert_eq!(unescape_xml("财务&amp;报告"), "财务&报告");
    }
}
