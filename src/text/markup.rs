//! Removal of simple HTML markup from citation lines.

use once_cell::sync::Lazy;
use quick_xml::escape::resolve_html5_entity;
use regex::{Captures, Regex};

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

static ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(#[0-9]+;?|#[xX][0-9a-fA-F]+;?|[^\t\n\x0C <&#;]{1,32};?)").unwrap()
});

/// Named references that HTML also accepts without the closing `;`.
const LEGACY_ENTITIES: &[&str] = &[
    "AElig", "AMP", "Aacute", "Acirc", "Agrave", "Aring", "Atilde", "Auml", "COPY", "Ccedil",
    "ETH", "Eacute", "Ecirc", "Egrave", "Euml", "GT", "Iacute", "Icirc", "Igrave", "Iuml", "LT",
    "Ntilde", "Oacute", "Ocirc", "Ograve", "Oslash", "Otilde", "Ouml", "QUOT", "REG", "THORN",
    "Uacute", "Ucirc", "Ugrave", "Uuml", "Yacute", "aacute", "acirc", "acute", "aelig", "agrave",
    "amp", "aring", "atilde", "auml", "brvbar", "ccedil", "cedil", "cent", "copy", "curren",
    "deg", "divide", "eacute", "ecirc", "egrave", "eth", "euml", "frac12", "frac14", "frac34",
    "gt", "iacute", "icirc", "iexcl", "igrave", "iquest", "iuml", "laquo", "lt", "macr",
    "micro", "middot", "nbsp", "not", "ntilde", "oacute", "ocirc", "ograve", "ordf", "ordm",
    "oslash", "otilde", "ouml", "para", "plusmn", "pound", "quot", "raquo", "reg", "sect", "shy",
    "sup1", "sup2", "sup3", "szlig", "thorn", "times", "uacute", "ucirc", "ugrave", "uml", "uuml",
    "yacute", "yen", "yuml",
];

/// Remove tags such as `<i>` or `<a href=...>`, decode entities and trim.
pub fn strip_markup(s: &str) -> String {
    let without_tags = TAG.replace_all(s, "");
    decode_entities(&without_tags).trim().to_string()
}

/// Decode named HTML5 entities and numeric character references.
///
/// Numeric references and the legacy names (`&amp`, `&copy`, ...) are also
/// recognized without the closing `;`, and a legacy name may run straight
/// into following text (`&copy2020`). Unknown entities are kept verbatim.
/// Numeric references outside the Unicode range decode to U+FFFD.
pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }

    ENTITY
        .replace_all(s, |caps: &Captures<'_>| {
            let body = &caps[1];
            match body.strip_prefix('#') {
                Some(num) => decode_numeric(num.trim_end_matches(';')),
                None => decode_named(body).unwrap_or_else(|| caps[0].to_string()),
            }
        })
        .into_owned()
}

fn decode_numeric(num: &str) -> String {
    let code = match num.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => num.parse::<u32>().ok(),
    };
    code.and_then(char::from_u32)
        .filter(|c| *c != '\0')
        .unwrap_or('\u{FFFD}')
        .to_string()
}

/// `body` is the name plus an optional trailing `;`.
fn decode_named(body: &str) -> Option<String> {
    if let Some(name) = body.strip_suffix(';') {
        if let Some(resolved) = resolve_html5_entity(name) {
            return Some(resolved.to_string());
        }
    } else if let Some(resolved) = legacy(body) {
        return Some(resolved.to_string());
    }

    // Longest legacy name that prefixes the body, at least two characters.
    let mut ends: Vec<usize> = body.char_indices().map(|(i, _)| i).skip(2).collect();
    ends.reverse();
    ends.into_iter().find_map(|end| {
        legacy(&body[..end]).map(|resolved| format!("{}{}", resolved, &body[end..]))
    })
}

fn legacy(name: &str) -> Option<&'static str> {
    if LEGACY_ENTITIES.contains(&name) {
        resolve_html5_entity(name)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_tags() {
        assert_eq!(
            strip_markup("  <i>Nature</i> <b>12</b>, 3-4 "),
            "Nature 12, 3-4"
        );
        assert_eq!(
            strip_markup(r#"<a href="https://doi.org/x">doi</a>"#),
            "doi"
        );
    }

    #[test]
    fn test_decode_named_entities() {
        assert_eq!(decode_entities("Smith &amp; Jones"), "Smith & Jones");
        assert_eq!(decode_entities("&lt;b&gt;"), "<b>");
        assert_eq!(decode_entities("caf&eacute;"), "café");
    }

    #[test]
    fn test_decode_numeric_entities() {
        assert_eq!(decode_entities("&#65;&#x42;&#X43;"), "ABC");
        assert_eq!(decode_entities("&#1114112;"), "\u{FFFD}");
    }

    #[test]
    fn test_decode_legacy_entities_without_semicolon() {
        assert_eq!(decode_entities("Smith &amp Jones"), "Smith & Jones");
        assert_eq!(decode_entities("&ltb&gt"), "<b>");
        assert_eq!(decode_entities("&copy2020 Elsevier"), "©2020 Elsevier");
        assert_eq!(decode_entities("&notit;"), "¬it;");
        assert_eq!(decode_entities("&#65&#x42"), "AB");
        // only legacy names work without the semicolon
        assert_eq!(decode_entities("caf&eacute"), "café");
        assert_eq!(decode_entities("&hellip x"), "&hellip x");
    }

    #[test]
    fn test_unknown_entity_kept() {
        assert_eq!(decode_entities("a &bogus; b"), "a &bogus; b");
        assert_eq!(decode_entities("R&D"), "R&D");
    }

    #[test]
    fn test_entities_decoded_after_tags() {
        // An escaped tag survives as text.
        assert_eq!(strip_markup("&lt;i&gt;x&lt;/i&gt;"), "<i>x</i>");
    }
}
