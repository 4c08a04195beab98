//! HTML entity decoding for cells that passed through an HTML-escaping layer.

use std::borrow::Cow;

/// Longest entity body we look at, `&#x10FFFF;` included.
const MAX_ENTITY_LEN: usize = 10;

/// Decode the named entities HTML escaping produces plus numeric entities.
///
/// Unknown or unterminated entities are kept verbatim. Returns
/// `Cow::Borrowed` when nothing was decoded so callers can tell whether a
/// retry is worthwhile. A single pass only: `&amp;quot;` becomes `&quot;`.
pub fn decode_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    let mut changed = false;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        match decode_one(tail) {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &tail[consumed..];
                changed = true;
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);

    if changed {
        Cow::Owned(out)
    } else {
        Cow::Borrowed(text)
    }
}

/// Decode the entity at the start of `tail` (which begins with `&`).
///
/// Returns the decoded character and the number of bytes consumed.
fn decode_one(tail: &str) -> Option<(char, usize)> {
    let semi = tail
        .char_indices()
        .take(MAX_ENTITY_LEN + 2)
        .find(|(_, c)| *c == ';')
        .map(|(i, _)| i)?;
    let name = &tail[1..semi];

    let ch = match name {
        "amp" => '&',
        "quot" => '"',
        "apos" => '\'',
        "lt" => '<',
        "gt" => '>',
        // Non-breaking spaces would otherwise break JSON between tokens.
        "nbsp" => ' ',
        _ => {
            let digits = name.strip_prefix('#')?;
            let code = match digits.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => digits.parse::<u32>().ok()?,
            };
            char::from_u32(code)?
        }
    };

    Some((ch, semi + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_entities() {
        assert_eq!(
            decode_entities("{&quot;a&quot;:&quot;x &amp; y&quot;}"),
            r#"{"a":"x & y"}"#
        );
        assert_eq!(decode_entities("&lt;b&gt; &apos;q&apos;"), "<b> 'q'");
    }

    #[test]
    fn numeric_entities() {
        assert_eq!(decode_entities("it&#39;s"), "it's");
        assert_eq!(decode_entities("&#x22;hi&#X22;"), "\"hi\"");
        assert_eq!(decode_entities("&#128640;"), "\u{1F680}");
    }

    #[test]
    fn borrowed_when_nothing_changes() {
        assert!(matches!(decode_entities("plain text"), Cow::Borrowed(_)));
        assert!(matches!(decode_entities("fish & chips"), Cow::Borrowed(_)));
        assert!(matches!(decode_entities("&unknown;"), Cow::Borrowed(_)));
    }

    #[test]
    fn unterminated_and_invalid_entities_are_kept() {
        assert_eq!(decode_entities("a &amp b &amp; c"), "a &amp b & c");
        assert_eq!(decode_entities("&#xZZ; &#;"), "&#xZZ; &#;");
        assert_eq!(decode_entities("&#1114112;"), "&#1114112;");
    }

    #[test]
    fn single_pass_only() {
        assert_eq!(decode_entities("&amp;quot;"), "&quot;");
    }

    #[test]
    fn multibyte_text_near_ampersand() {
        assert_eq!(decode_entities("café &amp; crème"), "café & crème");
        assert_eq!(decode_entities("&éééééééééééé"), "&éééééééééééé");
    }
}
