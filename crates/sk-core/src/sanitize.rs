//! Textual CSS denylist
//!
//! A heuristic filter, not a CSS parser. It removes, case-insensitively and
//! in a single left-to-right pass, every occurrence of:
//!
//! - `position:` followed by optional whitespace and `fixed` or `absolute`
//! - `content:`
//! - `behavior:`
//! - `expression`
//! - `javascript:`
//!
//! Because it works on raw text it also strips harmless matches (for example
//! `align-content: center` loses its `content:`), and removing a token can
//! splice the surrounding text into a new banned token that the same pass
//! does not revisit.

const POSITION_PREFIX: &[u8] = b"position:";
const POSITION_VALUES: [&[u8]; 2] = [b"fixed", b"absolute"];
const BANNED_LITERALS: [&[u8]; 4] = [b"content:", b"behavior:", b"expression", b"javascript:"];

/// Strip every denylisted construct from `raw`.
pub fn sanitize(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = String::with_capacity(raw.len());
    let mut copied_from = 0;
    let mut i = 0;

    while i < bytes.len() {
        match banned_len_at(raw, i) {
            Some(len) => {
                // Matches always start on an ASCII byte, so `i` is a char boundary
                out.push_str(&raw[copied_from..i]);
                i += len;
                copied_from = i;
            }
            None => i += 1,
        }
    }

    out.push_str(&raw[copied_from..]);
    out
}

/// Whether `css` contains no denylisted construct.
pub fn is_clean(css: &str) -> bool {
    (0..css.len()).all(|i| banned_len_at(css, i).is_none())
}

/// Length of the banned construct starting at byte `pos`, if any.
/// Alternatives are tried in denylist order, first match wins.
#[inline]
fn banned_len_at(text: &str, pos: usize) -> Option<usize> {
    let rest = &text.as_bytes()[pos..];

    if starts_with_ignore_case(rest, POSITION_PREFIX) {
        let after_colon = pos + POSITION_PREFIX.len();
        let value_start = after_colon + whitespace_len(&text[after_colon..]);
        let value = &text.as_bytes()[value_start..];
        for candidate in POSITION_VALUES {
            if starts_with_ignore_case(value, candidate) {
                return Some(value_start + candidate.len() - pos);
            }
        }
    }

    BANNED_LITERALS
        .iter()
        .find(|literal| starts_with_ignore_case(rest, literal))
        .map(|literal| literal.len())
}

#[inline]
fn starts_with_ignore_case(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.len() >= needle.len() && haystack[..needle.len()].eq_ignore_ascii_case(needle)
}

/// Byte length of the leading whitespace run (`\s` in a JS regex).
#[inline]
fn whitespace_len(text: &str) -> usize {
    text.char_indices()
        .find(|&(_, c)| !is_css_space(c))
        .map_or(text.len(), |(idx, _)| idx)
}

/// Whitespace as matched by `\s` in the legacy filter: Unicode white space
/// plus U+FEFF, minus U+0085.
#[inline]
fn is_css_space(c: char) -> bool {
    (c.is_whitespace() && c != '\u{85}') || c == '\u{feff}'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_position_fixed() {
        let out = sanitize("position: fixed; color:red;");
        assert_eq!(out, "; color:red;");
        assert!(is_clean(&out));
        assert_eq!(sanitize(&out), out);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(sanitize("POSITION:\tAbsolute;top:0"), ";top:0");
        assert_eq!(sanitize("background: url(JavaScript:alert(1))"), "background: url(alert(1))");
        assert_eq!(sanitize("width: EXPRESSION(1+1)"), "width: (1+1)");
        assert_eq!(sanitize("Behavior: url(x.htc)"), " url(x.htc)");
    }

    #[test]
    fn test_position_whitespace_variants() {
        assert_eq!(sanitize("position:fixed"), "");
        assert_eq!(sanitize("position:   \n fixed!"), "!");
        assert_eq!(sanitize("position:\u{a0}fixed"), "");
        assert_eq!(sanitize("position:\u{feff}fixed"), "");
        // NEL is not a separator for the filter
        assert_eq!(sanitize("position:\u{85}fixed"), "position:\u{85}fixed");
        // Other position values are left alone
        assert_eq!(sanitize("position: relative"), "position: relative");
        assert_eq!(sanitize("position: sticky"), "position: sticky");
    }

    #[test]
    fn test_over_matches_content_property_suffix() {
        assert_eq!(sanitize("align-content: center"), "align- center");
    }

    #[test]
    fn test_non_ascii_input() {
        assert_eq!(
            sanitize("font-family: \"微软雅黑\"; content: \"→\""),
            "font-family: \"微软雅黑\";  \"→\""
        );
        assert!(is_clean("font-family: \"微软雅黑\""));
    }

    #[test]
    fn test_fixed_point_on_typical_inputs() {
        let inputs = [
            "font-size: 16px; line-height: 1.8;",
            "position: fixed; color:red;",
            "color: red; content: 'x'; behavior: url(a)",
            "",
        ];
        for input in inputs {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once, "not a fixed point for {input:?}");
        }
    }

    #[test]
    fn test_single_pass_concatenation_artifact() {
        // Removing the inner token splices a new one that the pass does not revisit
        assert_eq!(sanitize("exprexpressionession"), "expression");
        assert!(!is_clean(&sanitize("exprexpressionession")));
    }
}
