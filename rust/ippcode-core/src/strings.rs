//! String helpers: escape decoding and character-indexed access.
//!
//! Indices are counted in Unicode scalar values, not bytes.

/// Replace every `\ddd` (backslash plus exactly three decimal digits) with
/// the character of that code point. Anything else is copied unchanged.
pub fn decode_escapes(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::with_capacity(raw.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '\\' && i + 3 < chars.len() {
            let digits = &chars[i + 1..i + 4];
            if digits.iter().all(|c| c.is_ascii_digit()) {
                let code = digits
                    .iter()
                    .fold(0u32, |acc, c| acc * 10 + c.to_digit(10).unwrap_or(0));
                if let Some(decoded) = char::from_u32(code) {
                    out.push(decoded);
                    i += 4;
                    continue;
                }
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

/// Number of characters in `s`.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Character at `index`, or `None` when the index is negative or past the end.
pub fn char_at(s: &str, index: i64) -> Option<char> {
    let idx = usize::try_from(index).ok()?;
    s.chars().nth(idx)
}

/// Copy of `s` with the character at `index` replaced by `replacement`.
pub fn replace_char(s: &str, index: i64, replacement: char) -> Option<String> {
    let idx = usize::try_from(index).ok()?;
    if idx >= char_len(s) {
        return None;
    }
    Some(
        s.chars()
            .enumerate()
            .map(|(i, c)| if i == idx { replacement } else { c })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_three_digit_escapes() {
        assert_eq!(decode_escapes("ab\\032cd"), "ab cd");
        assert_eq!(decode_escapes("\\035\\092"), "#\\");
        assert_eq!(decode_escapes("line\\010"), "line\n");
    }

    #[test]
    fn leaves_incomplete_escapes_alone() {
        assert_eq!(decode_escapes("a\\03"), "a\\03");
        assert_eq!(decode_escapes("\\x41"), "\\x41");
        assert_eq!(decode_escapes("\\"), "\\");
        assert_eq!(decode_escapes("\\0321"), " 1");
    }

    #[test]
    fn decodes_non_ascii_neighbours() {
        assert_eq!(decode_escapes("ž\\033ř"), "ž!ř");
    }

    #[test]
    fn char_access_counts_scalars() {
        assert_eq!(char_len("příliš"), 6);
        assert_eq!(char_at("příliš", 1), Some('ř'));
        assert_eq!(char_at("abc", 3), None);
        assert_eq!(char_at("abc", -1), None);
    }

    #[test]
    fn replace_within_bounds_only() {
        assert_eq!(replace_char("abc", 1, 'X').as_deref(), Some("aXc"));
        assert_eq!(replace_char("abc", 3, 'X'), None);
        assert_eq!(replace_char("abc", -1, 'X'), None);
    }
}
