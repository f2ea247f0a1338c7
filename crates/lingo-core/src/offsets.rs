//! Conversion between char offsets and UTF-16 code unit offsets.
//!
//! Surface offsets are Unicode scalar offsets. The DOM speaks UTF-16 in
//! `selectionStart`, `Range::set_start` and `Text::length`, so the browser
//! layer converts at the boundary with these helpers.

/// UTF-16 offset of the char at `char_offset`. Clamps past the end.
pub fn char_to_utf16(text: &str, char_offset: usize) -> usize {
    text.chars().take(char_offset).map(char::len_utf16).sum()
}

/// Char offset containing the UTF-16 offset. Clamps past the end.
///
/// An offset that falls between the two halves of a surrogate pair snaps
/// forward to the following char.
pub fn utf16_to_char(text: &str, utf16_offset: usize) -> usize {
    let mut units = 0;
    for (idx, ch) in text.chars().enumerate() {
        if units >= utf16_offset {
            return idx;
        }
        units += ch.len_utf16();
    }
    text.chars().count()
}

/// Byte offset of the char at `char_offset`. Clamps past the end.
pub fn char_to_byte(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map(|(byte, _)| byte)
        .unwrap_or(text.len())
}

/// Char offset of the byte offset. Bytes inside a char round down.
pub fn byte_to_char(text: &str, byte_offset: usize) -> usize {
    text.char_indices()
        .take_while(|(byte, _)| *byte < byte_offset)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_offsets_match() {
        assert_eq!(char_to_utf16("hello", 3), 3);
        assert_eq!(utf16_to_char("hello", 3), 3);
    }

    #[test]
    fn test_astral_chars() {
        // 🎉 is two UTF-16 units, one char.
        let text = "a🎉b";
        assert_eq!(char_to_utf16(text, 2), 3);
        assert_eq!(utf16_to_char(text, 3), 2);
        assert_eq!(utf16_to_char(text, 2), 2);
        assert_eq!(char_to_utf16(text, 3), 4);
    }

    #[test]
    fn test_clamps_past_end() {
        assert_eq!(char_to_utf16("ab", 10), 2);
        assert_eq!(utf16_to_char("ab", 10), 2);
        assert_eq!(char_to_byte("ab", 10), 2);
    }

    #[test]
    fn test_byte_offsets() {
        let text = "¯\\_(ツ)_/¯";
        assert_eq!(char_to_byte(text, 1), 2);
        assert_eq!(byte_to_char(text, 2), 1);
        assert_eq!(byte_to_char(text, text.len()), text.chars().count());
    }
}
