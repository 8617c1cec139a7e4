//! Text decoding for capture and DBC files
//!
//! Files are read as raw bytes and decoded as UTF-8 first. When that fails the
//! same bytes are re-decoded as Latin-1, where every byte maps to the code
//! point of equal value, so the fallback itself can never fail.

use crate::types::TextEncoding;

/// Decode file contents as UTF-8, falling back to Latin-1
pub fn decode_text(bytes: Vec<u8>) -> (String, TextEncoding) {
    match String::from_utf8(bytes) {
        Ok(text) => (text, TextEncoding::Utf8),
        Err(e) => {
            log::warn!(
                "UTF-8 decoding failed ({}), trying Latin-1 fallback",
                e.utf8_error()
            );
            let bytes = e.into_bytes();
            (latin1_to_string(&bytes), TextEncoding::Latin1)
        }
    }
}

fn latin1_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Characters that terminate a line, in addition to `\r\n` as a pair
fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r'
            | '\u{0b}'
            | '\u{0c}'
            | '\u{1c}'
            | '\u{1d}'
            | '\u{1e}'
            | '\u{85}'
            | '\u{2028}'
            | '\u{2029}'
    )
}

/// Iterator over the lines of a text, without their terminators
///
/// Splits on every universal line boundary, not only `\n`. A trailing
/// terminator does not produce an empty final line.
pub struct Lines<'a> {
    rest: &'a str,
}

impl<'a> Iterator for Lines<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }

        match self.rest.char_indices().find(|&(_, c)| is_line_break(c)) {
            Some((idx, c)) => {
                let line = &self.rest[..idx];
                let mut end = idx + c.len_utf8();
                if c == '\r' && self.rest[end..].starts_with('\n') {
                    end += 1;
                }
                self.rest = &self.rest[end..];
                Some(line)
            }
            None => {
                let line = self.rest;
                self.rest = "";
                Some(line)
            }
        }
    }
}

/// Split text into lines on universal line boundaries
pub fn split_lines(text: &str) -> Lines<'_> {
    Lines { rest: text }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_is_kept() {
        let (text, encoding) = decode_text("Temp °C".as_bytes().to_vec());
        assert_eq!(text, "Temp °C");
        assert_eq!(encoding, TextEncoding::Utf8);
    }

    #[test]
    fn test_latin1_fallback() {
        // 0xB0 is a lone continuation byte in UTF-8 and '°' in Latin-1
        let (text, encoding) = decode_text(b"Temp \xB0C".to_vec());
        assert_eq!(text, "Temp °C");
        assert_eq!(encoding, TextEncoding::Latin1);
    }

    #[test]
    fn test_split_lines_mixed_terminators() {
        let lines: Vec<&str> = split_lines("a\nb\r\nc\rd\u{85}e\n").collect();
        assert_eq!(lines, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_split_lines_keeps_empty_lines() {
        let lines: Vec<&str> = split_lines("a\n\nb").collect();
        assert_eq!(lines, vec!["a", "", "b"]);
        assert_eq!(split_lines("").count(), 0);
    }
}
