//! Line reading for byte-oriented text.
//!
//! Corpora and queries are not guaranteed to be UTF-8. Invalid sequences
//! decode to U+FFFD and the line is kept.

use std::io::{self, BufRead};

/// Lines of a reader, without their `\n` or `\r\n` terminator.
pub struct LossyLines<R> {
    reader: R,
    buf: Vec<u8>,
}

/// Iterate over the lines of `reader`, decoding each one lossily.
pub fn lossy_lines<R: BufRead>(reader: R) -> LossyLines<R> {
    LossyLines {
        reader,
        buf: Vec::new(),
    }
}

impl<R: BufRead> Iterator for LossyLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                if self.buf.ends_with(b"\n") {
                    self.buf.pop();
                    if self.buf.ends_with(b"\r") {
                        self.buf.pop();
                    }
                }
                Some(Ok(String::from_utf8_lossy(&self.buf).into_owned()))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn collect(bytes: &[u8]) -> Vec<String> {
        lossy_lines(Cursor::new(bytes.to_vec()))
            .collect::<io::Result<_>>()
            .unwrap()
    }

    #[test]
    fn test_invalid_bytes_do_not_end_the_stream() {
        assert_eq!(
            collect(b"the team\ncaf\xe9 soup\nhot soup\n"),
            vec!["the team", "caf\u{fffd} soup", "hot soup"]
        );
    }

    #[test]
    fn test_terminators() {
        assert_eq!(collect(b"a\r\nb\n\nc"), vec!["a", "b", "", "c"]);
        assert!(collect(b"").is_empty());
    }
}
