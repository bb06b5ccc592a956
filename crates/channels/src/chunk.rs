//! Splitting replies into platform-sized messages.

use femtoclaw_core::json::escaped_char_len;

/// Splits `text` into pieces of at most `max_chars` characters whose
/// escaped form fits in `max_escaped` bytes.
///
/// Cuts fall on character boundaries only. Empty text yields nothing.
pub fn chunks(text: &str, max_chars: usize, max_escaped: usize) -> Chunks<'_> {
    Chunks {
        rest: text,
        max_chars,
        max_escaped,
    }
}

#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    rest: &'a str,
    max_chars: usize,
    max_escaped: usize,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let mut chars = 0;
        let mut escaped = 0;
        let mut end = 0;
        for (i, c) in self.rest.char_indices() {
            let cost = escaped_char_len(c);
            if chars == self.max_chars || escaped + cost > self.max_escaped {
                break;
            }
            chars += 1;
            escaped += cost;
            end = i + c.len_utf8();
        }
        if end == 0 {
            // Nothing left, or not even one character fits.
            self.rest = "";
            return None;
        }
        let (head, tail) = self.rest.split_at(end);
        self.rest = tail;
        Some(head)
    }
}
