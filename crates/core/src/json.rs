//! Micro-JSON: field lookup and value decoding straight out of a raw
//! response buffer, without building a parse tree.
//!
//! Positions are byte offsets into the `&str` being scanned. A truncated
//! buffer is handled by slicing: everything stops at the end of the slice,
//! so a value cut off by a full response buffer decodes as far as it goes.

use crate::bounded::Text;

/// How a string value was decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    /// Closing quote found and everything fitted.
    Complete,
    /// The destination filled up before the closing quote.
    Truncated,
    /// The source ended before a closing quote.
    Unterminated,
}

impl Decoded {
    pub fn is_complete(self) -> bool {
        self == Self::Complete
    }
}

/// Result of reading an integer field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonInt {
    Value(i64),
    /// The value is a string; read it with [`read_string`] instead.
    Quoted,
    /// No digits, or out of range.
    Invalid,
}

impl JsonInt {
    /// The number, or 0 for anything else.
    pub fn value_or_zero(self) -> i64 {
        match self {
            Self::Value(v) => v,
            Self::Quoted | Self::Invalid => 0,
        }
    }
}

fn is_ws(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

fn skip_ws(b: &[u8], mut i: usize) -> usize {
    while i < b.len() && is_ws(b[i]) {
        i += 1;
    }
    i
}

/// Index of the quote closing the string that opens at `open`.
fn string_end(b: &[u8], open: usize) -> Option<usize> {
    let mut i = open + 1;
    while i < b.len() {
        match b[i] {
            b'\\' => i += 2,
            b'"' => return Some(i),
            _ => i += 1,
        }
    }
    None
}

/// Finds the first `"key":` anywhere in `src` and returns the offset of its
/// value, past the colon and any whitespace.
///
/// A quoted occurrence not followed by a colon is a value, not a key, and is
/// skipped.
pub fn find(src: &str, key: &str) -> Option<usize> {
    find_from(src, 0, key)
}

/// [`find`] starting at byte offset `from`.
pub fn find_from(src: &str, from: usize, key: &str) -> Option<usize> {
    let b = src.as_bytes();
    let mut start = from;
    while start < src.len() {
        let rel = src.get(start..)?.find(key)?;
        let at = start + rel;
        let end = at + key.len();
        if at > 0 && b[at - 1] == b'"' && b.get(end) == Some(&b'"') {
            let after = skip_ws(b, end + 1);
            if b.get(after) == Some(&b':') {
                return Some(skip_ws(b, after + 1));
            }
        }
        start = end.max(at + 1);
    }
    None
}

/// Finds `"key":` among the direct members of the object starting at
/// `obj` (after optional whitespace). Keys of nested objects are ignored.
pub fn find_member(obj: &str, key: &str) -> Option<usize> {
    let b = obj.as_bytes();
    let mut depth = 0usize;
    let mut i = skip_ws(b, 0);
    if b.get(i) != Some(&b'{') {
        return None;
    }
    while i < b.len() {
        match b[i] {
            b'"' => {
                let end = string_end(b, i)?;
                if depth == 1 {
                    let after = skip_ws(b, end + 1);
                    if b.get(after) == Some(&b':') && &obj[i + 1..end] == key {
                        return Some(skip_ws(b, after + 1));
                    }
                }
                i = end + 1;
            }
            b'{' | b'[' => {
                depth += 1;
                i += 1;
            }
            b'}' | b']' => {
                if depth <= 1 {
                    return None;
                }
                depth -= 1;
                i += 1;
            }
            _ => i += 1,
        }
    }
    None
}

/// Byte offset just past the value starting at `at`.
///
/// Objects and arrays are matched bracket for bracket, skipping strings.
/// A value cut off by the end of `src` ends at `src.len()`.
pub fn value_end(src: &str, at: usize) -> usize {
    let b = src.as_bytes();
    let start = skip_ws(b, at);
    match b.get(start) {
        None => b.len(),
        Some(b'"') => string_end(b, start).map_or(b.len(), |e| e + 1),
        Some(b'{') | Some(b'[') => {
            let mut depth = 0usize;
            let mut i = start;
            while i < b.len() {
                match b[i] {
                    b'"' => match string_end(b, i) {
                        Some(e) => i = e + 1,
                        None => return b.len(),
                    },
                    b'{' | b'[' => {
                        depth += 1;
                        i += 1;
                    }
                    b'}' | b']' => {
                        depth -= 1;
                        i += 1;
                        if depth == 0 {
                            return i;
                        }
                    }
                    _ => i += 1,
                }
            }
            b.len()
        }
        Some(_) => {
            let mut i = start;
            while i < b.len() && !matches!(b[i], b',' | b'}' | b']') && !is_ws(b[i]) {
                i += 1;
            }
            i
        }
    }
}

/// The value starting at `at`, as a sub-slice.
pub fn value_span(src: &str, at: usize) -> &str {
    let start = skip_ws(src.as_bytes(), at).min(src.len());
    &src[start..value_end(src, start)]
}

/// Looks up a direct member of an object and returns its value as a slice.
pub fn member<'a>(obj: &'a str, key: &str) -> Option<&'a str> {
    find_member(obj, key).map(|at| value_span(obj, at))
}

/// Iterates the top-level elements of the array starting at `at`.
///
/// A trailing element cut off by the end of the buffer is still yielded, so
/// callers can read whatever fields survived.
pub fn elements(src: &str, at: usize) -> Elements<'_> {
    let b = src.as_bytes();
    let start = skip_ws(b, at);
    let pos = if b.get(start) == Some(&b'[') {
        start + 1
    } else {
        src.len()
    };
    Elements { src, pos }
}

pub struct Elements<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Iterator for Elements<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let b = self.src.as_bytes();
        let mut i = self.pos;
        while i < b.len() && (is_ws(b[i]) || b[i] == b',') {
            i += 1;
        }
        if i >= b.len() || b[i] == b']' {
            self.pos = b.len();
            return None;
        }
        let end = value_end(self.src, i);
        self.pos = end;
        Some(&self.src[i..end])
    }
}

/// Decodes the string value at `at` into `out`.
///
/// Returns `None` if the value at `at` is not a string. Only `\" \\ \n \r \t`
/// are translated; any other escaped character is kept without its
/// backslash.
pub fn read_string<const N: usize>(src: &str, at: usize, out: &mut Text<N>) -> Option<Decoded> {
    out.clear();
    let start = skip_ws(src.as_bytes(), at);
    let body = src.get(start..)?.strip_prefix('"')?;
    Some(decode(body, out, true))
}

/// Reverses [`escape_into`] for text that is not wrapped in quotes.
pub fn unescape_into<const N: usize>(src: &str, out: &mut Text<N>) -> Decoded {
    out.clear();
    match decode(src, out, false) {
        Decoded::Unterminated => Decoded::Complete,
        other => other,
    }
}

fn decode<const N: usize>(src: &str, out: &mut Text<N>, quoted: bool) -> Decoded {
    let mut chars = src.chars();
    while let Some(c) = chars.next() {
        let decoded = match c {
            '"' if quoted => return Decoded::Complete,
            '\\' => match chars.next() {
                Some('n') => '\n',
                Some('r') => '\r',
                Some('t') => '\t',
                Some(other) => other,
                None => break,
            },
            other => other,
        };
        if out.push(decoded).is_err() {
            return Decoded::Truncated;
        }
    }
    Decoded::Unterminated
}

/// Reads the integer value at `at`. A quoted value reports [`JsonInt::Quoted`].
pub fn read_integer(src: &str, at: usize) -> JsonInt {
    let b = src.as_bytes();
    let mut i = skip_ws(b, at);
    match b.get(i) {
        Some(b'"') => return JsonInt::Quoted,
        None => return JsonInt::Invalid,
        _ => {}
    }
    let negative = b[i] == b'-';
    if negative {
        i += 1;
    }
    let mut value: i64 = 0;
    let mut digits = 0;
    while let Some(d) = b.get(i).filter(|d| d.is_ascii_digit()) {
        let step = value
            .checked_mul(10)
            .and_then(|v| v.checked_add(i64::from(d - b'0')));
        match step {
            Some(v) => value = v,
            None => return JsonInt::Invalid,
        }
        digits += 1;
        i += 1;
    }
    if digits == 0 {
        return JsonInt::Invalid;
    }
    JsonInt::Value(if negative { -value } else { value })
}

/// Reads a literal `true` or `false` at `at`.
pub fn read_bool(src: &str, at: usize) -> Option<bool> {
    let rest = src.get(skip_ws(src.as_bytes(), at)..)?;
    if rest.starts_with("true") {
        Some(true)
    } else if rest.starts_with("false") {
        Some(false)
    } else {
        None
    }
}

fn escape_char(c: char) -> Option<&'static str> {
    match c {
        '"' => Some("\\\""),
        '\\' => Some("\\\\"),
        '\n' => Some("\\n"),
        '\r' => Some("\\r"),
        '\t' => Some("\\t"),
        _ => None,
    }
}

/// Bytes `c` occupies once escaped.
pub fn escaped_char_len(c: char) -> usize {
    escape_char(c).map_or(c.len_utf8(), str::len)
}

/// Bytes `s` occupies once escaped.
pub fn escaped_len(s: &str) -> usize {
    s.chars().map(escaped_char_len).sum()
}

/// Appends the JSON-escaped form of `s` to `out`.
///
/// A character is written only when its whole escape sequence fits. Returns
/// `false` if `s` was cut short.
pub fn escape_into<const N: usize>(s: &str, out: &mut Text<N>) -> bool {
    for c in s.chars() {
        let pushed = match escape_char(c) {
            Some(seq) => {
                if out.len() + seq.len() > N {
                    Err(())
                } else {
                    out.push_str(seq)
                }
            }
            None => out.push(c),
        };
        if pushed.is_err() {
            return false;
        }
    }
    true
}

/// Longest valid UTF-8 prefix of a raw byte buffer.
pub fn text_prefix(buf: &[u8]) -> &str {
    match std::str::from_utf8(buf) {
        Ok(s) => s,
        Err(e) => std::str::from_utf8(&buf[..e.valid_up_to()]).unwrap_or_default(),
    }
}
