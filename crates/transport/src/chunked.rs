//! In-place decoding of `Transfer-Encoding: chunked` bodies.

/// Parses a chunk-size line (`1a3f`, `1a3f;ext=x`, optional trailing `\r`).
/// Returns `None` unless the size field is non-empty hexadecimal.
fn chunk_size(line: &[u8]) -> Option<usize> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    let field = line.split(|&b| b == b';').next().unwrap_or(line);
    let field = field.trim_ascii();
    if field.is_empty() || !field.iter().all(u8::is_ascii_hexdigit) {
        return None;
    }
    let mut size: usize = 0;
    for &d in field {
        let digit = (d as char).to_digit(16).unwrap_or(0) as usize;
        size = size.saturating_mul(16).saturating_add(digit);
    }
    Some(size)
}

/// Rewrites a chunk-encoded body in place and returns the decoded length.
///
/// A body that does not open with a valid chunk-size line is taken to be
/// unchunked already and left untouched. A chunk that claims more bytes
/// than remain (the body read hit capacity) is clamped to what is present.
pub fn unchunk_in_place(buf: &mut [u8]) -> usize {
    let len = buf.len();
    let first_line_ok = buf
        .iter()
        .position(|&b| b == b'\n')
        .is_some_and(|nl| chunk_size(&buf[..nl]).is_some());
    if !first_line_ok {
        return len;
    }

    let mut src = 0;
    let mut dst = 0;
    while src < len {
        let Some(nl) = buf[src..].iter().position(|&b| b == b'\n') else {
            break;
        };
        let Some(size) = chunk_size(&buf[src..src + nl]) else {
            break;
        };
        src += nl + 1;
        if size == 0 {
            break;
        }
        let take = size.min(len - src);
        buf.copy_within(src..src + take, dst);
        dst += take;
        src += take;
        if buf.get(src) == Some(&b'\r') {
            src += 1;
        }
        if buf.get(src) == Some(&b'\n') {
            src += 1;
        }
    }
    dst
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(input: &[u8]) -> Vec<u8> {
        let mut buf = input.to_vec();
        let n = unchunk_in_place(&mut buf);
        buf.truncate(n);
        buf
    }

    #[test]
    fn single_chunk() {
        assert_eq!(decode(b"5\r\nhello\r\n0\r\n\r\n"), b"hello");
    }

    #[test]
    fn multiple_chunks_with_extensions_and_hex_sizes() {
        let input = b"4;name=v\r\nWiki\r\n5\r\npedia\r\nE\r\n in\r\n\r\nchunks.\r\n0\r\n\r\n";
        assert_eq!(decode(input), b"Wikipedia in\r\n\r\nchunks.");
    }

    #[test]
    fn non_hex_body_is_unchanged() {
        let body = br#"{"ok":true}"#;
        assert_eq!(decode(body), body);
        // Hex-looking first byte but not a size line.
        assert_eq!(decode(b"deadbeef is not a size\n"), b"deadbeef is not a size\n");
        assert_eq!(decode(b""), b"");
    }

    #[test]
    fn oversized_chunk_is_clamped() {
        assert_eq!(decode(b"ff\r\nshort"), b"short");
        assert_eq!(decode(b"ffffffffffffffffffffff\r\nabc"), b"abc");
    }

    #[test]
    fn missing_terminal_chunk_keeps_decoded_data() {
        assert_eq!(decode(b"3\r\nabc\r\n2\r\nde"), b"abcde");
        assert_eq!(decode(b"3\r\nabc\r\n2"), b"abc");
    }

    #[test]
    fn bare_lf_framing() {
        assert_eq!(decode(b"3\nabc\n0\n\n"), b"abc");
    }
}
