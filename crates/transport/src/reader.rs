//! Line and body reads over a [`Connection`], one short poll at a time.
//!
//! The reader keeps a small lookahead buffer so byte-at-a-time consumers
//! (status line, header drain) never swallow body bytes. Every wait is
//! bounded by [`POLL_SLICE`] and by the caller's deadline.

use femtoclaw_core::connection::{Connection, ReadStatus};
use femtoclaw_core::limits::POLL_SLICE;
use std::time::Duration;
use tokio::time::Instant;

const LOOKAHEAD: usize = 512;

/// One step of a byte-wise read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next {
    Byte(u8),
    Closed,
    TimedOut,
}

/// Result of [`ByteReader::read_line`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    /// Bytes stored, excluding the line terminator.
    pub len: usize,
    /// A `\n` was consumed.
    pub terminated: bool,
}

pub struct ByteReader<'c> {
    conn: &'c mut dyn Connection,
    buf: [u8; LOOKAHEAD],
    start: usize,
    end: usize,
    closed: bool,
}

impl<'c> ByteReader<'c> {
    pub fn new(conn: &'c mut dyn Connection) -> Self {
        Self {
            conn,
            buf: [0; LOOKAHEAD],
            start: 0,
            end: 0,
            closed: false,
        }
    }

    /// Waits until at least one byte is buffered. Returns `false` on close
    /// or when `deadline` passes.
    async fn fill(&mut self, deadline: Instant) -> bool {
        while self.start == self.end {
            if self.closed {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let wait = (deadline - now).min(POLL_SLICE);
            match self.conn.read_available(&mut self.buf, wait).await {
                ReadStatus::Data(n) => {
                    self.start = 0;
                    self.end = n;
                }
                ReadStatus::Idle => {}
                ReadStatus::Closed => self.closed = true,
            }
        }
        true
    }

    /// Waits up to `timeout` for the first response byte.
    pub async fn wait_readable(&mut self, timeout: Duration) -> bool {
        self.fill(Instant::now() + timeout).await
    }

    pub async fn next_byte(&mut self, deadline: Instant) -> Next {
        if self.fill(deadline).await {
            let b = self.buf[self.start];
            self.start += 1;
            Next::Byte(b)
        } else if self.closed {
            Next::Closed
        } else {
            Next::TimedOut
        }
    }

    /// Reads up to and including `\n`, storing the line without its
    /// terminator (a trailing `\r` is dropped too).
    ///
    /// Stops early when `out` is full, the peer closes, or `timeout`
    /// elapses; the rest of an over-long line stays unread.
    pub async fn read_line(&mut self, out: &mut [u8], timeout: Duration) -> Line {
        let deadline = Instant::now() + timeout;
        let mut len = 0;
        while len < out.len() {
            match self.next_byte(deadline).await {
                Next::Byte(b'\n') => {
                    if len > 0 && out[len - 1] == b'\r' {
                        len -= 1;
                    }
                    return Line {
                        len,
                        terminated: true,
                    };
                }
                Next::Byte(b) => {
                    out[len] = b;
                    len += 1;
                }
                Next::Closed | Next::TimedOut => break,
            }
        }
        Line {
            len,
            terminated: false,
        }
    }

    /// Reads until `out` is full, the peer closes, or `timeout` elapses.
    /// Returns the number of bytes stored.
    pub async fn read_body(&mut self, out: &mut [u8], timeout: Duration) -> usize {
        let deadline = Instant::now() + timeout;
        let mut len = 0;
        while len < out.len() && self.fill(deadline).await {
            let n = (self.end - self.start).min(out.len() - len);
            out[len..len + n].copy_from_slice(&self.buf[self.start..self.start + n]);
            self.start += n;
            len += n;
        }
        len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::ScriptedConnection;

    async fn connected(conn: &mut ScriptedConnection) {
        conn.connect("example.test", 443).await.unwrap();
    }

    #[tokio::test]
    async fn read_line_strips_crlf_and_keeps_the_rest() {
        let mut conn = ScriptedConnection::new();
        conn.respond_fragments(&[b"HTTP/1.1 2", b"00 OK\r\nrest"]);
        connected(&mut conn).await;
        let mut reader = ByteReader::new(&mut conn);

        let mut line = [0u8; 64];
        let got = reader.read_line(&mut line, Duration::from_secs(1)).await;
        assert!(got.terminated);
        assert_eq!(&line[..got.len], b"HTTP/1.1 200 OK");

        let mut body = [0u8; 64];
        let n = reader.read_body(&mut body, Duration::from_secs(1)).await;
        assert_eq!(&body[..n], b"rest");
    }

    #[tokio::test]
    async fn read_line_stops_at_capacity() {
        let mut conn = ScriptedConnection::new();
        conn.respond("abcdefgh\n");
        connected(&mut conn).await;
        let mut reader = ByteReader::new(&mut conn);

        let mut line = [0u8; 4];
        let got = reader.read_line(&mut line, Duration::from_secs(1)).await;
        assert_eq!(got, Line { len: 4, terminated: false });
        assert_eq!(&line, b"abcd");
        assert_eq!(reader.next_byte(Instant::now() + Duration::from_secs(1)).await, Next::Byte(b'e'));
    }

    #[tokio::test]
    async fn read_body_stops_at_capacity_without_error() {
        let mut conn = ScriptedConnection::new();
        conn.respond(vec![b'x'; 100]);
        connected(&mut conn).await;
        let mut reader = ByteReader::new(&mut conn);

        let mut body = [0u8; 40];
        assert_eq!(reader.read_body(&mut body, Duration::from_secs(1)).await, 40);
    }

    #[tokio::test(start_paused = true)]
    async fn silent_peer_times_out_with_partial_data() {
        let mut conn = ScriptedConnection::new();
        conn.respond_then_hang("partial");
        connected(&mut conn).await;
        let mut reader = ByteReader::new(&mut conn);

        let started = Instant::now();
        let mut body = [0u8; 64];
        let n = reader.read_body(&mut body, Duration::from_secs(3)).await;
        assert_eq!(&body[..n], b"partial");
        assert!(started.elapsed() >= Duration::from_secs(3));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn closed_peer_ends_reads() {
        let mut conn = ScriptedConnection::new();
        conn.respond("x");
        connected(&mut conn).await;
        let mut reader = ByteReader::new(&mut conn);
        let deadline = Instant::now() + Duration::from_secs(1);
        assert_eq!(reader.next_byte(deadline).await, Next::Byte(b'x'));
        assert_eq!(reader.next_byte(deadline).await, Next::Closed);
    }
}
