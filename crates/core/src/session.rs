//! Conversation history packed into one fixed byte region.
//!
//! Each turn is encoded as `role 0x01 content 0x02`. Appending past the
//! capacity drops whole turns from the front, oldest first.

use crate::limits::SESSION_CAP;
use tracing::debug;

const ROLE_END: u8 = 0x01;
const TURN_END: u8 = 0x02;

/// One decoded turn, borrowed from the session buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Turn<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

/// What [`Session::append`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Appended {
    /// Stored, after dropping this many older turns.
    Stored { evicted: usize },
    /// The turn alone exceeds the capacity; the session was cleared and the
    /// turn discarded.
    Cleared,
}

/// Byte-budgeted turn log. Never holds a partial turn.
pub struct Session<const N: usize = SESSION_CAP> {
    buf: [u8; N],
    len: usize,
}

impl<const N: usize> Default for Session<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Session<N> {
    pub const fn new() -> Self {
        Self {
            buf: [0; N],
            len: 0,
        }
    }

    /// Encoded size in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    pub fn append(&mut self, role: &str, content: &str) -> Appended {
        let need = role.len() + content.len() + 2;
        if need > N {
            debug!(need, capacity = N, "Turn larger than session, clearing");
            self.clear();
            return Appended::Cleared;
        }

        let mut evicted = 0;
        while self.len + need > N {
            self.evict_oldest();
            evicted += 1;
        }

        self.push_field(role, ROLE_END);
        self.push_field(content, TURN_END);
        if evicted > 0 {
            debug!(evicted, len = self.len, "Session evicted oldest turns");
        }
        Appended::Stored { evicted }
    }

    fn evict_oldest(&mut self) {
        match self.buf[..self.len].iter().position(|&b| b == TURN_END) {
            Some(end) => {
                self.buf.copy_within(end + 1..self.len, 0);
                self.len -= end + 1;
            }
            None => self.len = 0,
        }
    }

    /// Copies `text` in, replacing separator bytes with spaces.
    fn push_field(&mut self, text: &str, terminator: u8) {
        let dst = &mut self.buf[self.len..self.len + text.len()];
        for (d, &s) in dst.iter_mut().zip(text.as_bytes()) {
            *d = if s == ROLE_END || s == TURN_END { b' ' } else { s };
        }
        self.len += text.len();
        self.buf[self.len] = terminator;
        self.len += 1;
    }

    /// All turns, oldest first.
    pub fn turns(&self) -> Turns<'_> {
        Turns {
            rest: &self.buf[..self.len],
        }
    }

    /// The newest turns whose combined `cost` fits `budget`, oldest first.
    ///
    /// Turns are dropped from the front only, so the result is always a
    /// contiguous suffix of the history.
    pub fn render<F>(&self, budget: usize, cost: F) -> impl Iterator<Item = Turn<'_>>
    where
        F: Fn(&Turn<'_>) -> usize,
    {
        let mut total: usize = self.turns().map(|t| cost(&t)).sum();
        let mut skip = 0;
        for turn in self.turns() {
            if total <= budget {
                break;
            }
            total -= cost(&turn);
            skip += 1;
        }
        self.turns().skip(skip)
    }
}

pub struct Turns<'a> {
    rest: &'a [u8],
}

impl<'a> Iterator for Turns<'a> {
    type Item = Turn<'a>;

    fn next(&mut self) -> Option<Turn<'a>> {
        let end = self.rest.iter().position(|&b| b == TURN_END)?;
        let (turn, rest) = self.rest.split_at(end);
        self.rest = &rest[1..];
        let split = turn.iter().position(|&b| b == ROLE_END).unwrap_or(turn.len());
        let content = turn.get(split + 1..).unwrap_or_default();
        Some(Turn {
            role: std::str::from_utf8(&turn[..split]).unwrap_or_default(),
            content: std::str::from_utf8(content).unwrap_or_default(),
        })
    }
}
