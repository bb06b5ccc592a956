//! Bounded-capacity strings and identifier buffers.
//!
//! [`Text`] is a plain `heapless::String`; the helpers here add truncation
//! that respects UTF-8 boundaries and reports whether anything was cut.
//! [`IdBuf`] never holds a truncated value: a conversion that would overflow
//! leaves it empty.

use crate::error::IdOverflow;
use crate::limits::{ID_CAP, JSON_OUT_CAP};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt::{self, Write};

/// Fixed-capacity UTF-8 text.
pub type Text<const N: usize> = heapless::String<N>;

/// Outbound JSON request body.
pub type JsonBuf = Text<JSON_OUT_CAP>;

/// Identifier buffer sized for Telegram and Discord IDs.
pub type Identifier = IdBuf<ID_CAP>;

/// Largest index `<= idx` that falls on a char boundary of `s`.
pub fn floor_char_boundary(s: &str, idx: usize) -> usize {
    if idx >= s.len() {
        return s.len();
    }
    let mut i = idx;
    while !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Appends as much of `s` as fits. Returns `false` if anything was cut.
pub fn push_truncating<const N: usize>(out: &mut Text<N>, s: &str) -> bool {
    let room = N - out.len();
    let cut = floor_char_boundary(s, room);
    // Cannot fail: `cut` bytes fit by construction.
    let _ = out.push_str(&s[..cut]);
    cut == s.len()
}

/// Replaces the content of `out` with as much of `s` as fits.
pub fn set_truncating<const N: usize>(out: &mut Text<N>, s: &str) -> bool {
    out.clear();
    push_truncating(out, s)
}

/// Copies `s` into a new bounded string, truncating at a char boundary.
pub fn text_truncated<const N: usize>(s: &str) -> Text<N> {
    let mut out = Text::new();
    push_truncating(&mut out, s);
    out
}

/// A sender, chat or message identifier.
///
/// Holds at most `N - 1` bytes, the width of the persisted field. Every
/// assignment is all-or-nothing: on overflow the buffer is cleared and an
/// [`IdOverflow`] is returned, so an empty `IdBuf` always means "unknown".
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct IdBuf<const N: usize> {
    inner: heapless::String<N>,
}

impl<const N: usize> IdBuf<N> {
    pub const fn new() -> Self {
        Self {
            inner: heapless::String::new(),
        }
    }

    /// Longest identifier this buffer accepts.
    pub const fn max_len() -> usize {
        N.saturating_sub(1)
    }

    pub fn parse(s: &str) -> Result<Self, IdOverflow> {
        let mut id = Self::new();
        id.assign_str(s)?;
        Ok(id)
    }

    pub fn from_integer(value: i64) -> Result<Self, IdOverflow> {
        let mut id = Self::new();
        id.assign_integer(value)?;
        Ok(id)
    }

    /// Stores `s`, or clears the buffer if `s` does not fit.
    pub fn assign_str(&mut self, s: &str) -> Result<(), IdOverflow> {
        self.inner.clear();
        if s.len() > Self::max_len() {
            return Err(IdOverflow {
                needed: s.len() + 1,
                capacity: N,
            });
        }
        let _ = self.inner.push_str(s);
        Ok(())
    }

    /// Stores the decimal form of `value`, or clears the buffer on overflow.
    pub fn assign_integer(&mut self, value: i64) -> Result<(), IdOverflow> {
        self.inner.clear();
        let needed = decimal_len(value);
        if needed > Self::max_len() || write!(self.inner, "{value}").is_err() {
            self.inner.clear();
            return Err(IdOverflow {
                needed: needed + 1,
                capacity: N,
            });
        }
        Ok(())
    }

    pub fn as_str(&self) -> &str {
        self.inner.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Snowflake ordering: a longer decimal string is newer; equal lengths
    /// compare lexically. An empty buffer is never newer than anything.
    pub fn is_newer_than(&self, other: &Self) -> bool {
        !self.is_empty() && snowflake_cmp(self.as_str(), other.as_str()) == Ordering::Greater
    }
}

/// Orders decimal ID strings by numeric value without parsing them.
pub fn snowflake_cmp(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn decimal_len(value: i64) -> usize {
    let sign = usize::from(value < 0);
    let mut magnitude = value.unsigned_abs();
    let mut digits = 1;
    while magnitude >= 10 {
        magnitude /= 10;
        digits += 1;
    }
    sign + digits
}

impl<const N: usize> fmt::Display for IdBuf<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<const N: usize> fmt::Debug for IdBuf<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IdBuf({:?})", self.as_str())
    }
}

impl<const N: usize> Serialize for IdBuf<N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de, const N: usize> Deserialize<'de> for IdBuf<N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = heapless::String::<N>::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_ids_round_trip_through_decimal() {
        for value in [0, 7, -42, 123_456_789, i64::MAX, i64::MIN] {
            let id = Identifier::from_integer(value).unwrap();
            assert_eq!(id.as_str().parse::<i64>().unwrap(), value);
        }
    }

    #[test]
    fn integer_overflow_zeroes_buffer() {
        let mut id = IdBuf::<4>::parse("123").unwrap();
        // "1234" needs five bytes with the reserved one.
        let err = id.assign_integer(1234).unwrap_err();
        assert!(id.is_empty());
        assert_eq!(err.capacity, 4);

        // Sign counts toward the width.
        assert!(IdBuf::<4>::from_integer(-123).is_err());
        assert_eq!(IdBuf::<4>::from_integer(-12).unwrap().as_str(), "-12");
    }

    #[test]
    fn string_overflow_zeroes_buffer() {
        let mut id = IdBuf::<8>::parse("abc").unwrap();
        assert!(id.assign_str("12345678").is_err());
        assert!(id.is_empty());
        assert_eq!(IdBuf::<8>::parse("1234567").unwrap().as_str(), "1234567");
    }

    #[test]
    fn snowflake_ordering_prefers_longer_ids() {
        let old = Identifier::parse("999").unwrap();
        let new = Identifier::parse("1000").unwrap();
        assert!(new.is_newer_than(&old));
        assert!(!old.is_newer_than(&new));
        assert!(Identifier::parse("124").unwrap().is_newer_than(&Identifier::parse("123").unwrap()));
        assert!(!Identifier::new().is_newer_than(&old));
        assert!(old.is_newer_than(&Identifier::new()));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let mut out: Text<5> = Text::new();
        assert!(!push_truncating(&mut out, "abcé!"));
        // 'é' is two bytes and would end at byte 5, so it fits exactly.
        assert_eq!(out.as_str(), "abcé");

        let mut out: Text<4> = Text::new();
        assert!(!push_truncating(&mut out, "abcé"));
        assert_eq!(out.as_str(), "abc");
    }

    #[test]
    fn deserialize_rejects_oversized_ids() {
        let ok: IdBuf<4> = serde_json::from_str("\"123\"").unwrap();
        assert_eq!(ok.as_str(), "123");
        assert!(serde_json::from_str::<IdBuf<4>>("\"1234\"").is_err());
    }
}
