//! Lenient field parsing
//!
//! Host payloads are parsed the forgiving way: numbers stop at the first
//! character that does not belong to them, missing numbers read as zero
//! and a missing delimiter leaves every following field at zero.

use heapless::String;

/// Parse a leading decimal integer, 0 when there is none
///
/// Leading spaces are skipped, an optional sign is accepted and the value
/// saturates instead of overflowing.
pub fn parse_int(text: &str) -> i32 {
    let bytes = text.trim_start_matches(' ').as_bytes();
    let (negative, digits) = match bytes.first() {
        Some(b'-') => (true, &bytes[1..]),
        Some(b'+') => (false, &bytes[1..]),
        _ => (false, bytes),
    };

    let mut value: i32 = 0;
    for &b in digits.iter().take_while(|b| b.is_ascii_digit()) {
        value = value.saturating_mul(10).saturating_add(i32::from(b - b'0'));
    }
    if negative {
        -value
    } else {
        value
    }
}

/// Parse a leading decimal number with an optional fraction, 0.0 when there is none
pub fn parse_float(text: &str) -> f32 {
    let bytes = text.trim_start_matches(' ').as_bytes();
    let (negative, rest) = match bytes.first() {
        Some(b'-') => (true, &bytes[1..]),
        Some(b'+') => (false, &bytes[1..]),
        _ => (false, bytes),
    };

    let mut value = 0.0f32;
    let mut scale = 0.0f32;
    for &b in rest {
        match b {
            b'0'..=b'9' if scale == 0.0 => value = value * 10.0 + f32::from(b - b'0'),
            b'0'..=b'9' => {
                value += f32::from(b - b'0') * scale;
                scale *= 0.1;
            }
            b'.' if scale == 0.0 => scale = 0.1,
            _ => break,
        }
    }
    if negative {
        -value
    } else {
        value
    }
}

/// Copy at most `N` bytes of `text`, never splitting a character
pub fn truncated<const N: usize>(text: &str) -> String<N> {
    let mut out = String::new();
    for ch in text.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}

/// Walks a payload the way the host lays it out
///
/// Reading a field never consumes input; [`skip_past`](Self::skip_past)
/// moves to the character after the next delimiter. Once a delimiter is
/// missing the cursor is exhausted and every further read returns zero.
#[derive(Debug, Clone, Copy)]
pub struct FieldCursor<'a> {
    rest: Option<&'a str>,
}

impl<'a> FieldCursor<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { rest: Some(text) }
    }

    /// Remaining text, `None` once a delimiter was missing
    pub fn rest(&self) -> Option<&'a str> {
        self.rest
    }

    /// Integer at the cursor
    pub fn int(&self) -> i32 {
        self.rest.map_or(0, parse_int)
    }

    /// Float at the cursor
    pub fn float(&self) -> f32 {
        self.rest.map_or(0.0, parse_float)
    }

    /// Move past the next `delimiter`
    pub fn skip_past(&mut self, delimiter: char) -> &mut Self {
        self.rest = self
            .rest
            .and_then(|rest| rest.find(delimiter).map(|i| &rest[i + delimiter.len_utf8()..]));
        self
    }

    /// Take the text up to the next `delimiter` and move past it
    ///
    /// Without a delimiter the whole remainder is returned and the cursor
    /// is exhausted.
    pub fn take_until(&mut self, delimiter: char) -> &'a str {
        match self.rest {
            Some(rest) => match rest.find(delimiter) {
                Some(i) => {
                    self.rest = Some(&rest[i + delimiter.len_utf8()..]);
                    &rest[..i]
                }
                None => {
                    self.rest = None;
                    rest
                }
            },
            None => "",
        }
    }
}
