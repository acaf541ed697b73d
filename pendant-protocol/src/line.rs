//! Line framing and flow control
//!
//! Bytes from the host are collected until `\n`. The line buffer holds
//! [`LINE_BUFFER_SIZE`] bytes including the terminator slot, so at most
//! [`MAX_LINE_LEN`] characters are kept; anything after that is dropped
//! until the newline arrives.
//!
//! A bare [`ACK_BYTE`] outside a line means the host filled its transmit
//! window and waits for a credit. The partial line is kept.

use heapless::Vec;

/// Flow control byte, echoed as `0x1F\n`
pub const ACK_BYTE: u8 = 0x1F;

/// Line buffer size in bytes
pub const LINE_BUFFER_SIZE: usize = 128;

/// Longest line that is kept intact
pub const MAX_LINE_LEN: usize = LINE_BUFFER_SIZE - 1;

/// Handshake line, the only line that is not acknowledged
pub const HANDSHAKE_LINE: &[u8] = b"PEN";

/// Something the framer produced
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineEvent {
    /// The host asked for a credit without completing a line
    AckRequest,
    /// A complete line arrived
    Line(Line),
}

/// A complete line without its terminator
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Line {
    bytes: Vec<u8, MAX_LINE_LEN>,
    truncated: bool,
}

impl Line {
    /// Line contents as text
    ///
    /// Stops before the first byte sequence that is not valid UTF-8.
    pub fn as_str(&self) -> &str {
        match core::str::from_utf8(&self.bytes) {
            Ok(text) => text,
            Err(e) => core::str::from_utf8(&self.bytes[..e.valid_up_to()]).unwrap_or_default(),
        }
    }

    /// Raw line bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// True if the host expects an acknowledgement for this line
    pub fn needs_ack(&self) -> bool {
        self.bytes.as_slice() != HANDSHAKE_LINE
    }

    /// True if bytes were dropped because the line was too long
    pub fn was_truncated(&self) -> bool {
        self.truncated
    }
}

/// Byte-fed line framer
#[derive(Debug, Clone, Default)]
pub struct LineParser {
    buffer: Vec<u8, MAX_LINE_LEN>,
    truncated: bool,
}

impl LineParser {
    /// Create a new line parser
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop any partial line
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.truncated = false;
    }

    /// Number of bytes of the partial line
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Feed a single byte to the parser
    ///
    /// Returns an event when the byte completes a line or requests a credit.
    pub fn feed(&mut self, byte: u8) -> Option<LineEvent> {
        match byte {
            ACK_BYTE => Some(LineEvent::AckRequest),
            b'\n' => {
                // Tolerate CRLF hosts
                if self.buffer.last() == Some(&b'\r') {
                    self.buffer.pop();
                }
                let line = Line {
                    bytes: core::mem::take(&mut self.buffer),
                    truncated: core::mem::replace(&mut self.truncated, false),
                };
                Some(LineEvent::Line(line))
            }
            _ => {
                if self.buffer.push(byte).is_err() {
                    self.truncated = true;
                }
                None
            }
        }
    }

    /// Feed bytes until an event is produced
    ///
    /// Returns the event and the number of bytes consumed.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> (Option<LineEvent>, usize) {
        for (i, &byte) in bytes.iter().enumerate() {
            if let Some(event) = self.feed(byte) {
                return (Some(event), i + 1);
            }
        }
        (None, bytes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_of(event: Option<LineEvent>) -> Line {
        match event {
            Some(LineEvent::Line(line)) => line,
            other => panic!("expected line, got {:?}", other),
        }
    }

    #[test]
    fn test_simple_line() {
        let mut parser = LineParser::new();
        let (event, used) = parser.feed_bytes(b"PONG\nSTATUS");
        let line = line_of(event);
        assert_eq!(used, 5);
        assert_eq!(line.as_str(), "PONG");
        assert!(line.needs_ack());
        assert!(!line.was_truncated());
        assert_eq!(parser.pending(), 0);
    }

    #[test]
    fn test_handshake_needs_no_ack() {
        let mut parser = LineParser::new();
        let line = line_of(parser.feed_bytes(b"PEN\n").0);
        assert!(!line.needs_ack());
        let line = line_of(parser.feed_bytes(b"PENX\n").0);
        assert!(line.needs_ack());
    }

    #[test]
    fn test_ack_request_keeps_partial_line() {
        let mut parser = LineParser::new();
        let (event, used) = parser.feed_bytes(b"STAT\x1FUS:9\n");
        assert_eq!(event, Some(LineEvent::AckRequest));
        assert_eq!(used, 5);
        let line = line_of(parser.feed_bytes(b"US:9\n").0);
        assert_eq!(line.as_str(), "STATUS:9");
    }

    #[test]
    fn test_overlong_line_is_truncated() {
        let mut parser = LineParser::new();
        for _ in 0..200 {
            assert_eq!(parser.feed(b'A'), None);
        }
        let line = line_of(parser.feed(b'\n'));
        assert_eq!(line.as_bytes().len(), MAX_LINE_LEN);
        assert!(line.was_truncated());

        // The next line starts clean
        let line = line_of(parser.feed_bytes(b"BYE\n").0);
        assert_eq!(line.as_str(), "BYE");
        assert!(!line.was_truncated());
    }

    #[test]
    fn test_crlf_is_stripped() {
        let mut parser = LineParser::new();
        let line = line_of(parser.feed_bytes(b"BYE\r\n").0);
        assert_eq!(line.as_str(), "BYE");
    }

    #[test]
    fn test_empty_line() {
        let mut parser = LineParser::new();
        let line = line_of(parser.feed(b'\n'));
        assert_eq!(line.as_str(), "");
        assert!(line.needs_ack());
    }

    #[test]
    fn test_invalid_utf8_is_cut() {
        let mut parser = LineParser::new();
        let line = line_of(parser.feed_bytes(b"AB\xFFCD\n").0);
        assert_eq!(line.as_str(), "AB");
        assert_eq!(line.as_bytes(), b"AB\xFFCD");
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_lines_never_exceed_bound(bytes in proptest::collection::vec(any::<u8>(), 0..600)) {
                let mut parser = LineParser::new();
                for byte in bytes {
                    prop_assert!(parser.pending() <= MAX_LINE_LEN);
                    if let Some(LineEvent::Line(line)) = parser.feed(byte) {
                        prop_assert!(line.as_bytes().len() <= MAX_LINE_LEN);
                        prop_assert!(!line.as_bytes().contains(&b'\n'));
                        prop_assert!(!line.as_bytes().contains(&ACK_BYTE));
                    }
                }
            }

            #[test]
            fn test_short_lines_survive_intact(text in "[A-Z0-9:|,.]{0,127}") {
                let mut parser = LineParser::new();
                let mut input = text.clone().into_bytes();
                input.push(b'\n');
                let (event, used) = parser.feed_bytes(&input);
                prop_assert_eq!(used, input.len());
                match event {
                    Some(LineEvent::Line(line)) => {
                        prop_assert_eq!(line.as_str(), text.as_str());
                        prop_assert!(!line.was_truncated());
                    }
                    other => prop_assert!(false, "unexpected {:?}", other),
                }
            }
        }
    }
}
