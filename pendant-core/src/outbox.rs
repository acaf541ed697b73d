//! Outgoing line buffer
//!
//! Screens and the dispatcher queue [`DeviceMessage`]s here during a tick;
//! the orchestrator hands the bytes to the UART once at the end. A message
//! that does not fit is dropped whole and counted.

use heapless::String;
use pendant_protocol::DeviceMessage;

/// Bytes buffered per tick
pub const OUTBOX_SIZE: usize = 512;

#[derive(Debug, Default)]
pub struct Outbox {
    buffer: String<OUTBOX_SIZE>,
    dropped: u16,
}

impl Outbox {
    pub const fn new() -> Self {
        Self {
            buffer: String::new(),
            dropped: 0,
        }
    }

    /// Queue one message, returns false if it was dropped
    pub fn send(&mut self, message: DeviceMessage<'_>) -> bool {
        let queued = match message.to_line() {
            Ok(line) => self.buffer.push_str(&line).is_ok(),
            Err(_) => false,
        };
        if !queued {
            self.dropped = self.dropped.saturating_add(1);
        }
        queued
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.buffer.as_bytes()
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Number of messages dropped since the last call
    pub fn take_dropped(&mut self) -> u16 {
        core::mem::take(&mut self.dropped)
    }
}
