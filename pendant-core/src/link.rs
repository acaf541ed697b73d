//! Host link health
//!
//! The host announces itself with `STATUS:` lines and leaves with `BYE`.
//! While connected the pendant pings every [`PING_INTERVAL_MS`]; one
//! unanswered ping is tolerated, the second check without a `PONG` drops
//! the link.

use crate::config::PING_INTERVAL_MS;

/// What the heartbeat check wants done
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkAction {
    /// Nothing due
    None,
    /// Send `PING`
    SendPing,
    /// The previous ping went unanswered, the link is down
    Disconnected,
}

/// Connection state and heartbeat bookkeeping
#[derive(Debug, Clone, Default)]
pub struct LinkMonitor {
    connected: bool,
    last_ping: u32,
    last_pong: u32,
    awaiting_pong: bool,
}

impl LinkMonitor {
    pub const fn new() -> Self {
        Self {
            connected: false,
            last_ping: 0,
            last_pong: 0,
            awaiting_pong: false,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Time of the last `PONG`
    pub fn last_pong(&self) -> u32 {
        self.last_pong
    }

    /// `PEN` restarts the heartbeat window
    pub fn handshake(&mut self, now: u32) {
        self.last_ping = now;
        self.last_pong = now;
        self.awaiting_pong = false;
    }

    /// A `STATUS:` line arrived
    ///
    /// Returns true if this connected the link.
    pub fn status_received(&mut self) -> bool {
        !core::mem::replace(&mut self.connected, true)
    }

    /// `BYE`
    ///
    /// Returns true if the link was connected.
    pub fn bye(&mut self) -> bool {
        core::mem::replace(&mut self.connected, false)
    }

    /// `PONG`
    pub fn pong(&mut self, now: u32) {
        self.last_pong = now;
        self.awaiting_pong = false;
    }

    /// Run the heartbeat check
    pub fn check(&mut self, now: u32) -> LinkAction {
        if !self.connected || now.wrapping_sub(self.last_ping) <= PING_INTERVAL_MS {
            return LinkAction::None;
        }
        if self.awaiting_pong {
            self.connected = false;
            self.awaiting_pong = false;
            return LinkAction::Disconnected;
        }
        self.last_ping = now;
        self.awaiting_pong = true;
        LinkAction::SendPing
    }
}
