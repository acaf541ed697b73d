//! Redraw bookkeeping shared by all screens
//!
//! A screen may skip drawing parts whose inputs did not change, but only
//! while nothing in the shared regions changed either. The tracker
//! snapshots what the title bar and the button column depend on and
//! requests a full redraw whenever that snapshot moves or a screen was
//! activated.

use pendant_protocol::MachineStatus;

use crate::context::Context;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SharedState {
    buttons: u16,
    hold: u16,
    down: u16,
    status: MachineStatus,
    progress: i8,
    job_running: bool,
    connected: bool,
}

impl SharedState {
    fn capture(ctx: &Context) -> Self {
        Self {
            buttons: ctx.buttons.state(),
            hold: ctx.buttons.hold_bits(),
            down: ctx.buttons.down_bits(),
            status: ctx.machine.status,
            progress: ctx.machine.progress,
            job_running: ctx.machine.job_running,
            connected: ctx.connected,
        }
    }
}

/// Decides whether the next frame starts from a blank canvas
#[derive(Debug, Clone)]
pub struct FrameTracker {
    last: Option<SharedState>,
    draw_all: bool,
}

impl Default for FrameTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameTracker {
    pub const fn new() -> Self {
        Self {
            last: None,
            draw_all: true,
        }
    }

    /// Force a full redraw on the next frame
    pub fn invalidate(&mut self) {
        self.draw_all = true;
    }

    /// Start a frame, returns true if everything must be redrawn
    pub fn begin(&mut self, ctx: &Context) -> bool {
        let shared = SharedState::capture(ctx);
        let changed = self.last != Some(shared);
        self.last = Some(shared);
        core::mem::replace(&mut self.draw_all, false) || changed
    }
}
