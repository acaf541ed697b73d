//! Board-agnostic core logic for the CNC pendant firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Button debouncing with click / hold detection, joystick quantization
//! - Persisted settings (name, joystick calibration, crash flag)
//! - Host link heartbeat
//! - The ten screens and their dispatcher
//! - The main loop orchestrator, [`Pendant`]

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod context;
pub mod input;
pub mod link;
pub mod outbox;
pub mod pendant;
pub mod screens;
pub mod settings;

pub use context::{Context, Machine};
pub use link::{LinkAction, LinkMonitor};
pub use pendant::{LinkChange, Pendant, PendantError, TickReport};
pub use screens::{ScreenKind, ScreenRequest, Screens};
pub use settings::{LoadOutcome, Settings};
