//! Pendant Hardware Abstraction Layer
//!
//! This crate defines the narrow interfaces the pendant core talks to.
//! Chip-specific crates implement them; host tests use the in-memory
//! versions provided here.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  pendant-core (screens, input, link)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  pendant-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ pendant-hal-  │       │  host tests   │
//! │    rp2040     │       │ (MemoryStore) │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`storage::ByteStorage`] - Byte-addressable settings store (EEPROM style)
//! - [`storage::FlashStorage`] - Wear-leveled backing store for the image
//! - [`uart::UartTx`], [`uart::UartRx`] - Serial link to the host
//! - [`input::InputHardware`] - Buttons, joystick and hand wheel
//! - [`clock::Clock`] - Monotonic millisecond time

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod clock;
pub mod input;
pub mod storage;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use clock::Clock;
pub use input::InputHardware;
pub use storage::{ByteStorage, ByteStorageExt, FlashStorage, MemoryStorage, StorageKey};
pub use uart::{UartRx, UartTx};
