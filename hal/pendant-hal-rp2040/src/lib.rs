//! RP2040-specific HAL for the pendant firmware
//!
//! The RP2040 has no EEPROM, so the settings store is a RAM image
//! ([`pendant_hal::MemoryStorage`]) persisted to the end of the external
//! flash by [`flash::Rp2040FlashStorage`].

#![no_std]

pub mod flash;

// Re-export shared traits from pendant-hal for convenience
pub use pendant_hal::{FlashStorage as FlashStorageTrait, StorageKey};
