//! Persisted settings
//!
//! One postcard-encoded record at the start of the byte store. A record
//! that does not decode or carries the wrong signature means first boot:
//! defaults are written back immediately.

use heapless::String;
use pendant_hal::storage::{ByteStorage, ByteStorageExt, StorageError};
use pendant_protocol::commands::{CalibrationUpdate, CALIBRATION_LEN, NAME_LEN};
use pendant_protocol::parse::truncated;
use serde::{Deserialize, Serialize};

/// Marks an initialized record
pub const SETTINGS_SIGNATURE: u16 = 37152;

/// Address of the record in the byte store
pub const SETTINGS_ADDRESS: usize = 0;

pub const DEFAULT_NAME: &str = "Controlinator 3000";

/// `[min, dead_low, dead_high, max]` for X then Y
pub const DEFAULT_CALIBRATION: [u16; CALIBRATION_LEN] =
    [0, 512 - 64, 512 + 64, 1023, 0, 512 - 64, 512 + 64, 1023];

/// How [`Settings::load`] obtained its result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LoadOutcome {
    /// A valid record was found
    Stored,
    /// Defaults were written because no valid record existed
    Initialized,
}

/// Settings record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub signature: u16,
    pub calibration: [u16; CALIBRATION_LEN],
    pub name: String<NAME_LEN>,
    /// Set when the previous run ended in a watchdog reset
    pub crash: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            signature: SETTINGS_SIGNATURE,
            calibration: DEFAULT_CALIBRATION,
            name: truncated(DEFAULT_NAME),
            crash: false,
        }
    }
}

impl Settings {
    /// Read the record, writing defaults when it is missing
    pub fn load<S: ByteStorage + ?Sized>(
        storage: &mut S,
    ) -> Result<(Self, LoadOutcome), StorageError> {
        match storage.get::<Settings>(SETTINGS_ADDRESS) {
            Ok(settings) if settings.signature == SETTINGS_SIGNATURE => {
                Ok((settings, LoadOutcome::Stored))
            }
            _ => {
                let settings = Self::default();
                settings.save(storage)?;
                Ok((settings, LoadOutcome::Initialized))
            }
        }
    }

    /// Write the record
    pub fn save<S: ByteStorage + ?Sized>(&self, storage: &mut S) -> Result<(), StorageError> {
        storage.put(SETTINGS_ADDRESS, self).map(|_| ())
    }

    /// Set the crash flag in the stored record
    pub fn record_crash<S: ByteStorage + ?Sized>(storage: &mut S) -> Result<(), StorageError> {
        let (mut settings, _) = Self::load(storage)?;
        settings.crash = true;
        settings.save(storage)
    }

    /// Return the crash flag and clear it
    pub fn take_crash(&mut self) -> bool {
        core::mem::replace(&mut self.crash, false)
    }

    /// Replace the device name, keeping at most [`NAME_LEN`] characters
    pub fn set_name(&mut self, name: &str) {
        self.name = truncated(name);
    }

    /// Apply a `CALIBRATION:` update
    ///
    /// Each axis quadruple is forced to be strictly increasing.
    pub fn apply_calibration(&mut self, update: &CalibrationUpdate) {
        update.apply_to(&mut self.calibration);
        for axis in self.calibration.chunks_mut(4) {
            for i in 1..axis.len() {
                if axis[i] <= axis[i - 1] {
                    axis[i] = axis[i - 1].saturating_add(1);
                }
            }
        }
    }

    /// Calibration of one axis, 0 for X and 1 for Y
    pub fn axis_calibration(&self, axis: usize) -> [u16; 4] {
        let start = axis.min(1) * 4;
        let mut out = [0; 4];
        out.copy_from_slice(&self.calibration[start..start + 4]);
        out
    }
}
