//! Persistent settings storage
//!
//! The pendant keeps its settings in a small byte-addressable store that
//! behaves like an EEPROM: every address holds one byte, reads outside the
//! store return the erased value and writes outside it are ignored.
//!
//! On chips without a real EEPROM the store is a RAM image that a
//! [`FlashStorage`] implementation persists with wear leveling.

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Size of the settings store in bytes
pub const STORAGE_SIZE: usize = 128;

/// Value returned for addresses that were never written or are out of range
pub const ERASED_BYTE: u8 = 0xFF;

/// Errors from typed storage access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageError {
    /// The value does not fit between the address and the end of the store
    OutOfRange,
    /// The value could not be serialized
    Encode,
    /// The stored bytes do not decode to the requested type
    Decode,
}

/// Byte-addressable persistent store
///
/// Writes are durable as soon as they return; there is no commit step.
pub trait ByteStorage {
    /// Number of addressable bytes
    fn capacity(&self) -> usize;

    /// Read one byte, [`ERASED_BYTE`] when `addr` is out of range
    fn read(&self, addr: usize) -> u8;

    /// Write one byte, ignored when `addr` is out of range
    fn write(&mut self, addr: usize, value: u8);

    /// Write one byte only if it differs from the stored value
    fn update(&mut self, addr: usize, value: u8) {
        if self.read(addr) != value {
            self.write(addr, value);
        }
    }
}

/// Typed helpers on top of [`ByteStorage`]
///
/// Values are encoded with postcard so the layout does not depend on the
/// in-memory representation of the struct.
pub trait ByteStorageExt: ByteStorage {
    /// Copy `buf.len()` bytes starting at `addr` into `buf`
    fn read_bytes(&self, addr: usize, buf: &mut [u8]) {
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = self.read(addr + i);
        }
    }

    /// Store `data` at `addr`, touching only bytes that changed
    fn update_bytes(&mut self, addr: usize, data: &[u8]) {
        for (i, &byte) in data.iter().enumerate() {
            self.update(addr + i, byte);
        }
    }

    /// Serialize `value` at `addr`, returning the number of bytes used
    fn put<T: Serialize>(&mut self, addr: usize, value: &T) -> Result<usize, StorageError> {
        let mut buf = [0u8; STORAGE_SIZE];
        let used = postcard::to_slice(value, &mut buf).map_err(|_| StorageError::Encode)?;
        let len = used.len();
        if addr + len > self.capacity() {
            return Err(StorageError::OutOfRange);
        }
        self.update_bytes(addr, &buf[..len]);
        Ok(len)
    }

    /// Deserialize a value stored at `addr`
    fn get<T: DeserializeOwned>(&self, addr: usize) -> Result<T, StorageError> {
        let capacity = self.capacity();
        if addr >= capacity {
            return Err(StorageError::OutOfRange);
        }
        let mut buf = [0u8; STORAGE_SIZE];
        let len = (capacity - addr).min(STORAGE_SIZE);
        self.read_bytes(addr, &mut buf[..len]);
        postcard::from_bytes(&buf[..len]).map_err(|_| StorageError::Decode)
    }
}

impl<S: ByteStorage + ?Sized> ByteStorageExt for S {}

/// RAM-backed store
///
/// Starts fully erased. Tracks whether anything changed since the last
/// [`take_dirty`](Self::take_dirty) so a background task can persist it.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    data: [u8; STORAGE_SIZE],
    dirty: bool,
}

impl MemoryStorage {
    /// Create an erased store
    pub const fn new() -> Self {
        Self {
            data: [ERASED_BYTE; STORAGE_SIZE],
            dirty: false,
        }
    }

    /// Create a store from a previously persisted image
    ///
    /// Missing bytes stay erased; extra bytes are ignored.
    pub fn from_image(image: &[u8]) -> Self {
        let mut storage = Self::new();
        storage.load(image);
        storage
    }

    /// Replace the contents with `image` without marking the store dirty
    pub fn load(&mut self, image: &[u8]) {
        let len = image.len().min(STORAGE_SIZE);
        self.data[..len].copy_from_slice(&image[..len]);
        self.data[len..].fill(ERASED_BYTE);
        self.dirty = false;
    }

    /// Raw image for persistence
    pub fn as_bytes(&self) -> &[u8; STORAGE_SIZE] {
        &self.data
    }

    /// Return and clear the changed flag
    pub fn take_dirty(&mut self) -> bool {
        core::mem::replace(&mut self.dirty, false)
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteStorage for MemoryStorage {
    fn capacity(&self) -> usize {
        STORAGE_SIZE
    }

    fn read(&self, addr: usize) -> u8 {
        self.data.get(addr).copied().unwrap_or(ERASED_BYTE)
    }

    fn write(&mut self, addr: usize, value: u8) {
        if let Some(byte) = self.data.get_mut(addr) {
            *byte = value;
            self.dirty = true;
        }
    }
}

/// Storage keys for data kept in flash
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum StorageKey {
    /// The settings store image
    SettingsImage = 0,
}

impl StorageKey {
    /// Get the key as a byte value
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Create a key from a byte value
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(StorageKey::SettingsImage),
            _ => None,
        }
    }
}

/// Errors from flash storage operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlashError {
    /// Storage operation failed
    Storage,
    /// Key not found
    NotFound,
    /// Buffer too small for the data
    BufferTooSmall,
}

/// Wear-leveled key-value flash storage
///
/// Used to persist the [`MemoryStorage`] image on chips without EEPROM.
pub trait FlashStorage {
    /// Read a value by key into the provided buffer, returning its length
    fn read(
        &mut self,
        key: StorageKey,
        buffer: &mut [u8],
    ) -> impl core::future::Future<Output = Result<usize, FlashError>>;

    /// Write a value by key
    fn write(
        &mut self,
        key: StorageKey,
        data: &[u8],
    ) -> impl core::future::Future<Output = Result<(), FlashError>>;
}

#[cfg(feature = "sequential-storage")]
impl sequential_storage::map::Key for StorageKey {
    fn serialize_into(
        &self,
        buffer: &mut [u8],
    ) -> Result<usize, sequential_storage::map::SerializationError> {
        if buffer.is_empty() {
            return Err(sequential_storage::map::SerializationError::BufferTooSmall);
        }
        buffer[0] = self.as_u8();
        Ok(1)
    }

    fn deserialize_from(
        buffer: &[u8],
    ) -> Result<(Self, usize), sequential_storage::map::SerializationError> {
        if buffer.is_empty() {
            return Err(sequential_storage::map::SerializationError::BufferTooSmall);
        }
        match StorageKey::from_u8(buffer[0]) {
            Some(key) => Ok((key, 1)),
            None => Err(sequential_storage::map::SerializationError::InvalidFormat),
        }
    }
}
