//! Inter-task communication channels
//!
//! Defines the statics shared between the Embassy tasks. The pendant loop
//! is the only consumer of incoming bytes and wheel clicks and the only
//! producer of outgoing bytes and settings images.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::pipe::Pipe;
use embassy_sync::signal::Signal;
use portable_atomic::AtomicI16;

use pendant_hal::storage::STORAGE_SIZE;

/// Bytes from the host waiting for the pendant loop
const RX_CHANNEL_SIZE: usize = 64;

/// Bytes for the host waiting for the UART
const TX_PIPE_SIZE: usize = 512;

/// Bytes received from the host
pub static RX_CHANNEL: Channel<CriticalSectionRawMutex, u8, RX_CHANNEL_SIZE> = Channel::new();

/// Bytes to send to the host
pub static TX_PIPE: Pipe<CriticalSectionRawMutex, TX_PIPE_SIZE> = Pipe::new();

/// Hand wheel clicks not yet seen by the pendant loop
pub static WHEEL_CLICKS: AtomicI16 = AtomicI16::new(0);

/// Settings image to write to flash, latest value wins
pub static PERSIST: Signal<CriticalSectionRawMutex, [u8; STORAGE_SIZE]> = Signal::new();
