//! UART serial communication abstractions
//!
//! The pendant loop never waits on the serial link: incoming bytes are
//! buffered elsewhere (interrupt, task or test script) and polled once per
//! tick, outgoing lines are handed over in one piece.

/// UART transmitter
pub trait UartTx {
    /// Error type for transmit operations
    type Error;

    /// Write data to the UART
    ///
    /// Returns once all bytes are queued or written.
    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Flush any buffered data
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// UART receiver
pub trait UartRx {
    /// Error type for receive operations
    type Error;

    /// Take the next buffered byte, `None` when nothing is pending
    fn try_read_byte(&mut self) -> Result<Option<u8>, Self::Error>;
}

/// Combined UART interface
///
/// For UARTs that provide both TX and RX on a single peripheral.
pub trait Uart: UartTx + UartRx {}

// Blanket implementation
impl<T: UartTx + UartRx> Uart for T {}

/// The longest run of complete lines at the start of `data` that fits in
/// `capacity` bytes
///
/// Transmit queues that cannot take a whole outbox send this prefix and
/// drop the rest, so the host never sees half a line.
pub fn whole_lines(data: &[u8], capacity: usize) -> &[u8] {
    if data.len() <= capacity {
        return data;
    }
    let end = data[..capacity]
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |i| i + 1);
    &data[..end]
}
