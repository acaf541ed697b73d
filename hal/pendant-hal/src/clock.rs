//! Monotonic time source

/// Millisecond clock
///
/// Wraps after about 49 days; consumers compare with wrapping arithmetic.
pub trait Clock {
    /// Milliseconds since an arbitrary fixed point
    fn now_ms(&self) -> u32;
}
