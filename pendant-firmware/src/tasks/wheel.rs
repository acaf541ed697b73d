//! Hand wheel task

use core::sync::atomic::Ordering;

use defmt::*;
use embassy_rp::gpio::Input;

use crate::channels::WHEEL_CLICKS;
use crate::encoder::Encoder;

/// Accumulates wheel clicks into [`WHEEL_CLICKS`] until the pendant loop
/// drains them
#[embassy_executor::task]
pub async fn wheel_task(a: Input<'static>, b: Input<'static>) {
    info!("Wheel task started");

    let mut encoder = Encoder::new(a, b);

    loop {
        if let Some(click) = encoder.poll().await {
            WHEEL_CLICKS.fetch_add(click, Ordering::Relaxed);
            trace!("Wheel click {}", click);
        }
    }
}
