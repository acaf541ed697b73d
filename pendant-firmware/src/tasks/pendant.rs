//! Pendant loop task
//!
//! Runs [`Pendant::tick`] on a fixed period, logs what the tick reports
//! and hands changed settings to the persist task.

use defmt::*;
use embassy_rp::i2c::{Blocking, I2c};
use embassy_rp::peripherals::I2C1;
use embassy_rp::watchdog::Watchdog;
use embassy_time::{Duration, Ticker};

use pendant_core::{Pendant, PendantError, TickReport};
use pendant_display::{DisplayBackend, FlushKind};
use pendant_hal::MemoryStorage;

#[cfg(not(feature = "paged-render"))]
use pendant_display::FullBufferRenderer;
#[cfg(feature = "paged-render")]
use pendant_display::PagedRenderer;

use crate::board::{BoardInputs, EmbassyClock, SerialLink, TICK_MS};
use crate::channels::PERSIST;
use crate::ssd1309::Ssd1309;

/// Frame production strategy for this build
#[cfg(not(feature = "paged-render"))]
pub type Renderer = FullBufferRenderer;
#[cfg(feature = "paged-render")]
pub type Renderer = PagedRenderer;

/// The OLED on I2C1
pub type Display = Ssd1309<I2c<'static, I2C1, Blocking>>;

#[embassy_executor::task]
pub async fn pendant_task(
    pendant: &'static mut Pendant<MemoryStorage, Renderer>,
    mut inputs: BoardInputs,
    mut display: Display,
    mut watchdog: Watchdog,
) {
    info!("Pendant task started");

    let clock = EmbassyClock;
    let mut serial = SerialLink;
    let mut ticker = Ticker::every(Duration::from_millis(TICK_MS));

    loop {
        ticker.next().await;
        watchdog.feed();

        match pendant.tick(&clock, &mut serial, &mut inputs, &mut display) {
            Ok(report) => log_report(&report),
            Err(PendantError::Display(e)) => {
                warn!("Display error: {:?}", e);
                if !display.is_ready() || display.init().is_ok() {
                    pendant.invalidate_display();
                }
            }
            Err(PendantError::Serial) => warn!("Host link overflow, output dropped"),
        }

        if pendant.storage_mut().take_dirty() {
            PERSIST.signal(*pendant.storage().as_bytes());
        }
    }
}

fn log_report(report: &TickReport) {
    if let Some(link) = report.link {
        info!("Host link: {:?}", link);
    }
    if let Some(command) = report.command {
        debug!("Host command: {:?}", command);
    }
    if let Some(screen) = report.screen {
        info!("Screen: {:?}", screen);
    }
    if report.read_failed {
        warn!("Host link read failed");
    }
    if report.truncated {
        warn!("Host line truncated");
    }
    if report.dropped > 0 {
        warn!("Dropped {} outgoing messages", report.dropped);
    }
    if let Some(e) = report.storage_error {
        warn!("Settings not saved: {:?}", e);
    }
    match report.flush {
        Some(FlushKind::None) | None => {}
        Some(kind) => trace!("Flushed {:?}, sent {} bytes", kind, report.sent),
    }
}
