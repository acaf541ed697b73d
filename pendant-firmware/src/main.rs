//! CNC Pendant Firmware
//!
//! Main firmware binary for the RP2040-based pendant. Talks to the host
//! over a line protocol on UART0, drives a 128x64 OLED over I2C and reads
//! ten buttons, an analog joystick and a hand wheel.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::adc::{Adc, Channel as AdcChannel, Config as AdcConfig};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Pull};
use embassy_rp::i2c::{Config as I2cConfig, I2c};
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use embassy_rp::watchdog::{ResetReason, Watchdog};
use embassy_time::{Duration, Instant};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use pendant_core::{LoadOutcome, Pendant, Settings};
use pendant_display::DisplayBackend;
use pendant_hal::storage::{FlashError, ERASED_BYTE, STORAGE_SIZE};
use pendant_hal::{FlashStorage, MemoryStorage, StorageKey};
use pendant_hal_rp2040::flash::Rp2040FlashStorage;
use pendant_protocol::PENDANT_BAUD_RATE;

use crate::board::{BoardInputs, DISPLAY_ADDRESS, DISPLAY_I2C_HZ, WATCHDOG_MS};
use crate::ssd1309::Ssd1309;
use crate::tasks::Renderer;

mod board;
mod channels;
mod encoder;
mod ssd1309;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

// Too large for the task arena, the pendant task borrows it instead
static PENDANT: StaticCell<Pendant<MemoryStorage, Renderer>> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Pendant firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let watchdog = Watchdog::new(p.WATCHDOG);
    let crashed = matches!(watchdog.reset_reason(), Some(ResetReason::TimedOut));

    // Settings image from flash
    let mut flash = Rp2040FlashStorage::new(p.FLASH, p.DMA_CH0);
    let mut storage = load_settings_image(&mut flash).await;
    if crashed {
        warn!("Watchdog reset detected");
        if let Err(e) = Settings::record_crash(&mut storage) {
            warn!("Failed to record crash: {:?}", e);
        }
    }

    // OLED on I2C1
    let mut i2c_config = I2cConfig::default();
    i2c_config.frequency = DISPLAY_I2C_HZ;
    let i2c = I2c::new_blocking(p.I2C1, p.PIN_3, p.PIN_2, i2c_config);
    let mut display = Ssd1309::new(i2c, DISPLAY_ADDRESS);
    match display.init() {
        Ok(()) => info!("OLED initialized"),
        Err(e) => error!("Failed to initialize OLED: {:?}", e),
    }

    // Host link on UART0
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = PENDANT_BAUD_RATE;

    let tx_buf = TX_BUF.init([0u8; 256]);
    let rx_buf = RX_BUF.init([0u8; 256]);

    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (tx, rx) = uart.split();

    info!("UART initialized at {} baud", PENDANT_BAUD_RATE);

    // Buttons 0-7, joystick press, abort
    let buttons = [
        Input::new(p.PIN_6, Pull::Up),
        Input::new(p.PIN_7, Pull::Up),
        Input::new(p.PIN_8, Pull::Up),
        Input::new(p.PIN_9, Pull::Up),
        Input::new(p.PIN_10, Pull::Up),
        Input::new(p.PIN_11, Pull::Up),
        Input::new(p.PIN_12, Pull::Up),
        Input::new(p.PIN_13, Pull::Up),
        Input::new(p.PIN_14, Pull::Up),
        Input::new(p.PIN_15, Pull::Up),
    ];
    let adc = Adc::new_blocking(p.ADC, AdcConfig::default());
    let joystick_x = AdcChannel::new_pin(p.PIN_26, Pull::None);
    let joystick_y = AdcChannel::new_pin(p.PIN_27, Pull::None);
    let inputs = BoardInputs::new(buttons, adc, joystick_x, joystick_y);

    let wheel_a = Input::new(p.PIN_16, Pull::Up);
    let wheel_b = Input::new(p.PIN_17, Pull::Up);

    let now = Instant::now().as_millis() as u32;
    let pendant = match Pendant::new(storage, Renderer::new(), now) {
        Ok(pendant) => pendant,
        Err(e) => {
            warn!("Settings store unusable ({:?}), starting from defaults", e);
            unwrap!(Pendant::new(MemoryStorage::new(), Renderer::new(), now))
        }
    };
    match pendant.load_outcome() {
        LoadOutcome::Stored => info!("Settings loaded"),
        LoadOutcome::Initialized => info!("Settings initialized with defaults"),
    }
    if pendant.recovered_crash() {
        warn!("Previous run ended in a watchdog reset");
    }
    let pendant = PENDANT.init(pendant);

    let mut watchdog = watchdog;
    watchdog.start(Duration::from_millis(WATCHDOG_MS));

    spawner.spawn(tasks::serial_rx_task(rx)).unwrap();
    spawner.spawn(tasks::serial_tx_task(tx)).unwrap();
    spawner.spawn(tasks::wheel_task(wheel_a, wheel_b)).unwrap();
    spawner.spawn(tasks::persist_task(flash)).unwrap();
    spawner
        .spawn(tasks::pendant_task(pendant, inputs, display, watchdog))
        .unwrap();

    info!("All tasks spawned, pendant running");
}

/// Read the persisted settings image, falling back to an erased store
async fn load_settings_image(flash: &mut Rp2040FlashStorage<'_>) -> MemoryStorage {
    let mut image = [ERASED_BYTE; STORAGE_SIZE];
    match flash.read(StorageKey::SettingsImage, &mut image).await {
        Ok(len) => {
            info!("Settings image found ({} bytes)", len);
            MemoryStorage::from_image(&image[..len])
        }
        Err(FlashError::NotFound) => {
            info!("No settings image in flash");
            MemoryStorage::new()
        }
        Err(e) => {
            warn!("Failed to read settings image: {:?}", e);
            MemoryStorage::new()
        }
    }
}
