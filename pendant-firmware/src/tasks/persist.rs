//! Settings persistence task
//!
//! The settings store is a RAM image. Whenever the pendant loop changes
//! it, the latest image is written to flash here, off the loop's path.

use defmt::*;
use pendant_hal::{FlashStorage, StorageKey};
use pendant_hal_rp2040::flash::Rp2040FlashStorage;

use crate::channels::PERSIST;

#[embassy_executor::task]
pub async fn persist_task(mut flash: Rp2040FlashStorage<'static>) {
    info!("Persist task started");

    loop {
        let image = PERSIST.wait().await;
        match flash.write(StorageKey::SettingsImage, &image).await {
            Ok(()) => debug!("Settings image written"),
            Err(e) => warn!("Failed to write settings image: {:?}", e),
        }
    }
}
