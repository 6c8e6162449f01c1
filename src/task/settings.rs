//! # Settings task
//! This module persists the alarm settings document in the flash memory.
//!
//! The document lives in a RAM mirror the control core reads and writes synchronously. On startup
//! the task loads the mirror from flash once; after that every write to the mirror is stored to
//! flash by the task in the background.
use crate::task::resources::FlashResources;
use core::cell::RefCell;
use defmt::{Debug2Format, info, warn};
use embassy_rp::flash::{Async, Flash};
use embassy_rp::peripherals::FLASH;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use heapless::Vec;
use pico_alarmclock_core::config::{
    FLASH_SIZE, SETTINGS_DOCUMENT_CAPACITY, SETTINGS_FLASH_RANGE, SETTINGS_KEY,
};
use pico_alarmclock_core::error::{Error, Result};
use pico_alarmclock_core::persist::{ByteStorage, RamDocument};
use sequential_storage::cache::NoCache;
use sequential_storage::map::{fetch_item, store_item};

/// The settings document as last read or written
static DOCUMENT: Mutex<CriticalSectionRawMutex, RefCell<RamDocument>> =
    Mutex::new(RefCell::new(RamDocument::new()));

/// Signal for storing the mirror to flash
static FLASH_WRITE_SIGNAL: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Signal for the mirror having been loaded from flash
static SETTINGS_LOADED_SIGNAL: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Waits until the mirror has been loaded from flash
pub async fn wait_for_settings_loaded() {
    SETTINGS_LOADED_SIGNAL.wait().await;
}

/// The RAM mirror of the settings document, as seen by the control core
pub struct FlashMirror;

impl ByteStorage for FlashMirror {
    fn read<'b>(&mut self, buf: &'b mut [u8]) -> Result<Option<&'b [u8]>> {
        DOCUMENT.lock(|doc| doc.borrow_mut().read(buf))
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        DOCUMENT.lock(|doc| doc.borrow_mut().write(bytes))?;
        FLASH_WRITE_SIGNAL.signal(());
        Ok(())
    }
}

/// The flash key/value store holding the document
struct FlashDocument {
    /// The flash peripheral
    flash: Flash<'static, FLASH, Async, { FLASH_SIZE }>,
    /// Scratch buffer for sequential-storage
    data_buffer: [u8; 128],
}

impl FlashDocument {
    /// Read the document into the mirror
    async fn load(&mut self) -> Result<()> {
        let fetched = fetch_item::<u8, &[u8], _>(
            &mut self.flash,
            SETTINGS_FLASH_RANGE,
            &mut NoCache::new(),
            &mut self.data_buffer,
            &SETTINGS_KEY,
        )
        .await
        .map_err(|e| {
            warn!("Failed to read settings document: {:?}", Debug2Format(&e));
            Error::Storage
        })?;
        match fetched {
            Some(bytes) => {
                info!("Settings document read from flash, {} bytes", bytes.len());
                DOCUMENT.lock(|doc| doc.borrow_mut().write(bytes))
            }
            None => {
                info!("No settings document in flash");
                Ok(())
            }
        }
    }

    /// Store the mirror
    async fn store(&mut self) -> Result<()> {
        let mut bytes: Vec<u8, SETTINGS_DOCUMENT_CAPACITY> = Vec::new();
        DOCUMENT
            .lock(|doc| bytes.extend_from_slice(doc.borrow().as_bytes()))
            .map_err(|_| Error::BufferOverflow)?;
        if bytes.is_empty() {
            return Ok(());
        }
        let item: &[u8] = &bytes;
        store_item::<u8, &[u8], _>(
            &mut self.flash,
            SETTINGS_FLASH_RANGE,
            &mut NoCache::new(),
            &mut self.data_buffer,
            &SETTINGS_KEY,
            &item,
        )
        .await
        .map_err(|e| {
            warn!("Failed to store settings document: {:?}", Debug2Format(&e));
            Error::Storage
        })?;
        info!("Settings document stored");
        Ok(())
    }
}

/// Loads the settings on startup, then stores every change.
#[embassy_executor::task]
pub async fn settings_handler(r: FlashResources) {
    info!("Settings task started");
    let mut document = FlashDocument {
        flash: Flash::<_, Async, { FLASH_SIZE }>::new(r.flash, r.dma_ch),
        data_buffer: [0; 128],
    };

    // the core falls back to the default settings if nothing was loaded
    if let Err(e) = document.load().await {
        warn!("Settings not loaded: {}", e);
    }
    SETTINGS_LOADED_SIGNAL.signal(());

    loop {
        FLASH_WRITE_SIGNAL.wait().await;
        if let Err(e) = document.store().await {
            warn!("Settings not stored: {}", e);
        }
    }
}
