//! # Settings persistence
//! The alarm settings are stored as one small JSON document:
//!
//! ```text
//! {"alarm_time":"HH:MM","alarm_active":true}
//! ```
//!
//! The document is read in full and written in full. Where the bytes live is up to a
//! [`ByteStorage`]: the firmware keeps them in a flash key/value store, tests keep them in RAM.
use crate::board::SettingsStore;
use crate::config::SETTINGS_DOCUMENT_CAPACITY;
use crate::error::{Error, Result};
use crate::state::{AlarmSettings, TimeOfDay};
use heapless::Vec;
use serde::{Deserialize, Serialize};

/// The persisted settings document
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct AlarmDocument<'a> {
    /// Alarm time as `HH:MM`
    pub alarm_time: &'a str,
    /// Whether the alarm is enabled
    pub alarm_active: bool,
}

/// Encode settings into `buf`, returns the number of bytes used
pub fn encode(settings: &AlarmSettings, buf: &mut [u8]) -> Result<usize> {
    let time = settings.time.to_hhmm();
    let doc = AlarmDocument {
        alarm_time: time.as_str(),
        alarm_active: settings.enabled,
    };
    serde_json_core::to_slice(&doc, buf).map_err(|_| Error::BufferOverflow)
}

/// Decode settings from a document
pub fn decode(bytes: &[u8]) -> Result<AlarmSettings> {
    let (doc, _) = serde_json_core::from_slice::<AlarmDocument<'_>>(bytes)
        .map_err(|_| Error::SettingsCorrupt)?;
    Ok(AlarmSettings::new(
        TimeOfDay::parse_hhmm(doc.alarm_time)?,
        doc.alarm_active,
    ))
}

/// Raw storage of the settings document
pub trait ByteStorage {
    /// Read the document into `buf`. `None` if nothing has been stored yet.
    fn read<'b>(&mut self, buf: &'b mut [u8]) -> Result<Option<&'b [u8]>>;
    /// Replace the document
    fn write(&mut self, bytes: &[u8]) -> Result<()>;
}

/// Settings store on top of a [`ByteStorage`]
pub struct DocumentStore<S> {
    /// Where the document lives
    storage: S,
}

impl<S: ByteStorage> DocumentStore<S> {
    /// Create a store on `storage`
    pub const fn new(storage: S) -> Self {
        Self { storage }
    }

    /// The underlying storage
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Mutable access to the underlying storage
    pub const fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }
}

impl<S: ByteStorage> SettingsStore for DocumentStore<S> {
    fn load(&mut self) -> Result<AlarmSettings> {
        let mut buf = [0u8; SETTINGS_DOCUMENT_CAPACITY];
        let bytes = self.storage.read(&mut buf)?.ok_or(Error::SettingsMissing)?;
        decode(bytes)
    }

    fn save(&mut self, settings: &AlarmSettings) -> Result<()> {
        let mut buf = [0u8; SETTINGS_DOCUMENT_CAPACITY];
        // the whole document is rewritten, a corrupt one is replaced
        if let Ok(Some(bytes)) = self.storage.read(&mut buf) {
            if let Ok(stored) = decode(bytes) {
                if stored == *settings {
                    debug!("alarm settings unchanged");
                    return Ok(());
                }
            }
        }
        let len = encode(settings, &mut buf)?;
        self.storage.write(&buf[..len])
    }
}

/// The settings document kept in RAM
#[derive(Debug, Default, Clone)]
pub struct RamDocument {
    /// Document bytes, empty if nothing stored
    bytes: Vec<u8, SETTINGS_DOCUMENT_CAPACITY>,
}

impl RamDocument {
    /// An empty document
    pub const fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    /// The stored bytes, empty if nothing stored
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl ByteStorage for RamDocument {
    fn read<'b>(&mut self, buf: &'b mut [u8]) -> Result<Option<&'b [u8]>> {
        if self.bytes.is_empty() {
            return Ok(None);
        }
        let out = buf
            .get_mut(..self.bytes.len())
            .ok_or(Error::BufferOverflow)?;
        out.copy_from_slice(&self.bytes);
        Ok(Some(out))
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.bytes.clear();
        self.bytes
            .extend_from_slice(bytes)
            .map_err(|_| Error::BufferOverflow)
    }
}
