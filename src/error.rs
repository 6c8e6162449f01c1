//! # Errors
//! One error type for the control core.
//!
//! Variants carry only fixed-size data so the type stays `Copy` and cheap to log.

use core::fmt;

/// Top-level error type of the control core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // Settings
    /// No settings document has been stored yet.
    SettingsMissing,

    /// The stored settings document could not be decoded.
    SettingsCorrupt,

    /// A time of day outside 00:00..=23:59 was supplied.
    InvalidTime,

    /// Flash read/write/erase failed.
    Storage,

    /// Buffer too small for the requested operation.
    BufferOverflow,

    // Collaborators
    /// A hardware collaborator failed to carry out a request.
    Collaborator(Collaborator),
}

/// The hardware collaborators the core drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Collaborator {
    /// OLED display
    Display,
    /// DFPlayer sound module
    Sound,
    /// Neopixel ring
    Lights,
}

impl From<Collaborator> for Error {
    fn from(c: Collaborator) -> Self {
        Self::Collaborator(c)
    }
}

impl fmt::Display for Collaborator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Display => "display",
            Self::Sound => "sound",
            Self::Lights => "lights",
        };
        f.write_str(name)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SettingsMissing => f.write_str("no settings stored"),
            Self::SettingsCorrupt => f.write_str("stored settings are corrupt"),
            Self::InvalidTime => f.write_str("time of day out of range"),
            Self::Storage => f.write_str("flash storage failure"),
            Self::BufferOverflow => f.write_str("buffer too small"),
            Self::Collaborator(c) => write!(f, "{c} failed"),
        }
    }
}

impl core::error::Error for Error {}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;
