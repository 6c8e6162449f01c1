//! # Pico alarm clock control core
//! Decides when the alarm fires, how it escalates if nobody reacts, how the user dismisses it
//! with a randomized button sequence, and how the three buttons drive the operating modes.
//!
//! The crate is `no_std` and free of hardware types: the firmware in `main.rs` plugs the RP2040
//! drivers in through the traits in [`board`], tests plug in fakes.
//!
//! - [`input`]: debounces button edges into presses
//! - [`menu`]: the operating mode and what each press does in it
//! - [`alarm`]: raising, escalating and dismissing the alarm
//! - [`light_show`]: the ring animation running while the alarm is raised
//! - [`persist`]: the stored alarm settings document
//! - [`mediator`]: wires it all to one board
#![cfg_attr(not(test), no_std)]

// must come first, the logging macros are used by every other module
#[macro_use]
mod fmt;

pub mod alarm;
pub mod board;
pub mod config;
pub mod error;
pub mod event;
pub mod input;
pub mod light_show;
pub mod mediator;
pub mod menu;
pub mod persist;
pub mod ring;
pub mod state;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
