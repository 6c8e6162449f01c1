//! Tasks that make up the firmware as well as the resources they use.
pub mod alarm_timer;
pub mod board;
pub mod buttons;
pub mod display;
pub mod light_effects;
pub mod resources;
pub mod settings;
pub mod sound;
