//! # Board capabilities
//! Narrow interfaces to the hardware collaborators the control core drives.
//!
//! Every call is fire-and-forget from the point of view of the core: implementations hand the
//! request to the task owning the device and return at once. The firmware implements these
//! traits with signals into its tasks, tests implement them with recording fakes.
use crate::error::Result;
use crate::event::Button;
use crate::state::{AlarmSettings, SystemScreen, TimeOfDay};
use embassy_time::Instant;
use rand::RngCore;

/// Monotonic time and wall-clock time of day
pub trait Clock {
    /// Monotonic timestamp
    fn now(&self) -> Instant;
    /// Current wall-clock time of day
    fn time_of_day(&self) -> TimeOfDay;
}

/// The OLED display
pub trait Display {
    /// Show the clock face with the alarm state
    fn show_clock(&mut self, settings: &AlarmSettings);
    /// Show the quit challenge token the user has to press next, `index` is its zero-based
    /// position in the sequence
    fn show_quit_token(&mut self, token: Button, index: usize);
    /// Clear the first text row
    fn clear_first_row(&mut self);
    /// Clear everything below the status row
    fn clear_content_area(&mut self);
    /// Show the alarm state indicator in the status row
    fn show_alarm_state(&mut self, enabled: bool);
    /// Blink `time` while it is being edited
    fn start_blinking(&mut self, time: TimeOfDay);
    /// Stop blinking the edited time
    fn stop_blinking(&mut self);
    /// Start the periodic clock refresh of idle mode
    fn start_clock_refresh(&mut self);
    /// Stop the periodic clock refresh of idle mode
    fn stop_clock_refresh(&mut self);
    /// Show a system menu screen
    fn show_system(&mut self, screen: SystemScreen);
    /// Bring the display back after low power
    fn init(&mut self) -> Result<()> {
        Ok(())
    }
    /// Power the display down
    fn shutdown(&mut self) -> Result<()>;
}

/// The DFPlayer sound module
pub trait Sound {
    /// Start playing the alarm sound
    fn start_alarm_sound(&mut self);
    /// Stop the alarm sound
    fn stop_alarm_sound(&mut self);
    /// Bring the sound module back after low power
    fn init(&mut self) -> Result<()> {
        Ok(())
    }
    /// Power the sound module down
    fn shutdown(&mut self) -> Result<()>;
}

/// The neopixel ring
pub trait Lights {
    /// Turn off every LED, aborting whatever effect is running
    fn all_off(&mut self);
    /// Start rendering the analog clock on the ring
    fn start_clock_render_timer(&mut self);
    /// Stop rendering the analog clock on the ring
    fn stop_clock_render_timer(&mut self);
    /// Whether the analog clock is being rendered
    fn clock_render_timer_running(&self) -> bool;
    /// Start the alarm light show. It runs until it observes the alarm is no longer raised.
    fn start_alarm_show(&mut self);
    /// Bring the ring back after low power
    fn init(&mut self) -> Result<()> {
        Ok(())
    }
    /// Power the ring down
    fn shutdown(&mut self) -> Result<()>;
}

/// System clock speed
pub trait Power {
    /// Full speed, used while an alarm is raised
    fn set_full_speed(&mut self);
    /// Normal speed
    fn set_medium_speed(&mut self);
    /// Low speed, used in low-power mode
    fn set_low_speed(&mut self);
}

/// Persistence of the alarm settings
pub trait SettingsStore {
    /// Read the stored settings
    fn load(&mut self) -> Result<AlarmSettings>;
    /// Store the settings
    fn save(&mut self, settings: &AlarmSettings) -> Result<()>;
}

/// All collaborators of the control core, composed once at startup.
pub trait Board {
    /// Time source
    type Clock: Clock;
    /// OLED display
    type Display: Display;
    /// Sound module
    type Sound: Sound;
    /// Neopixel ring
    type Lights: Lights;
    /// Clock speed control
    type Power: Power;
    /// Settings persistence
    type Settings: SettingsStore;
    /// Randomness for the quit challenge
    type Rng: RngCore;

    /// Time source
    fn clock(&self) -> &Self::Clock;
    /// OLED display
    fn display(&mut self) -> &mut Self::Display;
    /// Sound module
    fn sound(&mut self) -> &mut Self::Sound;
    /// Neopixel ring
    fn lights(&mut self) -> &mut Self::Lights;
    /// Clock speed control
    fn power(&mut self) -> &mut Self::Power;
    /// Settings persistence
    fn settings(&mut self) -> &mut Self::Settings;
    /// Randomness for the quit challenge
    fn rng(&mut self) -> &mut Self::Rng;

    /// Monotonic timestamp
    fn now(&self) -> Instant {
        self.clock().now()
    }
}
