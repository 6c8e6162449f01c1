//! # Configuration
//! Timing constants and hardware parameters of the alarm clock.

use embassy_time::Duration;

/// Minimum spacing between two dispatched presses of the same button
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(300);

/// Cadence of the alarm scheduler tick
pub const ALARM_TICK_INTERVAL: Duration = Duration::from_secs(30);

/// Earliest trigger point relative to the alarm minute, in minutes
pub const TRIGGER_WINDOW_EARLY_MINUTES: i32 = -5;

/// Latest trigger point relative to the alarm minute, in minutes
pub const TRIGGER_WINDOW_LATE_MINUTES: i32 = 3;

/// Deltas below this are shifted by one day to handle midnight crossover
pub const WRAP_THRESHOLD_MINUTES: i32 = -30;

/// Minutes in one day
pub const MINUTES_PER_DAY: i32 = 24 * 60;

/// After a dismissal the alarm may not be raised again for this long
pub const SUPPRESSION_WINDOW: Duration = Duration::from_secs(600);

/// Time since raising after which the escalation sound starts
pub const ESCALATION_AFTER: Duration = Duration::from_secs(300);

/// Time since raising after which the alarm is dismissed without user input
pub const FORCED_QUIT_AFTER: Duration = Duration::from_secs(600);

/// Number of tokens in the quit challenge
pub const CHALLENGE_LENGTH: usize = 3;

/// Number of LEDs on the neopixel ring
pub const NUM_LEDS: usize = 16;

/// Duration of the sunrise effect that opens the alarm light show
pub const SUNRISE_DURATION: Duration = Duration::from_secs(300);

/// Time between two sunrise frames
pub const SUNRISE_FRAME_INTERVAL: Duration = Duration::from_millis(500);

/// Brightness of the alarm light show
pub const ALARM_BRIGHTNESS: u8 = 100;

/// Brightness of the analog clock on the ring
pub const CLOCK_BRIGHTNESS: u8 = 1;

/// Interval in which the display and the ring clock are refreshed in idle mode
pub const CLOCK_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// Blink period of the edited alarm time in time-setting mode
pub const BLINK_INTERVAL: Duration = Duration::from_millis(500);

/// Capacity of the buffer holding the persisted settings document
pub const SETTINGS_DOCUMENT_CAPACITY: usize = 64;

/// Size of the flash memory in bytes
pub const FLASH_SIZE: usize = 2 * 1024 * 1024;

/// Flash range used by the key/value store for the settings document
pub const SETTINGS_FLASH_RANGE: core::ops::Range<u32> = 0x1F_9000..0x1FC_000;

/// Key of the settings document in the flash key/value store
pub const SETTINGS_KEY: u8 = 0;
