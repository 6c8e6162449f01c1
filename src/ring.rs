//! # Ring frames
//! Pixel math for the neopixel ring: the analog clock face and color helpers.
use crate::config::NUM_LEDS;
use smart_leds::RGB8;

/// One frame for the whole ring
pub type Frame = [RGB8; NUM_LEDS];

/// A frame with every LED off
pub const DARK: Frame = [RGB8 { r: 0, g: 0, b: 0 }; NUM_LEDS];

/// Colors of the clock hands
pub struct ClockColors {
    /// Red color for hour hand
    pub hour: RGB8,
    /// Green color for minute hand
    pub minute: RGB8,
    /// Blue color for second hand
    pub second: RGB8,
}

impl ClockColors {
    /// Standard red, green and blue hands
    pub const fn new() -> Self {
        Self {
            hour: RGB8 { r: 255, g: 0, b: 0 },
            minute: RGB8 { r: 0, g: 255, b: 0 },
            second: RGB8 { r: 0, g: 0, b: 255 },
        }
    }
}

impl Default for ClockColors {
    fn default() -> Self {
        Self::new()
    }
}

/// Adds two colors, saturating each channel
pub const fn mix_colors(a: RGB8, b: RGB8) -> RGB8 {
    RGB8 {
        r: a.r.saturating_add(b.r),
        g: a.g.saturating_add(b.g),
        b: a.b.saturating_add(b.b),
    }
}

/// Maps a time value (0-59 for minutes and seconds, 1-12 for hours) to an LED index.
///
/// LED 0 of the ring sits at the bottom, so twelve o'clock is half a ring plus one away.
#[allow(clippy::cast_possible_truncation)]
pub fn hand_index(value: u8, max_value: u8) -> usize {
    let leds = NUM_LEDS as u16;
    let value = u16::from(value % max_value);
    ((value * leds / u16::from(max_value) + leds / 2 + 1) % leds) as usize
}

/// The analog clock face for the given time
pub fn analog_clock(hour: u8, minute: u8, second: u8, colors: &ClockColors) -> Frame {
    let mut frame = DARK;
    let hour = if hour % 12 == 0 { 12 } else { hour % 12 };
    let hands = [
        (hand_index(hour, 12), colors.hour),
        (hand_index(minute, 60), colors.minute),
        (hand_index(second, 60), colors.second),
    ];
    // hands on the same LED mix their colors
    for (index, color) in hands {
        frame[index] = mix_colors(frame[index], color);
    }
    frame
}

/// Linear interpolation between two channel values, `step` of `steps`
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn interpolate(start: u8, end: u8, step: u32, steps: u32) -> u8 {
    if steps == 0 || step >= steps {
        return end;
    }
    let delta = i64::from(end) - i64::from(start);
    let value = i64::from(start) + delta * i64::from(step) / i64::from(steps);
    value.clamp(0, 255) as u8
}

/// Linear interpolation between two colors
pub fn interpolate_color(start: RGB8, end: RGB8, step: u32, steps: u32) -> RGB8 {
    RGB8 {
        r: interpolate(start.r, end.r, step, steps),
        g: interpolate(start.g, end.g, step, steps),
        b: interpolate(start.b, end.b, step, steps),
    }
}

/// Number of LEDs lit `step` of `steps` into the sunrise, at least one
#[allow(clippy::cast_possible_truncation)]
pub fn lit_leds(step: u32, steps: u32) -> usize {
    if steps == 0 {
        return NUM_LEDS;
    }
    let lit = u64::from(step) * NUM_LEDS as u64 / u64::from(steps) + 1;
    (lit as usize).clamp(1, NUM_LEDS)
}
