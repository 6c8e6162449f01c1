//! # Alarm light show
//! The background worker that drives the neopixel ring while an alarm is raised: a five minute
//! sunrise, then a repeating cycle of wheel, chase and pendulum effects.
//!
//! The worker never changes the alarm state, it only watches it. Before every frame it checks
//! whether the alarm is still raised and winds down once it is not, so it stops within one frame
//! period of a dismissal. On the way out the ring is turned off.
use crate::config::{ALARM_BRIGHTNESS, NUM_LEDS, SUNRISE_DURATION, SUNRISE_FRAME_INTERVAL};
use crate::ring::{DARK, Frame, interpolate, interpolate_color, lit_leds};
use crate::state::AlarmWatch;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal_async::delay::DelayNs;
use smart_leds::{RGB8, SmartLedsWriteAsync, brightness};

/// Sunrise start color
const SUNRISE_START: RGB8 = RGB8::new(255, 0, 0);
/// Sunrise end color, warm white
const SUNRISE_END: RGB8 = RGB8::new(255, 221, 148);
/// Color of the turning wheel
const WHEEL_COLOR: RGB8 = RGB8::new(255, 255, 255);
/// Colors of the chase effect
const CHASE_COLORS: [RGB8; 5] = [
    RGB8::new(255, 0, 0),
    RGB8::new(0, 255, 0),
    RGB8::new(0, 0, 255),
    RGB8::new(255, 255, 0),
    RGB8::new(0, 255, 255),
];
/// Colors of the pendulum effect
const PENDULUM_COLORS: [RGB8; 3] = [
    RGB8::new(255, 0, 0),
    RGB8::new(0, 255, 0),
    RGB8::new(0, 0, 255),
];

/// The alarm is no longer raised, the show has to end
struct Stopped;

/// Result of one step of the show
type Step = Result<(), Stopped>;

/// The alarm light show on one ring
pub struct AlarmShow<'a, M: RawMutex, L, D> {
    /// Observed alarm state
    watch: AlarmWatch<'a, M>,
    /// The neopixel ring
    ring: L,
    /// Frame pacing
    delay: D,
}

impl<'a, M, L, D> AlarmShow<'a, M, L, D>
where
    M: RawMutex,
    L: SmartLedsWriteAsync<Color = RGB8>,
    D: DelayNs,
{
    /// Create a show for `ring`
    pub const fn new(watch: AlarmWatch<'a, M>, ring: L, delay: D) -> Self {
        Self { watch, ring, delay }
    }

    /// Give the ring back, e.g. to render the clock again
    pub fn into_ring(self) -> L {
        self.ring
    }

    /// Run the show until the alarm is no longer raised, then turn the ring off
    pub async fn run(&mut self) {
        info!("alarm light show started");
        let _ = self.play().await;
        self.write(&DARK, 0).await;
        info!("alarm light show ended");
    }

    /// The show itself, returns once a frame finds the alarm dismissed
    async fn play(&mut self) -> Step {
        self.blank().await?;
        self.sunrise().await?;
        loop {
            self.blank().await?;
            self.turning_wheel(WHEEL_COLOR, 300, 10).await?;
            self.blank().await?;
            self.chase(&CHASE_COLORS, 100, 5).await?;
            self.blank().await?;
            self.pendulum(&PENDULUM_COLORS, 100, 5).await?;
            self.blank().await?;
        }
    }

    /// Show one frame for `hold_ms`, unless the alarm was dismissed
    async fn frame(&mut self, frame: &Frame, level: u8, hold_ms: u32) -> Step {
        if !self.watch.is_raised() {
            return Err(Stopped);
        }
        self.write(frame, level).await;
        self.delay.delay_ms(hold_ms).await;
        Ok(())
    }

    /// Write a frame to the ring
    async fn write(&mut self, frame: &Frame, level: u8) {
        if self
            .ring
            .write(brightness(frame.iter().copied(), level))
            .await
            .is_err()
        {
            warn!("failed to write to the neopixel ring");
        }
    }

    /// All LEDs off
    async fn blank(&mut self) -> Step {
        self.frame(&DARK, 0, 0).await
    }

    /// Red to warm white over five minutes, growing around the ring and getting brighter
    #[allow(clippy::cast_possible_truncation)]
    async fn sunrise(&mut self) -> Step {
        let steps = (SUNRISE_DURATION.as_millis() / SUNRISE_FRAME_INTERVAL.as_millis()) as u32;
        let hold_ms = SUNRISE_FRAME_INTERVAL.as_millis() as u32;
        let mut frame = DARK;
        for step in 0..=steps {
            let color = interpolate_color(SUNRISE_START, SUNRISE_END, step, steps);
            let level = interpolate(ALARM_BRIGHTNESS / 10, ALARM_BRIGHTNESS, step, steps);
            for led in &mut frame[..lit_leds(step, steps)] {
                *led = color;
            }
            self.frame(&frame, level, hold_ms).await?;
        }
        Ok(())
    }

    /// Every other LED lit, alternating
    async fn turning_wheel(&mut self, color: RGB8, hold_ms: u32, loops: usize) -> Step {
        let mut even = DARK;
        let mut odd = DARK;
        for led in even.iter_mut().step_by(2) {
            *led = color;
        }
        for led in odd.iter_mut().skip(1).step_by(2) {
            *led = color;
        }
        self.frame(&even, ALARM_BRIGHTNESS, hold_ms).await?;
        for _ in 0..loops {
            self.frame(&odd, ALARM_BRIGHTNESS, hold_ms).await?;
            self.frame(&even, ALARM_BRIGHTNESS, hold_ms).await?;
        }
        Ok(())
    }

    /// A band of colors running around the ring, leaving a trail
    async fn chase(&mut self, colors: &[RGB8], hold_ms: u32, loops: usize) -> Step {
        let mut frame = DARK;
        for _ in 0..loops {
            for i in 0..NUM_LEDS {
                for (j, color) in colors.iter().enumerate() {
                    frame[(i + j) % NUM_LEDS] = *color;
                }
                self.frame(&frame, ALARM_BRIGHTNESS, hold_ms).await?;
                frame[i] = RGB8::default();
            }
        }
        Ok(())
    }

    /// A band of colors swinging around the ring and back
    async fn pendulum(&mut self, colors: &[RGB8], hold_ms: u32, loops: usize) -> Step {
        for _ in 0..loops {
            for i in (0..NUM_LEDS).chain((0..NUM_LEDS).rev()) {
                let mut frame = DARK;
                for (j, color) in colors.iter().enumerate() {
                    frame[(i + j) % NUM_LEDS] = *color;
                }
                self.frame(&frame, ALARM_BRIGHTNESS, hold_ms).await?;
            }
        }
        Ok(())
    }
}
