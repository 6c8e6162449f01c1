//! # State of the system
//! This module describes the data the control core works on: the alarm settings, the operating
//! mode, the quit challenge and the runtime state of a raised alarm.
//!
//! The runtime state is shared between the button path, the scheduler tick and the alarm light
//! show. All of it sits behind one blocking mutex, see [`SharedAlarmState`].
use crate::config::{CHALLENGE_LENGTH, MINUTES_PER_DAY};
use crate::error::{Error, Result};
use crate::event::Button;
use core::cell::RefCell;
use core::fmt::Write;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::Instant;
use heapless::{String, Vec};
use rand::{Rng, RngCore};

/// A wall-clock time of day with minute resolution
#[derive(Debug, Eq, PartialEq, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimeOfDay {
    /// Hour, 0-23
    hour: u8,
    /// Minute, 0-59
    minute: u8,
}

impl TimeOfDay {
    /// Midnight, the default alarm time
    pub const MIDNIGHT: Self = Self { hour: 0, minute: 0 };

    /// Create a time of day, rejecting out-of-range values
    pub const fn new(hour: u8, minute: u8) -> Result<Self> {
        if hour > 23 || minute > 59 {
            return Err(Error::InvalidTime);
        }
        Ok(Self { hour, minute })
    }

    /// Get the hour
    pub const fn hour(self) -> u8 {
        self.hour
    }

    /// Get the minute
    pub const fn minute(self) -> u8 {
        self.minute
    }

    /// Minutes since midnight
    pub const fn minute_of_day(self) -> i32 {
        self.hour as i32 * 60 + self.minute as i32
    }

    /// Increment the hour, wrapping at 24
    pub const fn increment_hour(&mut self) {
        self.hour = (self.hour + 1) % 24;
    }

    /// Increment the minute, wrapping at 60. The hour is left alone.
    pub const fn increment_minute(&mut self) {
        self.minute = (self.minute + 1) % 60;
    }

    /// Signed distance in minutes from `alarm` to `self`, normalized for midnight crossover.
    ///
    /// Deltas below -30 minutes are shifted by one day, so a clock at 00:02 is 3 minutes past
    /// an alarm at 23:59.
    pub const fn minutes_since(self, alarm: Self) -> i32 {
        let delta = self.minute_of_day() - alarm.minute_of_day();
        if delta < crate::config::WRAP_THRESHOLD_MINUTES {
            delta + MINUTES_PER_DAY
        } else {
            delta
        }
    }

    /// Format as `HH:MM`
    pub fn to_hhmm(self) -> String<5> {
        let mut s = String::new();
        // five characters always fit
        let _ = write!(s, "{:02}:{:02}", self.hour, self.minute);
        s
    }

    /// Parse `HH:MM`. Anything else, including out-of-range fields, is a corrupt setting.
    pub fn parse_hhmm(s: &str) -> Result<Self> {
        let bytes = s.as_bytes();
        if bytes.len() != 5 || bytes[2] != b':' {
            return Err(Error::SettingsCorrupt);
        }
        let hour = parse_two_digits(&bytes[0..2])?;
        let minute = parse_two_digits(&bytes[3..5])?;
        Self::new(hour, minute).map_err(|_| Error::SettingsCorrupt)
    }
}

/// Parse exactly two ASCII digits
fn parse_two_digits(bytes: &[u8]) -> Result<u8> {
    let mut value = 0u8;
    for b in bytes {
        if !b.is_ascii_digit() {
            return Err(Error::SettingsCorrupt);
        }
        value = value * 10 + (b - b'0');
    }
    Ok(value)
}

/// The settings for the alarm. Persisted across power cycles.
#[derive(Debug, Eq, PartialEq, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AlarmSettings {
    /// The alarm time
    pub time: TimeOfDay,
    /// The alarm is enabled or disabled
    pub enabled: bool,
}

impl AlarmSettings {
    /// Create new settings
    pub const fn new(time: TimeOfDay, enabled: bool) -> Self {
        Self { time, enabled }
    }
}

/// The operating mode of the device. Changed only by button presses and by the alarm
/// scheduler raising or dismissing an alarm, never by the clock alone.
#[derive(Debug, Eq, PartialEq, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Showing the time and the alarm state
    #[default]
    Idle,
    /// Editing the alarm time
    TimeSetting,
    /// The alarm is ringing, button presses go to the quit challenge
    AlarmRaised,
    /// The system menu
    System(SystemScreen),
}

/// Screens of the system menu
#[derive(Debug, Eq, PartialEq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SystemScreen {
    /// Choose between info and shutdown
    Select,
    /// System information
    Info,
    /// Confirm going to low power
    Shutdown,
}

/// Result of submitting a token to the quit challenge
#[derive(Debug, Eq, PartialEq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChallengeStep {
    /// Token did not match, or there was nothing left to match. Nothing changed.
    Ignored,
    /// Token matched, the next one is expected at the given position
    Advanced {
        /// The token expected next
        next: Button,
        /// Zero-based position of `next` in the full sequence
        index: usize,
    },
    /// Token matched and it was the last one
    Completed,
}

/// The randomized sequence of buttons that dismisses a raised alarm.
///
/// Holds the tokens still to be pressed, head first.
#[derive(Debug, Eq, PartialEq, Clone, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct QuitChallenge {
    /// Remaining tokens, head first
    remaining: Vec<Button, CHALLENGE_LENGTH>,
}

impl QuitChallenge {
    /// An empty challenge
    pub const fn empty() -> Self {
        Self {
            remaining: Vec::new(),
        }
    }

    /// Draw all three buttons without replacement, giving a fresh permutation.
    pub fn generate<R: RngCore + ?Sized>(rng: &mut R) -> Self {
        let mut pool = Button::ALL;
        let mut left = pool.len();
        let mut remaining = Vec::new();
        while left > 0 {
            let i = rng.gen_range(0..left);
            // capacity equals the pool size
            let _ = remaining.push(pool[i]);
            pool.swap(i, left - 1);
            left -= 1;
        }
        Self { remaining }
    }

    /// Build a challenge from a fixed sequence
    pub fn from_tokens(tokens: &[Button]) -> Result<Self> {
        Ok(Self {
            remaining: Vec::from_slice(tokens).map_err(|_| Error::BufferOverflow)?,
        })
    }

    /// The token expected next
    pub fn head(&self) -> Option<Button> {
        self.remaining.first().copied()
    }

    /// Zero-based position of the head in the full sequence
    pub fn head_index(&self) -> usize {
        CHALLENGE_LENGTH.saturating_sub(self.remaining.len())
    }

    /// Tokens still to be pressed
    pub fn remaining(&self) -> &[Button] {
        &self.remaining
    }

    /// Whether all tokens have been pressed
    pub fn is_empty(&self) -> bool {
        self.remaining.is_empty()
    }

    /// Pop the head if it equals `token`
    pub fn submit(&mut self, token: Button) -> ChallengeStep {
        if self.head() != Some(token) {
            return ChallengeStep::Ignored;
        }
        self.remaining.remove(0);
        match self.head() {
            Some(next) => ChallengeStep::Advanced {
                next,
                index: self.head_index(),
            },
            None => ChallengeStep::Completed,
        }
    }
}

/// Runtime state of the alarm. Volatile, reset on every (re)initialization.
///
/// `raised_at` is `Some` exactly when `raised` is true. Both only change together in
/// [`Self::mark_raised`] and [`Self::mark_stopped`].
#[derive(Debug, Eq, PartialEq, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AlarmRuntimeState {
    /// The alarm is ringing
    raised: bool,
    /// When the current alarm was raised
    raised_at: Option<Instant>,
    /// When the last alarm was dismissed, opens the suppression window
    last_stopped_at: Option<Instant>,
    /// The escalation sound has been started for the current alarm
    escalation_sound_started: bool,
    /// The quit challenge of the current alarm
    challenge: QuitChallenge,
}

impl Default for AlarmRuntimeState {
    fn default() -> Self {
        Self::new()
    }
}

impl AlarmRuntimeState {
    /// Not raised, nothing dismissed yet
    pub const fn new() -> Self {
        Self {
            raised: false,
            raised_at: None,
            last_stopped_at: None,
            escalation_sound_started: false,
            challenge: QuitChallenge::empty(),
        }
    }

    /// The alarm is ringing
    pub const fn is_raised(&self) -> bool {
        self.raised
    }

    /// When the current alarm was raised
    pub fn raised_at(&self) -> Option<Instant> {
        debug_assert_eq!(self.raised, self.raised_at.is_some());
        self.raised_at
    }

    /// When the last alarm was dismissed
    pub const fn last_stopped_at(&self) -> Option<Instant> {
        self.last_stopped_at
    }

    /// Whether the escalation sound was started for the current alarm
    pub const fn escalation_sound_started(&self) -> bool {
        self.escalation_sound_started
    }

    /// The quit challenge of the current alarm
    pub const fn challenge(&self) -> &QuitChallenge {
        &self.challenge
    }

    /// Mutable access to the quit challenge
    pub const fn challenge_mut(&mut self) -> &mut QuitChallenge {
        &mut self.challenge
    }

    /// Enter the raised state with a fresh challenge. Clears the suppression marker.
    pub fn mark_raised(&mut self, now: Instant, challenge: QuitChallenge) {
        self.raised = true;
        self.raised_at = Some(now);
        self.last_stopped_at = None;
        self.escalation_sound_started = false;
        self.challenge = challenge;
    }

    /// Leave the raised state and open the suppression window at `now`
    pub fn mark_stopped(&mut self, now: Instant) {
        self.raised = false;
        self.raised_at = None;
        self.last_stopped_at = Some(now);
        self.escalation_sound_started = false;
        self.challenge = QuitChallenge::empty();
    }

    /// Record that the escalation sound has been started
    pub const fn mark_escalation_started(&mut self) {
        self.escalation_sound_started = true;
    }

    /// Forget the last dismissal
    pub const fn clear_suppression(&mut self) {
        self.last_stopped_at = None;
    }
}

/// The alarm runtime state behind one blocking mutex.
///
/// Every read and write goes through [`Self::lock`], the closure runs with the raw mutex held.
/// Keep closures short and never call into hardware from inside them: the button path runs
/// in interrupt context.
pub struct SharedAlarmState<M: RawMutex> {
    /// The guarded state
    inner: Mutex<M, RefCell<AlarmRuntimeState>>,
}

impl<M: RawMutex> SharedAlarmState<M> {
    /// Create the shared state, not raised
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(AlarmRuntimeState::new())),
        }
    }

    /// Run `f` with exclusive access to the state
    pub fn lock<R>(&self, f: impl FnOnce(&mut AlarmRuntimeState) -> R) -> R {
        self.inner.lock(|cell| f(&mut cell.borrow_mut()))
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> AlarmRuntimeState {
        self.lock(|state| state.clone())
    }

    /// Whether the alarm is ringing
    pub fn is_raised(&self) -> bool {
        self.lock(|state| state.is_raised())
    }

    /// Put the state back to not raised, nothing dismissed
    pub fn reset(&self) {
        self.lock(|state| *state = AlarmRuntimeState::new());
    }

    /// Read-only handle for observers such as the alarm light show
    pub const fn watch(&self) -> AlarmWatch<'_, M> {
        AlarmWatch { shared: self }
    }
}

impl<M: RawMutex> Default for SharedAlarmState<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view of the shared alarm state
#[derive(Clone, Copy)]
pub struct AlarmWatch<'a, M: RawMutex> {
    /// The observed state
    shared: &'a SharedAlarmState<M>,
}

impl<M: RawMutex> AlarmWatch<'_, M> {
    /// Whether the alarm is ringing
    pub fn is_raised(&self) -> bool {
        self.shared.is_raised()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use rand::rngs::mock::StepRng;

    fn time(hour: u8, minute: u8) -> TimeOfDay {
        TimeOfDay::new(hour, minute).unwrap()
    }

    #[test]
    fn rejects_out_of_range_time() {
        assert_eq!(TimeOfDay::new(24, 0), Err(Error::InvalidTime));
        assert_eq!(TimeOfDay::new(0, 60), Err(Error::InvalidTime));
        assert!(TimeOfDay::new(23, 59).is_ok());
    }

    #[test]
    fn increments_wrap_independently() {
        let mut t = time(23, 59);
        t.increment_hour();
        assert_eq!(t, time(0, 59));
        t.increment_minute();
        assert_eq!(t, time(0, 0));
    }

    #[test]
    fn delta_wraps_past_midnight() {
        assert_eq!(time(6, 58).minutes_since(time(7, 0)), -2);
        assert_eq!(time(7, 4).minutes_since(time(7, 0)), 4);
        assert_eq!(time(0, 2).minutes_since(time(23, 59)), 3);
        // -30 itself is not shifted
        assert_eq!(time(6, 30).minutes_since(time(7, 0)), -30);
        assert_eq!(time(6, 29).minutes_since(time(7, 0)), 1409);
    }

    #[test]
    fn hhmm_format_and_parse() {
        assert_eq!(time(7, 5).to_hhmm().as_str(), "07:05");
        assert_eq!(TimeOfDay::parse_hhmm("11:11"), Ok(time(11, 11)));
        assert_eq!(TimeOfDay::parse_hhmm("24:00"), Err(Error::SettingsCorrupt));
        assert_eq!(TimeOfDay::parse_hhmm("7:00"), Err(Error::SettingsCorrupt));
        assert_eq!(TimeOfDay::parse_hhmm("07-00"), Err(Error::SettingsCorrupt));
        assert_eq!(TimeOfDay::parse_hhmm("0a:00"), Err(Error::SettingsCorrupt));
    }

    fn is_permutation(challenge: &QuitChallenge) -> bool {
        let tokens = challenge.remaining();
        tokens.len() == 3 && Button::ALL.iter().all(|b| tokens.contains(b))
    }

    #[test]
    fn generated_challenge_is_always_a_permutation() {
        let mut rng = SmallRng::seed_from_u64(0x5eed);
        for _ in 0..200 {
            assert!(is_permutation(&QuitChallenge::generate(&mut rng)));
        }
        let mut constant = StepRng::new(0, 0);
        assert!(is_permutation(&QuitChallenge::generate(&mut constant)));
    }

    #[test]
    fn generated_challenges_vary() {
        let mut rng = SmallRng::seed_from_u64(42);
        let first = QuitChallenge::generate(&mut rng);
        let differs = (0..50).any(|_| QuitChallenge::generate(&mut rng) != first);
        assert!(differs);
    }

    #[test]
    fn challenge_advances_only_on_head() {
        let mut c =
            QuitChallenge::from_tokens(&[Button::Blue, Button::Yellow, Button::Green]).unwrap();
        assert_eq!(c.submit(Button::Green), ChallengeStep::Ignored);
        assert_eq!(c.head_index(), 0);
        assert_eq!(
            c.submit(Button::Blue),
            ChallengeStep::Advanced {
                next: Button::Yellow,
                index: 1
            }
        );
        assert_eq!(c.submit(Button::Blue), ChallengeStep::Ignored);
        assert_eq!(
            c.submit(Button::Yellow),
            ChallengeStep::Advanced {
                next: Button::Green,
                index: 2
            }
        );
        assert_eq!(c.submit(Button::Green), ChallengeStep::Completed);
        assert_eq!(c.submit(Button::Green), ChallengeStep::Ignored);
        assert!(c.is_empty());
    }

    #[test]
    fn raised_at_tracks_raised() {
        let shared = SharedAlarmState::<NoopRawMutex>::new();
        let now = Instant::from_secs(100);
        shared.lock(|s| s.mark_raised(now, QuitChallenge::empty()));
        let snap = shared.snapshot();
        assert!(snap.is_raised());
        assert_eq!(snap.raised_at(), Some(now));
        assert!(shared.watch().is_raised());

        shared.lock(|s| s.mark_stopped(Instant::from_secs(200)));
        let snap = shared.snapshot();
        assert!(!snap.is_raised());
        assert_eq!(snap.raised_at(), None);
        assert_eq!(snap.last_stopped_at(), Some(Instant::from_secs(200)));
        assert!(!shared.watch().is_raised());
    }
}
