//! # Alarm scheduler
//! Decides when the alarm is raised, escalates it while nobody reacts and dismisses it, either
//! through the quit challenge or after the forced-quit deadline.
//!
//! The scheduler is polled by a periodic tick. Because the raise decision compares absolute
//! wall-clock minutes, a late or missed tick is simply re-evaluated on the next one.
use crate::board::{Board, Clock, Display, Lights, Power, SettingsStore, Sound};
use crate::config::{
    ESCALATION_AFTER, FORCED_QUIT_AFTER, SUPPRESSION_WINDOW, TRIGGER_WINDOW_EARLY_MINUTES,
    TRIGGER_WINDOW_LATE_MINUTES,
};
use crate::event::Button;
use crate::state::{
    AlarmRuntimeState, AlarmSettings, ChallengeStep, QuitChallenge, SharedAlarmState, TimeOfDay,
};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::Instant;

/// What a scheduler tick did
#[derive(Debug, Eq, PartialEq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickOutcome {
    /// The alarm timer is stopped, nothing was evaluated
    Paused,
    /// Nothing changed
    Nothing,
    /// The alarm was raised
    Raised,
    /// The escalation sound was started
    Escalated,
    /// The alarm rang too long and was dismissed
    ForcedQuit,
}

/// What submitting a challenge token did
#[derive(Debug, Eq, PartialEq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SubmitOutcome {
    /// Wrong token, or no alarm raised. Nothing changed.
    Ignored,
    /// Correct token, more to go
    Advanced,
    /// Last token, the alarm was dismissed
    Dismissed,
}

/// Decision taken under the state lock, carried out after releasing it
enum Decision {
    /// Leave everything as is
    Nothing,
    /// Raise the alarm
    Raise,
    /// Start the escalation sound
    Escalate,
    /// Dismiss the alarm
    ForceQuit,
}

/// Owns the alarm settings and drives the shared alarm runtime state.
pub struct AlarmScheduler<'a, M: RawMutex> {
    /// Runtime state shared with the alarm light show
    state: &'a SharedAlarmState<M>,
    /// The alarm settings
    settings: AlarmSettings,
    /// Whether ticks are evaluated
    timer_running: bool,
}

impl<'a, M: RawMutex> AlarmScheduler<'a, M> {
    /// Create a scheduler with default settings and a stopped alarm timer
    pub const fn new(state: &'a SharedAlarmState<M>) -> Self {
        Self {
            state,
            settings: AlarmSettings::new(TimeOfDay::MIDNIGHT, false),
            timer_running: false,
        }
    }

    /// The alarm settings
    pub const fn settings(&self) -> &AlarmSettings {
        &self.settings
    }

    /// The shared runtime state
    pub const fn state(&self) -> &'a SharedAlarmState<M> {
        self.state
    }

    /// Whether ticks are evaluated
    pub const fn is_timer_running(&self) -> bool {
        self.timer_running
    }

    /// Whether the alarm is ringing
    pub fn is_raised(&self) -> bool {
        self.state.is_raised()
    }

    /// Reset the runtime state, load the settings and start the alarm timer
    pub fn init<B: Board>(&mut self, board: &mut B) {
        self.state.reset();
        self.reload_settings(board);
        self.start_alarm_timer();
        info!("alarm scheduler initialized: {}", self.settings);
    }

    /// Read the settings from storage, falling back to 00:00 disabled
    pub fn reload_settings<B: Board>(&mut self, board: &mut B) {
        self.settings = match board.settings().load() {
            Ok(settings) => settings,
            Err(e) => {
                warn!("using default alarm settings: {}", e);
                AlarmSettings::default()
            }
        };
    }

    /// Start evaluating ticks
    pub const fn start_alarm_timer(&mut self) {
        self.timer_running = true;
    }

    /// Stop evaluating ticks. A raised alarm is dropped so its light show winds down.
    pub fn stop_alarm_timer<B: Board>(&mut self, board: &mut B) {
        self.timer_running = false;
        let now = board.now();
        self.state.lock(|s| {
            // a silent alarm leaves the suppression window closed, so it may still ring
            // once the timer restarts in the same minute
            if s.is_raised() {
                s.mark_stopped(now);
            }
        });
    }

    /// Forget the last dismissal, the alarm may be raised again right away
    pub fn clear_suppression(&self) {
        self.state.lock(AlarmRuntimeState::clear_suppression);
    }

    /// Periodic evaluation of the alarm
    pub fn tick<B: Board>(&mut self, board: &mut B) -> TickOutcome {
        if !self.timer_running {
            return TickOutcome::Paused;
        }
        let now = board.now();
        let time_of_day = board.clock().time_of_day();
        let settings = self.settings;

        let decision = self.state.lock(|s| match s.raised_at() {
            None if should_raise(&settings, time_of_day, now, s.last_stopped_at()) => {
                Decision::Raise
            }
            None => Decision::Nothing,
            Some(raised_at) => {
                let elapsed = now.saturating_duration_since(raised_at);
                if elapsed >= FORCED_QUIT_AFTER {
                    Decision::ForceQuit
                } else if elapsed >= ESCALATION_AFTER && !s.escalation_sound_started() {
                    s.mark_escalation_started();
                    Decision::Escalate
                } else {
                    Decision::Nothing
                }
            }
        });

        match decision {
            Decision::Nothing => TickOutcome::Nothing,
            Decision::Raise => {
                if self.raise(board) {
                    TickOutcome::Raised
                } else {
                    TickOutcome::Nothing
                }
            }
            Decision::Escalate => {
                info!("alarm unanswered, starting sound");
                board.sound().start_alarm_sound();
                TickOutcome::Escalated
            }
            Decision::ForceQuit => {
                warn!("alarm unanswered, dismissing");
                if self.quit(board) {
                    TickOutcome::ForcedQuit
                } else {
                    TickOutcome::Nothing
                }
            }
        }
    }

    /// Raise the alarm with a fresh quit challenge and start the light show.
    ///
    /// Returns false if the alarm was already raised, so at most one light show runs.
    pub fn raise<B: Board>(&mut self, board: &mut B) -> bool {
        let challenge = QuitChallenge::generate(board.rng());
        let now = board.now();
        let first = self.state.lock(|s| {
            if s.is_raised() {
                return None;
            }
            s.mark_raised(now, challenge);
            s.challenge().head()
        });
        let Some(first) = first else {
            return false;
        };

        info!("alarm raised, first token {}", first);
        board.power().set_full_speed();
        board.display().stop_clock_refresh();
        board.lights().stop_clock_render_timer();
        board.lights().all_off();
        board.lights().start_alarm_show();
        board.display().clear_content_area();
        board.display().show_quit_token(first, 0);
        true
    }

    /// Feed one token to the quit challenge
    pub fn submit<B: Board>(&mut self, token: Button, board: &mut B) -> SubmitOutcome {
        let step = self.state.lock(|s| {
            if s.is_raised() {
                s.challenge_mut().submit(token)
            } else {
                ChallengeStep::Ignored
            }
        });
        match step {
            ChallengeStep::Ignored => SubmitOutcome::Ignored,
            ChallengeStep::Advanced { next, index } => {
                board.display().show_quit_token(next, index);
                SubmitOutcome::Advanced
            }
            ChallengeStep::Completed => {
                if self.quit(board) {
                    SubmitOutcome::Dismissed
                } else {
                    SubmitOutcome::Ignored
                }
            }
        }
    }

    /// Dismiss the alarm and open the suppression window.
    ///
    /// The light show notices on its next frame and exits. Returns false if no alarm was raised.
    pub fn quit<B: Board>(&mut self, board: &mut B) -> bool {
        let now = board.now();
        let was_raised = self.state.lock(|s| {
            let raised = s.is_raised();
            if raised {
                s.mark_stopped(now);
            }
            raised
        });
        if !was_raised {
            return false;
        }

        info!("alarm dismissed");
        board.lights().all_off();
        board.sound().stop_alarm_sound();
        board.lights().start_clock_render_timer();
        board.display().clear_first_row();
        board.display().clear_content_area();
        board.display().show_clock(&self.settings);
        board.display().start_clock_refresh();
        board.power().set_medium_speed();
        true
    }

    /// Flip the enabled flag and persist it right away.
    ///
    /// The analog clock on the ring is only shown while the alarm is disabled.
    pub fn toggle_enabled<B: Board>(&mut self, board: &mut B) {
        self.settings.enabled = !self.settings.enabled;
        info!("alarm enabled: {}", self.settings.enabled);
        self.persist(board);
        board.display().show_alarm_state(self.settings.enabled);
        if self.settings.enabled {
            board.lights().stop_clock_render_timer();
            board.lights().all_off();
        } else {
            board.lights().start_clock_render_timer();
        }
    }

    /// Advance the edited alarm hour
    pub fn increment_hour<B: Board>(&mut self, board: &mut B) {
        self.settings.time.increment_hour();
        board.display().start_blinking(self.settings.time);
    }

    /// Advance the edited alarm minute
    pub fn increment_minute<B: Board>(&mut self, board: &mut B) {
        self.settings.time.increment_minute();
        board.display().start_blinking(self.settings.time);
    }

    /// Write the edited alarm time to storage
    pub fn commit_time<B: Board>(&mut self, board: &mut B) {
        info!("alarm time set to {}", self.settings.time);
        self.persist(board);
    }

    /// Store the settings, logging failures
    fn persist<B: Board>(&self, board: &mut B) {
        if let Err(e) = board.settings().save(&self.settings) {
            error!("failed to store alarm settings: {}", e);
        }
    }
}

/// The raise condition of a tick while no alarm is raised
fn should_raise(
    settings: &AlarmSettings,
    time_of_day: TimeOfDay,
    now: Instant,
    last_stopped_at: Option<Instant>,
) -> bool {
    if !settings.enabled {
        return false;
    }
    let delta = time_of_day.minutes_since(settings.time);
    if !(TRIGGER_WINDOW_EARLY_MINUTES..=TRIGGER_WINDOW_LATE_MINUTES).contains(&delta) {
        return false;
    }
    match last_stopped_at {
        Some(stopped) => now.saturating_duration_since(stopped) > SUPPRESSION_WINDOW,
        None => true,
    }
}
