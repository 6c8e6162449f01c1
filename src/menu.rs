//! # Menu state machine
//! Owns the operating mode and routes every logical button press to the action of the
//! current mode.
//!
//! | Mode             | Green             | Blue                 | Yellow             |
//! |------------------|-------------------|----------------------|--------------------|
//! | Idle             | toggle alarm      | edit alarm time      | system menu        |
//! | TimeSetting      | hour + 1          | store time, idle     | minute + 1         |
//! | AlarmRaised      | submit green      | submit blue          | submit yellow      |
//! | System(Select)   | shutdown screen   | info screen          | idle               |
//! | System(Info)     | -                 | -                    | -                  |
//! | System(Shutdown) | -                 | -                    | low power          |
use crate::alarm::{AlarmScheduler, SubmitOutcome};
use crate::board::{Board, Display};
use crate::event::Button;
use crate::state::{Mode, SystemScreen};
use embassy_sync::blocking_mutex::raw::RawMutex;

/// Follow-up the caller has to carry out after a press
#[derive(Debug, Eq, PartialEq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MenuAction {
    /// Nothing to do
    None,
    /// The user confirmed shutdown, the device goes to low power
    EnterLowPower,
}

/// The operating mode and its button handling
#[derive(Debug, Default)]
pub struct MenuStateMachine {
    /// The current mode
    mode: Mode,
}

impl MenuStateMachine {
    /// Start in idle mode
    pub const fn new() -> Self {
        Self { mode: Mode::Idle }
    }

    /// The current mode
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Back to idle, used on (re)initialization
    pub const fn reset(&mut self) {
        self.mode = Mode::Idle;
    }

    /// The scheduler raised the alarm
    pub fn alarm_raised(&mut self) {
        info!("mode {} -> alarm raised", self.mode);
        self.mode = Mode::AlarmRaised;
    }

    /// The scheduler dismissed the alarm
    pub fn alarm_dismissed(&mut self) {
        if self.mode == Mode::AlarmRaised {
            self.mode = Mode::Idle;
        }
    }

    /// Handle a logical button press
    pub fn press<M: RawMutex, B: Board>(
        &mut self,
        button: Button,
        scheduler: &mut AlarmScheduler<'_, M>,
        board: &mut B,
    ) -> MenuAction {
        debug!("{} pressed in {}", button, self.mode);
        match (self.mode, button) {
            (Mode::Idle, Button::Green) => scheduler.toggle_enabled(board),
            (Mode::Idle, Button::Blue) => self.enter_time_setting(scheduler, board),
            (Mode::Idle, Button::Yellow) => {
                board.display().stop_clock_refresh();
                self.show_system(SystemScreen::Select, board);
            }

            (Mode::TimeSetting, Button::Green) => scheduler.increment_hour(board),
            (Mode::TimeSetting, Button::Blue) => self.exit_time_setting(scheduler, board),
            (Mode::TimeSetting, Button::Yellow) => scheduler.increment_minute(board),

            (Mode::AlarmRaised, token) => {
                if scheduler.submit(token, board) == SubmitOutcome::Dismissed {
                    self.mode = Mode::Idle;
                }
            }

            (Mode::System(SystemScreen::Select), Button::Green) => {
                self.show_system(SystemScreen::Shutdown, board);
            }
            (Mode::System(SystemScreen::Select), Button::Blue) => {
                self.show_system(SystemScreen::Info, board);
            }
            (Mode::System(SystemScreen::Select), Button::Yellow) => {
                self.mode = Mode::Idle;
                let display = board.display();
                display.clear_content_area();
                display.show_clock(scheduler.settings());
                display.start_clock_refresh();
            }

            (Mode::System(SystemScreen::Info), _)
            | (Mode::System(SystemScreen::Shutdown), Button::Green | Button::Blue) => {}

            (Mode::System(SystemScreen::Shutdown), Button::Yellow) => {
                info!("shutdown confirmed");
                return MenuAction::EnterLowPower;
            }
        }
        MenuAction::None
    }

    /// Switch to a system menu screen
    fn show_system<B: Board>(&mut self, screen: SystemScreen, board: &mut B) {
        self.mode = Mode::System(screen);
        board.display().show_system(screen);
    }

    /// Pause the alarm and the clock refresh, blink the stored alarm time
    fn enter_time_setting<M: RawMutex, B: Board>(
        &mut self,
        scheduler: &mut AlarmScheduler<'_, M>,
        board: &mut B,
    ) {
        self.mode = Mode::TimeSetting;
        scheduler.stop_alarm_timer(board);
        scheduler.reload_settings(board);
        let display = board.display();
        display.stop_clock_refresh();
        display.clear_content_area();
        display.start_blinking(scheduler.settings().time);
    }

    /// Store the edited time and resume the alarm and the clock refresh
    fn exit_time_setting<M: RawMutex, B: Board>(
        &mut self,
        scheduler: &mut AlarmScheduler<'_, M>,
        board: &mut B,
    ) {
        self.mode = Mode::Idle;
        board.display().stop_blinking();
        scheduler.commit_time(board);
        scheduler.clear_suppression();
        scheduler.start_alarm_timer();
        let display = board.display();
        display.clear_content_area();
        display.show_clock(scheduler.settings());
        display.start_clock_refresh();
    }
}
