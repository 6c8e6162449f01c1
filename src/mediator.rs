//! # Mediator
//! Composition root of the control core. Wires the input dispatcher, the menu and the alarm
//! scheduler to one [`Board`] and exposes the calls the rest of the firmware makes:
//! [`Mediator::on_edge`] from the button interrupts, [`Mediator::tick`] from the alarm timer and
//! [`Mediator::enable`]/[`Mediator::disable`] for the low-power lifecycle.
//!
//! It takes no decisions of its own, it only routes.
use crate::alarm::{AlarmScheduler, TickOutcome};
use crate::board::{Board, Display, Lights, Power, Sound};
use crate::error::Error;
use crate::event::{Button, ButtonEvent};
use crate::input::InputDispatcher;
use crate::menu::{MenuAction, MenuStateMachine};
use crate::state::{Mode, SharedAlarmState};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::Instant;
use heapless::Vec;

/// Collaborators that failed to shut down or come back
pub type LifecycleErrors = Vec<Error, 3>;

/// The control core on one board
pub struct Mediator<'a, M: RawMutex, B: Board> {
    /// The hardware collaborators
    board: B,
    /// Button debouncing
    dispatcher: InputDispatcher,
    /// Operating mode
    menu: MenuStateMachine,
    /// Alarm settings and runtime state
    scheduler: AlarmScheduler<'a, M>,
    /// The device is in low-power mode
    low_power: bool,
}

impl<'a, M: RawMutex, B: Board> Mediator<'a, M, B> {
    /// Compose the core. Call [`Self::init`] before use.
    pub const fn new(state: &'a SharedAlarmState<M>, board: B) -> Self {
        Self {
            board,
            dispatcher: InputDispatcher::new(crate::config::DEBOUNCE_WINDOW),
            menu: MenuStateMachine::new(),
            scheduler: AlarmScheduler::new(state),
            low_power: false,
        }
    }

    /// Reset to idle, load the settings and start the timers
    pub fn init(&mut self) {
        self.menu.reset();
        self.scheduler.init(&mut self.board);
        self.dispatcher.enable();
        self.low_power = false;

        let settings = *self.scheduler.settings();
        self.board.power().set_medium_speed();
        let display = self.board.display();
        display.clear_content_area();
        display.show_alarm_state(settings.enabled);
        display.show_clock(&settings);
        display.start_clock_refresh();
        let lights = self.board.lights();
        if !settings.enabled && !lights.clock_render_timer_running() {
            lights.start_clock_render_timer();
        }
        info!("control core ready");
    }

    /// A raw edge on a button line. In low power any edge wakes the device and is not
    /// treated as a press, nor are its bounces.
    pub fn on_edge(&mut self, button: Button, at: Instant) -> Option<ButtonEvent> {
        if self.low_power {
            info!("{} edge, waking up", button);
            self.dispatcher.claim(button, at);
            if let Err(errors) = self.enable() {
                warn!("{} collaborators failed to wake", errors.len());
            }
            return None;
        }
        let event = self.dispatcher.on_edge(button, at)?;
        self.press(event.button);
        Some(event)
    }

    /// A debounced button press
    pub fn press(&mut self, button: Button) {
        let action = self
            .menu
            .press(button, &mut self.scheduler, &mut self.board);
        if action == MenuAction::EnterLowPower {
            if let Err(errors) = self.disable() {
                warn!("{} collaborators failed to shut down", errors.len());
            }
        }
    }

    /// Periodic alarm evaluation
    pub fn tick(&mut self) -> TickOutcome {
        let outcome = self.scheduler.tick(&mut self.board);
        match outcome {
            TickOutcome::Raised => self.menu.alarm_raised(),
            TickOutcome::ForcedQuit => self.menu.alarm_dismissed(),
            TickOutcome::Paused | TickOutcome::Nothing | TickOutcome::Escalated => {}
        }
        outcome
    }

    /// Enter low power. Every collaborator is shut down even if another one fails.
    pub fn disable(&mut self) -> Result<(), LifecycleErrors> {
        info!("entering low power");
        self.dispatcher.disable();
        self.scheduler.stop_alarm_timer(&mut self.board);
        self.menu.reset();

        let mut errors = LifecycleErrors::new();
        {
            let display = self.board.display();
            display.stop_blinking();
            display.stop_clock_refresh();
            guarded(display.shutdown(), &mut errors);
        }
        {
            let sound = self.board.sound();
            sound.stop_alarm_sound();
            guarded(sound.shutdown(), &mut errors);
        }
        {
            let lights = self.board.lights();
            lights.stop_clock_render_timer();
            lights.all_off();
            guarded(lights.shutdown(), &mut errors);
        }
        self.board.power().set_low_speed();
        self.low_power = true;
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Leave low power and reinitialize
    pub fn enable(&mut self) -> Result<(), LifecycleErrors> {
        info!("leaving low power");
        let mut errors = LifecycleErrors::new();
        guarded(self.board.display().init(), &mut errors);
        guarded(self.board.sound().init(), &mut errors);
        guarded(self.board.lights().init(), &mut errors);
        self.init();
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Whether the device is in low power
    pub const fn is_low_power(&self) -> bool {
        self.low_power
    }

    /// The current operating mode
    pub const fn mode(&self) -> Mode {
        self.menu.mode()
    }

    /// The alarm scheduler
    pub const fn scheduler(&self) -> &AlarmScheduler<'a, M> {
        &self.scheduler
    }

    /// The board
    pub const fn board(&self) -> &B {
        &self.board
    }

    /// Mutable access to the board
    pub const fn board_mut(&mut self) -> &mut B {
        &mut self.board
    }
}

/// Log and collect a failed lifecycle step
fn guarded(result: crate::error::Result<()>, errors: &mut LifecycleErrors) {
    if let Err(e) = result {
        error!("{}", e);
        // one slot per collaborator
        let _ = errors.push(e);
    }
}
