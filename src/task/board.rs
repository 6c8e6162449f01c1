//! # Firmware board
//! The collaborators of the control core on the real hardware, and the statics the tasks share.
//!
//! Every handle forwards its calls into the task owning the device and returns at once, so the
//! control core can be driven from inside a critical section.
use crate::task::display::{DisplayCommand, send_display_command};
use crate::task::light_effects::{LightsCommand, send_lights_command};
use crate::task::settings::FlashMirror;
use crate::task::sound::{SoundCommand, send_sound_command};
use core::cell::RefCell;
use defmt::{Debug2Format, info, warn};
use embassy_rp::clocks::RoscRng;
use embassy_rp::peripherals::RTC;
use embassy_rp::rtc::{DateTime, DayOfWeek, Rtc};
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::Instant;
use pico_alarmclock_core::board::{Board, Clock, Display, Lights, Power, Sound};
use pico_alarmclock_core::error::{Collaborator, Result};
use pico_alarmclock_core::event::Button;
use pico_alarmclock_core::mediator::Mediator;
use pico_alarmclock_core::persist::DocumentStore;
use pico_alarmclock_core::state::{AlarmSettings, SharedAlarmState, SystemScreen, TimeOfDay};
use portable_atomic::{AtomicU8, Ordering};

/// Runtime state of the alarm, shared with the light show
pub static ALARM_STATE: SharedAlarmState<CriticalSectionRawMutex> = SharedAlarmState::new();

/// The control core as it runs on the device
pub type FirmwareMediator = Mediator<'static, CriticalSectionRawMutex, FirmwareBoard>;

/// The control core, installed once at startup
static MEDIATOR: Mutex<CriticalSectionRawMutex, RefCell<Option<FirmwareMediator>>> =
    Mutex::new(RefCell::new(None));

/// The real time clock, installed once at startup
static RTC_CLOCK: Mutex<CriticalSectionRawMutex, RefCell<Option<Rtc<'static, RTC>>>> =
    Mutex::new(RefCell::new(None));

/// Install the control core, replacing any previous one
pub fn install_mediator(mediator: FirmwareMediator) {
    MEDIATOR.lock(|cell| {
        cell.replace(Some(mediator));
    });
}

/// Run `f` on the control core. `None` before [`install_mediator`].
pub fn with_mediator<R>(f: impl FnOnce(&mut FirmwareMediator) -> R) -> Option<R> {
    MEDIATOR.lock(|cell| cell.borrow_mut().as_mut().map(f))
}

/// Start the RTC at a fixed time and make it available to [`wall_clock`]
pub fn install_rtc(mut rtc: Rtc<'static, RTC>) {
    let start = DateTime {
        year: 2025,
        month: 1,
        day: 1,
        day_of_week: DayOfWeek::Wednesday,
        hour: 0,
        minute: 0,
        second: 0,
    };
    if let Err(e) = rtc.set_datetime(start) {
        warn!("Failed to start the RTC: {:?}", Debug2Format(&e));
    }
    RTC_CLOCK.lock(|cell| {
        cell.replace(Some(rtc));
    });
}

/// Hour, minute and second of the RTC, midnight if it is not running
pub fn wall_clock() -> (u8, u8, u8) {
    RTC_CLOCK.lock(|cell| {
        cell.borrow()
            .as_ref()
            .and_then(|rtc| rtc.now().ok())
            .map_or((0, 0, 0), |dt| (dt.hour, dt.minute, dt.second))
    })
}

/// Requested system clock speed
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum ClockSpeed {
    /// Low power
    Low,
    /// Normal operation
    Medium,
    /// Alarm raised
    Full,
}

/// Last requested clock speed, as `ClockSpeed as u8`
static CLOCK_SPEED: AtomicU8 = AtomicU8::new(ClockSpeed::Medium as u8);

/// The last requested clock speed
pub fn clock_speed() -> ClockSpeed {
    match CLOCK_SPEED.load(Ordering::Relaxed) {
        0 => ClockSpeed::Low,
        2 => ClockSpeed::Full,
        _ => ClockSpeed::Medium,
    }
}

/// Monotonic time from the embassy time driver, wall time from the RTC
pub struct RtcClock;

impl Clock for RtcClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn time_of_day(&self) -> TimeOfDay {
        let (hour, minute, _) = wall_clock();
        TimeOfDay::new(hour, minute).unwrap_or(TimeOfDay::MIDNIGHT)
    }
}

/// Forwards to the display task
pub struct DisplayHandle;

impl DisplayHandle {
    /// Queue a command, a full queue drops it
    fn send(command: DisplayCommand) {
        if send_display_command(command).is_err() {
            warn!("Display queue full, dropped {:?}", command);
        }
    }
}

impl Display for DisplayHandle {
    fn show_clock(&mut self, settings: &AlarmSettings) {
        Self::send(DisplayCommand::Clock(*settings));
    }

    fn show_quit_token(&mut self, token: Button, index: usize) {
        Self::send(DisplayCommand::QuitToken(token, index));
    }

    fn clear_first_row(&mut self) {
        Self::send(DisplayCommand::ClearFirstRow);
    }

    fn clear_content_area(&mut self) {
        Self::send(DisplayCommand::ClearContent);
    }

    fn show_alarm_state(&mut self, enabled: bool) {
        Self::send(DisplayCommand::AlarmState(enabled));
    }

    fn start_blinking(&mut self, time: TimeOfDay) {
        Self::send(DisplayCommand::Blink(time));
    }

    fn stop_blinking(&mut self) {
        Self::send(DisplayCommand::StopBlink);
    }

    fn start_clock_refresh(&mut self) {
        Self::send(DisplayCommand::ClockRefresh(true));
    }

    fn stop_clock_refresh(&mut self) {
        Self::send(DisplayCommand::ClockRefresh(false));
    }

    fn show_system(&mut self, screen: SystemScreen) {
        Self::send(DisplayCommand::System(screen));
    }

    fn init(&mut self) -> Result<()> {
        send_display_command(DisplayCommand::Wake).map_err(|()| Collaborator::Display.into())
    }

    fn shutdown(&mut self) -> Result<()> {
        send_display_command(DisplayCommand::Sleep).map_err(|()| Collaborator::Display.into())
    }
}

/// Forwards to the sound task
pub struct SoundHandle;

impl Sound for SoundHandle {
    fn start_alarm_sound(&mut self) {
        if send_sound_command(SoundCommand::Play).is_err() {
            warn!("Sound queue full, alarm sound not started");
        }
    }

    fn stop_alarm_sound(&mut self) {
        if send_sound_command(SoundCommand::Stop).is_err() {
            warn!("Sound queue full, alarm sound not stopped");
        }
    }

    fn init(&mut self) -> Result<()> {
        send_sound_command(SoundCommand::Wake).map_err(|()| Collaborator::Sound.into())
    }

    fn shutdown(&mut self) -> Result<()> {
        send_sound_command(SoundCommand::Sleep).map_err(|()| Collaborator::Sound.into())
    }
}

/// Forwards to the light effects task
pub struct LightsHandle {
    /// The ring is rendering the analog clock
    clock_render: bool,
}

impl LightsHandle {
    /// Queue a command, a full queue drops it
    fn send(command: LightsCommand) {
        if send_lights_command(command).is_err() {
            warn!("Lights queue full, dropped {:?}", command);
        }
    }
}

impl Lights for LightsHandle {
    fn all_off(&mut self) {
        Self::send(LightsCommand::AllOff);
    }

    fn start_clock_render_timer(&mut self) {
        self.clock_render = true;
        Self::send(LightsCommand::ClockRender(true));
    }

    fn stop_clock_render_timer(&mut self) {
        self.clock_render = false;
        Self::send(LightsCommand::ClockRender(false));
    }

    fn clock_render_timer_running(&self) -> bool {
        self.clock_render
    }

    fn start_alarm_show(&mut self) {
        Self::send(LightsCommand::AlarmShow);
    }

    fn init(&mut self) -> Result<()> {
        send_lights_command(LightsCommand::AllOff).map_err(|()| Collaborator::Lights.into())
    }

    fn shutdown(&mut self) -> Result<()> {
        self.clock_render = false;
        send_lights_command(LightsCommand::ClockRender(false))
            .and_then(|()| send_lights_command(LightsCommand::AllOff))
            .map_err(|()| Collaborator::Lights.into())
    }
}

/// Records the requested clock speed. The RP2040 clock tree is fixed at init, low speed instead
/// powers the peripherals down through their own handles.
pub struct PowerHandle;

impl PowerHandle {
    /// Record `speed`
    fn request(speed: ClockSpeed) {
        if clock_speed() != speed {
            info!("Clock speed {:?}", speed);
        }
        CLOCK_SPEED.store(speed as u8, Ordering::Relaxed);
    }
}

impl Power for PowerHandle {
    fn set_full_speed(&mut self) {
        Self::request(ClockSpeed::Full);
    }

    fn set_medium_speed(&mut self) {
        Self::request(ClockSpeed::Medium);
    }

    fn set_low_speed(&mut self) {
        Self::request(ClockSpeed::Low);
    }
}

/// All collaborators of the control core on the device
pub struct FirmwareBoard {
    /// RTC backed clock
    clock: RtcClock,
    /// OLED display
    display: DisplayHandle,
    /// DFPlayer
    sound: SoundHandle,
    /// Neopixel ring
    lights: LightsHandle,
    /// Clock speed
    power: PowerHandle,
    /// Settings document mirrored to flash
    settings: DocumentStore<FlashMirror>,
    /// Ring oscillator randomness
    rng: RoscRng,
}

impl FirmwareBoard {
    /// The board with every handle idle
    pub const fn new() -> Self {
        Self {
            clock: RtcClock,
            display: DisplayHandle,
            sound: SoundHandle,
            lights: LightsHandle {
                clock_render: false,
            },
            power: PowerHandle,
            settings: DocumentStore::new(FlashMirror),
            rng: RoscRng,
        }
    }
}

impl Board for FirmwareBoard {
    type Clock = RtcClock;
    type Display = DisplayHandle;
    type Sound = SoundHandle;
    type Lights = LightsHandle;
    type Power = PowerHandle;
    type Settings = DocumentStore<FlashMirror>;
    type Rng = RoscRng;

    fn clock(&self) -> &Self::Clock {
        &self.clock
    }

    fn display(&mut self) -> &mut Self::Display {
        &mut self.display
    }

    fn sound(&mut self) -> &mut Self::Sound {
        &mut self.sound
    }

    fn lights(&mut self) -> &mut Self::Lights {
        &mut self.lights
    }

    fn power(&mut self) -> &mut Self::Power {
        &mut self.power
    }

    fn settings(&mut self) -> &mut Self::Settings {
        &mut self.settings
    }

    fn rng(&mut self) -> &mut Self::Rng {
        &mut self.rng
    }
}
