//! Recording fakes of the board collaborators for unit tests.
use crate::board::{Board, Clock, Display, Lights, Power, SettingsStore, Sound};
use crate::error::{Collaborator, Error, Result};
use crate::event::Button;
use crate::state::{AlarmSettings, SystemScreen, TimeOfDay};
use embassy_time::{Duration, Instant};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::vec::Vec;

/// A call into a collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    ShowClock,
    ShowQuitToken(Button, usize),
    ClearFirstRow,
    ClearContentArea,
    ShowAlarmState(bool),
    StartBlinking(TimeOfDay),
    StopBlinking,
    StartClockRefresh,
    StopClockRefresh,
    ShowSystem(SystemScreen),
    Init(Collaborator),
    Shutdown(Collaborator),
    StartAlarmSound,
    StopAlarmSound,
    AllOff,
    StartClockRender,
    StopClockRender,
    StartAlarmShow,
    FullSpeed,
    MediumSpeed,
    LowSpeed,
    Save(AlarmSettings),
}

/// Call log shared by all fakes of one board, keeps the order across collaborators
pub type CallLog = Rc<RefCell<Vec<Call>>>;

/// Monotonic fake clock. Seconds since midnight of day zero.
pub struct FakeClock {
    secs: Cell<u64>,
}

impl FakeClock {
    pub fn set_time_of_day(&self, hour: u8, minute: u8) {
        let target = u64::from(hour) * 3600 + u64::from(minute) * 60;
        let now = self.secs.get();
        let day = now / 86_400;
        let mut next = day * 86_400 + target;
        if next < now {
            next += 86_400;
        }
        self.secs.set(next);
    }

    pub fn advance(&self, by: Duration) {
        self.secs.set(self.secs.get() + by.as_secs());
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        Instant::from_secs(self.secs.get())
    }

    #[allow(clippy::cast_possible_truncation)]
    fn time_of_day(&self) -> TimeOfDay {
        let minute_of_day = (self.secs.get() / 60) % 1440;
        TimeOfDay::new((minute_of_day / 60) as u8, (minute_of_day % 60) as u8).unwrap()
    }
}

/// Records every call into the display, sound or lights collaborator
pub struct Recorder {
    which: Collaborator,
    log: CallLog,
    pub fail_shutdown: bool,
    render_running: bool,
}

impl Recorder {
    fn new(which: Collaborator, log: CallLog) -> Self {
        Self {
            which,
            log,
            fail_shutdown: false,
            render_running: false,
        }
    }

    fn record(&self, call: Call) {
        self.log.borrow_mut().push(call);
    }

    fn record_init(&mut self) -> Result<()> {
        self.record(Call::Init(self.which));
        Ok(())
    }

    fn record_shutdown(&mut self) -> Result<()> {
        self.record(Call::Shutdown(self.which));
        if self.fail_shutdown {
            Err(Error::Collaborator(self.which))
        } else {
            Ok(())
        }
    }
}

impl Display for Recorder {
    fn show_clock(&mut self, _settings: &AlarmSettings) {
        self.record(Call::ShowClock);
    }
    fn show_quit_token(&mut self, token: Button, index: usize) {
        self.record(Call::ShowQuitToken(token, index));
    }
    fn clear_first_row(&mut self) {
        self.record(Call::ClearFirstRow);
    }
    fn clear_content_area(&mut self) {
        self.record(Call::ClearContentArea);
    }
    fn show_alarm_state(&mut self, enabled: bool) {
        self.record(Call::ShowAlarmState(enabled));
    }
    fn start_blinking(&mut self, time: TimeOfDay) {
        self.record(Call::StartBlinking(time));
    }
    fn stop_blinking(&mut self) {
        self.record(Call::StopBlinking);
    }
    fn start_clock_refresh(&mut self) {
        self.record(Call::StartClockRefresh);
    }
    fn stop_clock_refresh(&mut self) {
        self.record(Call::StopClockRefresh);
    }
    fn show_system(&mut self, screen: SystemScreen) {
        self.record(Call::ShowSystem(screen));
    }
    fn init(&mut self) -> Result<()> {
        self.record_init()
    }
    fn shutdown(&mut self) -> Result<()> {
        self.record_shutdown()
    }
}

impl Sound for Recorder {
    fn start_alarm_sound(&mut self) {
        self.record(Call::StartAlarmSound);
    }
    fn stop_alarm_sound(&mut self) {
        self.record(Call::StopAlarmSound);
    }
    fn init(&mut self) -> Result<()> {
        self.record_init()
    }
    fn shutdown(&mut self) -> Result<()> {
        self.record_shutdown()
    }
}

impl Lights for Recorder {
    fn all_off(&mut self) {
        self.record(Call::AllOff);
    }
    fn start_clock_render_timer(&mut self) {
        self.render_running = true;
        self.record(Call::StartClockRender);
    }
    fn stop_clock_render_timer(&mut self) {
        self.render_running = false;
        self.record(Call::StopClockRender);
    }
    fn clock_render_timer_running(&self) -> bool {
        self.render_running
    }
    fn start_alarm_show(&mut self) {
        self.record(Call::StartAlarmShow);
    }
    fn init(&mut self) -> Result<()> {
        self.record_init()
    }
    fn shutdown(&mut self) -> Result<()> {
        self.record_shutdown()
    }
}

/// Records the requested system clock speeds
pub struct PowerRecorder {
    log: CallLog,
}

impl Power for PowerRecorder {
    fn set_full_speed(&mut self) {
        self.log.borrow_mut().push(Call::FullSpeed);
    }
    fn set_medium_speed(&mut self) {
        self.log.borrow_mut().push(Call::MediumSpeed);
    }
    fn set_low_speed(&mut self) {
        self.log.borrow_mut().push(Call::LowSpeed);
    }
}

/// In-memory settings store
pub struct FakeStore {
    log: CallLog,
    pub stored: Option<AlarmSettings>,
    pub fail_load: Option<Error>,
}

impl SettingsStore for FakeStore {
    fn load(&mut self) -> Result<AlarmSettings> {
        if let Some(e) = self.fail_load {
            return Err(e);
        }
        self.stored.ok_or(Error::SettingsMissing)
    }

    fn save(&mut self, settings: &AlarmSettings) -> Result<()> {
        self.log.borrow_mut().push(Call::Save(*settings));
        self.stored = Some(*settings);
        Ok(())
    }
}

/// A complete fake board
pub struct FakeBoard {
    pub log: CallLog,
    pub clock: FakeClock,
    pub display: Recorder,
    pub sound: Recorder,
    pub lights: Recorder,
    pub power: PowerRecorder,
    pub store: FakeStore,
    pub rng: SmallRng,
}

impl FakeBoard {
    /// Board at 00:00 on day one with nothing stored
    pub fn new() -> Self {
        let log = CallLog::default();
        Self {
            clock: FakeClock {
                secs: Cell::new(86_400),
            },
            display: Recorder::new(Collaborator::Display, log.clone()),
            sound: Recorder::new(Collaborator::Sound, log.clone()),
            lights: Recorder::new(Collaborator::Lights, log.clone()),
            power: PowerRecorder { log: log.clone() },
            store: FakeStore {
                log: log.clone(),
                stored: None,
                fail_load: None,
            },
            rng: SmallRng::seed_from_u64(7),
            log,
        }
    }

    pub fn with_settings(settings: AlarmSettings) -> Self {
        let mut board = Self::new();
        board.store.stored = Some(settings);
        board
    }

    pub fn calls(&self) -> Vec<Call> {
        self.log.borrow().clone()
    }

    pub fn count(&self, call: Call) -> usize {
        self.log.borrow().iter().filter(|c| **c == call).count()
    }

    pub fn clear_calls(&self) {
        self.log.borrow_mut().clear();
    }
}

impl Board for FakeBoard {
    type Clock = FakeClock;
    type Display = Recorder;
    type Sound = Recorder;
    type Lights = Recorder;
    type Power = PowerRecorder;
    type Settings = FakeStore;
    type Rng = SmallRng;

    fn clock(&self) -> &FakeClock {
        &self.clock
    }
    fn display(&mut self) -> &mut Recorder {
        &mut self.display
    }
    fn sound(&mut self) -> &mut Recorder {
        &mut self.sound
    }
    fn lights(&mut self) -> &mut Recorder {
        &mut self.lights
    }
    fn power(&mut self) -> &mut PowerRecorder {
        &mut self.power
    }
    fn settings(&mut self) -> &mut FakeStore {
        &mut self.store
    }
    fn rng(&mut self) -> &mut SmallRng {
        &mut self.rng
    }
}

/// Alarm settings at `hour:minute`
pub fn settings(hour: u8, minute: u8, enabled: bool) -> AlarmSettings {
    AlarmSettings::new(TimeOfDay::new(hour, minute).unwrap(), enabled)
}
