//! A day with the alarm clock: set the alarm, let it ring, dismiss it with the quit challenge
//! while the light show runs, and go to low power.
use core::cell::{Cell, RefCell};
use embassy_futures::block_on;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_time::{Duration, Instant};
use embedded_hal_async::delay::DelayNs;
use pico_alarmclock_core::alarm::TickOutcome;
use pico_alarmclock_core::board::{Board, Clock, Display, Lights, Power, SettingsStore, Sound};
use pico_alarmclock_core::event::Button;
use pico_alarmclock_core::light_show::AlarmShow;
use pico_alarmclock_core::mediator::Mediator;
use pico_alarmclock_core::persist::{DocumentStore, RamDocument};
use pico_alarmclock_core::state::{AlarmSettings, Mode, SharedAlarmState, SystemScreen, TimeOfDay};
use pico_alarmclock_core::Result;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use smart_leds::{RGB8, SmartLedsWriteAsync};
use std::rc::Rc;

/// Seconds since midnight of day zero
#[derive(Clone, Default)]
struct SimClock(Rc<Cell<u64>>);

impl SimClock {
    fn set(&self, hour: u64, minute: u64) {
        let day = self.0.get() / 86_400;
        let target = day * 86_400 + hour * 3600 + minute * 60;
        assert!(target >= self.0.get());
        self.0.set(target);
    }

    fn advance(&self, by: Duration) {
        self.0.set(self.0.get() + by.as_secs());
    }
}

impl Clock for SimClock {
    fn now(&self) -> Instant {
        Instant::from_secs(self.0.get())
    }

    fn time_of_day(&self) -> TimeOfDay {
        let minutes = (self.0.get() / 60) % 1440;
        TimeOfDay::new(u8::try_from(minutes / 60).unwrap(), u8::try_from(minutes % 60).unwrap())
            .unwrap()
    }
}

/// Counts what the core asked the hardware to do
#[derive(Default)]
struct Devices {
    tokens_shown: Vec<(Button, usize)>,
    sound_playing: bool,
    sound_starts: usize,
    shows_started: usize,
    ring_clock: bool,
    powered_down: bool,
    full_speed: bool,
}

impl Display for Devices {
    fn show_clock(&mut self, _settings: &AlarmSettings) {}
    fn show_quit_token(&mut self, token: Button, index: usize) {
        self.tokens_shown.push((token, index));
    }
    fn clear_first_row(&mut self) {}
    fn clear_content_area(&mut self) {}
    fn show_alarm_state(&mut self, _enabled: bool) {}
    fn start_blinking(&mut self, _time: TimeOfDay) {}
    fn stop_blinking(&mut self) {}
    fn start_clock_refresh(&mut self) {}
    fn stop_clock_refresh(&mut self) {}
    fn show_system(&mut self, _screen: SystemScreen) {}
    fn shutdown(&mut self) -> Result<()> {
        self.powered_down = true;
        Ok(())
    }
}

impl Sound for Devices {
    fn start_alarm_sound(&mut self) {
        self.sound_playing = true;
        self.sound_starts += 1;
    }
    fn stop_alarm_sound(&mut self) {
        self.sound_playing = false;
    }
    fn shutdown(&mut self) -> Result<()> {
        Ok(())
    }
}

impl Lights for Devices {
    fn all_off(&mut self) {}
    fn start_clock_render_timer(&mut self) {
        self.ring_clock = true;
    }
    fn stop_clock_render_timer(&mut self) {
        self.ring_clock = false;
    }
    fn clock_render_timer_running(&self) -> bool {
        self.ring_clock
    }
    fn start_alarm_show(&mut self) {
        self.shows_started += 1;
    }
    fn shutdown(&mut self) -> Result<()> {
        Ok(())
    }
}

impl Power for Devices {
    fn set_full_speed(&mut self) {
        self.full_speed = true;
    }
    fn set_medium_speed(&mut self) {
        self.full_speed = false;
    }
    fn set_low_speed(&mut self) {
        self.full_speed = false;
    }
}

struct SimBoard {
    clock: SimClock,
    devices: Devices,
    store: DocumentStore<RamDocument>,
    rng: SmallRng,
}

impl Board for SimBoard {
    type Clock = SimClock;
    type Display = Devices;
    type Sound = Devices;
    type Lights = Devices;
    type Power = Devices;
    type Settings = DocumentStore<RamDocument>;
    type Rng = SmallRng;

    fn clock(&self) -> &SimClock {
        &self.clock
    }
    fn display(&mut self) -> &mut Devices {
        &mut self.devices
    }
    fn sound(&mut self) -> &mut Devices {
        &mut self.devices
    }
    fn lights(&mut self) -> &mut Devices {
        &mut self.devices
    }
    fn power(&mut self) -> &mut Devices {
        &mut self.devices
    }
    fn settings(&mut self) -> &mut DocumentStore<RamDocument> {
        &mut self.store
    }
    fn rng(&mut self) -> &mut SmallRng {
        &mut self.rng
    }
}

fn new_board(clock: &SimClock) -> SimBoard {
    SimBoard {
        clock: clock.clone(),
        devices: Devices::default(),
        store: DocumentStore::new(RamDocument::new()),
        rng: SmallRng::seed_from_u64(2024),
    }
}

#[derive(Default)]
struct Ring {
    frames: usize,
}

impl SmartLedsWriteAsync for Ring {
    type Error = ();
    type Color = RGB8;

    async fn write<T, I>(&mut self, iterator: T) -> core::result::Result<(), ()>
    where
        T: IntoIterator<Item = I>,
        I: Into<RGB8>,
    {
        iterator.into_iter().for_each(drop);
        self.frames += 1;
        Ok(())
    }
}

/// Frame pacing that lets the user press the next challenge button now and then
struct UserAtTheButtons<'m, 'a> {
    mediator: &'m RefCell<Mediator<'a, NoopRawMutex, SimBoard>>,
    clock: SimClock,
    frames: usize,
    elapsed_ms: u64,
}

impl DelayNs for UserAtTheButtons<'_, '_> {
    async fn delay_ns(&mut self, ns: u32) {
        self.elapsed_ms += u64::from(ns / 1_000_000);
        self.frames += 1;
        // wake up after a while and press one button every 20 frames
        if self.frames > 100 && self.frames % 20 == 0 {
            let mut mediator = self.mediator.borrow_mut();
            let next = mediator.scheduler().state().snapshot().challenge().head();
            if let Some(button) = next {
                let at = Instant::from_millis(self.clock.now().as_millis() + self.elapsed_ms);
                mediator.on_edge(button, at);
            }
        }
    }
}

#[test]
fn set_ring_dismiss_and_power_down() {
    let clock = SimClock::default();
    clock.set(21, 0);
    let state = SharedAlarmState::<NoopRawMutex>::new();
    let mediator = RefCell::new(Mediator::new(&state, new_board(&clock)));
    mediator.borrow_mut().init();

    // nothing stored yet: 00:00, disabled, ring shows the clock
    assert_eq!(*mediator.borrow().scheduler().settings(), AlarmSettings::default());
    assert!(mediator.borrow().board().devices.ring_clock);

    // set 06:30: blue, six times green, thirty times yellow, blue
    let mut t = 1_000u64;
    let mut press = |button: Button| {
        t += 500;
        mediator.borrow_mut().on_edge(button, Instant::from_millis(t))
    };
    press(Button::Blue);
    for _ in 0..6 {
        press(Button::Green);
    }
    for _ in 0..30 {
        press(Button::Yellow);
    }
    press(Button::Blue);
    press(Button::Green);
    assert_eq!(mediator.borrow().mode(), Mode::Idle);

    let expected = AlarmSettings::new(TimeOfDay::new(6, 30).unwrap(), true);
    assert_eq!(*mediator.borrow().scheduler().settings(), expected);
    let stored = mediator.borrow().board().store.storage().as_bytes().to_vec();
    assert_eq!(stored, br#"{"alarm_time":"06:30","alarm_active":true}"#.to_vec());

    // the night: tick every 30 s until the alarm goes off
    let mut raised_at = None;
    while raised_at.is_none() {
        clock.advance(Duration::from_secs(30));
        if mediator.borrow_mut().tick() == TickOutcome::Raised {
            raised_at = Some(clock.time_of_day());
        }
    }
    assert_eq!(raised_at, Some(TimeOfDay::new(6, 25).unwrap()));
    assert_eq!(mediator.borrow().mode(), Mode::AlarmRaised);
    assert_eq!(mediator.borrow().board().devices.shows_started, 1);
    assert!(mediator.borrow().board().devices.full_speed);

    // the light show runs while the user works through the challenge
    let delay = UserAtTheButtons {
        mediator: &mediator,
        clock: clock.clone(),
        frames: 0,
        elapsed_ms: 0,
    };
    let mut show = AlarmShow::new(state.watch(), Ring::default(), delay);
    block_on(show.run());
    assert!(show.into_ring().frames > 100);

    assert!(!state.is_raised());
    {
        let mediator = mediator.borrow();
        assert_eq!(mediator.mode(), Mode::Idle);
        assert_eq!(mediator.board().devices.tokens_shown.len(), 3);
        assert_eq!(mediator.board().devices.sound_starts, 0);
        assert!(!mediator.board().devices.full_speed);
    }

    // inside the suppression window the alarm stays quiet
    for _ in 0..10 {
        clock.advance(Duration::from_secs(30));
        assert_eq!(mediator.borrow_mut().tick(), TickOutcome::Nothing);
    }

    // system menu, shutdown, confirm
    let mut t = clock.now().as_millis() + 60_000;
    let mut press = |button: Button| {
        t += 500;
        mediator.borrow_mut().on_edge(button, Instant::from_millis(t))
    };
    press(Button::Yellow);
    press(Button::Green);
    press(Button::Yellow);
    assert!(mediator.borrow().is_low_power());
    assert!(mediator.borrow().board().devices.powered_down);

    // any button wakes it up again, settings survive
    assert!(press(Button::Blue).is_none());
    assert!(!mediator.borrow().is_low_power());
    assert_eq!(*mediator.borrow().scheduler().settings(), expected);
}

#[test]
fn unanswered_alarm_escalates_then_gives_up() {
    let clock = SimClock::default();
    clock.set(6, 0);
    let state = SharedAlarmState::<NoopRawMutex>::new();
    let mut board = new_board(&clock);
    board
        .store
        .save(&AlarmSettings::new(TimeOfDay::new(6, 5).unwrap(), true))
        .unwrap();
    let mut mediator = Mediator::new(&state, board);
    mediator.init();

    let mut outcomes = Vec::new();
    for _ in 0..40 {
        clock.advance(Duration::from_secs(30));
        let outcome = mediator.tick();
        if outcome != TickOutcome::Nothing {
            outcomes.push((clock.time_of_day(), outcome));
        }
    }
    let at = |h, m| TimeOfDay::new(h, m).unwrap();
    assert_eq!(
        outcomes,
        vec![
            (at(6, 0), TickOutcome::Raised),
            (at(6, 5), TickOutcome::Escalated),
            (at(6, 10), TickOutcome::ForcedQuit),
        ]
    );
    assert_eq!(mediator.board().devices.sound_starts, 1);
    assert!(!mediator.board().devices.sound_playing);
    assert_eq!(mediator.mode(), Mode::Idle);
}
