//! # Display task
//! This module contains the task that draws on the OLED display.
//!
//! The control core sends commands describing what the two areas of the screen show: the first
//! row (alarm state or the next quit token) and the content area below it. The task keeps that
//! model and redraws the whole buffer after every change, and every blink period while the clock
//! is refreshing or an edited time blinks.
use crate::task::board::{ClockSpeed, clock_speed, wall_clock};
use crate::task::resources::{DisplayResources, Irqs};
use core::fmt::Write;
use defmt::{Debug2Format, error, info, warn};
use embassy_futures::select::{Either, select};
use embassy_rp::i2c::{Config, I2c};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::Timer;
use embedded_graphics::{
    mono_font::{
        MonoTextStyle, MonoTextStyleBuilder,
        ascii::{FONT_6X13, FONT_10X20},
    },
    pixelcolor::BinaryColor,
    prelude::*,
    text::{Baseline, Text},
};
use heapless::String;
use pico_alarmclock_core::config::BLINK_INTERVAL;
use pico_alarmclock_core::event::Button;
use pico_alarmclock_core::state::{AlarmSettings, SystemScreen, TimeOfDay};
use ssd1306_async::{I2CDisplayInterface, Ssd1306, prelude::*};

/// Commands for the display task
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum DisplayCommand {
    /// Clock face with the alarm settings in the first row
    Clock(AlarmSettings),
    /// Quit token to press next and its position
    QuitToken(Button, usize),
    /// Blank the first row
    ClearFirstRow,
    /// Blank the content area
    ClearContent,
    /// Alarm enabled indicator
    AlarmState(bool),
    /// Blink a time being edited
    Blink(TimeOfDay),
    /// Stop blinking
    StopBlink,
    /// Periodic refresh of the clock face on or off
    ClockRefresh(bool),
    /// A system menu screen
    System(SystemScreen),
    /// Turn the panel off
    Sleep,
    /// Turn the panel back on
    Wake,
}

/// Channel for display commands
static DISPLAY_CHANNEL: Channel<CriticalSectionRawMutex, DisplayCommand, 16> = Channel::new();

/// Queue a display command without waiting, `Err` if the queue is full
pub fn send_display_command(command: DisplayCommand) -> Result<(), ()> {
    DISPLAY_CHANNEL.try_send(command).map_err(|_| ())
}

/// Waits for the next display command
async fn wait_for_display_command() -> DisplayCommand {
    DISPLAY_CHANNEL.receive().await
}

/// What the first row shows
#[derive(Clone, Copy)]
enum FirstRow {
    /// Nothing
    Blank,
    /// Alarm time and whether it is enabled
    Status,
    /// The quit token to press next
    QuitToken(Button, usize),
}

/// What the content area shows
#[derive(Clone, Copy)]
enum Content {
    /// Nothing
    Blank,
    /// The wall clock
    Clock,
    /// An alarm time being edited
    Editing(TimeOfDay),
    /// A system menu screen
    System(SystemScreen),
}

/// The screen as the control core described it
struct Screen {
    /// Last alarm settings shown
    alarm: AlarmSettings,
    /// First row
    first_row: FirstRow,
    /// Content area
    content: Content,
    /// The clock face refreshes periodically
    clock_refresh: bool,
    /// Blink phase of an edited time
    blink_visible: bool,
    /// The panel is off
    asleep: bool,
}

impl Screen {
    /// Blank screen
    const fn new() -> Self {
        Self {
            alarm: AlarmSettings::new(TimeOfDay::MIDNIGHT, false),
            first_row: FirstRow::Blank,
            content: Content::Blank,
            clock_refresh: false,
            blink_visible: true,
            asleep: false,
        }
    }

    /// Apply a command, returns whether the screen has to be redrawn
    fn apply(&mut self, command: DisplayCommand) -> bool {
        match command {
            DisplayCommand::Clock(settings) => {
                self.alarm = settings;
                self.first_row = FirstRow::Status;
                self.content = Content::Clock;
            }
            DisplayCommand::QuitToken(token, index) => {
                self.first_row = FirstRow::QuitToken(token, index);
            }
            DisplayCommand::ClearFirstRow => self.first_row = FirstRow::Blank,
            DisplayCommand::ClearContent => self.content = Content::Blank,
            DisplayCommand::AlarmState(enabled) => {
                self.alarm.enabled = enabled;
                self.first_row = FirstRow::Status;
            }
            DisplayCommand::Blink(time) => {
                self.alarm.time = time;
                self.content = Content::Editing(time);
                self.blink_visible = true;
            }
            DisplayCommand::StopBlink => self.content = Content::Blank,
            DisplayCommand::ClockRefresh(on) => {
                self.clock_refresh = on;
                return false;
            }
            DisplayCommand::System(screen) => self.content = Content::System(screen),
            DisplayCommand::Sleep => self.asleep = true,
            DisplayCommand::Wake => self.asleep = false,
        }
        true
    }

    /// Advance the blink phase, returns whether the screen has to be redrawn
    const fn tick(&mut self) -> bool {
        if self.asleep {
            return false;
        }
        match self.content {
            Content::Editing(_) => {
                self.blink_visible = !self.blink_visible;
                true
            }
            Content::Clock => self.clock_refresh,
            Content::Blank | Content::System(_) => false,
        }
    }
}

/// Text of the first row
fn first_row_text(screen: &Screen) -> String<24> {
    let mut text = String::new();
    let _ = match screen.first_row {
        FirstRow::Blank => Ok(()),
        FirstRow::Status => write!(
            text,
            "Alarm {} {}",
            screen.alarm.time.to_hhmm(),
            if screen.alarm.enabled { "on" } else { "off" }
        ),
        FirstRow::QuitToken(token, index) => {
            write!(text, "Press {} ({}/3)", token.name(), index + 1)
        }
    };
    text
}

/// Draw `text` at `position`, logging a failure
fn draw_text<D>(display: &mut D, text: &str, position: Point, style: MonoTextStyle<'_, BinaryColor>)
where
    D: DrawTarget<Color = BinaryColor>,
    D::Error: core::fmt::Debug,
{
    if let Err(e) = Text::with_baseline(text, position, style, Baseline::Top).draw(display) {
        warn!("Failed to draw text: {:?}", Debug2Format(&e));
    }
}

/// Draw the whole screen into the buffer
fn draw<D>(display: &mut D, screen: &Screen)
where
    D: DrawTarget<Color = BinaryColor>,
    D::Error: core::fmt::Debug,
{
    let small = MonoTextStyleBuilder::new()
        .font(&FONT_6X13)
        .text_color(BinaryColor::On)
        .build();
    let large = MonoTextStyleBuilder::new()
        .font(&FONT_10X20)
        .text_color(BinaryColor::On)
        .build();

    if let Err(e) = display.clear(BinaryColor::Off) {
        warn!("Failed to clear display buffer: {:?}", Debug2Format(&e));
    }
    draw_text(display, &first_row_text(screen), Point::new(0, 0), small);

    let mut text: String<24> = String::new();
    match screen.content {
        Content::Blank => {}
        Content::Clock => {
            let (hour, minute, second) = wall_clock();
            let _ = write!(text, "{hour:02}:{minute:02}:{second:02}");
            draw_text(display, &text, Point::new(24, 26), large);
        }
        Content::Editing(time) => {
            draw_text(display, "Set alarm", Point::new(0, 16), small);
            if screen.blink_visible {
                draw_text(display, &time.to_hhmm(), Point::new(39, 34), large);
            }
        }
        Content::System(SystemScreen::Select) => {
            draw_text(display, "green: power off", Point::new(0, 16), small);
            draw_text(display, "blue:  info", Point::new(0, 30), small);
            draw_text(display, "yellow: back", Point::new(0, 44), small);
        }
        Content::System(SystemScreen::Info) => {
            let speed = match clock_speed() {
                ClockSpeed::Low => "low",
                ClockSpeed::Medium => "medium",
                ClockSpeed::Full => "full",
            };
            let _ = write!(text, "clock: {speed}");
            draw_text(display, env!("CARGO_PKG_NAME"), Point::new(0, 16), small);
            draw_text(display, env!("CARGO_PKG_VERSION"), Point::new(0, 30), small);
            draw_text(display, &text, Point::new(0, 44), small);
        }
        Content::System(SystemScreen::Shutdown) => {
            draw_text(display, "Power off?", Point::new(0, 16), small);
            draw_text(display, "yellow: confirm", Point::new(0, 34), small);
        }
    }
}

#[embassy_executor::task]
pub async fn display_handler(r: DisplayResources) {
    info!("Display task started");

    let mut config = Config::default();
    config.frequency = 400_000;
    let i2c = I2c::new_async(r.i2c0, r.scl, r.sda, Irqs, config);

    let interface = I2CDisplayInterface::new(i2c);
    let mut display = Ssd1306::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
        .into_buffered_graphics_mode();
    if let Err(e) = display.init().await {
        error!("Failed to initialize display: {}", Debug2Format(&e));
        return;
    }
    if let Err(e) = display.set_brightness(Brightness::DIM).await {
        warn!("Failed to dim display: {}", Debug2Format(&e));
    }

    let mut screen = Screen::new();

    loop {
        let redraw = match select(wait_for_display_command(), Timer::after(BLINK_INTERVAL)).await {
            Either::First(command) => {
                let was_asleep = screen.asleep;
                let redraw = screen.apply(command);
                if was_asleep != screen.asleep {
                    info!("Display {}", if screen.asleep { "off" } else { "on" });
                    if let Err(e) = display.set_display_on(!screen.asleep).await {
                        warn!("Failed to switch display: {}", Debug2Format(&e));
                    }
                }
                redraw && !screen.asleep
            }
            Either::Second(()) => screen.tick(),
        };

        if redraw {
            draw(&mut display, &screen);
            // nothing is sent to the display before flush()
            if let Err(e) = display.flush().await {
                warn!("Failed to flush display: {}", Debug2Format(&e));
            }
        }
    }
}
