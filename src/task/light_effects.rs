//! # Light effects task
//! This module contains the task that owns the neopixel LED ring.
//!
//! While the clock render timer runs, the ring shows the time as an analog clock, refreshed every
//! second. On an alarm the task hands the ring to the alarm light show, which runs until the alarm
//! is no longer raised, and then takes it back.
use crate::task::board::{ALARM_STATE, wall_clock};
use crate::task::resources::NeopixelResources;
use defmt::{info, warn};
use embassy_futures::select::{Either, select};
use embassy_rp::peripherals::SPI0;
use embassy_rp::spi::{Async, Config, Spi};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::{Delay, Timer};
use pico_alarmclock_core::config::{CLOCK_BRIGHTNESS, CLOCK_REFRESH_INTERVAL, NUM_LEDS};
use pico_alarmclock_core::light_show::AlarmShow;
use pico_alarmclock_core::ring::{ClockColors, DARK, Frame, analog_clock};
use smart_leds::{SmartLedsWriteAsync, brightness};
use ws2812_async::{Grb, Ws2812};

/// Commands for the light effects task
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum LightsCommand {
    /// Turn every LED off
    AllOff,
    /// Analog clock rendering on or off
    ClockRender(bool),
    /// Run the alarm light show
    AlarmShow,
}

/// Channel for light effects commands
static LIGHTS_CHANNEL: Channel<CriticalSectionRawMutex, LightsCommand, 8> = Channel::new();

/// Queue a light effects command without waiting, `Err` if the queue is full
pub fn send_lights_command(command: LightsCommand) -> Result<(), ()> {
    LIGHTS_CHANNEL.try_send(command).map_err(|_| ())
}

/// Waits for the next light effects command
async fn wait_for_lights_command() -> LightsCommand {
    LIGHTS_CHANNEL.receive().await
}

/// Type alias for the neopixel LED controller
type NeopixelType = Ws2812<Spi<'static, SPI0, Async>, Grb, { 12 * NUM_LEDS }>;

/// Write a frame at `level` brightness
async fn write_frame(np: &mut NeopixelType, frame: &Frame, level: u8) {
    if np
        .write(brightness(frame.iter().copied(), level))
        .await
        .is_err()
    {
        warn!("Failed to write to the neopixel ring");
    }
}

/// Render the current time as an analog clock
async fn render_clock(np: &mut NeopixelType, colors: &ClockColors) {
    let (hour, minute, second) = wall_clock();
    write_frame(np, &analog_clock(hour, minute, second, colors), CLOCK_BRIGHTNESS).await;
}

#[embassy_executor::task]
pub async fn light_effects_handler(r: NeopixelResources) {
    info!("Light effects task started");

    let mut config = Config::default();
    config.frequency = 3_800_000;
    let spi = Spi::new_txonly(r.spi, r.clk_pin, r.mosi_pin, r.tx_dma_ch, config);
    let mut np: NeopixelType = Ws2812::new(spi);
    let colors = ClockColors::new();
    let mut clock_render = false;

    // All off initially
    write_frame(&mut np, &DARK, 0).await;

    loop {
        let command = if clock_render {
            match select(wait_for_lights_command(), Timer::after(CLOCK_REFRESH_INTERVAL)).await {
                Either::First(command) => Some(command),
                Either::Second(()) => None,
            }
        } else {
            Some(wait_for_lights_command().await)
        };

        match command {
            None => render_clock(&mut np, &colors).await,
            Some(LightsCommand::AllOff) => write_frame(&mut np, &DARK, 0).await,
            Some(LightsCommand::ClockRender(on)) => {
                clock_render = on;
                if on {
                    render_clock(&mut np, &colors).await;
                }
            }
            Some(LightsCommand::AlarmShow) => {
                let mut show = AlarmShow::new(ALARM_STATE.watch(), np, Delay);
                show.run().await;
                np = show.into_ring();
            }
        }
    }
}
