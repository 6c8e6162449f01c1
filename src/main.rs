//! # Pico alarm clock firmware
//! Wires the control core to the RP2040 peripherals.
//!
//! The device tasks run on the thread executor. The button tasks run on a higher priority
//! interrupt executor so a press is handled even while a device task is busy.
// we are in an environment with constrained resources, so we do not use the standard library and we define a different entry point.
#![no_std]
#![no_main]

use crate::task::alarm_timer::alarm_timer_handler;
use crate::task::board::{ALARM_STATE, FirmwareBoard, install_mediator, install_rtc};
use crate::task::buttons::button_handler;
use crate::task::display::display_handler;
use crate::task::light_effects::light_effects_handler;
use crate::task::resources::{
    ButtonResources, DfPlayerResources, DisplayResources, FlashResources, NeopixelResources,
};
use crate::task::settings::{settings_handler, wait_for_settings_loaded};
use crate::task::sound::sound_handler;
use defmt::{info, unwrap};
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_rp::gpio::{Input, Pull};
use embassy_rp::interrupt;
use embassy_rp::interrupt::{InterruptExt, Priority};
use embassy_rp::rtc::Rtc;
use pico_alarmclock_core::event::Button;
use pico_alarmclock_core::mediator::Mediator;
use {defmt_rtt as _, panic_probe as _};

mod task;

/// Executor for the button tasks
static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn SWI_IRQ_1() {
    unsafe { EXECUTOR_HIGH.on_interrupt() }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Program start");
    let p = embassy_rp::init(Default::default());

    install_rtc(Rtc::new(p.RTC));

    unwrap!(spawner.spawn(settings_handler(FlashResources {
        flash: p.FLASH,
        dma_ch: p.DMA_CH0,
    })));
    unwrap!(spawner.spawn(display_handler(DisplayResources {
        i2c0: p.I2C0,
        scl: p.PIN_13,
        sda: p.PIN_12,
    })));
    unwrap!(spawner.spawn(light_effects_handler(NeopixelResources {
        spi: p.SPI0,
        clk_pin: p.PIN_18,
        mosi_pin: p.PIN_19,
        tx_dma_ch: p.DMA_CH1,
    })));
    unwrap!(spawner.spawn(sound_handler(DfPlayerResources {
        uart: p.UART1,
        tx_pin: p.PIN_4,
        rx_pin: p.PIN_5,
        power_pin: p.PIN_8,
    })));

    // the control core reads its settings on init
    wait_for_settings_loaded().await;
    let mut mediator = Mediator::new(&ALARM_STATE, FirmwareBoard::new());
    mediator.init();
    install_mediator(mediator);

    unwrap!(spawner.spawn(alarm_timer_handler()));

    let buttons = ButtonResources {
        green: p.PIN_20,
        blue: p.PIN_21,
        yellow: p.PIN_22,
    };
    interrupt::SWI_IRQ_1.set_priority(Priority::P2);
    let high_spawner = EXECUTOR_HIGH.start(interrupt::SWI_IRQ_1);
    unwrap!(high_spawner.spawn(button_handler(
        Input::new(buttons.green, Pull::Up),
        Button::Green
    )));
    unwrap!(high_spawner.spawn(button_handler(
        Input::new(buttons.blue, Pull::Up),
        Button::Blue
    )));
    unwrap!(high_spawner.spawn(button_handler(
        Input::new(buttons.yellow, Pull::Up),
        Button::Yellow
    )));

    info!("All tasks started");
}
