//! # Button Tasks
//! This module contains the tasks for the buttons. Each button has its own task.
//!
//! The tasks run on the high priority executor and report every falling edge to the control core,
//! which debounces them. The line is not sampled again after the edge.
use crate::task::board::with_mediator;
use defmt::info;
use embassy_rp::gpio::Input;
use embassy_time::Instant;
use pico_alarmclock_core::event::Button;

/// Waits for presses on one button line
#[embassy_executor::task(pool_size = 3)]
pub async fn button_handler(mut input: Input<'static>, button: Button) {
    info!("{} button task started", button);
    loop {
        // the buttons pull the line low when pressed
        input.wait_for_falling_edge().await;
        let at = Instant::now();
        if with_mediator(|m| m.on_edge(button, at)).is_none() {
            info!("{} edge before startup", button);
        }
    }
}
