//! # Alarm timer task
//! Drives the alarm scheduler of the control core at a fixed interval.
use crate::task::board::with_mediator;
use defmt::info;
use embassy_time::Ticker;
use pico_alarmclock_core::alarm::TickOutcome;
use pico_alarmclock_core::config::ALARM_TICK_INTERVAL;

#[embassy_executor::task]
pub async fn alarm_timer_handler() {
    info!("Alarm timer task started");
    let mut ticker = Ticker::every(ALARM_TICK_INTERVAL);
    loop {
        ticker.next().await;
        match with_mediator(|m| m.tick()) {
            Some(TickOutcome::Paused | TickOutcome::Nothing) | None => {}
            Some(outcome) => info!("Alarm tick: {}", outcome),
        }
    }
}
