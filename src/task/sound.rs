//! # Sound task
//!  This module contains the task that plays the alarm sound using the DFPlayer Mini module.
//!
//! The module sits behind a MOSFET and is only powered while it plays. Each play powers it on,
//! initializes it and starts the first track; stop powers it off again. While asleep, play
//! requests are ignored.
use crate::task::resources::{DfPlayerResources, Irqs};
use defmt::{Debug2Format, info, warn};
use dfplayer_async::{DfPlayer, Equalizer, PlayBackSource, TimeSource};
use embassy_rp::gpio::{Level, Output};
use embassy_rp::uart::{BufferedUart, Config};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::{Delay, Duration, Instant, Timer};
use static_cell::StaticCell;

/// Commands for the sound task
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum SoundCommand {
    /// Power the module and play the alarm track
    Play,
    /// Stop playing and cut the power
    Stop,
    /// Low power, ignore play requests
    Sleep,
    /// Accept play requests again
    Wake,
}

/// Channel for sound commands
static SOUND_CHANNEL: Channel<CriticalSectionRawMutex, SoundCommand, 4> = Channel::new();

/// Queue a sound command without waiting, `Err` if the queue is full
pub fn send_sound_command(command: SoundCommand) -> Result<(), ()> {
    SOUND_CHANNEL.try_send(command).map_err(|_| ())
}

/// Waits for the next sound command
async fn wait_for_sound_command() -> SoundCommand {
    SOUND_CHANNEL.receive().await
}

/// Volume of the alarm track
const VOLUME: u8 = 13;

// Time source implementation for DFPlayer
struct EmbassyTimeSource;

impl TimeSource for EmbassyTimeSource {
    type Instant = Instant;

    fn now(&self) -> Self::Instant {
        Instant::now()
    }

    fn is_elapsed(&self, since: Self::Instant, timeout_ms: u64) -> bool {
        Instant::now().duration_since(since) >= Duration::from_millis(timeout_ms)
    }
}

/// Power the module on and start the alarm track
async fn play(uart: &mut BufferedUart, pwr: &mut Output<'static>) {
    info!("Powering on the dfplayer");
    pwr.set_high();
    Timer::after(Duration::from_secs(1)).await;

    let feedback_enable = false; // fails to acknowledge when enabled
    let timeout = Duration::from_secs(1);
    let reset_duration_override = Some(Duration::from_millis(1000));

    let dfp_result = DfPlayer::new(
        uart,
        feedback_enable,
        timeout.as_millis(),
        EmbassyTimeSource,
        Delay,
        reset_duration_override.map(|d| d.as_millis()),
    )
    .await;

    match dfp_result {
        Ok(mut dfp) => {
            info!("Playing alarm sound");
            let _ = dfp.set_volume(VOLUME).await;
            Timer::after(Duration::from_millis(100)).await;
            let _ = dfp.set_equalizer(Equalizer::Classic).await;
            Timer::after(Duration::from_millis(100)).await;
            let _ = dfp.set_playback_source(PlayBackSource::SDCard).await;
            Timer::after(Duration::from_millis(100)).await;
            let _ = dfp.play(1).await;
        }
        Err(e) => warn!(
            "DfPlayer initialization failed with error {:?}",
            Debug2Format(&e)
        ),
    }
}

#[embassy_executor::task]
pub async fn sound_handler(r: DfPlayerResources) {
    info!("Sound task started");

    static TX_BUFFER: StaticCell<[u8; 256]> = StaticCell::new();
    static RX_BUFFER: StaticCell<[u8; 256]> = StaticCell::new();
    let mut config = Config::default();
    config.baudrate = 9600;
    let mut uart = BufferedUart::new(
        r.uart,
        r.tx_pin,
        r.rx_pin,
        Irqs,
        TX_BUFFER.init([0; 256]),
        RX_BUFFER.init([0; 256]),
        config,
    );

    // power pin, not a part of the dfplayer, using a mosfet to cut power when idle
    let mut pwr = Output::new(r.power_pin, Level::Low);
    let mut playing = false;
    let mut asleep = false;

    loop {
        let command = wait_for_sound_command().await;
        match command {
            SoundCommand::Play if asleep => warn!("Sound asleep, not playing"),
            SoundCommand::Play if playing => {}
            SoundCommand::Play => {
                play(&mut uart, &mut pwr).await;
                playing = true;
            }
            SoundCommand::Stop | SoundCommand::Sleep => {
                if playing {
                    info!("Powering off the dfplayer");
                    pwr.set_low();
                    playing = false;
                }
                asleep |= command == SoundCommand::Sleep;
            }
            SoundCommand::Wake => asleep = false,
        }
    }
}
