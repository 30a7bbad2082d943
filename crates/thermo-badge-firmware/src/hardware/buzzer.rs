//! Piezo buzzer driven by a bit-banged square wave
//!
//! Blocking playback toggles the pin from the caller's context with a busy
//! delay. Background playback is handed to [`run_background`] through a
//! small queue, so the caller returns immediately.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::{Duration, Timer};
use embedded_hal::delay::DelayNs;
use esp_hal::gpio::Output;
use log::{debug, warn};

use thermo_badge_core::{AudioOutput, Melody, Playable, PlaybackMode, SquareWave};

pub const BACKGROUND_QUEUE_DEPTH: usize = 4;

/// Buzzer output shared by blocking and background playback. Filled once
/// at boot.
pub type BuzzerPin = Mutex<CriticalSectionRawMutex, RefCell<Option<Output<'static>>>>;

pub type BackgroundQueue = Channel<CriticalSectionRawMutex, Playable, BACKGROUND_QUEUE_DEPTH>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuzzerError {
    /// Background queue full, the sound was not started
    QueueFull,
}

pub struct BuzzerAudio {
    pin: &'static BuzzerPin,
    queue: &'static BackgroundQueue,
    tempo_bpm: u16,
}

impl BuzzerAudio {
    pub fn new(pin: &'static BuzzerPin, queue: &'static BackgroundQueue, tempo_bpm: u16) -> Self {
        Self {
            pin,
            queue,
            tempo_bpm,
        }
    }
}

impl AudioOutput for BuzzerAudio {
    type Error = BuzzerError;

    fn play(&mut self, playable: Playable, mode: PlaybackMode) -> Result<(), Self::Error> {
        match mode {
            PlaybackMode::UntilDone => {
                let mut delay = embassy_time::Delay;
                for_each_note(playable, self.tempo_bpm, |frequency_hz, duration| {
                    match SquareWave::for_note(frequency_hz, duration) {
                        Some(wave) => {
                            for _ in 0..wave.cycles {
                                set_level(self.pin, true);
                                delay.delay_us(wave.half_period_us);
                                set_level(self.pin, false);
                                delay.delay_us(wave.half_period_us);
                            }
                        }
                        None => delay.delay_us(duration.as_micros() as u32),
                    }
                });
                Ok(())
            }
            PlaybackMode::InBackground => self.queue.try_send(playable).map_err(|_| {
                warn!("Buzzer queue full, dropping {:?}", playable);
                BuzzerError::QueueFull
            }),
        }
    }
}

/// Play queued sounds forever. Spawn once from the firmware entry point.
pub async fn run_background(
    pin: &'static BuzzerPin,
    queue: &'static BackgroundQueue,
    tempo_bpm: u16,
) -> ! {
    loop {
        let playable = queue.receive().await;
        debug!("Background playback: {:?}", playable);

        let mut notes: heapless::Vec<(u16, Duration), 8> = heapless::Vec::new();
        for_each_note(playable, tempo_bpm, |frequency_hz, duration| {
            let _ = notes.push((frequency_hz, duration));
        });

        for (frequency_hz, duration) in notes {
            match SquareWave::for_note(frequency_hz, duration) {
                Some(wave) => {
                    let half = Duration::from_micros(u64::from(wave.half_period_us));
                    for _ in 0..wave.cycles {
                        set_level(pin, true);
                        Timer::after(half).await;
                        set_level(pin, false);
                        Timer::after(half).await;
                    }
                }
                None => Timer::after(duration).await,
            }
        }
    }
}

fn for_each_note(playable: Playable, tempo_bpm: u16, mut f: impl FnMut(u16, Duration)) {
    match playable {
        Playable::Tone(tone) => f(tone.frequency_hz, tone.length.duration(tempo_bpm)),
        Playable::Melody(melody) => {
            for note in melody.notes() {
                f(note.frequency_hz, Melody::note_duration(*note, tempo_bpm));
            }
        }
    }
}

fn set_level(pin: &BuzzerPin, high: bool) {
    pin.lock(|cell| {
        if let Some(output) = cell.borrow_mut().as_mut() {
            if high {
                output.set_high();
            } else {
                output.set_low();
            }
        }
    });
}
