//! Audio model: tones, melodies and the playback port
//!
//! Durations follow the classic micro:bit music model: one beat lasts
//! `60000 / tempo_bpm` milliseconds and melody notes are measured in ticks
//! of a quarter beat.

use core::fmt::Debug;

use embassy_time::Duration;
use serde::{Deserialize, Serialize};

/// Default playback tempo in beats per minute.
pub const DEFAULT_TEMPO_BPM: u16 = 120;

/// Ticks per beat for melody notes.
pub const TICKS_PER_BEAT: u64 = 4;

/// Whether a playback request waits for the sound to finish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackMode {
    /// Return only after playback has finished. Blocks the caller.
    UntilDone,
    /// Start playback and return immediately.
    InBackground,
}

/// Length of a tone as a fraction of one beat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BeatFraction {
    Breve,
    Double,
    Whole,
    Half,
    Quarter,
    Eighth,
    Sixteenth,
}

impl BeatFraction {
    /// Duration of this fraction at the given tempo.
    pub fn duration(self, tempo_bpm: u16) -> Duration {
        let beat_ms = beat_ms(tempo_bpm);
        let ms = match self {
            Self::Breve => beat_ms * 4,
            Self::Double => beat_ms * 2,
            Self::Whole => beat_ms,
            Self::Half => beat_ms / 2,
            Self::Quarter => beat_ms / 4,
            Self::Eighth => beat_ms / 8,
            Self::Sixteenth => beat_ms / 16,
        };
        Duration::from_millis(ms)
    }
}

fn beat_ms(tempo_bpm: u16) -> u64 {
    60_000 / u64::from(tempo_bpm.max(1))
}

/// A single tone of fixed pitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tone {
    pub frequency_hz: u16,
    pub length: BeatFraction,
}

impl Tone {
    pub const fn new(frequency_hz: u16, length: BeatFraction) -> Self {
        Self {
            frequency_hz,
            length,
        }
    }
}

/// One note of a built-in melody. A frequency of 0 is a rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Note {
    pub frequency_hz: u16,
    pub ticks: u8,
}

/// Built-in melodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Melody {
    /// Short two-note chime: B5 then E6.
    BaDing,
}

const BA_DING: [Note; 2] = [
    Note {
        frequency_hz: 988,
        ticks: 1,
    },
    Note {
        frequency_hz: 1319,
        ticks: 3,
    },
];

impl Melody {
    pub const fn notes(self) -> &'static [Note] {
        match self {
            Self::BaDing => &BA_DING,
        }
    }

    /// Duration of one note at the given tempo.
    pub fn note_duration(note: Note, tempo_bpm: u16) -> Duration {
        Duration::from_millis(u64::from(note.ticks) * beat_ms(tempo_bpm) / TICKS_PER_BEAT)
    }
}

/// Anything the audio output can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Playable {
    Tone(Tone),
    Melody(Melody),
}

impl Playable {
    /// Total playback duration at the given tempo.
    pub fn duration(self, tempo_bpm: u16) -> Duration {
        match self {
            Self::Tone(tone) => tone.length.duration(tempo_bpm),
            Self::Melody(melody) => melody
                .notes()
                .iter()
                .fold(Duration::from_ticks(0), |total, note| {
                    total + Melody::note_duration(*note, tempo_bpm)
                }),
        }
    }
}

/// Port for the badge's sound output.
///
/// Implementations must honour the [`PlaybackMode`] contract: `UntilDone`
/// returns only once the sound has finished, `InBackground` returns as soon
/// as playback has been started.
pub trait AudioOutput {
    type Error: Debug;

    fn play(&mut self, playable: Playable, mode: PlaybackMode) -> Result<(), Self::Error>;
}

/// Timing for driving a piezo buzzer with a bit-banged square wave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SquareWave {
    /// Time the pin stays in each level
    pub half_period_us: u32,
    /// Number of full high/low cycles
    pub cycles: u32,
}

impl SquareWave {
    /// Square wave for a note of the given pitch and length.
    ///
    /// Returns `None` for rests (0 Hz), during which the pin stays low.
    pub fn for_note(frequency_hz: u16, duration: Duration) -> Option<Self> {
        if frequency_hz == 0 {
            return None;
        }
        let half_period_us = 500_000 / u32::from(frequency_hz);
        let period_us = u64::from(half_period_us.max(1)) * 2;
        let cycles = (duration.as_micros() / period_us) as u32;
        Some(Self {
            half_period_us,
            cycles,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_beat_at_default_tempo() {
        let tone = Playable::Tone(Tone::new(294, BeatFraction::Whole));
        assert_eq!(tone.duration(DEFAULT_TEMPO_BPM).as_millis(), 500);
    }

    #[test]
    fn test_beat_fractions_scale_with_tempo() {
        assert_eq!(BeatFraction::Half.duration(120).as_millis(), 250);
        assert_eq!(BeatFraction::Double.duration(60).as_millis(), 2000);
        assert_eq!(BeatFraction::Sixteenth.duration(120).as_millis(), 31);
    }

    #[test]
    fn test_ba_ding_lasts_one_beat() {
        // 1 + 3 ticks of a quarter beat each
        let melody = Playable::Melody(Melody::BaDing);
        assert_eq!(melody.duration(120).as_millis(), 500);
    }

    #[test]
    fn test_zero_tempo_does_not_divide_by_zero() {
        assert_eq!(BeatFraction::Whole.duration(0).as_millis(), 60_000);
    }

    #[test]
    fn test_square_wave_for_alert_tone() {
        let wave = SquareWave::for_note(294, Duration::from_millis(500)).unwrap();
        assert_eq!(wave.half_period_us, 1700);
        assert_eq!(wave.cycles, 147);
    }

    #[test]
    fn test_square_wave_rest() {
        assert_eq!(SquareWave::for_note(0, Duration::from_millis(100)), None);
    }
}
