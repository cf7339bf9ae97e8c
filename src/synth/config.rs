use crate::midi::bank::Bank;

/// Output sample rate in Hz.
pub const SAMPLE_RATE: u32 = 44_100;
/// Duration of one sample tick in seconds.
pub const SAMPLE_DELTA: f32 = 1.0 / SAMPLE_RATE as f32;
/// Number of simultaneously sounding voices.
pub const POLYPHONY: usize = 16;
/// Number of MIDI channels with their own controller state and bank.
pub const CHANNEL_COUNT: usize = 16;
/// Operators per voice.
pub const OPERATORS: usize = 4;
/// Channel index that never allocates voices.
pub const NON_MELODIC_CHANNEL: u8 = 10;

#[derive(Clone, Debug)]
pub struct SynthConfig {
    /// Bank installed on every channel at startup, on program change and on
    /// reset-all-controllers.
    pub default_bank: Bank,
}

impl SynthConfig {
    pub fn with_bank(default_bank: Bank) -> Self {
        Self { default_bank }
    }
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            default_bank: Bank::piano(),
        }
    }
}
