//! Static timbre parameters and the flat float formats they load from.
//!
//! A voice preset is 70 floats:
//!
//! ```text
//! mixer[4] fazz lfo_rate operator[4]
//! ```
//!
//! where each operator block is 16 floats:
//!
//! ```text
//! ratio sweep ksr delay attack hold decay1 decay2 sustain release mod[4] lfo waveform
//! ```
//!
//! `fazz`, `lfo_rate`, `sweep` and `lfo` are accepted but unused.

use std::str::FromStr;

use super::config::OPERATORS;
use super::waveform::Waveform;
use crate::error::PresetError;

pub const ENVELOPE_VALUES: usize = 8;
pub const OPERATOR_VALUES: usize = 16;
pub const PRESET_VALUES: usize = 70;

const MIXER_OFFSET: usize = 0;
const OPERATORS_OFFSET: usize = 6;

fn checked_array<const N: usize>(values: &[f32]) -> Result<&[f32; N], PresetError> {
    values.try_into().map_err(|_| PresetError::ValueCount {
        expected: N,
        found: values.len(),
    })
}

/// Turns a duration into the signed per-second rate the envelope steps by.
/// Zero stays zero, meaning the phase is skipped.
fn to_rate(duration: f32, sign: f32) -> f32 {
    if duration != 0.0 {
        sign / duration
    } else {
        0.0
    }
}

fn from_rate(rate: f32) -> f32 {
    if rate != 0.0 {
        rate.recip().abs()
    } else {
        0.0
    }
}

/// Envelope shape. `attack`, `decay1`, `decay2` and `release` hold rates
/// (`1/attack`, `-1/decay1`, ...) rather than durations.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EnvelopeConfig {
    pub ksr: f32,
    pub delay: f32,
    pub attack: f32,
    pub hold: f32,
    pub decay1: f32,
    pub decay2: f32,
    pub sustain: f32,
    pub release: f32,
}

impl EnvelopeConfig {
    pub fn from_values(values: &[f32]) -> Result<Self, PresetError> {
        checked_array::<ENVELOPE_VALUES>(values).map(Self::from_array)
    }

    pub fn from_array(values: &[f32; ENVELOPE_VALUES]) -> Self {
        let [ksr, delay, attack, hold, decay1, decay2, sustain, release] = *values;
        Self {
            ksr,
            delay,
            attack: to_rate(attack, 1.0),
            hold,
            decay1: to_rate(decay1, -1.0),
            decay2: to_rate(decay2, -1.0),
            sustain,
            release: to_rate(release, -1.0),
        }
    }

    /// Durations in load order, the inverse of [`EnvelopeConfig::from_array`].
    pub fn to_array(&self) -> [f32; ENVELOPE_VALUES] {
        [
            self.ksr,
            self.delay,
            from_rate(self.attack),
            self.hold,
            from_rate(self.decay1),
            from_rate(self.decay2),
            self.sustain,
            from_rate(self.release),
        ]
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OperatorConfig {
    /// Frequency relative to the voice's carrier frequency.
    pub ratio: f32,
    pub envelope: EnvelopeConfig,
    /// Phase-modulation weight of each operator's previous output, own slot included.
    pub modulation: [f32; OPERATORS],
    pub waveform: Waveform,
}

impl OperatorConfig {
    pub fn from_values(values: &[f32]) -> Result<Self, PresetError> {
        checked_array::<OPERATOR_VALUES>(values).map(Self::from_array)
    }

    pub fn from_array(values: &[f32; OPERATOR_VALUES]) -> Self {
        let mut envelope = [0.0; ENVELOPE_VALUES];
        envelope.copy_from_slice(&values[2..10]);
        let mut modulation = [0.0; OPERATORS];
        modulation.copy_from_slice(&values[10..14]);
        Self {
            ratio: values[0],
            envelope: EnvelopeConfig::from_array(&envelope),
            modulation,
            waveform: Waveform::from_value(values[15]),
        }
    }

    pub fn to_array(&self) -> [f32; OPERATOR_VALUES] {
        let mut values = [0.0; OPERATOR_VALUES];
        values[0] = self.ratio;
        values[2..10].copy_from_slice(&self.envelope.to_array());
        values[10..14].copy_from_slice(&self.modulation);
        values[15] = self.waveform.id() as f32;
        values
    }
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            ratio: 1.0,
            envelope: EnvelopeConfig::default(),
            modulation: [0.0; OPERATORS],
            waveform: Waveform::Sine,
        }
    }
}

/// One timbre preset: four operators and the mixer weights that sum them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VoiceConfig {
    /// Output weight of each operator. Never sums above 1.
    pub mixer: [f32; OPERATORS],
    pub operators: [OperatorConfig; OPERATORS],
}

impl VoiceConfig {
    pub fn from_values(values: &[f32]) -> Result<Self, PresetError> {
        checked_array::<PRESET_VALUES>(values).map(Self::from_array)
    }

    pub fn from_array(values: &[f32; PRESET_VALUES]) -> Self {
        let mut mixer = [0.0; OPERATORS];
        mixer.copy_from_slice(&values[MIXER_OFFSET..MIXER_OFFSET + OPERATORS]);
        let sum: f32 = mixer.iter().sum();
        if sum > 1.0 {
            mixer.iter_mut().for_each(|weight| *weight /= sum);
        }

        let mut operators = [OperatorConfig::default(); OPERATORS];
        for (i, operator) in operators.iter_mut().enumerate() {
            let start = OPERATORS_OFFSET + i * OPERATOR_VALUES;
            let mut block = [0.0; OPERATOR_VALUES];
            block.copy_from_slice(&values[start..start + OPERATOR_VALUES]);
            *operator = OperatorConfig::from_array(&block);
        }

        Self { mixer, operators }
    }

    /// Parses a JSON array of 70 numbers.
    pub fn from_json(json: &str) -> Result<Self, PresetError> {
        let values: Vec<f32> = serde_json::from_str(json)?;
        Self::from_values(&values)
    }

    /// Flattens the preset back into the 70-value format. The unused slots
    /// come back as zero.
    pub fn to_values(&self) -> [f32; PRESET_VALUES] {
        let mut values = [0.0; PRESET_VALUES];
        values[MIXER_OFFSET..MIXER_OFFSET + OPERATORS].copy_from_slice(&self.mixer);
        for (i, operator) in self.operators.iter().enumerate() {
            let start = OPERATORS_OFFSET + i * OPERATOR_VALUES;
            values[start..start + OPERATOR_VALUES].copy_from_slice(&operator.to_array());
        }
        values
    }
}

/// Parses comma and/or whitespace separated floats, the format the
/// parameter-fitting tool writes.
impl FromStr for VoiceConfig {
    type Err = PresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|token| !token.is_empty())
            .map(|token| {
                token
                    .parse::<f32>()
                    .map_err(|_| PresetError::InvalidNumber(token.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_values(&values)
    }
}
