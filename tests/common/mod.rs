// Shared fixtures for the integration tests.
#![allow(dead_code)]

use fourop::synth::voice_config::{VoiceConfig, PRESET_VALUES};

/// Envelope durations of a test preset, in seconds.
#[derive(Clone, Copy)]
pub struct Shape {
    pub attack: f32,
    pub decay1: f32,
    pub sustain: f32,
    pub release: f32,
}

impl Default for Shape {
    fn default() -> Self {
        Self {
            attack: 0.01,
            decay1: 0.0,
            sustain: 1.0,
            release: 0.1,
        }
    }
}

/// 70 preset values with only operator 0 audible: a sine at the carrier.
pub fn sine_values(shape: Shape) -> [f32; PRESET_VALUES] {
    let mut values = [0.0; PRESET_VALUES];
    values[0] = 1.0; // mixer[0]
    values[6] = 1.0; // operator 0 ratio
    values[10] = shape.attack;
    values[12] = shape.decay1;
    values[14] = shape.sustain;
    values[15] = shape.release;
    values
}

pub fn sine_preset(shape: Shape) -> VoiceConfig {
    VoiceConfig::from_array(&sine_values(shape))
}

/// Builds a single-track format 0 file around raw track events.
pub fn smf(division: u16, events: &[u8]) -> Vec<u8> {
    smf_with_tracks(0, division, &[events])
}

pub fn smf_with_tracks(format: u16, division: u16, tracks: &[&[u8]]) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(b"MThd");
    data.extend_from_slice(&6u32.to_be_bytes());
    data.extend_from_slice(&format.to_be_bytes());
    data.extend_from_slice(&(tracks.len() as u16).to_be_bytes());
    data.extend_from_slice(&division.to_be_bytes());
    for events in tracks {
        data.extend_from_slice(b"MTrk");
        data.extend_from_slice(&(events.len() as u32).to_be_bytes());
        data.extend_from_slice(events);
    }
    data
}

pub fn peak(samples: &[i16]) -> i32 {
    samples.iter().map(|s| (*s as i32).abs()).max().unwrap_or(0)
}
