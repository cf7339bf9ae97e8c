//! Four-operator phase-modulation synthesizer driven by MIDI.
//!
//! [`midi::MidiDecoder`] turns a live byte stream into voice pool activity,
//! [`midi::MidiFileSequencer`] plays Standard MIDI Files through it, and both
//! render mono 16-bit PCM at [`synth::config::SAMPLE_RATE`].

pub mod error;
pub mod midi;
pub mod runtime;
pub mod synth;

#[cfg(feature = "native")]
pub mod audio;
#[cfg(feature = "native")]
pub mod input;

pub use error::{LoadError, PresetError};
pub use midi::{Bank, MidiDecoder, MidiFileSequencer};
pub use synth::{SynthConfig, VoiceConfig};
