//! Embeddings of the engine into a host: a native audio thread or JavaScript.

use crate::midi::{MidiDecoder, MidiFileSequencer};

#[cfg(feature = "wasm")]
pub mod wasm;
#[cfg(feature = "wasm")]
pub use wasm::WasmSynth;

#[cfg(feature = "native")]
pub mod native;
#[cfg(feature = "native")]
pub use native::NativeSynth;

/// What a runtime renders from.
pub enum Source {
    /// Live input only.
    Live(MidiDecoder),
    /// A Standard MIDI File; live bytes are mixed into its decoder.
    File(MidiFileSequencer),
}

impl Source {
    /// The decoder that live bytes go to.
    pub fn decoder_mut(&mut self) -> &mut MidiDecoder {
        match self {
            Source::Live(decoder) => decoder,
            Source::File(sequencer) => sequencer.decoder_mut(),
        }
    }

    pub fn decoder(&self) -> &MidiDecoder {
        match self {
            Source::Live(decoder) => decoder,
            Source::File(sequencer) => sequencer.decoder(),
        }
    }

    pub fn render(&mut self, buffer: &mut [i16]) {
        match self {
            Source::Live(decoder) => decoder.render(buffer),
            Source::File(sequencer) => sequencer.render(buffer),
        }
    }

    pub fn render_f32(&mut self, buffer: &mut [f32]) {
        match self {
            Source::Live(decoder) => decoder.render_f32(buffer),
            Source::File(sequencer) => sequencer.render_f32(buffer),
        }
    }

    /// True once a file has played out and its last voice has gone quiet.
    /// Live input never finishes.
    pub fn is_finished(&self) -> bool {
        match self {
            Source::Live(_) => false,
            Source::File(sequencer) => {
                sequencer.is_end()
                    && sequencer
                        .decoder()
                        .pool()
                        .voices()
                        .iter()
                        .all(|voice| !voice.is_active())
            }
        }
    }
}
