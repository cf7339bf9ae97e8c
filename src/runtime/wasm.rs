use super::Source;
use crate::midi::bank::{Bank, ZoneSpec};
use crate::midi::{MidiDecoder, MidiFileSequencer};
use crate::synth::config::SAMPLE_RATE;
use crate::synth::VoiceConfig;
use js_sys::{Float32Array, Int16Array};
use wasm_bindgen::prelude::*;

/// WASM Synth runtime (no threads, no channels, direct API)
#[wasm_bindgen]
pub struct WasmSynth {
    source: Source,
    temp_buffer: Vec<f32>,
}

#[wasm_bindgen]
impl WasmSynth {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WasmSynth {
        WasmSynth {
            source: Source::Live(MidiDecoder::default()),
            temp_buffer: Vec::new(),
        }
    }

    /// Feeds raw MIDI bytes, running status included.
    #[wasm_bindgen]
    pub fn feed(&mut self, bytes: &[u8]) {
        self.source.decoder_mut().feed(bytes);
    }

    #[wasm_bindgen]
    pub fn note_on(&mut self, key: u8, velocity: u8) {
        self.feed(&[0x90, key, velocity]);
    }

    #[wasm_bindgen]
    pub fn note_off(&mut self, key: u8) {
        self.feed(&[0x80, key, 0]);
    }

    /// Starts playing a Standard MIDI File on a fresh decoder. On error the
    /// current source keeps playing.
    #[wasm_bindgen]
    pub fn load_file(&mut self, data: Vec<u8>) -> Result<(), JsError> {
        let sequencer = MidiFileSequencer::with_decoder(data, MidiDecoder::default())?;
        self.source = Source::File(sequencer);
        Ok(())
    }

    /// Drops the loaded file and goes back to live input.
    #[wasm_bindgen]
    pub fn unload_file(&mut self) {
        self.source = Source::Live(MidiDecoder::default());
    }

    #[wasm_bindgen]
    pub fn is_finished(&self) -> bool {
        self.source.is_finished()
    }

    /// Installs one 70-value preset across the whole keyboard of `channel`.
    #[wasm_bindgen]
    pub fn set_preset(&mut self, channel: u8, values: Vec<f32>) -> Result<(), JsError> {
        let config = VoiceConfig::from_values(&values)?;
        self.source
            .decoder_mut()
            .set_bank(channel, Bank::single(config));
        Ok(())
    }

    /// Installs a four-zone bank given as `[{ split, values }, ...]`.
    #[wasm_bindgen]
    pub fn set_bank(&mut self, channel: u8, bank: JsValue) -> Result<(), JsError> {
        let specs: Vec<ZoneSpec> = serde_wasm_bindgen::from_value(bank)?;
        let bank = Bank::from_specs(specs)?;
        self.source.decoder_mut().set_bank(channel, bank);
        Ok(())
    }

    /// Render audio buffer into a JS-friendly Float32Array
    #[wasm_bindgen]
    pub fn render(&mut self, length: usize) -> Float32Array {
        if self.temp_buffer.len() != length {
            self.temp_buffer = vec![0.0; length];
        }
        self.source.render_f32(&mut self.temp_buffer);
        Float32Array::from(self.temp_buffer.as_slice())
    }

    /// Renders 16-bit PCM, the format the engine produces natively.
    #[wasm_bindgen]
    pub fn render_pcm(&mut self, length: usize) -> Int16Array {
        let mut buffer = vec![0i16; length];
        self.source.render(&mut buffer);
        Int16Array::from(buffer.as_slice())
    }

    #[wasm_bindgen]
    pub fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }
}

impl Default for WasmSynth {
    fn default() -> Self {
        Self::new()
    }
}
