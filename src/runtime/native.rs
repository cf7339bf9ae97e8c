use super::Source;
use crate::audio::{AudioBackend, CpalBackend};
use crate::input::{KeyboardHandler, MidiHandler};
use crate::midi::{MidiDecoder, MidiFileSequencer};
use crate::synth::SynthConfig;
use log::info;
use std::error::Error;
use std::path::Path;
use std::sync::mpsc::{channel, Receiver};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Native runtime synth implementation for desktop/CPAL backends.
///
/// Raw MIDI messages arrive over a channel from the input threads and are
/// decoded on the audio thread at the start of every callback.
pub struct NativeSynth {
    source: Source,
    midi_receiver: Receiver<Vec<u8>>,
}

impl NativeSynth {
    pub fn new(source: Source, midi_receiver: Receiver<Vec<u8>>) -> Self {
        Self {
            source,
            midi_receiver,
        }
    }

    pub fn process(&mut self, output: &mut [f32]) {
        self.process_midi_messages();
        self.source.render_f32(output);
    }

    fn process_midi_messages(&mut self) {
        let decoder = self.source.decoder_mut();
        while let Ok(message) = self.midi_receiver.try_recv() {
            decoder.feed(&message);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.source.is_finished()
    }

    pub fn source(&self) -> &Source {
        &self.source
    }
}

/// Locks the shared synth, recovering the state if a holder panicked.
pub(crate) fn lock(synth: &Mutex<NativeSynth>) -> MutexGuard<'_, NativeSynth> {
    synth.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Runs the synth on the default output device. With a `file`, plays it to
/// the end and returns; otherwise plays live input until the process exits.
pub fn start(file: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let (midi_tx, midi_rx) = channel();

    let source = match file {
        Some(path) => {
            let data = std::fs::read(path)?;
            let sequencer = MidiFileSequencer::load(data, SynthConfig::default())?;
            info!(
                "playing {} ({} tracks)",
                path.display(),
                sequencer.track_count()
            );
            Source::File(sequencer)
        }
        None => Source::Live(MidiDecoder::default()),
    };
    let synth = Arc::new(Mutex::new(NativeSynth::new(source, midi_rx)));

    let mut audio_backend = CpalBackend::new(synth.clone());
    audio_backend.start()?;

    let mut keyboard_handler = KeyboardHandler::new(midi_tx.clone());
    let midi_handler = MidiHandler::new(midi_tx);
    if !midi_handler.is_connected() {
        info!("no MIDI input, playing from the computer keyboard");
    }

    loop {
        keyboard_handler.update();
        if lock(&synth).is_finished() {
            info!("playback finished");
            break;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    audio_backend.stop()?;
    Ok(())
}
