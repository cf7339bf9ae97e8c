use device_query::{DeviceQuery, DeviceState, Keycode};
use log::{debug, error};
use std::collections::HashMap;
use std::sync::mpsc::Sender;

const NOTE_ON: u8 = 0x90;
const NOTE_OFF: u8 = 0x80;
const CONTROL_CHANGE: u8 = 0xB0;
const ALL_NOTES_OFF: u8 = 123;
const VELOCITY: u8 = 100;

/// Tracker layout: each row is a chromatic octave, white keys on the letter
/// row and black keys on the row above it.
const LOWER_ROW: [Keycode; 12] = [
    Keycode::Z,
    Keycode::S,
    Keycode::X,
    Keycode::D,
    Keycode::C,
    Keycode::V,
    Keycode::G,
    Keycode::B,
    Keycode::H,
    Keycode::N,
    Keycode::J,
    Keycode::M,
];
const UPPER_ROW: [Keycode; 12] = [
    Keycode::Q,
    Keycode::Key2,
    Keycode::W,
    Keycode::Key3,
    Keycode::E,
    Keycode::R,
    Keycode::Key5,
    Keycode::T,
    Keycode::Key6,
    Keycode::Y,
    Keycode::Key7,
    Keycode::U,
];
/// MIDI key of the first key in each row: C3 and C4.
const LOWER_ROW_KEY: u8 = 48;
const UPPER_ROW_KEY: u8 = 60;

/// Plays the computer keyboard as a two-octave piano on channel 0.
pub struct KeyboardHandler {
    device_state: DeviceState,
    key_states: HashMap<Keycode, bool>,
    key_to_note: HashMap<Keycode, u8>,
    panic_pressed: bool,
    midi_sender: Sender<Vec<u8>>,
}

impl KeyboardHandler {
    pub fn new(midi_sender: Sender<Vec<u8>>) -> Self {
        let key_to_note: HashMap<Keycode, u8> = LOWER_ROW
            .iter()
            .enumerate()
            .map(|(i, key)| (*key, LOWER_ROW_KEY + i as u8))
            .chain(
                UPPER_ROW
                    .iter()
                    .enumerate()
                    .map(|(i, key)| (*key, UPPER_ROW_KEY + i as u8)),
            )
            .collect();

        let key_states = key_to_note.keys().map(|key| (*key, false)).collect();

        Self {
            device_state: DeviceState::new(),
            key_states,
            key_to_note,
            panic_pressed: false,
            midi_sender,
        }
    }

    /// Polls the keyboard and sends a message for every key that changed.
    pub fn update(&mut self) {
        let keys: Vec<Keycode> = self.device_state.get_keys();

        for (key, note) in &self.key_to_note {
            let is_pressed = keys.contains(key);
            let was_pressed = self.key_states.get(key).copied().unwrap_or(false);
            if is_pressed == was_pressed {
                continue;
            }
            let message = if is_pressed {
                debug!("key {key:?} pressed, note on {note}");
                vec![NOTE_ON, *note, VELOCITY]
            } else {
                debug!("key {key:?} released, note off {note}");
                vec![NOTE_OFF, *note, 0]
            };
            if let Err(e) = self.midi_sender.send(message) {
                error!("error sending keyboard message: {e}");
            }
            self.key_states.insert(*key, is_pressed);
        }

        // escape releases everything still sounding
        let panic = keys.contains(&Keycode::Escape);
        if panic && !self.panic_pressed {
            if let Err(e) = self
                .midi_sender
                .send(vec![CONTROL_CHANGE, ALL_NOTES_OFF, 0])
            {
                error!("error sending all notes off: {e}");
            }
        }
        self.panic_pressed = panic;
    }
}
