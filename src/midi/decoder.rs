use log::debug;

use crate::midi::bank::Bank;
use crate::synth::channel::ChannelState;
use crate::synth::config::{SynthConfig, CHANNEL_COUNT, NON_MELODIC_CHANNEL};
use crate::synth::normalizer::Normalizer;
use crate::synth::pool::VoicePool;

/// Keys below this have no internal note number.
const LOWEST_KEY: u8 = 12;

const CC_MODULATION: u8 = 1;
const CC_VOLUME: u8 = 7;
const CC_PAN: u8 = 10;
const CC_EXPRESSION: u8 = 11;
const CC_SUSTAIN: u8 = 64;
const CC_RESET_ALL_CONTROLLERS: u8 = 121;
const CC_ALL_NOTES_OFF: u8 = 123;

/// Where the decoder is inside the current channel message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    WaitingForStatus,
    NoteOffKey,
    NoteOffVelocity { key: u8 },
    NoteOnKey,
    NoteOnVelocity { key: u8 },
    PolyPressureKey,
    PolyPressureValue,
    ControlNumber,
    ControlValue { controller: u8 },
    ProgramChange,
    ChannelPressure,
    PitchBendLsb,
    PitchBendMsb { lsb: u8 },
}

impl DecoderState {
    /// First data-byte state of a channel message class.
    fn for_status(status: u8) -> Self {
        match status & 0xF0 {
            0x80 => Self::NoteOffKey,
            0x90 => Self::NoteOnKey,
            0xA0 => Self::PolyPressureKey,
            0xB0 => Self::ControlNumber,
            0xC0 => Self::ProgramChange,
            0xD0 => Self::ChannelPressure,
            _ => Self::PitchBendLsb,
        }
    }
}

/// Running-status MIDI byte decoder driving the voice pool.
///
/// Owns the controller state and preset bank of every channel; feed it bytes
/// with [`event`](Self::event) and pull audio with [`render`](Self::render).
pub struct MidiDecoder {
    state: DecoderState,
    running_status: Option<u8>,
    channel: u8,
    channels: [ChannelState; CHANNEL_COUNT],
    banks: Vec<Bank>,
    default_bank: Bank,
    pool: VoicePool,
}

impl MidiDecoder {
    pub fn new(config: SynthConfig) -> Self {
        Self::with_pool(config, VoicePool::new())
    }

    pub fn with_normalizer(config: SynthConfig, normalizer: Box<dyn Normalizer + Send>) -> Self {
        Self::with_pool(config, VoicePool::with_normalizer(normalizer))
    }

    fn with_pool(config: SynthConfig, pool: VoicePool) -> Self {
        let default_bank = config.default_bank;
        Self {
            state: DecoderState::WaitingForStatus,
            running_status: None,
            channel: 0,
            channels: std::array::from_fn(|index| ChannelState::new(index as u8)),
            banks: vec![default_bank.clone(); CHANNEL_COUNT],
            default_bank,
            pool,
        }
    }

    /// Consumes one byte. Returns true once the byte completed a message (or
    /// was dropped), i.e. the stream is at a message boundary again.
    pub fn event(&mut self, byte: u8) -> bool {
        if byte >= 0xF8 {
            // realtime bytes may appear anywhere without disturbing a message
            return self.state == DecoderState::WaitingForStatus;
        }
        if byte >= 0xF0 {
            self.running_status = None;
            self.state = DecoderState::WaitingForStatus;
            return true;
        }
        if byte >= 0x80 {
            self.running_status = Some(byte);
            self.channel = byte & 0x0F;
            self.state = DecoderState::for_status(byte);
            return false;
        }

        if self.state == DecoderState::WaitingForStatus {
            let Some(status) = self.running_status else {
                return true;
            };
            self.channel = status & 0x0F;
            self.state = DecoderState::for_status(status);
        }

        let next = match self.state {
            DecoderState::WaitingForStatus => DecoderState::WaitingForStatus,
            DecoderState::NoteOffKey => DecoderState::NoteOffVelocity { key: byte },
            DecoderState::NoteOffVelocity { key } => {
                self.note_off(key);
                DecoderState::WaitingForStatus
            }
            DecoderState::NoteOnKey => DecoderState::NoteOnVelocity { key: byte },
            DecoderState::NoteOnVelocity { key } => {
                self.note_on(key, byte);
                DecoderState::WaitingForStatus
            }
            DecoderState::PolyPressureKey => DecoderState::PolyPressureValue,
            DecoderState::PolyPressureValue => DecoderState::WaitingForStatus,
            DecoderState::ControlNumber => DecoderState::ControlValue { controller: byte },
            DecoderState::ControlValue { controller } => {
                self.control_change(controller, byte);
                DecoderState::WaitingForStatus
            }
            DecoderState::ProgramChange => {
                self.program_change();
                DecoderState::WaitingForStatus
            }
            DecoderState::ChannelPressure => DecoderState::WaitingForStatus,
            DecoderState::PitchBendLsb => DecoderState::PitchBendMsb { lsb: byte },
            DecoderState::PitchBendMsb { lsb } => {
                self.pitch_bend(lsb, byte);
                DecoderState::WaitingForStatus
            }
        };
        self.state = next;
        self.state == DecoderState::WaitingForStatus
    }

    /// Feeds a whole message (or any run of bytes).
    pub fn feed(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.event(byte);
        }
    }

    fn note_on(&mut self, key: u8, velocity: u8) {
        if velocity == 0 {
            self.note_off(key);
            return;
        }
        if key < LOWEST_KEY || self.channel == NON_MELODIC_CHANNEL {
            return;
        }
        let note = key - LOWEST_KEY;
        let channel = self.channel as usize;
        let config = self.banks[channel].select(note);
        self.pool.note_on(note, velocity, config, &self.channels[channel]);
    }

    fn note_off(&mut self, key: u8) {
        if key < LOWEST_KEY {
            return;
        }
        self.pool.note_off(self.channel, key - LOWEST_KEY);
    }

    fn control_change(&mut self, controller: u8, value: u8) {
        match controller {
            CC_RESET_ALL_CONTROLLERS => return self.reset(),
            CC_ALL_NOTES_OFF => return self.pool.all_notes_off(),
            _ => {}
        }
        let channel = &mut self.channels[self.channel as usize];
        match controller {
            CC_MODULATION => channel.set_modulation(value),
            CC_VOLUME => channel.set_volume(value),
            CC_PAN => channel.set_pan(value),
            CC_EXPRESSION => channel.set_expression(value),
            CC_SUSTAIN => channel.set_sustain(value),
            _ => {}
        }
    }

    fn program_change(&mut self) {
        debug!("program change on channel {}", self.channel);
        self.banks[self.channel as usize].clone_from(&self.default_bank);
    }

    fn pitch_bend(&mut self, lsb: u8, msb: u8) {
        let channel = &mut self.channels[self.channel as usize];
        channel.set_pitch_bend(lsb, msb);
        self.pool.pitch_bend(channel);
    }

    /// Restores every channel's controllers and bank and silences all voices.
    pub fn reset(&mut self) {
        debug!("resetting all controllers");
        self.channels.iter_mut().for_each(ChannelState::reset);
        for bank in self.banks.iter_mut() {
            bank.clone_from(&self.default_bank);
        }
        self.pool.reset();
    }

    /// Renders 16-bit PCM, one pool tick per sample.
    pub fn render(&mut self, buffer: &mut [i16]) {
        for sample in buffer.iter_mut() {
            *sample = (self.pool.render() * 32767.0) as i16;
            self.pool.advance();
        }
    }

    pub fn render_f32(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.pool.render();
            self.pool.advance();
        }
    }

    /// Installs `bank` on one channel until the next program change or reset.
    pub fn set_bank(&mut self, channel: u8, bank: Bank) {
        if let Some(slot) = self.banks.get_mut(channel as usize) {
            *slot = bank;
        }
    }

    pub fn bank(&self, channel: u8) -> Option<&Bank> {
        self.banks.get(channel as usize)
    }

    pub fn channel(&self, channel: u8) -> Option<&ChannelState> {
        self.channels.get(channel as usize)
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    pub fn pool(&self) -> &VoicePool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut VoicePool {
        &mut self.pool
    }
}

impl Default for MidiDecoder {
    fn default() -> Self {
        Self::new(SynthConfig::default())
    }
}
