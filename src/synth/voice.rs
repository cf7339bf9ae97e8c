use super::channel::ChannelState;
use super::config::OPERATORS;
use super::operator::Operator;
use super::voice_config::VoiceConfig;

/// Frequency of internal note 0 sits three semitones below this reference.
const REFERENCE_FREQUENCY: f32 = 6.875;

/// Carrier frequency in Hz for an internal note number bent by `pitch` semitones.
pub fn note_frequency(note: u8, pitch: f32) -> f32 {
    ((note as f32 + pitch + 3.0) / 12.0).exp2() * REFERENCE_FREQUENCY
}

/// A single sounding note: four operators cross-modulating each other.
#[derive(Clone, Debug, Default)]
pub struct Voice {
    operators: [Operator; OPERATORS],
    config: Option<VoiceConfig>,
    note_number: u8,
    channel: u8,
    velocity: f32, // note velocity × channel volume
    last_levels: [f32; OPERATORS],
}

impl Voice {
    pub fn new() -> Self {
        Self::default()
    }

    /// (Re)starts the voice. Every operator and envelope is reinitialized, so
    /// this is safe on a voice that is still sounding.
    pub fn note_on(&mut self, note: u8, velocity: f32, config: &VoiceConfig, channel: &ChannelState) {
        let frequency = note_frequency(note, channel.final_pitch);
        self.note_number = note;
        self.channel = channel.index;
        self.velocity = velocity * channel.final_volume;
        self.last_levels = [0.0; OPERATORS];
        for (operator, operator_config) in self.operators.iter_mut().zip(config.operators.iter()) {
            operator.note_on(note, frequency, operator_config);
        }
        match &mut self.config {
            Some(current) => current.clone_from(config),
            None => self.config = Some(config.clone()),
        }
    }

    pub fn note_off(&mut self) {
        self.operators.iter_mut().for_each(Operator::note_off);
    }

    /// Retunes from the channel's current bend without retriggering envelopes.
    pub fn pitch_bend(&mut self, channel: &ChannelState) {
        let frequency = note_frequency(self.note_number, channel.final_pitch);
        for operator in self.operators.iter_mut() {
            operator.pitch_bend(frequency);
        }
    }

    /// Computes the current sample. Modulation reads the operator outputs of
    /// the previous sample, which keeps any 4×4 matrix (feedback included)
    /// free of circular dependencies.
    pub fn render(&mut self) -> f32 {
        let Some(config) = &self.config else {
            return 0.0;
        };
        let previous = self.last_levels;
        let mut output = 0.0;
        for (i, operator) in self.operators.iter().enumerate() {
            let drift: f32 = operator
                .config()
                .modulation
                .iter()
                .zip(previous.iter())
                .map(|(weight, level)| weight * level)
                .sum();
            self.last_levels[i] = operator.render(drift);
            output += config.mixer[i] * self.last_levels[i];
        }
        output * self.velocity
    }

    pub fn advance(&mut self) {
        if self.config.is_none() {
            return;
        }
        self.operators.iter_mut().for_each(Operator::advance);
        if !self.is_active() {
            self.config = None;
        }
    }

    /// Hard stop: silences immediately, no release.
    pub fn reset(&mut self) {
        self.operators.iter_mut().for_each(Operator::reset);
        self.config = None;
        self.last_levels = [0.0; OPERATORS];
    }

    pub fn is_active(&self) -> bool {
        self.operators.iter().any(Operator::is_active)
    }

    /// Loudness weight for normalization: the effective velocity while
    /// sounding, zero otherwise.
    pub fn current_level(&self) -> f32 {
        if self.is_active() {
            self.velocity
        } else {
            0.0
        }
    }

    pub fn operator(&self, index: usize) -> &Operator {
        &self.operators[index]
    }

    pub fn config(&self) -> Option<&VoiceConfig> {
        self.config.as_ref()
    }

    pub fn note_number(&self) -> u8 {
        self.note_number
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }
}
