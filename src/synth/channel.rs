/// Continuous controller values of one MIDI channel and the values derived
/// from them.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelState {
    pub index: u8,
    pub modulation: f32,
    pub volume: f32,
    pub expression: f32,
    /// `volume × expression`, applied to the velocity of new notes.
    pub final_volume: f32,
    /// Bend position in [-1, 1).
    pub pitch_bend: f32,
    /// Semitones at full bend.
    pub pitch_sensitivity: f32,
    /// `pitch_bend × pitch_sensitivity`, in semitones.
    pub final_pitch: f32,
    /// -1 is hard left, 1 hard right.
    pub pan: f32,
    pub sustain: bool,
}

impl ChannelState {
    pub fn new(index: u8) -> Self {
        Self {
            index,
            modulation: 0.0,
            volume: 1.0,
            expression: 1.0,
            final_volume: 1.0,
            pitch_bend: 0.0,
            pitch_sensitivity: 1.0,
            final_pitch: 0.0,
            pan: 0.0,
            sustain: false,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.index);
    }

    pub fn set_modulation(&mut self, value: u8) {
        self.modulation = value as f32 / 127.0;
    }

    pub fn set_volume(&mut self, value: u8) {
        self.volume = value as f32 / 127.0;
        self.final_volume = self.volume * self.expression;
    }

    pub fn set_expression(&mut self, value: u8) {
        self.expression = value as f32 / 127.0;
        self.final_volume = self.volume * self.expression;
    }

    pub fn set_pan(&mut self, value: u8) {
        self.pan = (value as f32 - 64.0) / 63.0;
    }

    pub fn set_sustain(&mut self, value: u8) {
        self.sustain = value >= 64;
    }

    /// Takes the two 7-bit halves of a pitch-bend message.
    pub fn set_pitch_bend(&mut self, lsb: u8, msb: u8) {
        let raw = ((msb as i32 & 0x7F) << 7) | (lsb as i32 & 0x7F);
        self.pitch_bend = (raw - 8192) as f32 / 8192.0;
        self.final_pitch = self.pitch_bend * self.pitch_sensitivity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pitch_bend_spans_half_open_range() {
        let mut channel = ChannelState::new(0);
        channel.set_pitch_bend(0, 0);
        assert_eq!(channel.pitch_bend, -1.0);
        channel.set_pitch_bend(0, 0x40);
        assert_eq!(channel.pitch_bend, 0.0);
        channel.set_pitch_bend(0x7F, 0x7F);
        assert!(channel.pitch_bend < 1.0 && channel.pitch_bend > 0.999);
    }

    #[test]
    fn reset_keeps_index() {
        let mut channel = ChannelState::new(5);
        channel.set_volume(10);
        channel.set_sustain(127);
        channel.reset();
        assert_eq!(channel, ChannelState::new(5));
    }
}
