use super::config::SAMPLE_RATE;
use super::envelope::EnvelopeGenerator;
use super::voice_config::OperatorConfig;

/// One full waveform cycle spans the whole `u32` range of the phase accumulator.
const PHASE_RANGE: f64 = 4_294_967_296.0;

/// Phase-accumulator oscillator gated by its own envelope.
#[derive(Clone, Debug, Default)]
pub struct Operator {
    config: OperatorConfig,
    phase: u32,
    phase_increment: u32,
    envelope: EnvelopeGenerator,
}

impl Operator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn note_on(&mut self, note: u8, carrier_frequency: f32, config: &OperatorConfig) {
        self.config = *config;
        self.phase = 0;
        self.phase_increment = phase_increment(carrier_frequency, config.ratio);
        self.envelope.note_on(note, &config.envelope);
    }

    pub fn note_off(&mut self) {
        self.envelope.note_off();
    }

    /// Retunes without touching the phase or the envelope.
    pub fn pitch_bend(&mut self, carrier_frequency: f32) {
        self.phase_increment = phase_increment(carrier_frequency, self.config.ratio);
    }

    /// Output at the current phase shifted by `drift` cycles, scaled by the
    /// envelope level.
    pub fn render(&self, drift: f32) -> f32 {
        let cycles = (self.phase as f64 / PHASE_RANGE) as f32 + drift;
        self.config.waveform.evaluate(cycles) * self.envelope.level()
    }

    pub fn advance(&mut self) {
        self.envelope.advance(1);
        self.phase = self.phase.wrapping_add(self.phase_increment);
    }

    pub fn reset(&mut self) {
        self.envelope.reset();
        self.phase = 0;
    }

    pub fn is_active(&self) -> bool {
        self.envelope.is_active()
    }

    pub fn envelope(&self) -> &EnvelopeGenerator {
        &self.envelope
    }

    pub fn config(&self) -> &OperatorConfig {
        &self.config
    }

    pub fn phase(&self) -> u32 {
        self.phase
    }

    pub fn phase_increment(&self) -> u32 {
        self.phase_increment
    }
}

/// Fixed-point phase step for `carrier × ratio` Hz. Frequencies above the
/// sample rate alias by wrapping, negative ones run the phase backwards.
fn phase_increment(carrier_frequency: f32, ratio: f32) -> u32 {
    let cycles_per_tick = carrier_frequency as f64 * ratio as f64 / SAMPLE_RATE as f64;
    let step = (cycles_per_tick * PHASE_RANGE).round();
    if step.is_finite() {
        step as i64 as u32
    } else {
        0
    }
}
