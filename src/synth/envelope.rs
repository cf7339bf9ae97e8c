use super::config::SAMPLE_DELTA;
use super::voice_config::EnvelopeConfig;

/// Envelope phases in the order a note walks through them. Any phase whose
/// configured duration is zero is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EnvelopeState {
    Idle,
    Delay,
    Attack,
    Hold,
    Decay1,
    /// Ramps from the sustain level toward zero while the key is held.
    Decay2,
    Release,
}

#[derive(Debug, Clone)]
pub struct EnvelopeGenerator {
    config: Option<EnvelopeConfig>,
    state: EnvelopeState,
    level: f32,
    timer: f32,
    ksr_d: f32,
    // per-tick increments
    attack: f32,
    decay1: f32,
    decay2: f32,
    release: f32,
    /// Ticks left until a release reaches zero.
    release_ticks: u32,
}

impl EnvelopeGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn note_on(&mut self, note: u8, config: &EnvelopeConfig) {
        self.ksr_d = (note as f32 * config.ksr + 1.0) * SAMPLE_DELTA;
        self.timer = 0.0;
        self.level = 0.0;
        self.attack = config.attack * self.ksr_d;
        self.decay1 = config.decay1 * self.ksr_d;
        self.decay2 = config.decay2 * self.ksr_d;
        self.config = Some(*config);
        self.enter(EnvelopeState::Delay, config);
    }

    pub fn note_off(&mut self) {
        let Some(config) = self.config else {
            return;
        };
        if self.state == EnvelopeState::Idle {
            return;
        }
        self.release = config.release * self.ksr_d;
        if self.release < 0.0 {
            self.release_ticks = (self.level / -self.release).ceil() as u32;
            self.state = EnvelopeState::Release;
        } else {
            self.finish();
        }
    }

    /// Steps the active phase by `ticks` samples.
    pub fn advance(&mut self, ticks: u32) {
        let Some(config) = self.config else {
            return;
        };
        let steps = ticks;
        let ticks = ticks as f32;
        match self.state {
            EnvelopeState::Idle => {}
            EnvelopeState::Delay => {
                self.timer += self.ksr_d * ticks;
                if self.timer >= config.delay {
                    self.enter(EnvelopeState::Attack, &config);
                }
            }
            EnvelopeState::Attack => {
                self.level += self.attack * ticks;
                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.enter(EnvelopeState::Hold, &config);
                }
            }
            EnvelopeState::Hold => {
                self.timer += self.ksr_d * ticks;
                if self.timer >= config.hold {
                    self.enter(EnvelopeState::Decay1, &config);
                }
            }
            EnvelopeState::Decay1 => {
                self.level += self.decay1 * ticks;
                if self.level <= config.sustain {
                    self.level = config.sustain;
                    self.state = EnvelopeState::Decay2;
                }
            }
            EnvelopeState::Decay2 => {
                self.level += self.decay2 * ticks;
                if self.level <= 0.0 {
                    self.finish();
                }
            }
            EnvelopeState::Release => {
                // the tick count, not the level, ends the release
                let steps = steps.min(self.release_ticks);
                self.release_ticks -= steps;
                self.level += self.release * steps as f32;
                if self.release_ticks == 0 || self.level <= 0.0 {
                    self.finish();
                }
            }
        }
        self.level = self.level.clamp(0.0, 1.0);
    }

    /// Drops straight to idle without a release.
    pub fn reset(&mut self) {
        self.finish();
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn state(&self) -> EnvelopeState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state != EnvelopeState::Idle
    }

    /// Enters the first phase at or after `from` that has a nonzero duration.
    fn enter(&mut self, from: EnvelopeState, config: &EnvelopeConfig) {
        if from <= EnvelopeState::Delay && config.delay > 0.0 {
            self.timer = 0.0;
            self.state = EnvelopeState::Delay;
        } else if from <= EnvelopeState::Attack && self.attack != 0.0 {
            self.state = EnvelopeState::Attack;
        } else if from <= EnvelopeState::Hold && config.hold > 0.0 {
            self.timer = 0.0;
            self.level = 1.0;
            self.state = EnvelopeState::Hold;
        } else if from <= EnvelopeState::Decay1 && self.decay1 != 0.0 {
            self.level = 1.0;
            self.state = EnvelopeState::Decay1;
        } else {
            self.level = config.sustain.clamp(0.0, 1.0);
            self.state = EnvelopeState::Decay2;
        }
    }

    fn finish(&mut self) {
        self.level = 0.0;
        self.state = EnvelopeState::Idle;
        self.config = None;
    }
}

impl Default for EnvelopeGenerator {
    fn default() -> Self {
        Self {
            config: None,
            state: EnvelopeState::Idle,
            level: 0.0,
            timer: 0.0,
            ksr_d: SAMPLE_DELTA,
            attack: 0.0,
            decay1: 0.0,
            decay2: 0.0,
            release: 0.0,
            release_ticks: 0,
        }
    }
}
