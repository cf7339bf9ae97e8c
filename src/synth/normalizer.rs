/// Turns the raw sum of all voices into one output sample in [-1, 1].
pub trait Normalizer {
    /// `sample` is the summed voice output, `weight` the summed loudness
    /// weights of the voices that produced it.
    fn normalize(&mut self, sample: f32, weight: f32) -> f32;
}

/// Default normalizer: divides by the square root of the active weight once
/// more than one full-velocity voice sounds, then saturates with `tanh`.
/// Monotonic in `sample` and bounded by ±1.
#[derive(Clone, Copy, Debug, Default)]
pub struct SoftLimiter;

impl Normalizer for SoftLimiter {
    fn normalize(&mut self, sample: f32, weight: f32) -> f32 {
        if !sample.is_finite() {
            return 0.0;
        }
        let gain = if weight > 1.0 { weight.sqrt().recip() } else { 1.0 };
        (sample * gain).tanh()
    }
}

impl<F> Normalizer for F
where
    F: FnMut(f32, f32) -> f32,
{
    fn normalize(&mut self, sample: f32, weight: f32) -> f32 {
        self(sample, weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn soft_limiter_is_bounded_and_monotonic() {
        let mut limiter = SoftLimiter;
        let mut previous = f32::NEG_INFINITY;
        for step in -400..=400 {
            let sample = step as f32 / 25.0;
            let out = limiter.normalize(sample, 16.0);
            assert!(out.abs() <= 1.0);
            assert!(out >= previous);
            previous = out;
        }
    }

    #[test]
    fn quiet_single_voice_passes_nearly_unchanged() {
        let mut limiter = SoftLimiter;
        let out = limiter.normalize(0.05, 1.0);
        assert!((out - 0.05).abs() < 1e-3);
    }

    #[test]
    fn non_finite_input_is_silenced() {
        let mut limiter = SoftLimiter;
        assert_eq!(limiter.normalize(f32::NAN, 1.0), 0.0);
    }
}
