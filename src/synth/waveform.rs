use core::f32::consts::TAU;

const TABLE_MASK: usize = 0x1FF;

/// Pseudo-random values indexed by phase, so "noise" repeats with the period
/// of its operator and stays deterministic across renders.
#[rustfmt::skip]
const NOISE_TABLE: [i8; 512] = [
    90, -11, 4, -92, -126, 1, -29, -51, -76, -11, 47, 37, 100, -42, 89, 23, -4, 93, -77, 28, -116, 48, -62, -32, 79, -89, -60, 89, -113, 31, 72, -60,
    105, -57, 40, -80, -47, -43, -79, -102, -41, 97, 85, 33, 55, -57, -90, 30, -105, 32, 28, 112, -116, 115, 89, -14, 110, 63, 61, -105, -60, -103, -114, -47,
    106, -67, 86, 21, -42, 61, 82, -11, 11, 124, -33, -79, 28, -46, -36, -120, 42, 120, -110, 79, 106, 8, 48, -90, -26, 47, -81, 122, -17, -13, 56, -36,
    -48, -11, 60, -31, -15, 103, 114, 23, 35, -47, 92, -64, -15, -111, 111, 4, 33, 89, 116, 112, -38, -5, 47, -79, 66, 30, 76, -88, 120, 6, 41, 69,
    -98, 93, -114, 115, -10, 117, -22, 109, 71, 8, 27, -68, 21, 46, 124, 50, 9, -83, -71, -87, -19, 108, -31, -92, -8, -76, 80, -9, 92, 16, -119, 61,
    57, -15, 42, -113, -19, 0, -124, 124, -29, -67, -71, -54, -125, -84, 41, -6, -94, 54, -50, 94, -41, 78, 7, -18, 30, 16, -64, -16, 33, 32, -24, 8,
    -55, -76, -87, 120, 112, 0, 125, -123, 104, -7, 124, 28, -22, -119, 61, 14, 42, -3, 4, -9, -76, 125, 0, 49, -78, 44, -99, -85, 89, 56, 111, -37,
    -97, 71, 97, -36, -45, -21, -98, -39, -81, 71, -50, -25, -52, -83, 22, -33, 18, 83, -112, -89, 16, -21, 7, 56, 125, -76, 5, -1, -60, 43, 94, 123,
    83, -106, -59, 125, -24, -97, 56, -107, -32, -35, -100, 10, 99, -23, -2, 50, 46, 86, -65, 121, -6, 68, -57, -59, -21, -69, -79, -74, 72, 35, 21, 65,
    -117, 13, 117, 124, 46, -19, 44, 126, 118, -117, 87, -28, -119, 84, -68, -73, 78, 66, -39, -62, -2, -7, 85, 69, 99, 124, -63, -114, -81, -2, -67, 104,
    37, -73, 101, -86, 116, -68, -59, -18, 101, -120, -51, 35, -57, -82, 43, -3, -85, -24, -43, -41, 49, 112, 114, 67, -25, 87, 42, 85, 70, -72, -9, 47,
    77, -55, 15, -27, -21, 109, 104, 45, -97, -44, -14, -116, 106, -39, 51, -36, 54, 102, -69, 48, 65, 1, -17, 27, -30, 87, 68, 126, 48, 98, -27, -107,
    69, -66, -50, 8, 122, -49, -50, 20, 39, -50, 29, 86, -94, -88, 23, 103, -81, -27, 6, 18, 119, -74, 6, 94, -26, -84, -14, -110, -88, -2, -24, 20,
    40, -94, -2, -35, -17, -62, 69, -16, -122, 125, -18, 86, -58, -97, -10, -105, -76, 55, 3, 36, -46, -123, -90, -45, 53, -32, -25, 84, 103, 115, -107, -118,
    -84, 77, 71, 63, -32, -72, 31, 42, -82, -124, 50, 20, -62, -32, 54, 36, 13, 81, -72, -93, 121, -48, 11, 108, 109, -43, 3, -119, -78, -54, 63, 88,
    -115, -95, -79, -71, 2, -39, -82, 114, -9, 99, -9, 7, -113, -9, -1, 111, -29, 74, 117, -108, -19, -54, -37, -55, -44, 5, 24, -31, 58, -35, -79, -24,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Waveform {
    #[default]
    Sine,
    Noise,
    Triangle,
    Square,
    Sawtooth,
    HalfSine,
}

impl Waveform {
    /// Maps a preset's waveform id. Unknown ids fall back to a sine.
    pub fn from_id(id: u32) -> Self {
        match id {
            1 => Waveform::Noise,
            2 => Waveform::Triangle,
            3 => Waveform::Square,
            4 => Waveform::Sawtooth,
            5 => Waveform::HalfSine,
            _ => Waveform::Sine,
        }
    }

    /// Preset slots are floats; negative and fractional ids truncate.
    pub fn from_value(value: f32) -> Self {
        Self::from_id(value as u32)
    }

    pub fn id(self) -> u32 {
        match self {
            Waveform::Sine => 0,
            Waveform::Noise => 1,
            Waveform::Triangle => 2,
            Waveform::Square => 3,
            Waveform::Sawtooth => 4,
            Waveform::HalfSine => 5,
        }
    }

    /// Evaluates one sample at `cycles`, a phase measured in whole waveform
    /// periods. Any real value is accepted; only the fractional part matters.
    /// Output is within [-1, 1].
    pub fn evaluate(self, cycles: f32) -> f32 {
        let position = cycles - cycles.floor();
        match self {
            Waveform::Sine => (TAU * position).sin(),
            Waveform::Noise => {
                let index = (position * NOISE_TABLE.len() as f32) as usize & TABLE_MASK;
                NOISE_TABLE[index] as f32 / 127.0
            }
            Waveform::Triangle => {
                if position < 0.25 {
                    4.0 * position
                } else if position < 0.75 {
                    2.0 - 4.0 * position
                } else {
                    4.0 * position - 4.0
                }
            }
            Waveform::Square => {
                if position < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Sawtooth => position * 2.0 - 1.0,
            Waveform::HalfSine => (TAU * position).sin().abs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_ids_fall_back_to_sine() {
        assert_eq!(Waveform::from_id(6), Waveform::Sine);
        assert_eq!(Waveform::from_value(-3.0), Waveform::Sine);
        assert_eq!(Waveform::from_value(3.0), Waveform::Square);
    }

    #[test]
    fn shapes_hit_their_landmarks() {
        assert!((Waveform::Sine.evaluate(0.25) - 1.0).abs() < 1e-6);
        assert_eq!(Waveform::Triangle.evaluate(0.25), 1.0);
        assert_eq!(Waveform::Triangle.evaluate(0.75), -1.0);
        assert_eq!(Waveform::Square.evaluate(0.1), 1.0);
        assert_eq!(Waveform::Square.evaluate(0.6), -1.0);
        assert_eq!(Waveform::Sawtooth.evaluate(0.0), -1.0);
        assert!(Waveform::HalfSine.evaluate(0.75) > 0.99);
    }

    #[test]
    fn phase_wraps_including_negative_offsets() {
        for waveform in [Waveform::Sine, Waveform::Noise, Waveform::Sawtooth] {
            let a = waveform.evaluate(0.3);
            let b = waveform.evaluate(-0.7);
            let c = waveform.evaluate(5.3);
            assert!((a - b).abs() < 1e-3, "{waveform:?}");
            assert!((a - c).abs() < 1e-3, "{waveform:?}");
        }
    }

    #[test]
    fn all_waveforms_stay_bounded() {
        for id in 0..6 {
            let waveform = Waveform::from_id(id);
            for step in 0..2048 {
                let value = waveform.evaluate(step as f32 / 1000.0 - 1.0);
                assert!((-1.0..=1.0).contains(&value), "{waveform:?} {value}");
            }
        }
    }
}
