pub mod channel;
pub mod config;
pub mod envelope;
pub mod normalizer;
pub mod operator;
pub mod pool;
pub mod tone;
pub mod voice;
pub mod voice_config;
pub mod waveform;

pub use self::config::SynthConfig;
pub use self::pool::VoicePool;
pub use self::tone::generate_tone;
pub use self::voice::Voice;
pub use self::voice_config::VoiceConfig;
