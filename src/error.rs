use thiserror::Error;

/// Errors raised while loading an envelope, operator, voice preset or bank.
#[derive(Debug, Error)]
pub enum PresetError {
    #[error("expected {expected} preset values, found {found}")]
    ValueCount { expected: usize, found: usize },

    #[error("invalid preset value `{0}`")]
    InvalidNumber(String),

    #[error("a bank needs exactly 4 zones, found {0}")]
    ZoneCount(usize),

    #[error("malformed JSON preset: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while parsing a Standard MIDI File container.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoadError {
    #[error("file is too short to hold a MIDI header")]
    TooShort,

    #[error("missing or malformed MThd header")]
    BadHeader,

    #[error("unsupported MIDI file format {0} (only 0 and 1 are playable)")]
    UnsupportedFormat(u16),

    #[error("time division of zero ticks")]
    ZeroDivision,

    #[error("track {index} is missing its chunk header")]
    MissingTrack { index: usize },

    #[error("track {index} does not start with MTrk")]
    BadTrackMagic { index: usize },
}

/// Errors raised by the realtime audio output.
#[cfg(feature = "native")]
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no output device available")]
    NoDevice,

    #[error("unsupported sample format {0}")]
    UnsupportedFormat(String),

    #[error(transparent)]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error(transparent)]
    SupportedConfigs(#[from] cpal::SupportedStreamConfigsError),

    #[error(transparent)]
    Build(#[from] cpal::BuildStreamError),

    #[error(transparent)]
    Play(#[from] cpal::PlayStreamError),

    #[error(transparent)]
    Pause(#[from] cpal::PauseStreamError),
}
