pub mod bank;
pub mod decoder;
pub mod sequencer;

pub use self::bank::Bank;
pub use self::decoder::MidiDecoder;
pub use self::sequencer::MidiFileSequencer;
