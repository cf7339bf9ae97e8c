//! Standard MIDI File playback.
//!
//! The file is kept in memory and every track walks its own byte range. Due
//! events are fired at the start of each render call, in track order, and
//! then the decoder renders the block.

use log::{debug, warn};

use crate::error::LoadError;
use crate::midi::decoder::MidiDecoder;
use crate::synth::config::{SynthConfig, SAMPLE_RATE};

const HEADER_MAGIC: &[u8; 8] = b"MThd\0\0\0\x06";
const TRACK_MAGIC: &[u8; 4] = b"MTrk";
const HEADER_SIZE: usize = 14;
const MAX_TRACKS: usize = 16;
/// Microseconds per quarter note until the first set-tempo event.
const DEFAULT_TEMPO: u32 = 500_000;

const META_END_OF_TRACK: u8 = 0x2F;
const META_SET_TEMPO: u8 = 0x51;

/// How file ticks map to wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timing {
    /// `division` ticks per quarter note at `tempo` microseconds per quarter.
    Metrical { division: u16, tempo: u32 },
    /// SMPTE division: a fixed number of ticks per second; tempo events are ignored.
    Timecode { ticks_per_second: u32 },
}

impl Timing {
    fn from_division(division: u16) -> Result<Self, LoadError> {
        if division & 0x8000 != 0 {
            let frames_per_second = -(((division >> 8) as u8 as i8) as i32);
            let ticks_per_frame = (division & 0xFF) as i32;
            let ticks_per_second = frames_per_second * ticks_per_frame;
            if ticks_per_second <= 0 {
                return Err(LoadError::ZeroDivision);
            }
            Ok(Self::Timecode {
                ticks_per_second: ticks_per_second as u32,
            })
        } else if division == 0 {
            Err(LoadError::ZeroDivision)
        } else {
            Ok(Self::Metrical {
                division,
                tempo: DEFAULT_TEMPO,
            })
        }
    }

    /// Ticks per sample as a `(numerator, denominator)` pair.
    fn tick_rate(&self) -> (f64, f64) {
        match *self {
            Self::Metrical { division, tempo } => (
                division as f64 * 1_000_000.0,
                tempo as f64 * SAMPLE_RATE as f64,
            ),
            Self::Timecode { ticks_per_second } => (ticks_per_second as f64, SAMPLE_RATE as f64),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Track {
    cursor: usize,
    end: usize,
    /// Absolute tick of the next event, `None` once the track is exhausted.
    next_tick: Option<u64>,
    running_status: Option<u8>,
}

impl Track {
    fn new(start: usize, end: usize, data: &[u8]) -> Self {
        let mut track = Self {
            cursor: start,
            end,
            next_tick: Some(0),
            running_status: None,
        };
        track.schedule_next(data);
        track
    }

    fn is_end(&self) -> bool {
        self.cursor >= self.end
    }

    fn finish(&mut self) {
        self.cursor = self.end;
        self.next_tick = None;
    }

    fn read_u8(&mut self, data: &[u8]) -> Option<u8> {
        if self.is_end() {
            return None;
        }
        let byte = data[self.cursor];
        self.cursor += 1;
        Some(byte)
    }

    /// Variable-length quantity: 7 bits per byte, high bit continues, at most four bytes.
    fn read_vlq(&mut self, data: &[u8]) -> Option<u32> {
        let mut value = 0u32;
        for _ in 0..4 {
            let byte = self.read_u8(data)?;
            value = (value << 7) | (byte & 0x7F) as u32;
            if byte & 0x80 == 0 {
                return Some(value);
            }
        }
        None
    }

    fn skip(&mut self, length: u32) {
        self.cursor = self.end.min(self.cursor.saturating_add(length as usize));
    }

    /// Reads the delta time of the following event.
    fn schedule_next(&mut self, data: &[u8]) {
        let base = self.next_tick.unwrap_or(0);
        match self.read_vlq(data) {
            Some(delta) if !self.is_end() => self.next_tick = Some(base + delta as u64),
            _ => self.finish(),
        }
    }

    /// Fires the event under the cursor. Returns the new tempo when the event
    /// was a well-formed set-tempo meta event.
    fn fire(&mut self, data: &[u8], decoder: &mut MidiDecoder) -> Option<u32> {
        let Some(head) = self.read_u8(data) else {
            self.finish();
            return None;
        };
        match head {
            0xF0 | 0xF7 => match self.read_vlq(data) {
                Some(length) => self.skip(length),
                None => self.finish(),
            },
            0xFF => return self.meta_event(data),
            _ => self.midi_event(head, data, decoder),
        }
        None
    }

    fn meta_event(&mut self, data: &[u8]) -> Option<u32> {
        let (Some(kind), Some(length)) = (self.read_u8(data), self.read_vlq(data)) else {
            self.finish();
            return None;
        };
        match kind {
            META_END_OF_TRACK => {
                self.finish();
                None
            }
            META_SET_TEMPO if length == 3 && self.end - self.cursor >= 3 => {
                let bytes = &data[self.cursor..self.cursor + 3];
                self.cursor += 3;
                Some(u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]))
            }
            _ => {
                self.skip(length);
                None
            }
        }
    }

    /// Forwards channel-message bytes until the decoder reports a boundary.
    fn midi_event(&mut self, head: u8, data: &[u8], decoder: &mut MidiDecoder) {
        if head < 0x80 {
            // tracks keep their own running status
            if let Some(status) = self.running_status {
                decoder.event(status);
            }
        } else if head < 0xF0 {
            self.running_status = Some(head);
        }
        if decoder.event(head) {
            return;
        }
        while let Some(byte) = self.read_u8(data) {
            if decoder.event(byte) {
                return;
            }
        }
    }
}

/// Plays a format 0 or 1 Standard MIDI File through a [`MidiDecoder`].
pub struct MidiFileSequencer {
    data: Vec<u8>,
    tracks: Vec<Track>,
    timing: Timing,
    decoder: MidiDecoder,
    /// Tick reached at the last tempo change.
    segment_tick: f64,
    /// Samples rendered since the last tempo change.
    segment_samples: u64,
    now: f64,
}

impl MidiFileSequencer {
    pub fn load(data: impl Into<Vec<u8>>, config: SynthConfig) -> Result<Self, LoadError> {
        Self::with_decoder(data, MidiDecoder::new(config))
    }

    /// Loads `data` to be played through an existing decoder.
    pub fn with_decoder(data: impl Into<Vec<u8>>, decoder: MidiDecoder) -> Result<Self, LoadError> {
        let data = data.into();
        if data.len() < HEADER_SIZE {
            return Err(LoadError::TooShort);
        }
        if &data[..8] != HEADER_MAGIC {
            return Err(LoadError::BadHeader);
        }
        let format = u16::from_be_bytes([data[8], data[9]]);
        if format >= 2 {
            return Err(LoadError::UnsupportedFormat(format));
        }
        let declared_tracks = u16::from_be_bytes([data[10], data[11]]) as usize;
        if declared_tracks > MAX_TRACKS {
            warn!("file declares {declared_tracks} tracks, playing the first {MAX_TRACKS}");
        }
        let timing = Timing::from_division(u16::from_be_bytes([data[12], data[13]]))?;

        let mut tracks = Vec::with_capacity(declared_tracks.min(MAX_TRACKS));
        let mut offset = HEADER_SIZE;
        for index in 0..declared_tracks.min(MAX_TRACKS) {
            let header = data
                .get(offset..offset + 8)
                .ok_or(LoadError::MissingTrack { index })?;
            if &header[..4] != TRACK_MAGIC {
                return Err(LoadError::BadTrackMagic { index });
            }
            let length = u32::from_be_bytes([header[4], header[5], header[6], header[7]]) as usize;
            let start = offset + 8;
            let available = data.len() - start;
            if length > available {
                warn!("track {index} declares {length} bytes but only {available} remain");
            }
            let end = start + length.min(available);
            tracks.push(Track::new(start, end, &data));
            offset = end;
        }
        debug!("loaded {} tracks, {:?}", tracks.len(), timing);

        Ok(Self {
            data,
            tracks,
            timing,
            decoder,
            segment_tick: 0.0,
            segment_samples: 0,
            now: 0.0,
        })
    }

    /// Fires every due event, then renders one block of 16-bit PCM.
    pub fn render(&mut self, buffer: &mut [i16]) {
        self.fire_due_events();
        self.decoder.render(buffer);
        self.advance_clock(buffer.len());
    }

    pub fn render_f32(&mut self, buffer: &mut [f32]) {
        self.fire_due_events();
        self.decoder.render_f32(buffer);
        self.advance_clock(buffer.len());
    }

    /// Renders `block`-sized chunks until every track has finished.
    pub fn render_to_end(&mut self, block: usize) -> Vec<i16> {
        let block = block.max(1);
        let mut output = Vec::new();
        let mut buffer = vec![0i16; block];
        while !self.is_end() {
            self.render(&mut buffer);
            output.extend_from_slice(&buffer);
        }
        output
    }

    /// True once every track has run out of events.
    pub fn is_end(&self) -> bool {
        self.tracks.iter().all(Track::is_end)
    }

    /// Current position in file ticks.
    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn decoder(&self) -> &MidiDecoder {
        &self.decoder
    }

    pub fn decoder_mut(&mut self) -> &mut MidiDecoder {
        &mut self.decoder
    }

    fn fire_due_events(&mut self) {
        for index in 0..self.tracks.len() {
            while let Some(tick) = self.tracks[index].next_tick {
                if tick as f64 > self.now {
                    break;
                }
                let track = &mut self.tracks[index];
                let tempo = track.fire(&self.data, &mut self.decoder);
                if track.is_end() {
                    track.finish();
                    debug!("track {index} finished at tick {tick}");
                } else {
                    track.schedule_next(&self.data);
                }
                if let Some(tempo) = tempo {
                    self.set_tempo(tempo);
                }
            }
        }
    }

    fn set_tempo(&mut self, tempo: u32) {
        let Timing::Metrical { division, .. } = self.timing else {
            return;
        };
        if tempo == 0 {
            warn!("ignoring zero tempo");
            return;
        }
        debug!("tempo {tempo} us per quarter at tick {:.1}", self.now);
        self.segment_tick = self.now;
        self.segment_samples = 0;
        self.timing = Timing::Metrical { division, tempo };
    }

    fn advance_clock(&mut self, samples: usize) {
        self.segment_samples += samples as u64;
        let (numerator, denominator) = self.timing.tick_rate();
        self.now = self.segment_tick + self.segment_samples as f64 * numerator / denominator;
    }
}
