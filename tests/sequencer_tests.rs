mod common;

use common::{peak, sine_preset, smf, smf_with_tracks, Shape};
use fourop::error::LoadError;
use fourop::midi::bank::Bank;
use fourop::midi::sequencer::{MidiFileSequencer, Timing};
use fourop::synth::config::SynthConfig;
use fourop::synth::envelope::EnvelopeState;

const END_OF_TRACK: [u8; 4] = [0x00, 0xFF, 0x2F, 0x00];

fn sine_config() -> SynthConfig {
    SynthConfig::with_bank(Bank::single(sine_preset(Shape::default())))
}

/// Note-on at tick 0, note-off `delta` ticks later (as VLQ bytes), end of track.
fn one_note(delta: &[u8]) -> Vec<u8> {
    let mut events = vec![0x00, 0x90, 69, 127];
    events.extend_from_slice(delta);
    events.extend_from_slice(&[0x80, 69, 0]);
    events.extend_from_slice(&END_OF_TRACK);
    events
}

/// Renders one sample at a time and returns the index of the first sample
/// rendered with voice 0 in its release phase.
fn release_sample(sequencer: &mut MidiFileSequencer, limit: usize) -> (usize, Vec<i16>) {
    let mut rendered = Vec::new();
    let mut sample = [0i16; 1];
    for index in 0..limit {
        sequencer.render(&mut sample);
        rendered.push(sample[0]);
        let voice = sequencer.decoder().pool().voice(0).unwrap();
        if voice.operator(0).envelope().state() == EnvelopeState::Release {
            return (index, rendered);
        }
    }
    panic!("note was never released");
}

#[test]
fn test_quarter_note_at_default_tempo_lasts_half_a_second() {
    // 480 = 0x83 0x60 as a variable-length quantity
    let file = smf(480, &one_note(&[0x83, 0x60]));
    let mut sequencer = MidiFileSequencer::load(file, sine_config()).unwrap();
    assert_eq!(
        sequencer.timing(),
        Timing::Metrical {
            division: 480,
            tempo: 500_000
        }
    );

    let (released_at, rendered) = release_sample(&mut sequencer, 30_000);
    assert_eq!(released_at, 22_050);
    assert!(peak(&rendered[..22_050]) > 1_000);
    assert!(peak(&rendered[21_000..22_050]) > 1_000, "note went quiet early");
    assert!(sequencer.is_end());
}

#[test]
fn test_set_tempo_changes_note_length() {
    // 250000 us per quarter, twice the default speed
    let mut events = vec![0x00, 0xFF, 0x51, 0x03, 0x03, 0xD0, 0x90];
    events.extend_from_slice(&one_note(&[0x83, 0x60]));
    let mut sequencer = MidiFileSequencer::load(smf(480, &events), sine_config()).unwrap();

    let (released_at, _) = release_sample(&mut sequencer, 30_000);
    assert_eq!(released_at, 11_025);
    assert_eq!(
        sequencer.timing(),
        Timing::Metrical {
            division: 480,
            tempo: 250_000
        }
    );
}

#[test]
fn test_smpte_division() {
    // -25 frames per second, 40 ticks per frame: 1000 ticks per second
    let file = smf(0xE728, &one_note(&[0x83, 0x74]));
    let mut sequencer = MidiFileSequencer::load(file, sine_config()).unwrap();
    assert_eq!(
        sequencer.timing(),
        Timing::Timecode {
            ticks_per_second: 1_000
        }
    );
    let (released_at, _) = release_sample(&mut sequencer, 30_000);
    assert_eq!(released_at, 22_050);
}

#[test]
fn test_malformed_headers_are_rejected() {
    let good = smf(480, &one_note(&[0x60]));
    let load = |data: Vec<u8>| MidiFileSequencer::load(data, SynthConfig::default()).err();

    assert_eq!(load(good[..10].to_vec()), Some(LoadError::TooShort));

    let mut bad_magic = good.clone();
    bad_magic[0] = b'R';
    assert_eq!(load(bad_magic), Some(LoadError::BadHeader));

    let mut bad_length = good.clone();
    bad_length[7] = 7;
    assert_eq!(load(bad_length), Some(LoadError::BadHeader));

    let mut format_two = good.clone();
    format_two[9] = 2;
    assert_eq!(load(format_two), Some(LoadError::UnsupportedFormat(2)));

    let mut zero_division = good.clone();
    zero_division[12] = 0;
    zero_division[13] = 0;
    assert_eq!(load(zero_division), Some(LoadError::ZeroDivision));

    let mut missing = good.clone();
    missing[11] = 2;
    assert_eq!(load(missing), Some(LoadError::MissingTrack { index: 1 }));

    let mut bad_track = good.clone();
    bad_track[14..18].copy_from_slice(b"MTrx");
    assert_eq!(load(bad_track), Some(LoadError::BadTrackMagic { index: 0 }));

    assert!(load(good).is_none());
}

#[test]
fn test_truncated_track_is_clamped() {
    // the track claims far more bytes than the file holds and never ends itself
    let mut file = smf(480, &[0x00, 0x90, 69, 127, 0x60, 0x80, 69, 0]);
    file[18..22].copy_from_slice(&1_000u32.to_be_bytes());
    let mut sequencer = MidiFileSequencer::load(file, sine_config()).unwrap();
    assert!(!sequencer.is_end());
    let pcm = sequencer.render_to_end(256);
    assert!(sequencer.is_end());
    assert!(peak(&pcm) > 0);
}

#[test]
fn test_same_tick_events_fire_in_track_order() {
    let first: &[u8] = &[0x00, 0x90, 76, 100, 0x00, 0xFF, 0x2F, 0x00];
    let second: &[u8] = &[0x00, 0x90, 72, 100, 0x00, 0xFF, 0x2F, 0x00];
    let file = smf_with_tracks(1, 96, &[first, second]);
    let mut sequencer = MidiFileSequencer::load(file, sine_config()).unwrap();
    assert_eq!(sequencer.track_count(), 2);

    let mut buffer = [0i16; 64];
    sequencer.render(&mut buffer);
    let notes: Vec<u8> = sequencer
        .decoder()
        .pool()
        .active_slots()
        .map(|slot| slot.note)
        .collect();
    assert_eq!(notes, vec![64, 60]);
    assert!(sequencer.is_end());
}

#[test]
fn test_running_status_stays_within_its_track() {
    // track 0 relies on running status after track 1 has sent a different status
    let first: &[u8] = &[0x00, 0x91, 60, 100, 0x0A, 62, 100, 0x00, 0xFF, 0x2F, 0x00];
    let second: &[u8] = &[0x05, 0x92, 70, 100, 0x00, 0xFF, 0x2F, 0x00];
    let file = smf_with_tracks(1, 96, &[first, second]);
    let mut sequencer = MidiFileSequencer::load(file, sine_config()).unwrap();
    let pcm = sequencer.render_to_end(64);
    assert!(!pcm.is_empty());

    let mut notes: Vec<(u8, u8)> = sequencer
        .decoder()
        .pool()
        .active_slots()
        .map(|slot| (slot.channel, slot.note))
        .collect();
    notes.sort_unstable();
    assert_eq!(notes, vec![(1, 48), (1, 50), (2, 58)]);
}

#[test]
fn test_sysex_and_unknown_meta_events_are_skipped() {
    let events = [
        0x00, 0xF0, 0x03, 0x7E, 0x01, 0xF7, // sysex
        0x00, 0xFF, 0x03, 0x04, b'l', b'e', b'a', b'd', // track name
        0x00, 0x90, 60, 100, //
        0x00, 0xFF, 0x2F, 0x00,
    ];
    let mut sequencer = MidiFileSequencer::load(smf(480, &events), sine_config()).unwrap();
    let mut buffer = [0i16; 32];
    sequencer.render(&mut buffer);
    let notes: Vec<u8> = sequencer
        .decoder()
        .pool()
        .active_slots()
        .map(|slot| slot.note)
        .collect();
    assert_eq!(notes, vec![48]);
    assert!(sequencer.is_end());
}

#[test]
fn test_render_to_end_stops_at_the_block_holding_the_last_event() {
    let file = smf(480, &one_note(&[0x83, 0x60]));
    let mut sequencer = MidiFileSequencer::load(file, sine_config()).unwrap();
    let pcm = sequencer.render_to_end(256);
    // 480 ticks is 22050 samples; the block starting at 87 * 256 fires it
    assert_eq!(pcm.len(), 88 * 256);
    assert!(sequencer.now() >= 480.0);
}

#[test]
fn test_empty_track_is_finished_at_load() {
    let sequencer = MidiFileSequencer::load(smf(96, &[]), SynthConfig::default()).unwrap();
    assert_eq!(sequencer.track_count(), 1);
    assert!(sequencer.is_end());
}

#[test]
fn test_track_count_is_clamped_to_sixteen() {
    let track: &[u8] = &END_OF_TRACK;
    let tracks = vec![track; 17];
    let file = smf_with_tracks(1, 96, &tracks);
    let sequencer = MidiFileSequencer::load(file, SynthConfig::default()).unwrap();
    assert_eq!(sequencer.track_count(), 16);
}
