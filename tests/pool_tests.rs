mod common;

use common::{sine_preset, Shape};
use fourop::synth::channel::ChannelState;
use fourop::synth::config::POLYPHONY;
use fourop::synth::envelope::EnvelopeState;
use fourop::synth::pool::{SlotId, VoicePool};

fn held() -> Shape {
    Shape {
        attack: 0.0,
        decay1: 0.0,
        sustain: 1.0,
        release: 0.5,
    }
}

#[test]
fn test_seventeenth_note_steals_oldest_voice() {
    let config = sine_preset(held());
    let channel = ChannelState::new(0);
    let mut pool = VoicePool::new();

    let mut first = None;
    for note in 0..POLYPHONY as u8 {
        let slot = pool.note_on(40 + note, 100, &config, &channel).unwrap();
        if first.is_none() {
            first = Some(slot);
        }
    }
    let first = first.unwrap();
    assert_eq!(pool.free_count(), 0);

    let other = sine_preset(Shape {
        attack: 0.2,
        ..held()
    });
    let stolen = pool.note_on(90, 64, &other, &channel).unwrap();
    assert_eq!(stolen.index, first.index);
    assert_eq!(stolen.note, 90);
    assert_eq!(pool.active_slots().count(), POLYPHONY);

    let voice = pool.voice(stolen.index).unwrap();
    assert_eq!(voice.note_number(), 90);
    assert_eq!(voice.config(), Some(&other));
    assert!((voice.velocity() - 64.0 / 127.0).abs() < 1e-6);
    // the stolen voice restarts from scratch, no release
    assert_eq!(voice.operator(0).envelope().state(), EnvelopeState::Attack);
    assert_eq!(voice.operator(0).envelope().level(), 0.0);

    // the oldest note is gone from the active list
    assert!(pool.note_off(0, first.note).is_none());
}

#[test]
fn test_note_off_releases_matching_voice_once() {
    let config = sine_preset(held());
    let channel = ChannelState::new(3);
    let mut pool = VoicePool::new();

    let slot = pool.note_on(60, 127, &config, &channel).unwrap();
    assert_eq!(
        slot,
        SlotId {
            channel: 3,
            note: 60,
            index: slot.index
        }
    );
    pool.note_on(60, 127, &config, &ChannelState::new(4)).unwrap();

    let released = pool.note_off(3, 60).unwrap();
    assert_eq!(released, slot);
    let voice = pool.voice(slot.index).unwrap();
    assert_eq!(voice.operator(0).envelope().state(), EnvelopeState::Release);

    assert!(pool.note_off(3, 60).is_none());
    assert_eq!(pool.active_slots().count(), 1);
    assert_eq!(pool.active_slots().next().map(|s| s.channel), Some(4));
}

#[test]
fn test_freed_slots_are_reused_oldest_release_first() {
    let config = sine_preset(held());
    let channel = ChannelState::new(0);
    let mut pool = VoicePool::new();
    let slots: Vec<SlotId> = (0..POLYPHONY as u8)
        .map(|note| pool.note_on(note, 100, &config, &channel).unwrap())
        .collect();

    pool.note_off(0, 7);
    pool.note_off(0, 3);
    let next = pool.note_on(100, 100, &config, &channel).unwrap();
    assert_eq!(next.index, slots[7].index);
    let next = pool.note_on(101, 100, &config, &channel).unwrap();
    assert_eq!(next.index, slots[3].index);
}

#[test]
fn test_pitch_bend_only_touches_its_channel() {
    let config = sine_preset(held());
    let mut bent = ChannelState::new(1);
    let still = ChannelState::new(2);
    let mut pool = VoicePool::new();
    let a = pool.note_on(60, 100, &config, &bent).unwrap();
    let b = pool.note_on(60, 100, &config, &still).unwrap();
    let before_a = pool.voice(a.index).unwrap().operator(0).phase_increment();
    let before_b = pool.voice(b.index).unwrap().operator(0).phase_increment();

    bent.set_pitch_bend(0, 0);
    pool.pitch_bend(&bent);
    assert!(pool.voice(a.index).unwrap().operator(0).phase_increment() < before_a);
    assert_eq!(
        pool.voice(b.index).unwrap().operator(0).phase_increment(),
        before_b
    );
}

#[test]
fn test_all_notes_off_keeps_release_tails() {
    let config = sine_preset(held());
    let channel = ChannelState::new(0);
    let mut pool = VoicePool::new();
    for note in [60, 64, 67] {
        pool.note_on(note, 100, &config, &channel);
    }
    pool.all_notes_off();
    assert_eq!(pool.active_slots().count(), 0);
    assert_eq!(pool.free_count(), POLYPHONY);
    let releasing = pool
        .voices()
        .iter()
        .filter(|voice| voice.operator(0).envelope().state() == EnvelopeState::Release)
        .count();
    assert_eq!(releasing, 3);
}

#[test]
fn test_reset_cuts_every_voice() {
    let config = sine_preset(held());
    let channel = ChannelState::new(0);
    let mut pool = VoicePool::new();
    for note in [60, 64, 67] {
        pool.note_on(note, 100, &config, &channel);
    }
    pool.reset();
    assert_eq!(pool.free_count(), POLYPHONY);
    assert!(pool.voices().iter().all(|voice| !voice.is_active()));
    assert_eq!(pool.render(), 0.0);
}

#[test]
fn test_full_pool_output_stays_in_pcm_range() {
    let config = sine_preset(held());
    let channel = ChannelState::new(0);
    let mut pool = VoicePool::new();
    // stacked unisons sum far beyond ±1 before normalization
    for _ in 0..POLYPHONY {
        pool.note_on(45, 127, &config, &channel);
    }
    for _ in 0..2_000 {
        let sample = pool.render();
        assert!(sample.abs() <= 1.0, "sample {sample} out of range");
        let pcm = sample * 32767.0;
        assert!(pcm >= i16::MIN as f32 && pcm <= i16::MAX as f32);
        pool.advance();
    }
}

#[test]
fn test_custom_normalizer_receives_weights() {
    let config = sine_preset(held());
    let channel = ChannelState::new(0);
    let mut pool = VoicePool::with_normalizer(Box::new(|_sample: f32, weight: f32| weight));
    assert_eq!(pool.render(), 0.0);
    pool.note_on(60, 127, &config, &channel);
    pool.note_on(62, 127, &config, &channel);
    assert!((pool.render() - 2.0).abs() < 1e-6);
}
