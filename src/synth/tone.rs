use super::channel::ChannelState;
use super::voice::Voice;
use super::voice_config::VoiceConfig;

/// Renders a single note of `config` on a fresh channel at full velocity.
///
/// The output starts with `delay` silent samples, the note sounds from there
/// and is released at sample `release` when `has_release` is set, and the
/// buffer ends at `total_length` samples. Voice output goes straight to PCM
/// without normalization, saturating at the i16 range.
pub fn generate_tone(
    note: u8,
    config: &VoiceConfig,
    delay: usize,
    release: usize,
    total_length: usize,
    has_release: bool,
) -> Vec<i16> {
    let delay = delay.min(total_length);
    let release = release.clamp(delay, total_length);
    let channel = ChannelState::new(0);
    let mut voice = Voice::new();
    let mut samples = vec![0i16; delay];
    samples.reserve(total_length - delay);

    voice.note_on(note, 1.0, config, &channel);
    for _ in delay..release {
        samples.push(next_sample(&mut voice));
    }
    if has_release {
        voice.note_off();
    }
    for _ in release..total_length {
        samples.push(next_sample(&mut voice));
    }
    samples
}

fn next_sample(voice: &mut Voice) -> i16 {
    let level = voice.render();
    voice.advance();
    (level * 32767.0) as i16
}
