use crate::audio::AudioBackend;
use crate::error::AudioError;
use crate::runtime::native::{lock, NativeSynth};
use crate::synth::config::SAMPLE_RATE;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, Stream, StreamConfig};
use log::{error, info, warn};
use std::sync::{Arc, Mutex};

pub struct CpalBackend {
    stream: Option<Stream>,
    synth: Arc<Mutex<NativeSynth>>,
}

impl CpalBackend {
    pub fn new(synth: Arc<Mutex<NativeSynth>>) -> Self {
        Self {
            stream: None,
            synth,
        }
    }

    fn select_output_device(&self, host: &cpal::Host) -> Result<cpal::Device, AudioError> {
        if cfg!(target_os = "linux") {
            // prefer the sound server over raw ALSA hardware devices
            let preferred = host.devices().ok().and_then(|mut devices| {
                devices.find(|device| {
                    let name = device.name().unwrap_or_default().to_lowercase();
                    name.starts_with("default:") || name.contains("pipewire")
                })
            });
            if let Some(device) = preferred {
                return Ok(device);
            }
        }
        host.default_output_device().ok_or(AudioError::NoDevice)
    }

    /// An f32 output configuration running at the engine's sample rate.
    fn select_config(&self, device: &cpal::Device) -> Result<StreamConfig, AudioError> {
        let rate = SampleRate(SAMPLE_RATE);
        let supported = device
            .supported_output_configs()?
            .filter(|range| range.sample_format() == SampleFormat::F32)
            .find(|range| range.min_sample_rate() <= rate && rate <= range.max_sample_rate());
        match supported {
            Some(range) => Ok(range.with_sample_rate(rate).into()),
            None => {
                let default = device.default_output_config()?;
                Err(AudioError::UnsupportedFormat(format!(
                    "{:?} at {} Hz",
                    default.sample_format(),
                    default.sample_rate().0
                )))
            }
        }
    }

    fn build_stream(&self) -> Result<Stream, AudioError> {
        let host = cpal::default_host();
        let device = self.select_output_device(&host)?;
        info!("selected device: {}", device.name().unwrap_or_default());

        let stream_config = self.select_config(&device)?;
        let channels = stream_config.channels as usize;
        let synth = self.synth.clone();
        let mut buffer = Vec::new();

        let stream = device.build_output_stream(
            &stream_config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                buffer.resize(data.len() / channels, 0.0);
                lock(&synth).process(&mut buffer);
                // mono signal duplicated to every device channel
                for (frame, sample) in data.chunks_mut(channels).zip(buffer.iter()) {
                    frame.fill(*sample);
                }
            },
            |err| error!("stream error: {err}"),
            None,
        )?;
        Ok(stream)
    }
}

impl AudioBackend for CpalBackend {
    fn start(&mut self) -> Result<(), AudioError> {
        let stream = self.build_stream()?;
        stream.play()?;
        self.stream = Some(stream);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        match &self.stream {
            Some(stream) => stream.pause()?,
            None => warn!("stop called before the stream was started"),
        }
        Ok(())
    }
}
