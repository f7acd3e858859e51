use std::path::Path;
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};

use auscult_core::{AudioOutput, AuscultError};

/// Decoded clip held in memory for rendering.
struct LoadedClip {
    samples: Arc<Vec<i16>>,
    sample_rate: u32,
    channels: u16,
}

/// Speaker sink backed by a cpal output stream.
///
/// `open` decodes the whole WAV into memory; `start` builds the device
/// stream and renders the decoded samples, padding with silence once
/// the clip runs out. Recordings are short, so whole-file decode is
/// fine here.
#[derive(Default)]
pub struct CpalAudioOutput {
    device_name: Option<String>,
    clip: Option<LoadedClip>,
    stream: Option<cpal::Stream>,
}

impl CpalAudioOutput {
    /// Render to the host's default output device.
    pub fn default_device() -> Self {
        Self::default()
    }

    /// Render to the named output device.
    pub fn with_device(name: impl Into<String>) -> Self {
        Self {
            device_name: Some(name.into()),
            clip: None,
            stream: None,
        }
    }
}

impl AudioOutput for CpalAudioOutput {
    fn open(&mut self, path: &Path) -> Result<(), AuscultError> {
        self.stop();

        let mut reader = hound::WavReader::open(path)
            .map_err(|e| AuscultError::Io(format!("failed to open {:?}: {}", path, e)))?;
        let spec = reader.spec();
        let samples = reader
            .samples::<i16>()
            .collect::<Result<Vec<i16>, _>>()
            .map_err(|e| AuscultError::Io(format!("failed to decode {:?}: {}", path, e)))?;

        log::info!(
            "loaded clip {:?}: {} samples, {} Hz, {} ch",
            path,
            samples.len(),
            spec.sample_rate,
            spec.channels
        );

        self.clip = Some(LoadedClip {
            samples: Arc::new(samples),
            sample_rate: spec.sample_rate,
            channels: spec.channels,
        });
        Ok(())
    }

    fn start(&mut self) -> Result<(), AuscultError> {
        let clip = self
            .clip
            .as_ref()
            .ok_or_else(|| AuscultError::InvalidState("no clip loaded".into()))?;

        let host = cpal::default_host();
        let device = match self.device_name.as_deref() {
            Some(name) => host
                .output_devices()
                .map_err(|e| {
                    AuscultError::DeviceUnavailable(format!(
                        "failed to enumerate output devices: {}",
                        e
                    ))
                })?
                .find(|d| d.name().ok().as_deref() == Some(name))
                .ok_or_else(|| {
                    AuscultError::DeviceUnavailable(format!("output device not found: {}", name))
                })?,
            None => host.default_output_device().ok_or_else(|| {
                AuscultError::DeviceUnavailable("no default output device".into())
            })?,
        };

        let sample_format = device
            .default_output_config()
            .map_err(|e| {
                AuscultError::DeviceUnavailable(format!("no default output config: {}", e))
            })?
            .sample_format();

        let config = cpal::StreamConfig {
            channels: clip.channels,
            sample_rate: cpal::SampleRate(clip.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let stream = match sample_format {
            cpal::SampleFormat::F32 => {
                build_render_stream::<f32>(&device, &config, Arc::clone(&clip.samples))
            }
            cpal::SampleFormat::I16 => {
                build_render_stream::<i16>(&device, &config, Arc::clone(&clip.samples))
            }
            cpal::SampleFormat::U16 => {
                build_render_stream::<u16>(&device, &config, Arc::clone(&clip.samples))
            }
            fmt => Err(AuscultError::DeviceUnavailable(format!(
                "unsupported sample format: {:?}",
                fmt
            ))),
        }?;

        stream.play().map_err(|e| {
            AuscultError::DeviceUnavailable(format!("failed to start output stream: {}", e))
        })?;
        self.stream = Some(stream);
        log::info!("playback stream started ({} Hz)", clip.sample_rate);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            drop(stream);
            log::info!("output stream stopped");
        }
    }
}

impl Drop for CpalAudioOutput {
    fn drop(&mut self) {
        self.stop();
    }
}

fn build_render_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    samples: Arc<Vec<i16>>,
) -> Result<cpal::Stream, AuscultError>
where
    T: SizedSample + Sample + FromSample<f32> + Send + 'static,
{
    let mut position = 0usize;
    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                for slot in data.iter_mut() {
                    *slot = match samples.get(position) {
                        Some(&s) => {
                            position += 1;
                            convert_sample::<T>(s)
                        }
                        // Past the end of the clip: silence
                        None => T::EQUILIBRIUM,
                    };
                }
            },
            |err| log::error!("output stream error: {}", err),
            None,
        )
        .map_err(|e| {
            AuscultError::DeviceUnavailable(format!("failed to build output stream: {}", e))
        })
}

/// Convert a stored 16-bit sample to the device's format through a
/// normalized f32.
fn convert_sample<T: Sample + FromSample<f32>>(sample: i16) -> T {
    let normalized = sample as f32 / i16::MAX as f32;
    T::from_sample(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use auscult_core::{CaptureConfig, WavFileSink};
    use tempfile::TempDir;

    #[test]
    fn convert_sample_normalizes_to_f32() {
        let max: f32 = convert_sample(i16::MAX);
        let zero: f32 = convert_sample(0);
        let min: f32 = convert_sample(-i16::MAX);
        assert!((max - 1.0).abs() < 1e-6);
        assert!(zero.abs() < 1e-6);
        assert!((min + 1.0).abs() < 1e-6);
    }

    #[test]
    fn open_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let mut output = CpalAudioOutput::default_device();
        let err = output.open(&dir.path().join("nope.wav")).unwrap_err();
        assert!(matches!(err, AuscultError::Io(_)));
    }

    #[test]
    fn start_without_clip_is_invalid_state() {
        let mut output = CpalAudioOutput::default_device();
        let err = output.start().unwrap_err();
        assert!(matches!(err, AuscultError::InvalidState(_)));
    }

    #[test]
    fn open_reads_files_from_the_capture_sink() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clip.wav");
        let mut sink = WavFileSink::open(path.clone(), CaptureConfig::default()).unwrap();
        sink.write(&[0x01, 0x00, 0xFF, 0x7F]).unwrap();
        sink.finalize().unwrap();

        let mut output = CpalAudioOutput::default_device();
        output.open(&path).unwrap();

        let clip = output.clip.as_ref().unwrap();
        assert_eq!(*clip.samples, vec![1, i16::MAX]);
        assert_eq!(clip.sample_rate, 44100);
        assert_eq!(clip.channels, 1);
    }
}
