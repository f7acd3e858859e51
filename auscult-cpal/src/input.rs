use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use parking_lot::Mutex;

use auscult_core::{AudioInput, AuscultError, CaptureConfig, InputStream, PcmRing};

/// Seconds of 16-bit PCM the staging ring holds before it starts
/// dropping the oldest samples.
const RING_SECONDS: usize = 5;

/// Microphone input backed by cpal.
///
/// Each `open` spawns a thread that owns the cpal stream for its whole
/// life; the stream callback converts device samples to 16-bit PCM and
/// pushes them into a ring the returned [`CpalInputStream`] drains.
#[derive(Default)]
pub struct CpalAudioInput {
    device_name: Option<String>,
}

impl CpalAudioInput {
    /// Capture from the host's default input device.
    pub fn default_device() -> Self {
        Self { device_name: None }
    }

    /// Capture from the named input device.
    pub fn with_device(name: impl Into<String>) -> Self {
        Self {
            device_name: Some(name.into()),
        }
    }
}

impl AudioInput for CpalAudioInput {
    type Stream = CpalInputStream;

    fn open(&self, config: &CaptureConfig) -> Result<Self::Stream, AuscultError> {
        // The callback conversion always emits 16-bit PCM; any other
        // depth would contradict the header the sink writes.
        if config.bits_per_sample != 16 {
            return Err(AuscultError::DeviceUnavailable(format!(
                "unsupported bit depth: {} (16-bit pcm only)",
                config.bits_per_sample
            )));
        }

        let ring_capacity = config.byte_rate() as usize * RING_SECONDS;
        let ring = Arc::new(Mutex::new(PcmRing::new(ring_capacity)));
        let running = Arc::new(AtomicBool::new(true));
        let (ready_tx, ready_rx) = mpsc::channel();

        let worker = {
            let ring = Arc::clone(&ring);
            let running = Arc::clone(&running);
            let device_name = self.device_name.clone();
            let config = *config;
            thread::Builder::new()
                .name("cpal-capture".into())
                .spawn(move || capture_thread(device_name, config, ring, running, ready_tx))
                .map_err(|e| {
                    AuscultError::DeviceUnavailable(format!(
                        "failed to spawn capture thread: {}",
                        e
                    ))
                })?
        };

        // The thread reports stream construction before entering its
        // keep-alive loop, so open errors surface synchronously.
        match ready_rx.recv() {
            Ok(Ok(())) => Ok(CpalInputStream {
                ring,
                running,
                worker: Some(worker),
            }),
            Ok(Err(e)) => {
                let _ = worker.join();
                Err(e)
            }
            Err(_) => {
                let _ = worker.join();
                Err(AuscultError::DeviceUnavailable(
                    "capture thread exited before reporting readiness".into(),
                ))
            }
        }
    }
}

/// Body of the `cpal-capture` thread. Builds and starts the stream,
/// reports the result over `ready`, then just keeps the stream alive
/// until `running` clears.
fn capture_thread(
    device_name: Option<String>,
    config: CaptureConfig,
    ring: Arc<Mutex<PcmRing>>,
    running: Arc<AtomicBool>,
    ready: mpsc::Sender<Result<(), AuscultError>>,
) {
    let stream = match build_capture_stream(device_name.as_deref(), &config, Arc::clone(&ring)) {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = ready.send(Err(AuscultError::DeviceUnavailable(format!(
            "failed to start input stream: {}",
            e
        ))));
        return;
    }
    let _ = ready.send(Ok(()));

    while running.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_millis(10));
    }

    drop(stream);
    let dropped = ring.lock().dropped_bytes();
    if dropped > 0 {
        log::warn!("input ring dropped {} bytes during capture", dropped);
    }
}

fn build_capture_stream(
    device_name: Option<&str>,
    config: &CaptureConfig,
    ring: Arc<Mutex<PcmRing>>,
) -> Result<cpal::Stream, AuscultError> {
    let host = cpal::default_host();
    let device = match device_name {
        Some(name) => host
            .input_devices()
            .map_err(|e| {
                AuscultError::DeviceUnavailable(format!(
                    "failed to enumerate input devices: {}",
                    e
                ))
            })?
            .find(|d| d.name().ok().as_deref() == Some(name))
            .ok_or_else(|| {
                AuscultError::DeviceUnavailable(format!("input device not found: {}", name))
            })?,
        None => host.default_input_device().ok_or_else(|| {
            AuscultError::DeviceUnavailable("no default input device".into())
        })?,
    };

    log::info!("input device: {:?}", device.name());

    let sample_format = device
        .default_input_config()
        .map_err(|e| {
            AuscultError::DeviceUnavailable(format!("no default input config: {}", e))
        })?
        .sample_format();

    let stream_config = cpal::StreamConfig {
        channels: config.channels,
        sample_rate: cpal::SampleRate(config.sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    match sample_format {
        cpal::SampleFormat::F32 => build_typed_stream::<f32>(&device, &stream_config, ring),
        cpal::SampleFormat::I16 => build_typed_stream::<i16>(&device, &stream_config, ring),
        cpal::SampleFormat::U16 => build_typed_stream::<u16>(&device, &stream_config, ring),
        fmt => Err(AuscultError::DeviceUnavailable(format!(
            "unsupported sample format: {:?}",
            fmt
        ))),
    }
}

fn build_typed_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    ring: Arc<Mutex<PcmRing>>,
) -> Result<cpal::Stream, AuscultError>
where
    T: SizedSample + Send + 'static,
    f32: FromSample<T>,
{
    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                let bytes = pcm16_bytes(data);
                ring.lock().write(&bytes);
            },
            |err| log::error!("input stream error: {}", err),
            None,
        )
        .map_err(|e| {
            AuscultError::DeviceUnavailable(format!("failed to build input stream: {}", e))
        })
}

/// Convert device samples of any supported format to 16-bit
/// little-endian PCM bytes.
fn pcm16_bytes<T>(data: &[T]) -> Vec<u8>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let mut bytes = Vec::with_capacity(data.len() * 2);
    for &s in data {
        let f = f32::from_sample(s).clamp(-1.0, 1.0);
        let value = (f * i16::MAX as f32) as i16;
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Reader half of an open capture: drains the PCM ring the device
/// callback fills. Dropping it stops the capture thread and releases
/// the device.
pub struct CpalInputStream {
    ring: Arc<Mutex<PcmRing>>,
    running: Arc<AtomicBool>,
    worker: Option<thread::JoinHandle<()>>,
}

impl InputStream for CpalInputStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, AuscultError> {
        Ok(self.ring.lock().read_into(buf))
    }
}

impl Drop for CpalInputStream {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
