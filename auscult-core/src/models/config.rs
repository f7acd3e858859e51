/// Configuration for a capture session.
///
/// The recorder opens the device stream and frames the output file with
/// these values; they never change while a session is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConfig {
    /// Sample rate in Hz (default: 44100).
    pub sample_rate: u32,

    /// Number of interleaved channels (default: 1 for mono).
    pub channels: u16,

    /// Bit depth for PCM output (default: 16). Valid values: 16, 24, 32.
    pub bits_per_sample: u16,
}

impl CaptureConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.sample_rate == 0 {
            return Err("sample rate must be positive".into());
        }
        if ![16, 24, 32].contains(&self.bits_per_sample) {
            return Err(format!("unsupported bit depth: {}", self.bits_per_sample));
        }
        if ![1, 2].contains(&self.channels) {
            return Err(format!("unsupported channel count: {}", self.channels));
        }
        Ok(())
    }

    /// Bytes per frame across all channels.
    pub fn block_align(&self) -> u16 {
        self.channels * self.bits_per_sample / 8
    }

    /// Bytes of PCM per second of audio.
    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * self.channels as u32 * self.bits_per_sample as u32 / 8
    }

    /// Writer chunk size: 100ms of audio in whole frames.
    pub fn chunk_bytes(&self) -> usize {
        (self.sample_rate as usize / 10).max(1) * self.block_align() as usize
    }

    /// Seconds of audio represented by `payload_bytes` of PCM.
    pub fn duration_secs(&self, payload_bytes: u64) -> f64 {
        payload_bytes as f64 / self.byte_rate() as f64
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 1,
            bits_per_sample: 16,
        }
    }
}
