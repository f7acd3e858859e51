use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::models::config::CaptureConfig;
use crate::models::error::AuscultError;
use crate::processing::wav_format;

/// Streaming WAV file sink, owned by the capture writer thread.
///
/// `open` reserves the header region, `write` appends PCM payload, and
/// `finalize` rewrites the header in place once the payload length is
/// known. Until `finalize` completes, the on-disk header carries zeroed
/// length fields.
///
/// ## File layout
///
/// ```text
/// [44-byte WAV header, placeholder until finalize]
/// [interleaved little-endian PCM...]
/// ```
pub struct WavFileSink {
    path: PathBuf,
    file: File,
    config: CaptureConfig,
    payload_bytes: u64,
}

impl WavFileSink {
    /// Create the file (and any missing parent directories) and write
    /// the placeholder header.
    pub fn open(path: PathBuf, config: CaptureConfig) -> Result<Self, AuscultError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| AuscultError::Io(format!("failed to create directory: {}", e)))?;
        }

        let mut file = File::create(&path)
            .map_err(|e| AuscultError::Io(format!("failed to create file: {}", e)))?;

        wav_format::write_placeholder_header(
            &mut file,
            config.sample_rate,
            config.channels,
            config.bits_per_sample,
        )
        .map_err(|e| AuscultError::Io(format!("failed to write header: {}", e)))?;

        Ok(Self {
            path,
            file,
            config,
            payload_bytes: 0,
        })
    }

    /// Append PCM payload bytes.
    ///
    /// Fails without writing when the payload would outgrow the 32-bit
    /// RIFF length fields (`wav_format::MAX_DATA_LEN`, just under 4 GiB).
    pub fn write(&mut self, data: &[u8]) -> Result<(), AuscultError> {
        if self.payload_bytes + data.len() as u64 > wav_format::MAX_DATA_LEN {
            return Err(AuscultError::Io(format!(
                "payload would exceed the WAV size limit of {} bytes",
                wav_format::MAX_DATA_LEN
            )));
        }

        self.file
            .write_all(data)
            .map_err(|e| AuscultError::Io(format!("write failed: {}", e)))?;
        self.payload_bytes += data.len() as u64;
        Ok(())
    }

    /// PCM payload bytes written so far (excludes the header).
    pub fn payload_bytes(&self) -> u64 {
        self.payload_bytes
    }

    /// Path of the output file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush, rewrite the header with the final payload length, and
    /// return the SHA-256 hex digest of the completed file.
    ///
    /// Consumes the sink: the header rewrite must be the last write on
    /// the file.
    pub fn finalize(self) -> Result<String, AuscultError> {
        let Self {
            path,
            mut file,
            config,
            payload_bytes,
        } = self;

        file.flush()
            .map_err(|e| AuscultError::Io(format!("flush failed: {}", e)))?;

        wav_format::finalize_header(
            &mut file,
            config.sample_rate,
            config.channels,
            config.bits_per_sample,
            payload_bytes as u32,
        )
        .map_err(|e| AuscultError::Io(format!("failed to finalize header: {}", e)))?;

        file.flush()
            .map_err(|e| AuscultError::Io(format!("flush failed: {}", e)))?;
        drop(file);

        sha256_file(&path)
    }
}

/// Compute SHA-256 hex digest of a file.
fn sha256_file(path: &Path) -> Result<String, AuscultError> {
    let data = fs::read(path)
        .map_err(|e| AuscultError::Io(format!("failed to read file for checksum: {}", e)))?;
    let digest = Sha256::digest(&data);
    Ok(hex_encode(&digest))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
