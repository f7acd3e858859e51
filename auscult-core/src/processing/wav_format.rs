//! WAV container codec.
//!
//! Encodes the standard 44-byte RIFF WAV header and provides the
//! placeholder/finalize pair the capture pipeline uses: reserve the
//! header region when the file is created, rewrite it in place once the
//! payload length is known.

use std::io::{self, Seek, SeekFrom, Write};

/// Size of the standard WAV RIFF header in bytes.
pub const WAV_HEADER_LEN: usize = 44;

/// Largest PCM payload the 32-bit RIFF length fields can describe.
///
/// The RIFF chunk size field holds `data_len + 36`, so the payload is
/// capped 36 bytes short of `u32::MAX`.
pub const MAX_DATA_LEN: u64 = u32::MAX as u64 - 36;

/// Encode a 44-byte WAV RIFF header.
///
/// Format: PCM (format code 1), little-endian. `data_len` must not
/// exceed `MAX_DATA_LEN`.
///
/// Layout:
/// ```text
/// [0-3]    "RIFF"
/// [4-7]    data_len + 36 (RIFF chunk size = file size - 8)
/// [8-11]   "WAVE"
/// [12-15]  "fmt "
/// [16-19]  16 (PCM format chunk size)
/// [20-21]  1 (PCM format code)
/// [22-23]  channels
/// [24-27]  sample_rate
/// [28-31]  byte_rate = sample_rate * channels * bits_per_sample / 8
/// [32-33]  block_align = channels * bits_per_sample / 8
/// [34-35]  bits_per_sample
/// [36-39]  "data"
/// [40-43]  data_len
/// ```
pub fn encode_header(
    sample_rate: u32,
    channels: u16,
    bits_per_sample: u16,
    data_len: u32,
) -> [u8; WAV_HEADER_LEN] {
    let byte_rate = sample_rate * channels as u32 * bits_per_sample as u32 / 8;
    let block_align = channels * bits_per_sample / 8;
    let chunk_size = data_len + 36;

    let mut header = [0u8; WAV_HEADER_LEN];

    // RIFF chunk descriptor
    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&chunk_size.to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");

    // fmt sub-chunk
    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes()); // PCM format size
    header[20..22].copy_from_slice(&1u16.to_le_bytes()); // PCM format code
    header[22..24].copy_from_slice(&channels.to_le_bytes());
    header[24..28].copy_from_slice(&sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    header[32..34].copy_from_slice(&block_align.to_le_bytes());
    header[34..36].copy_from_slice(&bits_per_sample.to_le_bytes());

    // data sub-chunk
    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_len.to_le_bytes());

    header
}

/// Reserve the header region of a fresh capture file.
///
/// Writes a full header with zeroed length fields; the sink position
/// advances by exactly `WAV_HEADER_LEN` so payload appends can follow.
pub fn write_placeholder_header<W: Write>(
    sink: &mut W,
    sample_rate: u32,
    channels: u16,
    bits_per_sample: u16,
) -> io::Result<()> {
    sink.write_all(&encode_header(sample_rate, channels, bits_per_sample, 0))
}

/// Rewrite the header in place with the final payload length.
///
/// Seeks to offset 0 and overwrites all 44 bytes; the sink position is
/// unspecified afterward. Must be the last write on a capture file.
pub fn finalize_header<S: Write + Seek>(
    sink: &mut S,
    sample_rate: u32,
    channels: u16,
    bits_per_sample: u16,
    data_len: u32,
) -> io::Result<()> {
    sink.seek(SeekFrom::Start(0))?;
    sink.write_all(&encode_header(sample_rate, channels, bits_per_sample, data_len))
}
