//! WAV RIFF header generation for the streaming recording writer.

/// Size of the standard WAV RIFF header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

/// Generate a 44-byte WAV RIFF header for little-endian PCM.
///
/// `data_size` may be zero at open time; the writer patches the size
/// fields in place when the file is finalized.
pub fn generate_wav_header(
    sample_rate: u32,
    bit_depth: u16,
    channels: u16,
    data_size: u32,
) -> [u8; WAV_HEADER_SIZE] {
    let byte_rate = sample_rate * u32::from(channels) * u32::from(bit_depth) / 8;
    let block_align = channels * bit_depth / 8;

    let mut header = [0u8; WAV_HEADER_SIZE];

    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&(36 + data_size).to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");

    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes());
    header[20..22].copy_from_slice(&1u16.to_le_bytes()); // PCM
    header[22..24].copy_from_slice(&channels.to_le_bytes());
    header[24..28].copy_from_slice(&sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    header[32..34].copy_from_slice(&block_align.to_le_bytes());
    header[34..36].copy_from_slice(&bit_depth.to_le_bytes());

    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_size.to_le_bytes());

    header
}
