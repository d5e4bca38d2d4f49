use crate::{PakError, PakResult};
use brotli::enc::encode::BrotliEncoderMaxCompressedSize;
use brotli::enc::writer::CompressorWriter;
use brotli::enc::{BrotliEncoderParams, StandardAlloc};
use brotli::{BrotliDecompressStream, BrotliResult, BrotliState};
use std::io::Write;

pub const DEFAULT_QUALITY: i32 = 11;
pub const DEFAULT_WINDOW: i32 = 22;

// Output growth of the decoder when no size hint is given
const DECODE_SIZE_FACTOR: usize = 4;
const MIN_DECODE_BUFFER: usize = 1024;

/// Compresses `data` with brotli at the given quality (0..=11) and window size (10..=24).
pub fn compress(data: &[u8], quality: i32, window_size: i32) -> PakResult<Vec<u8>> {
    let max_size = BrotliEncoderMaxCompressedSize(data.len());
    if max_size == 0 {
        return Err(PakError::InputTooLarge(data.len()));
    }

    let mut params = BrotliEncoderParams::default();
    params.quality = quality;
    params.lgwin = window_size;
    params.size_hint = data.len();

    let mut w = CompressorWriter::with_params(Vec::with_capacity(max_size), 64 * 1024, &params);
    w.write_all(data)?;
    let compressed = w.into_inner();
    debug_assert!(compressed.len() <= max_size);
    Ok(compressed)
}

/// Decompresses a brotli stream.
/// The output buffer starts at `expected_size`, capped to a multiple of the input length,
/// and is doubled every time the decoder asks for more room.
pub fn decompress(data: &[u8], expected_size: Option<usize>) -> PakResult<Vec<u8>> {
    let bound = data
        .len()
        .saturating_mul(DECODE_SIZE_FACTOR)
        .max(MIN_DECODE_BUFFER);
    let initial = match expected_size {
        Some(size) => size.min(bound),
        None => bound,
    };
    let mut result = vec![0u8; initial];

    let mut state = BrotliState::new(
        StandardAlloc::default(),
        StandardAlloc::default(),
        StandardAlloc::default(),
    );

    let mut available_in = data.len();
    let mut input_offset = 0usize;
    let mut available_out = result.len();
    let mut output_offset = 0usize;
    let mut total_out = 0usize;

    loop {
        match BrotliDecompressStream(
            &mut available_in,
            &mut input_offset,
            data,
            &mut available_out,
            &mut output_offset,
            &mut result,
            &mut total_out,
            &mut state,
        ) {
            BrotliResult::ResultSuccess => break,
            BrotliResult::NeedsMoreOutput => {
                let grown = (result.len() * 2).max(MIN_DECODE_BUFFER);
                result.resize(grown, 0);
                available_out = result.len() - output_offset;
            }
            BrotliResult::NeedsMoreInput => {
                return Err(PakError::DecodeError("truncated brotli stream".to_string()));
            }
            BrotliResult::ResultFailure => {
                return Err(PakError::DecodeError("malformed brotli stream".to_string()));
            }
        }
    }

    result.truncate(output_offset);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{RngCore, SeedableRng};

    fn round_trip(data: &[u8], expected: Option<usize>) {
        let compressed = compress(data, DEFAULT_QUALITY, DEFAULT_WINDOW).unwrap();
        let decompressed = decompress(&compressed, expected).unwrap();
        assert_eq!(decompressed, data);
    }

    #[test]
    fn test_empty_buffer() {
        round_trip(&[], None);
        round_trip(&[], Some(0));
    }

    #[test]
    fn test_text_without_size_hint() {
        let text = "material:\n  albedo: [1.0, 0.5, 0.25]\n".repeat(512);
        round_trip(text.as_bytes(), None);
    }

    #[test]
    fn test_exact_size_hint() {
        let data = vec![7u8; 100_000];
        round_trip(&data, Some(data.len()));
    }

    #[test]
    fn test_undersized_hint_grows_buffer() {
        let data = vec![3u8; 300_000];
        round_trip(&data, Some(1));
    }

    #[test]
    fn test_random_multi_megabyte() {
        let mut data = vec![0u8; 3 * 1024 * 1024];
        StdRng::seed_from_u64(1).fill_bytes(&mut data);
        let compressed = compress(&data, 1, 20).unwrap();
        assert_eq!(decompress(&compressed, None).unwrap(), data);
    }

    #[test]
    fn test_oversized_hint_is_not_trusted() {
        let data = b"short text".to_vec();
        round_trip(&data, Some(usize::MAX));
        round_trip(&data, Some(1 << 50));
    }

    #[test]
    fn test_garbage_is_rejected() {
        let garbage = [0xFFu8; 64];
        assert!(matches!(
            decompress(&garbage, Some(128)),
            Err(PakError::DecodeError(_))
        ));
    }

    #[test]
    fn test_truncated_stream_is_rejected() {
        let data = "scene".repeat(4096);
        let compressed = compress(data.as_bytes(), DEFAULT_QUALITY, DEFAULT_WINDOW).unwrap();
        let truncated = &compressed[..compressed.len() / 2];
        assert!(matches!(
            decompress(truncated, None),
            Err(PakError::DecodeError(_))
        ));
    }
}
