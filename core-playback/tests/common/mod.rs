//! Shared fixtures for the playback integration tests.

#![allow(dead_code)]

use bytes::Bytes;
use std::io::Cursor;

/// 16-bit PCM WAV file holding `frames` frames of a constant `value`.
pub fn wav_bytes(sample_rate: u32, channels: u16, frames: usize, value: i16) -> Bytes {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for _ in 0..frames {
            for _ in 0..channels {
                writer.write_sample(value).unwrap();
            }
        }
        writer.finalize().unwrap();
    }
    Bytes::from(cursor.into_inner())
}

/// A short mono clip.
pub fn short_clip() -> Bytes {
    wav_bytes(22_050, 1, 2_205, 8_000)
}

/// Bytes no decoder recognizes.
pub fn undecodable() -> Bytes {
    Bytes::from_static(b"this is plain text pretending to be audio")
}
