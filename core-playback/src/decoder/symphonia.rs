//! # Symphonia Decoder Implementation
//!
//! Decodes a complete in-memory file to planar `f32` PCM in process. Browser
//! hosts decode through the platform instead, so this runs on native hosts.

use crate::decoder::format_detector::FormatDetector;
use bridge_traits::error::{BridgeError, Result};
use bridge_traits::playback::{AudioDecoder, DecodedAudio};
use bytes::Bytes;
use std::io::Cursor;
use symphonia::core::audio::Signal;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, instrument, warn};

const DEFAULT_MAX_CONSECUTIVE_ERRORS: usize = 10;

/// Symphonia-backed [`AudioDecoder`].
///
/// Corrupted packets are skipped; decoding gives up after a run of
/// consecutive failures.
#[derive(Debug, Clone)]
pub struct SymphoniaDecoder {
    max_consecutive_errors: usize,
}

impl Default for SymphoniaDecoder {
    fn default() -> Self {
        Self {
            max_consecutive_errors: DEFAULT_MAX_CONSECUTIVE_ERRORS,
        }
    }
}

impl SymphoniaDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_consecutive_errors(mut self, limit: usize) -> Self {
        self.max_consecutive_errors = limit.max(1);
        self
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
impl AudioDecoder for SymphoniaDecoder {
    async fn decode(&self, bytes: &Bytes, mime_hint: Option<&str>) -> Result<DecodedAudio> {
        self.decode_in_memory(bytes, mime_hint)
    }
}

impl SymphoniaDecoder {
    #[instrument(skip(self, bytes), fields(len = bytes.len()))]
    fn decode_in_memory(&self, bytes: &Bytes, mime_hint: Option<&str>) -> Result<DecodedAudio> {
        if bytes.is_empty() {
            return Err(BridgeError::DecodeFailed("empty input".to_string()));
        }

        let hint = mime_hint
            .map(FormatDetector::hint_from_mime_type)
            .unwrap_or_else(Hint::new);

        let media_source = Box::new(Cursor::new(bytes.clone())) as Box<dyn MediaSource>;
        let stream = MediaSourceStream::new(media_source, Default::default());

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                stream,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| BridgeError::DecodeFailed(format!("Failed to probe format: {}", e)))?;

        let mut format_reader = probed.format;

        let (track_id, codec_params) = {
            let track = format_reader
                .tracks()
                .iter()
                .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
                .ok_or_else(|| {
                    BridgeError::DecodeFailed("No supported audio tracks".to_string())
                })?;
            (track.id, track.codec_params.clone())
        };

        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| {
                BridgeError::DecodeFailed(format!("Failed to create codec decoder: {}", e))
            })?;

        let mut sample_rate = codec_params.sample_rate;
        let mut channels: Vec<Vec<f32>> = Vec::new();
        let mut consecutive_errors = 0;

        loop {
            let packet = match format_reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => {
                    // Chained streams: keep what the first one produced.
                    debug!("Track list changed, stopping after first stream");
                    break;
                }
                Err(e) => {
                    return Err(BridgeError::DecodeFailed(format!(
                        "Failed to read packet: {}",
                        e
                    )));
                }
            };

            while !format_reader.metadata().is_latest() {
                format_reader.metadata().pop();
            }

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    consecutive_errors = 0;

                    let spec = *decoded.spec();
                    let rate = *sample_rate.get_or_insert(spec.rate);
                    if rate != spec.rate {
                        warn!("Sample rate changed mid-stream from {} to {}", rate, spec.rate);
                    }

                    let mut converted = decoded.make_equivalent::<f32>();
                    decoded.convert(&mut converted);

                    let count = spec.channels.count();
                    if channels.is_empty() {
                        channels = vec![Vec::new(); count];
                    }
                    for (index, plane) in channels.iter_mut().enumerate().take(count) {
                        plane.extend_from_slice(converted.chan(index));
                    }
                }
                Err(err @ (SymphoniaError::IoError(_) | SymphoniaError::DecodeError(_)))
                    if consecutive_errors + 1 < self.max_consecutive_errors =>
                {
                    consecutive_errors += 1;
                    warn!(
                        "Skipping corrupted packet (attempt {}/{}): {}",
                        consecutive_errors, self.max_consecutive_errors, err
                    );
                }
                Err(e) => {
                    return Err(BridgeError::DecodeFailed(format!(
                        "Failed to decode packet: {}",
                        e
                    )));
                }
            }
        }

        let audio = DecodedAudio::new(sample_rate.unwrap_or(0), channels);
        if audio.is_empty() || audio.sample_rate == 0 {
            return Err(BridgeError::DecodeFailed(
                "No audio frames decoded".to_string(),
            ));
        }

        debug!(
            sample_rate = audio.sample_rate,
            channels = audio.channel_count(),
            frames = audio.frames(),
            "Decoded audio"
        );
        Ok(audio)
    }
}
