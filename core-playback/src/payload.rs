//! Prepared content handed from the preparer to the playback graph.

use bridge_traits::playback::DecodedAudio;

/// Where a fallback URL points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackSource {
    /// Object URL over bytes held in page memory. Must be revoked when replaced.
    ObjectUrl,
    /// Remote speech URL derived from text.
    Remote,
}

/// URL-addressable resource the hidden media element can play.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayableFallback {
    pub url: String,
    pub source: FallbackSource,
    /// MIME type of the blob behind an object URL.
    pub mime: Option<String>,
}

impl PlayableFallback {
    pub fn object_url(url: impl Into<String>, mime: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            source: FallbackSource::ObjectUrl,
            mime: Some(mime.into()),
        }
    }

    pub fn remote(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            source: FallbackSource::Remote,
            mime: None,
        }
    }

    pub fn is_object_url(&self) -> bool {
        self.source == FallbackSource::ObjectUrl
    }
}

/// Output of a successful preparation.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedContent {
    /// Generation of the request that produced this content.
    pub generation: u64,
    /// Payload variant it came from (`bytes`, `blob`, `text`).
    pub kind: &'static str,
    /// Decoded samples; `None` when decoding failed or was not attempted.
    pub decoded: Option<DecodedAudio>,
    /// Always present, so the element route can play whatever decoding missed.
    pub fallback: PlayableFallback,
}

impl PreparedContent {
    pub fn has_decoded(&self) -> bool {
        self.decoded.is_some()
    }
}
