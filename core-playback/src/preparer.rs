//! # Content Preparer
//!
//! Normalizes an [`AudioPayload`] into [`PreparedContent`]: a fallback URL the
//! hidden media element can always play, plus decoded PCM when the bytes
//! decode.
//!
//! | Payload | Bytes acquired | Decode attempted | Fallback |
//! |---------|----------------|------------------|----------|
//! | `Bytes` | as given | yes | object URL |
//! | `Blob`  | read asynchronously | yes | object URL |
//! | `Text`  | none | no | remote speech URL |
//!
//! Object URLs are released in two phases. `prepare` creates the new URL
//! but leaves the one in use alone; once the content is installed the caller
//! hands it to [`ContentPreparer::commit`], which revokes the previous URL.
//! Content that is never installed goes to [`ContentPreparer::discard`]. The
//! preparer therefore holds one committed URL, plus one pending URL per
//! request between prepare and commit.

use crate::decoder::{FormatDetector, SymphoniaDecoder};
use crate::error::{PlaybackError, Result};
use crate::generation::RequestTicket;
use crate::payload::{PlayableFallback, PreparedContent};
use bridge_traits::{
    audio_graph::ObjectUrlRegistry,
    playback::{AudioDecoder, AudioPayload},
};
use bytes::Bytes;
use core_runtime::config::FallbackConfig;
use core_runtime::logging::{describe_text, redact_url};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

pub struct ContentPreparer<U: ObjectUrlRegistry> {
    urls: Arc<U>,
    decoder: Arc<dyn AudioDecoder>,
    fallback: FallbackConfig,
    held_url: Mutex<Option<String>>,
}

impl<U: ObjectUrlRegistry> ContentPreparer<U> {
    /// Preparer decoding with [`SymphoniaDecoder`].
    pub fn new(urls: Arc<U>, fallback: FallbackConfig) -> Self {
        Self {
            urls,
            decoder: Arc::new(SymphoniaDecoder::new()),
            fallback,
            held_url: Mutex::new(None),
        }
    }

    /// Decode through `decoder` instead, e.g. the platform's own decoder.
    pub fn with_decoder(mut self, decoder: Arc<dyn AudioDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    /// Object URL of the committed content.
    pub fn held_object_url(&self) -> Option<String> {
        self.held_url.lock().clone()
    }

    /// Prepare `payload` for the request identified by `ticket`.
    ///
    /// # Errors
    ///
    /// - [`PlaybackError::Superseded`] if a newer request began before any
    ///   resource was allocated
    /// - [`PlaybackError::InvalidPayload`] for empty bytes, blobs or text
    /// - [`PlaybackError::AcquisitionFailure`] if a blob cannot be read
    ///
    /// A decode failure is not an error: the content is returned with
    /// `decoded = None`.
    ///
    /// The returned content must be passed to [`commit`] or [`discard`].
    ///
    /// [`commit`]: ContentPreparer::commit
    /// [`discard`]: ContentPreparer::discard
    #[instrument(skip_all, fields(generation = ticket.generation(), kind = payload.kind()))]
    pub async fn prepare(
        &self,
        payload: AudioPayload,
        ticket: &RequestTicket,
    ) -> Result<PreparedContent> {
        ticket.ensure_current()?;
        payload.validate()?;

        match payload {
            AudioPayload::Text { text } => self.prepare_text(&text, ticket),
            AudioPayload::Bytes { bytes, mime_hint } => {
                self.prepare_bytes("bytes", bytes, mime_hint, ticket).await
            }
            AudioPayload::Blob { handle } => {
                let mime_hint = handle.mime_type();
                let bytes = handle
                    .read_bytes()
                    .await
                    .map_err(|e| PlaybackError::AcquisitionFailure(e.to_string()))?;
                debug!(len = bytes.len(), "Read blob");
                self.prepare_bytes("blob", bytes, mime_hint, ticket).await
            }
        }
    }

    fn prepare_text(&self, text: &str, ticket: &RequestTicket) -> Result<PreparedContent> {
        let text = text.trim();
        let url = self.fallback.speech_url(text);

        debug!(
            text = %describe_text(text),
            url = %redact_url(&url),
            "Prepared remote speech fallback"
        );
        Ok(PreparedContent {
            generation: ticket.generation(),
            kind: "text",
            decoded: None,
            fallback: PlayableFallback::remote(url),
        })
    }

    async fn prepare_bytes(
        &self,
        kind: &'static str,
        bytes: Bytes,
        mime_hint: Option<String>,
        ticket: &RequestTicket,
    ) -> Result<PreparedContent> {
        if bytes.is_empty() {
            return Err(PlaybackError::InvalidPayload(format!(
                "{} payload has no bytes",
                kind
            )));
        }
        // Blob reads are asynchronous; a newer request may have started.
        ticket.ensure_current()?;

        let mime = FormatDetector::resolve_mime(
            mime_hint.as_deref(),
            &bytes,
            &self.fallback.default_mime,
        );

        let decoded = match self.decoder.decode(&bytes, Some(&mime)).await {
            Ok(audio) => Some(audio),
            Err(e) => {
                warn!(error = %e, mime = %mime, "Decode failed, element fallback only");
                None
            }
        };

        ticket.ensure_current()?;
        let url = self.urls.create_object_url(&bytes, &mime)?;

        debug!(
            mime = %mime,
            decoded = decoded.is_some(),
            "Prepared object URL fallback"
        );
        Ok(PreparedContent {
            generation: ticket.generation(),
            kind,
            decoded,
            fallback: PlayableFallback::object_url(url, mime),
        })
    }

    /// Take ownership of the URL behind installed content, revoking the
    /// previously committed one. Remote content leaves nothing to hold.
    pub fn commit(&self, fallback: &PlayableFallback) {
        let next = fallback.is_object_url().then(|| fallback.url.clone());
        let previous = {
            let mut held = self.held_url.lock();
            std::mem::replace(&mut *held, next)
        };
        if let Some(previous) = previous.filter(|url| *url != fallback.url) {
            self.revoke(&previous);
        }
    }

    /// Release the URL of content that was prepared but never installed.
    pub fn discard(&self, fallback: &PlayableFallback) {
        let held = self.held_url.lock().clone();
        if fallback.is_object_url() && held.as_deref() != Some(fallback.url.as_str()) {
            debug!(url = %redact_url(&fallback.url), "Discarding uninstalled object URL");
            self.revoke(&fallback.url);
        }
    }

    fn release_held_url(&self) {
        if let Some(previous) = self.held_url.lock().take() {
            self.revoke(&previous);
        }
    }

    fn revoke(&self, url: &str) {
        if let Err(e) = self.urls.revoke_object_url(url) {
            warn!(error = %e, "Failed to revoke object URL");
        }
    }
}

impl<U: ObjectUrlRegistry> Drop for ContentPreparer<U> {
    fn drop(&mut self) {
        self.release_held_url();
    }
}
