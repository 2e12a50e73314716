//! `Blob` payloads posted on the control channel.

use crate::error::js_error;
use bridge_traits::{error::Result as BridgeResult, playback::BlobHandle};
use bytes::Bytes;
use js_sys::Uint8Array;
use wasm_bindgen_futures::JsFuture;

/// A browser `Blob` read lazily by the content preparer.
#[derive(Debug, Clone)]
pub struct WebBlob {
    blob: web_sys::Blob,
}

impl WebBlob {
    /// Wrap a blob received from page code.
    pub fn new(blob: web_sys::Blob) -> Self {
        Self { blob }
    }
}

#[async_trait::async_trait(?Send)]
impl BlobHandle for WebBlob {
    fn mime_type(&self) -> Option<String> {
        let mime = self.blob.type_();
        (!mime.is_empty()).then_some(mime)
    }

    async fn read_bytes(&self) -> BridgeResult<Bytes> {
        let buffer = JsFuture::from(self.blob.array_buffer())
            .await
            .map_err(js_error)?;
        Ok(Bytes::from(Uint8Array::new(&buffer).to_vec()))
    }
}
