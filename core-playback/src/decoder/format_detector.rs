//! # Format Detection Module
//!
//! MIME handling and content sniffing for encoded audio.

use symphonia::core::probe::Hint;
use tracing::debug;

/// Format detector for in-memory audio.
pub struct FormatDetector;

impl FormatDetector {
    /// Create a probe hint from MIME type.
    ///
    /// Parameters such as `;codecs=opus` are ignored. Known types also set the
    /// matching extension, which Symphonia weighs more than the MIME type.
    ///
    /// # Example
    ///
    /// ```rust
    /// use core_playback::FormatDetector;
    ///
    /// let hint = FormatDetector::hint_from_mime_type("audio/mpeg");
    /// // Hint will be configured for MP3 detection
    /// ```
    pub fn hint_from_mime_type(mime_type: &str) -> Hint {
        let mut hint = Hint::new();
        let essence = Self::essence(mime_type);

        debug!("Creating probe hint from MIME type: {}", essence);
        hint.mime_type(&essence);
        if let Some(extension) = Self::extension_for_mime(&essence) {
            hint.with_extension(extension);
        }

        hint
    }

    /// Lower-cased MIME type without parameters.
    pub fn essence(mime_type: &str) -> String {
        mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
    }

    /// Common file extension for a MIME type.
    pub fn extension_for_mime(mime_type: &str) -> Option<&'static str> {
        match Self::essence(mime_type).as_str() {
            "audio/mpeg" | "audio/mp3" | "audio/mpeg3" => Some("mp3"),
            "audio/wav" | "audio/wave" | "audio/x-wav" | "audio/vnd.wave" => Some("wav"),
            "audio/ogg" | "audio/opus" | "application/ogg" => Some("ogg"),
            "audio/flac" | "audio/x-flac" => Some("flac"),
            "audio/aac" | "audio/aacp" => Some("aac"),
            "audio/mp4" | "audio/x-m4a" => Some("m4a"),
            "audio/webm" => Some("webm"),
            "audio/aiff" | "audio/x-aiff" => Some("aiff"),
            _ => None,
        }
    }

    /// Infer a MIME type from the leading bytes of an encoded file.
    ///
    /// Recognizes RIFF/WAVE, ID3-tagged and bare MPEG audio, ADTS AAC, Ogg,
    /// FLAC, ISO-BMFF (`ftyp`) and EBML (WebM) signatures.
    pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
        match bytes {
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'A', b'V', b'E', ..] => Some("audio/wav"),
            [b'I', b'D', b'3', ..] => Some("audio/mpeg"),
            [b'O', b'g', b'g', b'S', ..] => Some("audio/ogg"),
            [b'f', b'L', b'a', b'C', ..] => Some("audio/flac"),
            [0x1A, 0x45, 0xDF, 0xA3, ..] => Some("audio/webm"),
            [_, _, _, _, b'f', b't', b'y', b'p', ..] => Some("audio/mp4"),
            [b'F', b'O', b'R', b'M', _, _, _, _, b'A', b'I', b'F', ..] => Some("audio/aiff"),
            // ADTS: 12-bit sync, layer bits 00.
            [0xFF, second, ..] if second & 0xF6 == 0xF0 => Some("audio/aac"),
            // MPEG audio frame sync: 11 bits set.
            [0xFF, second, ..] if second & 0xE0 == 0xE0 => Some("audio/mpeg"),
            _ => None,
        }
    }

    /// Pick the MIME type for a blob: a non-empty hint, else the sniffed type,
    /// else `default_mime`.
    pub fn resolve_mime(hint: Option<&str>, bytes: &[u8], default_mime: &str) -> String {
        if let Some(hint) = hint.map(str::trim).filter(|hint| !hint.is_empty()) {
            return hint.to_string();
        }
        Self::sniff_mime(bytes)
            .map(str::to_string)
            .unwrap_or_else(|| default_mime.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hint_from_mime_type() {
        // Hint is opaque, but should not panic on parameters or unknown types
        let _ = FormatDetector::hint_from_mime_type("audio/webm;codecs=opus");
        let _ = FormatDetector::hint_from_mime_type("application/x-unknown");
    }

    #[test]
    fn test_essence() {
        assert_eq!(FormatDetector::essence("Audio/WebM; codecs=opus"), "audio/webm");
        assert_eq!(FormatDetector::essence(""), "");
    }

    #[test]
    fn test_extension_for_mime() {
        assert_eq!(FormatDetector::extension_for_mime("audio/mpeg"), Some("mp3"));
        assert_eq!(FormatDetector::extension_for_mime("audio/x-wav"), Some("wav"));
        assert_eq!(FormatDetector::extension_for_mime("audio/ogg; codecs=vorbis"), Some("ogg"));
        assert_eq!(FormatDetector::extension_for_mime("text/plain"), None);
    }

    #[test]
    fn test_sniff_signatures() {
        assert_eq!(
            FormatDetector::sniff_mime(b"RIFF\x24\x00\x00\x00WAVEfmt "),
            Some("audio/wav")
        );
        assert_eq!(FormatDetector::sniff_mime(b"ID3\x04\x00"), Some("audio/mpeg"));
        assert_eq!(FormatDetector::sniff_mime(&[0xFF, 0xFB, 0x90, 0x00]), Some("audio/mpeg"));
        assert_eq!(FormatDetector::sniff_mime(&[0xFF, 0xF1, 0x50, 0x80]), Some("audio/aac"));
        assert_eq!(FormatDetector::sniff_mime(b"OggS\x00\x02"), Some("audio/ogg"));
        assert_eq!(FormatDetector::sniff_mime(b"fLaC\x00\x00"), Some("audio/flac"));
        assert_eq!(FormatDetector::sniff_mime(b"\x00\x00\x00\x20ftypM4A "), Some("audio/mp4"));
    }

    #[test]
    fn test_sniff_unknown() {
        assert_eq!(FormatDetector::sniff_mime(b"hello world"), None);
        assert_eq!(FormatDetector::sniff_mime(b"RIFF"), None);
        assert_eq!(FormatDetector::sniff_mime(&[]), None);
    }

    #[test]
    fn test_resolve_mime_prefers_hint() {
        assert_eq!(
            FormatDetector::resolve_mime(Some("audio/ogg"), b"RIFF\0\0\0\0WAVE", "audio/mpeg"),
            "audio/ogg"
        );
        assert_eq!(
            FormatDetector::resolve_mime(Some("  "), b"RIFF\0\0\0\0WAVE", "audio/mpeg"),
            "audio/wav"
        );
        assert_eq!(
            FormatDetector::resolve_mime(None, b"\x01\x02\x03", "audio/mpeg"),
            "audio/mpeg"
        );
    }
}
