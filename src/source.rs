//! Diagram source normalization and payload encoding.
//!
//! Text arrives from the editor or from an uploaded file. It is trimmed into a
//! [`DiagramSource`] and then encoded into an [`EncodedPayload`], the URL-safe
//! base64 form the rendering service expects as a path segment.

use std::fmt;
use std::path::Path;

use base64::Engine;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, URL_SAFE};
use base64::engine::DecodePaddingMode;
use thiserror::Error;
use tracing::warn;

/// File extensions the editor's file picker offers.
pub const UPLOAD_EXTENSIONS: &[&str] = &["mmd", "txt", "mermaid"];

const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Trimmed diagram text, ready to be sent to the rendering service.
///
/// The text is never interpreted locally; syntax errors are reported by the
/// service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DiagramSource(String);

impl DiagramSource {
    /// The trimmed text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Encode the UTF-8 bytes as padded URL-safe base64.
    pub fn encode(&self) -> EncodedPayload {
        EncodedPayload(URL_SAFE.encode(self.0.as_bytes()))
    }
}

impl fmt::Display for DiagramSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strip leading and trailing whitespace from raw editor text.
///
/// Empty and whitespace-only input is valid and yields an empty source.
pub fn normalize(raw: &str) -> DiagramSource {
    DiagramSource(raw.trim().to_string())
}

/// URL-safe base64 encoding of a [`DiagramSource`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EncodedPayload(String);

impl EncodedPayload {
    /// Wrap an already encoded payload, e.g. one taken from a request path.
    pub fn from_encoded(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode back to the original bytes. Padding is optional.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is not URL-safe base64.
    pub fn decode(&self) -> Result<Vec<u8>, PayloadError> {
        Ok(URL_SAFE_LENIENT.decode(self.0.as_bytes())?)
    }
}

impl fmt::Display for EncodedPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("invalid payload encoding: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Errors raised while turning an uploaded file into diagram text.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No file selected")]
    NoFileSelected,
    #[error("An error occurred during upload: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

/// Decode an uploaded file into a normalized [`DiagramSource`].
///
/// `file_name` is the name the client reported for the upload; an empty name
/// means no file was chosen.
///
/// # Errors
///
/// Returns [`UploadError::NoFileSelected`] for an empty file name and
/// [`UploadError::InvalidUtf8`] when the bytes are not UTF-8.
pub fn decode_upload(file_name: &str, bytes: Vec<u8>) -> Result<DiagramSource, UploadError> {
    if file_name.trim().is_empty() {
        return Err(UploadError::NoFileSelected);
    }
    if !has_upload_extension(Path::new(file_name)) {
        warn!(file_name, "uploaded file has an unexpected extension");
    }
    let text = String::from_utf8(bytes)?;
    Ok(normalize(&text))
}

fn has_upload_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            UPLOAD_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
}
