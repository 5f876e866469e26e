//! Turns a selected image file into the `data:` URI stored on incidents.
//!
//! The encoded URI is the only representation of the image that survives; the
//! file contents are dropped once encoded. Reads are single-shot with no
//! cancellation, and nothing orders two overlapping reads against each other.

use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::IngestError;

const FALLBACK_MIME: &str = "application/octet-stream";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageDataUri(String);

impl ImageDataUri {
    /// Encode raw file contents. `declared_mime` is the type reported by the
    /// picker; when absent or blank the type is sniffed from the bytes.
    pub fn from_bytes(bytes: &[u8], declared_mime: Option<&str>) -> Self {
        let mime = declared_mime
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| sniff_mime(bytes));
        let payload = general_purpose::STANDARD.encode(bytes);
        Self(format!("data:{};base64,{}", mime, payload))
    }

    pub fn mime(&self) -> &str {
        self.0
            .strip_prefix("data:")
            .and_then(|rest| rest.split(';').next())
            .unwrap_or(FALLBACK_MIME)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ImageDataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn sniff_mime(bytes: &[u8]) -> &'static str {
    image::guess_format(bytes)
        .map(|format| format.to_mime_type())
        .unwrap_or(FALLBACK_MIME)
}

/// Read a whole file and encode it.
pub async fn ingest(path: impl AsRef<Path>) -> Result<ImageDataUri, IngestError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await.map_err(|source| IngestError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Read {} bytes from {:?}", bytes.len(), path);
    Ok(ImageDataUri::from_bytes(&bytes, None))
}

/// Ingest the first selected file. `None` when nothing was selected.
pub async fn ingest_selection(files: &[PathBuf]) -> Option<Result<ImageDataUri, IngestError>> {
    let first = files.first()?;
    Some(ingest(first).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "traffic-core-{}-{}-{}",
            std::process::id(),
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default(),
            name
        ))
    }

    #[test]
    fn test_sniffs_png() {
        let uri = ImageDataUri::from_bytes(PNG_MAGIC, None);
        assert!(uri.as_str().starts_with("data:image/png;base64,"));
        assert_eq!(uri.mime(), "image/png");
    }

    #[test]
    fn test_declared_mime_wins() {
        let uri = ImageDataUri::from_bytes(b"abc", Some("image/webp"));
        assert_eq!(uri.as_str(), "data:image/webp;base64,YWJj");
    }

    #[test]
    fn test_unknown_bytes_fall_back_to_octet_stream() {
        let uri = ImageDataUri::from_bytes(b"not an image", Some("  "));
        assert_eq!(uri.mime(), "application/octet-stream");
    }

    #[test]
    fn test_payload_round_trips_through_base64() {
        let uri = ImageDataUri::from_bytes(PNG_MAGIC, None);
        let payload = uri.as_str().split_once(',').map(|(_, p)| p).unwrap();
        let decoded = general_purpose::STANDARD.decode(payload).unwrap();
        assert_eq!(decoded, PNG_MAGIC);
    }

    #[tokio::test]
    async fn test_ingest_reads_whole_file() -> anyhow::Result<()> {
        let path = temp_path("upload.png");
        tokio::fs::write(&path, PNG_MAGIC).await?;

        let uri = ingest(&path).await?;
        assert_eq!(uri, ImageDataUri::from_bytes(PNG_MAGIC, None));

        tokio::fs::remove_file(&path).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_ingest_missing_file_is_an_error() {
        let path = temp_path("missing.png");
        let err = ingest(&path).await.unwrap_err();
        assert!(matches!(err, IngestError::Read { .. }));
    }

    #[tokio::test]
    async fn test_empty_selection_is_a_noop() {
        assert!(ingest_selection(&[]).await.is_none());
    }
}
