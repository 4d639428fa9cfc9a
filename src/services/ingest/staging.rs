use super::IngestError;
use std::path::Path;
use tempfile::TempPath;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

/// An upload as it arrives: declared content type plus the raw body.
pub struct UploadedAsset<R> {
    pub content_type: Option<String>,
    pub reader: R,
}

impl<R> UploadedAsset<R> {
    pub fn new(content_type: Option<String>, reader: R) -> Self {
        Self {
            content_type,
            reader,
        }
    }
}

/// Upload body copied to a request-scoped temporary file.
///
/// The file is removed when this value is dropped.
pub struct StagedUpload {
    path: TempPath,
    size: u64,
}

impl StagedUpload {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

/// Check the declared content type against the single accepted media type.
///
/// Parameters such as `; codecs=...` are ignored.
pub fn validate_media_type(
    content_type: Option<&str>,
    allowed: &str,
) -> Result<mime::Mime, IngestError> {
    let declared = content_type
        .ok_or_else(|| IngestError::UnsupportedMediaType("missing content type".to_string()))?;

    let parsed: mime::Mime = declared
        .parse()
        .map_err(|_| IngestError::UnsupportedMediaType(format!("unparsable: {}", declared)))?;

    if !parsed.essence_str().eq_ignore_ascii_case(allowed) {
        return Err(IngestError::UnsupportedMediaType(format!(
            "expected {}, got {}",
            allowed,
            parsed.essence_str()
        )));
    }

    Ok(parsed)
}

/// Copy `reader` into a uniquely named file under `dir`.
///
/// Reading stops one byte past `max_size`; an oversized body fails with
/// `PayloadTooLarge` and its partial file is removed.
pub async fn stage_upload<R>(
    reader: R,
    dir: &Path,
    max_size: usize,
) -> Result<StagedUpload, IngestError>
where
    R: AsyncRead + Unpin,
{
    let named = tempfile::Builder::new()
        .prefix("ingest-")
        .suffix(".mp4")
        .tempfile_in(dir)?;
    let (file, path) = named.into_parts();
    let mut file = tokio::fs::File::from_std(file);

    let mut limited = reader.take((max_size as u64).saturating_add(1));
    let written = tokio::io::copy(&mut limited, &mut file).await?;

    if written > max_size as u64 {
        return Err(IngestError::PayloadTooLarge { limit: max_size });
    }

    file.flush().await?;

    Ok(StagedUpload {
        path,
        size: written,
    })
}
