//! Upload handling shared by the extraction endpoints
//!
//! Reads the multipart `file` field, validates name, extension and size, and
//! manages short-lived temp files.

use std::path::{Path, PathBuf};

use actix_multipart::Multipart;
use actix_web::HttpResponse;
use futures::TryStreamExt;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::UploadSettings;

/// Multipart field carrying the image
const FILE_FIELD: &str = "file";

/// Multipart form accepted by the extraction endpoints
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    /// Image file (jpg, jpeg, png)
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

/// 400 response body for rejected uploads
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub detail: String,
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No file selected")]
    NoFile,

    #[error("File type not allowed. Supported: {0}")]
    TypeNotAllowed(String),

    #[error("File size too large. Maximum {0} allowed")]
    TooLarge(String),

    #[error("Invalid upload: {0}")]
    Multipart(String),

    #[error("Invalid image file")]
    InvalidImage,
}

impl UploadError {
    pub fn to_response(&self) -> HttpResponse {
        HttpResponse::BadRequest().json(ErrorResponse {
            detail: self.to_string(),
        })
    }
}

/// An uploaded file held in memory
#[derive(Debug)]
pub struct Upload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Whether the name has an extension from the allowed list (case-insensitive)
pub fn is_allowed_file(filename: &str, allowed: &[String]) -> bool {
    match filename.rsplit_once('.') {
        Some((_, ext)) => {
            let ext = ext.to_lowercase();
            allowed.iter().any(|a| *a == ext)
        }
        None => false,
    }
}

pub fn validate_file_size(size: u64, max: u64) -> bool {
    size <= max
}

/// `<uuid>.<ext>` with the original extension lowercased
pub fn generate_unique_filename(original: &str) -> String {
    let ext = original
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    format!("{}.{}", Uuid::new_v4(), ext)
}

/// Whether the file decodes as an image
///
/// The format is sniffed from the file contents, not the extension.
pub fn validate_image(path: &Path) -> bool {
    let decoded = image::io::Reader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(image::ImageError::IoError)
        .and_then(|reader| reader.decode());

    match decoded {
        Ok(_) => true,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Upload is not a decodable image");
            false
        }
    }
}

/// Read and validate the `file` field
///
/// Reading stops as soon as the configured size limit is exceeded.
pub async fn read_upload(mut payload: Multipart, settings: &UploadSettings) -> Result<Upload, UploadError> {
    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| UploadError::Multipart(e.to_string()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string)
            .filter(|name| !name.is_empty())
            .ok_or(UploadError::NoFile)?;

        if !is_allowed_file(&filename, &settings.allowed_extensions) {
            return Err(UploadError::TypeNotAllowed(settings.allowed_extensions.join(", ")));
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| UploadError::Multipart(e.to_string()))?
        {
            bytes.extend_from_slice(&chunk);
            if !validate_file_size(bytes.len() as u64, settings.max_file_size) {
                return Err(UploadError::TooLarge(settings.max_size_label()));
            }
        }

        return Ok(Upload { filename, bytes });
    }

    Err(UploadError::NoFile)
}

/// A file in the temp dir, deleted on drop
#[derive(Debug)]
pub struct TempUpload {
    path: PathBuf,
}

impl TempUpload {
    /// Write `bytes` under a fresh unique name
    pub async fn write(dir: &Path, original_name: &str, bytes: &[u8]) -> std::io::Result<Self> {
        let path = dir.join(generate_unique_filename(original_name));
        tokio::fs::write(&path, bytes).await?;
        Ok(TempUpload { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempUpload {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "Failed to remove temp file");
        }
    }
}
