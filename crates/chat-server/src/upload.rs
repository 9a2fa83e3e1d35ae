//! Image upload validation and storage.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use thiserror::Error;
use tracing::info;

/// File extensions accepted as images (compared case-insensitively).
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Prefix of every stored file name.
const FILE_PREFIX: &str = "chat-image";

/// Upload rejections.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("Only image files are allowed!")]
    NotAnImage(String),

    #[error("Image exceeds the {limit} byte upload limit")]
    TooLarge { limit: usize },
}

/// An image received from the client, not yet written anywhere.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Name the client gave the file.
    pub original_name: String,
    /// Lower-cased extension without the dot.
    pub extension: String,
    pub bytes: Vec<u8>,
}

/// An image written to the upload directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    /// Generated file name, also the last segment of its public URL.
    pub file_name: String,
    pub path: PathBuf,
}

/// Check a client file name against the allow-list and return its extension.
pub fn allowed_extension(file_name: &str) -> Result<String, UploadError> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| {
            ALLOWED_EXTENSIONS
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(ext))
        })
        .map(str::to_ascii_lowercase)
        .ok_or_else(|| UploadError::NotAnImage(file_name.to_string()))
}

/// `chat-image<unix millis>-<random below 1e9>.<ext>`.
pub fn unique_file_name(extension: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
    format!("{}{}-{}.{}", FILE_PREFIX, millis, suffix, extension)
}

impl ImageUpload {
    /// Start an upload after validating the client's file name.
    pub fn new(original_name: impl Into<String>) -> Result<Self, UploadError> {
        let original_name = original_name.into();
        let extension = allowed_extension(&original_name)?;
        Ok(Self {
            original_name,
            extension,
            bytes: Vec::new(),
        })
    }

    /// Append a chunk, refusing to grow past `limit` bytes.
    pub fn push_chunk(&mut self, chunk: &[u8], limit: usize) -> Result<(), UploadError> {
        if self.bytes.len() + chunk.len() > limit {
            return Err(UploadError::TooLarge { limit });
        }
        self.bytes.extend_from_slice(chunk);
        Ok(())
    }

    /// Write the original bytes under a fresh name in `dir`.
    pub async fn store(&self, dir: &Path) -> std::io::Result<StoredImage> {
        tokio::fs::create_dir_all(dir).await?;

        let file_name = unique_file_name(&self.extension);
        let path = dir.join(&file_name);
        tokio::fs::write(&path, &self.bytes).await?;

        info!(
            original_name = %self.original_name,
            stored_as = %file_name,
            size_bytes = self.bytes.len(),
            "Stored uploaded image"
        );

        Ok(StoredImage { file_name, path })
    }
}
