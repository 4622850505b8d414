//! Equipment photo storage on the local filesystem

use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use uuid::Uuid;

use crate::{
    config::StorageConfig,
    error::{AppError, AppResult},
    models::equipment::PhotoUpload,
};

/// Sub-directory of the media root holding equipment photos
const PHOTO_DIR: &str = "equipamentos";

static RE_UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("valid regex"));

#[derive(Clone)]
pub struct MediaStorage {
    root: PathBuf,
    max_upload_bytes: usize,
}

impl MediaStorage {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            root: PathBuf::from(&config.media_root),
            max_upload_bytes: config.max_upload_bytes,
        }
    }

    /// Write an uploaded photo and return its path relative to the media root
    pub async fn save_photo(&self, upload: &PhotoUpload) -> AppResult<String> {
        if upload.bytes.is_empty() {
            return Err(AppError::Validation("foto: uploaded file is empty".to_string()));
        }
        if upload.bytes.len() > self.max_upload_bytes {
            return Err(AppError::Validation(format!(
                "foto: file exceeds {} bytes",
                self.max_upload_bytes
            )));
        }

        let relative = format!(
            "{}/{}_{}",
            PHOTO_DIR,
            Uuid::new_v4().simple(),
            sanitize_file_name(&upload.file_name)
        );
        let target = self.root.join(&relative);
        if let Some(dir) = target.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| AppError::Internal(format!("Failed to create media directory: {}", e)))?;
        }
        tokio::fs::write(&target, &upload.bytes)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to store photo: {}", e)))?;

        tracing::debug!("Stored photo {} ({} bytes)", relative, upload.bytes.len());
        Ok(relative)
    }

    /// Remove a stored photo; failures are logged and otherwise ignored
    pub async fn remove(&self, relative: &str) {
        let Some(path) = self.resolve(relative) else {
            tracing::warn!("Refusing to remove photo outside media root: {}", relative);
            return;
        };
        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::warn!("Failed to remove photo {}: {}", path.display(), e);
        }
    }

    /// Map a request path to a file under the media root
    ///
    /// Returns `None` for absolute paths and anything containing `..`.
    pub fn resolve(&self, relative: &str) -> Option<PathBuf> {
        let relative = Path::new(relative.trim_start_matches('/'));
        let mut clean = PathBuf::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => clean.push(part),
                Component::CurDir => {}
                _ => return None,
            }
        }
        if clean.as_os_str().is_empty() {
            return None;
        }
        Some(self.root.join(clean))
    }

    /// Read a stored file, `None` when it does not exist
    pub async fn read(&self, relative: &str) -> AppResult<Option<Vec<u8>>> {
        let Some(path) = self.resolve(relative) else {
            return Ok(None);
        };
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            _ => return Ok(None),
        }
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to read media file: {}", e)))?;
        Ok(Some(bytes))
    }
}

/// Keep only the final component of a client supplied name, with safe characters
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned = RE_UNSAFE_CHARS.replace_all(base, "_");
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "photo".to_string()
    } else {
        cleaned.chars().take(100).collect()
    }
}

/// Content type from the file extension
pub fn content_type(path: &str) -> &'static str {
    let extension = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(root: &Path) -> MediaStorage {
        MediaStorage {
            root: root.to_path_buf(),
            max_upload_bytes: 16,
        }
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("betoneira.jpg"), "betoneira.jpg");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\fotos\\serra circular.png"), "serra_circular.png");
        assert_eq!(sanitize_file_name("furadeira (1).jpeg"), "furadeira_1_.jpeg");
        assert_eq!(sanitize_file_name(".."), "photo");
        assert_eq!(sanitize_file_name(""), "photo");
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let media = storage(Path::new("/srv/media"));
        assert_eq!(
            media.resolve("equipamentos/a.jpg"),
            Some(PathBuf::from("/srv/media/equipamentos/a.jpg"))
        );
        assert_eq!(
            media.resolve("/equipamentos/./a.jpg"),
            Some(PathBuf::from("/srv/media/equipamentos/a.jpg"))
        );
        assert!(media.resolve("../secret").is_none());
        assert!(media.resolve("equipamentos/../../secret").is_none());
        assert!(media.resolve("").is_none());
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type("equipamentos/x.JPG"), "image/jpeg");
        assert_eq!(content_type("equipamentos/x.png"), "image/png");
        assert_eq!(content_type("equipamentos/x"), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_save_read_and_remove() {
        let root = std::env::temp_dir().join(format!("rental-media-{}", Uuid::new_v4().simple()));
        let media = storage(&root);
        let upload = PhotoUpload {
            file_name: "serra.png".into(),
            bytes: b"png-bytes".to_vec(),
        };

        let relative = media.save_photo(&upload).await.unwrap();
        assert!(relative.starts_with("equipamentos/"));
        assert!(relative.ends_with("_serra.png"));
        assert_eq!(media.read(&relative).await.unwrap(), Some(b"png-bytes".to_vec()));

        media.remove(&relative).await;
        assert_eq!(media.read(&relative).await.unwrap(), None);

        // Removing twice only logs
        media.remove(&relative).await;
        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_rejects_oversized_and_empty_uploads() {
        let media = storage(Path::new("/nonexistent"));
        let big = PhotoUpload {
            file_name: "a.jpg".into(),
            bytes: vec![0; 17],
        };
        assert!(matches!(media.save_photo(&big).await, Err(AppError::Validation(_))));
        let empty = PhotoUpload {
            file_name: "a.jpg".into(),
            bytes: Vec::new(),
        };
        assert!(matches!(media.save_photo(&empty).await, Err(AppError::Validation(_))));
    }
}
