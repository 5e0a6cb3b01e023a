//! Avatar file storage on the local filesystem.

use std::path::{Path, PathBuf};

use chrono::Utc;
use uuid::Uuid;

use crate::errors::AppError;

/// Extensions accepted for avatar uploads (lowercase, with the dot).
pub const ALLOWED_EXTENSIONS: [&str; 4] = [".png", ".jpg", ".jpeg", ".webp"];

/// URL prefix under which the upload directory is served.
pub const PUBLIC_PREFIX: &str = "/uploads";

/// Lowercased extension of `file_name` if it is an accepted image type.
pub fn allowed_extension(file_name: &str) -> Option<String> {
    let ext = Path::new(file_name).extension()?.to_str()?;
    let ext = format!(".{}", ext.to_ascii_lowercase());
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Collision-resistant name: `<unix millis>-<random><ext>`.
pub fn stored_file_name(ext: &str) -> String {
    format!(
        "{}-{}{}",
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple(),
        ext
    )
}

pub fn public_url(file_name: &str) -> String {
    format!("{PUBLIC_PREFIX}/{file_name}")
}

/// Write an uploaded avatar into `upload_dir`, returning its public URL.
pub async fn save(upload_dir: &Path, original_name: &str, bytes: &[u8]) -> Result<String, AppError> {
    let ext = allowed_extension(original_name)
        .ok_or_else(|| AppError::Validation("Invalid file type".to_string()))?;

    tokio::fs::create_dir_all(upload_dir)
        .await
        .map_err(|e| AppError::Internal(format!("Cannot create upload dir: {e}")))?;

    let file_name = stored_file_name(&ext);
    let path: PathBuf = upload_dir.join(&file_name);
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| AppError::Internal(format!("Cannot write avatar: {e}")))?;

    tracing::debug!(path = %path.display(), size = bytes.len(), "Stored avatar");
    Ok(public_url(&file_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_image_extensions_case_insensitively() {
        assert_eq!(allowed_extension("me.png").as_deref(), Some(".png"));
        assert_eq!(allowed_extension("ME.JPEG").as_deref(), Some(".jpeg"));
        assert_eq!(allowed_extension("a.b.WebP").as_deref(), Some(".webp"));
    }

    #[test]
    fn rejects_other_files() {
        assert_eq!(allowed_extension("script.svg"), None);
        assert_eq!(allowed_extension("noext"), None);
        assert_eq!(allowed_extension(".png"), None);
        assert_eq!(allowed_extension(""), None);
    }

    #[test]
    fn stored_names_are_unique_and_keep_extension() {
        let a = stored_file_name(".jpg");
        let b = stored_file_name(".jpg");
        assert_ne!(a, b);
        assert!(a.ends_with(".jpg"));
        assert!(a.split_once('-').unwrap().0.parse::<i64>().is_ok());
    }

    #[tokio::test]
    async fn save_writes_file_under_upload_dir() {
        let dir = tempfile::tempdir().unwrap();
        let upload_dir = dir.path().join("nested");
        let url = save(&upload_dir, "avatar.PNG", b"\x89PNG").await.unwrap();

        assert!(url.starts_with("/uploads/"));
        assert!(url.ends_with(".png"));
        let stored = upload_dir.join(url.trim_start_matches("/uploads/"));
        assert_eq!(std::fs::read(stored).unwrap(), b"\x89PNG");
    }

    #[tokio::test]
    async fn save_rejects_bad_type_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let err = save(dir.path(), "payload.exe", b"MZ").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
