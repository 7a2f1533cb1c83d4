use std::{collections::HashMap, path::Path};

use axum::{body::Bytes, extract::Multipart};
use uuid::Uuid;

use crate::{AppError, AppResult};

pub const DEFAULT_PHOTO: &str = "photos/default.png";
pub const PHOTOS: &str = "photos";
pub const ATTACHMENTS: &str = "attachments";

const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

#[derive(Debug)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Bytes,
}

impl Upload {
    fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(str::to_ascii_lowercase)
    }
}

/// Text fields and file parts of a `multipart/form-data` body.
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub fields: HashMap<String, String>,
    pub files: HashMap<String, Upload>,
}

impl MultipartForm {
    pub async fn read(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };

            match field.file_name().map(str::to_owned) {
                Some(file_name) => {
                    let bytes = field.bytes().await?;
                    // browsers send an empty part when no file was picked
                    if file_name.is_empty() || bytes.is_empty() {
                        continue;
                    }
                    form.files.insert(name, Upload { file_name, bytes });
                }
                None => {
                    form.fields.insert(name, field.text().await?);
                }
            }
        }
        Ok(form)
    }

    pub fn text(&self, name: &str) -> String {
        self.fields.get(name).cloned().unwrap_or_default()
    }

    pub fn take_file(&mut self, name: &str) -> Option<Upload> {
        self.files.remove(name)
    }
}

/// Writes an upload under `media_root/folder/` and returns its media-relative path.
pub async fn store_upload(media_root: &Path, folder: &str, upload: &Upload) -> AppResult<String> {
    let file_name = match upload.extension() {
        Some(ext) => format!("{}.{ext}", Uuid::now_v7().simple()),
        None => Uuid::now_v7().simple().to_string(),
    };

    let dir = media_root.join(folder);
    tokio::fs::create_dir_all(&dir).await?;
    tokio::fs::write(dir.join(&file_name), &upload.bytes).await?;

    Ok(format!("{folder}/{file_name}"))
}

pub async fn store_photo(media_root: &Path, upload: &Upload) -> AppResult<String> {
    match upload.extension() {
        Some(ext) if IMAGE_EXTENSIONS.contains(&ext.as_str()) => store_upload(media_root, PHOTOS, upload).await,
        _ => Err(AppError::validation("photo must be a png, jpg, gif or webp image")),
    }
}

/// Removes a stored upload whose owning row was never written.
pub async fn discard(media_root: &Path, path: &str) {
    if let Err(err) = tokio::fs::remove_file(media_root.join(path)).await {
        tracing::warn!(path, "could not remove orphaned upload: {err}");
    }
}

pub fn url(path: &str) -> String {
    format!("/media/{path}")
}
