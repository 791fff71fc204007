//! Upload helpers for report images and shared resource files.
//!
//! The blob store enforces no limits, so size and type are checked here before
//! anything is written. Validation failures are returned to the caller rather
//! than swallowed: uploads are user actions and need a visible error.

use chrono::Utc;
use log::{info, warn};
use serde_json::Value;

use crate::db::repository::{
    BlobLocator, BlobStore, Collection, ErrorContext, FullStore, StoreError, StoreResult,
};
use crate::models::{Resource, ResourceDraft, StoreTimestamp};

/// Ceiling for report images.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
/// Ceiling for resource files.
pub const MAX_RESOURCE_BYTES: usize = 50 * 1024 * 1024;

/// A file handed in by the uploader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub locator: BlobLocator,
    pub url: String,
    pub file_name: String,
    pub size: usize,
    pub content_type: String,
}

/// Replace anything outside `[A-Za-z0-9._-]` with `_`.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn invalid(operation: &str, message: impl Into<String>) -> StoreError {
    StoreError::validation_with_context(message, ErrorContext::new(operation))
}

fn validate_file(operation: &str, file: &UploadFile, max_bytes: usize) -> StoreResult<()> {
    if file.file_name.trim().is_empty() {
        return Err(invalid(operation, "A file name is required"));
    }
    if file.bytes.is_empty() {
        return Err(invalid(operation, "The file is empty"));
    }
    if file.size() > max_bytes {
        return Err(invalid(
            operation,
            format!(
                "File is {} bytes, the limit is {} MB",
                file.size(),
                max_bytes / (1024 * 1024)
            ),
        ));
    }
    Ok(())
}

async fn store_file<B: BlobStore + ?Sized>(
    blobs: &B,
    path: String,
    file: UploadFile,
) -> StoreResult<UploadedFile> {
    let UploadFile {
        file_name,
        content_type,
        bytes,
    } = file;
    let size = bytes.len();
    let locator = blobs.put(&path, bytes, &content_type).await?;
    let url = blobs.public_url(&locator).await?;
    info!("Uploads: stored {} ({} bytes)", locator, size);
    Ok(UploadedFile {
        locator,
        url,
        file_name,
        size,
        content_type,
    })
}

/// Upload a photo attached to a report, stored under
/// `reports/{owner}/{millis}_{name}`.
///
/// # Errors
/// Validation errors for a missing owner or name, an empty or oversized file
/// (over [`MAX_IMAGE_BYTES`]), or a content type outside `image/*`.
pub async fn upload_report_image<B: BlobStore + ?Sized>(
    blobs: &B,
    owner_id: &str,
    file: UploadFile,
) -> StoreResult<UploadedFile> {
    const OPERATION: &str = "upload_report_image";
    if owner_id.trim().is_empty() {
        return Err(invalid(OPERATION, "An owner id is required"));
    }
    validate_file(OPERATION, &file, MAX_IMAGE_BYTES)?;
    if !file.content_type.to_ascii_lowercase().starts_with("image/") {
        return Err(invalid(
            OPERATION,
            format!("Only images can be attached, got '{}'", file.content_type),
        ));
    }

    let path = format!(
        "reports/{}/{}_{}",
        sanitize_file_name(owner_id),
        Utc::now().timestamp_millis(),
        sanitize_file_name(&file.file_name)
    );
    store_file(blobs, path, file).await
}

/// Upload a resource file of any type, stored under `resources/{millis}_{name}`.
///
/// # Errors
/// Validation errors for a missing name or an empty or oversized file (over
/// [`MAX_RESOURCE_BYTES`]).
pub async fn upload_resource_file<B: BlobStore + ?Sized>(
    blobs: &B,
    file: UploadFile,
) -> StoreResult<UploadedFile> {
    validate_file("upload_resource_file", &file, MAX_RESOURCE_BYTES)?;
    let path = format!(
        "resources/{}_{}",
        Utc::now().timestamp_millis(),
        sanitize_file_name(&file.file_name)
    );
    store_file(blobs, path, file).await
}

pub async fn delete_uploaded_file<B: BlobStore + ?Sized>(
    blobs: &B,
    locator: &BlobLocator,
) -> StoreResult<()> {
    blobs.delete(locator).await?;
    info!("Uploads: deleted {}", locator);
    Ok(())
}

/// Upload a resource file and record it in the resources collection.
///
/// If the document write fails the uploaded blob is removed again.
pub async fn publish_resource<S: FullStore + ?Sized>(
    store: &S,
    draft: ResourceDraft,
    file: UploadFile,
) -> StoreResult<Resource> {
    const OPERATION: &str = "publish_resource";
    if draft.title.trim().is_empty() {
        return Err(invalid(OPERATION, "A title is required"));
    }
    if draft.uploaded_by.trim().is_empty() {
        return Err(invalid(OPERATION, "An uploader id is required"));
    }

    let uploaded = upload_resource_file(store, file).await?;
    let mut resource = Resource {
        id: String::new(),
        title: Some(draft.title),
        description: draft.description,
        category: draft.category,
        file_url: Some(uploaded.url.clone()),
        file_path: Some(uploaded.locator.path.clone()),
        file_name: Some(uploaded.file_name.clone()),
        file_size: Some(uploaded.size as u64),
        content_type: Some(uploaded.content_type.clone()),
        uploaded_by: Some(draft.uploaded_by),
        created_at: Some(StoreTimestamp::from_datetime(Utc::now())),
    };

    let mut fields = match serde_json::to_value(&resource)? {
        Value::Object(fields) => fields,
        _ => return Err(StoreError::internal("Resource did not serialize to an object")),
    };
    fields.remove("id");

    match store.add_document(Collection::Resources, fields).await {
        Ok(id) => {
            resource.id = id;
            info!("Uploads: published resource {}", resource.id);
            Ok(resource)
        }
        Err(e) => {
            if let Err(cleanup) = store.delete(&uploaded.locator).await {
                warn!(
                    "Uploads: could not remove {} after a failed publish: {}",
                    uploaded.locator, cleanup
                );
            }
            Err(e.with_operation(OPERATION))
        }
    }
}
