//! Image identification handler

use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use munger_core::ImageInput;

use crate::AppState;

/// Name of the multipart field carrying the image
pub const IMAGE_FIELD: &str = "image";

/// Identification result, or `success: false` with an error message
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_fact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IdentifyResponse {
    fn failure(status: StatusCode, message: &str) -> Response {
        let body = Self {
            success: false,
            item_name: None,
            item_fact: None,
            image_url: None,
            error: Some(message.to_string()),
        };
        (status, Json(body)).into_response()
    }
}

/// POST /api/identify - Store an uploaded image and identify the item in it
pub async fn identify_image(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let advisor = match state.advisor() {
        Ok(a) => a,
        Err(e) => return e.into_response(),
    };

    let image = match multipart {
        Ok(m) => read_image_field(m).await,
        Err(e) => {
            warn!(error = %e, "Rejected identify request");
            None
        }
    };
    let Some(image) = image else {
        return IdentifyResponse::failure(StatusCode::BAD_REQUEST, "No image provided");
    };

    let file_name = match store_image(&state.uploads_dir, &image) {
        Ok(name) => name,
        Err(e) => {
            warn!(error = %e, "Failed to store uploaded image");
            return IdentifyResponse::failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to process image",
            );
        }
    };

    match advisor.quick_identify(&image).await {
        Ok(id) => {
            info!(item = %id.item_name, file = %file_name, "Identified uploaded image");
            Json(IdentifyResponse {
                success: true,
                item_name: Some(id.item_name),
                item_fact: Some(id.item_fact),
                image_url: Some(format!("/uploads/{}", file_name)),
                error: None,
            })
            .into_response()
        }
        Err(e) => {
            warn!(error = %e, "Image identification failed");
            IdentifyResponse::failure(StatusCode::INTERNAL_SERVER_ERROR, "Failed to process image")
        }
    }
}

/// First non-empty `image` field of the form
async fn read_image_field(mut multipart: Multipart) -> Option<ImageInput> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "Malformed multipart body");
                return None;
            }
        };
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let mime_type = field
            .content_type()
            .filter(|ct| ct.starts_with("image/"))
            .unwrap_or("image/jpeg")
            .to_string();
        match field.bytes().await {
            Ok(bytes) if !bytes.is_empty() => {
                return Some(ImageInput::new(bytes.to_vec(), mime_type));
            }
            Ok(_) => return None,
            Err(e) => {
                warn!(error = %e, "Failed to read image field");
                return None;
            }
        }
    }
}

/// Write the image under its content hash; returns the file name
fn store_image(dir: &Path, image: &ImageInput) -> std::io::Result<String> {
    std::fs::create_dir_all(dir)?;

    let hash = hex::encode(Sha256::digest(&image.bytes));
    let file_name = format!("{}.{}", hash, extension_for(&image.mime_type));
    let path = dir.join(&file_name);

    // Same content, same name
    if !path.exists() {
        std::fs::write(&path, &image.bytes)?;
    }
    Ok(file_name)
}

fn extension_for(mime_type: &str) -> &'static str {
    match mime_type {
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/heic" => "heic",
        _ => "jpg",
    }
}
