use crate::application::editor_service::{EditorService, EditorSnapshot, ImageInfo};
use crate::application::error::ApplicationError;
use crate::domain::font_family::FontFamily;
use crate::domain::overlay_style::{OverlayPatch, OverlaySlot, OverlayStyle};
use super::image_decoder::{decode_data_url, RawUpload};
use super::png_exporter::PNG_CONTENT_TYPE;
use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Json, Multipart, Path, State},
    http::{header, header::HeaderName, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

#[derive(Clone)]
pub struct AppState {
    pub editor_service: Arc<EditorService>,
}

#[derive(Deserialize, Debug)]
pub struct DataUrlUpload {
    pub data_url: String,
}

#[derive(Serialize, Debug, PartialEq)]
pub struct FontOption {
    pub value: &'static str,
    pub label: &'static str,
}

pub fn build_router(
    state: AppState,
    static_dir: &std::path::Path,
    max_upload_bytes: usize,
) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(vec![HeaderName::from_static("content-type")]);

    Router::new()
        .route("/api/state", get(state_handler))
        .route("/api/fonts", get(fonts_handler))
        .route("/api/overlays/:slot", put(update_overlay_handler))
        .route("/api/upload", post(upload_image_handler))
        .route("/api/upload/data-url", post(upload_data_url_handler))
        .route("/api/preview", get(preview_image_handler))
        .route("/api/export", get(export_image_handler))
        .fallback_service(ServeDir::new(static_dir))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        .with_state(state)
}

pub async fn state_handler(State(state): State<AppState>) -> Json<EditorSnapshot> {
    Json(state.editor_service.snapshot().await)
}

pub async fn fonts_handler() -> Json<Vec<FontOption>> {
    let options = FontFamily::ALL
        .into_iter()
        .map(|family| FontOption { value: family.css_stack(), label: family.label() })
        .collect();
    Json(options)
}

pub async fn update_overlay_handler(
    State(state): State<AppState>,
    Path(slot): Path<OverlaySlot>,
    Json(patch): Json<OverlayPatch>,
) -> Result<Json<OverlayStyle>, ApplicationError> {
    let updated = state.editor_service.update_overlay(slot, patch).await?;
    Ok(Json(updated))
}

/// Takes the first file part of the form. A form without a file is a no-op,
/// the same as closing a file picker without choosing anything.
pub async fn upload_image_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, ApplicationError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApplicationError::UploadFailed(format!("Multipart error: {}", e)))?
    {
        if field.file_name().is_none() && field.name() != Some("file") {
            continue;
        }
        let mime_type = field.content_type().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| {
                ApplicationError::UploadFailed(format!("Failed to read multipart field: {}", e))
            })?;
        if data.is_empty() {
            continue;
        }

        let info = state
            .editor_service
            .load_image(RawUpload { mime_type, bytes: data.to_vec() })
            .await?;
        return Ok(Json(info).into_response());
    }

    tracing::debug!("Upload request carried no file; nothing changed");
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub async fn upload_data_url_handler(
    State(state): State<AppState>,
    Json(params): Json<DataUrlUpload>,
) -> Result<Json<ImageInfo>, ApplicationError> {
    let upload = decode_data_url(&params.data_url)?;
    let info = state.editor_service.load_image(upload).await?;
    Ok(Json(info))
}

pub async fn preview_image_handler(
    State(state): State<AppState>,
) -> Result<Response, ApplicationError> {
    let image_data = state.editor_service.preview_png().await?;

    Response::builder()
        .header(header::CONTENT_TYPE, PNG_CONTENT_TYPE)
        .header(header::CACHE_CONTROL, "no-store")
        .body(Body::from(image_data))
        .map(IntoResponse::into_response)
        .map_err(|e| ApplicationError::Internal(format!("Failed to build preview response: {}", e)))
}

pub async fn export_image_handler(
    State(state): State<AppState>,
) -> Result<Response, ApplicationError> {
    let exported = state.editor_service.export().await?;

    Response::builder()
        .header(header::CONTENT_TYPE, PNG_CONTENT_TYPE)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", exported.file_name),
        )
        .body(Body::from(exported.bytes))
        .map(IntoResponse::into_response)
        .map_err(|e| {
            ApplicationError::Internal(format!("Failed to build download response: {}", e))
        })
}
