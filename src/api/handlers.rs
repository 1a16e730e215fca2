use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use crate::{
    error::Result,
    models::{
        export::ExportRequest,
        scores::{NeighborResult, Scheme, SetLabel, IMAGE_COLLECTION_DIR},
    },
    utils::is_safe_relative,
    AppState,
};

use super::responses::ApiResponse;

/// File name offered for exported comparison images.
pub const EXPORT_FILENAME: &str = "logos_compare.png";

/// `set` and `method` query parameters shared by the score endpoints.
#[derive(Debug, Deserialize)]
pub struct SelectorQuery {
    #[serde(default = "default_set")]
    set: String,
    #[serde(default)]
    method: Scheme,
}

fn default_set() -> String {
    SetLabel::default().as_str().to_string()
}

impl SelectorQuery {
    fn into_selector(self) -> Result<(Scheme, SetLabel)> {
        Ok((self.method, SetLabel::new(self.set)?))
    }
}

/// `GET /api/logos`: every canonical identifier of the selected table, sorted.
pub async fn list_logos(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SelectorQuery>,
) -> Result<Json<Vec<String>>> {
    let (scheme, set) = query.into_selector()?;
    let store = state.store.clone();
    let logos = tokio::task::spawn_blocking(move || store.logos(scheme, &set)).await??;
    Ok(Json(logos))
}

/// `GET /api/similar/*logo_path`: neighbors of `logo_path`, best first.
pub async fn similar_logos(
    State(state): State<Arc<AppState>>,
    Path(logo_path): Path<String>,
    Query(query): Query<SelectorQuery>,
) -> Result<Json<Vec<NeighborResult>>> {
    let (scheme, set) = query.into_selector()?;
    log::debug!("Requested similar logos for {} (method={})", logo_path, scheme);
    let store = state.store.clone();
    let neighbors =
        tokio::task::spawn_blocking(move || store.similar(scheme, &set, &logo_path)).await??;
    Ok(Json(neighbors))
}

/// Location of a `/logos/` request below `image_root`, or `None` if the path is unsafe.
pub(crate) fn logo_file(image_root: &std::path::Path, path: &str) -> Option<PathBuf> {
    if !is_safe_relative(path) {
        return None;
    }
    let collection_prefix = format!("{}/", IMAGE_COLLECTION_DIR);
    match path.strip_prefix(&collection_prefix) {
        Some(rest) => Some(image_root.join(IMAGE_COLLECTION_DIR).join(rest)),
        None => Some(image_root.join("logos").join(path)),
    }
}

/// `GET /logos/*path`: raw image bytes.
pub async fn serve_logo(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
) -> Result<Response> {
    let file = logo_file(&state.config.image_root, &path);
    let exists = match &file {
        Some(file) => tokio::fs::metadata(file).await.map(|m| m.is_file()).unwrap_or(false),
        None => false,
    };
    let Some(file) = file.filter(|_| exists) else {
        log::warn!("File not found: {}", path);
        return Ok((StatusCode::NOT_FOUND, format!("File not found: {}", path)).into_response());
    };

    let data = tokio::fs::read(&file).await?;
    let mime = mime_guess::from_path(&file).first_or_octet_stream();
    Ok(([(CONTENT_TYPE, mime.to_string())], Bytes::from(data)).into_response())
}

/// `POST /api/export_png`: comparison image as a PNG attachment.
pub async fn export_png(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ExportRequest>,
) -> Result<Response> {
    let entries = request.into_entries(state.config.render.max_logos)?;
    log::info!("Exporting comparison of {} logos", entries.len());
    let png = tokio::task::spawn_blocking(move || state.renderer.render_png(&entries)).await??;

    Ok((
        [
            (CONTENT_TYPE, "image/png".to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", EXPORT_FILENAME),
            ),
        ],
        Bytes::from(png),
    )
        .into_response())
}

/// Payload of the health endpoint.
#[derive(Debug, Serialize)]
pub struct HealthInfo {
    /// Always `"ok"` when the server answers.
    pub status: &'static str,
    /// Crate version the server was built from.
    pub version: &'static str,
}

/// `GET /api/health`
pub async fn health_check() -> ApiResponse<HealthInfo> {
    ApiResponse::success(HealthInfo {
        status: "ok",
        version: crate::built_info::PKG_VERSION,
    })
}
