//! Slice endpoint: PNG of the composited slice at an index

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::error::ApiError;
use crate::{render, AppState};

/// GET /api/slice/:index
///
/// 404 when no comparison is loaded, 400 when the index is past the
/// volume depth.
pub async fn get_slice(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<Response, ApiError> {
    let current = state.current.read().await.clone();
    let loaded = match current {
        Some(loaded) => loaded,
        None => {
            return Err(ApiError::NotFound(
                "No comparison loaded; POST /api/compare first".to_string(),
            ))
        }
    };

    let depth = loaded.base.depth();
    if index >= depth {
        return Err(ApiError::BadRequest(format!(
            "Slice {} out of range (volume has {} slices)",
            index, depth
        )));
    }

    // Compositing is CPU work; the volumes stay shared behind the Arc
    let png = tokio::task::spawn_blocking(move || -> ctseg_common::Result<Vec<u8>> {
        let image = render::compose_slice(
            loaded.base.slice(index),
            loaded.mask_1.slice(index),
            loaded.mask_2.slice(index),
        )?;
        render::encode_png(image)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Task join error: {}", e)))??;

    Ok((
        StatusCode::OK,
        [("content-type", "image/png"), ("cache-control", "no-store")],
        png,
    )
        .into_response())
}
