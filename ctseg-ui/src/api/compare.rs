//! Comparison execution: resolve files, run the c3d overlap, load the
//! volumes for slice browsing

use axum::extract::State;
use axum::Json;
use ctseg_common::{db, CtVolume};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::error::ApiError;
use crate::{AppState, LoadedComparison};

#[derive(Debug, Deserialize)]
pub struct CompareRequest {
    pub label: String,
    pub challenge_1: i64,
    pub challenge_2: i64,
}

#[derive(Debug, Serialize)]
pub struct CompareResponse {
    /// Parsed coefficient; null when c3d reported nan
    pub dice: Option<f64>,
    /// The full coefficient line for the UI label
    pub display: String,
    /// Slice count of the base volume (slider range 0..slices-1)
    pub slices: usize,
    /// The c3d command that was run
    pub command: String,
}

/// POST /api/compare
///
/// Runs the overlap for the two selected challenges, records it, and
/// keeps the three volumes in state for the slice endpoint.
pub async fn run_comparison(
    State(state): State<AppState>,
    Json(request): Json<CompareRequest>,
) -> Result<Json<CompareResponse>, ApiError> {
    let file_1 = resolve_challenge_path(&state, request.challenge_1).await?;
    let file_2 = resolve_challenge_path(&state, request.challenge_2).await?;

    let base = db::find_base_image(&state.db, &request.label)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No base image labeled {}", request.label)))?;
    let base_path = state.data_root.join(&base.file);
    if !base_path.exists() {
        return Err(ApiError::NotFound(format!(
            "Base image file missing: {}",
            base_path.display()
        )));
    }

    let outcome = state.c3d.overlap(&file_1, &file_2).await?;
    info!("{}", outcome.display);

    // Blocking file reads run off the async workers
    let (base_volume, mask_1, mask_2) = tokio::task::spawn_blocking({
        let base_path = base_path.clone();
        let file_1 = file_1.clone();
        let file_2 = file_2.clone();

        move || -> ctseg_common::Result<(CtVolume, CtVolume, CtVolume)> {
            Ok((
                CtVolume::load(&base_path)?,
                CtVolume::load(&file_1)?,
                CtVolume::load(&file_2)?,
            ))
        }
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Task join error: {}", e)))??;

    let slices = base_volume.depth();

    db::record_comparison(
        &state.db,
        request.challenge_1,
        request.challenge_2,
        outcome.dice,
        &outcome.command,
    )
    .await?;

    let loaded = LoadedComparison {
        label: request.label,
        challenge_1: request.challenge_1,
        challenge_2: request.challenge_2,
        base: base_volume,
        mask_1,
        mask_2,
    };
    *state.current.write().await = Some(Arc::new(loaded));

    Ok(Json(CompareResponse {
        dice: outcome.dice,
        display: outcome.display,
        slices,
        command: outcome.command,
    }))
}

/// Challenge id to an absolute path under the data root
async fn resolve_challenge_path(state: &AppState, id: i64) -> Result<PathBuf, ApiError> {
    let relative = db::challenge_file(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No challenge with id {}", id)))?;

    let path = state.data_root.join(&relative);
    if !path.exists() {
        return Err(ApiError::NotFound(format!(
            "Segmentation file missing: {}",
            path.display()
        )));
    }

    Ok(path)
}
