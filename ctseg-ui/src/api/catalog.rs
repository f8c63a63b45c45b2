//! Catalog browsing endpoints: collection tree, run selectors, history

use axum::extract::{Path, State};
use axum::Json;
use ctseg_common::db::{self, ChallengeRun, Comparison};
use serde::Serialize;

use crate::error::ApiError;
use crate::AppState;

/// How much comparison history the UI is shown
const HISTORY_LIMIT: i64 = 50;

/// One collection with its base images (tree data for the left panel)
#[derive(Debug, Serialize)]
pub struct CollectionNode {
    pub id: i64,
    pub name: String,
    pub base_images: Vec<BaseImageNode>,
}

#[derive(Debug, Serialize)]
pub struct BaseImageNode {
    pub id: i64,
    pub label: String,
}

/// GET /api/collections
///
/// Collections with their base images, both alphabetically ordered.
pub async fn collection_tree(
    State(state): State<AppState>,
) -> Result<Json<Vec<CollectionNode>>, ApiError> {
    let collections = db::list_collections(&state.db).await?;

    let mut tree = Vec::with_capacity(collections.len());
    for collection in collections {
        let base_images = db::list_base_images(&state.db, collection.id)
            .await?
            .into_iter()
            .map(|b| BaseImageNode {
                id: b.id,
                label: b.label,
            })
            .collect();

        tree.push(CollectionNode {
            id: collection.id,
            name: collection.name,
            base_images,
        });
    }

    Ok(Json(tree))
}

/// GET /api/base-images/:label/runs
///
/// Runs recorded for one base image, with `{team}-{run_id}` display
/// names for the two selectors.
pub async fn runs_for_base_image(
    State(state): State<AppState>,
    Path(label): Path<String>,
) -> Result<Json<Vec<ChallengeRun>>, ApiError> {
    if db::find_base_image(&state.db, &label).await?.is_none() {
        return Err(ApiError::NotFound(format!(
            "No base image labeled {}",
            label
        )));
    }

    let runs = db::list_runs_for_label(&state.db, &label).await?;
    Ok(Json(runs))
}

/// GET /api/comparisons
///
/// Recent comparison history, newest first.
pub async fn recent_comparison_history(
    State(state): State<AppState>,
) -> Result<Json<Vec<Comparison>>, ApiError> {
    let comparisons = db::recent_comparisons(&state.db, HISTORY_LIMIT).await?;
    Ok(Json(comparisons))
}
