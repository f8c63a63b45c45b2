//! Catalog population from a scan outcome

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use ctseg_common::db;
use ctseg_common::{Error, Result};
use sqlx::SqlitePool;
use tracing::info;

use crate::scanner::ScanOutcome;

/// Row counts of a completed import
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopulateSummary {
    /// Collections that received at least one base image
    pub collections: usize,
    pub base_images: usize,
    pub challenges: usize,
    /// Run files dropped during verification
    pub skipped: usize,
}

/// Replace the imported catalog rows with the scan outcome.
///
/// The seeded collection and team rows stay; base images, challenges
/// and recorded comparisons from any earlier import are cleared first.
pub async fn populate(pool: &SqlitePool, outcome: &ScanOutcome) -> Result<PopulateSummary> {
    db::clear_catalog(pool).await?;

    let mut collections = HashSet::new();
    let mut per_collection: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    let mut challenges = 0usize;

    for base in &outcome.base_images {
        collections.insert(base.collection_id);

        let base_id =
            db::insert_base_image(pool, base.collection_id, &base.label, path_str(&base.file)?)
                .await?;

        for run in &base.runs {
            db::insert_challenge(
                pool,
                base_id,
                run.team_id,
                base.collection_id,
                &base.label,
                run.run_id,
                path_str(&run.file)?,
            )
            .await?;
            challenges += 1;
        }

        // The collection name is the first component of the stored path
        let collection_name = base
            .file
            .parent()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_default();
        let counts = per_collection.entry(collection_name).or_insert((0, 0));
        counts.0 += 1;
        counts.1 += base.runs.len();
    }

    for (name, (bases, runs)) in &per_collection {
        info!("{}: {} base images, {} runs", name, bases, runs);
    }

    Ok(PopulateSummary {
        collections: collections.len(),
        base_images: outcome.base_images.len(),
        challenges,
        skipped: outcome.skipped.len(),
    })
}

/// Stored paths are text, so the relative path must be valid UTF-8
fn path_str(path: &Path) -> Result<&str> {
    path.to_str()
        .ok_or_else(|| Error::InvalidInput(format!("Non-UTF-8 path: {}", path.display())))
}
