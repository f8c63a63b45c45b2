//! Data-root tree scanner
//!
//! Two-phase discovery of base images and segmentation runs:
//! sequential traversal builds the candidate set, then run files are
//! NIfTI-verified in parallel.
//!
//! Expected layout under the root:
//!
//! ```text
//! <root>/<collection>/<label>.nii                    base volume
//! <root>/<collection>/<label>/alg<TT>_run<N>.nii.gz  team TT, run N
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use ctseg_common::db::{Collection, Team};
use nifti::NiftiHeader;
use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Run filenames carry the team id (two digits) and the run id
static RUN_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^alg(\d{2})_run(\d+)\.nii\.gz$").unwrap());

/// Tree scanner errors
#[derive(Debug, Error)]
pub enum ScanError {
    /// Specified root does not exist
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// Root exists but is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// First-level entry that does not name a seeded collection
    #[error("{0} does not name a known collection")]
    UnknownCollection(PathBuf),

    /// Label directory without its sibling base volume
    #[error("Expected NIfTI {0} did not exist")]
    MissingBaseImage(PathBuf),
}

/// One discovered segmentation run
#[derive(Debug, Clone)]
pub struct ScannedRun {
    pub team_id: i64,
    pub run_id: i64,
    /// Path relative to the scanned root
    pub file: PathBuf,
}

/// One base image with its runs
#[derive(Debug, Clone)]
pub struct ScannedBaseImage {
    pub collection_id: i64,
    pub label: String,
    /// Path relative to the scanned root
    pub file: PathBuf,
    pub runs: Vec<ScannedRun>,
}

/// Scan result: base images ordered by collection then label, plus the
/// run files that failed verification
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub base_images: Vec<ScannedBaseImage>,
    pub skipped: Vec<PathBuf>,
}

/// Catalog tree scanner
pub struct TreeScanner {
    root: PathBuf,
    collections: HashMap<String, i64>,
    team_ids: HashSet<i64>,
}

impl TreeScanner {
    /// Create a scanner over `root` for the seeded collections and teams
    pub fn new(root: &Path, collections: &[Collection], teams: &[Team]) -> Self {
        Self {
            root: root.to_path_buf(),
            collections: collections
                .iter()
                .map(|c| (c.name.clone(), c.id))
                .collect(),
            team_ids: teams.iter().map(|t| t.id).collect(),
        }
    }

    /// Walk the tree and return the catalog rows to import.
    ///
    /// Aborts on a first-level entry that is not a collection, and on a
    /// label directory whose base volume is missing. Run files that do
    /// not parse as NIfTI are dropped with a warning and reported in
    /// `skipped`.
    pub fn scan(&self) -> Result<ScanOutcome, ScanError> {
        if !self.root.exists() {
            return Err(ScanError::PathNotFound(self.root.clone()));
        }
        if !self.root.is_dir() {
            return Err(ScanError::NotADirectory(self.root.clone()));
        }

        // Phase 1: sequential traversal. Base volumes and label
        // directories may be symlinks, so links are followed; the
        // fixed layout bounds the depth.
        let mut found: BTreeMap<(String, String), ScannedBaseImage> = BTreeMap::new();

        let walker = WalkDir::new(&self.root)
            .follow_links(true)
            .min_depth(1)
            .max_depth(3)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_hidden(e));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Error accessing entry: {}", e);
                    continue;
                }
            };

            let relative = match entry.path().strip_prefix(&self.root) {
                Ok(relative) => relative.to_path_buf(),
                Err(_) => continue,
            };
            let components: Vec<String> = relative
                .iter()
                .map(|c| c.to_string_lossy().to_string())
                .collect();

            match components.as_slice() {
                // Only collection names belong at the first level
                [collection] => {
                    if !self.collections.contains_key(collection.as_str()) {
                        return Err(ScanError::UnknownCollection(entry.path().to_path_buf()));
                    }
                }
                [collection, label] if entry.file_type().is_dir() => {
                    self.enter_label(collection, label, &mut found)?;
                }
                [collection, label, name] if entry.file_type().is_file() => {
                    self.enter_run(collection, label, name, &mut found);
                }
                _ => {}
            }
        }

        let candidates: Vec<PathBuf> = found
            .values()
            .flat_map(|base| base.runs.iter().map(|run| run.file.clone()))
            .collect();
        debug!(
            "Traversal found {} run files under {} base images",
            candidates.len(),
            found.len()
        );

        // Phase 2: parallel verification. A header that does not parse
        // means the file is not usable as a run.
        let verified: HashSet<PathBuf> = candidates
            .par_iter()
            .filter_map(|relative| {
                let path = self.root.join(relative);
                match NiftiHeader::from_file(&path) {
                    Ok(_) => {
                        debug!("Successfully loaded {}", path.display());
                        Some(relative.clone())
                    }
                    Err(e) => {
                        warn!("Could not load {}: {}", path.display(), e);
                        None
                    }
                }
            })
            .collect();

        let skipped: Vec<PathBuf> = candidates
            .into_iter()
            .filter(|relative| !verified.contains(relative))
            .collect();

        let mut base_images: Vec<ScannedBaseImage> = found.into_values().collect();
        for base in &mut base_images {
            base.runs.retain(|run| verified.contains(&run.file));
        }

        debug!(
            "Verification kept {} run files ({} skipped)",
            base_images.iter().map(|b| b.runs.len()).sum::<usize>(),
            skipped.len()
        );

        Ok(ScanOutcome {
            base_images,
            skipped,
        })
    }

    /// Register a label directory after checking its base volume exists
    fn enter_label(
        &self,
        collection: &str,
        label: &str,
        found: &mut BTreeMap<(String, String), ScannedBaseImage>,
    ) -> Result<(), ScanError> {
        // The first-level check already ran, so the lookup succeeds
        let collection_id = match self.collections.get(collection) {
            Some(&id) => id,
            None => return Ok(()),
        };

        // The base volume sits beside the label directory, named
        // `<label>.nii`, as a regular file or a symlink
        let base_relative = Path::new(collection).join(format!("{}.nii", label));
        let base_path = self.root.join(&base_relative);
        if !base_path.exists() {
            return Err(ScanError::MissingBaseImage(base_path));
        }

        found.insert(
            (collection.to_string(), label.to_string()),
            ScannedBaseImage {
                collection_id,
                label: label.to_string(),
                file: base_relative,
                runs: Vec::new(),
            },
        );

        Ok(())
    }

    /// Record a run file candidate when its name matches the pattern
    fn enter_run(
        &self,
        collection: &str,
        label: &str,
        name: &str,
        found: &mut BTreeMap<(String, String), ScannedBaseImage>,
    ) {
        let (team_id, run_id) = match parse_run_file(name) {
            Some(parsed) => parsed,
            None => return,
        };
        if !self.team_ids.contains(&team_id) {
            debug!("{}/{}/{}: no team with id {}", collection, label, name, team_id);
            return;
        }

        if let Some(base) = found.get_mut(&(collection.to_string(), label.to_string())) {
            base.runs.push(ScannedRun {
                team_id,
                run_id,
                file: Path::new(collection).join(label).join(name),
            });
        }
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

/// Parse `alg<TT>_run<N>.nii.gz` into (team id, run id)
fn parse_run_file(name: &str) -> Option<(i64, i64)> {
    let caps = RUN_FILE.captures(name)?;
    let team_id = caps[1].parse().ok()?;
    let run_id = caps[2].parse().ok()?;
    Some((team_id, run_id))
}
