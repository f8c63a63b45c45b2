//! Integration tests for the tree scanner and catalog population
//!
//! Tests cover:
//! - Discovery of base images and runs from a generated tree
//! - Abort conditions (unknown first-level entries, missing base volume)
//! - Verification skips for unreadable run files
//! - End-to-end population of the catalog database

use ctseg_common::db::{self, Collection, Team};
use ctseg_ingest::{populate, ScanError, TreeScanner};
use ndarray::Array3;
use nifti::writer::WriterOptions;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Small valid volume fixture; gzipped when the extension says so
fn write_volume(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let data = Array3::<f32>::zeros((4, 4, 2));
    WriterOptions::new(path).write_nifti(&data).unwrap();
}

/// The seeded collection rows as the scanner sees them
fn seeded_collections() -> Vec<Collection> {
    ["cumc", "lidc", "moffitt", "rider", "stanford"]
        .iter()
        .enumerate()
        .map(|(i, name)| Collection {
            id: i as i64 + 1,
            name: name.to_string(),
        })
        .collect()
}

fn seeded_teams() -> Vec<Team> {
    ["cumc", "moffitt", "stanford"]
        .iter()
        .enumerate()
        .map(|(i, team)| Team {
            id: i as i64 + 1,
            team: team.to_string(),
        })
        .collect()
}

/// Two collections, two labels, four runs
fn build_tree(root: &Path) {
    write_volume(&root.join("cumc/s0011.nii"));
    write_volume(&root.join("cumc/s0011/alg01_run0.nii.gz"));
    write_volume(&root.join("cumc/s0011/alg01_run1.nii.gz"));
    write_volume(&root.join("cumc/s0011/alg02_run0.nii.gz"));
    write_volume(&root.join("moffitt/m0003.nii"));
    write_volume(&root.join("moffitt/m0003/alg03_run0.nii.gz"));
}

async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await
        .expect("Should open in-memory database");
    db::init_schema(&pool).await.expect("Should create schema");
    pool
}

// =============================================================================
// Scanner
// =============================================================================

#[test]
fn scan_discovers_bases_and_runs() {
    let dir = TempDir::new().unwrap();
    build_tree(dir.path());
    // Hidden entries are ignored, not treated as collections
    fs::write(dir.path().join(".DS_Store"), b"junk").unwrap();

    let scanner = TreeScanner::new(dir.path(), &seeded_collections(), &seeded_teams());
    let outcome = scanner.scan().unwrap();

    assert_eq!(outcome.skipped.len(), 0);
    assert_eq!(outcome.base_images.len(), 2);

    let s0011 = &outcome.base_images[0];
    assert_eq!(s0011.label, "s0011");
    assert_eq!(s0011.collection_id, 1);
    assert_eq!(s0011.file, Path::new("cumc/s0011.nii"));
    let runs: Vec<(i64, i64)> = s0011.runs.iter().map(|r| (r.team_id, r.run_id)).collect();
    assert_eq!(runs, vec![(1, 0), (1, 1), (2, 0)]);
    assert_eq!(
        s0011.runs[0].file,
        Path::new("cumc/s0011/alg01_run0.nii.gz")
    );

    let m0003 = &outcome.base_images[1];
    assert_eq!(m0003.label, "m0003");
    assert_eq!(m0003.collection_id, 3);
    assert_eq!(m0003.runs.len(), 1);
    assert_eq!(m0003.runs[0].team_id, 3);
}

#[test]
fn unknown_directory_at_root_aborts() {
    let dir = TempDir::new().unwrap();
    build_tree(dir.path());
    fs::create_dir(dir.path().join("scratch")).unwrap();

    let scanner = TreeScanner::new(dir.path(), &seeded_collections(), &seeded_teams());
    match scanner.scan() {
        Err(ScanError::UnknownCollection(path)) => {
            assert!(path.ends_with("scratch"));
        }
        other => panic!("expected UnknownCollection, got {:?}", other),
    }
}

#[test]
fn stray_file_at_root_aborts() {
    let dir = TempDir::new().unwrap();
    build_tree(dir.path());
    fs::write(dir.path().join("README.md"), b"notes").unwrap();

    let scanner = TreeScanner::new(dir.path(), &seeded_collections(), &seeded_teams());
    assert!(matches!(
        scanner.scan(),
        Err(ScanError::UnknownCollection(_))
    ));
}

#[test]
fn label_without_base_volume_fails() {
    let dir = TempDir::new().unwrap();
    build_tree(dir.path());
    write_volume(&dir.path().join("cumc/s0040/alg01_run0.nii.gz"));

    let scanner = TreeScanner::new(dir.path(), &seeded_collections(), &seeded_teams());
    match scanner.scan() {
        Err(ScanError::MissingBaseImage(path)) => {
            assert!(path.ends_with("cumc/s0040.nii"), "got {}", path.display());
        }
        other => panic!("expected MissingBaseImage, got {:?}", other),
    }
}

#[test]
fn corrupt_run_file_is_skipped() {
    let dir = TempDir::new().unwrap();
    build_tree(dir.path());
    fs::write(dir.path().join("cumc/s0011/alg03_run0.nii.gz"), b"truncated").unwrap();

    let scanner = TreeScanner::new(dir.path(), &seeded_collections(), &seeded_teams());
    let outcome = scanner.scan().unwrap();

    assert_eq!(
        outcome.skipped,
        vec![PathBuf::from("cumc/s0011/alg03_run0.nii.gz")]
    );
    let runs: Vec<(i64, i64)> = outcome.base_images[0]
        .runs
        .iter()
        .map(|r| (r.team_id, r.run_id))
        .collect();
    assert_eq!(runs, vec![(1, 0), (1, 1), (2, 0)]);
}

#[test]
fn filenames_outside_the_pattern_are_ignored() {
    let dir = TempDir::new().unwrap();
    build_tree(dir.path());
    fs::write(dir.path().join("cumc/s0011/notes.txt"), b"notes").unwrap();
    // Matches the pattern but no team has id 99
    fs::write(dir.path().join("cumc/s0011/alg99_run0.nii.gz"), b"junk").unwrap();

    let scanner = TreeScanner::new(dir.path(), &seeded_collections(), &seeded_teams());
    let outcome = scanner.scan().unwrap();

    assert_eq!(outcome.skipped.len(), 0);
    assert_eq!(outcome.base_images[0].runs.len(), 3);
}

#[cfg(unix)]
#[test]
fn base_volume_may_be_a_symlink() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("data");
    build_tree(&root);

    write_volume(&dir.path().join("r0001_source.nii"));
    write_volume(&root.join("rider/r0001/alg01_run0.nii.gz"));
    std::os::unix::fs::symlink(
        dir.path().join("r0001_source.nii"),
        root.join("rider/r0001.nii"),
    )
    .unwrap();

    let scanner = TreeScanner::new(&root, &seeded_collections(), &seeded_teams());
    let outcome = scanner.scan().unwrap();

    assert_eq!(outcome.base_images.len(), 3);
    let r0001 = outcome
        .base_images
        .iter()
        .find(|b| b.label == "r0001")
        .unwrap();
    assert_eq!(r0001.file, Path::new("rider/r0001.nii"));
    assert_eq!(r0001.runs.len(), 1);
}

// =============================================================================
// Population
// =============================================================================

#[tokio::test]
async fn populate_round_trips_to_catalog() {
    let dir = TempDir::new().unwrap();
    build_tree(dir.path());

    let pool = memory_pool().await;
    let collections = db::list_collections(&pool).await.unwrap();
    let teams = db::list_teams(&pool).await.unwrap();

    let scanner = TreeScanner::new(dir.path(), &collections, &teams);
    let outcome = scanner.scan().unwrap();
    let summary = populate(&pool, &outcome).await.unwrap();

    assert_eq!(summary.collections, 2);
    assert_eq!(summary.base_images, 2);
    assert_eq!(summary.challenges, 4);
    assert_eq!(summary.skipped, 0);

    let base = db::find_base_image(&pool, "s0011").await.unwrap().unwrap();
    assert_eq!(base.file, "cumc/s0011.nii");

    let names: Vec<String> = db::list_runs_for_label(&pool, "s0011")
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(names, vec!["cumc-0", "cumc-1", "moffitt-0"]);
}

#[tokio::test]
async fn reimport_replaces_rows() {
    let dir = TempDir::new().unwrap();
    build_tree(dir.path());

    let pool = memory_pool().await;
    let collections = db::list_collections(&pool).await.unwrap();
    let teams = db::list_teams(&pool).await.unwrap();

    let scanner = TreeScanner::new(dir.path(), &collections, &teams);
    let outcome = scanner.scan().unwrap();
    populate(&pool, &outcome).await.unwrap();

    // A recorded comparison goes away with the rows it references
    let runs = db::list_runs_for_label(&pool, "s0011").await.unwrap();
    db::record_comparison(&pool, runs[0].id, runs[1].id, Some(0.5), "c3d ...")
        .await
        .unwrap();

    let summary = populate(&pool, &outcome).await.unwrap();
    assert_eq!(summary.base_images, 2);
    assert_eq!(summary.challenges, 4);

    let runs = db::list_runs_for_label(&pool, "s0011").await.unwrap();
    assert_eq!(runs.len(), 3);
    let history = db::recent_comparisons(&pool, 10).await.unwrap();
    assert_eq!(history.len(), 0);
}
