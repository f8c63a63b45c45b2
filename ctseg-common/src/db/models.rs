//! Database models

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: i64,
    pub team: String,
}

/// A base CT volume; `file` is relative to the data root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseImage {
    pub id: i64,
    pub collection_id: i64,
    pub label: String,
    pub file: String,
}

/// A segmentation run submitted against a base image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
    pub id: i64,
    pub base_image_id: i64,
    pub team_id: i64,
    pub collection_id: i64,
    pub label: String,
    pub run_id: i64,
    pub file: String,
}

/// A challenge with its selector display name (`{team}-{run_id}`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeRun {
    pub id: i64,
    pub name: String,
}

/// An executed comparison; `dice` is None when c3d reported nan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comparison {
    pub guid: String,
    pub challenge_1: i64,
    pub challenge_2: i64,
    pub dice: Option<f64>,
    pub command: String,
    pub created_at: String,
}
