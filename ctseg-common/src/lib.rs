//! # ctSeg Common Library
//!
//! Shared code for the ctSeg tools including:
//! - Catalog database schema, models and queries
//! - NIfTI volume loading and display scaling
//! - Configuration resolution
//! - Common error types

pub mod config;
pub mod db;
pub mod error;
pub mod volume;

pub use error::{Error, Result};
pub use volume::CtVolume;
