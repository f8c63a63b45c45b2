//! Catalog database: schema, models and queries

use crate::{Error, Result};
use sqlx::SqlitePool;
use std::path::Path;

pub mod init;
pub mod models;
pub mod queries;

pub use init::*;
pub use models::*;
pub use queries::*;

/// Connect to an existing catalog in read-only mode.
///
/// Used for inspection; the UI and the ingest tool open the catalog
/// read-write through [`init_database`].
pub async fn connect_readonly(db_path: &Path) -> Result<SqlitePool> {
    if !db_path.exists() {
        return Err(Error::NotFound(format!(
            "Database not found: {} (run ctseg-ingest first)",
            db_path.display()
        )));
    }

    // immutable=1: SQLite won't write even for internal operations
    let db_url = format!("sqlite://{}?mode=ro&immutable=1", db_path.display());
    let pool = SqlitePool::connect(&db_url).await?;

    Ok(pool)
}
