//! Convert3D (c3d) overlap client
//!
//! Dice is not computed in-process: comparisons shell out to the c3d
//! binary and parse the coefficient it reports on stdout.

use once_cell::sync::Lazy;
use regex::Regex;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

/// c3d client errors
#[derive(Debug, Error)]
pub enum C3dError {
    /// c3d binary not found on PATH or in the configured directories
    #[error("c3d binary not found in PATH")]
    BinaryNotFound,

    /// Failed to spawn the c3d process
    #[error("Failed to execute c3d: {0}")]
    ExecutionError(String),

    /// c3d exited with a failure status
    #[error("c3d failed (exit code {code:?}): {stderr}")]
    OverlapFailed { code: Option<i32>, stderr: String },

    /// c3d output carried no coefficient line
    #[error("No Dice similarity coefficient in c3d output")]
    NoCoefficient,
}

/// Matches the coefficient line of `c3d -overlap` verbose output.
/// Observed values: integers (`1`), decimals (`0.8243`) and `-nan`
/// when both masks are empty.
static DICE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Dice similarity coefficient:\s*(-?nan|\d+(?:\.\d*)?)").unwrap());

/// Result of a successful overlap invocation
#[derive(Debug, Clone)]
pub struct OverlapOutcome {
    /// Parsed coefficient; None when c3d reported nan
    pub dice: Option<f64>,
    /// The full matched line, shown verbatim in the UI
    pub display: String,
    /// The command line that was run
    pub command: String,
}

/// Client for the external c3d binary
pub struct C3dClient {
    extra_paths: Vec<PathBuf>,
}

impl C3dClient {
    /// Create a client; `extra_paths` are appended to the child PATH
    /// when the binary is spawned (the configured install locations).
    pub fn new(extra_paths: Vec<PathBuf>) -> Self {
        Self { extra_paths }
    }

    /// Child PATH: the current PATH plus the configured directories
    fn child_path(&self) -> OsString {
        let current = std::env::var_os("PATH").unwrap_or_default();
        let mut paths: Vec<PathBuf> = std::env::split_paths(&current).collect();
        paths.extend(self.extra_paths.iter().cloned());
        std::env::join_paths(paths).unwrap_or(current)
    }

    /// Check whether c3d can be spawned; probed once at startup
    pub fn is_available(&self) -> bool {
        Command::new("c3d")
            .arg("-version")
            .env("PATH", self.child_path())
            .output()
            .is_ok()
    }

    /// Run `c3d -verbose <image1> <image2> -overlap 1` and parse the
    /// Dice similarity coefficient from stdout.
    pub async fn overlap(&self, image1: &Path, image2: &Path) -> Result<OverlapOutcome, C3dError> {
        let command = format!(
            "c3d -verbose {} {} -overlap 1",
            image1.display(),
            image2.display()
        );
        tracing::info!("{}", command);

        let path_value = self.child_path();
        let output = tokio::task::spawn_blocking({
            let image1 = image1.to_path_buf();
            let image2 = image2.to_path_buf();

            move || {
                Command::new("c3d")
                    .arg("-verbose")
                    .arg(&image1)
                    .arg(&image2)
                    .arg("-overlap")
                    .arg("1")
                    .env("PATH", path_value)
                    .output()
            }
        })
        .await
        .map_err(|e| C3dError::ExecutionError(format!("Task join error: {}", e)))?
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => C3dError::BinaryNotFound,
            _ => C3dError::ExecutionError(e.to_string()),
        })?;

        if !output.status.success() {
            return Err(C3dError::OverlapFailed {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        tracing::debug!("c3d output:\n{}", stdout);

        match parse_dice(&stdout) {
            Some((dice, display)) => Ok(OverlapOutcome {
                dice,
                display,
                command,
            }),
            None => Err(C3dError::NoCoefficient),
        }
    }
}

/// Extract `(coefficient, display line)` from c3d verbose output.
///
/// The display string is the whole matched fragment, e.g.
/// `Dice similarity coefficient: 0.8243`.
pub fn parse_dice(stdout: &str) -> Option<(Option<f64>, String)> {
    let captures = DICE_LINE.captures(stdout)?;
    let display = captures.get(0)?.as_str().to_string();
    let value = captures.get(1)?.as_str();

    let dice = if value.ends_with("nan") {
        None
    } else {
        value.parse::<f64>().ok()
    };

    Some((dice, display))
}
