//! Configuration loading and data location resolution

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Environment variable overriding the image data root
pub const ENV_DATA_ROOT: &str = "CTSEG_DATA_ROOT";
/// Environment variable overriding the catalog database path
pub const ENV_DATABASE: &str = "CTSEG_DATABASE";
/// Environment variable overriding the c3d search directories
/// (platform path-list syntax, e.g. colon-separated on Linux)
pub const ENV_C3D_PATH: &str = "CTSEG_C3D_PATH";

/// Directories appended to PATH when locating the c3d binary.
///
/// Covers the install locations the tool has been run against: the
/// HubZero cluster build, the macOS Convert3D application bundle, and
/// the getafix workstation build.
pub const DEFAULT_C3D_PATHS: &[&str] = &[
    "/apps/share64/debian7/convert3d/nightly",
    "/Applications/Convert3DGUI.app/Contents/bin",
    "/space/getafix/1/users/jevans/c3d-1.0.0-Linux-x86_64/bin",
];

/// Optional keys read from `<config dir>/ctseg/config.toml`
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ConfigFile {
    pub data_root: Option<PathBuf>,
    pub database: Option<PathBuf>,
    pub c3d_paths: Option<Vec<PathBuf>>,
}

impl ConfigFile {
    /// Read the user config file if present.
    ///
    /// A missing file is normal; a malformed one is reported and ignored
    /// so the tools still start with defaults.
    pub fn load() -> ConfigFile {
        let path = match config_file_path() {
            Some(p) => p,
            None => return ConfigFile::default(),
        };
        if !path.exists() {
            return ConfigFile::default();
        }
        let text = match std::fs::read_to_string(&path) {
            Ok(t) => t,
            Err(e) => {
                warn!("Could not read config file {}: {}", path.display(), e);
                return ConfigFile::default();
            }
        };
        match toml::from_str::<ConfigFile>(&text) {
            Ok(file) => file,
            Err(e) => {
                warn!("Ignoring malformed config file {}: {}", path.display(), e);
                ConfigFile::default()
            }
        }
    }
}

/// Resolved settings shared by the UI and the ingest tool
#[derive(Debug, Clone)]
pub struct CtsegConfig {
    /// Root folder holding one subdirectory per collection
    pub data_root: PathBuf,
    /// SQLite catalog database path
    pub database: PathBuf,
    /// Extra directories searched for the c3d binary
    pub c3d_paths: Vec<PathBuf>,
}

impl CtsegConfig {
    /// Resolve each setting in priority order:
    /// 1. Command-line argument (highest priority)
    /// 2. Environment variable
    /// 3. TOML config file
    /// 4. OS-dependent compiled default (fallback)
    pub fn resolve(cli_data_root: Option<&Path>, cli_database: Option<&Path>) -> CtsegConfig {
        let file = ConfigFile::load();

        let data_root = cli_data_root
            .map(Path::to_path_buf)
            .or_else(|| env_path(ENV_DATA_ROOT))
            .or_else(|| file.data_root.clone())
            .unwrap_or_else(default_data_root);

        let database = cli_database
            .map(Path::to_path_buf)
            .or_else(|| env_path(ENV_DATABASE))
            .or_else(|| file.database.clone())
            .unwrap_or_else(default_database_path);

        let c3d_paths = env_path_list(ENV_C3D_PATH)
            .or_else(|| file.c3d_paths.clone())
            .unwrap_or_else(|| DEFAULT_C3D_PATHS.iter().map(PathBuf::from).collect());

        CtsegConfig {
            data_root,
            database,
            c3d_paths,
        }
    }
}

/// Path of the user config file for the platform
pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("ctseg").join("config.toml"))
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var_os(name).map(PathBuf::from)
}

fn env_path_list(name: &str) -> Option<Vec<PathBuf>> {
    std::env::var_os(name).map(|v| std::env::split_paths(&v).collect())
}

/// OS-dependent default image data root
fn default_data_root() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("ctseg").join("data"))
        .unwrap_or_else(|| PathBuf::from("./ctseg_data"))
}

/// OS-dependent default catalog database path
fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("ctseg").join("ctseg.db"))
        .unwrap_or_else(|| PathBuf::from("./ctseg.db"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        std::env::remove_var(ENV_DATA_ROOT);
        std::env::remove_var(ENV_DATABASE);
        std::env::remove_var(ENV_C3D_PATH);
    }

    #[test]
    #[serial]
    fn cli_argument_beats_environment() {
        clear_env();
        std::env::set_var(ENV_DATA_ROOT, "/from/env");

        let config = CtsegConfig::resolve(Some(Path::new("/from/cli")), None);
        assert_eq!(config.data_root, PathBuf::from("/from/cli"));

        clear_env();
    }

    #[test]
    #[serial]
    fn environment_sets_paths() {
        clear_env();
        std::env::set_var(ENV_DATA_ROOT, "/env/data");
        std::env::set_var(ENV_DATABASE, "/env/ctseg.db");

        let config = CtsegConfig::resolve(None, None);
        assert_eq!(config.data_root, PathBuf::from("/env/data"));
        assert_eq!(config.database, PathBuf::from("/env/ctseg.db"));

        clear_env();
    }

    #[test]
    #[serial]
    fn c3d_path_list_splits_on_separator() {
        clear_env();
        let joined = std::env::join_paths(["/opt/c3d/bin", "/usr/local/c3d"])
            .unwrap();
        std::env::set_var(ENV_C3D_PATH, joined);

        let config = CtsegConfig::resolve(None, None);
        assert_eq!(
            config.c3d_paths,
            vec![PathBuf::from("/opt/c3d/bin"), PathBuf::from("/usr/local/c3d")]
        );

        clear_env();
    }

    #[test]
    fn config_file_parses_known_keys() {
        let file: ConfigFile = toml::from_str(
            r#"
            data_root = "/data/resultsNii"
            database = "/data/ctseg.db"
            c3d_paths = ["/opt/c3d/bin"]
            "#,
        )
        .unwrap();

        assert_eq!(file.data_root, Some(PathBuf::from("/data/resultsNii")));
        assert_eq!(file.database, Some(PathBuf::from("/data/ctseg.db")));
        assert_eq!(file.c3d_paths, Some(vec![PathBuf::from("/opt/c3d/bin")]));
    }
}
