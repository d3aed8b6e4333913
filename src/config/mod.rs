use std::env;
use std::path::{Path, PathBuf};

/// The placeholder token shipped in deployment examples; warned about at
/// startup so it never survives into a real deployment.
pub const EXAMPLE_TOKEN: &str = "AAAABBBBCCCCDDDD";

pub const DEFAULT_BASE_URL: &str = "http://localhost:3579/";
pub const DEFAULT_PORT: u16 = 3579;
const DEFAULT_MAX_FILE_SIZE_MB: usize = 10;
const DEFAULT_STORAGE_DIR: &str = "storage";

/// Immutable service configuration, built once at startup and passed by
/// reference afterwards. No component reads process environment directly.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Shared secret for user-only endpoints. `None` means open access.
    pub token: Option<String>,

    /// Public URL prefix for uploaded files, always ending in `/`.
    pub base_url: String,

    /// Absolute path of the storage root.
    pub storage_path: PathBuf,

    /// Maximum accepted request body, in bytes.
    pub max_file_size: usize,

    /// TCP port to listen on.
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            token: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            storage_path: resolve_storage_path(DEFAULT_STORAGE_DIR),
            max_file_size: DEFAULT_MAX_FILE_SIZE_MB * 1024 * 1024,
            port: DEFAULT_PORT,
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment variables, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            token: env::var("TOKEN").ok().filter(|t| !t.is_empty()),

            base_url: env::var("BASE_URL")
                .ok()
                .map(|url| normalize_base_url(&url))
                .unwrap_or(default.base_url),

            storage_path: env::var("STORAGE_PATH")
                .ok()
                .map(|p| resolve_storage_path(&p))
                .unwrap_or(default.storage_path),

            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .map(|mb| mb * 1024 * 1024)
                .unwrap_or(default.max_file_size),

            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.port),
        }
    }
}

fn normalize_base_url(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    }
}

fn resolve_storage_path(path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}
