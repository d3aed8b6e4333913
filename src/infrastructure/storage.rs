use anyhow::{Context, Result};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

const TEMP_DIR: &str = "temp";
const TEMP_SUFFIX: &str = "tmp";

/// Local filesystem store: a flat directory of published files plus a
/// `temp/` subdirectory for in-flight uploads.
///
/// Publishing is a same-volume rename, so readers never observe a
/// half-written file under a final name. The temp area is wiped at open,
/// which also means two processes must not share one storage root.
pub struct FileStore {
    root: PathBuf,
    temp: PathBuf,
}

impl FileStore {
    /// Bootstraps the storage layout: creates the root if missing and
    /// recreates the temp area from scratch, discarding any staging files
    /// left over from a previous run.
    pub async fn open(root: &Path) -> Result<Self> {
        fs::create_dir_all(root)
            .await
            .with_context(|| format!("failed to create storage directory {}", root.display()))?;

        let temp = root.join(TEMP_DIR);
        if fs::try_exists(&temp).await.unwrap_or(false) {
            fs::remove_dir_all(&temp)
                .await
                .with_context(|| format!("failed to wipe temp directory {}", temp.display()))?;
        }
        fs::create_dir_all(&temp)
            .await
            .with_context(|| format!("failed to create temp directory {}", temp.display()))?;

        info!("🗄️  Storage ready at {}", root.display());

        Ok(Self {
            root: root.to_path_buf(),
            temp,
        })
    }

    pub fn final_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn temp_path(&self, token: &str) -> PathBuf {
        self.temp.join(format!("{token}.{TEMP_SUFFIX}"))
    }

    /// Whether a published file with this name already exists. Errors from
    /// the probe are treated as "taken" so a doubtful name is never reused.
    pub async fn exists(&self, name: &str) -> bool {
        !matches!(fs::try_exists(self.final_path(name)).await, Ok(false))
    }

    /// Atomically publishes a staged temp file under its final name.
    pub async fn publish(&self, temp_path: &Path, name: &str) -> io::Result<PathBuf> {
        let target = self.final_path(name);
        fs::rename(temp_path, &target).await?;
        Ok(target)
    }

    /// Removes a staged temp file that will not be published. Best effort;
    /// a failure is logged but never escalated past the request.
    pub async fn discard(&self, temp_path: &Path) {
        if let Err(e) = fs::remove_file(temp_path).await {
            warn!("Failed to remove temp file {}: {}", temp_path.display(), e);
        }
    }

    /// Lists published file names, excluding the temp area.
    pub async fn list(&self) -> io::Result<Vec<String>> {
        let mut entries = fs::read_dir(&self.root).await?;
        let mut names = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                if let Ok(name) = entry.file_name().into_string() {
                    names.push(name);
                }
            }
        }

        names.sort();
        Ok(names)
    }
}
