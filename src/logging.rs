use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Where logs go when no `--log-file` is given
pub fn default_log_path() -> Option<PathBuf> {
    let cache_dir = dirs::cache_dir()?;
    Some(cache_dir.join("canoa").join("canoa.log"))
}

/// Install the global subscriber, writing to `path`. The terminal owns
/// stdout and stderr while the board is up, so logs only ever go to a file.
pub fn init(path: &Path) -> io::Result<()> {
    let file = open_log_file(path)?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .init();
    Ok(())
}

fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_path_is_under_canoa_cache_dir() {
        if let Some(path) = default_log_path() {
            assert!(path.ends_with("canoa/canoa.log"));
        }
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = std::env::temp_dir().join(format!("canoa-logs-{}", std::process::id()));
        let path = dir.join("nested").join("canoa.log");

        open_log_file(&path).unwrap();
        assert!(path.exists());

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn unwritable_location_is_an_error() {
        let dir = std::env::temp_dir().join(format!("canoa-logs-file-{}", std::process::id()));
        fs::write(&dir, "not a directory").unwrap();

        assert!(open_log_file(&dir.join("canoa.log")).is_err());

        fs::remove_file(&dir).ok();
    }
}
