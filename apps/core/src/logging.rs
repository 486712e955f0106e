use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing_subscriber::EnvFilter;

const LOG_FILE_NAME: &str = "lumina.log";
const ARCHIVE_PREFIX: &str = "lumina-";
const MAX_LOG_BYTES: u64 = 1_000_000;
const MAX_ARCHIVES: usize = 5;

static PANIC_HOOK_INSTALLED: OnceLock<()> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("failed to prepare log file at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid log filter {filter:?}: {message}")]
    Filter { filter: String, message: String },
    #[error("a global subscriber is already installed")]
    AlreadyInitialized,
}

/// Installs the global subscriber. With a directory, events go to a rotated
/// file there and the path is returned; without one they go to stderr.
/// Stdout is never written.
pub fn init(logs_dir: Option<&Path>, level: &str) -> Result<Option<PathBuf>, LoggingError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level).map_err(|error| LoggingError::Filter {
            filter: level.to_string(),
            message: error.to_string(),
        })?,
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false);

    let path = match logs_dir {
        Some(dir) => {
            let (file, path) = prepare_log_file(dir)?;
            builder
                .with_writer(Mutex::new(file))
                .try_init()
                .map_err(|_| LoggingError::AlreadyInitialized)?;
            Some(path)
        }
        None => {
            builder
                .with_writer(std::io::stderr)
                .try_init()
                .map_err(|_| LoggingError::AlreadyInitialized)?;
            None
        }
    };

    install_panic_hook();
    Ok(path)
}

/// Opens `lumina.log` in `dir` for appending, archiving it first when it has
/// outgrown the size cap.
pub fn prepare_log_file(dir: &Path) -> Result<(File, PathBuf), LoggingError> {
    let io_error = |path: &Path| {
        let path = path.to_path_buf();
        move |source| LoggingError::Io { path, source }
    };

    fs::create_dir_all(dir).map_err(io_error(dir))?;
    let log_path = dir.join(LOG_FILE_NAME);
    rotate_if_needed(&log_path, dir).map_err(io_error(&log_path))?;

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .map_err(io_error(&log_path))?;
    Ok((file, log_path))
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

/// Fixed-width so archives sort oldest first; the sequence keeps rotations
/// inside the same millisecond apart.
fn archive_path(log_dir: &Path) -> PathBuf {
    let stamp = now_millis();
    let mut seq = 0u32;
    loop {
        let candidate = log_dir.join(format!("{ARCHIVE_PREFIX}{stamp:013}-{seq:03}.log"));
        if !candidate.exists() {
            return candidate;
        }
        seq += 1;
    }
}

fn rotate_if_needed(log_path: &Path, log_dir: &Path) -> Result<(), std::io::Error> {
    let meta = match fs::metadata(log_path) {
        Ok(meta) => meta,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(err),
    };

    if meta.len() < MAX_LOG_BYTES {
        return Ok(());
    }

    fs::rename(log_path, archive_path(log_dir))?;
    prune_old_archives(log_dir)
}

fn prune_old_archives(log_dir: &Path) -> Result<(), std::io::Error> {
    let mut archives = fs::read_dir(log_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(ARCHIVE_PREFIX) && n.ends_with(".log"))
        })
        .collect::<Vec<_>>();

    archives.sort();
    let excess = archives.len().saturating_sub(MAX_ARCHIVES);
    for oldest in archives.drain(..excess) {
        if let Err(error) = fs::remove_file(&oldest) {
            tracing::warn!(path = %oldest.display(), %error, "failed to prune log archive");
        }
    }
    Ok(())
}

fn install_panic_hook() {
    let _ = PANIC_HOOK_INSTALLED.get_or_init(|| {
        let prior = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |panic_info| {
            let location = panic_info
                .location()
                .map(|l| format!("{}:{}", l.file(), l.line()))
                .unwrap_or_else(|| "unknown".to_string());
            let payload = panic_info
                .payload()
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| panic_info.payload().downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "panic payload unavailable".to_string());
            tracing::error!(%location, %payload, "panic");
            prior(panic_info);
        }));
    });
}

#[cfg(test)]
mod tests {
    use super::{prepare_log_file, prune_old_archives, MAX_ARCHIVES, MAX_LOG_BYTES};

    #[test]
    fn creates_log_file_in_fresh_directory() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("logs");

        let (_, path) = prepare_log_file(&logs).unwrap();

        assert!(path.exists());
        assert!(path.ends_with("lumina.log"));
    }

    #[test]
    fn oversized_log_is_archived() {
        let dir = tempfile::tempdir().unwrap();
        let current = dir.path().join("lumina.log");
        std::fs::write(&current, vec![b'x'; MAX_LOG_BYTES as usize]).unwrap();

        let (_, path) = prepare_log_file(dir.path()).unwrap();

        assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);
        let archived = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().starts_with("lumina-"))
            .count();
        assert_eq!(archived, 1);
    }

    #[test]
    fn back_to_back_rotations_keep_both_archives() {
        let dir = tempfile::tempdir().unwrap();
        let current = dir.path().join("lumina.log");

        for fill in [b'a', b'b'] {
            std::fs::write(&current, vec![fill; MAX_LOG_BYTES as usize]).unwrap();
            prepare_log_file(dir.path()).unwrap();
        }

        let mut archives: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.file_name().unwrap().to_string_lossy().starts_with("lumina-"))
            .collect();
        archives.sort();
        assert_eq!(archives.len(), 2);
        assert_eq!(std::fs::read(&archives[0]).unwrap()[0], b'a');
        assert_eq!(std::fs::read(&archives[1]).unwrap()[0], b'b');
    }

    #[test]
    fn keeps_only_newest_archives() {
        let dir = tempfile::tempdir().unwrap();
        for stamp in 1..=MAX_ARCHIVES + 2 {
            std::fs::write(dir.path().join(format!("lumina-{stamp}.log")), b"old").unwrap();
        }
        std::fs::write(dir.path().join("notes.txt"), b"keep").unwrap();

        prune_old_archives(dir.path()).unwrap();

        assert!(!dir.path().join("lumina-1.log").exists());
        assert!(!dir.path().join("lumina-2.log").exists());
        assert!(dir.path().join("lumina-7.log").exists());
        assert!(dir.path().join("notes.txt").exists());
    }
}
