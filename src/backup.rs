use chrono::{Local, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

pub const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

static STAMP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{8}_\d{6})(?:_(\d+))?$").expect("regex compiles"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupEntry {
    pub path: PathBuf,
    pub taken_at: NaiveDateTime,
    pub sequence: u32,
}

#[derive(thiserror::Error, Debug)]
pub enum BackupError {
    #[error("backup failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("no backups found for {}", .0.display())]
    NoBackups(PathBuf),
    #[error("not a file path: {}", .0.display())]
    InvalidPath(PathBuf),
}

/// `<path><suffix><YYYYmmdd_HHMMSS>`
pub fn backup_path(path: &Path, suffix: &str, taken_at: NaiveDateTime) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    name.push(taken_at.format(STAMP_FORMAT).to_string());
    PathBuf::from(name)
}

fn with_sequence(base: &Path, sequence: u32) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(format!("_{sequence}"));
    PathBuf::from(name)
}

/// Copies `path` next to itself under a stamped name that does not exist yet.
pub fn create_backup(path: &Path, suffix: &str) -> Result<PathBuf, BackupError> {
    let base = backup_path(path, suffix, Local::now().naive_local());
    let mut target = base.clone();
    let mut sequence = 0;
    while target.exists() {
        sequence += 1;
        target = with_sequence(&base, sequence);
    }

    fs::copy(path, &target)?;
    if let Err(err) = copy_mtime(path, &target) {
        tracing::warn!(backup = %target.display(), "could not keep modification time: {err}");
    }
    tracing::info!(backup = %target.display(), "backup created");
    Ok(target)
}

fn copy_mtime(from: &Path, to: &Path) -> std::io::Result<()> {
    let modified = fs::metadata(from)?.modified()?;
    fs::File::options().write(true).open(to)?.set_modified(modified)
}

/// Backups of `path` found in its directory, newest first.
pub fn list_backups(path: &Path, suffix: &str) -> Result<Vec<BackupEntry>, BackupError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| BackupError::InvalidPath(path.to_path_buf()))?
        .to_string_lossy();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let prefix = format!("{file_name}{suffix}");

    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        let Some(rest) = name.strip_prefix(&prefix) else {
            continue;
        };
        let Some(caps) = STAMP_RE.captures(rest) else {
            continue;
        };
        let Some(stamp) = caps.get(1) else { continue };
        let Ok(taken_at) = NaiveDateTime::parse_from_str(stamp.as_str(), STAMP_FORMAT) else {
            continue;
        };
        let sequence = caps
            .get(2)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0);
        entries.push(BackupEntry {
            path: entry.path(),
            taken_at,
            sequence,
        });
    }

    entries.sort_by(|a, b| (b.taken_at, b.sequence).cmp(&(a.taken_at, a.sequence)));
    Ok(entries)
}

/// Copies the newest backup of `path` back over it.
pub fn restore_latest(path: &Path, suffix: &str) -> Result<BackupEntry, BackupError> {
    let latest = list_backups(path, suffix)?
        .into_iter()
        .next()
        .ok_or_else(|| BackupError::NoBackups(path.to_path_buf()))?;
    fs::copy(&latest.path, path)?;
    tracing::info!(from = %latest.path.display(), "backup restored");
    Ok(latest)
}
