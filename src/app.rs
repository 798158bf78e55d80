use crate::backup::{self, BackupEntry, BackupError};
use crate::cli::Args;
use crate::config::{self, ConfigError, Profile, Settings, WritePolicy};
use crate::diff;
use crate::report::{self, Report};
use crate::rules::{self, RuleError};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Rule(#[from] RuleError),
    #[error(transparent)]
    Backup(#[from] BackupError),
    #[error("failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
}

impl AppError {
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::NotFound(_) => 1,
            _ => 2,
        }
    }
}

#[derive(Debug)]
pub enum Outcome {
    Patched(Report),
    Backups {
        path: PathBuf,
        entries: Vec<BackupEntry>,
    },
    Restored {
        path: PathBuf,
        entry: BackupEntry,
    },
}

pub fn run(args: &Args) -> Result<Outcome, AppError> {
    let (cfg, source) = config::load(args.config.as_deref())?;
    tracing::debug!(?source, profiles = cfg.profiles.len(), "config loaded");

    let path = args
        .path
        .clone()
        .unwrap_or_else(|| PathBuf::from(&cfg.settings.default_path));
    let suffix = cfg.settings.backup_suffix.as_str();

    if args.list_backups {
        let entries = backup::list_backups(&path, suffix)?;
        return Ok(Outcome::Backups { path, entries });
    }
    if args.restore {
        let entry = backup::restore_latest(&path, suffix)?;
        return Ok(Outcome::Restored { path, entry });
    }

    let profile_id = args
        .profile
        .as_deref()
        .unwrap_or(&cfg.settings.default_profile);
    let profile = cfg.profile(profile_id)?;
    patch_file(&path, profile, &cfg.settings, args.dry_run).map(Outcome::Patched)
}

/// Backs up `path`, applies the profile's rules and writes the result according to its policy.
pub fn patch_file(
    path: &Path,
    profile: &Profile,
    settings: &Settings,
    dry_run: bool,
) -> Result<Report, AppError> {
    if !path.is_file() {
        return Err(AppError::NotFound(path.to_path_buf()));
    }
    tracing::debug!(path = %path.display(), profile = %profile.id, dry_run, "patching");

    let backup = if dry_run {
        None
    } else {
        Some(backup::create_backup(path, &settings.backup_suffix)?)
    };

    let input = fs::read_to_string(path).map_err(|source| AppError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let patched = rules::apply_rules(&profile.rules, &input)?;
    let changed = patched.output != input;

    let written = !dry_run && (changed || profile.write == WritePolicy::Always);
    if written {
        fs::write(path, &patched.output).map_err(|source| AppError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), fixes = patched.fixes.len(), "file written");
    }

    let diff = diff::unified_diff(&input, &patched.output, &path.display().to_string());
    let (added, removed) = diff::line_stats(&input, &patched.output);

    Ok(Report {
        path: path.to_path_buf(),
        profile: profile.id.clone(),
        dry_run,
        backup,
        echoed: report::echo_lines(&patched.output, &settings.echo_pattern),
        fixes: patched.fixes,
        changed,
        written,
        added,
        removed,
        diff,
    })
}
