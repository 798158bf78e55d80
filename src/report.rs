use crate::app::Outcome;
use crate::backup::BackupEntry;
use crate::rules::Fix;
use crate::transforms::EditKind;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub path: PathBuf,
    pub profile: String,
    pub dry_run: bool,
    pub backup: Option<PathBuf>,
    pub fixes: Vec<Fix>,
    pub changed: bool,
    pub written: bool,
    pub added: usize,
    pub removed: usize,
    pub echoed: Vec<EchoLine>,
    pub diff: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EchoLine {
    pub line: usize,
    pub text: String,
}

/// Lines of `text` containing `pattern`, numbered from 1.
pub fn echo_lines(text: &str, pattern: &str) -> Vec<EchoLine> {
    if pattern.is_empty() {
        return Vec::new();
    }
    text.lines()
        .enumerate()
        .filter(|(_, line)| line.contains(pattern))
        .map(|(idx, line)| EchoLine {
            line: idx + 1,
            text: line.to_string(),
        })
        .collect()
}

#[derive(Serialize)]
struct BackupListing<'a> {
    path: &'a Path,
    backups: &'a [BackupEntry],
}

#[derive(Serialize)]
struct Restored<'a> {
    path: &'a Path,
    restored_from: &'a Path,
}

pub fn render(outcome: &Outcome, json: bool, show_diff: bool) -> Result<String, serde_json::Error> {
    if json {
        let mut out = match outcome {
            Outcome::Patched(report) => serde_json::to_string_pretty(report)?,
            Outcome::Backups { path, entries } => serde_json::to_string_pretty(&BackupListing {
                path,
                backups: entries,
            })?,
            Outcome::Restored { path, entry } => serde_json::to_string_pretty(&Restored {
                path,
                restored_from: &entry.path,
            })?,
        };
        out.push('\n');
        return Ok(out);
    }

    Ok(match outcome {
        Outcome::Patched(report) => render_text(report, show_diff || report.dry_run),
        Outcome::Backups { path, entries } => render_backups(path, entries),
        Outcome::Restored { path, entry } => format!(
            "[OK] Restored {} from {}\n",
            path.display(),
            entry.path.display()
        ),
    })
}

pub fn render_text(report: &Report, show_diff: bool) -> String {
    let mut out = String::new();
    if let Some(backup) = &report.backup {
        let _ = writeln!(out, "[OK] Backup created: {}", backup.display());
    }

    for fix in &report.fixes {
        match fix.edit.kind {
            EditKind::Replaced => {
                let _ = writeln!(out, "[FIX] L{}: ({})", fix.edit.line, fix.rule_name);
                if let Some(old) = &fix.edit.old {
                    let _ = writeln!(out, "  OLD: {}", old.trim_end());
                }
                let _ = writeln!(out, "  NEW: {}", fix.edit.new.trim_end());
            }
            EditKind::Inserted => {
                let _ = writeln!(
                    out,
                    "[INFO] Added '{}' in {} (L{})",
                    fix.edit.new.trim(),
                    fix.rule_name,
                    fix.edit.line
                );
            }
        }
    }

    let path = report.path.display();
    if report.dry_run && report.changed {
        let _ = writeln!(
            out,
            "[DRY] {path} would be updated (+{} -{} lines)",
            report.added, report.removed
        );
    } else if report.changed {
        let _ = writeln!(
            out,
            "[OK] {path} updated (+{} -{} lines)",
            report.added, report.removed
        );
    } else {
        let _ = writeln!(out, "[INFO] No changes (already correct)");
    }

    for echo in &report.echoed {
        let _ = writeln!(out, "L{}: {}", echo.line, echo.text);
    }

    if show_diff && !report.diff.is_empty() {
        out.push_str(&report.diff);
    }
    out
}

fn render_backups(path: &Path, entries: &[BackupEntry]) -> String {
    if entries.is_empty() {
        return format!("[INFO] No backups for {}\n", path.display());
    }
    let mut out = String::new();
    for entry in entries {
        let _ = writeln!(
            out,
            "{}  {}",
            entry.taken_at.format("%Y-%m-%d %H:%M:%S"),
            entry.path.display()
        );
    }
    out
}
