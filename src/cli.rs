use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "linefix", version)]
#[command(about = "Back up a source file, apply line fix-up rules and report what changed")]
pub struct Args {
    /// File to patch. Defaults to the configured path (src/App.jsx).
    pub path: Option<PathBuf>,

    /// Rule profile to apply (concat, template, regex or one from the config file).
    #[arg(long, short)]
    pub profile: Option<String>,

    /// Config file (TOML, or YAML for .yaml/.yml).
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Show the fixes and diff without backing up or writing")]
    pub dry_run: bool,

    #[arg(long, help = "Print the unified diff after the report")]
    pub diff: bool,

    #[arg(long, help = "Print the report as JSON")]
    pub json: bool,

    #[arg(long, short, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, conflicts_with = "restore", help = "List backups of the file, newest first")]
    pub list_backups: bool,

    #[arg(long, help = "Restore the newest backup over the file")]
    pub restore: bool,
}
