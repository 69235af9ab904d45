use std::path::PathBuf;

use clap::Parser;

use crate::models::Disposition;

#[derive(Parser, Debug)]
#[command(
    name = "inventory-checkr",
    about = "Normalize software inventory exports into a canonical catalog",
    version
)]
pub struct Cli {
    /// Inventory files (.json or .csv) or directories containing them
    #[arg(required_unless_present_any = ["check_rules", "set_disposition", "explain"])]
    pub inputs: Vec<PathBuf>,

    /// Config file [default: ./.inventory-checkr/config.toml, fallback ~/.config/inventory-checkr/config.toml]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// TOML rules file, overrides the config and the built-in rules
    #[arg(long, value_name = "FILE")]
    pub rules: Option<PathBuf>,

    /// JSON disposition store, overrides the config
    #[arg(long, value_name = "FILE")]
    pub dispositions: Option<PathBuf>,

    /// Report format
    #[arg(long, default_value = "terminal", value_name = "FORMAT")]
    pub report: ReportFormat,

    /// Validate the rule set and report rules with invalid patterns
    #[arg(long)]
    pub check_rules: bool,

    /// Show which rules match a software name and which one wins (repeatable)
    #[arg(long, value_name = "NAME")]
    pub explain: Vec<String>,

    /// Record an administrative decision, e.g. `--set-disposition "WinZip=replace"` (repeatable)
    #[arg(long, value_name = "NAME=DISPOSITION", value_parser = parse_disposition_arg)]
    pub set_disposition: Vec<(String, Disposition)>,

    /// Exit with status 1 when any entry is left unmapped
    #[arg(long)]
    pub strict: bool,

    /// Show contributing entries and excluded rows
    #[arg(short, long)]
    pub verbose: bool,

    /// Only print summary line
    #[arg(short, long)]
    pub quiet: bool,

    /// Enable debug logging on stderr
    #[arg(long)]
    pub debug: bool,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum ReportFormat {
    Terminal,
    Json,
}

fn parse_disposition_arg(raw: &str) -> Result<(String, Disposition), String> {
    let (name, disposition) = raw
        .rsplit_once('=')
        .ok_or_else(|| format!("expected NAME=DISPOSITION, got '{raw}'"))?;
    let name = name.trim();
    let disposition = disposition.trim();
    if name.is_empty() || disposition.is_empty() {
        return Err(format!("expected NAME=DISPOSITION, got '{raw}'"));
    }
    Ok((name.to_string(), Disposition::from(disposition.to_string())))
}
