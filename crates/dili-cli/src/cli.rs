//! CLI argument definitions for `dili`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use dili_core::DEFAULT_WINDOW_DAYS;
use dili_ingest::{DEFAULT_DAY_COLUMN, DEFAULT_NAME_COLUMN, DEFAULT_PATIENT_COLUMN};

#[derive(Parser)]
#[command(
    name = "dili",
    version,
    about = "Review hepatotoxic drug exposure around immune checkpoint inhibitor therapy",
    long_about = "Classify a patient's drugs against a hepatotoxicity reference,\n\
                  report daily and rolling toxic-drug ratios, and score Naranjo\n\
                  causality from a reasoning reply."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow patient ids and drug names in log output.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// List patients with row counts and day span.
    Patients(PatientsArgs),

    /// Split drugs into hepatotoxic and safe.
    Classify(ClassifyArgs),

    /// Daily and rolling toxic-drug ratios for one patient.
    Ratios(RatiosArgs),

    /// Build the Naranjo context for one patient and score a reasoning reply.
    Naranjo(NaranjoArgs),

    /// Check and sanitize a literature search query.
    Query(QueryArgs),
}

/// Options shared by every command that reads an exposure file.
#[derive(Args)]
pub struct ExposureArgs {
    /// Drug exposure export (tab, comma, or space separated).
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Field delimiter (detected from content when omitted).
    #[arg(long = "delimiter", value_enum)]
    pub delimiter: Option<DelimiterArg>,

    #[arg(long = "patient-column", default_value = DEFAULT_PATIENT_COLUMN)]
    pub patient_column: String,

    #[arg(long = "name-column", default_value = DEFAULT_NAME_COLUMN)]
    pub name_column: String,

    /// Column holding the study day.
    #[arg(long = "day-column", default_value = DEFAULT_DAY_COLUMN, conflicts_with = "derive_days")]
    pub day_column: String,

    /// Derive study days from index_date and new_drug_exposure_date.
    #[arg(long = "derive-days")]
    pub derive_days: bool,

    /// Added to every day value (use 1 for zero-based day columns).
    #[arg(long = "day-offset", default_value_t = 0, allow_hyphen_values = true)]
    pub day_offset: i64,
}

/// Reference list options.
#[derive(Args)]
pub struct ReferenceArgs {
    /// Hepatotoxicity reference with cdm_id and ingredient columns.
    #[arg(long = "toxic-list", value_name = "CSV")]
    pub toxic_list: PathBuf,

    /// Replace the built-in checkpoint inhibitor list (cdm_id and/or name columns).
    #[arg(long = "ici-list", value_name = "CSV")]
    pub ici_list: Option<PathBuf>,

    /// Extra ingredient value treated as a broken reference entry.
    #[arg(long = "invalid-marker", value_name = "TEXT")]
    pub invalid_markers: Vec<String>,
}

#[derive(Args)]
pub struct PatientsArgs {
    #[command(flatten)]
    pub exposure: ExposureArgs,

    /// Print JSON instead of a table.
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Args)]
pub struct ClassifyArgs {
    #[command(flatten)]
    pub exposure: ExposureArgs,

    #[command(flatten)]
    pub reference: ReferenceArgs,

    /// Classify only this patient's drugs (all rows otherwise).
    #[arg(long = "patient", value_name = "ID")]
    pub patient: Option<String>,

    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Args)]
pub struct RatiosArgs {
    #[command(flatten)]
    pub exposure: ExposureArgs,

    #[command(flatten)]
    pub reference: ReferenceArgs,

    /// Explicit safe list; without it every non-toxic drug counts as safe.
    #[arg(long = "safe-list", value_name = "CSV")]
    pub safe_list: Option<PathBuf>,

    #[arg(long = "patient", value_name = "ID")]
    pub patient: String,

    /// First day to report (default: first exposure day, at least 1).
    #[arg(long = "from", value_name = "DAY")]
    pub from: Option<i64>,

    /// Last day to report (default: last exposure day).
    #[arg(long = "to", value_name = "DAY")]
    pub to: Option<i64>,

    /// Rolling window length in days.
    #[arg(long = "window", default_value_t = DEFAULT_WINDOW_DAYS, value_parser = clap::value_parser!(i64).range(1..))]
    pub window: i64,

    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Args)]
pub struct NaranjoArgs {
    #[command(flatten)]
    pub exposure: ExposureArgs,

    #[command(flatten)]
    pub reference: ReferenceArgs,

    #[arg(long = "patient", value_name = "ID")]
    pub patient: String,

    /// Saved reasoning reply to score. Prints the context JSON when omitted.
    #[arg(long = "reply", value_name = "FILE")]
    pub reply: Option<PathBuf>,

    /// Seconds to wait for the reply before giving up.
    #[arg(long = "timeout", value_name = "SECS", default_value_t = 120)]
    pub timeout: u64,

    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Args)]
pub struct QueryArgs {
    /// Free-text search terms.
    #[arg(value_name = "TEXT")]
    pub text: String,

    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum DelimiterArg {
    Tab,
    Comma,
    Space,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
