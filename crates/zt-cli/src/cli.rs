//! CLI argument definitions for the schema playground.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "zod-tester",
    version,
    about = "Validate JSON against a schema written for any published zod version",
    long_about = "Validate JSON against a schema written for any published zod version.\n\n\
                  Schemas are written exactly as in a source file, using `z` or `zod`.\n\
                  Sessions can be shared as a compact query string."
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

    /// Log output format (pretty for human, json for machine parsing).
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

    /// Settings file to use instead of the platform default.
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the library versions offered for selection.
    Versions(VersionsArgs),

    /// Validate JSON against a schema.
    Validate(ValidateArgs),

    /// Print the type declarations of a version.
    Declarations(VersionArg),

    /// Validate, then print a query string that restores the session.
    Share(ShareArgs),

    /// Restore a shared session and validate it again.
    Open(OpenArgs),

    /// Show or initialize the settings file.
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct VersionArg {
    /// Library version (default: the registry's latest, else the fallback).
    #[arg(long = "version", short = 'V', value_name = "VERSION")]
    pub version: Option<String>,
}

#[derive(Args)]
pub struct VersionsArgs {
    /// Ignore the cached listing and ask the registry again.
    #[arg(long = "refresh")]
    pub refresh: bool,
}

#[derive(Args)]
pub struct InputArgs {
    /// File with the schema source (`-` for stdin).
    #[arg(long = "schema", short = 's', value_name = "FILE", conflicts_with = "schema_text")]
    pub schema: Option<PathBuf>,

    /// Schema source given inline.
    #[arg(long = "schema-text", value_name = "SOURCE")]
    pub schema_text: Option<String>,

    /// File with the JSON to validate (`-` for stdin).
    #[arg(long = "json", short = 'j', value_name = "FILE", conflicts_with = "json_text")]
    pub json: Option<PathBuf>,

    /// JSON given inline.
    #[arg(long = "json-text", value_name = "JSON")]
    pub json_text: Option<String>,
}

#[derive(Args)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub version: VersionArg,

    #[command(flatten)]
    pub input: InputArgs,

    /// How to print the result.
    #[arg(long = "output", value_enum, default_value = "text")]
    pub output: OutputArg,
}

#[derive(Args)]
pub struct ShareArgs {
    #[command(flatten)]
    pub version: VersionArg,

    #[command(flatten)]
    pub input: InputArgs,

    /// Page URL to prepend to the query string.
    #[arg(long = "base-url", value_name = "URL")]
    pub base_url: Option<String>,
}

#[derive(Args)]
pub struct OpenArgs {
    /// Shared link or bare query string.
    #[arg(value_name = "LINK")]
    pub link: String,

    /// Replacements for the restored schema or JSON.
    #[command(flatten)]
    pub input: InputArgs,

    /// Print the restored texts without validating.
    #[arg(long = "no-validate")]
    pub no_validate: bool,
}

#[derive(Args)]
pub struct ConfigArgs {
    /// Write the default settings file if none exists.
    #[arg(long = "init")]
    pub init: bool,
}

/// Result output choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum OutputArg {
    Text,
    Json,
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
