//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Schemaflow - declarative, dialect-aware schema migrations
#[derive(Parser, Debug)]
#[command(name = "sf")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Override target (database connection); falls back to SF_TARGET
    #[arg(short, long, global = true)]
    pub target: Option<String>,

    /// Override SQL dialect (sqlite, mysql, duckdb)
    #[arg(short, long, global = true)]
    pub dialect: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply pending migrations
    Migrate(MigrateArgs),

    /// Show the status of every migration step
    Status(StatusArgs),

    /// Print the SQL each step renders to, without a database
    Render(RenderArgs),

    /// Print the migration log
    Log(LogArgs),

    /// Check config and catalog, and parse every rendered statement
    Validate(ValidateArgs),
}

/// Arguments for the migrate command
#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Print the SQL of pending steps instead of executing it
    #[arg(long)]
    pub dry_run: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: MigrateOutput,
}

/// Migrate output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrateOutput {
    /// Human-readable progress
    Text,
    /// JSON run report
    Json,
}

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Only show steps that are not yet applied
    #[arg(long)]
    pub pending: bool,
}

/// Arguments for the render command
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Render a single step by name
    #[arg(short, long)]
    pub step: Option<String>,
}

/// Arguments for the log command
#[derive(Args, Debug)]
pub struct LogArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: LogOutput,

    /// Only show failed attempts
    #[arg(long)]
    pub failed: bool,
}

/// Log output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    /// Table format
    Table,
    /// JSON output
    Json,
}

/// Arguments for the validate command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Render and parse for every known dialect, not just the active one
    #[arg(long)]
    pub all_dialects: bool,

    /// Treat warnings as errors
    #[arg(long)]
    pub strict: bool,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
