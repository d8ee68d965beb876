//! CLI interface for oddsflow
//!
//! Provides subcommands for:
//! - `analyze`: Analyze one match payload (file or stdin)
//! - `resolve`: Feed a final result back into the pattern memory
//! - `signals`: Show the smoothed adaptive signals
//! - `cases`: Show recent analyzed match cases
//! - `config`: Show the effective configuration

mod analyze;
mod cases;
mod resolve;
mod signals;

pub use analyze::AnalyzeArgs;
pub use cases::CasesArgs;
pub use resolve::ResolveArgs;
pub use signals::SignalsArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "oddsflow")]
#[command(about = "Pre-match betting market analyzer: odds movement, smart money, fair prices")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze one match payload (file path or '-' for stdin)
    Analyze(AnalyzeArgs),
    /// Record the real outcome for a previously analyzed match
    Resolve(ResolveArgs),
    /// Show the smoothed adaptive signals
    Signals(SignalsArgs),
    /// Show recent analyzed match cases
    Cases(CasesArgs),
    /// Show the effective configuration
    Config,
}
