//! Analyze command implementation

use std::fs;
use std::io::Read;

use clap::Args;

use crate::analyzer::{Analyzer, MatchPayload};
use crate::config::Config;

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Payload JSON file, or '-' to read from stdin
    #[arg(default_value = "-")]
    pub input: String,

    /// Compact single-line JSON output
    #[arg(long)]
    pub compact: bool,
}

impl AnalyzeArgs {
    pub fn execute(&self, config: Config) -> anyhow::Result<()> {
        let raw = if self.input == "-" {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        } else {
            fs::read_to_string(&self.input)?
        };
        let value: serde_json::Value = serde_json::from_str(&raw)?;
        let payload = MatchPayload::from_value(value)?;

        let analyzer = Analyzer::from_config(config);
        let result = analyzer.analyze(&payload)?;

        let rendered = if self.compact {
            serde_json::to_string(&result)?
        } else {
            serde_json::to_string_pretty(&result)?
        };
        println!("{rendered}");
        Ok(())
    }
}
