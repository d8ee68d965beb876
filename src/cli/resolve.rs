//! Resolve command implementation

use clap::Args;

use crate::analyzer::Analyzer;
use crate::config::Config;
use crate::market::Outcome;

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Match key as printed by `analyze` (e.g. `sevilla__valencia__20260307`)
    pub match_key: String,

    /// Final result: home, draw or away (also accepts 1/x/2)
    pub winner: Outcome,
}

impl ResolveArgs {
    pub fn execute(&self, config: Config) -> anyhow::Result<()> {
        let analyzer = Analyzer::from_config(config);
        match analyzer.resolve(&self.match_key, self.winner)? {
            Some(summary) => {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            }
            None => {
                anyhow::bail!("no stored case for match key '{}'", self.match_key);
            }
        }
        Ok(())
    }
}
