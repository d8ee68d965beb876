//! Cases command implementation

use clap::Args;

use crate::config::Config;
use crate::store::{JsonFileStore, QueryOrder, RecordStore};

#[derive(Args, Debug)]
pub struct CasesArgs {
    /// Maximum number of cases to print
    #[arg(short, long, default_value_t = 10)]
    pub limit: usize,

    /// Only cases for this match key
    #[arg(short, long)]
    pub match_key: Option<String>,
}

impl CasesArgs {
    pub fn execute(&self, config: Config) -> anyhow::Result<()> {
        if !config.storage.enabled {
            anyhow::bail!("storage is disabled in the configuration");
        }
        let store = JsonFileStore::open(&config.storage.data_dir)?;
        let cases = match &self.match_key {
            Some(key) => {
                let filter = |r: &serde_json::Value| r["match_key"] == key.as_str();
                store.query("match_cases", Some(&filter), self.limit, QueryOrder::Newest)?
            }
            None => store.query("match_cases", None, self.limit, QueryOrder::Newest)?,
        };
        if cases.is_empty() {
            println!("no match cases recorded yet");
            return Ok(());
        }
        for case in cases {
            let key = case["match_key"].as_str().unwrap_or("?");
            let label = case["analysis"]["final_label"].as_str().unwrap_or("?");
            let confidence = case["analysis"]["confidence"].as_f64().unwrap_or(0.0);
            let at = case["at"].as_str().unwrap_or("?");
            println!("{at}  {key}  {label}  confidence={confidence:.2}");
        }
        Ok(())
    }
}
