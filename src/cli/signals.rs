//! Signals command implementation

use clap::Args;

use crate::config::Config;
use crate::store::{JsonFileStore, QueryOrder, RecordStore};

#[derive(Args, Debug)]
pub struct SignalsArgs {
    /// Maximum number of signals to print
    #[arg(short, long, default_value_t = 50)]
    pub limit: usize,
}

impl SignalsArgs {
    pub fn execute(&self, config: Config) -> anyhow::Result<()> {
        if !config.storage.enabled {
            anyhow::bail!("storage is disabled in the configuration");
        }
        let store = JsonFileStore::open(&config.storage.data_dir)?;
        let signals = store.query("signals", None, self.limit, QueryOrder::Newest)?;
        if signals.is_empty() {
            println!("no signals recorded yet");
            return Ok(());
        }
        for signal in signals {
            println!("{}", serde_json::to_string(&signal)?);
        }
        Ok(())
    }
}
