use clap::Parser;
use oddsflow::cli::{Cli, Commands};
use oddsflow::config::Config;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
        eprintln!("Using default configuration");
        Config::default()
    });

    // Initialize telemetry
    oddsflow::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Analyze(args) => {
            tracing::debug!(input = %args.input, "analyzing payload");
            args.execute(config)?;
        }
        Commands::Resolve(args) => {
            tracing::debug!(match_key = %args.match_key, "resolving match outcome");
            args.execute(config)?;
        }
        Commands::Signals(args) => {
            args.execute(config)?;
        }
        Commands::Cases(args) => {
            args.execute(config)?;
        }
        Commands::Config => {
            println!("Current configuration:");
            println!("  Storage: enabled={} dir={:?}", config.storage.enabled, config.storage.data_dir);
            println!("  Model: trials={} blend={}/{}/{}",
                config.model.sim_trials,
                config.model.blend_sim,
                config.model.blend_tpo,
                config.model.blend_market
            );
            println!(
                "  Classifier: smart>={} mixed>={}",
                config.classifier.smart_threshold, config.classifier.mixed_threshold
            );
            println!("  Signals: default_alpha={}", config.signals.default_alpha);
            println!("  Log level: {}", config.telemetry.log_level);
        }
    }

    Ok(())
}
