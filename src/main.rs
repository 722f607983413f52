use clap::Parser;
use dotenv::dotenv;
use risk_suite::cli::{AnalyzeCliConfig, Cli, Commands};
use risk_suite::commands::{run_analyze, run_validate_config};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose when set
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.verbose))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Analyze {
            config,
            data_dir,
            synthetic,
            synthetic_years,
            seed,
            end_date,
            output_dir,
            parallel,
        } => {
            let config = AnalyzeCliConfig::from_args(
                &config,
                data_dir.as_deref(),
                synthetic,
                synthetic_years,
                seed,
                end_date.as_deref(),
                &output_dir,
                parallel,
            )?;
            run_analyze(config).await?;
        }
        Commands::ValidateConfig { config } => {
            run_validate_config(&config)?;
        }
    }

    Ok(())
}
