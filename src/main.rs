use clap::Parser;
use vin_profile::utils::error::{ErrorSeverity, ServiceError};
use vin_profile::utils::{logger, validation::Validate};
use vin_profile::{AppState, Aggregator, CliConfig, Command, ServiceConfig};

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting vin-profile");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    if let Err(e) = run(cli).await {
        tracing::error!(
            "Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("{}", e.user_friendly_message());
        eprintln!("Suggestion: {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 4,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        std::process::exit(exit_code);
    }
}

async fn run(cli: CliConfig) -> Result<(), ServiceError> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from {}", path);
            ServiceConfig::from_file(path)?
        }
        None => ServiceConfig::default(),
    };
    if let Command::Serve { bind: Some(bind) } = &cli.command {
        config.server.bind = bind.clone();
    }
    config.validate()?;

    let aggregator = Aggregator::from_config(&config)?;

    match cli.command {
        Command::Serve { .. } => {
            let addr = vin_profile::utils::validation::validate_socket_addr(
                "server.bind",
                &config.server.bind,
            )?;
            vin_profile::api::serve(AppState::new(aggregator), addr).await?;
        }
        Command::Profile { vin } => {
            let report = aggregator.aggregate(&vin).await?;
            for (provider, failure) in &report.failures {
                tracing::warn!(provider = %provider, kind = failure.kind(), "Provider skipped: {}", failure);
            }
            println!("{}", serde_json::to_string_pretty(&report.profile)?);
        }
        Command::Summary { vin } => {
            println!("{}", aggregator.get_car_summary(&vin).await?);
        }
    }

    Ok(())
}
