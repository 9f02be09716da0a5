use std::error::Error;

use netflix_rating_exporter::app::App;
use netflix_rating_exporter::cli::CliArgs;
use netflix_rating_exporter::config::AppConfig;
use netflix_rating_exporter::shutdown;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Parse CLI arguments
    let cli_args = CliArgs::parse_args();

    // Validate CLI arguments
    cli_args.validate()?;

    // Initialize logging with CLI log level
    let log_level = match cli_args.log_level.as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .init();

    tracing::info!("Starting Netflix rating history exporter");

    // Setup shutdown handling
    let shutdown_handle = shutdown::install().await?;

    // Load configuration with CLI overrides
    let config = AppConfig::load_with_cli_args(&cli_args)?;

    // Create the application
    let mut app = App::new(config, &cli_args);

    // Run the application with shutdown handling
    tokio::select! {
        result = app.run() => {
            match result {
                Ok(()) => tracing::info!("Export completed successfully"),
                Err(e) => {
                    tracing::error!("Application error: {}", e);
                    return Err(e.into());
                }
            }
        }
        _ = shutdown_handle.wait_for_shutdown() => {
            tracing::info!("Application shutdown requested");
        }
    }

    Ok(())
}
