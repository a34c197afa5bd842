use account_service::{AccountServiceConfig, AccountsService};
use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Account Service CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Set the log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Commands
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the account service
    Start {
        /// Database URL
        #[arg(short, long)]
        database_url: Option<String>,

        /// Database pool size
        #[arg(short, long)]
        pool_size: Option<u32>,

        /// Base URL of the external accounts service
        #[arg(short, long)]
        external_url: Option<String>,
    },
    /// Pull accounts from the external accounts service once and exit
    Fetch {
        /// Base URL of the external accounts service
        #[arg(short, long)]
        external_url: Option<String>,
    },
}

fn load_config(database_url: Option<String>, pool_size: Option<u32>, external_url: Option<String>) -> AccountServiceConfig {
    let config = match database_url {
        Some(url) => AccountServiceConfig::new(url, pool_size.unwrap_or(5)),
        None => AccountServiceConfig::from_env(),
    };
    match external_url {
        Some(url) => config.with_external_accounts_url(url),
        None => config,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!("account_service={}", cli.log_level)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Start { database_url, pool_size, external_url } => {
            let config = load_config(database_url, pool_size, external_url);

            // Print config (except database URL)
            info!(
                "Starting account service with database pool size: {}, external service: {}",
                config.db_pool_size,
                config.external_accounts_url.as_deref().unwrap_or("none")
            );

            let _service = AccountsService::with_config(&config).await?;

            info!("Account service started. Press Ctrl+C to stop.");
            match signal::ctrl_c().await {
                Ok(()) => info!("Shutting down account service..."),
                Err(err) => error!("Error waiting for Ctrl+C: {}", err),
            }
        }
        Commands::Fetch { external_url } => {
            let config = load_config(None, None, external_url);
            let service = AccountsService::with_config(&config).await?;
            service.fetch_accounts_from_another_service().await?;
        }
    }

    Ok(())
}
