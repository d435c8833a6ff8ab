use anyhow::Result;
use clap::Parser;
use dotenvy::dotenv;
use serde::Deserialize;

/// Command-line overrides for the environment configuration
#[derive(Debug, Parser)]
#[command(name = "invoice_dashboard", about = "Invoice dashboard for the terminal")]
pub struct Args {
    /// Database connection URL (overrides DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,
}

/// Configuration for the application
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// This function will:
    /// 1. Load variables from .env file if it exists
    /// 2. Deserialize environment variables into Config struct
    pub fn load() -> Result<Self> {
        // Load .env file if it exists
        dotenv().ok();

        // Parse environment variables into Config struct
        let config = envy::from_env::<Config>()?;

        Ok(config)
    }

    /// Get a direct reference to the database URL
    pub fn database_url(&self) -> &str {
        &self.database_url
    }
}

/// Load configuration, letting command-line arguments win over the
/// environment
pub fn init(args: &Args) -> Result<Config> {
    dotenv().ok();

    if let Some(url) = &args.database_url {
        return Ok(Config {
            database_url: url.clone(),
        });
    }

    Config::load()
}
