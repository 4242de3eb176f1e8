//! Command-line and environment configuration

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Pathology lab cart
#[derive(Debug, Parser)]
#[command(name = "pathlab-cart", about = "Pathology lab test and package cart", long_about = None)]
pub(crate) struct CliConfig {
    /// Catalog, storage and session settings.
    #[command(flatten)]
    pub store: StoreConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// What to do with the cart.
    #[command(subcommand)]
    pub command: Command,
}

/// Where the catalog and the persisted cart live.
#[derive(Debug, Args)]
pub(crate) struct StoreConfig {
    /// YAML catalog of tests and packages
    #[arg(long, env = "PATHLAB_CATALOG", default_value = "catalog.yml")]
    pub catalog: PathBuf,

    /// Directory the cart is persisted in
    #[arg(long, env = "PATHLAB_STORE_DIR", default_value = ".pathlab")]
    pub store_dir: PathBuf,

    /// ISO currency code used when printing prices
    #[arg(long, env = "PATHLAB_CURRENCY", default_value = "INR")]
    pub currency: String,

    /// Logged-in patient id; omit to act anonymously
    #[arg(long, env = "PATHLAB_PATIENT")]
    pub patient: Option<String>,
}

/// Log output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Args)]
pub(crate) struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "warn")]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

/// Cart commands
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub(crate) enum Command {
    /// Add a single test by catalog id
    AddTest {
        /// Test id
        id: String,
    },

    /// Add a health package by catalog id
    AddPackage {
        /// Package id
        id: String,
    },

    /// Remove a line item by id
    Remove {
        /// Test or package id
        id: String,
    },

    /// Empty the cart
    Clear,

    /// Print the cart and its totals
    Show,

    /// Print the de-duplicated test ids the cart stands for
    TestIds,

    /// Print the booking request for the logged-in patient
    Checkout,
}
