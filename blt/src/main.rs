use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use log::{debug, error, info};
use std::{
    path::Path,
    sync::atomic::{AtomicUsize, Ordering},
};

use blt::{
    config::{defaults, ConfigValidator, ValidatedConfig},
    logger::{setup_logger, LogLevel, LoggerConfig},
    Blt, HttpLedgerClient, IssuedTransaction, TestResult, TransactionObserver,
};
use blt_common::config::VERSION;

/// BLT CLI configuration - wrapper for command line parsing
#[derive(Parser, Clone, Debug)]
#[command(name = "blt")]
#[command(about = "Ledger load tester - batches and chains of signed transactions")]
#[command(version = VERSION)]
pub struct CliConfig {
    /// Set log level
    #[clap(long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    /// Disable the log file
    #[clap(long)]
    disable_file_logging: bool,

    /// Disable the usage of colors in log
    #[clap(long)]
    disable_log_color: bool,

    /// Log filename
    #[clap(long, default_value_t = String::from(defaults::FILENAME_LOG))]
    filename_log: String,

    /// Logs directory
    #[clap(long, default_value_t = String::from(defaults::LOGS_PATH))]
    logs_path: String,

    /// Node connection protocol (http or https)
    #[clap(long, default_value_t = String::from(defaults::PROTOCOL))]
    protocol: String,

    /// Node host name or address
    #[clap(long)]
    host: Option<String>,

    /// Node port
    #[clap(long, default_value_t = String::new())]
    port: String,

    /// Path of the node API appended to the root url
    #[clap(long, default_value_t = String::from(defaults::API_PATH))]
    api_path: String,

    /// Application id sent to the node
    #[clap(long, default_value_t = String::new())]
    app_id: String,

    /// Application key sent to the node
    #[clap(long, default_value_t = String::new())]
    app_key: String,

    /// Advanced: Request timeout in seconds
    #[clap(long, default_value_t = defaults::REQUEST_TIMEOUT_SECS)]
    request_timeout_secs: u64,

    /// Advanced: Connection timeout in seconds
    #[clap(long, default_value_t = defaults::CONNECTION_TIMEOUT_SECS)]
    connection_timeout_secs: u64,

    /// Enable strict configuration validation
    #[clap(long)]
    strict_validation: bool,

    /// Disable auto-fix of configuration issues
    #[clap(long)]
    no_auto_fix: bool,

    /// JSON File to load the configuration from
    #[clap(long)]
    config_file: Option<String>,

    /// Generate the template at the `config_file` path
    #[clap(long)]
    generate_config_template: bool,

    #[command(subcommand)]
    command: Option<BltCommand>,
}

#[derive(Subcommand, Clone, Debug)]
enum BltCommand {
    /// Print the metadata of the node
    Info,
    /// Submit independent creations concurrently
    Batch(RunArgs),
    /// Create one asset and transfer it sequentially
    Chain(RunArgs),
}

#[derive(clap::Args, Clone, Debug)]
struct RunArgs {
    /// Test identifier, also the seed of the signing key
    #[clap(long)]
    test_id: String,

    /// Number of transactions to issue
    #[clap(long)]
    count: usize,

    /// Write the test result as JSON to this file
    #[clap(long)]
    output: Option<String>,
}

impl CliConfig {
    /// Convert CLI configuration to ValidatedConfig
    pub fn to_validated_config(&self) -> ValidatedConfig {
        ValidatedConfig {
            log_level: self.log_level,
            disable_file_logging: self.disable_file_logging,
            disable_log_color: self.disable_log_color,
            filename_log: self.filename_log.clone(),
            logs_path: self.logs_path.clone(),
            protocol: self.protocol.clone(),
            host: self.host.clone(),
            port: self.port.clone(),
            api_path: self.api_path.clone(),
            app_id: self.app_id.clone(),
            app_key: self.app_key.clone(),
            request_timeout_secs: self.request_timeout_secs,
            connection_timeout_secs: self.connection_timeout_secs,
            auto_fix_config: !self.no_auto_fix,
            strict_validation: self.strict_validation,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_config = CliConfig::parse();

    // Handle config template generation
    if let Some(path) = cli_config.config_file.as_ref() {
        if cli_config.generate_config_template {
            if Path::new(path).exists() {
                eprintln!("Config file already exists at {path}");
                eprintln!("Use a different path or remove the existing file");
                return Ok(());
            }

            ValidatedConfig::generate_template(path)?;
            println!("Configuration template generated at {path}");
            println!("Edit the file and run the application with --config-file {path}");
            return Ok(());
        }
    }

    let command = cli_config
        .command
        .clone()
        .ok_or_else(|| anyhow!("No command given, expected one of: info, batch, chain"))?;

    // Load and validate configuration
    let config = if let Some(config_path) = &cli_config.config_file {
        println!("Loading configuration from: {config_path}");
        ValidatedConfig::from_file(
            config_path,
            cli_config.strict_validation,
            !cli_config.no_auto_fix,
        )?
    } else {
        let mut config = cli_config.to_validated_config();
        let validator = ConfigValidator::new(config.strict_validation, config.auto_fix_config);
        let messages = validator.validate(&mut config)?;

        if !messages.is_empty() {
            println!(
                "Configuration validation completed with {} message(s)",
                messages.len()
            );
        }

        config
    };

    setup_logger(&LoggerConfig {
        level: config.log_level,
        disable_colors: config.disable_log_color,
        disable_file_logging: config.disable_file_logging,
        logs_path: &config.logs_path,
        filename_log: &config.filename_log,
    })?;

    if log::log_enabled!(log::Level::Info) {
        info!("BLT v{} starting...", VERSION);
    }

    let connection = config.to_connection_config();
    info!("Node api: {}", connection.api_url());

    match command {
        BltCommand::Info => {
            let client = HttpLedgerClient::with_config(&connection, config.to_client_config())?;
            let node = client.get_node_info().await?;
            println!("{}", serde_json::to_string_pretty(&node)?);
        }
        BltCommand::Batch(args) => {
            let blt = Blt::with_client_config(&connection, config.to_client_config())?;
            let confirmed = AtomicUsize::new(0);
            let observer = progress_observer(&confirmed, args.count);
            let result = blt
                .run_create_batch(&args.test_id, args.count, Some(&observer as &dyn TransactionObserver))
                .await
                .inspect_err(|e| error!("Batch '{}' failed: {}", args.test_id, e))?;
            report(&result, args.output.as_deref())?;
        }
        BltCommand::Chain(args) => {
            let blt = Blt::with_client_config(&connection, config.to_client_config())?;
            let confirmed = AtomicUsize::new(0);
            let observer = progress_observer(&confirmed, args.count);
            let result = blt
                .run_transfer_chain(&args.test_id, args.count, Some(&observer as &dyn TransactionObserver))
                .await
                .inspect_err(|e| error!("Chain '{}' failed: {}", args.test_id, e))?;
            report(&result, args.output.as_deref())?;
        }
    }

    Ok(())
}

// Logs each confirmation and a progress line every tenth of the run
fn progress_observer(
    confirmed: &AtomicUsize,
    total: usize,
) -> impl Fn(&IssuedTransaction<'_>) + Send + Sync + '_ {
    let step = (total / 10).max(1);
    move |issued: &IssuedTransaction<'_>| {
        let done = confirmed.fetch_add(1, Ordering::Relaxed) + 1;
        if log::log_enabled!(log::Level::Debug) {
            debug!(
                "Confirmed {} (index {}) for '{}'",
                issued.confirmation.id, issued.sequence_index, issued.test_id
            );
        }
        if done % step == 0 || done == total {
            info!("Progress: {}/{} transactions confirmed", done, total);
        }
    }
}

fn report(result: &TestResult, output: Option<&str>) -> Result<()> {
    result.print_summary();
    if let Some(path) = output {
        result.save_to_file(path)?;
    }
    Ok(())
}
