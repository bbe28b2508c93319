//! `emailverify` command line tool.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use clap::{Parser, Subcommand, ValueEnum};
use futures_util::{StreamExt, TryStreamExt};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use uuid::Uuid;

use emailverify_client::auth::TotpProvider;
use emailverify_client::config::{self, AuthMethod, ClientConfig};
use emailverify_client::credits::DailyUsageListOptions;
use emailverify_client::observability::logging;
use emailverify_client::validations::{
    EntryListOptions, FileValidationRequest, JobSettings, ValidationListOptions,
    ValidationRequest,
};
use emailverify_client::{CancellationSignal, Client, ClientError, ClientResult, WaitPolicy};

#[derive(Parser)]
#[command(name = "emailverify")]
#[command(about = "Command line client for the email verification service", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, env = "EMAILVERIFY_CONFIG")]
    config: Option<PathBuf>,

    /// Service base URL (repeatable); replaces the configured endpoints
    #[arg(short, long = "endpoint")]
    endpoints: Vec<String>,

    #[arg(short, long, env = "EMAILVERIFY_USERNAME")]
    username: Option<String>,

    #[arg(short, long, env = "EMAILVERIFY_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Authentication method; overrides the configuration
    #[arg(long, value_enum)]
    auth: Option<AuthArg>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum AuthArg {
    Basic,
    Bearer,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit addresses for validation
    Submit {
        addresses: Vec<String>,
        /// Job name
        #[arg(long)]
        name: Option<String>,
        /// Standard, High or Extreme
        #[arg(long)]
        quality: Option<String>,
        /// Return right after submission
        #[arg(long)]
        no_wait: bool,
    },
    /// Submit a file of addresses for validation
    SubmitFile {
        path: PathBuf,
        /// MIME type; guessed from the extension when omitted
        #[arg(long)]
        content_type: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        no_wait: bool,
    },
    /// Fetch a job with its entries
    Get {
        id: Uuid,
        #[arg(long)]
        no_wait: bool,
    },
    /// Fetch a job summary
    Overview {
        id: Uuid,
        #[arg(long)]
        no_wait: bool,
    },
    /// Delete a job
    Delete { id: Uuid },
    /// List jobs
    List {
        /// Stop after this many jobs
        #[arg(long, default_value_t = 100)]
        max: usize,
    },
    /// List the entries of a job
    Entries {
        id: Uuid,
        #[arg(long, default_value_t = 1000)]
        max: usize,
    },
    /// Show the credit balance
    Balance,
    /// Show daily credit usage
    Usage {
        /// YYYY-MM-DD
        #[arg(long)]
        since: Option<String>,
        /// YYYY-MM-DD
        #[arg(long)]
        until: Option<String>,
    },
}

/// Reads TOTP codes from standard input.
struct StdinTotpProvider;

#[async_trait]
impl TotpProvider for StdinTotpProvider {
    async fn provide_totp(&self) -> ClientResult<String> {
        eprint!("TOTP code: ");
        let mut line = String::new();
        BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await?;
        let code = line.trim().to_string();
        if code.is_empty() {
            return Err(ClientError::Authentication {
                reason: "no TOTP code entered".into(),
                problem: None,
            });
        }
        Ok(code)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    logging::init_logging(Some(&config.observability.log_level));
    tracing::debug!(
        endpoints = config.endpoints.len(),
        auth = ?config.auth.method,
        "Configuration loaded"
    );

    let client = Client::from_config(&config, Some(Arc::new(StdinTotpProvider)))?;

    let signal = CancellationSignal::new();
    let canceller = signal.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, canceling");
            canceller.cancel();
        }
    });

    run(&client, cli.command, &signal).await?;
    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<ClientConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => ClientConfig::default(),
    };
    config::loader::apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    if !cli.endpoints.is_empty() {
        config.endpoints = cli.endpoints.clone();
    }
    if let Some(username) = &cli.username {
        config.auth.username = Some(username.clone());
    }
    if let Some(password) = &cli.password {
        config.auth.password = Some(password.clone());
    }
    match cli.auth {
        Some(AuthArg::Basic) => config.auth.method = AuthMethod::Basic,
        Some(AuthArg::Bearer) => config.auth.method = AuthMethod::Bearer,
        None => {}
    }

    config::validate_config(&config).map_err(config::ConfigError::Validation)?;
    Ok(config)
}

async fn run(
    client: &Client,
    command: Commands,
    signal: &CancellationSignal,
) -> Result<(), Box<dyn std::error::Error>> {
    let validations = client.email_validations();
    let policy = |no_wait: bool| {
        if no_wait {
            WaitPolicy::NO_WAIT
        } else {
            client.wait_policy().clone().with_progress(|overview| {
                let percentage = overview.progress.as_ref().map(|p| p.percentage * 100.0);
                tracing::info!(job_id = %overview.id, ?percentage, "Job in progress");
            })
        }
    };

    match command {
        Commands::Submit {
            addresses,
            name,
            quality,
            no_wait,
        } => {
            let request = ValidationRequest::new(addresses).with_settings(JobSettings {
                name,
                quality,
                ..Default::default()
            });
            let job = validations
                .submit(&request, &policy(no_wait), Some(signal))
                .await?;
            print_json(&job)?;
        }
        Commands::SubmitFile {
            path,
            content_type,
            name,
            no_wait,
        } => {
            let content = tokio::fs::read(&path).await?;
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "input".to_string());
            let content_type = content_type.unwrap_or_else(|| guess_content_type(&path).into());
            let mut request = FileValidationRequest::new(content, file_name, content_type);
            request.settings.name = name;
            let job = validations
                .submit_file(&request, &policy(no_wait), Some(signal))
                .await?;
            print_json(&job)?;
        }
        Commands::Get { id, no_wait } => {
            let job = validations.get(id, &policy(no_wait), Some(signal)).await?;
            print_json(&job)?;
        }
        Commands::Overview { id, no_wait } => {
            let overview = validations
                .get_overview(id, &policy(no_wait), Some(signal))
                .await?;
            print_json(&overview)?;
        }
        Commands::Delete { id } => {
            validations.delete(id, Some(signal)).await?;
            eprintln!("Deleted {id}");
        }
        Commands::List { max } => {
            let jobs: Vec<_> = validations
                .list(&ValidationListOptions::default(), Some(signal))
                .take(max)
                .try_collect()
                .await?;
            print_json(&jobs)?;
        }
        Commands::Entries { id, max } => {
            let entries: Vec<_> = validations
                .list_entries(id, &EntryListOptions::default(), Some(signal))
                .take(max)
                .try_collect()
                .await?;
            print_json(&entries)?;
        }
        Commands::Balance => {
            let balance = client.credits().get_balance(Some(signal)).await?;
            print_json(&balance)?;
        }
        Commands::Usage { since, until } => {
            let options = DailyUsageListOptions {
                since,
                until,
                ..Default::default()
            };
            let usages: Vec<_> = client
                .credits()
                .list_daily_usages(&options, Some(signal))
                .try_collect()
                .await?;
            print_json(&usages)?;
        }
    }

    Ok(())
}

fn guess_content_type(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("csv") => "text/csv",
        Some("tsv") | Some("tab") => "text/tab-separated-values",
        Some("xls") => "application/vnd.ms-excel",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => "text/plain",
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
