//! Backlog Pilot CLI - picks the next work items from an Azure DevOps backlog.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use pilot_azure_devops::AzureDevOpsClient;
use pilot_core::Config;
use pilot_mcp::protocol::ToolCallResult;
use pilot_mcp::{McpServer, ToolHandler};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "backlog-pilot")]
#[command(author, version, about = "Backlog Pilot - next work items from Azure DevOps", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the MCP server on stdin/stdout
    Serve,

    /// Print the next work items to do
    Next {
        /// Maximum number of items (default: backlog.default_limit)
        #[arg(short, long, allow_negative_numbers = true)]
        limit: Option<i64>,

        /// Take items as ranked, without replacing parents by their children
        #[arg(long)]
        direct: bool,
    },

    /// Print specific work items
    Show {
        /// Work item ids
        #[arg(required = true)]
        ids: Vec<u64>,
    },

    /// Show the effective configuration and check the connection
    Status,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Print the config file path
    Path,

    /// Get a value by key (e.g. backlog.default_limit)
    Get { key: String },

    /// Set a value by key (e.g. azure_devops.org_url)
    Set { key: String, value: String },

    /// Write a config file with defaults
    Init {
        /// Organization URL including the project
        #[arg(long)]
        org_url: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Logs go to stderr, stdout carries reports and the MCP stream
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let path = match cli.config {
        Some(path) => path,
        None => Config::config_path()?,
    };

    match cli.command {
        Some(Commands::Serve) => {
            let config = Config::load_with_path(&path)?;
            let mut server = McpServer::new(ToolHandler::from_config(&config));
            server.run().await?;
        }
        Some(Commands::Next { limit, direct }) => {
            let config = Config::load_with_path(&path)?;
            let handler = ToolHandler::from_config(&config);
            let prioritize_parents = if direct { Some(false) } else { None };
            return Ok(print_result(
                handler.burndown(limit, prioritize_parents).await,
            ));
        }
        Some(Commands::Show { ids }) => {
            let config = Config::load_with_path(&path)?;
            let handler = ToolHandler::from_config(&config);
            return Ok(print_result(handler.work_items(&ids).await));
        }
        Some(Commands::Status) => {
            let config = Config::load_with_path(&path)?;
            return status(&config, &path).await;
        }
        Some(Commands::Config { command }) => config_command(command, &path)?,
        None => {
            println!("Backlog Pilot - next work items from Azure DevOps");
            println!("Run with --help for usage information");
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn print_result(result: ToolCallResult) -> ExitCode {
    if result.is_error() {
        eprintln!("{}", result.text_content());
        ExitCode::FAILURE
    } else {
        print!("{}", result.text_content());
        ExitCode::SUCCESS
    }
}

async fn status(config: &Config, path: &Path) -> anyhow::Result<ExitCode> {
    println!("Config file: {}", path.display());
    println!(
        "Default limit: {} (prioritize parents: {})",
        config.backlog.default_limit, config.backlog.prioritize_parents
    );

    let client = match config
        .azure_devops()
        .and_then(AzureDevOpsClient::from_config)
    {
        Ok(client) => client,
        Err(e) => {
            println!("Azure DevOps: not ready");
            eprintln!("{}", pilot_core::report::render_error(&e));
            return Ok(ExitCode::FAILURE);
        }
    };

    println!("Organization: {}", client.scope().org_base());
    println!("Project: {}", client.scope().project());

    match client.check_connection().await {
        Ok(()) => {
            println!("Connection: ok");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            println!("Connection: failed");
            eprintln!("{}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn config_command(command: ConfigCommands, path: &Path) -> anyhow::Result<()> {
    match command {
        ConfigCommands::Show => {
            let config = Config::load_with_path(path)?;
            let rendered = config.to_toml().context("Failed to render configuration")?;
            println!("# {}", path.display());
            print!("{}", rendered);
            let token = config
                .azure_devops
                .as_ref()
                .and_then(|ado| ado.token.as_ref());
            println!(
                "# access token: {}",
                if token.is_some() { "set" } else { "not set" }
            );
        }
        ConfigCommands::Path => println!("{}", path.display()),
        ConfigCommands::Get { key } => {
            let config = Config::load_with_path(path)?;
            match config.get(&key)? {
                Some(value) => println!("{}", value),
                None => println!("(not set)"),
            }
        }
        ConfigCommands::Set { key, value } => {
            // Environment overrides are not persisted
            let mut config = Config::load_from(path)?;
            config.set(&key, &value)?;
            config.save_to(path)?;
            tracing::info!(key = %key, "Configuration updated");
        }
        ConfigCommands::Init { org_url, force } => {
            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at {} (use --force to overwrite)",
                    path.display()
                );
            }
            let mut config = Config::default();
            if let Some(org_url) = org_url {
                config.set("azure_devops.org_url", &org_url)?;
            }
            config.save_to(path)?;
            println!("Wrote {}", path.display());
        }
    }

    Ok(())
}
