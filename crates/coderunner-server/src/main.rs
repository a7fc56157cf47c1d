//! Command-line entry point for the coderunner service
//!
//! Runs the HTTP server by default. `exec` runs a single file through the same
//! executor and prints the JSON response, and `runtimes` reports which
//! interpreters were found on this host.

use anyhow::Result;
use clap::{Parser, Subcommand};
use coderunner_core::{
    CodeExecutor, ConfigLoader, ExecutionRequest, ExecutionResponse, LocalCodeExecutor,
    RunnerConfig,
};
use coderunner_server::{shutdown_signal, CoderunnerServer, ServerConfig, ServerError};
use log::LevelFilter;
use std::path::PathBuf;
use std::sync::Arc;

const DEFAULT_CONFIG: &str = "coderunner.yaml";

#[derive(Parser, Debug)]
#[clap(author, version, about = "coderunner - sandboxed execution service for code submissions")]
struct Cli {
    #[clap(subcommand)]
    command: Option<Commands>,

    #[clap(long, short, help = "Path to the YAML configuration file [default: coderunner.yaml if present]")]
    config: Option<PathBuf>,

    #[clap(long, help = "Override the bind address from the configuration")]
    bind_addr: Option<String>,

    #[clap(long, short, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP server (default command)
    Serve,
    /// Execute a single source file and print the response
    Exec {
        /// Source file to run
        file: PathBuf,

        #[clap(long, short)]
        language: String,

        #[clap(long, short, default_value = "")]
        input: String,
    },
    /// List supported languages and the interpreters found for them
    Runtimes,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level_filter = cli.log_level.parse().unwrap_or(LevelFilter::Info);
    env_logger::Builder::new()
        .filter_level(log_level_filter)
        .init();

    let config = load_config(cli.config.as_ref()).await?;

    match cli.command {
        Some(Commands::Exec { file, language, input }) => exec_file(config, file, language, input).await,
        Some(Commands::Runtimes) => list_runtimes(config),
        Some(Commands::Serve) | None => run_server(config, cli.bind_addr).await,
    }
}

/// An explicit path must exist; the default path is optional.
async fn load_config(path: Option<&PathBuf>) -> Result<RunnerConfig> {
    let config = match path {
        Some(path) => {
            log::info!("Loading configuration from file: {}", path.display());
            ConfigLoader::from_file(path).await?
        }
        None => ConfigLoader::from_file_or_default(DEFAULT_CONFIG).await?,
    };
    Ok(config)
}

async fn run_server(config: RunnerConfig, bind_addr: Option<String>) -> Result<()> {
    let mut server_config = ServerConfig::from_settings(&config.server, config.execution.max_test_cases)?;
    if let Some(addr) = bind_addr {
        server_config = server_config.with_bind_addr_str(&addr)?;
    }

    log::info!(
        "Executor timeout {}ms, scratch directory {}",
        config.execution.timeout_ms,
        config.execution.scratch_dir().display()
    );

    let executor = LocalCodeExecutor::new(config);
    for runtime in executor.runtimes() {
        if runtime.available {
            log::info!("Runtime {} available", runtime.language);
        } else {
            log::warn!("Runtime {} not found; executions will report how to install it", runtime.language);
        }
    }

    let server = CoderunnerServer::with_config(Arc::new(executor), server_config);
    if let Err(e) = server.serve_with_shutdown(shutdown_signal()).await {
        log::error!("Server failed: {}", e);
        return Err(e.into());
    }

    Ok(())
}

async fn exec_file(config: RunnerConfig, file: PathBuf, language: String, input: String) -> Result<()> {
    let code = tokio::fs::read_to_string(&file)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", file.display(), e))?;

    let executor = LocalCodeExecutor::new(config);
    let request = ExecutionRequest::new(code, language, input);
    let response = match executor.execute(&request).await {
        Ok(result) => ExecutionResponse::from(result),
        Err(e) if e.is_request_error() => return Err(ServerError::from(e).into()),
        Err(e) => ExecutionResponse::server_error(e),
    };

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn list_runtimes(config: RunnerConfig) -> Result<()> {
    let executor = LocalCodeExecutor::new(config);
    for runtime in executor.runtimes() {
        let location = runtime
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "not found".to_string());
        println!("{:<12} .{:<4} {}", runtime.language, runtime.extension, location);
    }
    Ok(())
}
