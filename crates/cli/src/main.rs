mod config;
mod error;
mod repl;

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser};
use runtime::{McpToolHost, Session, ToolHost};
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

use config::Config;
use error::{Error, Result};

#[derive(Parser)]
#[command(name = "palette")]
#[command(about = "Chat about your mood and get colors to match", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./palette.toml when present)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Tool server to launch; .py and .js scripts run through python and node
    server: Option<String>,

    /// Extra arguments passed to the tool server
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    server_args: Vec<String>,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let Some(server) = cli.server.clone() else {
        // Nothing to connect to: show usage and leave quietly.
        if Cli::command().print_help().is_ok() {
            println!();
        }
        return;
    };

    if let Err(e) = run(&cli, &server).await {
        tracing::error!(error = %e, "palette exited with an error");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: &Cli, server: &str) -> Result<()> {
    let config = Config::resolve(cli.config.as_deref())?;
    let backend = config.backend(|key| std::env::var(key).ok())?;

    let (command, args) = server_command(server, &cli.server_args);
    let tools = McpToolHost::spawn(&command, &args)
        .await
        .map_err(|reason| Error::Connection {
            command: command.clone(),
            reason,
        })?;

    let names: Vec<&str> = tools.specs().iter().map(|s| s.name.as_str()).collect();
    println!("Connected to server with tools: {}", names.join(", "));
    println!("Model: {backend}");
    println!("Type your queries or 'quit' to exit.\n");

    let mut session = Session::new(backend, tools, config.session.system_prompt.clone())
        .with_max_pairs(config.session.max_pairs);
    tracing::info!(session = %session.id, "session started");

    let stdin = BufReader::new(tokio::io::stdin());
    repl::run(&mut session, stdin, tokio::io::stdout()).await?;

    if let Err(e) = session.into_tools().shutdown().await {
        tracing::warn!(error = %e, "tool server did not shut down cleanly");
    }
    Ok(())
}

/// Command line that launches the tool server at `script`.
fn server_command(script: &str, args: &[String]) -> (String, Vec<String>) {
    let interpreter = match Path::new(script).extension().and_then(OsStr::to_str) {
        Some("py") => Some("python"),
        Some("js") => Some("node"),
        _ => None,
    };

    match interpreter {
        Some(interpreter) => {
            let mut full = Vec::with_capacity(args.len() + 1);
            full.push(script.to_string());
            full.extend_from_slice(args);
            (interpreter.to_string(), full)
        }
        None => (script.to_string(), args.to_vec()),
    }
}
