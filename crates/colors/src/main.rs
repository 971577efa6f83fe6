use clap::{Parser, ValueEnum};
use colors::{ColorSource, DEFAULT_WEBHOOK_URL, MoodColorsTool, StaticPalette, WebhookMode, WebhookSource};
use mcp::{Server, ServerConfig};
use tracing_subscriber::EnvFilter;

/// Where colors come from.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Source {
    /// Built-in palette.
    Static,
    /// Remote webhook, count forwarded as-is.
    Webhook,
    /// Remote webhook, count limited to 1 or 2.
    WebhookClamped,
}

#[derive(Parser)]
#[command(name = "mood-colors")]
#[command(about = "MCP tool server suggesting colors for a mood", long_about = None)]
#[command(version)]
struct Cli {
    /// Color source backing the tool
    #[arg(long, value_enum, env = "MOOD_COLORS_SOURCE", default_value = "static")]
    source: Source,

    /// Endpoint for the webhook sources
    #[arg(long, env = "MOOD_COLORS_WEBHOOK_URL", default_value = DEFAULT_WEBHOOK_URL)]
    webhook_url: String,
}

#[tokio::main]
async fn main() {
    // stdout carries the protocol; diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();

    let result = match cli.source {
        Source::Static => serve(StaticPalette::default()).await,
        Source::Webhook => serve(WebhookSource::new(cli.webhook_url, WebhookMode::Passthrough)).await,
        Source::WebhookClamped => {
            serve(WebhookSource::new(cli.webhook_url, WebhookMode::Clamped)).await
        }
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "server stopped");
        std::process::exit(1);
    }
}

async fn serve<S: ColorSource>(source: S) -> mcp::Result<()> {
    tracing::info!(source = source.name(), "starting mood-colors");
    let config = ServerConfig {
        name: "mood-colors".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };
    Server::new(config, MoodColorsTool::new(source))
        .serve_stdio()
        .await
}
