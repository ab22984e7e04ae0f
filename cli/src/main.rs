//! Command-line front end for NoteHub.
//!
//! Commands:
//! - list: One page of notes, optionally searched and filtered by tag
//! - show: A single note
//! - create: Create a note through the validated form
//! - open: Render a route the way the web front end does, prefetching first
//! - browse: Interactive notes list with debounced search and paging
//!
//! Configuration via environment:
//! - NOTEHUB_URL: Base URL of the NoteHub API (default: http://localhost:3000)
//! - NOTEHUB_TOKEN: Bearer token
//! - NOTEHUB_PER_PAGE, NOTEHUB_SEARCH_DEBOUNCE_MS, NOTEHUB_STALE_SECS,
//!   NOTEHUB_GC_SECS: see `ClientConfig::from_env`

mod commands;

use clap::{Parser, Subcommand};
use notehub_client::ClientConfig;
use tracing_subscriber::EnvFilter;

use commands::{
    Context, browse::BrowseArgs, create::CreateArgs, list::ListArgs, open::OpenArgs,
    show::ShowArgs,
};

/// NoteHub CLI
///
/// Prints JSON by default; pass --human for formatted output.
#[derive(Parser)]
#[command(name = "notehub")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Output human-readable formatted text instead of JSON
    #[arg(long, global = true)]
    human: bool,

    /// NoteHub API URL (overrides NOTEHUB_URL)
    #[arg(long, global = true)]
    url: Option<String>,

    /// Bearer token (overrides NOTEHUB_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,

    /// Log filter written to stderr
    #[arg(long, env = "NOTEHUB_LOG", default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List one page of notes
    List(ListArgs),

    /// Show a single note
    Show(ShowArgs),

    /// Create a new note
    Create(CreateArgs),

    /// Render a route such as /notes/filter/Work
    Open(OpenArgs),

    /// Browse notes interactively
    Browse(BrowseArgs),
}

fn load_config(cli: &Cli) -> anyhow::Result<ClientConfig> {
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = &cli.url {
        config.base_url = url.trim_end_matches('/').to_string();
    }
    if let Some(token) = &cli.token {
        config.token = Some(token.clone());
    }
    Ok(config)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let ctx = match load_config(&cli).and_then(Context::new) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::List(args) => commands::list::execute(&ctx, cli.human, args).await,
        Commands::Show(args) => commands::show::execute(&ctx, cli.human, args).await,
        Commands::Create(args) => commands::create::execute(&ctx, cli.human, args).await,
        Commands::Open(args) => commands::open::execute(&ctx, cli.human, args).await,
        Commands::Browse(args) => commands::browse::execute(&ctx, cli.human, args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
