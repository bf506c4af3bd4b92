mod commands;
mod server;

use clap::{Args, CommandFactory, Parser};
use clap_complete::{Shell, generate};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pagehost")]
#[command(version, about = "Host static HTML pages with their CSS and images", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

/// Options shared by every subcommand
#[derive(Args, Clone, Debug, Default)]
pub struct GlobalArgs {
    /// Path to pagehost.toml (default: ./pagehost.toml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Site store directory (overrides store.root)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Log at info level regardless of RUST_LOG
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Parser)]
enum Command {
    /// Run the public and admin HTTP server
    Serve {
        /// Address to bind (overrides server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to serve on (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List hosted pages
    List {
        /// Print JSON instead of one slug per line
        #[arg(long)]
        json: bool,
    },

    /// Create a page from a local directory with index.html, css/ and imgs/
    Import {
        /// Directory to import
        path: PathBuf,

        /// Slug to publish under (random if omitted)
        #[arg(short, long)]
        slug: Option<String>,
    },

    /// Delete a hosted page and all of its assets
    Remove {
        /// Slug of the page
        slug: String,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // --verbose forces info, otherwise RUST_LOG or warn
    let filter = if cli.global.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Command::Serve { host, port } => commands::serve::run(&cli.global, host, port).await,
        Command::List { json } => commands::list::run(&cli.global, json).await,
        Command::Import { path, slug } => commands::import::run(&cli.global, path, slug).await,
        Command::Remove { slug } => commands::remove::run(&cli.global, slug).await,
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "pagehost", &mut io::stdout());
            Ok(())
        }
    }
}
