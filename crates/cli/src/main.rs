mod commands;

use clap::{CommandFactory, Parser};
use clap_complete::{Shell, generate};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "flow-pages")]
#[command(version, about = "Build-time page routes for widget-composed CMS pages", long_about = None)]
struct Cli {
    /// Log pipeline details (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Initialize a new site directory
    Init {
        /// Path to create site directory
        path: PathBuf,
    },

    /// Validate site configuration and widget fragments
    Validate {
        /// Path to site directory
        path: PathBuf,
    },

    /// Print the combined page query
    Query {
        /// Path to site directory
        path: PathBuf,
    },

    /// Query the CMS and register page routes
    Build {
        /// Path to site directory
        path: PathBuf,

        /// Output directory for the route manifest and templates
        #[arg(short, long)]
        output: PathBuf,

        /// Build from a recorded query response instead of the endpoint
        #[arg(long)]
        response: Option<PathBuf>,

        /// Fail on the first page that cannot be registered
        #[arg(long)]
        strict: bool,

        /// Build templates one page at a time
        #[arg(long)]
        sequential: bool,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Init { path } => commands::init::run(path).await,
        Command::Validate { path } => commands::validate::run(path).await,
        Command::Query { path } => commands::query::run(path).await,
        Command::Build {
            path,
            output,
            response,
            strict,
            sequential,
        } => {
            let args = commands::build::BuildArgs {
                response,
                strict,
                sequential,
            };
            commands::build::run(path, output, args).await
        }
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "flow-pages", &mut io::stdout());
            Ok(())
        }
    }
}
