use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::credential::CredentialOp;

#[derive(Parser, Debug)]
#[command(name = "drover", version, about = "Scoped GitHub credential broker")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the broker: one token socket per running tenant container.
    Serve {
        /// TOML configuration file (overrides DROVER_CONFIG).
        #[arg(long, short)]
        config: Option<PathBuf>,
    },

    /// Mint a one-off token for the given repositories and print it.
    Token {
        /// Repository in `owner/name` form. Repeatable.
        #[arg(long = "repo", required = true)]
        repos: Vec<String>,

        /// TOML configuration file (overrides DROVER_CONFIG).
        #[arg(long, short)]
        config: Option<PathBuf>,
    },

    /// git credential helper for use inside a tenant container.
    ///
    /// Configure with `git config credential.helper "drover credential"`.
    Credential {
        /// Operation requested by git.
        #[arg(value_enum)]
        op: CredentialOp,

        /// Tenant socket to ask for a token.
        #[arg(long, env = "DROVER_SOCKET", default_value = commands::credential::DEFAULT_SOCKET)]
        socket: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // git reads the helper's stdout, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Command::Serve { config } => commands::serve::serve(config.as_deref()).await,
        Command::Token { repos, config } => commands::token::token(config.as_deref(), repos).await,
        Command::Credential { op, socket } => commands::credential::credential(op, &socket).await,
    }
}
