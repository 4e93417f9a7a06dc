//! CLI for idempotent z/VM SMAPI operations.

#![allow(
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::missing_docs_in_private_items
)]

mod ops;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use smapi::{Client, Config, DEFAULT_PORT, ErrorCatalog};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "zvm-smapi",
    version,
    about = "Issue idempotent z/VM SMAPI operations"
)]
struct Cli {
    #[command(flatten)]
    conn: ConnArgs,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Print the unchanged report and the request that would be sent,
    /// without contacting SMAPI.
    #[arg(long, global = true)]
    check: bool,

    #[command(subcommand)]
    command: Command,
}

/// SMAPI endpoint and credentials.
#[derive(clap::Args)]
struct ConnArgs {
    /// SMAPI server host name.
    #[arg(long, env = "SMAPI_HOST")]
    host: Option<String>,

    /// SMAPI server port.
    #[arg(long, env = "SMAPI_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Authorized SMAPI user.
    #[arg(long, env = "SMAPI_USER")]
    user: Option<String>,

    /// Password of the SMAPI user.
    #[arg(long, env = "SMAPI_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Extra PEM CA bundle to trust (default: $SMAPI_CA_FILE).
    #[arg(long)]
    ca_file: Option<PathBuf>,

    /// JSON file overriding entries of the built-in error catalog.
    #[arg(long)]
    catalog: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Issue a raw SMAPI call and print the status triple.
    Call(ops::CallArgs),

    /// Define or delete a virtual NIC in a directory entry.
    Nicdef(ops::NicdefArgs),

    /// Set the CPU share of a running guest.
    Setshare(ops::SetshareArgs),

    /// Generate shell completion scripts.
    #[command(hide = true)]
    Completion {
        /// Target shell.
        shell: Shell,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.dispatch() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("zvm-smapi: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr; stdout carries the JSON result.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

impl Cli {
    /// Runs the selected command. `Ok(false)` means the operation failed
    /// and its report was already printed.
    fn dispatch(self) -> Result<bool> {
        let planned = if self.check {
            ops::check_report(&self.command)
        } else {
            None
        };
        if let Some(report) = planned {
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(true);
        }
        match self.command {
            Command::Call(args) => ops::call(&self.conn.client()?, &args),
            Command::Nicdef(args) => {
                ops::nicdef(&self.conn.client()?, &self.conn.catalog()?, &args)
            }
            Command::Setshare(args) => {
                ops::setshare(&self.conn.client()?, &self.conn.catalog()?, &args)
            }
            Command::Completion { shell } => {
                clap_complete::generate(
                    shell,
                    &mut Self::command(),
                    "zvm-smapi",
                    &mut std::io::stdout(),
                );
                Ok(true)
            }
        }
    }
}

impl ConnArgs {
    /// Builds a client from the endpoint options.
    fn client(&self) -> Result<Client> {
        let host = self.host.as_deref().context("missing --host (or SMAPI_HOST)")?;
        let user = self.user.as_deref().context("missing --user (or SMAPI_USER)")?;
        let password = self
            .password
            .as_deref()
            .context("missing --password (or SMAPI_PASSWORD)")?;

        let mut config = Config::from_env();
        if let Some(path) = &self.ca_file {
            config.ca_file = Some(path.clone());
        }

        Client::builder(host, self.port)
            .credentials(user, password)
            .config(config)
            .build()
            .context("failed to set up TLS")
    }

    /// Returns the built-in catalog with any `--catalog` overrides applied.
    fn catalog(&self) -> Result<ErrorCatalog> {
        let mut catalog = ErrorCatalog::builtin();
        if let Some(path) = &self.catalog {
            let overrides = ErrorCatalog::load(path)
                .with_context(|| format!("failed to load catalog {}", path.display()))?;
            catalog.merge(overrides);
        }
        Ok(catalog)
    }
}
