//! RDDMS admin CLI
//!
//! Resolves the reference closure of dataspace objects and assembles
//! manifest requests. Results go to stdout as JSON; logs go to stderr.

use anyhow::Result;
use clap::{Parser, Subcommand};
use rddms_graph::{cancel_pair, CancelSignal};
use rddms_manifest::ManifestError;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::ObjectArgs;
use config::AdminConfig;

/// Exit code for rejected or missing credentials
const EXIT_CREDENTIALS: u8 = 3;

/// Exit code after Ctrl-C
const EXIT_CANCELLED: u8 = 130;

#[derive(Parser)]
#[command(name = "rddms-admin", version)]
#[command(about = "Reference resolution and manifest assembly for RDDMS dataspaces", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML config file with [store] and [manifest] sections
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Bearer token for the store
    #[arg(long, global = true, env = "RDDMS_ACCESS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the URI closure of one object
    Resolve {
        #[command(flatten)]
        object: ObjectArgs,

        /// Only the object itself
        #[arg(long)]
        no_refs: bool,
    },

    /// Print the manifest request for a selection file
    Manifest {
        /// JSON selection request
        #[arg(long)]
        selection: PathBuf,
    },

    /// Print the resolution report of one object
    Graph {
        #[command(flatten)]
        object: ObjectArgs,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_json);

    let (handle, signal) = cancel_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling");
            handle.cancel();
        }
    });

    match run(cli, signal).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{:#}", err);
            ExitCode::from(exit_code(&err))
        }
    }
}

async fn run(cli: Cli, cancel: CancelSignal) -> Result<()> {
    let config = AdminConfig::load(cli.config.as_deref())?;
    let service = commands::build_service(&config, cli.token)?;

    let output = match cli.command {
        Commands::Resolve { object, no_refs } => {
            commands::resolve(&service, &object, no_refs, cancel).await?
        }
        Commands::Manifest { selection } => commands::manifest(&service, &selection, cancel).await?,
        Commands::Graph { object } => commands::graph(&service, &object, cancel).await?,
    };

    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &output)?;
    writeln!(stdout)?;
    Ok(())
}

fn init_logging(json: bool) {
    if let Err(err) = try_init_logging(json) {
        eprintln!("rddms-admin: logging disabled: {err}");
    }
}

fn try_init_logging(json: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    }
}

fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<ManifestError>() {
        Some(e) if e.is_credential_failure() => EXIT_CREDENTIALS,
        Some(e) if e.is_cancelled() => EXIT_CANCELLED,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use clap::CommandFactory;
    use rddms_graph::ResolveError;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_resolve() {
        let cli = Cli::try_parse_from([
            "rddms-admin",
            "resolve",
            "--dataspace",
            "demo/Volve",
            "--type",
            "resqml20.obj_Grid2dRepresentation",
            "--uuid",
            "G1",
            "--depth",
            "2",
            "--no-refs",
            "--log-json",
        ])
        .unwrap();

        assert!(cli.log_json);
        match cli.command {
            Commands::Resolve { object, no_refs } => {
                assert!(no_refs);
                assert_eq!(object.depth, Some(2));
                assert_eq!(object.type_path, "resqml20.obj_Grid2dRepresentation");
            }
            _ => panic!("expected resolve"),
        }
    }

    #[test]
    fn graph_requires_uuid() {
        let parsed = Cli::try_parse_from([
            "rddms-admin",
            "graph",
            "--dataspace",
            "demo/Volve",
            "--type",
            "resqml20.obj_Grid2dRepresentation",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn second_logging_install_reports_failure() {
        let _ = try_init_logging(false);
        assert!(try_init_logging(true).is_err());
    }

    #[test]
    fn exit_codes() {
        let unauthorized = Err::<(), _>(ManifestError::from(ResolveError::Unauthorized {
            node: "G1".into(),
            message: "expired".into(),
        }))
        .context("resolving G1")
        .unwrap_err();
        assert_eq!(exit_code(&unauthorized), EXIT_CREDENTIALS);

        let cancelled = anyhow::Error::new(ManifestError::from(ResolveError::Cancelled));
        assert_eq!(exit_code(&cancelled), EXIT_CANCELLED);

        assert_eq!(exit_code(&anyhow::anyhow!("bad file")), 1);
    }
}
