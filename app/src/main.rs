mod app;
mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tokio::runtime::Builder;

use printstatus_core::targets;

use crate::app::CliError;
use crate::logging::{init_logging, LogLevel};

#[derive(Parser, Debug)]
#[command(name = "printstatus", about = "Printer status monitor over SNMP")]
struct Cli {
    /// RON configuration file
    #[arg(long, global = true, env = "PRINTSTATUS_CONFIG", default_value = "printstatus.ron")]
    config: PathBuf,

    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll watched printers until Ctrl-C
    Monitor,
    /// Scan an address range for printers (default: local subnet)
    Discover {
        #[arg(requires = "end", conflicts_with = "cidr")]
        start: Option<String>,
        end: Option<String>,
        #[arg(long)]
        cidr: Option<String>,
    },
    /// Fetch and print everything a printer reports
    Inspect { address: String },
    /// Add a printer to the watched list
    Watch { address: String },
    /// Remove a printer from the watched list
    Unwatch { address: String },
    /// Print the watched printers
    List,
    /// Write system name, location or contact
    Set {
        address: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        contact: Option<String>,
    },
    /// Write the default configuration file
    InitConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_level);
    tracing::debug!(target: targets::CLI, command = ?cli.command, "Starting");

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(target: targets::CLI, error = %error, "Command failed");
            eprintln!("{error}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    if matches!(cli.command, Command::InitConfig) {
        return app::init_config(&cli.config);
    }

    let runtime = Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    let context = app::Context::load(&cli.config)?;

    runtime.block_on(async move {
        match cli.command {
            Command::Monitor => app::monitor(&context).await,
            Command::Discover { start, end, cidr } => {
                app::discover(&context, start.zip(end), cidr).await
            }
            Command::Inspect { address } => app::inspect(&context, &address).await,
            Command::Watch { address } => app::watch(&context, &address, true).await,
            Command::Unwatch { address } => app::watch(&context, &address, false).await,
            Command::List => app::list(&context),
            Command::Set {
                address,
                name,
                location,
                contact,
            } => app::set(&context, &address, name, location, contact).await,
            Command::InitConfig => app::init_config(&cli.config),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discover_accepts_range_or_cidr() {
        let cli = Cli::try_parse_from(["printstatus", "discover", "10.0.0.1", "10.0.0.9"])
            .expect("range");
        assert!(matches!(
            cli.command,
            Command::Discover { start: Some(_), end: Some(_), cidr: None }
        ));

        let cli = Cli::try_parse_from(["printstatus", "discover", "--cidr", "10.0.0.0/30"])
            .expect("cidr");
        assert!(matches!(cli.command, Command::Discover { cidr: Some(_), .. }));

        assert!(Cli::try_parse_from(["printstatus", "discover", "10.0.0.1"]).is_err());
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = Cli::try_parse_from([
            "printstatus",
            "list",
            "--config",
            "other.ron",
            "--log-level",
            "debug",
        ])
        .expect("parse");
        assert_eq!(cli.config, PathBuf::from("other.ron"));
        assert_eq!(cli.log_level, LogLevel::Debug);
    }
}
