//! PortWatch CLI - Inspect host ports and the containers publishing them
//!
//! A command-line tool for listing port usage over a range, watching it
//! change, killing the owning processes and stopping or restarting
//! containers.

mod commands;
mod output;

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "portwatch")]
#[command(author, version, about = "Inspect host ports and the containers publishing them")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Use a different configuration file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Range and filter flags shared by `list` and `watch`.
#[derive(Args, Clone, Debug, Default)]
pub struct ViewArgs {
    /// First port of the range (default from config)
    #[arg(long, value_name = "PORT", value_parser = clap::value_parser!(u16).range(1..))]
    from: Option<u16>,

    /// Last port of the range (default from config)
    #[arg(long, value_name = "PORT", value_parser = clap::value_parser!(u16).range(1..))]
    to: Option<u16>,

    /// Hide free ports
    #[arg(short, long)]
    used: bool,

    /// Show only ports published by containers
    #[arg(short, long)]
    containers: bool,

    /// Free-text filter over every column
    #[arg(short, long, value_name = "TEXT")]
    filter: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List ports in a range with their owners and containers
    #[command(alias = "ls")]
    List(ViewArgs),

    /// Keep rescanning and reprint the view when it changes
    Watch {
        #[command(flatten)]
        view: ViewArgs,

        /// Host scan interval in seconds
        #[arg(long, value_name = "SECS")]
        interval: Option<u64>,

        /// Container scan interval in seconds
        #[arg(long, value_name = "SECS")]
        container_interval: Option<u64>,
    },

    /// Terminate a process gracefully, forcing it after the grace period
    Kill {
        /// Process ID to terminate
        #[arg(required_unless_present = "port", conflicts_with = "port")]
        pid: Option<u32>,

        /// Terminate whichever process owns this port
        #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..))]
        port: Option<u16>,

        /// Proceed even when the process backs a container
        #[arg(short, long)]
        yes: bool,
    },

    /// Stop a running container
    Stop {
        /// Container ID or name
        container: String,
    },

    /// Restart a container
    Restart {
        /// Container ID or name
        container: String,
    },

    /// Show current configuration
    Config {
        /// Write the effective configuration to the config file
        #[arg(long)]
        save: bool,
    },
}

fn setup_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let config = commands::load_config(cli.config.as_deref()).await?;

    match cli.command {
        Some(Commands::List(view)) => {
            commands::list::run(&config, &view, cli.json).await?;
        }
        Some(Commands::Watch {
            view,
            interval,
            container_interval,
        }) => {
            commands::watch::run(&config, &view, interval, container_interval, cli.json).await?;
        }
        Some(Commands::Kill { pid, port, yes }) => {
            commands::kill::run(&config, pid, port, yes).await?;
        }
        Some(Commands::Stop { container }) => {
            commands::container::stop(&config, &container).await?;
        }
        Some(Commands::Restart { container }) => {
            commands::container::restart(&config, &container).await?;
        }
        Some(Commands::Config { save }) => {
            if save {
                commands::config::save(&config, cli.config.as_deref()).await?;
            }
            commands::config::show(&config, cli.config.as_deref(), cli.json).await?;
        }
        None => {
            commands::list::run(&config, &ViewArgs::default(), cli.json).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_flags_reject_port_zero() {
        assert!(Cli::try_parse_from(["portwatch", "list", "--from", "0"]).is_err());
        assert!(Cli::try_parse_from(["portwatch", "list", "--to", "0"]).is_err());
        assert!(Cli::try_parse_from(["portwatch", "kill", "--port", "0"]).is_err());

        let cli = Cli::try_parse_from(["portwatch", "list", "--from", "1", "--to", "65535"]).unwrap();
        match cli.command {
            Some(Commands::List(view)) => {
                assert_eq!(view.from, Some(1));
                assert_eq!(view.to, Some(65535));
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn test_config_save_flag() {
        let cli = Cli::try_parse_from(["portwatch", "config", "--save"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Config { save: true })));
    }
}
