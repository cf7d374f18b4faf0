mod cli;
mod commands;
mod config_loader;
mod output;

use clap::Parser;
use cli::{Cli, Commands, ConfigCommand};
use colored::Colorize;

use std::process::exit;

use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    // The scanner runs in its own process group, so it does not see our
    // SIGINT. Take the group down with us before exiting.
    ctrlc::set_handler(move || {
        eprintln!(
            "\n{} Received Ctrl+C. Stopping the scanner and exiting...",
            "⚠️".yellow()
        );
        vyoma_gate::terminate_active_scanner();
        std::process::exit(130);
    })
    .expect("Error setting Ctrl-C handler");

    if cli.no_color {
        colored::control::set_override(false);
    }

    let result = match &cli.command {
        Some(Commands::Gate(args)) => commands::gate::gate(cli.config.as_ref(), args, cli.quiet),
        Some(Commands::Config(cmd)) => match cmd {
            ConfigCommand::Check => commands::config::check(cli.config.as_ref()),
            ConfigCommand::Dump { layer, format } => {
                commands::config::dump(cli.config.as_ref(), *layer, *format).map(|_| false)
            }
        },
        Some(Commands::Init {
            ci,
            target_url,
            force,
        }) => commands::init::init(*ci, target_url.as_deref(), *force).map(|_| false),
        None => {
            use clap::CommandFactory;
            let _ = Cli::command().print_help();
            exit(0);
        }
    };

    match result {
        Ok(failed) => {
            if failed {
                exit(1);
            } else {
                exit(0);
            }
        }
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red(), e);
            exit(1);
        }
    }
}
