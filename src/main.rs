mod cli;
mod derive;
mod error;
mod filter;
mod fmt;
mod insights;
mod loader;
mod logging;
mod models;
mod reports;
mod settings;
mod stats;
mod tui;
mod view;

use std::io::IsTerminal;

use clap::{CommandFactory, Parser};
use colored::Colorize;

use cli::{Cli, Commands, Context, FilterOpts};

fn main() {
    let cli = Cli::parse();
    let log_guard = logging::init(cli.verbose);

    if !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    let ctx = Context::new(cli.file.as_deref());
    tracing::debug!(data_file = %ctx.data_file.display(), "resolved data file");

    let result = match cli.command {
        None => cli::dashboard::run(&ctx, &FilterOpts::default()),
        Some(Commands::Dashboard { filters }) => cli::dashboard::run(&ctx, &filters),
        Some(Commands::Summary { filters }) => cli::summary::run(&ctx, &filters),
        Some(Commands::Status) => cli::status::run(&ctx),
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(shell, &mut Cli::command(), "dealscope", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "command failed");
        eprintln!("{} {e}", "Error:".red().bold());
        drop(log_guard);
        std::process::exit(1);
    }
}
