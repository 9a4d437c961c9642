//! ern CLI - native dependency management for mini-app containers

use std::io::{self, IsTerminal};

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{CauldronCommands, Cli, Commands, ListCommands};
use ern::reconcile::ReconcileError;
use ern::util::diagnostic;
use ern::util::shell::ColorChoice;

/// Options every command receives.
pub struct GlobalOptions {
    pub verbose: bool,
    pub color: ColorChoice,
}

fn main() {
    let cli = Cli::parse();
    let global_opts = GlobalOptions {
        verbose: cli.verbose,
        color: if cli.no_color {
            ColorChoice::Never
        } else {
            ColorChoice::Auto
        },
    };

    if let Err(e) = run(cli.command, &global_opts) {
        // Reconciliation failures get the full diagnostic with suggestions
        if let Some(reconcile) = e.downcast_ref::<ReconcileError>() {
            let color = global_opts.color == ColorChoice::Auto && io::stderr().is_terminal();
            diagnostic::emit(&reconcile.to_diagnostic(), color);
        } else {
            eprintln!("error: {:#}", e);
        }
        std::process::exit(1);
    }
}

fn run(command: Commands, global_opts: &GlobalOptions) -> Result<()> {
    // Set up logging
    let filter = if global_opts.verbose {
        EnvFilter::new("ern=debug")
    } else {
        EnvFilter::new("ern=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(global_opts.color == ColorChoice::Auto && io::stderr().is_terminal())
        .with_writer(io::stderr)
        .without_time()
        .init();

    // Execute command
    match command {
        Commands::List(args) => match args.command {
            ListCommands::Dependencies(args) => commands::list::execute(args, global_opts),
        },
        Commands::Add(args) => commands::add::execute(args, global_opts),
        Commands::Upgrade(args) => commands::upgrade::execute(args, global_opts),
        Commands::Cauldron(args) => match args.command {
            CauldronCommands::Sync(sync) => commands::cauldron::sync(sync, args.cauldron, global_opts),
            CauldronCommands::Get(get) => commands::cauldron::get(get, args.cauldron, global_opts),
        },
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
