//! Tilecheck CLI: the `tilecheck` command.

mod cli;
mod commands;
mod support;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    support::init_tracing(cli.verbose);

    match cli.command {
        Commands::Check {
            input_dir,
            output_dir,
            config,
            robo,
            rows,
            cols,
            wells_toggle,
            wells,
            timepoints_toggle,
            timepoints,
            channels_toggle,
            channels,
            morphology_channel,
            experiment,
            skip_check,
            json,
        } => commands::check::run(commands::check::Args {
            input_dir,
            output_dir,
            config,
            robo,
            rows,
            cols,
            wells_toggle,
            wells,
            timepoints_toggle,
            timepoints,
            channels_toggle,
            channels,
            morphology_channel,
            experiment,
            skip_check,
            json,
        }),

        Commands::Tokenize {
            input_dir,
            robo,
            json,
        } => commands::tokenize::run(input_dir, robo, json),
    }
}
