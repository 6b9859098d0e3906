use clap::{Parser, Subcommand};

use crate::cmd::*;

mod args;

/// The CLI interface for the Duels application.
#[derive(Debug, Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
pub struct Cli {
    /// The selected command.
    #[clap(subcommand)]
    pub command: DuelsCommand,

    #[clap(flatten)]
    pub verbosity: args::Verbosity,
}

/// The top-level commands supported by Duels.
#[derive(Debug, Subcommand)]
pub enum DuelsCommand {
    Wad(wad::Wad),
}

impl Command for DuelsCommand {
    fn handle(self) -> eyre::Result<()> {
        match self {
            Self::Wad(wad) => wad.handle(),
        }
    }
}
