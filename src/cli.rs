mod burrow;
mod device;
mod login;
mod poll;
mod settings;
mod setup;

use clap::{Parser, Subcommand};

use crate::{
    cli::{burrow::BurrowArgs, login::LoginArgs, poll::PollArgs, setup::SetupArgs},
    prelude::*,
};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Check that the inverter accepts the credentials.
    #[clap(name = "login")]
    Login(Box<LoginArgs>),

    /// Check the credentials, discover the available entries, and save the settings.
    #[clap(name = "setup")]
    Setup(Box<SetupArgs>),

    /// Periodically fetch the discovered entries.
    #[clap(name = "poll")]
    Poll(Box<PollArgs>),

    /// Development tools.
    #[clap(name = "burrow")]
    Burrow(Box<BurrowArgs>),
}

impl Command {
    pub async fn run(self) -> Result {
        match self {
            Self::Login(args) => args.run().await,
            Self::Setup(args) => args.run().await,
            Self::Poll(args) => args.run().await,
            Self::Burrow(args) => args.run().await,
        }
    }
}
