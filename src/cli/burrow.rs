use clap::{Parser, Subcommand};

use crate::{cli::device::DeviceArgs, prelude::*, tables::build_entries_table};

#[derive(Parser)]
pub struct BurrowArgs {
    #[clap(flatten)]
    device: DeviceArgs,

    #[command(subcommand)]
    command: BurrowCommand,
}

impl BurrowArgs {
    #[instrument(skip_all)]
    pub async fn run(self) -> Result {
        let client = self.device.new_client()?;
        let entries = match self.command {
            BurrowCommand::Entry { oid } => vec![client.get_entry(oid).await?],
            BurrowCommand::Entries { oids } => client.get_entries(&oids).await?,
        };
        info!(n_entries = entries.len(), "gotcha");
        println!("{}", build_entries_table(&entries));
        Ok(())
    }
}

#[derive(Subcommand)]
enum BurrowCommand {
    /// Fetch the single entry.
    Entry { oid: u32 },

    /// Fetch the comma-separated entries in bulk.
    Entries {
        #[clap(value_delimiter = ',', num_args = 1.., required = true)]
        oids: Vec<u32>,
    },
}
