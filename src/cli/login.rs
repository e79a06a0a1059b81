use clap::Parser;

use crate::{
    cli::device::{DeviceArgs, explain_login_error},
    prelude::*,
};

#[derive(Parser)]
pub struct LoginArgs {
    #[clap(flatten)]
    device: DeviceArgs,
}

impl LoginArgs {
    pub async fn run(self) -> Result {
        self.device
            .new_client()?
            .authenticate()
            .await
            .map_err(|error| explain_login_error(error, &self.device.host))?;
        println!("The inverter at `{}` accepted the credentials.", self.device.host);
        Ok(())
    }
}
