use clap::Parser;

use crate::{
    api::benning::{self, Credentials},
    prelude::*,
};

#[derive(Parser)]
pub struct DeviceArgs {
    /// Inverter host name or IP address, optionally with a port.
    #[clap(long = "host", env = "BENNING_HOST")]
    pub host: String,

    #[clap(long = "username", env = "BENNING_USERNAME")]
    pub username: String,

    #[clap(long = "password", env = "BENNING_PASSWORD", hide_env_values = true)]
    pub password: String,
}

impl DeviceArgs {
    pub fn credentials(&self) -> Credentials {
        Credentials {
            host: self.host.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }

    pub fn new_client(&self) -> Result<benning::Client> {
        Ok(benning::Client::new(self.credentials())?)
    }
}

/// Turn the login error into an actionable message.
pub fn explain_login_error(error: benning::Error, host: &str) -> Error {
    let message = match error {
        benning::Error::InvalidAuth => {
            "the inverter rejected the credentials, check the username and password".to_owned()
        }
        benning::Error::CannotConnect(_) => {
            format!("cannot reach the inverter at `{host}`, check the host and the network")
        }
        _ => "failed to log in".to_owned(),
    };
    Error::new(error).context(message)
}
