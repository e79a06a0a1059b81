/// Inverter API error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Credentials were rejected, or the device responded with a non-200 status.
    ///
    /// The firmware uses the same status for both, so they cannot be told apart.
    #[error("the inverter rejected the request (invalid credentials?)")]
    InvalidAuth,

    #[error("cannot connect to the inverter")]
    CannotConnect(#[source] reqwest::Error),

    /// The device responded with the `-1` sentinel.
    #[error("the entry is not available")]
    EntryNotAvailable,

    #[error("failed to request the inverter")]
    Request(#[source] reqwest::Error),

    #[error("malformed inverter response")]
    MalformedResponse(#[from] serde_json::Error),
}

impl From<reqwest::Error> for Error {
    /// Strips the URL: the query string carries the password.
    fn from(error: reqwest::Error) -> Self {
        Self::Request(error.without_url())
    }
}

pub type Result<T = (), E = Error> = std::result::Result<T, E>;
