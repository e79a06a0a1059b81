mod entry;
mod error;
mod repair;

use std::{ops::Range, time::Duration};

use itertools::Itertools;
use reqwest::{RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};

pub use self::{
    entry::Entry,
    error::{Error, Result},
    repair::repair,
};
use crate::prelude::{Level, debug, error, info, instrument, warn};

/// Body the firmware sends instead of a missing entry or rejected credentials.
const SENTINEL: &str = "-1";

/// Number of sequential requests the discovery scan makes.
pub const N_DISCOVERY_CHUNKS: u32 = 100;

/// Number of OIDs requested at once during the discovery scan.
pub const DISCOVERY_CHUNK_SIZE: u32 = 1000;

/// OID range of the discovery chunk.
#[must_use]
pub const fn discovery_chunk(index: u32) -> Range<u32> {
    let start = index * DISCOVERY_CHUNK_SIZE;
    start..(start + DISCOVERY_CHUNK_SIZE)
}

#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub host: String,
    pub username: String,
    pub password: String,
}

/// Benning inverter local API client.
///
/// The device speaks plain HTTP only.
pub struct Client {
    inner: reqwest::Client,
    base_url: String,
    credentials: Credentials,
}

impl Client {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

    pub fn new(credentials: Credentials) -> Result<Self> {
        Self::with_timeout(credentials, Self::DEFAULT_TIMEOUT)
    }

    #[instrument(skip_all, fields(host = %credentials.host))]
    pub fn with_timeout(credentials: Credentials, timeout: Duration) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .user_agent("benning")
            .cookie_store(true)
            .timeout(timeout)
            .build()?;
        let base_url = format!("http://{}", credentials.host);
        Ok(Self { inner, base_url, credentials })
    }

    /// Check the credentials with a single login request.
    ///
    /// Only used to validate the setup, the API does not issue any session token.
    #[instrument(skip_all, fields(host = %self.credentials.host))]
    pub async fn authenticate(&self) -> Result {
        info!("authenticating…");
        let response = self
            .inner
            .get(self.url("login.cgi"))
            .query(&self.credentials_query())
            .send()
            .await
            .map_err(Self::cannot_connect)?;
        if response.status() != StatusCode::OK {
            warn!(status = %response.status(), "login failed");
            return Err(Error::InvalidAuth);
        }
        let body = response.text().await.map_err(Self::cannot_connect)?;
        if body == SENTINEL {
            warn!("the inverter rejected the credentials");
            return Err(Error::InvalidAuth);
        }
        info!("authenticated");
        Ok(())
    }

    /// Fetch the single entry.
    ///
    /// Prefer [`Client::get_entries`] for more than one entry.
    #[instrument(skip_all, fields(oid = oid))]
    pub async fn get_entry(&self, oid: u32) -> Result<Entry> {
        debug!("fetching…");
        let body = self
            .fetch(self.inner.get(self.url("getentry.cgi")).query(&[("oid", oid)]))
            .await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Fetch the entries in bulk.
    ///
    /// Unknown OIDs are silently omitted by the device, so the result may be shorter
    /// than the request, or even empty.
    #[instrument(skip_all, fields(n_oids = oids.len()))]
    pub async fn get_entries(&self, oids: &[u32]) -> Result<Vec<Entry>> {
        let oids = oids.iter().join(",");
        debug!(%oids, "fetching…");

        // The firmware does not decode `%2C`, hence the raw query string:
        let url = format!("{}?oids={oids}", self.url("getentries.cgi"));
        let body = self.fetch(self.inner.get(url)).await?;

        let repaired = repair(&body);
        debug!(%repaired, "repaired the response");
        let entries = Entry::from_array(serde_json::from_str(&repaired)?);
        debug!(n_entries = entries.len(), "fetched");
        Ok(entries)
    }

    /// Discover all the entries the device has.
    ///
    /// There is no endpoint to list them, so this brute-forces the entire OID space
    /// and takes a while.
    pub async fn get_available_entries(&self) -> Result<Vec<Entry>> {
        self.get_available_entries_with_progress(|_| {}).await
    }

    /// Same as [`Client::get_available_entries`], but reports the progress percentage
    /// every 10 chunks.
    ///
    /// Any failed chunk aborts the whole scan.
    #[instrument(skip_all, fields(host = %self.credentials.host))]
    pub async fn get_available_entries_with_progress(
        &self,
        mut on_progress: impl FnMut(u32),
    ) -> Result<Vec<Entry>> {
        info!("discovering the available entries…");
        let mut entries = Vec::new();
        for chunk_index in 0..N_DISCOVERY_CHUNKS {
            let oids = discovery_chunk(chunk_index).collect_vec();
            entries.extend(self.get_entries(&oids).await?);
            if chunk_index % 10 == 0 {
                let percent = chunk_index * 100 / N_DISCOVERY_CHUNKS;
                info!(percent, n_entries = entries.len(), "discovering…");
                on_progress(percent);
            }
        }
        info!(n_entries = entries.len(), "discovered");
        Ok(entries)
    }

    /// Send the request and check the response for the status and sentinel.
    #[instrument(skip_all, level = Level::DEBUG)]
    async fn fetch(&self, request: RequestBuilder) -> Result<String> {
        let response = request.query(&self.credentials_query()).send().await?;
        if response.status() != StatusCode::OK {
            error!(status = %response.status(), "the inverter responded with an error");
            return Err(Error::InvalidAuth);
        }
        let body = response.text().await?;
        debug!(%body, "received");
        if body == SENTINEL {
            warn!("the inverter reports the entry as not available");
            return Err(Error::EntryNotAvailable);
        }
        Ok(body)
    }

    fn cannot_connect(error: reqwest::Error) -> Error {
        let error = error.without_url();
        error!("failed to reach the inverter: {error:#}");
        Error::CannotConnect(error)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    fn credentials_query(&self) -> [(&str, &str); 2] {
        [
            ("name", self.credentials.username.as_str()),
            ("pass", self.credentials.password.as_str()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use wiremock::{
        Mock,
        MockServer,
        ResponseTemplate,
        matchers::{method, path, query_param},
    };

    use super::*;
    use crate::prelude::Result;

    fn credentials(server: &MockServer) -> Credentials {
        Credentials {
            host: server.address().to_string(),
            username: "admin".to_owned(),
            password: "secret".to_owned(),
        }
    }

    async fn mock(server: &MockServer, endpoint: &str, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .respond_with(response)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn authenticate_ok() -> Result {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/login.cgi"))
            .and(query_param("name", "admin"))
            .and(query_param("pass", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_string("1"))
            .expect(1)
            .mount(&server)
            .await;
        Client::new(credentials(&server))?.authenticate().await?;
        Ok(())
    }

    #[tokio::test]
    async fn authenticate_rejected() -> Result {
        let server = MockServer::start().await;
        mock(&server, "/login.cgi", ResponseTemplate::new(200).set_body_string("-1")).await;
        let result = Client::new(credentials(&server))?.authenticate().await;
        assert!(matches!(result, Err(Error::InvalidAuth)), "{result:?}");
        Ok(())
    }

    #[tokio::test]
    async fn authenticate_non_ok_status() -> Result {
        let server = MockServer::start().await;
        mock(&server, "/login.cgi", ResponseTemplate::new(401)).await;
        let result = Client::new(credentials(&server))?.authenticate().await;
        assert!(matches!(result, Err(Error::InvalidAuth)), "{result:?}");
        Ok(())
    }

    #[tokio::test]
    async fn authenticate_timeout() -> Result {
        let server = MockServer::start().await;
        let response =
            ResponseTemplate::new(200).set_body_string("1").set_delay(Duration::from_secs(2));
        mock(&server, "/login.cgi", response).await;
        let result = Client::with_timeout(credentials(&server), Duration::from_millis(100))?
            .authenticate()
            .await;
        assert!(matches!(result, Err(Error::CannotConnect(_))), "{result:?}");
        Ok(())
    }

    #[tokio::test]
    async fn get_entry_ok() -> Result {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/getentry.cgi"))
            .and(query_param("oid", "11"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"oid":11,"label":"Device.Temp","type":"F","val":"415","factor":"0.1"}"#,
            ))
            .mount(&server)
            .await;
        let entry = Client::new(credentials(&server))?.get_entry(11).await?;
        assert_eq!(entry.oid, 11);
        assert_eq!(entry.label, "Device.Temp");
        Ok(())
    }

    #[tokio::test]
    async fn get_entry_not_available() -> Result {
        let server = MockServer::start().await;
        mock(&server, "/getentry.cgi", ResponseTemplate::new(200).set_body_string("-1")).await;
        let result = Client::new(credentials(&server))?.get_entry(12345).await;
        assert!(matches!(result, Err(Error::EntryNotAvailable)), "{result:?}");
        Ok(())
    }

    #[tokio::test]
    async fn get_entry_non_ok_status() -> Result {
        let server = MockServer::start().await;
        mock(&server, "/getentry.cgi", ResponseTemplate::new(500).set_body_string("-1")).await;
        let result = Client::new(credentials(&server))?.get_entry(1).await;
        assert!(matches!(result, Err(Error::InvalidAuth)), "{result:?}");
        Ok(())
    }

    #[tokio::test]
    async fn get_entries_repairs_the_response() -> Result {
        let server = MockServer::start().await;
        let body = "[{\"oid\":1,\"label\":\"A.B\",\"type\":\"i\",\"val\":5,\"factor\":1},\r\n\
                    {\"oid\":3,\"label\":\"C\",\"type\":\"s\",\"val\":\"OK\"},,]";
        Mock::given(method("GET"))
            .and(path("/getentries.cgi"))
            .and(query_param("oids", "1,2,3"))
            .and(query_param("name", "admin"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;
        let entries = Client::new(credentials(&server))?.get_entries(&[1, 2, 3]).await?;
        assert_eq!(entries.iter().map(|entry| entry.oid).collect_vec(), [1, 3]);
        Ok(())
    }

    #[tokio::test]
    async fn get_entries_sends_raw_commas() -> Result {
        let server = MockServer::start().await;
        mock(&server, "/getentries.cgi", ResponseTemplate::new(200).set_body_string("[]")).await;
        Client::new(credentials(&server))?.get_entries(&[7, 8, 8]).await?;
        let requests = server.received_requests().await.unwrap_or_default();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].url.query().unwrap_or_default().starts_with("oids=7,8,8&"));
        Ok(())
    }

    #[tokio::test]
    async fn get_entries_empty() -> Result {
        let server = MockServer::start().await;
        mock(&server, "/getentries.cgi", ResponseTemplate::new(200).set_body_string("[\n]")).await;
        let entries = Client::new(credentials(&server))?.get_entries(&[99_998, 99_999]).await?;
        assert!(entries.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn get_entries_not_available() -> Result {
        let server = MockServer::start().await;
        mock(&server, "/getentries.cgi", ResponseTemplate::new(200).set_body_string("-1")).await;
        let result = Client::new(credentials(&server))?.get_entries(&[1]).await;
        assert!(matches!(result, Err(Error::EntryNotAvailable)), "{result:?}");
        Ok(())
    }

    #[tokio::test]
    async fn get_entries_non_ok_status() -> Result {
        let server = MockServer::start().await;
        mock(&server, "/getentries.cgi", ResponseTemplate::new(403).set_body_string("[]")).await;
        let result = Client::new(credentials(&server))?.get_entries(&[1]).await;
        assert!(matches!(result, Err(Error::InvalidAuth)), "{result:?}");
        Ok(())
    }

    #[tokio::test]
    async fn get_entries_malformed() -> Result {
        let server = MockServer::start().await;
        mock(&server, "/getentries.cgi", ResponseTemplate::new(200).set_body_string("[{")).await;
        let result = Client::new(credentials(&server))?.get_entries(&[1]).await;
        assert!(matches!(result, Err(Error::MalformedResponse(_))), "{result:?}");
        Ok(())
    }

    /// Nothing listens on port 1.
    fn unreachable_credentials() -> Credentials {
        Credentials {
            host: "127.0.0.1:1".to_owned(),
            username: "admin".to_owned(),
            password: "hunter2".to_owned(),
        }
    }

    #[tokio::test]
    async fn authenticate_error_hides_the_password() -> Result {
        let error = Client::new(unreachable_credentials())?.authenticate().await.unwrap_err();
        assert!(matches!(error, Error::CannotConnect(_)), "{error:?}");
        let message = format!("{:#}", anyhow::Error::new(error));
        assert!(!message.contains("hunter2"), "{message}");
        Ok(())
    }

    #[tokio::test]
    async fn get_entries_error_hides_the_password() -> Result {
        let error =
            Client::new(unreachable_credentials())?.get_entries(&[1, 2]).await.unwrap_err();
        assert!(matches!(error, Error::Request(_)), "{error:?}");
        let message = format!("{:#}", anyhow::Error::new(error));
        assert!(!message.contains("hunter2"), "{message}");
        Ok(())
    }

    #[tokio::test]
    async fn get_entry_error_hides_the_password() -> Result {
        let error = Client::new(unreachable_credentials())?.get_entry(1).await.unwrap_err();
        let message = format!("{:?}", anyhow::Error::new(error));
        assert!(!message.contains("hunter2"), "{message}");
        Ok(())
    }

    #[test]
    fn discovery_chunks_cover_the_oid_space() {
        let oids = (0..N_DISCOVERY_CHUNKS).flat_map(discovery_chunk).collect_vec();
        assert_eq!(oids, (0..=99_999).collect_vec());
        assert_eq!(discovery_chunk(7), 7000..8000);
    }

    #[tokio::test]
    async fn get_available_entries_ok() -> Result {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/getentries.cgi"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .with_priority(10)
            .expect(98)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/getentries.cgi"))
            .and(query_param("oids", discovery_chunk(0).join(",")))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "[{\"oid\":1,\"label\":\"A\",\"val\":1},\n{\"oid\":7,\"label\":\"B\",\"val\":2},]",
            ))
            .with_priority(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/getentries.cgi"))
            .and(query_param("oids", discovery_chunk(42).join(",")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("[{\"oid\":42001,\"label\":\"C\",\"val\":3}]"),
            )
            .with_priority(1)
            .expect(1)
            .mount(&server)
            .await;

        let mut progress = Vec::new();
        let entries = Client::new(credentials(&server))?
            .get_available_entries_with_progress(|percent| progress.push(percent))
            .await?;

        assert_eq!(entries.iter().map(|entry| entry.oid).collect_vec(), [1, 7, 42001]);
        assert_eq!(progress, [0, 10, 20, 30, 40, 50, 60, 70, 80, 90]);

        let requested_oids = server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .flat_map(|request| {
                request
                    .url
                    .query_pairs()
                    .find(|(key, _)| key == "oids")
                    .map(|(_, oids)| oids.split(',').map(str::parse::<u32>).collect_vec())
                    .unwrap_or_default()
            })
            .collect::<Result<Vec<_>, _>>()?;
        assert_eq!(requested_oids, (0..=99_999).collect_vec());
        Ok(())
    }

    #[tokio::test]
    async fn get_available_entries_aborts_on_failed_chunk() -> Result {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/getentries.cgi"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .up_to_n_times(3)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/getentries.cgi"))
            .respond_with(ResponseTemplate::new(500))
            .with_priority(10)
            .expect(1)
            .mount(&server)
            .await;
        let result = Client::new(credentials(&server))?.get_available_entries().await;
        assert!(matches!(result, Err(Error::InvalidAuth)), "{result:?}");
        Ok(())
    }
}
