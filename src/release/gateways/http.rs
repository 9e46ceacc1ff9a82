//! HTTP gateway to the BlueOS version chooser and the GitHub release feed

use std::time::Duration;

use reqwest::header::{HeaderMap, LINK};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::Config;
use crate::release::error::GatewayError;
use crate::release::gateway::Gateway;
use crate::release::types::{InstallRequest, Release};

/// Response from `GET /version/current`
#[derive(Debug, Deserialize)]
struct CurrentVersion {
    tag: String,
}

/// Response from `GET /version/available/local`
#[derive(Debug, Deserialize)]
struct LocalInventory {
    local: Vec<Release>,
}

/// Response from `GET /version/available/{repository}`
#[derive(Debug, Deserialize)]
struct RepositoryInventory {
    #[serde(default)]
    remote: Vec<Release>,
    #[serde(default)]
    local: Vec<Release>,
}

/// Entry of the GitHub releases API
#[derive(Debug, Deserialize)]
struct FeedRelease {
    tag_name: String,
}

/// Gateway implementation over HTTP
pub struct HttpGateway {
    client: reqwest::Client,
    version_chooser_url: String,
    feed_url: String,
    feed_max_pages: u32,
    repository: String,
    request_timeout: Duration,
    command_timeout: Duration,
}

impl HttpGateway {
    pub fn new(config: &Config) -> Result<Self, GatewayError> {
        Ok(Self {
            client: reqwest::Client::builder()
                .user_agent(concat!("stabler/", env!("CARGO_PKG_VERSION")))
                .build()?,
            version_chooser_url: config.version_chooser_url(),
            feed_url: config.feed_url.clone(),
            feed_max_pages: config.feed_max_pages.max(1),
            repository: config.repository.clone(),
            request_timeout: config.install.request_timeout(),
            command_timeout: config.install.command_timeout(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.version_chooser_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<(T, HeaderMap), GatewayError> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| connect_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!("GET {} returned status {}", url, status);
            return Err(GatewayError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let headers = response.headers().clone();
        let body = response.json().await.map_err(|e| {
            warn!("Failed to parse response from {}: {}", url, e);
            GatewayError::InvalidResponse(e.to_string())
        })?;

        Ok((body, headers))
    }

    /// Post a command, tolerating the server dropping the connection once the request is out
    ///
    /// A command that outlives `command_timeout` is abandoned and treated as sent.
    async fn post_command(&self, url: &str, request: &InstallRequest) -> Result<(), GatewayError> {
        debug!("POST {} {:?}", url, request);

        let response = match self
            .client
            .post(url)
            .json(request)
            .timeout(self.command_timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_connect() => return Err(connect_error(url, e)),
            Err(e) => {
                debug!("Connection to {} ended early: {}", url, e);
                return Ok(());
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!("POST {} returned status {}", url, status);
        }

        if let Err(e) = response.bytes().await {
            debug!("Response body from {} ended early: {}", url, e);
        }

        Ok(())
    }
}

fn connect_error(url: &str, e: reqwest::Error) -> GatewayError {
    if e.is_connect() {
        GatewayError::Unreachable(format!("{}: {}", url, e))
    } else {
        GatewayError::Network(e)
    }
}

/// Extract the `rel="next"` target from a `Link` header
fn next_link(headers: &HeaderMap) -> Option<String> {
    let link = headers.get(LINK)?.to_str().ok()?;
    link.split(',').find_map(|part| {
        let (target, params) = part.split_once(';')?;
        params
            .split(';')
            .any(|p| p.trim() == r#"rel="next""#)
            .then(|| {
                target
                    .trim()
                    .trim_start_matches('<')
                    .trim_end_matches('>')
                    .to_string()
            })
    })
}

#[async_trait::async_trait]
impl Gateway for HttpGateway {
    async fn current_version(&self) -> Result<String, GatewayError> {
        let (current, _) = self.get::<CurrentVersion>(&self.endpoint("current")).await?;
        Ok(current.tag)
    }

    async fn local_inventory(&self) -> Result<Vec<Release>, GatewayError> {
        let (inventory, _) = self
            .get::<LocalInventory>(&self.endpoint("available/local"))
            .await?;
        Ok(inventory.local)
    }

    async fn remote_inventory(&self) -> Result<Vec<Release>, GatewayError> {
        let url = self.endpoint(&format!("available/{}", self.repository));
        let (inventory, _) = self.get::<RepositoryInventory>(&url).await?;

        let mut releases = inventory.remote;
        releases.extend(inventory.local);
        Ok(releases)
    }

    async fn release_feed(&self) -> Result<Vec<String>, GatewayError> {
        let mut tags = Vec::new();
        let mut url = Some(self.feed_url.clone());
        let mut pages = 0;

        while let Some(page_url) = url.take() {
            if pages >= self.feed_max_pages {
                break;
            }
            let (releases, headers) = self.get::<Vec<FeedRelease>>(&page_url).await?;
            pages += 1;

            debug!("Feed page {} returned {} releases", pages, releases.len());
            tags.extend(releases.into_iter().map(|r| r.tag_name));
            url = next_link(&headers);
        }

        Ok(tags)
    }

    async fn pull(&self, request: &InstallRequest) -> Result<(), GatewayError> {
        self.post_command(&self.endpoint("pull/"), request).await
    }

    async fn switch(&self, request: &InstallRequest) -> Result<(), GatewayError> {
        self.post_command(&self.endpoint("current"), request).await
    }
}
