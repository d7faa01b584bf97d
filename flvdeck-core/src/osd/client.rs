//! HTTP client for the transcoder's overlay control endpoints

use async_trait::async_trait;
use serde::Serialize;
use url::Url;

use super::OsdError;
use crate::config::OsdServiceConfig;

/// Overlay service operations.
///
/// Both calls return the service's plain-text acknowledgement.
#[async_trait]
pub trait OsdClient: Send + Sync {
    /// Replaces the remote filter graph. An empty string selects passthrough.
    ///
    /// # Errors
    ///
    /// - `OsdError::RemoteUnreachable` - Transport failure
    /// - `OsdError::RemoteRejected` - Non-success response status
    async fn set_osd(&self, effective: &str) -> Result<String, OsdError>;

    /// Ends the remote session.
    ///
    /// # Errors
    ///
    /// - `OsdError::RemoteUnreachable` - Transport failure
    /// - `OsdError::RemoteRejected` - Non-success response status
    async fn close(&self) -> Result<String, OsdError>;
}

#[derive(Debug, Serialize)]
struct SetOsdRequest<'a> {
    osd: &'a str,
}

/// `reqwest` implementation talking to `/setosd` and `/close`.
#[derive(Debug, Clone)]
pub struct HttpOsdClient {
    setosd_url: Url,
    close_url: Url,
    client: reqwest::Client,
}

impl HttpOsdClient {
    /// Creates a client resolving both endpoints against `config.base_url`.
    ///
    /// The base path is treated as a directory, so `http://h/ffmtrans` and
    /// `http://h/ffmtrans/` both resolve to `http://h/ffmtrans/setosd`.
    ///
    /// # Errors
    ///
    /// - `OsdError::InvalidEndpoint` - Base URL does not parse
    /// - `OsdError::ClientSetup` - HTTP client could not be built
    pub fn new(config: &OsdServiceConfig) -> Result<Self, OsdError> {
        let mut base = Url::parse(&config.base_url)?;
        if !base.path().ends_with('/') {
            let directory = format!("{}/", base.path());
            base.set_path(&directory);
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .build()
            .map_err(|e| OsdError::ClientSetup {
                reason: e.to_string(),
            })?;

        Ok(Self {
            setosd_url: base.join("setosd")?,
            close_url: base.join("close")?,
            client,
        })
    }

    pub fn setosd_url(&self) -> &Url {
        &self.setosd_url
    }

    pub fn close_url(&self) -> &Url {
        &self.close_url
    }

    fn unreachable(endpoint: &Url, error: reqwest::Error) -> OsdError {
        OsdError::RemoteUnreachable {
            endpoint: endpoint.to_string(),
            reason: error.to_string(),
        }
    }

    async fn acknowledgement(
        endpoint: &Url,
        response: reqwest::Response,
    ) -> Result<String, OsdError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Self::unreachable(endpoint, e))?;

        if !status.is_success() {
            return Err(OsdError::RemoteRejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }
}

#[async_trait]
impl OsdClient for HttpOsdClient {
    async fn set_osd(&self, effective: &str) -> Result<String, OsdError> {
        let response = self
            .client
            .post(self.setosd_url.clone())
            .json(&SetOsdRequest { osd: effective })
            .send()
            .await
            .map_err(|e| Self::unreachable(&self.setosd_url, e))?;

        Self::acknowledgement(&self.setosd_url, response).await
    }

    async fn close(&self) -> Result<String, OsdError> {
        let response = self
            .client
            .get(self.close_url.clone())
            .send()
            .await
            .map_err(|e| Self::unreachable(&self.close_url, e))?;

        Self::acknowledgement(&self.close_url, response).await
    }
}
