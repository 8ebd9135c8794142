//! Request gateway for the server's admin HTTP API.
//!
//! Every command is addressed as `<origin><prefix><command>?k=v&...`. The
//! gateway holds no state between calls: no retry, no caching, no
//! de-duplication. A call either yields the parsed JSON body or one
//! [`Error`] describing what went wrong.

use crate::config::ConsoleConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde_json::Value;
use std::fmt;
use url::Url;

/// Server commands known to the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Server statistics snapshot.
    Info,
    /// Single registered client.
    Client,
    /// All registered clients.
    Clients,
    /// Validate an operator key.
    CheckKey,
    /// Write an API-key permission record.
    Perm,
    /// Per-client traffic limits.
    Limits,
    /// Map tile root; tiles live under `maps/{z}/{x}/{y}`.
    Maps,
}

impl Command {
    /// Wire name of the command.
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Info => "info",
            Command::Client => "client",
            Command::Clients => "clients",
            Command::CheckKey => "checkKey",
            Command::Perm => "perm",
            Command::Limits => "limits",
            Command::Maps => "maps",
        }
    }
}

impl AsRef<str> for Command {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One query parameter. Order of a parameter list is kept on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub key: String,
    pub value: String,
}

impl Param {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// The `key=<access key>` parameter every authorized command carries.
    pub fn access_key(key: &str) -> Self {
        Self::new("key", key)
    }
}

impl<K: Into<String>, V: Into<String>> From<(K, V)> for Param {
    fn from((key, value): (K, V)) -> Self {
        Self::new(key, value)
    }
}

/// Build the URL for `command` under `origin` + `api_prefix`.
///
/// Keys and values are form-urlencoded, so `&` and `=` inside a value cannot
/// split the query. No query string is emitted when `params` is empty.
pub fn build_url(origin: &Url, api_prefix: &str, command: &str, params: &[Param]) -> Result<Url> {
    let prefix = api_prefix.trim_matches('/');
    let path = if prefix.is_empty() {
        command.trim_start_matches('/').to_string()
    } else {
        format!("{}/{}", prefix, command.trim_start_matches('/'))
    };

    let mut url = origin.join(&path)?;
    if !params.is_empty() {
        let mut query = url.query_pairs_mut();
        query.clear();
        for p in params {
            query.append_pair(&p.key, &p.value);
        }
    }
    Ok(url)
}

/// Turn a body carrying a non-null `error` field into [`Error::Server`].
pub fn reject_server_error(body: Value) -> Result<Value> {
    match body.get("error") {
        None | Some(Value::Null) => Ok(body),
        Some(Value::String(msg)) => Err(Error::Server(msg.clone())),
        Some(other) => Err(Error::Server(other.to_string())),
    }
}

/// Transport seam between the console and the server.
///
/// [`HttpGateway`] talks to a real server; tests plug in their own.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// GET `command`, resolving to the parsed JSON body.
    async fn get(&self, command: &str, params: &[Param]) -> Result<Value>;

    /// POST `body` as JSON to `command`, resolving to the parsed JSON body.
    async fn post(&self, command: &str, body: &Value, params: &[Param]) -> Result<Value>;

    /// GET `command`, resolving to the raw body.
    async fn get_bytes(&self, command: &str, params: &[Param]) -> Result<Bytes>;
}

/// reqwest-backed [`Gateway`].
#[derive(Clone)]
pub struct HttpGateway {
    http: Client,
    origin: Url,
    api_prefix: String,
}

impl HttpGateway {
    /// Create a gateway from console configuration.
    pub fn new(config: &ConsoleConfig) -> Result<Self> {
        let mut builder = Client::builder().danger_accept_invalid_certs(config.accept_invalid_certs);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            origin: config.origin.clone(),
            api_prefix: config.api_prefix.clone(),
        })
    }

    /// URL this gateway would hit for `command`.
    pub fn build_url(&self, command: &str, params: &[Param]) -> Result<Url> {
        build_url(&self.origin, &self.api_prefix, command, params)
    }

    /// Server origin.
    pub fn origin(&self) -> &Url {
        &self.origin
    }

    async fn request(
        &self,
        method: Method,
        command: &str,
        body: Option<&Value>,
        params: &[Param],
    ) -> Result<Bytes> {
        let url = self.build_url(command, params)?;
        tracing::debug!(%method, command, "dispatching request");

        let mut req = self
            .http
            .request(method, url)
            .header(CONTENT_TYPE, "application/json")
            .header(CACHE_CONTROL, "no-cache");

        if let Some(b) = body {
            req = req.json(b);
        }

        let resp = req.send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.bytes().await.unwrap_or_default();
            let err = Error::status_with_body(status, &body);
            tracing::warn!(command, status = status.as_u16(), reason = err.server_message(), "request rejected");
            return Err(err);
        }

        Ok(resp.bytes().await?)
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn get(&self, command: &str, params: &[Param]) -> Result<Value> {
        let body = self.request(Method::GET, command, None, params).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn post(&self, command: &str, body: &Value, params: &[Param]) -> Result<Value> {
        let body = self.request(Method::POST, command, Some(body), params).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn get_bytes(&self, command: &str, params: &[Param]) -> Result<Bytes> {
        self.request(Method::GET, command, None, params).await
    }
}
