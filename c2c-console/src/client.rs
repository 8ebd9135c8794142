//! Typed commands on top of a [`Gateway`].

use crate::error::{Error, Result};
use crate::gateway::{reject_server_error, Command, Gateway, Param};
use crate::keys::KeyForm;
use crate::session::SessionStore;
use crate::tiles::{self, TileCoord};
use crate::types::*;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use url::Url;

/// Command client bound to the operator session.
///
/// Every command carries the session key as `key=...` and is refused
/// locally with [`Error::NotAuthenticated`] while the session fails the
/// authorization gate.
#[derive(Clone)]
pub struct ConsoleClient {
    gateway: Arc<dyn Gateway>,
    session: SessionStore,
    origin: Url,
    api_prefix: String,
}

impl ConsoleClient {
    pub fn new(gateway: Arc<dyn Gateway>, session: SessionStore, origin: Url, api_prefix: &str) -> Self {
        Self {
            gateway,
            session,
            origin,
            api_prefix: api_prefix.to_string(),
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn api_prefix(&self) -> &str {
        &self.api_prefix
    }

    pub(crate) fn gateway(&self) -> Arc<dyn Gateway> {
        Arc::clone(&self.gateway)
    }

    // ========================================================================
    // Internal helpers
    // ========================================================================

    fn access_key(&self) -> Result<String> {
        let session = self.session.read();
        if !session.is_authenticated() {
            return Err(Error::NotAuthenticated);
        }
        Ok(session.key)
    }

    async fn get<T: DeserializeOwned>(&self, command: Command, extra: Option<Param>) -> Result<T> {
        let mut params = vec![Param::access_key(&self.access_key()?)];
        params.extend(extra);

        let body = self.gateway.get(command.as_str(), &params).await?;
        Ok(serde_json::from_value(reject_server_error(body)?)?)
    }

    // ========================================================================
    // Statistics
    // ========================================================================

    /// Fetch a fresh statistics snapshot.
    pub async fn server_statistics(&self) -> Result<ServerStatistics> {
        self.get(Command::Info, None).await
    }

    // ========================================================================
    // Clients
    // ========================================================================

    /// List every registered client.
    pub async fn list_clients(&self) -> Result<Vec<ClientDescriptor>> {
        self.get(Command::Clients, None).await
    }

    /// Look up one client by id or name.
    pub async fn get_client(&self, client: &ClientRef) -> Result<ClientDescriptor> {
        self.get(Command::Client, Some(client.to_param())).await
    }

    /// Read a client's traffic limits.
    pub async fn client_limits(&self, client: &ClientRef) -> Result<ClientLimits> {
        self.get(Command::Limits, Some(client.to_param())).await
    }

    // ========================================================================
    // API keys
    // ========================================================================

    /// Validate `form` and write the permission record.
    ///
    /// Validation runs first; an invalid form never reaches the gateway.
    pub async fn create_key(&self, form: &KeyForm) -> Result<Value> {
        let request = form.to_request()?;
        let key = self.access_key()?;

        tracing::info!(name = %request.name, urls = request.urls.len(), "creating api key");
        let body = serde_json::to_value(&request)?;
        let resp = self
            .gateway
            .post(Command::Perm.as_str(), &body, &[Param::access_key(&key)])
            .await?;
        reject_server_error(resp)
    }

    // ========================================================================
    // Map tiles
    // ========================================================================

    /// URL of `tile` carrying the session key.
    pub fn tile_url(&self, tile: TileCoord) -> Result<Url> {
        tiles::tile_url(&self.origin, &self.api_prefix, tile, &self.access_key()?)
    }

    /// Download the raw tile image.
    pub async fn fetch_tile(&self, tile: TileCoord) -> Result<Bytes> {
        let key = self.access_key()?;
        self.gateway
            .get_bytes(&tile.command(), &[Param::access_key(&key)])
            .await
    }
}

impl fmt::Debug for ConsoleClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleClient")
            .field("origin", &self.origin.as_str())
            .field("api_prefix", &self.api_prefix)
            .field("session", &self.session)
            .finish()
    }
}
