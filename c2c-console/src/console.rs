//! Console wiring and per-screen state.
//!
//! [`Console`] owns the shared pieces and hands each screen an explicit
//! handle to them. Screens hold only data a renderer needs; drawing is left
//! to the UI layer.

use crate::auth::AuthFlow;
use crate::client::ConsoleClient;
use crate::config::ConsoleConfig;
use crate::error::{Error, Result};
use crate::gateway::{Gateway, HttpGateway};
use crate::keys::{FormErrors, KeyForm};
use crate::remember::{FileRememberStore, RememberStore};
use crate::session::{Session, SessionStore};
use crate::tiles::{self, TileCoord};
use crate::types::ServerStatistics;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;

/// Console application root.
pub struct Console {
    config: ConsoleConfig,
    client: ConsoleClient,
    remember_store: Arc<dyn RememberStore>,
}

impl Console {
    /// Console talking HTTP to `config.origin`, remembering logins in
    /// `config.remember_path`.
    pub fn new(config: ConsoleConfig) -> Result<Self> {
        let gateway = Arc::new(HttpGateway::new(&config)?);
        let remember_store = Arc::new(FileRememberStore::new(config.remember_path.clone()));
        Ok(Self::with_parts(config, gateway, remember_store))
    }

    /// Console over caller-supplied transport and storage.
    pub fn with_parts(
        config: ConsoleConfig,
        gateway: Arc<dyn Gateway>,
        remember_store: Arc<dyn RememberStore>,
    ) -> Self {
        let client = ConsoleClient::new(
            gateway,
            SessionStore::default(),
            config.origin.clone(),
            &config.api_prefix,
        );
        Self {
            config,
            client,
            remember_store,
        }
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    pub fn session(&self) -> SessionStore {
        self.client.session().clone()
    }

    pub fn client(&self) -> ConsoleClient {
        self.client.clone()
    }

    /// Whether the main screens may be shown.
    pub fn is_authorized(&self) -> bool {
        self.client.session().is_authenticated()
    }

    /// Login flow writing into this console's session.
    pub fn auth_flow(&self) -> AuthFlow {
        AuthFlow::new(
            self.gateway(),
            self.session(),
            Arc::clone(&self.remember_store),
        )
        .with_verify_delay(self.config.verify_delay)
        .with_revalidation(self.config.revalidate_remembered)
    }

    pub fn statistics_screen(&self) -> StatisticsScreen {
        StatisticsScreen::new(self.client())
    }

    pub fn keys_screen(&self) -> KeysScreen {
        KeysScreen::new(self.client())
    }

    pub fn user_screen(&self) -> UserScreen {
        UserScreen::new(self.session())
    }

    pub fn map_screen(&self, lat: f64, lng: f64) -> MapScreen {
        MapScreen::new(self.client(), lat, lng)
    }

    fn gateway(&self) -> Arc<dyn Gateway> {
        self.client.gateway()
    }
}

// ============================================================================
// Statistics
// ============================================================================

/// Server statistics view.
#[derive(Debug)]
pub struct StatisticsScreen {
    client: ConsoleClient,
    snapshot: Option<ServerStatistics>,
    refreshed_at: Option<DateTime<Utc>>,
    last_error: Option<Error>,
}

impl StatisticsScreen {
    pub fn new(client: ConsoleClient) -> Self {
        Self {
            client,
            snapshot: None,
            refreshed_at: None,
            last_error: None,
        }
    }

    /// Fetch a new snapshot, replacing the old one wholesale.
    ///
    /// On failure the previous snapshot stays and the error is kept for
    /// display.
    pub async fn refresh(&mut self) -> Option<&ServerStatistics> {
        match self.client.server_statistics().await {
            Ok(stats) => {
                self.snapshot = Some(stats);
                self.refreshed_at = Some(Utc::now());
                self.last_error = None;
                self.snapshot.as_ref()
            }
            Err(e) => {
                tracing::warn!(error = %e, "statistics refresh failed");
                self.last_error = Some(e);
                None
            }
        }
    }

    pub fn snapshot(&self) -> Option<&ServerStatistics> {
        self.snapshot.as_ref()
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    pub fn last_error(&self) -> Option<&Error> {
        self.last_error.as_ref()
    }
}

// ============================================================================
// API keys
// ============================================================================

/// Key creation view.
#[derive(Debug)]
pub struct KeysScreen {
    client: ConsoleClient,
    pub form: KeyForm,
    errors: FormErrors,
}

impl KeysScreen {
    pub fn new(client: ConsoleClient) -> Self {
        Self {
            client,
            form: KeyForm::new(),
            errors: FormErrors::default(),
        }
    }

    /// Field errors from the last submit.
    pub fn errors(&self) -> FormErrors {
        self.errors
    }

    /// Validate and send the form. A sent form is reset.
    pub async fn submit(&mut self) -> Result<Value> {
        self.errors = self.form.validate();
        if self.errors.any() {
            return Err(Error::Validation(self.errors));
        }

        let result = self.client.create_key(&self.form).await;

        if result.is_ok() {
            self.form = KeyForm::new();
        }
        result
    }
}

// ============================================================================
// User
// ============================================================================

/// Operator identity view.
#[derive(Debug, Clone)]
pub struct UserScreen {
    session: SessionStore,
}

impl UserScreen {
    pub fn new(session: SessionStore) -> Self {
        Self { session }
    }

    pub fn identity(&self) -> Session {
        self.session.read()
    }

    pub fn greeting(&self) -> String {
        format!("Hello, {}", self.session.read().name)
    }
}

// ============================================================================
// Map
// ============================================================================

/// Default zoom of the map view.
pub const DEFAULT_ZOOM: u8 = 13;

/// Map view centered on a point.
#[derive(Debug, Clone)]
pub struct MapScreen {
    client: ConsoleClient,
    pub lat: f64,
    pub lng: f64,
    pub zoom: u8,
}

impl MapScreen {
    pub fn new(client: ConsoleClient, lat: f64, lng: f64) -> Self {
        Self {
            client,
            lat,
            lng,
            zoom: DEFAULT_ZOOM,
        }
    }

    /// Template for a tile layer; the renderer fills in `{accessToken}`.
    pub fn tile_template(&self) -> Result<String> {
        tiles::tile_template(self.client.origin(), self.client.api_prefix())
    }

    /// Tile under the map center.
    pub fn center_tile(&self) -> Option<TileCoord> {
        TileCoord::from_lat_lng(self.lat, self.lng, self.zoom)
    }

    pub fn tile_url(&self, tile: TileCoord) -> Result<url::Url> {
        self.client.tile_url(tile)
    }

    pub async fn fetch_tile(&self, tile: TileCoord) -> Result<Bytes> {
        self.client.fetch_tile(tile).await
    }
}
