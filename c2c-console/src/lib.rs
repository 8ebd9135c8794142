//! c2c Console Client
//!
//! Client-side core of the c2c service operator console: the request gateway
//! for the admin HTTP API, the operator session store, the login flow with
//! remember-me, and the data side of the console screens.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use c2c_console::{AuthState, Console, ConsoleConfig, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let console = Console::new(ConsoleConfig::from_env())?;
//!
//!     // Log in
//!     let mut login = console.auth_flow();
//!     if login.mount().await != AuthState::Authenticated {
//!         login.edit_key("operator-key");
//!         login.set_remember(true);
//!         login.submit().await;
//!     }
//!
//!     if console.is_authorized() {
//!         let mut stats = console.statistics_screen();
//!         if let Some(snapshot) = stats.refresh().await {
//!             println!("server {} up, {} connected", snapshot.version, snapshot.now_connected);
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

mod auth;
mod client;
mod config;
mod console;
mod error;
pub mod gateway;
mod keys;
mod remember;
mod session;
#[cfg(feature = "telemetry")]
pub mod telemetry;
pub mod tiles;
mod types;

pub use auth::{AuthFlow, AuthState};
pub use client::ConsoleClient;
pub use config::{ConsoleConfig, ConsoleConfigBuilder, DEFAULT_API_PREFIX, DEFAULT_ORIGIN};
pub use console::{Console, KeysScreen, MapScreen, StatisticsScreen, UserScreen, DEFAULT_ZOOM};
pub use error::{Error, Result};
pub use gateway::{build_url, Command, Gateway, HttpGateway, Param};
pub use keys::{FormErrors, KeyForm, PermissionRequest, UrlPermission, MIN_NAME_LEN, MIN_TOKEN_LEN};
pub use remember::{FileRememberStore, MemoryRememberStore, RememberRecord, RememberStore};
pub use session::{reduce, Action, Session, SessionStore, MIN_KEY_LEN};
pub use tiles::TileCoord;
pub use types::*;
