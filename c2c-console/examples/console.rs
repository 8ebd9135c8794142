//! Headless console session.
//!
//! Logs in (or restores a remembered login) and prints the server
//! statistics.
//!
//! ```text
//! C2C_CONSOLE_ORIGIN=https://localhost:6060 cargo run --example console -- <key> [--remember]
//! ```

use c2c_console::telemetry::{init_tracing, TracingConfig};
use c2c_console::{AuthState, Console, ConsoleConfig, Result};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing(TracingConfig::default());

    let mut args = std::env::args().skip(1);
    let key = args.next();
    let remember = args.any(|a| a == "--remember");

    let console = Console::new(ConsoleConfig::from_env())?;

    // ========================================================================
    // Login
    // ========================================================================
    let mut login = console.auth_flow();
    let mut state = login.mount().await;

    if state != AuthState::Authenticated {
        let Some(key) = key else {
            eprintln!("usage: console <key> [--remember]");
            return Ok(());
        };
        login.edit_key(key);
        login.set_remember(remember);
        state = login.submit().await;
    }

    if state != AuthState::Authenticated {
        match login.last_error() {
            Some(e) => eprintln!("login failed: {}", e),
            None => eprintln!("login failed"),
        }
        return Ok(());
    }

    println!("{}", console.user_screen().greeting());

    // ========================================================================
    // Statistics
    // ========================================================================
    let mut stats = console.statistics_screen();
    match stats.refresh().await {
        Some(s) => {
            println!("Server version: {}", s.version);
            println!("Max timeout for one connection: {} seconds", s.one_connection_timeout().as_secs());
            println!("Maximum response time: {:?}", s.max_response_time());
            if let Some(up) = s.time_up {
                println!("Server up since: {}", up.to_rfc3339());
            }
            println!("Now connected: {}", s.now_connected);
            println!("Max concurrent connections: {}", s.max_concurrent_connection);
            println!("Connections for all time: {}", s.all_connection);
            for ip in s.ip_activity() {
                println!("  {} count={:?} last={:?}", ip.ip, ip.count, ip.last_time);
            }
        }
        None => {
            if let Some(e) = stats.last_error() {
                eprintln!("statistics unavailable: {}", e);
            }
        }
    }

    Ok(())
}
