//! Room server binary, configured from the environment:
//!
//! - `PARLEY_NAME` — room display name (default "Parley")
//! - `PARLEY_PORT` — TCP port (default 9100)
//! - `PARLEY_PASSWORD` — join password (unset = open room)
//! - `PARLEY_MAX_MEMBERS` — capacity, 0 = unbounded (default 0)
//! - `PARLEY_LOBBY` — lobby directory file; setting it makes the room public

use parley::{ParleyError, ParleyServer, console};
use tracing_subscriber::EnvFilter;

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> Result<(), ParleyError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut builder = ParleyServer::builder()
        .name(&std::env::var("PARLEY_NAME").unwrap_or_else(|_| "Parley".to_owned()))
        .port(env_or("PARLEY_PORT", 9100))
        .max_members(env_or("PARLEY_MAX_MEMBERS", 0));
    if let Ok(password) = std::env::var("PARLEY_PASSWORD") {
        builder = builder.password(&password);
    }
    if let Ok(lobby) = std::env::var("PARLEY_LOBBY") {
        builder = builder.public(lobby);
    }

    let server = builder.build().await?;
    tracing::info!(addr = %server.local_addr()?, "room is up");
    tokio::spawn(console::run(server.room(), server.shutdown_handle()));
    server.run().await
}
