mod config;
pub mod store;

pub use config::{AssistantConfig, Config, EscalationConfig, SnoozeConfig, StreakConfig};
pub use store::Store;

use std::path::PathBuf;

/// Returns `~/.config/wakeguard[-dev]/` based on WAKEGUARD_ENV.
///
/// Set WAKEGUARD_ENV=dev to use the development data directory.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("WAKEGUARD_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("wakeguard-dev")
    } else {
        base_dir.join("wakeguard")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
