//! Runtime configuration
//!
//! Everything is read from the environment; there is no config file.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_NUTRITIONIX_BASE_URL: &str = "https://trackapi.nutritionix.com";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Credentials and endpoint for the remote food database
#[derive(Debug, Clone)]
pub struct NutritionixConfig {
    pub app_id: String,
    pub app_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
    /// `None` when credentials are absent; lookups are then disabled
    pub nutritionix: Option<NutritionixConfig>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_path: database_path_from_env(),
            nutritionix: nutritionix_from_env(),
        }
    }
}

/// Get the database path from `MACRO_UTIL_DATABASE_PATH` or default to
/// `<project>/data/macro_util.db` next to the executable
fn database_path_from_env() -> PathBuf {
    std::env::var("MACRO_UTIL_DATABASE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let mut path = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()))
                .unwrap_or_else(|| PathBuf::from("."));

            // Go up from target/release or target/debug to project root
            if path.ends_with("release") || path.ends_with("debug") {
                if let Some(parent) = path.parent() {
                    if let Some(grandparent) = parent.parent() {
                        path = grandparent.to_path_buf();
                    }
                }
            }

            path.push("data");
            path.push("macro_util.db");
            path
        })
}

fn nutritionix_from_env() -> Option<NutritionixConfig> {
    let app_id = non_empty_var("NUTRITIONIX_APP_ID")?;
    let app_key = non_empty_var("NUTRITIONIX_APP_KEY")?;

    let base_url = non_empty_var("NUTRITIONIX_BASE_URL")
        .unwrap_or_else(|| DEFAULT_NUTRITIONIX_BASE_URL.to_string());

    let timeout_secs = non_empty_var("NUTRITIONIX_TIMEOUT_SECS")
        .and_then(|s| s.parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(DEFAULT_TIMEOUT_SECS);

    Some(NutritionixConfig {
        app_id,
        app_key,
        base_url: base_url.trim_end_matches('/').to_string(),
        timeout: Duration::from_secs(timeout_secs),
    })
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
