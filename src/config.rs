use std::path::PathBuf;
use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "Recetta";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Minimum query length before a catalog search is issued.
pub const MIN_QUERY_CHARS: usize = 2;

/// Quiescence window for catalog search debouncing.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Request timeout for gateway calls, in seconds.
pub const GATEWAY_TIMEOUT_SECS: u64 = 30;

/// Get the application data directory
/// ~/Recetta/ on all platforms (user-visible, per design requirement)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("Recetta")
}

/// Path of the persisted bearer credential.
pub fn credential_path() -> PathBuf {
    app_data_dir().join("credential")
}

/// Backend base URL, including the `/api` prefix.
///
/// Read from `RECETTA_BACKEND_URL`; defaults to the local development backend.
pub fn backend_url() -> String {
    std::env::var("RECETTA_BACKEND_URL")
        .unwrap_or_else(|_| "http://localhost:8080/api".to_string())
}

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> String {
    format!("{}=info", env!("CARGO_PKG_NAME"))
}
