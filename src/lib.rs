//! Recetta — transport-agnostic client core for a role-gated clinical
//! e-prescription front-end.
//!
//! Clinicians search a medicine catalog, author prescriptions of
//! variable-length line items, and submit them through a two-phase remote
//! workflow; pharmacists and administrators consume derived views. The UI
//! shell owns rendering and navigation; this crate owns the state that is
//! hard to get right: the session/authorization lifecycle and the
//! composition-and-submission workflow, including their ordering and
//! partial-failure semantics.

pub mod api;
pub mod catalog;
pub mod config;
pub mod core_state;
pub mod guard;
pub mod models;
pub mod prescription;
pub mod session;

use tracing_subscriber::EnvFilter;

/// Initialize tracing. Called once by the hosting shell at startup.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("Recetta core starting v{}", config::APP_VERSION);
}
