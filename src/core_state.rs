//! Transport-agnostic application state.
//!
//! `CoreState` is the single shared state the UI shell holds (wrapped in
//! `Arc` at startup): the gateway, the session store and the catalog search.
//! Prescription composers are begun per composition session and owned by the
//! authoring view, not shared. Pass-through operations for pharmacist and
//! admin views live here so the credential is attached in exactly one place.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::api::{GatewayError, HttpGateway, RemoteGateway};
use crate::catalog::{CatalogSearch, SearchOutcome};
use crate::guard::{self, GuardDecision};
use crate::models::medicine::MedicineSummary;
use crate::models::prescription::PrescriptionRecord;
use crate::models::user::Role;
use crate::prescription::PrescriptionComposer;
use crate::session::{CredentialStore, SessionError, SessionStore};

/// Errors surfaced by `CoreState` convenience operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Shared client core: gateway + session + catalog.
pub struct CoreState<G = HttpGateway> {
    gateway: Arc<G>,
    session: SessionStore<G>,
    catalog: CatalogSearch<G>,
}

impl CoreState<HttpGateway> {
    /// Production wiring: HTTP gateway from the environment, credential at
    /// the app-default location.
    pub fn new() -> Self {
        Self::with_parts(
            Arc::new(HttpGateway::from_env()),
            CredentialStore::default_location(),
        )
    }
}

impl Default for CoreState<HttpGateway> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: RemoteGateway> CoreState<G> {
    /// Assemble from explicit parts (tests inject a mock gateway here).
    pub fn with_parts(gateway: Arc<G>, credentials: CredentialStore) -> Self {
        Self {
            session: SessionStore::new(Arc::clone(&gateway), credentials),
            catalog: CatalogSearch::new(Arc::clone(&gateway)),
            gateway,
        }
    }

    pub fn session(&self) -> &SessionStore<G> {
        &self.session
    }

    pub fn catalog(&self) -> &CatalogSearch<G> {
        &self.catalog
    }

    /// Gate a protected view on the live session.
    pub fn guard(&self, required_roles: &[Role]) -> GuardDecision {
        guard::evaluate(&self.session.snapshot(), required_roles)
    }

    /// Begin a new composition session. One composer per prescription.
    pub fn begin_prescription(&self) -> PrescriptionComposer<G> {
        PrescriptionComposer::new(Arc::clone(&self.gateway))
    }

    /// Debounced catalog search with the session credential attached.
    pub async fn search_medicines(&self, query: &str) -> Result<SearchOutcome, CoreError> {
        let credential = self.session.credential()?;
        Ok(self.catalog.search(&credential, query).await?)
    }

    // ── Pass-through views (pharmacist / admin) ─────────────

    /// Prescriptions awaiting pharmacy action on `date`.
    pub async fn incomplete_prescriptions(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<PrescriptionRecord>, CoreError> {
        let credential = self.session.credential()?;
        Ok(self
            .gateway
            .incomplete_prescriptions(&credential, date)
            .await?)
    }

    pub async fn prescription_by_visit(
        &self,
        visit_id: i64,
    ) -> Result<PrescriptionRecord, CoreError> {
        let credential = self.session.credential()?;
        Ok(self.gateway.prescription_by_visit(&credential, visit_id).await?)
    }

    pub async fn medicine_by_id(&self, catalog_id: &str) -> Result<MedicineSummary, CoreError> {
        let credential = self.session.credential()?;
        Ok(self.gateway.medicine_by_id(&credential, catalog_id).await?)
    }

    /// Trigger the weekly catalog file import (admin).
    pub async fn upload_catalog(&self) -> Result<(), CoreError> {
        let credential = self.session.credential()?;
        Ok(self.gateway.upload_catalog(&credential).await?)
    }

    /// Rebuild the catalog search cache (admin).
    pub async fn rebuild_catalog_cache(&self) -> Result<(), CoreError> {
        let credential = self.session.credential()?;
        Ok(self.gateway.rebuild_catalog_cache(&credential).await?)
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MockGateway, SignInGrant};
    use crate::guard::DenialReason;
    use crate::models::user::SessionUser;
    use crate::prescription::ComposerState;
    use tempfile::TempDir;

    fn core_in(dir: &TempDir, gateway: &Arc<MockGateway>) -> CoreState<MockGateway> {
        CoreState::with_parts(
            Arc::clone(gateway),
            CredentialStore::new(dir.path().join("credential")),
        )
    }

    async fn sign_in(core: &CoreState<MockGateway>, gateway: &MockGateway, roles: &[&str]) {
        let raw: Vec<String> = roles.iter().map(|r| r.to_string()).collect();
        gateway.script_sign_in(Ok(SignInGrant {
            token: "bearer-1".into(),
            user: SessionUser::from_wire(
                "u-1".into(),
                "u@clinic.example".into(),
                "A",
                "B",
                &raw,
            ),
        }));
        core.session().login("u@clinic.example", "pw").await.unwrap();
    }

    #[tokio::test]
    async fn begin_prescription_starts_a_fresh_editing_session() {
        let dir = TempDir::new().unwrap();
        let gateway = Arc::new(MockGateway::new());
        let core = core_in(&dir, &gateway);

        let composer = core.begin_prescription();
        assert_eq!(composer.state(), ComposerState::Editing);
        assert_eq!(composer.draft().lines.len(), 1);
    }

    #[tokio::test]
    async fn pass_through_views_require_an_authenticated_session() {
        let dir = TempDir::new().unwrap();
        let gateway = Arc::new(MockGateway::new());
        let core = core_in(&dir, &gateway);

        let date = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
        match core.incomplete_prescriptions(date).await {
            Err(CoreError::Session(SessionError::NotAuthenticated)) => {}
            other => panic!("Expected NotAuthenticated, got: {other:?}"),
        }
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn pass_through_views_attach_the_session_credential() {
        let dir = TempDir::new().unwrap();
        let gateway = Arc::new(MockGateway::new());
        let core = core_in(&dir, &gateway);
        sign_in(&core, &gateway, &["ROLE_PHARMACIST"]).await;

        let date = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
        core.incomplete_prescriptions(date).await.unwrap();
        core.upload_catalog().await.unwrap();
        core.rebuild_catalog_cache().await.unwrap();

        assert_eq!(gateway.call_count("incomplete:"), 1);
        assert_eq!(gateway.call_count("upload"), 1);
        assert_eq!(gateway.call_count("cache"), 1);
    }

    #[tokio::test]
    async fn guard_consults_the_live_session() {
        let dir = TempDir::new().unwrap();
        let gateway = Arc::new(MockGateway::new());
        let core = core_in(&dir, &gateway);

        assert_eq!(
            core.guard(&[]),
            GuardDecision::Denied(DenialReason::NotSignedIn)
        );

        sign_in(&core, &gateway, &["ROLE_DOCTOR"]).await;

        assert_eq!(core.guard(&[]), GuardDecision::Allowed);
        assert_eq!(core.guard(&[Role::Doctor]), GuardDecision::Allowed);
        assert_eq!(
            core.guard(&[Role::Admin]),
            GuardDecision::Denied(DenialReason::MissingRole)
        );
    }

    #[tokio::test]
    async fn search_requires_authentication() {
        let dir = TempDir::new().unwrap();
        let gateway = Arc::new(MockGateway::new());
        let core = core_in(&dir, &gateway);

        match core.search_medicines("aspirin").await {
            Err(CoreError::Session(SessionError::NotAuthenticated)) => {}
            other => panic!("Expected NotAuthenticated, got: {other:?}"),
        }
        assert!(gateway.calls().is_empty());
    }
}
