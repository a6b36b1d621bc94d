//! Remote gateway — the only door to the network.
//!
//! The core never constructs HTTP requests outside this module. Components
//! depend on the [`RemoteGateway`] trait; production wires in [`HttpGateway`]
//! and tests script a [`MockGateway`]. The bearer credential is attached
//! here and nowhere else.

pub mod error;
pub mod http;
pub mod mock;
pub mod types;

use std::future::Future;

use chrono::NaiveDate;

use crate::models::medicine::MedicineSummary;
use crate::models::prescription::PrescriptionRecord;
use crate::models::user::SessionUser;
use crate::session::Credential;

pub use error::GatewayError;
pub use http::HttpGateway;
pub use mock::MockGateway;

/// Result of a successful sign-in: the bearer token and the identity it
/// belongs to. The token is raw wire data; the session store wraps it into a
/// [`Credential`] immediately and owns it from then on.
#[derive(Clone)]
pub struct SignInGrant {
    pub token: String,
    pub user: SessionUser,
}

impl std::fmt::Debug for SignInGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignInGrant")
            .field("token", &"<redacted>")
            .field("user", &self.user)
            .finish()
    }
}

/// Every network operation the client core consumes.
///
/// All methods suspend only at the network boundary and return owned data.
/// Implementations must be shareable across the session store, catalog
/// lookup and composer (`Send + Sync`), and their futures `Send` so
/// fire-and-forget notifications can be spawned.
pub trait RemoteGateway: Send + Sync + 'static {
    /// Validate a persisted credential; `Ok` carries the restored identity.
    /// Any transport error or rejection means the credential is unusable.
    fn validate_credential(
        &self,
        credential: &Credential,
    ) -> impl Future<Output = Result<SessionUser, GatewayError>> + Send;

    /// Exchange email/password for a bearer token and identity.
    fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<SignInGrant, GatewayError>> + Send;

    /// Notify the auth service of a logout. Best-effort; callers ignore the
    /// outcome.
    fn sign_out(
        &self,
        credential: &Credential,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Register a new account. Pass-through; no session state involved.
    fn sign_up(
        &self,
        request: &types::RegistrationRequest,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Search the medicine catalog by name fragment.
    fn search_medicines(
        &self,
        credential: &Credential,
        query: &str,
    ) -> impl Future<Output = Result<Vec<MedicineSummary>, GatewayError>> + Send;

    /// Phase 1: create a prescription record, returning its server id.
    fn create_prescription(
        &self,
        credential: &Credential,
        payload: &types::PrescriptionPayload,
    ) -> impl Future<Output = Result<i64, GatewayError>> + Send;

    /// Phase 2: advance a created prescription to the submitted state.
    fn submit_prescription(
        &self,
        credential: &Credential,
        prescription_id: i64,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Prescriptions still awaiting pharmacy action on the given date.
    fn incomplete_prescriptions(
        &self,
        credential: &Credential,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Vec<PrescriptionRecord>, GatewayError>> + Send;

    /// Fetch the prescription record attached to a visit.
    fn prescription_by_visit(
        &self,
        credential: &Credential,
        visit_id: i64,
    ) -> impl Future<Output = Result<PrescriptionRecord, GatewayError>> + Send;

    /// Fetch a single catalog entry.
    fn medicine_by_id(
        &self,
        credential: &Credential,
        catalog_id: &str,
    ) -> impl Future<Output = Result<MedicineSummary, GatewayError>> + Send;

    /// Trigger the weekly catalog file import (admin).
    fn upload_catalog(
        &self,
        credential: &Credential,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Rebuild the catalog search cache (admin).
    fn rebuild_catalog_cache(
        &self,
        credential: &Credential,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;
}
