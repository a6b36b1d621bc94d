//! Scripted in-memory gateway for tests.
//!
//! Responses are configured per operation (and per query for searches),
//! optionally with artificial latency so ordering races can be reproduced
//! under `tokio::time::pause`. Every call that would reach the network is
//! recorded, which lets tests assert "zero network calls" directly.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use chrono::NaiveDate;

use crate::models::medicine::MedicineSummary;
use crate::models::prescription::PrescriptionRecord;
use crate::models::user::SessionUser;
use crate::session::Credential;

use super::error::GatewayError;
use super::types::{PrescriptionPayload, RegistrationRequest};
use super::{RemoteGateway, SignInGrant};

fn unscripted() -> GatewayError {
    GatewayError::Transport("unscripted mock call".to_string())
}

#[derive(Default)]
struct Script {
    validate: Option<Result<SessionUser, GatewayError>>,
    validate_delay: Option<Duration>,
    sign_in: Option<Result<SignInGrant, GatewayError>>,
    sign_out_delay: Option<Duration>,
    sign_up: Option<Result<(), GatewayError>>,
    search: HashMap<String, Result<Vec<MedicineSummary>, GatewayError>>,
    search_delays: HashMap<String, Duration>,
    create: VecDeque<Result<i64, GatewayError>>,
    submit: VecDeque<Result<(), GatewayError>>,
    incomplete: Option<Result<Vec<PrescriptionRecord>, GatewayError>>,
    by_visit: Option<Result<PrescriptionRecord, GatewayError>>,
    medicine: Option<Result<MedicineSummary, GatewayError>>,
}

/// Configurable fake gateway with a call log.
#[derive(Default)]
pub struct MockGateway {
    script: Mutex<Script>,
    calls: Mutex<Vec<String>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Scripting ───────────────────────────────────────────

    pub fn script_validate(&self, result: Result<SessionUser, GatewayError>) {
        self.lock_script().validate = Some(result);
    }

    /// Delay the validation response, to reproduce a slow bootstrap.
    pub fn script_validate_delay(&self, delay: Duration) {
        self.lock_script().validate_delay = Some(delay);
    }

    pub fn script_sign_in(&self, result: Result<SignInGrant, GatewayError>) {
        self.lock_script().sign_in = Some(result);
    }

    /// Delay the sign-out acknowledgement (it may effectively never arrive).
    pub fn script_sign_out_delay(&self, delay: Duration) {
        self.lock_script().sign_out_delay = Some(delay);
    }

    pub fn script_sign_up(&self, result: Result<(), GatewayError>) {
        self.lock_script().sign_up = Some(result);
    }

    pub fn script_search(&self, query: &str, result: Result<Vec<MedicineSummary>, GatewayError>) {
        self.lock_script().search.insert(query.to_string(), result);
    }

    /// Delay the response for one query, to reproduce out-of-order arrivals.
    pub fn script_search_delay(&self, query: &str, delay: Duration) {
        self.lock_script()
            .search_delays
            .insert(query.to_string(), delay);
    }

    /// Queue the next create-prescription outcome (consumed in order).
    pub fn script_create(&self, result: Result<i64, GatewayError>) {
        self.lock_script().create.push_back(result);
    }

    /// Queue the next submit-prescription outcome (consumed in order).
    pub fn script_submit(&self, result: Result<(), GatewayError>) {
        self.lock_script().submit.push_back(result);
    }

    pub fn script_incomplete(&self, result: Result<Vec<PrescriptionRecord>, GatewayError>) {
        self.lock_script().incomplete = Some(result);
    }

    pub fn script_by_visit(&self, result: Result<PrescriptionRecord, GatewayError>) {
        self.lock_script().by_visit = Some(result);
    }

    pub fn script_medicine(&self, result: Result<MedicineSummary, GatewayError>) {
        self.lock_script().medicine = Some(result);
    }

    // ── Call log ────────────────────────────────────────────

    /// Every network call issued so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("mock call log poisoned").clone()
    }

    /// Number of recorded calls whose label starts with `prefix`.
    pub fn call_count(&self, prefix: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn record(&self, label: String) {
        self.calls.lock().expect("mock call log poisoned").push(label);
    }

    fn lock_script(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().expect("mock script poisoned")
    }
}

impl RemoteGateway for MockGateway {
    async fn validate_credential(
        &self,
        _credential: &Credential,
    ) -> Result<SessionUser, GatewayError> {
        self.record("validate".to_string());
        let (delay, result) = {
            let script = self.lock_script();
            (
                script.validate_delay,
                script
                    .validate
                    .clone()
                    .unwrap_or(Err(GatewayError::InvalidCredentials)),
            )
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        result
    }

    async fn sign_in(&self, email: &str, _password: &str) -> Result<SignInGrant, GatewayError> {
        self.record(format!("sign_in:{email}"));
        let result = self
            .lock_script()
            .sign_in
            .clone()
            .unwrap_or(Err(GatewayError::InvalidCredentials));
        result
    }

    async fn sign_out(&self, _credential: &Credential) -> Result<(), GatewayError> {
        self.record("sign_out".to_string());
        let delay = self.lock_script().sign_out_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    async fn sign_up(&self, request: &RegistrationRequest) -> Result<(), GatewayError> {
        self.record(format!("sign_up:{}", request.email));
        self.lock_script().sign_up.clone().unwrap_or(Ok(()))
    }

    async fn search_medicines(
        &self,
        _credential: &Credential,
        query: &str,
    ) -> Result<Vec<MedicineSummary>, GatewayError> {
        self.record(format!("search:{query}"));
        let (delay, result) = {
            let script = self.lock_script();
            (
                script.search_delays.get(query).copied(),
                script
                    .search
                    .get(query)
                    .cloned()
                    .unwrap_or_else(|| Ok(Vec::new())),
            )
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        result
    }

    async fn create_prescription(
        &self,
        _credential: &Credential,
        _payload: &PrescriptionPayload,
    ) -> Result<i64, GatewayError> {
        self.record("create".to_string());
        self.lock_script()
            .create
            .pop_front()
            .unwrap_or_else(|| Err(unscripted()))
    }

    async fn submit_prescription(
        &self,
        _credential: &Credential,
        prescription_id: i64,
    ) -> Result<(), GatewayError> {
        self.record(format!("submit:{prescription_id}"));
        self.lock_script()
            .submit
            .pop_front()
            .unwrap_or_else(|| Err(unscripted()))
    }

    async fn incomplete_prescriptions(
        &self,
        _credential: &Credential,
        date: NaiveDate,
    ) -> Result<Vec<PrescriptionRecord>, GatewayError> {
        self.record(format!("incomplete:{date}"));
        self.lock_script()
            .incomplete
            .clone()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn prescription_by_visit(
        &self,
        _credential: &Credential,
        visit_id: i64,
    ) -> Result<PrescriptionRecord, GatewayError> {
        self.record(format!("visit:{visit_id}"));
        self.lock_script()
            .by_visit
            .clone()
            .unwrap_or_else(|| Err(unscripted()))
    }

    async fn medicine_by_id(
        &self,
        _credential: &Credential,
        catalog_id: &str,
    ) -> Result<MedicineSummary, GatewayError> {
        self.record(format!("medicine:{catalog_id}"));
        self.lock_script()
            .medicine
            .clone()
            .unwrap_or_else(|| Err(unscripted()))
    }

    async fn upload_catalog(&self, _credential: &Credential) -> Result<(), GatewayError> {
        self.record("upload".to_string());
        Ok(())
    }

    async fn rebuild_catalog_cache(&self, _credential: &Credential) -> Result<(), GatewayError> {
        self.record("cache".to_string());
        Ok(())
    }
}
