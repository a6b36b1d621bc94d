//! Wire DTOs for the auth, catalog and prescription services.
//!
//! Field names follow the services' camelCase JSON exactly; domain types in
//! `crate::models` stay in Rust naming and are built from these at the
//! gateway boundary.

use serde::{Deserialize, Serialize};

use crate::models::medicine::MedicineSummary;

// ═══════════════════════════════════════════════════════════
// Auth service
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Serialize)]
pub struct SignInRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfoDto {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    pub token: String,
    pub user_info: UserInfoDto,
}

/// Response of the credential validation endpoint.
///
/// Identity fields are only present when `isValid` is true.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    pub is_valid: bool,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Sign-up payload. Forwarded verbatim; no session state is touched.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    /// Requested role in bare wire form (`DOCTOR`, `PHARMACIST`, `ADMIN`).
    pub role: String,
}

// ═══════════════════════════════════════════════════════════
// Catalog service
// ═══════════════════════════════════════════════════════════

/// Search endpoint response.
///
/// The service has shipped both a paged envelope (`{"content": [...]}`) and
/// a flat array; accept either.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SearchResponse {
    Paged { content: Vec<MedicineSummary> },
    Flat(Vec<MedicineSummary>),
}

impl SearchResponse {
    pub fn into_results(self) -> Vec<MedicineSummary> {
        match self {
            Self::Paged { content } => content,
            Self::Flat(list) => list,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Prescription service
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinePayload {
    pub medicine_id: String,
    pub medicine_name: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrescriptionPayload {
    #[serde(rename = "patientTC")]
    pub patient_id: String,
    pub medicines: Vec<LinePayload>,
}

/// Create endpoint response; only the server-assigned id matters to the
/// two-phase protocol, remaining fields are ignored.
#[derive(Debug, Deserialize)]
pub struct CreateResponse {
    pub id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_response_accepts_paged_envelope() {
        let json = r#"{"content":[{"id":"m1","name":"Aspirin","price":1.0}]}"#;
        let parsed: SearchResponse = serde_json::from_str(json).unwrap();
        let results = parsed.into_results();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].catalog_id, "m1");
    }

    #[test]
    fn search_response_accepts_flat_array() {
        let json = r#"[{"id":"m1","name":"Aspirin","price":1.0},{"id":"m2","name":"Parol","price":2.0}]"#;
        let parsed: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.into_results().len(), 2);
    }

    #[test]
    fn prescription_payload_uses_legacy_patient_field() {
        let payload = PrescriptionPayload {
            patient_id: "12345678901".into(),
            medicines: vec![LinePayload {
                medicine_id: "m1".into(),
                medicine_name: "Aspirin".into(),
                quantity: 2,
            }],
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["patientTC"], "12345678901");
        assert_eq!(json["medicines"][0]["medicineId"], "m1");
        assert_eq!(json["medicines"][0]["medicineName"], "Aspirin");
        assert_eq!(json["medicines"][0]["quantity"], 2);
    }

    #[test]
    fn validate_response_tolerates_missing_identity() {
        let json = r#"{"isValid":false}"#;
        let parsed: ValidateResponse = serde_json::from_str(json).unwrap();
        assert!(!parsed.is_valid);
        assert!(parsed.user_id.is_empty());
        assert!(parsed.roles.is_empty());
    }
}
