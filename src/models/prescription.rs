//! Server-side prescription projections consumed by pharmacist views.
//!
//! These are read-only records fetched after submission; the in-progress
//! draft lives in `crate::prescription` and never leaves the composer.

use serde::{Deserialize, Serialize};

/// One line of a stored prescription, with the server-computed price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordLine {
    pub medicine_id: String,
    pub medicine_name: String,
    pub quantity: u32,
    pub price: f64,
}

/// A prescription record as stored by the prescription service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionRecord {
    pub id: i64,
    pub visit_id: i64,
    pub doctor_user_id: String,
    pub pharmacy_user_id: Option<String>,
    #[serde(rename = "patientTC")]
    pub patient_id: String,
    pub medicines: Vec<RecordLine>,
    /// Server-side workflow status, passed through verbatim.
    pub status: String,
}
