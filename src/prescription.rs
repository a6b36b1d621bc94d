//! Prescription composition and two-phase submission.
//!
//! The composer owns one draft for its lifetime: patient identifier plus an
//! ordered list of medicine lines. Submission is a two-call saga against the
//! prescription service: create (phase 1), then submit (phase 2). It is
//! deliberately not transactional: when phase 1 succeeds and phase 2 fails,
//! a record exists server-side in an incomplete state, and the result says
//! so explicitly. Collapsing that into a plain failure would leave the
//! prescription in limbo without the clinician ever knowing.
//!
//! State machine, one composition session:
//!
//! ```text
//! Editing ──(valid, submit)──────▶ Submitting
//! Editing ◀─(validation errors)──┘
//! Submitting ──(create ok)──▶ AwaitingSubmit ──(submit ok)──▶ Completed
//! Submitting ──(create err)─▶ Failed ──(retry)──▶ Submitting
//! AwaitingSubmit ──(submit err)─▶ PartiallyCreated ──(resume)──▶ AwaitingSubmit
//! ```

use std::sync::Arc;

use uuid::Uuid;

use crate::api::types::{LinePayload, PrescriptionPayload};
use crate::api::{GatewayError, RemoteGateway};
use crate::models::medicine::MedicineSummary;
use crate::session::Credential;

// ═══════════════════════════════════════════════════════════
// Draft
// ═══════════════════════════════════════════════════════════

/// One medicine line of the draft.
///
/// `medicine_id` and `medicine_name` are set together from a catalog entry,
/// never separately. Both may be transiently empty while the line is edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrescriptionLine {
    pub medicine_id: String,
    pub medicine_name: String,
    pub quantity: u32,
}

impl PrescriptionLine {
    fn empty() -> Self {
        Self {
            medicine_id: String::new(),
            medicine_name: String::new(),
            quantity: 1,
        }
    }
}

/// The in-progress prescription. Owned exclusively by the composer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrescriptionDraft {
    pub patient_id: String,
    pub lines: Vec<PrescriptionLine>,
}

impl PrescriptionDraft {
    /// Fresh draft with a single empty line, matching the authoring form.
    fn new() -> Self {
        Self {
            patient_id: String::new(),
            lines: vec![PrescriptionLine::empty()],
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Validation
// ═══════════════════════════════════════════════════════════

/// Field-scoped problems for one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineErrors {
    pub index: usize,
    pub medicine_id: Option<&'static str>,
    pub quantity: Option<&'static str>,
}

/// Everything wrong with the draft, scoped per field so the form can attach
/// messages in place. Resolved locally; never reaches the network layer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationErrors {
    pub patient_id: Option<&'static str>,
    pub draft: Option<&'static str>,
    pub lines: Vec<LineErrors>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.patient_id.is_none() && self.draft.is_none() && self.lines.is_empty()
    }

    fn count(&self) -> usize {
        usize::from(self.patient_id.is_some())
            + usize::from(self.draft.is_some())
            + self
                .lines
                .iter()
                .map(|l| usize::from(l.medicine_id.is_some()) + usize::from(l.quantity.is_some()))
                .sum::<usize>()
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} field error(s)", self.count())
    }
}

// ═══════════════════════════════════════════════════════════
// Results and errors
// ═══════════════════════════════════════════════════════════

/// How one submission attempt ended. Produced once per attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionResult {
    /// Both phases succeeded; the draft was cleared.
    Created(i64),
    /// Phase 1 created a server-side record but phase 2 failed: the record
    /// exists in an incomplete state and needs separate resolution.
    CreatedButNotSubmitted(i64, GatewayError),
    /// Phase 1 failed; nothing exists server-side.
    Failed(GatewayError),
}

/// Where the composer is in its state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposerState {
    Editing,
    Submitting,
    AwaitingSubmit { prescription_id: i64 },
    /// Terminal for this composition session.
    Completed { prescription_id: i64 },
    /// Terminal but recoverable: phase 2 can be resumed with the known id.
    PartiallyCreated { prescription_id: i64 },
    Failed,
}

/// Errors from composer operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ComposerError {
    #[error("Draft is invalid: {0}")]
    Validation(ValidationErrors),
    #[error("Line {0} does not exist")]
    LineOutOfRange(usize),
    #[error("Operation not permitted in state {0:?}")]
    InvalidState(ComposerState),
}

// ═══════════════════════════════════════════════════════════
// Composer
// ═══════════════════════════════════════════════════════════

const PATIENT_REQUIRED: &str = "Patient identifier is required";
const MEDICINE_REQUIRED: &str = "Select a medicine";
const QUANTITY_MIN: &str = "Quantity must be at least 1";
const LINE_REQUIRED: &str = "At least one medicine line is required";

/// Owns a draft and drives it through the two-phase submission protocol.
///
/// One composer per composition session; after `Completed` a new composer is
/// begun for the next prescription.
pub struct PrescriptionComposer<G> {
    gateway: Arc<G>,
    draft: PrescriptionDraft,
    state: ComposerState,
    /// Correlates the log lines of one composition session.
    composition_id: Uuid,
}

impl<G: RemoteGateway> PrescriptionComposer<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            draft: PrescriptionDraft::new(),
            state: ComposerState::Editing,
            composition_id: Uuid::new_v4(),
        }
    }

    pub fn state(&self) -> ComposerState {
        self.state
    }

    pub fn draft(&self) -> &PrescriptionDraft {
        &self.draft
    }

    // ── Editing ─────────────────────────────────────────────

    pub fn set_patient_id(&mut self, patient_id: &str) -> Result<(), ComposerError> {
        self.ensure_editable()?;
        self.draft.patient_id = patient_id.trim().to_string();
        Ok(())
    }

    /// Append a fresh empty line; returns its position.
    pub fn add_line(&mut self) -> Result<usize, ComposerError> {
        self.ensure_editable()?;
        self.draft.lines.push(PrescriptionLine::empty());
        Ok(self.draft.lines.len() - 1)
    }

    /// Remove the line at `index`. Remaining lines keep their order.
    pub fn remove_line(&mut self, index: usize) -> Result<(), ComposerError> {
        self.ensure_editable()?;
        if index >= self.draft.lines.len() {
            return Err(ComposerError::LineOutOfRange(index));
        }
        self.draft.lines.remove(index);
        Ok(())
    }

    /// Attach a catalog entry to the line at `index`.
    ///
    /// Id and name are set together; a line never references a name without
    /// its id or vice versa.
    pub fn select_medicine(
        &mut self,
        index: usize,
        medicine: &MedicineSummary,
    ) -> Result<(), ComposerError> {
        self.ensure_editable()?;
        let line = self
            .draft
            .lines
            .get_mut(index)
            .ok_or(ComposerError::LineOutOfRange(index))?;
        line.medicine_id = medicine.catalog_id.clone();
        line.medicine_name = medicine.name.clone();
        Ok(())
    }

    /// Detach the catalog entry from the line at `index` (both fields).
    pub fn clear_medicine(&mut self, index: usize) -> Result<(), ComposerError> {
        self.ensure_editable()?;
        let line = self
            .draft
            .lines
            .get_mut(index)
            .ok_or(ComposerError::LineOutOfRange(index))?;
        line.medicine_id.clear();
        line.medicine_name.clear();
        Ok(())
    }

    pub fn set_quantity(&mut self, index: usize, quantity: u32) -> Result<(), ComposerError> {
        self.ensure_editable()?;
        let line = self
            .draft
            .lines
            .get_mut(index)
            .ok_or(ComposerError::LineOutOfRange(index))?;
        line.quantity = quantity;
        Ok(())
    }

    /// Throw the draft away and start over. Also the explicit way out of
    /// `PartiallyCreated` when the clinician chooses not to resume.
    pub fn discard(&mut self) {
        self.draft = PrescriptionDraft::new();
        self.state = ComposerState::Editing;
    }

    // ── Validation ──────────────────────────────────────────

    /// Check the draft against the submission invariants.
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::default();
        if self.draft.patient_id.trim().is_empty() {
            errors.patient_id = Some(PATIENT_REQUIRED);
        }
        if self.draft.lines.is_empty() {
            errors.draft = Some(LINE_REQUIRED);
        }
        for (index, line) in self.draft.lines.iter().enumerate() {
            let medicine_id = line.medicine_id.is_empty().then_some(MEDICINE_REQUIRED);
            let quantity = (line.quantity < 1).then_some(QUANTITY_MIN);
            if medicine_id.is_some() || quantity.is_some() {
                errors.lines.push(LineErrors {
                    index,
                    medicine_id,
                    quantity,
                });
            }
        }
        errors
    }

    // ── Submission ──────────────────────────────────────────

    /// Run the two-phase submission for the current draft.
    ///
    /// Validation failures are returned as errors before any network call.
    /// Network outcomes, including the partial-failure case, come back as
    /// `Ok(SubmissionResult)`: the attempt ran, and this is how it ended.
    pub async fn submit(&mut self, credential: &Credential) -> Result<SubmissionResult, ComposerError> {
        match self.state {
            ComposerState::Editing | ComposerState::Failed => {}
            state => return Err(ComposerError::InvalidState(state)),
        }

        let errors = self.validate();
        if !errors.is_empty() {
            self.state = ComposerState::Editing;
            return Err(ComposerError::Validation(errors));
        }

        self.state = ComposerState::Submitting;
        let payload = self.payload();
        let prescription_id = match self.gateway.create_prescription(credential, &payload).await {
            Ok(id) => id,
            Err(err) => {
                tracing::warn!(
                    composition = %self.composition_id,
                    error = %err,
                    "Prescription create failed"
                );
                self.state = ComposerState::Failed;
                return Ok(SubmissionResult::Failed(err));
            }
        };

        self.state = ComposerState::AwaitingSubmit { prescription_id };
        Ok(self.advance(credential, prescription_id).await)
    }

    /// Resume phase 2 for an already-created record.
    ///
    /// Only valid in `PartiallyCreated`; reuses the known server id so no
    /// duplicate record is created.
    pub async fn resume_submit(
        &mut self,
        credential: &Credential,
    ) -> Result<SubmissionResult, ComposerError> {
        let ComposerState::PartiallyCreated { prescription_id } = self.state else {
            return Err(ComposerError::InvalidState(self.state));
        };
        self.state = ComposerState::AwaitingSubmit { prescription_id };
        Ok(self.advance(credential, prescription_id).await)
    }

    async fn advance(&mut self, credential: &Credential, prescription_id: i64) -> SubmissionResult {
        match self
            .gateway
            .submit_prescription(credential, prescription_id)
            .await
        {
            Ok(()) => {
                tracing::info!(
                    composition = %self.composition_id,
                    prescription_id,
                    "Prescription submitted"
                );
                self.state = ComposerState::Completed { prescription_id };
                self.draft = PrescriptionDraft::new();
                SubmissionResult::Created(prescription_id)
            }
            Err(err) => {
                tracing::warn!(
                    composition = %self.composition_id,
                    prescription_id,
                    error = %err,
                    "Prescription created but not submitted"
                );
                self.state = ComposerState::PartiallyCreated { prescription_id };
                SubmissionResult::CreatedButNotSubmitted(prescription_id, err)
            }
        }
    }

    // ── Internal ────────────────────────────────────────────

    fn ensure_editable(&mut self) -> Result<(), ComposerError> {
        match self.state {
            ComposerState::Editing => Ok(()),
            // A failed create goes back to editing on the first edit.
            ComposerState::Failed => {
                self.state = ComposerState::Editing;
                Ok(())
            }
            state => Err(ComposerError::InvalidState(state)),
        }
    }

    fn payload(&self) -> PrescriptionPayload {
        PrescriptionPayload {
            patient_id: self.draft.patient_id.clone(),
            medicines: self
                .draft
                .lines
                .iter()
                .map(|line| LinePayload {
                    medicine_id: line.medicine_id.clone(),
                    medicine_name: line.medicine_name.clone(),
                    quantity: line.quantity,
                })
                .collect(),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
