//! Access guard — the single place protected views consult before rendering.
//!
//! Decision cascade, checked in order:
//! 1. Session still resolving → `Pending` (render nothing, never redirect;
//!    redirecting here would discard an in-flight bootstrap)
//! 2. Not authenticated → `Denied(NotSignedIn)` (redirect to sign-in)
//! 3. No roles required → `Allowed`
//! 4. User carries one of the required roles → `Allowed`
//! 5. Default → `Denied(MissingRole)` (redirect, not an inline error)

use crate::models::user::Role;
use crate::session::{SessionSnapshot, SessionStatus};

/// Why access was denied — both cases redirect to the sign-in entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    /// No authenticated session (or a rejected credential).
    NotSignedIn,
    /// Authenticated but lacking every required role.
    MissingRole,
}

/// Whether a protected view may render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session still resolving; render nothing and wait.
    Pending,
    /// Redirect away; the session does not satisfy the requirement.
    Denied(DenialReason),
    /// Render the protected content.
    Allowed,
}

impl GuardDecision {
    pub fn is_allowed(self) -> bool {
        self == Self::Allowed
    }
}

/// Decide whether a view requiring `required_roles` may render.
///
/// An empty `required_roles` admits any authenticated user. Multiple
/// required roles are alternatives: carrying any one of them is enough.
pub fn evaluate(snapshot: &SessionSnapshot, required_roles: &[Role]) -> GuardDecision {
    match snapshot.status {
        SessionStatus::Validating => GuardDecision::Pending,
        SessionStatus::Unauthenticated | SessionStatus::Invalid => {
            GuardDecision::Denied(DenialReason::NotSignedIn)
        }
        SessionStatus::Authenticated => {
            if required_roles.is_empty() {
                return GuardDecision::Allowed;
            }
            let has_role = snapshot
                .user
                .as_ref()
                .is_some_and(|user| required_roles.iter().any(|r| user.has_role(*r)));
            if has_role {
                GuardDecision::Allowed
            } else {
                GuardDecision::Denied(DenialReason::MissingRole)
            }
        }
    }
}
