//! Authenticated user identity and role tags.

use serde::{Deserialize, Serialize};

/// Capability tag gating access to a view or action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Doctor,
    Pharmacist,
    Admin,
}

impl Role {
    /// Parse from a wire role string.
    ///
    /// The backend emits both prefixed (`ROLE_DOCTOR`) and bare (`DOCTOR`)
    /// forms depending on the endpoint; both are accepted.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().trim_start_matches("ROLE_") {
            "DOCTOR" => Some(Self::Doctor),
            "PHARMACIST" => Some(Self::Pharmacist),
            "ADMIN" => Some(Self::Admin),
            _ => None,
        }
    }

    /// Wire string representation (bare form).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Doctor => "DOCTOR",
            Self::Pharmacist => "PHARMACIST",
            Self::Admin => "ADMIN",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a wire role array, skipping strings no known role matches.
///
/// Role-less accounts are permitted; an empty result is not an error.
pub fn parse_roles(raw: &[String]) -> Vec<Role> {
    let mut roles = Vec::with_capacity(raw.len());
    for value in raw {
        match Role::parse(value) {
            Some(role) if !roles.contains(&role) => roles.push(role),
            Some(_) => {}
            None => tracing::warn!(role = %value, "Unknown role string skipped"),
        }
    }
    roles
}

/// Identity of the authenticated user, as reported by the auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub subject_id: String,
    pub email: String,
    pub display_name: String,
    pub roles: Vec<Role>,
}

impl SessionUser {
    /// Build from the wire identity fields (first/last name split on the wire).
    pub fn from_wire(
        subject_id: String,
        email: String,
        first_name: &str,
        last_name: &str,
        raw_roles: &[String],
    ) -> Self {
        let display_name = format!("{} {}", first_name.trim(), last_name.trim())
            .trim()
            .to_string();
        Self {
            subject_id,
            email,
            display_name,
            roles: parse_roles(raw_roles),
        }
    }

    /// Whether the user carries the given role.
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}
