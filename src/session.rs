//! Session lifecycle: identity, bearer credential, persistence.
//!
//! Single source of truth for "who is the current user and are they
//! authenticated". The bearer token never leaves this module in raw form:
//! [`Credential`] exposes it to the gateway layer only, and only the store
//! reads, writes or removes the persisted copy.
//!
//! Key properties:
//! - `bootstrap` runs at most once per process and makes no network call
//!   when no credential is persisted
//! - a failed `login` mutates nothing; prior session state survives intact
//! - `logout` discards the persisted credential synchronously; the sign-out
//!   notification is fire-and-forget
//! - a `login` issued while a bootstrap validation is in flight wins; the
//!   stale completion is dropped (epoch counter)

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use zeroize::Zeroizing;

use crate::api::types::RegistrationRequest;
use crate::api::{GatewayError, RemoteGateway, SignInGrant};
use crate::config;
use crate::models::user::SessionUser;

// ═══════════════════════════════════════════════════════════
// Credential — opaque bearer token
// ═══════════════════════════════════════════════════════════

/// Opaque bearer credential. Zeroed on drop; never printed.
#[derive(Clone)]
pub struct Credential(Zeroizing<String>);

impl Credential {
    fn new(raw: String) -> Self {
        Self(Zeroizing::new(raw))
    }

    /// Raw token for the `Authorization` header. Gateway layer only.
    pub(crate) fn expose(&self) -> &str {
        &self.0
    }

    #[cfg(test)]
    pub fn for_tests(raw: &str) -> Self {
        Self::new(raw.to_string())
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

// ═══════════════════════════════════════════════════════════
// Session state
// ═══════════════════════════════════════════════════════════

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// No credential; protected views must redirect to sign-in.
    Unauthenticated,
    /// A persisted credential is being validated; render nothing yet.
    Validating,
    /// Identity established; `user` is populated.
    Authenticated,
    /// A persisted credential was rejected. Transitional: the store clears
    /// to `Unauthenticated` before the bootstrap call returns.
    Invalid,
}

/// Point-in-time view of the session, for the access guard and the UI.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub user: Option<SessionUser>,
}

/// How a bootstrap attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// Nothing persisted; terminal without network access.
    NoCredential,
    /// Persisted credential validated; session restored.
    Restored,
    /// Persisted credential rejected (or unreachable backend); discarded.
    Rejected,
    /// A login started while validation was in flight; its result won.
    Superseded,
}

struct SessionState {
    status: SessionStatus,
    user: Option<SessionUser>,
    credential: Option<Credential>,
}

// ═══════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════

/// Errors from session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Authentication failed")]
    AuthenticationFailed,
    #[error("Session bootstrap already ran")]
    AlreadyBootstrapped,
    #[error("No authenticated session")]
    NotAuthenticated,
    #[error("Credential store error: {0}")]
    CredentialStore(#[from] CredentialStoreError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("Internal lock error")]
    LockPoisoned,
}

/// Errors from the persisted credential file.
#[derive(Debug, thiserror::Error)]
pub enum CredentialStoreError {
    #[error("Credential store I/O: {0}")]
    Io(#[from] std::io::Error),
}

// ═══════════════════════════════════════════════════════════
// CredentialStore — file-backed token persistence
// ═══════════════════════════════════════════════════════════

/// Persists the single opaque bearer token.
///
/// Writes are atomic (staged to a temp file in the same directory, then
/// renamed over the target); absence of the file means Unauthenticated.
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store at the app-default location (`~/Recetta/credential`).
    pub fn default_location() -> Self {
        Self::new(config::credential_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted credential, if any. Empty files count as absent.
    pub fn load(&self) -> Result<Option<Credential>, CredentialStoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => {
                let token = raw.trim();
                if token.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(Credential::new(token.to_string())))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Atomically replace the persisted credential.
    pub fn store(&self, credential: &Credential) -> Result<(), CredentialStoreError> {
        use std::io::Write as _;

        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;

        let mut staged = tempfile::NamedTempFile::new_in(dir)?;
        staged.write_all(credential.expose().as_bytes())?;
        staged
            .persist(&self.path)
            .map_err(|e| CredentialStoreError::Io(e.error))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    /// Remove the persisted credential. Removing an absent file is fine.
    pub fn clear(&self) -> Result<(), CredentialStoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// SessionStore
// ═══════════════════════════════════════════════════════════

/// Owns the session lifecycle and the credential.
///
/// Shared behind `Arc` with every protected component. Credential-mutating
/// completions are serialized by an epoch counter: `login` and `logout`
/// advance the epoch, and a bootstrap validation that resolves under an
/// older epoch is discarded.
pub struct SessionStore<G> {
    gateway: Arc<G>,
    credentials: CredentialStore,
    state: RwLock<SessionState>,
    epoch: AtomicU64,
    bootstrapped: AtomicBool,
}

impl<G: RemoteGateway> SessionStore<G> {
    pub fn new(gateway: Arc<G>, credentials: CredentialStore) -> Self {
        Self {
            gateway,
            credentials,
            state: RwLock::new(SessionState {
                status: SessionStatus::Unauthenticated,
                user: None,
                credential: None,
            }),
            epoch: AtomicU64::new(0),
            bootstrapped: AtomicBool::new(false),
        }
    }

    // ── Read path ───────────────────────────────────────────

    /// Current status + identity, for the guard and the UI.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state
            .read()
            .map(|s| SessionSnapshot {
                status: s.status,
                user: s.user.clone(),
            })
            .unwrap_or(SessionSnapshot {
                status: SessionStatus::Unauthenticated,
                user: None,
            })
    }

    pub fn status(&self) -> SessionStatus {
        self.snapshot().status
    }

    pub fn is_authenticated(&self) -> bool {
        self.status() == SessionStatus::Authenticated
    }

    /// Clone of the active credential, for attaching to outgoing calls.
    pub fn credential(&self) -> Result<Credential, SessionError> {
        self.state
            .read()
            .map_err(|_| SessionError::LockPoisoned)?
            .credential
            .clone()
            .ok_or(SessionError::NotAuthenticated)
    }

    // ── Lifecycle ───────────────────────────────────────────

    /// Restore a persisted session, if any. Runs at most once per process.
    ///
    /// With no persisted credential this is terminal and touches no network.
    /// Otherwise the credential is validated remotely; rejection or a
    /// transport failure discards it (`Invalid` → `Unauthenticated`).
    pub async fn bootstrap(&self) -> Result<BootstrapOutcome, SessionError> {
        if self.bootstrapped.swap(true, Ordering::SeqCst) {
            return Err(SessionError::AlreadyBootstrapped);
        }

        let Some(credential) = self.credentials.load()? else {
            self.set_status(SessionStatus::Unauthenticated)?;
            return Ok(BootstrapOutcome::NoCredential);
        };

        let epoch = self.epoch.load(Ordering::SeqCst);
        self.set_status(SessionStatus::Validating)?;
        tracing::debug!("Validating persisted credential");

        let outcome = self.gateway.validate_credential(&credential).await;

        if self.epoch.load(Ordering::SeqCst) != epoch {
            tracing::debug!("Stale bootstrap completion ignored");
            return Ok(BootstrapOutcome::Superseded);
        }

        match outcome {
            Ok(user) => {
                tracing::info!(subject = %user.subject_id, "Session restored");
                let mut state = self.state.write().map_err(|_| SessionError::LockPoisoned)?;
                state.status = SessionStatus::Authenticated;
                state.user = Some(user);
                state.credential = Some(credential);
                Ok(BootstrapOutcome::Restored)
            }
            Err(err) => {
                tracing::warn!(error = %err, "Persisted credential rejected");
                {
                    let mut state =
                        self.state.write().map_err(|_| SessionError::LockPoisoned)?;
                    state.status = SessionStatus::Invalid;
                    state.user = None;
                    state.credential = None;
                }
                if let Err(e) = self.credentials.clear() {
                    tracing::warn!(error = %e, "Failed to discard persisted credential");
                }
                self.set_status(SessionStatus::Unauthenticated)?;
                Ok(BootstrapOutcome::Rejected)
            }
        }
    }

    /// Sign in with email/password.
    ///
    /// Success persists the credential and populates identity. Failure
    /// (bad credentials or transport) leaves any prior session untouched.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), SessionError> {
        // Any still-running bootstrap completion is stale from here on.
        self.epoch.fetch_add(1, Ordering::SeqCst);

        let grant = match self.gateway.sign_in(email, password).await {
            Ok(grant) => grant,
            Err(GatewayError::InvalidCredentials) => {
                return Err(SessionError::AuthenticationFailed)
            }
            Err(err) => return Err(err.into()),
        };

        let SignInGrant { token, user } = grant;
        let credential = Credential::new(token);
        self.credentials.store(&credential)?;

        tracing::info!(subject = %user.subject_id, "Signed in");
        let mut state = self.state.write().map_err(|_| SessionError::LockPoisoned)?;
        state.status = SessionStatus::Authenticated;
        state.user = Some(user);
        state.credential = Some(credential);
        Ok(())
    }

    /// Sign out.
    ///
    /// The persisted credential is removed and the session reset before any
    /// network activity; the sign-out notification is spawned fire-and-forget
    /// and its failure never reverses the local logout.
    pub fn logout(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);

        let credential = match self.state.write() {
            Ok(mut state) => {
                let credential = state.credential.take();
                state.user = None;
                state.status = SessionStatus::Unauthenticated;
                credential
            }
            Err(_) => None,
        };

        if let Err(e) = self.credentials.clear() {
            tracing::warn!(error = %e, "Failed to remove persisted credential");
        }
        tracing::info!("Signed out");

        let Some(credential) = credential else { return };
        let gateway = Arc::clone(&self.gateway);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = gateway.sign_out(&credential).await {
                        tracing::debug!(error = %e, "Sign-out notification failed");
                    }
                });
            }
            Err(_) => tracing::debug!("No async runtime; sign-out notification skipped"),
        }
    }

    /// Forward a registration request. No session state is touched; the
    /// caller signs in separately afterwards.
    pub async fn register(&self, request: &RegistrationRequest) -> Result<(), SessionError> {
        self.gateway.sign_up(request).await.map_err(SessionError::from)
    }

    // ── Internal ────────────────────────────────────────────

    fn set_status(&self, status: SessionStatus) -> Result<(), SessionError> {
        let mut state = self.state.write().map_err(|_| SessionError::LockPoisoned)?;
        state.status = status;
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
