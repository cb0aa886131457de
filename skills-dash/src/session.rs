//! Authentication session
//!
//! Two-step login: email and password first, then the one-time code sent by
//! email. A successful second step yields a bearer token that is persisted in
//! the root folder so a restart does not sign the user out.
//!
//! Lifecycle: `init` restores a persisted session, `teardown` (or `logout`)
//! clears memory and disk.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skills_common::api::{LoginRequest, VerifyCodeRequest};
#[cfg(unix)]
use skills_common::config::check_permissions_loose;
use skills_common::config::write_atomic;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::backend::SkillsBackend;
use crate::error::AuthError;

/// A signed-in user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub email: String,
    pub token: String,
    pub token_type: String,
    pub created_at: DateTime<Utc>,
}

/// Where the user is in the login flow, without credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum AuthStep {
    SignedOut,
    AwaitingCode { email: String },
    SignedIn { email: String },
}

#[derive(Debug, Clone)]
enum SessionState {
    SignedOut,
    AwaitingCode { email: String },
    SignedIn(Session),
}

/// Owns the auth state and its on-disk copy
pub struct SessionManager {
    path: PathBuf,
    state: RwLock<SessionState>,
}

impl SessionManager {
    /// Restore the session persisted at `path`, if any
    ///
    /// A file that cannot be parsed is removed and the user starts signed out.
    pub fn init(path: PathBuf) -> Self {
        let state = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<Session>(&content) {
                Ok(session) => {
                    warn_if_readable_by_others(&path);
                    info!(email = %session.email, "Restored session");
                    SessionState::SignedIn(session)
                }
                Err(e) => {
                    warn!("Discarding unreadable session file {:?}: {}", path, e);
                    if let Err(e) = std::fs::remove_file(&path) {
                        warn!("Failed to remove {:?}: {}", path, e);
                    }
                    SessionState::SignedOut
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => SessionState::SignedOut,
            Err(e) => {
                warn!("Failed to read session file {:?}: {}", path, e);
                SessionState::SignedOut
            }
        };

        Self {
            path,
            state: RwLock::new(state),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn current(&self) -> Option<Session> {
        match &*self.state.read().await {
            SessionState::SignedIn(session) => Some(session.clone()),
            _ => None,
        }
    }

    pub async fn step(&self) -> AuthStep {
        match &*self.state.read().await {
            SessionState::SignedOut => AuthStep::SignedOut,
            SessionState::AwaitingCode { email } => AuthStep::AwaitingCode {
                email: email.clone(),
            },
            SessionState::SignedIn(session) => AuthStep::SignedIn {
                email: session.email.clone(),
            },
        }
    }

    /// Step 1: submit email and password
    ///
    /// On success the manager waits for a code for `email`, replacing any
    /// signed-in session and its file. On failure the current step is left
    /// as it was.
    pub async fn login(
        &self,
        backend: &dyn SkillsBackend,
        email: &str,
        password: &str,
    ) -> Result<String, AuthError> {
        let email = email.trim().to_string();
        let request = LoginRequest {
            email: email.clone(),
            password: password.to_string(),
        };

        let response = backend.login(&request).await.map_err(|e| {
            warn!(email = %email, "Login rejected: {}", e);
            AuthError::from(e)
        })?;

        let mut state = self.state.write().await;
        if let SessionState::SignedIn(previous) = &*state {
            info!(email = %previous.email, "Replacing signed-in session");
            self.remove_file().await?;
        }
        *state = SessionState::AwaitingCode {
            email: email.clone(),
        };
        info!(email = %email, "Login accepted, awaiting code");
        Ok(response.message)
    }

    /// Step 2: submit the one-time code for the pending email
    pub async fn verify_code(
        &self,
        backend: &dyn SkillsBackend,
        email: &str,
        code: &str,
    ) -> Result<Session, AuthError> {
        let email = email.trim().to_string();
        if !self.is_awaiting(&email).await {
            return Err(AuthError::NoPendingLogin(email));
        }

        let request = VerifyCodeRequest {
            email: email.clone(),
            otp: code.trim().to_string(),
        };
        let token = backend.verify_code(&request).await.map_err(|e| {
            warn!(email = %email, "Code rejected: {}", e);
            AuthError::from(e)
        })?;

        let mut state = self.state.write().await;
        // A logout or a fresh login may have happened while the code was checked
        if !matches!(&*state, SessionState::AwaitingCode { email: pending } if *pending == email) {
            return Err(AuthError::NoPendingLogin(email));
        }

        let session = Session {
            email: email.clone(),
            token: token.access_token,
            token_type: token.token_type,
            created_at: Utc::now(),
        };
        // Held across the write so a concurrent logout cannot leave a file behind
        self.persist(&session).await?;
        *state = SessionState::SignedIn(session.clone());
        info!(email = %email, "Signed in");
        Ok(session)
    }

    async fn is_awaiting(&self, email: &str) -> bool {
        matches!(
            &*self.state.read().await,
            SessionState::AwaitingCode { email: pending } if pending == email
        )
    }

    async fn persist(&self, session: &Session) -> Result<(), AuthError> {
        let json = serde_json::to_vec_pretty(session).map_err(skills_common::Error::from)?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&path, &json))
            .await
            .map_err(|e| AuthError::Storage(std::io::Error::other(e).into()))??;
        debug!("Session persisted to {:?}", self.path);
        Ok(())
    }

    async fn remove_file(&self) -> Result<(), AuthError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AuthError::Storage(e.into())),
        }
    }

    pub async fn logout(&self) -> Result<(), AuthError> {
        self.teardown().await
    }

    /// Forget the session in memory and on disk
    pub async fn teardown(&self) -> Result<(), AuthError> {
        let mut state = self.state.write().await;
        *state = SessionState::SignedOut;
        self.remove_file().await?;
        info!("Signed out");
        Ok(())
    }
}

#[cfg(unix)]
fn warn_if_readable_by_others(path: &Path) {
    match check_permissions_loose(path) {
        Ok(true) => warn!("Session file {:?} is readable by other users", path),
        Ok(false) => {}
        Err(e) => warn!("Failed to check permissions of {:?}: {}", path, e),
    }
}

#[cfg(not(unix))]
fn warn_if_readable_by_others(_path: &Path) {}
