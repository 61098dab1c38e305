//! Session and role lookup
//!
//! The session file is the JSON document a login leaves behind:
//! `{ "token": "...", "user": { "id": 1, "username": "...", "nickname": "...", "role": "admin" } }`.
//! Nothing here talks to the backend; the role is whatever the session says,
//! unless overridden with `--role` / `DASHSTAR_ROLE`.

use std::fs;
use std::path::{Path, PathBuf};

use dashstar_core::view::Role;
use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// Logged-in user as stored in the session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Option<i64>,
    pub username: Option<String>,
    pub nickname: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<UserProfile>,
}

/// Supplies the role of whoever is using the client
pub trait AuthGateway {
    fn role(&self) -> Role;
}

/// Explicit auth state handed to the listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    pub session: Option<Session>,
    pub role_override: Option<String>,
}

impl AuthGateway for AuthContext {
    fn role(&self) -> Role {
        let claim = self.role_override.as_deref().or_else(|| {
            self.session
                .as_ref()
                .and_then(|s| s.user.as_ref())
                .and_then(|u| u.role.as_deref())
        });
        Role::from_claim(claim)
    }
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_role(role: impl Into<String>) -> Self {
        Self {
            session: None,
            role_override: Some(role.into()),
        }
    }

    /// Resolve the auth context from CLI flags, environment and the session file
    ///
    /// Session path: `--session`, then DASHSTAR_SESSION, then
    /// `<config dir>/dashstar/session.json`.
    /// Role override: `--role`, then DASHSTAR_ROLE.
    pub fn resolve(session_path: Option<PathBuf>, role: Option<String>) -> Result<Self> {
        let explicit = session_path
            .or_else(|| std::env::var("DASHSTAR_SESSION").ok().map(PathBuf::from));

        let session = match explicit {
            Some(path) => Some(
                load_session(&path)?
                    .ok_or_else(|| eyre!("Session file not found: {}", path.display()))?,
            ),
            None => match default_session_path() {
                Some(path) => load_session(&path)?,
                None => None,
            },
        };

        let role_override = role
            .or_else(|| std::env::var("DASHSTAR_ROLE").ok())
            .filter(|r| !r.is_empty());

        Ok(Self {
            session,
            role_override,
        })
    }

    /// Bearer token carried by the session, if any
    pub fn token(&self) -> Option<String> {
        self.session.as_ref().and_then(|s| s.token.clone())
    }

    /// Name to greet the user with
    pub fn display_name(&self) -> Option<&str> {
        let user = self.session.as_ref()?.user.as_ref()?;
        user.nickname.as_deref().or(user.username.as_deref())
    }
}

/// Default session location: `<config dir>/dashstar/session.json`
pub fn default_session_path() -> Option<PathBuf> {
    dirs_next::config_dir().map(|dir| dir.join("dashstar").join("session.json"))
}

/// Load a session file. A missing file is not an error.
pub fn load_session(path: &Path) -> Result<Option<Session>> {
    if !path.exists() {
        return Ok(None);
    }

    let raw = fs::read_to_string(path)
        .context(format!("Failed to read session file {}", path.display()))?;

    let session = serde_json::from_str::<Session>(&raw)
        .context(format!("Failed to parse session file {}", path.display()))?;

    Ok(Some(session))
}
