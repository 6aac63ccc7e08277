//! Authentication session.
//!
//! A session is either unauthenticated or holds a bearer token together with
//! the user it belongs to. The only way in is [`Session::authenticate`] with a
//! complete [`AuthPayload`]; the only way out is [`Session::clear`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::UserRecord;

/// Login payload as returned by the backend: `{ "token": ..., "usuario": ... }`.
///
/// Both fields are optional at the type level so that incomplete responses
/// decode and can be rejected by [`Session::authenticate`] with a precise
/// diagnostic. `user` is accepted as an alias for `usuario`.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthPayload {
    /// Bearer token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// The authenticated user.
    #[serde(
        rename = "usuario",
        alias = "user",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub user: Option<UserRecord>,
}

impl AuthPayload {
    /// A complete payload.
    #[must_use]
    pub fn new(token: impl Into<String>, user: UserRecord) -> Self {
        Self {
            token: Some(token.into()),
            user: Some(user),
        }
    }
}

impl std::fmt::Debug for AuthPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthPayload")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("user", &self.user)
            .finish()
    }
}

/// A login payload lacked the token, the user record, or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("login payload is incomplete (token present: {has_token}, user present: {has_user})")]
pub struct InvalidLoginPayload {
    /// Whether a non-empty token was supplied.
    pub has_token: bool,
    /// Whether a user record was supplied.
    pub has_user: bool,
}

/// The two states a session can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// No token held.
    Unauthenticated,
    /// Token and user held.
    Authenticated,
}

/// The current user's identity and bearer token, or their absence.
///
/// Invariant: `token.is_some() == user.is_some()` for sessions built through
/// [`Session::authenticate`]. Sessions restored from storage may carry a
/// token without a readable user; authentication is decided by the token.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Session {
    user: Option<UserRecord>,
    token: Option<String>,
}

impl Session {
    /// An unauthenticated session.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            user: None,
            token: None,
        }
    }

    /// Rebuild a session from previously persisted parts.
    ///
    /// Empty tokens are treated as absent.
    #[must_use]
    pub fn restore(user: Option<UserRecord>, token: Option<String>) -> Self {
        Self {
            user,
            token: token.filter(|t| !t.is_empty()),
        }
    }

    /// Become authenticated with `payload`.
    ///
    /// Replaces any existing user and token, which is how a refreshed user
    /// record (e.g. after a points adjustment) is installed.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidLoginPayload`] and leaves the session untouched if
    /// the token is missing or empty, or the user record is missing.
    pub fn authenticate(&mut self, payload: AuthPayload) -> Result<(), InvalidLoginPayload> {
        let AuthPayload { token, user } = payload;
        match (token.filter(|t| !t.is_empty()), user) {
            (Some(token), Some(user)) => {
                self.token = Some(token);
                self.user = Some(user);
                Ok(())
            }
            (token, user) => Err(InvalidLoginPayload {
                has_token: token.is_some(),
                has_user: user.is_some(),
            }),
        }
    }

    /// Drop the user and token. Returns `false` if there was nothing to drop.
    pub fn clear(&mut self) -> bool {
        let had_any = self.token.is_some() || self.user.is_some();
        self.token = None;
        self.user = None;
        had_any
    }

    /// Whether a token is held.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        if self.is_authenticated() {
            SessionState::Authenticated
        } else {
            SessionState::Unauthenticated
        }
    }

    /// The logged-in user, if known.
    #[must_use]
    pub const fn user(&self) -> Option<&UserRecord> {
        self.user.as_ref()
    }

    /// The bearer token, if authenticated.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state())
            .field("user", &self.user.as_ref().map(|u| u.email.as_str()))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::Email;

    fn user() -> UserRecord {
        UserRecord::new(Email::parse("x@x.com").unwrap())
    }

    #[test]
    fn test_authenticate_and_clear() {
        let mut session = Session::new();
        assert_eq!(session.state(), SessionState::Unauthenticated);

        session.authenticate(AuthPayload::new("t1", user())).unwrap();
        assert_eq!(session.state(), SessionState::Authenticated);
        assert_eq!(session.token(), Some("t1"));
        assert_eq!(session.user().unwrap().email.as_str(), "x@x.com");

        assert!(session.clear());
        assert_eq!(session, Session::new());
        assert!(!session.clear());
    }

    #[test]
    fn test_incomplete_payloads_are_rejected() {
        let mut session = Session::new();

        let err = session.authenticate(AuthPayload::default()).unwrap_err();
        assert_eq!(
            err,
            InvalidLoginPayload {
                has_token: false,
                has_user: false
            }
        );

        let only_token = AuthPayload {
            token: Some("t1".to_string()),
            user: None,
        };
        assert!(session.authenticate(only_token).is_err());

        let empty_token = AuthPayload {
            token: Some(String::new()),
            user: Some(user()),
        };
        let err = session.authenticate(empty_token).unwrap_err();
        assert!(!err.has_token);
        assert!(err.has_user);

        assert_eq!(session, Session::new());
    }

    #[test]
    fn test_failed_relogin_keeps_existing_session() {
        let mut session = Session::new();
        session.authenticate(AuthPayload::new("t1", user())).unwrap();
        let before = session.clone();
        assert!(session.authenticate(AuthPayload::default()).is_err());
        assert_eq!(session, before);
    }

    #[test]
    fn test_payload_accepts_both_user_field_names() {
        let a: AuthPayload =
            serde_json::from_value(json!({"token": "t", "usuario": {"email": "x@x.com"}}))
                .unwrap();
        let b: AuthPayload =
            serde_json::from_value(json!({"token": "t", "user": {"email": "x@x.com"}})).unwrap();
        assert_eq!(a, b);
        assert!(a.user.is_some());

        let empty: AuthPayload = serde_json::from_value(json!({})).unwrap();
        assert_eq!(empty, AuthPayload::default());
    }

    #[test]
    fn test_restore_ignores_empty_token() {
        let session = Session::restore(Some(user()), Some(String::new()));
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_debug_redacts_token() {
        let mut session = Session::new();
        session
            .authenticate(AuthPayload::new("secret-token", user()))
            .unwrap();
        assert!(!format!("{session:?}").contains("secret-token"));
        assert!(!format!("{:?}", AuthPayload::new("secret-token", user())).contains("secret-token"));
    }
}
