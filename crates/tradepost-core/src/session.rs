use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::Clock;
use crate::document::{from_document, to_document, Collection};
use crate::error::{MarketError, StorageError};
use crate::filter::Filter;
use crate::storage::DocumentStore;
use crate::user::{PublicUser, Role, UserId};

/// Seconds a session stays valid after it was issued.
pub const SESSION_TTL_SECS: i64 = 1200;

/// A stored session. At most one exists per username.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: Uuid,
    pub username: String,
    pub token: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start_date: DateTime<Utc>,
}

impl Session {
    /// Whole seconds elapsed since the session was issued.
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> i64 {
        (now - self.start_date).num_seconds()
    }

    /// Expired once strictly more than the TTL has passed, to the millisecond.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now - self.start_date > TimeDelta::seconds(SESSION_TTL_SECS)
    }
}

/// What a caller receives when a session is issued or checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionGrant {
    pub username: String,
    pub token: String,
    pub role: Role,
}

/// The user behind a valid session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identity {
    pub id: UserId,
    pub username: String,
    pub role: Role,
}

impl Identity {
    /// Fail with `Forbidden` unless this identity holds `role`.
    pub fn require_role(&self, role: Role) -> Result<(), MarketError> {
        if self.role != role {
            return Err(MarketError::Forbidden(role));
        }
        Ok(())
    }
}

impl From<PublicUser> for Identity {
    fn from(user: PublicUser) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role,
        }
    }
}

/// Issues and validates session tokens.
///
/// Issuing a session for a username replaces whatever session that username
/// held before, so each user has at most one live token.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Issue a fresh token for `username`, invalidating any previous one.
    pub fn create_session(&self, username: &str, role: Role) -> Result<SessionGrant, MarketError> {
        let session = Session {
            id: Uuid::new_v4(),
            username: username.to_string(),
            token: Uuid::new_v4().to_string(),
            start_date: self.clock.now_millis(),
        };

        let outcome = self.store.update_one(
            Collection::Sessions,
            &Filter::eq("username", username),
            to_document(Collection::Sessions, &session)?,
            true,
        )?;
        if !outcome.acknowledged() {
            return Err(StorageError::Unacknowledged(Collection::Sessions.name()).into());
        }

        tracing::info!("Issued session for {}", username);
        Ok(SessionGrant {
            username: session.username,
            token: session.token,
            role,
        })
    }

    /// Resolve a token to the identity that holds it.
    pub fn resolve_session(&self, token: &str) -> Result<Identity, MarketError> {
        let doc = self
            .store
            .find_one(Collection::Sessions, &Filter::eq("token", token))?
            .ok_or(MarketError::SessionNotFound)?;
        let session: Session = from_document(Collection::Sessions, doc)?;

        let now = self.clock.now_millis();
        if session.is_expired_at(now) {
            return Err(MarketError::SessionExpired(session.elapsed_secs(now)));
        }

        let user = self
            .store
            .find_one(Collection::Users, &Filter::eq("username", session.username.as_str()))?
            .ok_or_else(|| MarketError::UserNotFound(session.username.clone()))?;
        let user: PublicUser = from_document(Collection::Users, user)?;

        Ok(user.into())
    }

    /// Resolve a token and return it with the holder's name and role.
    pub fn check_session(&self, token: &str) -> Result<SessionGrant, MarketError> {
        let identity = self.resolve_session(token)?;
        Ok(SessionGrant {
            username: identity.username,
            token: token.to_string(),
            role: identity.role,
        })
    }
}
