use std::sync::Arc;

use crate::document::{from_document, to_document, Collection};
use crate::error::MarketError;
use crate::filter::Filter;
use crate::password::{hash_password, verify_password};
use crate::session::{SessionGrant, SessionManager};
use crate::storage::DocumentStore;
use crate::user::{Role, User};

/// Signup and login on top of the credential store.
#[derive(Clone)]
pub struct Accounts {
    store: Arc<dyn DocumentStore>,
    sessions: SessionManager,
}

impl Accounts {
    pub fn new(store: Arc<dyn DocumentStore>, sessions: SessionManager) -> Self {
        Self { store, sessions }
    }

    fn find_user(&self, username: &str) -> Result<Option<User>, MarketError> {
        self.store
            .find_one(Collection::Users, &Filter::eq("username", username))?
            .map(|doc| from_document(Collection::Users, doc))
            .transpose()
            .map_err(Into::into)
    }

    fn insert_user(&self, username: &str, password: &str, role: Role) -> Result<User, MarketError> {
        let user = User::new(username, hash_password(password)?, role);
        self.store
            .insert(Collection::Users, to_document(Collection::Users, &user)?)?;
        Ok(user)
    }

    /// Register a new user with role `user` and start a session for them.
    pub fn signup(&self, username: &str, password: &str) -> Result<SessionGrant, MarketError> {
        if self.find_user(username)?.is_some() {
            return Err(MarketError::UserAlreadyExists(username.to_string()));
        }
        let user = self.insert_user(username, password, Role::User)?;
        tracing::info!("Registered user {}", user.username);
        self.sessions.create_session(&user.username, user.role)
    }

    /// Check credentials and start a session, replacing any previous one.
    pub fn login(&self, username: &str, password: &str) -> Result<SessionGrant, MarketError> {
        let user = self
            .find_user(username)?
            .ok_or_else(|| MarketError::UserNotFound(username.to_string()))?;
        if !verify_password(password, &user.password_digest) {
            tracing::warn!("Rejected password for {}", username);
            return Err(MarketError::InvalidCredentials);
        }
        self.sessions.create_session(&user.username, user.role)
    }

    /// Create an admin account unless the username is already taken.
    /// Returns true if an account was created.
    pub fn ensure_admin(&self, username: &str, password: &str) -> Result<bool, MarketError> {
        if self.find_user(username)?.is_some() {
            return Ok(false);
        }
        self.insert_user(username, password, Role::Admin)?;
        tracing::info!("Created admin account {}", username);
        Ok(true)
    }
}
