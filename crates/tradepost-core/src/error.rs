use thiserror::Error;
use uuid::Uuid;

use crate::user::Role;

/// Every failure a marketplace operation can report to its caller.
#[derive(Error, Debug)]
pub enum MarketError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Wrong password")]
    InvalidCredentials,

    #[error("User already exists: {0}")]
    UserAlreadyExists(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Session not found")]
    SessionNotFound,

    #[error("Session expired after {0}s")]
    SessionExpired(i64),

    #[error("Forbidden: requires role {0}")]
    Forbidden(Role),

    #[error("Not the seller of this listing")]
    NotSeller,

    #[error("{0} not found: {1}")]
    NotFound(&'static str, Uuid),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] StorageError),
}

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid price {0}: must be a finite number >= 0")]
    InvalidPrice(f64),

    #[error("Field is not sortable: {0}")]
    UnsortableField(String),

    #[error("Invalid sort order {0}: expected asc or desc")]
    InvalidSortOrder(String),

    #[error("Invalid id: {0}")]
    InvalidId(String),

    #[error("Invalid mod filter: {0}")]
    InvalidModFilter(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Malformed document in {0}: {1}")]
    Malformed(&'static str, String),

    #[error("Duplicate document id in {0}: {1}")]
    Duplicate(&'static str, Uuid),

    #[error("Upsert into {0} was not acknowledged")]
    Unacknowledged(&'static str),
}
