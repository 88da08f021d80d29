//! Tradepost Core - Domain models, sessions, and the listing query compiler.
//!
//! This crate contains the marketplace logic. Persistence is reached only
//! through the [`DocumentStore`] trait, so it has no dependencies on other
//! Tradepost crates.

pub mod auth;
pub mod catalog;
pub mod clock;
pub mod document;
pub mod error;
pub mod filter;
pub mod listing;
pub mod market;
pub mod password;
pub mod pipeline;
pub mod query;
pub mod reference;
pub mod session;
pub mod storage;
pub mod user;
pub mod validation;

// Re-exports for convenience
pub use auth::Accounts;
pub use catalog::{CatalogItem, CatalogItemId, NewCatalogItem, Stat};
pub use clock::{Clock, SystemClock};
pub use document::{Collection, Document};
pub use error::{MarketError, StorageError, ValidationError};
pub use filter::Filter;
pub use listing::{Listing, ListingDraft, ListingId, ListingRequest, ListingView, ModRoll};
pub use market::Marketplace;
pub use pipeline::{Lookup, SortDirection, Stage};
pub use query::{compile, ListingQuery, ListingQueryParams, ModFilter, SortField, SortOrder};
pub use reference::ReferenceLists;
pub use session::{Identity, Session, SessionGrant, SessionManager, SESSION_TTL_SECS};
pub use storage::{DocumentStore, UpdateOutcome};
pub use user::{PublicUser, Role, User, UserId};
pub use validation::Validator;

#[cfg(any(test, feature = "test-utils"))]
pub use clock::ManualClock;
#[cfg(any(test, feature = "test-utils"))]
pub use storage::memory::InMemoryDocumentStore;
