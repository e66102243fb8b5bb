//! Error taxonomy for tree mutations and lookups.
//!
//! Store operations return [`StoreError`] so callers can react to the exact
//! failure: the HTTP layer maps variants to status codes and the admin UI
//! inspects the has-children case to offer a cascading delete.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A required field is missing or an input is structurally invalid.
    #[error("{0}")]
    Validation(String),

    /// Another sibling already uses this slug under the same parent.
    #[error("slug '{slug}' already exists at this level")]
    DuplicateSlug { slug: String },

    /// No node matches the requested id or path.
    #[error("{0} not found")]
    NotFound(String),

    /// Deletion refused: at least one node still references this id as its
    /// parent. Callers may retry with cascade.
    #[error("content {id} has children")]
    HasChildren { id: String },

    /// The underlying store failed; surfaced as-is, never retried.
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;
