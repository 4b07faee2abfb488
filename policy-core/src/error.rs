//! Crate-wide error types shared by more than one component.
//!
//! Component-specific taxonomies (status-write errors, reconcile errors) live
//! next to the code that raises them -- see [`crate::schema::ConflictDetector`]
//! (conflicts are reported as a plain `HashSet<Identity>`, not a dedicated
//! error type), [`crate::status::Error`], [`crate::reconcile::mutator::Error`]
//! and [`crate::reconcile::connection::Error`].

use thiserror::Error as ThisError;

/// Errors raised by the pure key-derivation functions in [`crate::identity`].
#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum Error {
    /// An input component to a key-derivation function was empty.
    #[error("key derivation component {0:?} must not be empty")]
    EmptyComponent(&'static str),
}
