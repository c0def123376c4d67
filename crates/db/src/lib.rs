//! Persistence for books.
//!
//! The [`BookStore`] trait is the seam the HTTP layer depends on. Production
//! wiring uses [`PostgrestBookStore`]; tests substitute the in-memory store
//! behind the `testing` feature.

pub mod error;
pub mod models;
pub mod postgrest;
pub mod store;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::StoreError;
pub use models::{Book, BookFields, BookId};
pub use postgrest::PostgrestBookStore;
pub use store::BookStore;
