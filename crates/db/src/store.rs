use async_trait::async_trait;
use bookshelf_kernel::UserId;
use serde_json::Value;

use crate::error::StoreError;
use crate::models::{Book, BookFields};

/// Operations the gateway performs against the books table.
///
/// Every call is a single round-trip. Mutations are scoped to rows whose
/// `id` and `user_id` both match; matching nothing is not an error, and the
/// returned count is the number of rows matched.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Every book of every owner, in the store's natural order.
    async fn list_all(&self) -> Result<Vec<Book>, StoreError>;

    /// Insert a book owned by `owner`. The row is always created available.
    async fn create(&self, fields: BookFields, owner: &UserId) -> Result<Book, StoreError>;

    async fn delete(&self, id: &str, owner: &UserId) -> Result<usize, StoreError>;

    /// `is_available` is forwarded as given; `None` sends an empty update.
    async fn set_availability(
        &self,
        id: &str,
        owner: &UserId,
        is_available: Option<Value>,
    ) -> Result<usize, StoreError>;
}
