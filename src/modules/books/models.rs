use bookshelf_db::{Book, BookFields};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const BOOK_ADDED: &str = "Book added successfully";
pub const BOOK_DELETED: &str = "Book deleted successfully";
pub const AVAILABILITY_UPDATED: &str = "Availability updated";

/// Body of `POST /books`. Only the five book fields are read, whatever their
/// JSON type; any `is_available` or `user_id` sent by the caller is ignored.
pub type CreateBookRequest = BookFields;

/// Body of `PUT /books/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAvailabilityRequest {
    /// Forwarded to the store as sent, boolean or not.
    #[serde(default)]
    pub is_available: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

/// Response of `POST /books`: the confirmation plus the inserted rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookCreatedResponse {
    pub message: String,
    pub data: Vec<Book>,
}
