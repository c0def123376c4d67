use std::fmt;

use bookshelf_kernel::UserId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifier assigned by the store. Tables keyed by `bigint` yield numbers,
/// `uuid`/`text` keys yield strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BookId {
    Number(i64),
    Text(String),
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookId::Number(id) => write!(f, "{id}"),
            BookId::Text(id) => f.write_str(id),
        }
    }
}

/// Caller-editable attributes of a book. Absent fields are stored as null.
///
/// Values are forwarded as sent; column types are the store's to enforce.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookFields {
    #[serde(default)]
    pub image_url: Option<Value>,
    #[serde(default)]
    pub book_name: Option<Value>,
    #[serde(default)]
    pub author_name: Option<Value>,
    #[serde(default)]
    pub student_name: Option<Value>,
    #[serde(default)]
    pub whatsapp_number: Option<Value>,
}

impl BookFields {
    /// Fields set to the given text, everything else null.
    pub fn named(book_name: impl Into<String>) -> Self {
        Self {
            book_name: Some(Value::String(book_name.into())),
            ..Self::default()
        }
    }
}

/// A stored book row, as the store returns it. Nullable columns stay `None`
/// so one odd row never hides the rest of a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    #[serde(flatten)]
    pub fields: BookFields,
    #[serde(default)]
    pub is_available: Option<bool>,
    #[serde(default)]
    pub user_id: Option<UserId>,
    /// Columns this service does not model, such as `created_at`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Book {
    /// A freshly created book: available and owned by `owner`.
    pub fn new(id: BookId, fields: BookFields, owner: UserId) -> Self {
        Self {
            id,
            fields,
            is_available: Some(true),
            user_id: Some(owner),
            extra: Map::new(),
        }
    }

    pub fn is_owned_by(&self, owner: &UserId) -> bool {
        self.user_id.as_ref() == Some(owner)
    }
}
