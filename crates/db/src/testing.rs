//! In-process [`BookStore`] for tests. It mirrors the store's observable
//! behavior (owner-scoped mutations, boolean column) and counts calls so tests
//! can assert that a request never reached persistence.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use bookshelf_kernel::UserId;
use serde_json::Value;

use crate::error::StoreError;
use crate::models::{Book, BookFields, BookId};
use crate::store::BookStore;

#[derive(Default)]
pub struct InMemoryBookStore {
    state: Mutex<State>,
    calls: AtomicUsize,
}

#[derive(Default)]
struct State {
    books: Vec<Book>,
    last_id: i64,
    failure: Option<String>,
}

impl InMemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store. New books are numbered after the largest numeric id.
    pub fn with_books(books: Vec<Book>) -> Self {
        let last_id = books
            .iter()
            .filter_map(|book| match book.id {
                BookId::Number(id) => Some(id),
                BookId::Text(_) => None,
            })
            .max()
            .unwrap_or(0);
        Self {
            state: Mutex::new(State {
                books,
                last_id,
                failure: None,
            }),
            calls: AtomicUsize::new(0),
        }
    }

    /// Make every following call fail with `message`, as an unreachable store would.
    pub fn fail_with(&self, message: impl Into<String>) {
        self.state().failure = Some(message.into());
    }

    pub fn books(&self) -> Vec<Book> {
        self.state().books.clone()
    }

    pub fn find(&self, id: &str) -> Option<Book> {
        self.state()
            .books
            .iter()
            .find(|book| book.id.to_string() == id)
            .cloned()
    }

    /// Number of trait calls served so far, failed ones included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn enter(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state();
        if let Some(message) = state.failure.clone() {
            return Err(StoreError::Transport { message });
        }
        Ok(state)
    }
}

fn owned_by(book: &Book, id: &str, owner: &UserId) -> bool {
    book.id.to_string() == id && book.is_owned_by(owner)
}

#[async_trait]
impl BookStore for InMemoryBookStore {
    async fn list_all(&self) -> Result<Vec<Book>, StoreError> {
        Ok(self.enter()?.books.clone())
    }

    async fn create(&self, fields: BookFields, owner: &UserId) -> Result<Book, StoreError> {
        let mut state = self.enter()?;
        state.last_id += 1;
        let book = Book::new(BookId::Number(state.last_id), fields, owner.clone());
        state.books.push(book.clone());
        Ok(book)
    }

    async fn delete(&self, id: &str, owner: &UserId) -> Result<usize, StoreError> {
        let mut state = self.enter()?;
        let before = state.books.len();
        state.books.retain(|book| !owned_by(book, id, owner));
        Ok(before - state.books.len())
    }

    async fn set_availability(
        &self,
        id: &str,
        owner: &UserId,
        is_available: Option<Value>,
    ) -> Result<usize, StoreError> {
        let mut state = self.enter()?;
        let flag = match is_available {
            None => None,
            Some(Value::Bool(flag)) => Some(flag),
            Some(other) => {
                let raw = match other {
                    Value::String(text) => text,
                    other => other.to_string(),
                };
                return Err(StoreError::Rejected {
                    status: 400,
                    code: Some("22P02".to_string()),
                    message: format!("invalid input syntax for type boolean: \"{raw}\""),
                });
            }
        };

        let mut matched = 0;
        for book in state.books.iter_mut().filter(|book| owned_by(book, id, owner)) {
            if let Some(flag) = flag {
                book.is_available = Some(flag);
            }
            matched += 1;
        }
        Ok(matched)
    }
}
