//! HTTP handlers for `/books`.

use std::sync::Arc;

use axum::{
    extract::{FromRef, Path, State},
    routing::{get, put},
    Json, Router,
};
use bookshelf_authz::IdentityVerifier;
use bookshelf_db::{Book, BookStore};
use bookshelf_http::{
    error::AppError,
    extract::{AppJson, AuthUser},
};
use bookshelf_kernel::UserId;

use super::models::{
    BookCreatedResponse, CreateBookRequest, MessageResponse, UpdateAvailabilityRequest,
    AVAILABILITY_UPDATED, BOOK_ADDED, BOOK_DELETED,
};

/// Long-lived clients shared by every request.
#[derive(Clone)]
pub struct BooksState {
    pub verifier: Arc<dyn IdentityVerifier>,
    pub store: Arc<dyn BookStore>,
}

impl FromRef<BooksState> for Arc<dyn IdentityVerifier> {
    fn from_ref(state: &BooksState) -> Self {
        state.verifier.clone()
    }
}

impl FromRef<BooksState> for Arc<dyn BookStore> {
    fn from_ref(state: &BooksState) -> Self {
        state.store.clone()
    }
}

pub fn router(state: BooksState) -> Router {
    Router::new()
        .route("/books", get(list_books).post(create_book))
        .route("/books/{id}", put(update_availability).delete(delete_book))
        .with_state(state)
}

/// Every book of every owner; no authentication.
async fn list_books(
    State(store): State<Arc<dyn BookStore>>,
) -> Result<Json<Vec<Book>>, AppError> {
    let books = store.list_all().await?;
    Ok(Json(books))
}

async fn create_book(
    AuthUser(user): AuthUser,
    State(store): State<Arc<dyn BookStore>>,
    AppJson(request): AppJson<CreateBookRequest>,
) -> Result<Json<BookCreatedResponse>, AppError> {
    let book = store.create(request, &user).await?;
    tracing::info!(book_id = %book.id, user_id = %user, "book added");

    Ok(Json(BookCreatedResponse {
        message: BOOK_ADDED.to_string(),
        data: vec![book],
    }))
}

async fn delete_book(
    AuthUser(user): AuthUser,
    State(store): State<Arc<dyn BookStore>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let matched = store.delete(&id, &user).await?;
    log_matched("delete", &id, &user, matched);
    Ok(Json(MessageResponse::new(BOOK_DELETED)))
}

async fn update_availability(
    AuthUser(user): AuthUser,
    State(store): State<Arc<dyn BookStore>>,
    Path(id): Path<String>,
    AppJson(request): AppJson<UpdateAvailabilityRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let matched = store
        .set_availability(&id, &user, request.is_available)
        .await?;
    log_matched("set_availability", &id, &user, matched);
    Ok(Json(MessageResponse::new(AVAILABILITY_UPDATED)))
}

/// Callers are told the mutation succeeded either way; only the log knows
/// whether a row was actually owned by them.
fn log_matched(operation: &'static str, id: &str, user: &UserId, matched: usize) {
    if matched == 0 {
        tracing::info!(operation, book_id = %id, user_id = %user, "no book matched id and owner");
    } else {
        tracing::debug!(operation, book_id = %id, user_id = %user, matched, "book updated");
    }
}
