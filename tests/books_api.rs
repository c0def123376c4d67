use std::sync::Arc;

use anyhow::Result;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use bookshelf_app::modules::books;
use bookshelf_authz::testing::StaticIdentityVerifier;
use bookshelf_db::testing::InMemoryBookStore;
use bookshelf_db::{Book, BookFields, BookId};
use bookshelf_kernel::{settings::Settings, ModuleRegistry, UserId};

const ALICE_TOKEN: &str = "token-u1";
const BOB_TOKEN: &str = "token-u2";

struct Harness {
    router: Router,
    store: Arc<InMemoryBookStore>,
    verifier: Arc<StaticIdentityVerifier>,
}

fn book(id: i64, name: &str, owner: &str) -> Book {
    Book::new(BookId::Number(id), BookFields::named(name), UserId::new(owner))
}

fn harness_with(store: InMemoryBookStore, verifier: StaticIdentityVerifier) -> Harness {
    let store = Arc::new(store);
    let verifier = Arc::new(verifier);

    let mut registry = ModuleRegistry::new();
    registry.register(books::create_module(verifier.clone(), store.clone()));

    Harness {
        router: bookshelf_http::build_router(&registry, &Settings::default()),
        store,
        verifier,
    }
}

fn harness(store: InMemoryBookStore) -> Harness {
    harness_with(
        store,
        StaticIdentityVerifier::new()
            .with_token(ALICE_TOKEN, "U1")
            .with_token(BOB_TOKEN, "U2"),
    )
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(router: &Router, request: Request<Body>) -> Result<(StatusCode, Value)> {
    let response = router.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok((status, serde_json::from_slice(&bytes)?))
}

#[tokio::test]
async fn list_is_public_and_returns_every_owner() -> Result<()> {
    let h = harness(InMemoryBookStore::with_books(vec![
        book(1, "Dune", "U1"),
        book(2, "Emma", "U2"),
    ]));

    let (status, body) = send(&h.router, request("GET", "/books", None, None)).await?;

    assert_eq!(status, StatusCode::OK);
    let books = body.as_array().expect("array of books");
    assert_eq!(books.len(), 2);
    assert_eq!(books[0]["user_id"], "U1");
    assert_eq!(books[1]["user_id"], "U2");
    assert_eq!(h.verifier.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn list_includes_rows_with_missing_owner_or_flag() -> Result<()> {
    let orphan = Book {
        is_available: None,
        user_id: None,
        ..book(9, "Emma", "U1")
    };
    let h = harness(InMemoryBookStore::with_books(vec![book(1, "Dune", "U1"), orphan]));

    let (status, body) = send(&h.router, request("GET", "/books", None, None)).await?;

    assert_eq!(status, StatusCode::OK);
    let books = body.as_array().expect("array of books");
    assert_eq!(books.len(), 2);
    assert_eq!(books[1]["user_id"], Value::Null);
    assert_eq!(books[1]["is_available"], Value::Null);
    Ok(())
}

#[tokio::test]
async fn mutations_without_token_are_unauthorized_and_never_touch_the_store() -> Result<()> {
    let h = harness(InMemoryBookStore::with_books(vec![book(42, "Dune", "U1")]));

    for req in [
        request("POST", "/books", None, Some(json!({"book_name": "Dune"}))),
        request("DELETE", "/books/42", None, None),
        request("PUT", "/books/42", None, Some(json!({"is_available": false}))),
        // The guard runs before the body is parsed.
        request("PUT", "/books/42", None, Some(json!("not an object"))),
    ] {
        let (status, body) = send(&h.router, req).await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({"error": "Unauthorized"}));
    }

    assert_eq!(h.store.calls(), 0);
    assert_eq!(h.verifier.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn invalid_token_is_unauthorized() -> Result<()> {
    let h = harness(InMemoryBookStore::new());

    let (status, body) = send(
        &h.router,
        request("DELETE", "/books/1", Some("forged"), None),
    )
    .await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"error": "Unauthorized"}));
    assert_eq!(h.verifier.calls(), 1);
    assert_eq!(h.store.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn provider_outage_looks_like_an_invalid_token() -> Result<()> {
    let h = harness_with(InMemoryBookStore::new(), StaticIdentityVerifier::unavailable());

    let (status, body) = send(
        &h.router,
        request("POST", "/books", Some(ALICE_TOKEN), Some(json!({}))),
    )
    .await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"error": "Unauthorized"}));
    assert_eq!(h.store.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn create_assigns_caller_as_owner_and_marks_available() -> Result<()> {
    let h = harness(InMemoryBookStore::new());

    let (status, body) = send(
        &h.router,
        request(
            "POST",
            "/books",
            Some(ALICE_TOKEN),
            Some(json!({
                "book_name": "Dune",
                "author_name": "Herbert",
                "student_name": "Alice",
                "whatsapp_number": "+1555",
                "image_url": "http://x/y.jpg",
                "is_available": false,
                "user_id": "U2"
            })),
        ),
    )
    .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Book added successfully");
    let data = body["data"].as_array().expect("data array");
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["user_id"], "U1");
    assert_eq!(data[0]["is_available"], true);

    let stored = h.store.books();
    assert_eq!(stored.len(), 1);
    let row = &stored[0];
    assert!(row.is_owned_by(&UserId::new("U1")));
    assert_eq!(row.is_available, Some(true));
    assert_eq!(
        row.fields,
        BookFields {
            image_url: Some(json!("http://x/y.jpg")),
            book_name: Some(json!("Dune")),
            author_name: Some(json!("Herbert")),
            student_name: Some(json!("Alice")),
            whatsapp_number: Some(json!("+1555")),
        }
    );
    Ok(())
}

#[tokio::test]
async fn create_with_missing_fields_stores_nulls() -> Result<()> {
    let h = harness(InMemoryBookStore::new());

    let (status, body) = send(
        &h.router,
        request("POST", "/books", Some(ALICE_TOKEN), Some(json!({"book_name": "Emma"}))),
    )
    .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["author_name"], Value::Null);
    assert_eq!(h.store.books()[0].fields.author_name, None);
    Ok(())
}

#[tokio::test]
async fn create_forwards_non_text_fields_untouched() -> Result<()> {
    let h = harness(InMemoryBookStore::new());

    let (status, body) = send(
        &h.router,
        request(
            "POST",
            "/books",
            Some(ALICE_TOKEN),
            Some(json!({"book_name": "Dune", "whatsapp_number": 15551234})),
        ),
    )
    .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["whatsapp_number"], 15551234);
    assert_eq!(h.store.books()[0].fields.whatsapp_number, Some(json!(15551234)));
    assert_eq!(h.store.calls(), 1);
    Ok(())
}

#[tokio::test]
async fn set_availability_by_owner_updates_the_row() -> Result<()> {
    let h = harness(InMemoryBookStore::with_books(vec![book(42, "Dune", "U1")]));

    let (status, body) = send(
        &h.router,
        request(
            "PUT",
            "/books/42",
            Some(ALICE_TOKEN),
            Some(json!({"is_available": false})),
        ),
    )
    .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Availability updated"}));
    assert_eq!(h.store.find("42").expect("book 42").is_available, Some(false));
    Ok(())
}

#[tokio::test]
async fn mutations_on_someone_elses_book_succeed_silently() -> Result<()> {
    let h = harness(InMemoryBookStore::with_books(vec![book(42, "Dune", "U1")]));

    let (status, body) = send(
        &h.router,
        request(
            "PUT",
            "/books/42",
            Some(BOB_TOKEN),
            Some(json!({"is_available": false})),
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Availability updated"}));

    let (status, body) = send(
        &h.router,
        request("DELETE", "/books/42", Some(BOB_TOKEN), None),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Book deleted successfully"}));

    let untouched = h.store.find("42").expect("book 42 still exists");
    assert_eq!(untouched.is_available, Some(true));
    assert!(untouched.is_owned_by(&UserId::new("U1")));
    Ok(())
}

#[tokio::test]
async fn deleting_twice_reports_success_both_times() -> Result<()> {
    let h = harness(InMemoryBookStore::with_books(vec![book(42, "Dune", "U1")]));

    for _ in 0..2 {
        let (status, body) = send(
            &h.router,
            request("DELETE", "/books/42", Some(ALICE_TOKEN), None),
        )
        .await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"message": "Book deleted successfully"}));
    }

    assert!(h.store.find("42").is_none());
    assert_eq!(h.store.calls(), 2);
    Ok(())
}

#[tokio::test]
async fn store_failures_surface_the_store_message() -> Result<()> {
    let h = harness(InMemoryBookStore::new());
    h.store.fail_with("connection to store refused");

    let (status, body) = send(&h.router, request("GET", "/books", None, None)).await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "connection to store refused"}));

    let (status, body) = send(
        &h.router,
        request("DELETE", "/books/1", Some(ALICE_TOKEN), None),
    )
    .await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "connection to store refused"}));
    Ok(())
}

#[tokio::test]
async fn non_boolean_availability_reaches_the_store() -> Result<()> {
    let h = harness(InMemoryBookStore::with_books(vec![book(42, "Dune", "U1")]));

    let (status, body) = send(
        &h.router,
        request(
            "PUT",
            "/books/42",
            Some(ALICE_TOKEN),
            Some(json!({"is_available": "nope"})),
        ),
    )
    .await?;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({"error": "invalid input syntax for type boolean: \"nope\""})
    );
    assert_eq!(h.store.calls(), 1);
    Ok(())
}

#[tokio::test]
async fn malformed_json_body_is_a_bad_request() -> Result<()> {
    let h = harness(InMemoryBookStore::new());

    let req = Request::builder()
        .method("POST")
        .uri("/books")
        .header(header::AUTHORIZATION, format!("Bearer {ALICE_TOKEN}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"book_name\": "))?;
    let (status, body) = send(&h.router, req).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert_eq!(h.store.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn put_without_json_content_type_is_an_empty_update() -> Result<()> {
    let h = harness(InMemoryBookStore::with_books(vec![book(42, "Dune", "U1")]));

    let req = Request::builder()
        .method("PUT")
        .uri("/books/42")
        .header(header::AUTHORIZATION, format!("Bearer {ALICE_TOKEN}"))
        .body(Body::from("{\"is_available\": false}"))?;
    let (status, body) = send(&h.router, req).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Availability updated"}));
    assert_eq!(h.store.calls(), 1);
    assert_eq!(h.store.find("42").expect("book 42").is_available, Some(true));
    Ok(())
}

#[tokio::test]
async fn post_without_json_content_type_adds_an_empty_book() -> Result<()> {
    let h = harness(InMemoryBookStore::new());

    let req = Request::builder()
        .method("POST")
        .uri("/books")
        .header(header::AUTHORIZATION, format!("Bearer {ALICE_TOKEN}"))
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("Dune"))?;
    let (status, body) = send(&h.router, req).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["book_name"], Value::Null);
    assert_eq!(body["data"][0]["user_id"], "U1");
    Ok(())
}

#[tokio::test]
async fn unknown_routes_get_json_not_found() -> Result<()> {
    let h = harness(InMemoryBookStore::new());

    let (status, body) = send(&h.router, request("GET", "/authors", None, None)).await?;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Not found"}));
    Ok(())
}

#[tokio::test]
async fn openapi_document_describes_book_routes() -> Result<()> {
    let h = harness(InMemoryBookStore::new());

    let (status, body) = send(
        &h.router,
        request("GET", "/docs/openapi.json", None, None),
    )
    .await?;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/books"]["post"].is_object());
    assert!(body["paths"]["/books/{id}"]["delete"].is_object());
    assert!(body["components"]["securitySchemes"]["bearerAuth"].is_object());
    Ok(())
}
