pub mod models;
pub mod routes;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use bookshelf_authz::IdentityVerifier;
use bookshelf_db::BookStore;
use bookshelf_kernel::{InitCtx, Module};
use serde_json::json;

use routes::BooksState;

/// Books catalogue: public listing plus owner-scoped mutations.
pub struct BooksModule {
    state: BooksState,
}

impl BooksModule {
    pub fn new(verifier: Arc<dyn IdentityVerifier>, store: Arc<dyn BookStore>) -> Self {
        Self {
            state: BooksState { verifier, store },
        }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            table = %ctx.settings.store.table,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error_response = |description: &str| {
            json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                    }
                }
            })
        };
        let message_response = |description: &str| {
            json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/MessageResponse" }
                    }
                }
            })
        };
        let id_parameter = json!({
            "name": "id",
            "in": "path",
            "required": true,
            "schema": { "type": "string" }
        });
        let bearer = json!([{ "bearerAuth": [] }]);
        // Forwarded to the store as sent; text in practice.
        let book_field = json!({ "description": "Usually text; stored as sent" });

        Some(json!({
            "paths": {
                "/books": {
                    "get": {
                        "summary": "List every book",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "All books of all owners",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/Book" }
                                        }
                                    }
                                }
                            },
                            "500": error_response("Store error")
                        }
                    },
                    "post": {
                        "summary": "Add a book owned by the caller",
                        "tags": ["Books"],
                        "security": bearer,
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/CreateBook" }
                                }
                            }
                        },
                        "responses": {
                            "200": {
                                "description": "Book added",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/BookCreated" }
                                    }
                                }
                            },
                            "400": error_response("Malformed JSON body"),
                            "401": error_response("Missing or invalid bearer token"),
                            "500": error_response("Store error")
                        }
                    }
                },
                "/books/{id}": {
                    "put": {
                        "summary": "Set availability of a book owned by the caller",
                        "tags": ["Books"],
                        "security": bearer,
                        "parameters": [id_parameter],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/UpdateAvailability" }
                                }
                            }
                        },
                        "responses": {
                            "200": message_response("Availability updated; also returned when no owned book matched"),
                            "400": error_response("Malformed JSON body"),
                            "401": error_response("Missing or invalid bearer token"),
                            "500": error_response("Store error")
                        }
                    },
                    "delete": {
                        "summary": "Delete a book owned by the caller",
                        "tags": ["Books"],
                        "security": bearer,
                        "parameters": [id_parameter],
                        "responses": {
                            "200": message_response("Book deleted; also returned when no owned book matched"),
                            "401": error_response("Missing or invalid bearer token"),
                            "500": error_response("Store error")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": {
                                "oneOf": [{ "type": "integer" }, { "type": "string" }],
                                "description": "Identifier assigned by the store"
                            },
                            "image_url": book_field,
                            "book_name": book_field,
                            "author_name": book_field,
                            "student_name": book_field,
                            "whatsapp_number": book_field,
                            "is_available": { "type": ["boolean", "null"] },
                            "user_id": {
                                "type": ["string", "null"],
                                "description": "Owner of the book"
                            }
                        },
                        "required": ["id"]
                    },
                    "CreateBook": {
                        "type": "object",
                        "properties": {
                            "image_url": book_field,
                            "book_name": book_field,
                            "author_name": book_field,
                            "student_name": book_field,
                            "whatsapp_number": book_field
                        }
                    },
                    "UpdateAvailability": {
                        "type": "object",
                        "properties": {
                            "is_available": { "type": "boolean" }
                        }
                    },
                    "MessageResponse": {
                        "type": "object",
                        "properties": { "message": { "type": "string" } },
                        "required": ["message"]
                    },
                    "BookCreated": {
                        "type": "object",
                        "properties": {
                            "message": { "type": "string" },
                            "data": {
                                "type": "array",
                                "items": { "$ref": "#/components/schemas/Book" }
                            }
                        },
                        "required": ["message", "data"]
                    }
                },
                "securitySchemes": {
                    "bearerAuth": { "type": "http", "scheme": "bearer" }
                }
            }
        }))
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create a new instance of the books module
pub fn create_module(
    verifier: Arc<dyn IdentityVerifier>,
    store: Arc<dyn BookStore>,
) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(verifier, store))
}
