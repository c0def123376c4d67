//! [`BookStore`] backed by a PostgREST endpoint (`{endpoint}/rest/v1/{table}`).

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use bookshelf_kernel::settings::StoreSettings;
use bookshelf_kernel::UserId;
use reqwest::{Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StoreError;
use crate::models::{Book, BookFields};
use crate::store::BookStore;

const USER_AGENT: &str = concat!("bookshelf/", env!("CARGO_PKG_VERSION"));
const RETURN_REPRESENTATION: &str = "return=representation";

pub struct PostgrestBookStore {
    client: reqwest::Client,
    table_url: Url,
    api_key: String,
}

#[derive(Serialize)]
struct InsertRow<'a> {
    #[serde(flatten)]
    fields: &'a BookFields,
    is_available: bool,
    user_id: &'a UserId,
}

#[derive(Serialize)]
struct AvailabilityPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    is_available: Option<Value>,
}

#[derive(Deserialize)]
struct PostgrestErrorBody {
    message: Option<String>,
    code: Option<String>,
}

impl PostgrestBookStore {
    pub fn new(settings: &StoreSettings) -> anyhow::Result<Self> {
        let table_url = format!(
            "{}/rest/v1/{}",
            settings.endpoint.trim_end_matches('/'),
            settings.table
        );
        let table_url = Url::parse(&table_url)
            .with_context(|| format!("invalid store endpoint '{}'", settings.endpoint))?;

        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout_ms) = settings.timeout_ms {
            builder = builder.timeout(Duration::from_millis(timeout_ms));
        }
        let client = builder
            .build()
            .with_context(|| "failed to build store HTTP client")?;

        Ok(Self {
            client,
            table_url,
            api_key: settings.api_key.clone(),
        })
    }

    pub fn table_url(&self) -> &Url {
        &self.table_url
    }

    fn request(&self, method: Method) -> RequestBuilder {
        self.client
            .request(method, self.table_url.clone())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// Request filtered to the row `id` owned by `owner`.
    fn owned_row(&self, method: Method, id: &str, owner: &UserId) -> RequestBuilder {
        self.request(method)
            .query(&[
                ("id", format!("eq.{id}")),
                ("user_id", format!("eq.{owner}")),
            ])
            .header("Prefer", RETURN_REPRESENTATION)
    }
}

#[async_trait]
impl BookStore for PostgrestBookStore {
    async fn list_all(&self) -> Result<Vec<Book>, StoreError> {
        let books: Vec<Book> = send(self.request(Method::GET).query(&[("select", "*")])).await?;
        tracing::debug!(count = books.len(), "listed books");
        Ok(books)
    }

    async fn create(&self, fields: BookFields, owner: &UserId) -> Result<Book, StoreError> {
        let row = InsertRow {
            fields: &fields,
            is_available: true,
            user_id: owner,
        };
        let request = self
            .request(Method::POST)
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&[row]);

        let inserted: Vec<Book> = send(request).await?;
        let book = inserted.into_iter().next().ok_or_else(|| StoreError::Decode {
            message: "store returned no row for insert".to_string(),
        })?;
        tracing::debug!(book_id = %book.id, owner = %owner, "inserted book");
        Ok(book)
    }

    async fn delete(&self, id: &str, owner: &UserId) -> Result<usize, StoreError> {
        let deleted: Vec<Value> = send(self.owned_row(Method::DELETE, id, owner)).await?;
        Ok(deleted.len())
    }

    async fn set_availability(
        &self,
        id: &str,
        owner: &UserId,
        is_available: Option<Value>,
    ) -> Result<usize, StoreError> {
        let request = self
            .owned_row(Method::PATCH, id, owner)
            .json(&AvailabilityPatch { is_available });
        let updated: Vec<Value> = send(request).await?;
        Ok(updated.len())
    }
}

async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, StoreError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(rejection(status, body));
    }
    Ok(response.json::<T>().await?)
}

fn rejection(status: StatusCode, body: String) -> StoreError {
    let parsed = serde_json::from_str::<PostgrestErrorBody>(&body).ok();
    let (message, code) = match parsed {
        Some(PostgrestErrorBody {
            message: Some(message),
            code,
        }) => (message, code),
        _ if !body.trim().is_empty() => (body, None),
        _ => (format!("store responded with {status}"), None),
    };

    tracing::warn!(status = status.as_u16(), code = ?code, %message, "store rejected request");
    StoreError::Rejected {
        status: status.as_u16(),
        code,
        message,
    }
}
