use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde_json::Value;

use crate::database::{escape_like, Predicate, Row, RowStore, SelectQuery, StoreError, Table};

/// Table API of the hosted backend (`{base}/rest/v1/{table}`)
#[derive(Clone)]
pub struct PostgrestStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl PostgrestStore {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            base_url: normalize_base_url(base_url),
            api_key: api_key.to_string(),
        })
    }

    fn request(&self, method: Method, table: Table) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, table.name());
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// Sends the request and decodes the returned row array
    async fn send_for_rows(&self, request: RequestBuilder) -> Result<Vec<Row>, StoreError> {
        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(status, text));
        }

        let rows: Vec<Value> = response
            .json()
            .await
            .map_err(|e| StoreError::Unavailable(format!("invalid response body: {e}")))?;

        Ok(rows
            .into_iter()
            .filter_map(|value| match value {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect())
    }
}

#[async_trait]
impl RowStore for PostgrestStore {
    fn backend(&self) -> &'static str {
        "rest"
    }

    async fn select(&self, table: Table, query: &SelectQuery) -> Result<Vec<Row>, StoreError> {
        let request = self
            .request(Method::GET, table)
            .query(&select_params(query));
        self.send_for_rows(request).await
    }

    async fn insert(&self, table: Table, row: Row) -> Result<Row, StoreError> {
        let request = self
            .request(Method::POST, table)
            .header("Prefer", "return=representation")
            .json(&row);

        self.send_for_rows(request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Rejected("insert returned no row".into()))
    }

    async fn update(&self, table: Table, id: &str, mut row: Row) -> Result<Row, StoreError> {
        row.remove("id");
        let request = self
            .request(Method::PATCH, table)
            .header("Prefer", "return=representation")
            .query(&[("id", format!("eq.{id}"))])
            .json(&row);

        self.send_for_rows(request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::not_found(table, id))
    }

    async fn delete(&self, table: Table, id: &str) -> Result<(), StoreError> {
        let request = self
            .request(Method::DELETE, table)
            .header("Prefer", "return=representation")
            .query(&[("id", format!("eq.{id}"))]);

        if self.send_for_rows(request).await?.is_empty() {
            return Err(StoreError::not_found(table, id));
        }
        Ok(())
    }
}

/// Translates a select request into PostgREST query parameters
fn select_params(query: &SelectQuery) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), "*".to_string())];

    for predicate in &query.predicates {
        match predicate {
            Predicate::Eq { column, value } => {
                let filter = match value {
                    Value::Null => "is.null".to_string(),
                    Value::String(text) => format!("eq.{text}"),
                    other => format!("eq.{other}"),
                };
                params.push((column.to_string(), filter));
            }
            Predicate::Contains { columns, needle } => {
                let pattern = quote_value(&format!("*{}*", escape_like(needle)));
                let alternatives: Vec<String> = columns
                    .iter()
                    .map(|c| format!("{c}.ilike.{pattern}"))
                    .collect();
                params.push(("or".to_string(), format!("({})", alternatives.join(","))));
            }
        }
    }

    if let Some(order) = &query.order {
        let direction = if order.descending { "desc" } else { "asc" };
        params.push((
            "order".to_string(),
            format!("{}.{}.nullslast", order.column, direction),
        ));
    }

    params
}

/// Double-quotes a value inside a logical filter so commas and parentheses
/// in user input stay literal
fn quote_value(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

fn status_error(status: StatusCode, body: String) -> StoreError {
    if status.is_server_error() || status == StatusCode::NOT_FOUND {
        StoreError::Unavailable(format!("{status}: {body}"))
    } else {
        StoreError::Rejected(format!("{status}: {body}"))
    }
}

fn normalize_base_url(value: &str) -> String {
    let trimmed = value.trim_end_matches('/');
    if trimmed.ends_with("/rest/v1") {
        trimmed.to_string()
    } else {
        format!("{}/rest/v1", trimmed)
    }
}
