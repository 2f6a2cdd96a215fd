// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Hosted table backend client (PostgREST protocol).
//!
//! Handles:
//! - Row insert with `Prefer: return=representation`
//! - Filtered, ordered, paged selects
//! - Delete by `id`
//! - Passing backend error messages through verbatim

use crate::db::query::render_scalar;
use crate::db::{Direction, Filter, Query, StoreError, TableStore};
use async_trait::async_trait;
use serde_json::Value;

/// PostgREST-backed table store.
#[derive(Clone)]
pub struct RestStore {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RestStore {
    /// Create a client for `{base_url}/rest/v1` authenticated with a service key.
    pub fn new(base_url: &str, api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// Check response status and parse the JSON body.
    async fn check_response_json(&self, response: reqwest::Response) -> Result<Value, StoreError> {
        let response = self.check_response(response).await?;
        response
            .json()
            .await
            .map_err(|e| StoreError::Decode(format!("JSON parse error: {}", e)))
    }

    /// Turn a non-2xx response into the backend's own error message.
    async fn check_response(
        &self,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, StoreError> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status = %status, "Table backend rejected request");

        Err(StoreError::Backend(error_message(status, &body)))
    }
}

#[async_trait]
impl TableStore for RestStore {
    async fn insert(&self, table: &str, record: Value) -> Result<Value, StoreError> {
        let response = self
            .request(reqwest::Method::POST, &self.table_url(table))
            .header("Prefer", "return=representation")
            .json(&record)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        match self.check_response_json(response).await? {
            Value::Array(mut rows) if !rows.is_empty() => Ok(rows.swap_remove(0)),
            Value::Array(_) => Err(StoreError::Decode(
                "Insert returned no representation".to_string(),
            )),
            row => Ok(row),
        }
    }

    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>, StoreError> {
        let url = format!("{}?{}", self.table_url(table), query_string(query));

        let response = self
            .request(reqwest::Method::GET, &url)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        match self.check_response_json(response).await? {
            Value::Array(rows) => Ok(rows),
            other => Err(StoreError::Decode(format!(
                "Expected an array of rows, got {}",
                other
            ))),
        }
    }

    async fn delete(&self, table: &str, id: &str) -> Result<(), StoreError> {
        let url = format!(
            "{}?id=eq.{}",
            self.table_url(table),
            urlencoding::encode(id)
        );

        let response = self
            .request(reqwest::Method::DELETE, &url)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        self.check_response(response).await?;
        Ok(())
    }
}

/// Build the PostgREST query string for a select.
pub(crate) fn query_string(query: &Query) -> String {
    let mut params: Vec<(String, String)> = Vec::new();

    let select = match &query.columns {
        Some(columns) => columns.join(","),
        None => "*".to_string(),
    };
    params.push(("select".to_string(), select));

    for filter in &query.filters {
        match filter {
            Filter::Eq(column, value) => {
                params.push((column.clone(), format!("eq.{}", render_scalar(value))));
            }
            Filter::In(column, values) => {
                let list: Vec<String> = values
                    .iter()
                    .map(|v| match v {
                        Value::String(s) => format!("\"{}\"", s.replace('"', "\\\"")),
                        other => render_scalar(other),
                    })
                    .collect();
                params.push((column.clone(), format!("in.({})", list.join(","))));
            }
        }
    }

    if let Some(order) = &query.order {
        let dir = match order.direction {
            Direction::Ascending => "asc",
            Direction::Descending => "desc",
        };
        params.push(("order".to_string(), format!("{}.{}", order.column, dir)));
    }
    if let Some(limit) = query.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }
    if let Some(offset) = query.offset {
        params.push(("offset".to_string(), offset.to_string()));
    }

    params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// PostgREST errors are JSON objects with a `message` field.
fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or_else(|| {
            if body.is_empty() {
                format!("HTTP {}", status)
            } else {
                body.to_string()
            }
        })
}
