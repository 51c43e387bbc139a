// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Gateway implementation against the hosted backend: a small JSON-over-HTTP
//! API with one resource per entity table.
//!
//! ```text
//! GET    {base}/tables/{table}?field=value   -> [row, ...]
//! POST   {base}/tables/{table}               -> row (id assigned)
//! PATCH  {base}/tables/{table}/{id}          -> row (patch merged)
//! DELETE {base}/tables/{table}/{id}          -> empty
//! ```

use anyhow::{Context, Result, bail};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, Response};
use serde_json::Value;
use std::time::Duration;
use url::Url;

use alma_store::{Gateway, GatewayError, ListFilter, Row};

const API_KEY_HEADER: &str = "x-api-key";

pub struct RemoteGateway {
    base_url: String,
    api_key: Option<String>,
    http: HttpClient,
}

impl RemoteGateway {
    pub fn new(base_url: &str, api_key: Option<&str>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            bail!("gateway.base_url must not be empty");
        }
        let parsed = Url::parse(&base_url)
            .with_context(|| format!("gateway.base_url {base_url:?} is not a valid URL"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!(
                "gateway.base_url {base_url:?} must use http or https, got {}",
                parsed.scheme()
            );
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            api_key: api_key.map(str::to_owned),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Cheap reachability probe for `--check`: lists a table the portal is
    /// guaranteed to have.
    pub fn ping(&self) -> Result<(), GatewayError> {
        self.list("announcements", &ListFilter::new()).map(|_| ())
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/tables/{table}", self.base_url)
    }

    fn row_url(&self, table: &str, id: i64) -> String {
        format!("{}/tables/{table}/{id}", self.base_url)
    }

    fn send(
        &self,
        request: reqwest::blocking::RequestBuilder,
    ) -> Result<Response, GatewayError> {
        let request = match &self.api_key {
            Some(key) => request.header(API_KEY_HEADER, key),
            None => request,
        };
        request
            .send()
            .map_err(|error| connection_error(&self.base_url, &error))
    }

    fn expect_success(
        &self,
        response: Response,
        table: &str,
        id: Option<i64>,
    ) -> Result<Response, GatewayError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        Err(status_error(status, &body, table, id))
    }

    fn decode_row(&self, response: Response, table: &str) -> Result<Row, GatewayError> {
        let value: Value = response
            .json()
            .map_err(|error| GatewayError::Decode(format!("{table} row: {error}")))?;
        match value {
            Value::Object(row) => Ok(row),
            other => Err(GatewayError::Decode(format!(
                "{table} row: expected an object, got {other}"
            ))),
        }
    }
}

impl Gateway for RemoteGateway {
    fn list(&self, table: &str, filter: &ListFilter) -> Result<Vec<Row>, GatewayError> {
        let query: Vec<(String, String)> = filter
            .equals()
            .iter()
            .map(|(field, value)| (field.clone(), query_text(value)))
            .collect();
        let response = self.send(self.http.get(self.table_url(table)).query(&query))?;
        let response = self.expect_success(response, table, None)?;

        let value: Value = response
            .json()
            .map_err(|error| GatewayError::Decode(format!("{table} rows: {error}")))?;
        let Value::Array(items) = value else {
            return Err(GatewayError::Decode(format!(
                "{table} rows: expected an array"
            )));
        };
        let mut rows = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Value::Object(row) => rows.push(row),
                other => {
                    return Err(GatewayError::Decode(format!(
                        "{table} rows: expected objects, got {other}"
                    )));
                }
            }
        }
        Ok(rows)
    }

    fn insert(&self, table: &str, row: Row) -> Result<Row, GatewayError> {
        let response = self.send(self.http.post(self.table_url(table)).json(&row))?;
        let response = self.expect_success(response, table, None)?;
        self.decode_row(response, table)
    }

    fn update(&self, table: &str, id: i64, patch: Row) -> Result<Row, GatewayError> {
        let response = self.send(self.http.patch(self.row_url(table, id)).json(&patch))?;
        let response = self.expect_success(response, table, Some(id))?;
        self.decode_row(response, table)
    }

    fn delete(&self, table: &str, id: i64) -> Result<(), GatewayError> {
        let response = self.send(self.http.delete(self.row_url(table, id)))?;
        self.expect_success(response, table, Some(id)).map(|_| ())
    }
}

fn query_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        other => other.to_string(),
    }
}

fn connection_error(base_url: &str, error: &reqwest::Error) -> GatewayError {
    if error.is_timeout() {
        return GatewayError::Connection(format!("{base_url} timed out"));
    }
    GatewayError::Connection(format!("{base_url}: {error}"))
}

fn status_error(status: StatusCode, body: &str, table: &str, id: Option<i64>) -> GatewayError {
    let detail = clean_body(body, status);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GatewayError::Denied(detail),
        StatusCode::NOT_FOUND => GatewayError::NotFound {
            table: table.to_owned(),
            id: id.unwrap_or(0),
        },
        _ => GatewayError::Rejected(detail),
    }
}

/// Backends tend to wrap errors as `{"error": "..."}`; surface the message
/// rather than the envelope.
fn clean_body(body: &str, status: StatusCode) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return format!("HTTP {status}");
    }
    if let Ok(Value::Object(object)) = serde_json::from_str::<Value>(trimmed)
        && let Some(Value::String(message)) = object.get("error").or_else(|| object.get("message"))
    {
        return message.clone();
    }
    let mut detail = trimmed.replace('\n', " ");
    if detail.len() > 200 {
        detail.truncate(200);
        detail.push_str("...");
    }
    format!("HTTP {status}: {detail}")
}

#[cfg(test)]
mod tests {
    use super::{RemoteGateway, clean_body};
    use reqwest::StatusCode;
    use std::time::Duration;

    #[test]
    fn base_url_must_be_http() {
        assert!(RemoteGateway::new("ftp://backend", None, Duration::from_secs(1)).is_err());
        assert!(RemoteGateway::new("", None, Duration::from_secs(1)).is_err());
        assert!(RemoteGateway::new("not a url", None, Duration::from_secs(1)).is_err());
        let gateway =
            RemoteGateway::new("https://api.example.com/", None, Duration::from_secs(1))
                .expect("valid base url");
        assert_eq!(gateway.base_url(), "https://api.example.com");
    }

    #[test]
    fn clean_body_unwraps_error_envelopes() {
        let status = StatusCode::UNPROCESSABLE_ENTITY;
        assert_eq!(
            clean_body(r#"{"error":"amount_cents must be positive"}"#, status),
            "amount_cents must be positive"
        );
        assert_eq!(clean_body("", status), "HTTP 422 Unprocessable Entity");
        assert!(clean_body("plain text failure", status).contains("plain text failure"));
    }
}
