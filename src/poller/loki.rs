//! Log source client — range/instant query + readiness against a
//! Loki-compatible HTTP log backend.

use std::collections::HashMap;
use std::pin::Pin;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::model::LogEntry;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("log backend returned non-success status: {0}")]
    NonSuccessStatus(String),
    #[error("unexpected response shape: {0}")]
    MalformedResponse(String),
}

/// Abstract log source: object-safe so tests can substitute a fake.
pub trait LogSource: Send + Sync {
    fn query_range<'a>(
        &'a self,
        query: &'a str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: u32,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<Vec<LogEntry>, TransportError>> + Send + 'a>>;

    fn ready<'a>(&'a self) -> Pin<Box<dyn std::future::Future<Output = bool> + Send + 'a>>;
}

pub struct LokiClient {
    http: reqwest::Client,
    base_url: String,
    tenant: Option<String>,
    basic_auth: Option<(String, String)>,
}

impl LokiClient {
    pub fn new(
        base_url: String,
        tenant: Option<String>,
        basic_auth: Option<(String, String)>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url, tenant, basic_auth })
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        let mut req = self.http.get(url).header("Accept", "application/json");
        if let Some(tenant) = &self.tenant {
            req = req.header("X-Scope-OrgID", tenant);
        }
        if let Some((user, pass)) = &self.basic_auth {
            req = req.basic_auth(user, Some(pass));
        }
        req
    }
}

impl LogSource for LokiClient {
    fn query_range<'a>(
        &'a self,
        query: &'a str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: u32,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<Vec<LogEntry>, TransportError>> + Send + 'a>> {
        Box::pin(async move {
            let url = format!(
                "{}/loki/api/v1/query_range?query={}&start={}&end={}&limit={}&direction=backward",
                self.base_url,
                urlencode(query),
                start.timestamp_nanos_opt().unwrap_or_default(),
                end.timestamp_nanos_opt().unwrap_or_default(),
                limit,
            );
            let response = self.request(&url).send().await?;
            if !response.status().is_success() {
                return Err(TransportError::NonSuccessStatus(response.status().to_string()));
            }
            let body: LokiResponse = response.json().await?;
            parse_response(body)
        })
    }

    fn ready<'a>(&'a self) -> Pin<Box<dyn std::future::Future<Output = bool> + Send + 'a>> {
        Box::pin(async move {
            let url = format!("{}/ready", self.base_url);
            matches!(self.request(&url).send().await, Ok(resp) if resp.status().is_success())
        })
    }
}

fn urlencode(s: &str) -> String {
    // Loki query strings are LogQL and rarely contain bytes beyond the
    // reserved set used here; a full percent-encoder is unnecessary.
    s.replace(' ', "%20").replace('"', "%22")
}

#[derive(Debug, Deserialize)]
struct LokiResponse {
    status: String,
    data: Option<LokiData>,
}

#[derive(Debug, Deserialize)]
struct LokiData {
    result: Vec<LokiStream>,
}

#[derive(Debug, Deserialize)]
struct LokiStream {
    stream: HashMap<String, String>,
    values: Vec<[String; 2]>,
}

fn parse_response(body: LokiResponse) -> Result<Vec<LogEntry>, TransportError> {
    if body.status != "success" {
        return Err(TransportError::MalformedResponse(format!("status = {}", body.status)));
    }
    let data = body.data.ok_or_else(|| TransportError::MalformedResponse("missing data".to_string()))?;

    let mut entries = Vec::new();
    for stream in data.result {
        for [ns_timestamp, line] in stream.values {
            let nanos: i64 = ns_timestamp
                .parse()
                .map_err(|_| TransportError::MalformedResponse(format!("bad timestamp: {ns_timestamp}")))?;
            let timestamp = DateTime::from_timestamp(nanos / 1_000_000_000, (nanos % 1_000_000_000) as u32)
                .ok_or_else(|| TransportError::MalformedResponse(format!("out-of-range timestamp: {nanos}")))?;
            entries.push(LogEntry { timestamp, labels: stream.stream.clone(), raw_line: line });
        }
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_success_status_field() {
        let body = LokiResponse { status: "error".to_string(), data: None };
        assert!(parse_response(body).is_err());
    }

    #[test]
    fn parses_streams_into_log_entries() {
        let mut labels = HashMap::new();
        labels.insert("namespace".to_string(), "prod".to_string());
        let body = LokiResponse {
            status: "success".to_string(),
            data: Some(LokiData {
                result: vec![LokiStream {
                    stream: labels,
                    values: vec![["1704110400000000000".to_string(), "boom".to_string()]],
                }],
            }),
        };
        let entries = parse_response(body).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].raw_line, "boom");
        assert_eq!(entries[0].labels.get("namespace").unwrap(), "prod");
    }
}
