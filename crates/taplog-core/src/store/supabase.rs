//! PostgREST client for the Supabase `logs` table.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;

use super::{RemoteStore, StoreError, StoreResult};
use crate::auth::AuthSession;
use crate::models::{EntryId, LogEntry};
use crate::util::{compact_text, is_http_url};

pub const LOGS_TABLE: &str = "logs";

#[derive(Clone)]
pub struct SupabaseLogStore {
    table_url: String,
    anon_key: String,
    client: Client,
}

impl SupabaseLogStore {
    pub fn new(url: impl AsRef<str>, anon_key: impl Into<String>) -> StoreResult<Self> {
        let rest_url = normalize_rest_url(url.as_ref())?;
        let anon_key = anon_key.into().trim().to_string();
        if anon_key.is_empty() {
            return Err(StoreError::InvalidConfiguration(
                "Supabase anon key must not be empty",
            ));
        }

        Ok(Self {
            table_url: format!("{rest_url}/{LOGS_TABLE}"),
            anon_key,
            client: Client::builder().build()?,
        })
    }

    fn authorized(&self, request: RequestBuilder, session: &AuthSession) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
    }

    async fn send(request: RequestBuilder) -> StoreResult<reqwest::Response> {
        let response = request.send().await?;
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = parse_api_error(status, &body);
        if status == StatusCode::CONFLICT {
            Err(StoreError::Conflict(message))
        } else {
            Err(StoreError::Api(message))
        }
    }
}

#[async_trait]
impl RemoteStore for SupabaseLogStore {
    async fn select_all(&self, session: &AuthSession) -> StoreResult<Vec<LogEntry>> {
        let owner_filter = format!("eq.{}", session.user_id());
        let request = self.authorized(
            self.client
                .get(&self.table_url)
                .query(&[
                    ("select", "*"),
                    ("user_id", owner_filter.as_str()),
                    ("order", "ts.desc"),
                ])
                .header("Accept", "application/json"),
            session,
        );
        let response = Self::send(request).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn insert(&self, session: &AuthSession, entry: &LogEntry) -> StoreResult<()> {
        let request = self.authorized(
            self.client
                .post(&self.table_url)
                .header("Prefer", "return=minimal")
                .json(entry),
            session,
        );
        Self::send(request).await?;
        Ok(())
    }

    async fn upsert(&self, session: &AuthSession, entry: &LogEntry) -> StoreResult<()> {
        let request = self.authorized(
            self.client
                .post(&self.table_url)
                .query(&[("on_conflict", "id")])
                .header("Prefer", "resolution=merge-duplicates,return=minimal")
                .json(entry),
            session,
        );
        Self::send(request).await?;
        Ok(())
    }

    async fn delete(&self, session: &AuthSession, id: &EntryId) -> StoreResult<()> {
        let id_filter = format!("eq.{id}");
        let request = self.authorized(
            self.client
                .delete(&self.table_url)
                .query(&[("id", id_filter.as_str())]),
            session,
        );
        Self::send(request).await?;
        Ok(())
    }
}

/// Normalize a Supabase project URL into its PostgREST base (`.../rest/v1`).
pub fn normalize_rest_url(url: &str) -> StoreResult<String> {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(StoreError::InvalidConfiguration(
            "Supabase URL must not be empty",
        ));
    }
    if !is_http_url(trimmed) {
        return Err(StoreError::InvalidConfiguration(
            "Supabase URL must include http:// or https://",
        ));
    }
    if trimmed.ends_with("/rest/v1") {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("{trimmed}/rest/v1"))
    }
}

#[derive(Debug, Deserialize)]
struct PostgrestErrorResponse {
    message: Option<String>,
    details: Option<String>,
    hint: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<PostgrestErrorResponse>(body) {
        if let Some(message) = payload.message {
            let detail = payload.details.or(payload.hint);
            return match detail {
                Some(detail) if !detail.trim().is_empty() => {
                    format!("{} - {} ({})", message.trim(), detail.trim(), status.as_u16())
                }
                _ => format!("{} ({})", message.trim(), status.as_u16()),
            };
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_rest_url_appends_rest_path() {
        assert_eq!(
            normalize_rest_url("https://demo.supabase.co/").unwrap(),
            "https://demo.supabase.co/rest/v1"
        );
        assert_eq!(
            normalize_rest_url("https://demo.supabase.co/rest/v1").unwrap(),
            "https://demo.supabase.co/rest/v1"
        );
    }

    #[test]
    fn normalize_rest_url_rejects_missing_scheme() {
        assert!(normalize_rest_url("demo.supabase.co").is_err());
        assert!(normalize_rest_url("  ").is_err());
    }

    #[test]
    fn store_targets_logs_table() {
        let store = SupabaseLogStore::new("https://demo.supabase.co", "anon").unwrap();
        assert_eq!(store.table_url, "https://demo.supabase.co/rest/v1/logs");
    }

    #[test]
    fn empty_anon_key_is_rejected() {
        assert!(matches!(
            SupabaseLogStore::new("https://demo.supabase.co", " "),
            Err(StoreError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn parse_api_error_prefers_postgrest_message() {
        let body = r#"{"code":"23505","message":"duplicate key value violates unique constraint","details":"Key (id) already exists."}"#;
        assert_eq!(
            parse_api_error(StatusCode::CONFLICT, body),
            "duplicate key value violates unique constraint - Key (id) already exists. (409)"
        );
        assert_eq!(parse_api_error(StatusCode::BAD_GATEWAY, ""), "HTTP 502");
    }
}
