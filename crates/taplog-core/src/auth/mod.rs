//! Supabase passwordless (magic link / email code) auth client.

use std::fmt;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::util::{is_http_url, normalize_text_option, unix_timestamp_now};

const EXPIRY_SKEW_SECONDS: i64 = 60;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
    pub user: AuthUser,
}

impl AuthSession {
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at <= unix_timestamp_now() + EXPIRY_SKEW_SECONDS
    }

    /// Owner id stamped onto entries created under this session.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user.id
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AuthSession")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid auth configuration: {0}")]
    InvalidConfiguration(&'static str),
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),
    #[error("Invalid magic link: {0}")]
    InvalidRedirect(String),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Failed to parse JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Auth API error: {0}")]
    Api(String),
    #[error("Secure storage error: {0}")]
    SecureStorage(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

pub trait SessionPersistence: Clone + Send + Sync + 'static {
    fn load_session(&self) -> AuthResult<Option<AuthSession>>;
    fn save_session(&self, session: &AuthSession) -> AuthResult<()>;
    fn clear_session(&self) -> AuthResult<()>;
}

/// The identity operations the session gate depends on.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Rehydrate the persisted session, if any.
    async fn current_session(&self) -> AuthResult<Option<AuthSession>>;

    /// Start the passwordless flow by emailing a magic link / one-time code.
    async fn send_magic_link(&self, email: &str) -> AuthResult<()>;

    /// Complete the passwordless flow with the emailed one-time code.
    async fn verify_email_code(&self, email: &str, code: &str) -> AuthResult<AuthSession>;

    /// Complete the passwordless flow with the URL the magic link redirected to.
    async fn session_from_redirect(&self, redirect_url: &str) -> AuthResult<AuthSession>;

    async fn sign_out(&self, session: &AuthSession) -> AuthResult<()>;
}

#[derive(Clone)]
pub struct SupabaseAuthClient<S: SessionPersistence> {
    auth_url: String,
    anon_key: String,
    email_redirect_to: Option<String>,
    client: Client,
    store: S,
}

impl<S: SessionPersistence> SupabaseAuthClient<S> {
    pub fn new(url: impl AsRef<str>, anon_key: impl Into<String>, store: S) -> AuthResult<Self> {
        let auth_url = normalize_auth_url(url.as_ref())?;
        let anon_key = anon_key.into().trim().to_string();
        if anon_key.is_empty() {
            return Err(AuthError::InvalidConfiguration(
                "Supabase anon key must not be empty",
            ));
        }

        Ok(Self {
            auth_url,
            anon_key,
            email_redirect_to: None,
            client: Client::builder().build()?,
            store,
        })
    }

    /// Where the emailed magic link should send the browser.
    #[must_use]
    pub fn with_email_redirect(mut self, redirect_to: Option<String>) -> Self {
        self.email_redirect_to = normalize_text_option(redirect_to);
        self
    }

    pub async fn restore_session(&self) -> AuthResult<Option<AuthSession>> {
        let Some(stored_session) = self.store.load_session()? else {
            return Ok(None);
        };

        if !stored_session.is_expired() {
            return Ok(Some(stored_session));
        }

        match self.refresh_session(&stored_session.refresh_token).await {
            Ok(refreshed) => Ok(Some(refreshed)),
            Err(error) => {
                tracing::warn!("Failed to refresh persisted session: {}", error);
                self.store.clear_session()?;
                Ok(None)
            }
        }
    }

    pub async fn request_magic_link(&self, email: &str) -> AuthResult<()> {
        let email = validate_email(email)?;

        let payload = serde_json::json!({
            "email": email,
            "create_user": true,
        });
        let mut request = self
            .client
            .post(format!("{}/otp", self.auth_url))
            .json(&payload);
        if let Some(redirect_to) = &self.email_redirect_to {
            request = request.query(&[("redirect_to", redirect_to)]);
        }

        checked(self.public_request(request).send().await?).await?;
        Ok(())
    }

    pub async fn verify_code(&self, email: &str, code: &str) -> AuthResult<AuthSession> {
        let email = validate_email(email)?;
        let code = code.trim();
        if code.is_empty() {
            return Err(AuthError::Api("Verification code is required".to_string()));
        }

        let payload = serde_json::json!({
            "type": "email",
            "email": email,
            "token": code,
        });
        let request = self.public_request(
            self.client
                .post(format!("{}/verify", self.auth_url))
                .json(&payload),
        );
        let session = Self::send_for_session(request, "Verify").await?;

        self.store.save_session(&session)?;
        Ok(session)
    }

    pub async fn complete_redirect(&self, redirect_url: &str) -> AuthResult<AuthSession> {
        let tokens = parse_redirect_tokens(redirect_url)?;

        let request = self
            .client
            .get(format!("{}/user", self.auth_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(&tokens.access_token);
        let user: SupabaseUser = checked(request.send().await?).await?.json().await?;

        let session = AuthSession {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_at: tokens.expires_at,
            user: user.into(),
        };
        self.store.save_session(&session)?;
        Ok(session)
    }

    pub async fn refresh_session(&self, refresh_token: &str) -> AuthResult<AuthSession> {
        if refresh_token.trim().is_empty() {
            return Err(AuthError::InvalidConfiguration(
                "Refresh token must not be empty",
            ));
        }

        let payload = serde_json::json!({
            "refresh_token": refresh_token,
        });
        let request = self.public_request(
            self.client
                .post(format!("{}/token", self.auth_url))
                .query(&[("grant_type", "refresh_token")])
                .json(&payload),
        );
        let session = Self::send_for_session(request, "Refresh").await?;

        self.store.save_session(&session)?;
        Ok(session)
    }

    pub async fn revoke(&self, access_token: &str) -> AuthResult<()> {
        let response = self
            .client
            .post(format!("{}/logout", self.auth_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;
        // An already-invalid token counts as signed out.
        if response.status() != StatusCode::UNAUTHORIZED {
            checked(response).await?;
        }

        self.store.clear_session()?;
        Ok(())
    }

    fn public_request(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", self.anon_key))
    }

    async fn send_for_session(request: RequestBuilder, operation: &str) -> AuthResult<AuthSession> {
        let response = checked(request.send().await?).await?;
        response
            .json::<SupabaseAuthResponse>()
            .await?
            .into_session()?
            .ok_or_else(|| {
                AuthError::Api(format!(
                    "{operation} response did not include an active session"
                ))
            })
    }
}

async fn checked(response: Response) -> AuthResult<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(AuthError::Api(parse_api_error(status, &body)))
}

#[async_trait]
impl<S: SessionPersistence> IdentityProvider for SupabaseAuthClient<S> {
    async fn current_session(&self) -> AuthResult<Option<AuthSession>> {
        self.restore_session().await
    }

    async fn send_magic_link(&self, email: &str) -> AuthResult<()> {
        self.request_magic_link(email).await
    }

    async fn verify_email_code(&self, email: &str, code: &str) -> AuthResult<AuthSession> {
        self.verify_code(email, code).await
    }

    async fn session_from_redirect(&self, redirect_url: &str) -> AuthResult<AuthSession> {
        self.complete_redirect(redirect_url).await
    }

    async fn sign_out(&self, session: &AuthSession) -> AuthResult<()> {
        self.revoke(&session.access_token).await
    }
}

pub fn normalize_auth_url(url: &str) -> AuthResult<String> {
    let base = url.trim().trim_end_matches('/');
    if base.is_empty() {
        return Err(AuthError::InvalidConfiguration("Supabase URL is empty"));
    }
    if !is_http_url(base) {
        return Err(AuthError::InvalidConfiguration(
            "Supabase URL needs an http(s) scheme",
        ));
    }
    if base.ends_with("/auth/v1") {
        return Ok(base.to_string());
    }
    Ok(format!("{base}/auth/v1"))
}

/// Trim and sanity-check an email address before any request is made.
pub fn validate_email(email: &str) -> AuthResult<String> {
    let email = email.trim();
    if email.is_empty() {
        return Err(AuthError::InvalidEmail("email is required".to_string()));
    }
    if EMAIL_PATTERN.is_match(email) {
        Ok(email.to_string())
    } else {
        Err(AuthError::InvalidEmail(email.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RedirectTokens {
    access_token: String,
    refresh_token: String,
    expires_at: i64,
}

/// Extract session tokens from the `#access_token=...` fragment of a magic link redirect.
fn parse_redirect_tokens(redirect_url: &str) -> AuthResult<RedirectTokens> {
    let url = Url::parse(redirect_url.trim())
        .map_err(|error| AuthError::InvalidRedirect(error.to_string()))?;
    let fragment = url
        .fragment()
        .ok_or_else(|| AuthError::InvalidRedirect("URL has no #fragment".to_string()))?;

    let mut access_token = None;
    let mut refresh_token = None;
    let mut expires_at = None;
    let mut expires_in = None;
    let mut error_description = None;
    for (key, value) in url::form_urlencoded::parse(fragment.as_bytes()) {
        match key.as_ref() {
            "access_token" => access_token = normalize_text_option(Some(value.into_owned())),
            "refresh_token" => refresh_token = normalize_text_option(Some(value.into_owned())),
            "expires_at" => expires_at = value.parse::<i64>().ok(),
            "expires_in" => expires_in = value.parse::<i64>().ok(),
            "error_description" => error_description = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(description) = error_description {
        return Err(AuthError::Api(description));
    }

    let expires_at = expires_at
        .or_else(|| expires_in.map(|expires_in| unix_timestamp_now().saturating_add(expires_in)));
    match (access_token, refresh_token, expires_at) {
        (Some(access_token), Some(refresh_token), Some(expires_at)) => Ok(RedirectTokens {
            access_token,
            refresh_token,
            expires_at,
        }),
        _ => Err(AuthError::InvalidRedirect(
            "URL fragment is missing session tokens".to_string(),
        )),
    }
}

#[derive(Debug, Deserialize)]
struct SupabaseAuthResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_at: Option<i64>,
    expires_in: Option<i64>,
    user: Option<SupabaseUser>,
}

impl SupabaseAuthResponse {
    fn into_session(self) -> AuthResult<Option<AuthSession>> {
        let expires_at = self.expires_at.or_else(|| {
            self.expires_in
                .map(|expires_in| unix_timestamp_now().saturating_add(expires_in))
        });
        let user = self.user.map(Into::into);

        match (self.access_token, self.refresh_token, expires_at, user) {
            (Some(access_token), Some(refresh_token), Some(expires_at), Some(user)) => {
                Ok(Some(AuthSession {
                    access_token,
                    refresh_token,
                    expires_at,
                    user,
                }))
            }
            (None, None, None, _) => Ok(None),
            _ => Err(AuthError::Api(
                "Auth response did not include enough session fields".to_string(),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SupabaseUser {
    id: String,
    email: Option<String>,
}

impl From<SupabaseUser> for AuthUser {
    fn from(value: SupabaseUser) -> Self {
        Self {
            id: value.id,
            email: value.email,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SupabaseErrorResponse {
    error: Option<String>,
    error_description: Option<String>,
    message: Option<String>,
    msg: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<SupabaseErrorResponse>(body) {
        if let Some(message) = payload
            .message
            .or(payload.msg)
            .or(payload.error_description)
            .or(payload.error)
        {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = body.trim();
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
    fn normalize_auth_url_appends_auth_path() {
        let normalized = normalize_auth_url("https://demo.supabase.co").unwrap();
        assert_eq!(normalized, "https://demo.supabase.co/auth/v1");
    }

    #[test]
    fn normalize_auth_url_keeps_existing_auth_path() {
        let normalized = normalize_auth_url("https://demo.supabase.co/auth/v1/").unwrap();
        assert_eq!(normalized, "https://demo.supabase.co/auth/v1");
    }

    #[test]
    fn validate_email_rejects_malformed_addresses() {
        assert_eq!(
            validate_email("  me@example.com ").unwrap(),
            "me@example.com"
        );
        assert!(matches!(validate_email(""), Err(AuthError::InvalidEmail(_))));
        assert!(matches!(
            validate_email("not-an-email"),
            Err(AuthError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate_email("a b@example.com"),
            Err(AuthError::InvalidEmail(_))
        ));
    }

    #[test]
    fn verify_response_without_tokens_means_no_session() {
        let response = SupabaseAuthResponse {
            access_token: None,
            refresh_token: None,
            expires_at: None,
            expires_in: None,
            user: Some(SupabaseUser {
                id: "user".to_string(),
                email: Some("user@example.com".to_string()),
            }),
        };
        assert!(response.into_session().unwrap().is_none());
    }

    #[test]
    fn redirect_fragment_yields_tokens() {
        let tokens = parse_redirect_tokens(
            "http://localhost:5173/#access_token=abc&expires_at=1700000000&refresh_token=def&token_type=bearer&type=magiclink",
        )
        .unwrap();
        assert_eq!(tokens.access_token, "abc");
        assert_eq!(tokens.refresh_token, "def");
        assert_eq!(tokens.expires_at, 1_700_000_000);
    }

    #[test]
    fn redirect_error_description_is_surfaced() {
        let error = parse_redirect_tokens(
            "http://localhost/#error=access_denied&error_description=Email+link+is+invalid+or+has+expired",
        )
        .unwrap_err();
        assert!(matches!(error, AuthError::Api(message) if message.contains("expired")));
    }

    #[test]
    fn redirect_without_fragment_is_rejected() {
        assert!(matches!(
            parse_redirect_tokens("http://localhost/?code=1"),
            Err(AuthError::InvalidRedirect(_))
        ));
    }

    #[test]
    fn session_debug_redacts_tokens() {
        let session = AuthSession {
            access_token: "secret-access-token".to_string(),
            refresh_token: "secret-refresh-token".to_string(),
            expires_at: 1_700_000_000,
            user: AuthUser {
                id: "user".to_string(),
                email: None,
            },
        };
        let rendered = format!("{session:?}");
        assert!(!rendered.contains("secret-access-token"));
        assert!(!rendered.contains("secret-refresh-token"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
