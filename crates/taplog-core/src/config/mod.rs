//! Client configuration for the Supabase project backing the log.
//!
//! Values come from explicit overrides, then a stored profile, then the
//! environment. The anon key is public by design; secrets never belong here.

use serde::{Deserialize, Serialize};

use crate::util::{is_http_url, normalize_text_option};

pub const ENV_SUPABASE_URL: &str = "TAPLOG_SUPABASE_URL";
pub const ENV_SUPABASE_ANON_KEY: &str = "TAPLOG_SUPABASE_ANON_KEY";
pub const ENV_REDIRECT_URL: &str = "TAPLOG_REDIRECT_URL";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    #[serde(default)]
    pub supabase_url: Option<String>,
    #[serde(default)]
    pub supabase_anon_key: Option<String>,
    /// Where the magic link sends the browser after sign-in.
    #[serde(default)]
    pub email_redirect_to: Option<String>,
}

impl ClientConfig {
    /// Read configuration from `TAPLOG_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (environment-shaped).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            supabase_url: lookup(ENV_SUPABASE_URL),
            supabase_anon_key: lookup(ENV_SUPABASE_ANON_KEY),
            email_redirect_to: lookup(ENV_REDIRECT_URL),
        }
        .normalized()
    }

    /// Fill unset fields from `fallback`.
    #[must_use]
    pub fn or(self, fallback: Self) -> Self {
        let this = self.normalized();
        let fallback = fallback.normalized();
        Self {
            supabase_url: this.supabase_url.or(fallback.supabase_url),
            supabase_anon_key: this.supabase_anon_key.or(fallback.supabase_anon_key),
            email_redirect_to: this.email_redirect_to.or(fallback.email_redirect_to),
        }
    }

    /// Trim values, drop empties, and strip trailing slashes from URLs.
    #[must_use]
    pub fn normalized(self) -> Self {
        let url = |value: Option<String>| {
            normalize_text_option(value).map(|url| url.trim_end_matches('/').to_string())
        };
        Self {
            supabase_url: url(self.supabase_url),
            supabase_anon_key: normalize_text_option(self.supabase_anon_key),
            email_redirect_to: url(self.email_redirect_to),
        }
    }

    /// Returns the project URL and anon key when both are present and valid.
    pub fn supabase(&self) -> Result<Option<(String, String)>, String> {
        match (&self.supabase_url, &self.supabase_anon_key) {
            (None, None) => Ok(None),
            (Some(url), Some(anon_key)) => {
                if !is_http_url(url) {
                    return Err(format!(
                        "supabase_url '{url}' must include http:// or https://"
                    ));
                }
                Ok(Some((url.clone(), anon_key.clone())))
            }
            (Some(_), None) => Err("supabase_anon_key is required".to_string()),
            (None, Some(_)) => Err("supabase_url is required".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn from_lookup_normalizes_values() {
        let config = ClientConfig::from_lookup(|key| match key {
            ENV_SUPABASE_URL => Some(" https://project.supabase.co/ ".to_string()),
            ENV_SUPABASE_ANON_KEY => Some("anon".to_string()),
            ENV_REDIRECT_URL => Some("   ".to_string()),
            _ => None,
        });
        assert_eq!(
            config,
            ClientConfig {
                supabase_url: Some("https://project.supabase.co".to_string()),
                supabase_anon_key: Some("anon".to_string()),
                email_redirect_to: None,
            }
        );
    }

    #[test]
    fn explicit_values_win_over_fallback() {
        let explicit = ClientConfig {
            supabase_url: Some("https://explicit.supabase.co".to_string()),
            ..Default::default()
        };
        let fallback = ClientConfig {
            supabase_url: Some("https://fallback.supabase.co".to_string()),
            supabase_anon_key: Some("fallback-key".to_string()),
            email_redirect_to: None,
        };

        let merged = explicit.or(fallback);
        assert_eq!(
            merged.supabase().unwrap(),
            Some((
                "https://explicit.supabase.co".to_string(),
                "fallback-key".to_string()
            ))
        );
    }

    #[test]
    fn supabase_requires_both_values() {
        let missing_key = ClientConfig {
            supabase_url: Some("https://project.supabase.co".to_string()),
            ..Default::default()
        };
        assert!(missing_key.supabase().is_err());
        assert_eq!(ClientConfig::default().supabase().unwrap(), None);
    }

    #[test]
    fn supabase_rejects_url_without_scheme() {
        let config = ClientConfig {
            supabase_url: Some("project.supabase.co".to_string()),
            supabase_anon_key: Some("anon".to_string()),
            email_redirect_to: None,
        };
        let error = config.supabase().unwrap_err();
        assert!(error.contains("http://"));
    }
}
