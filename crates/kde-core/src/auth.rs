use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::AuthError;

/// Name of the query parameter carrying the credential
pub const COOKIE_PARAM: &str = "cookie";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthState {
    pub is_authenticated: bool,
    pub auth_cookie: Option<String>,
}

/// Credential extracted from a URL query string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KdeAuth {
    auth_cookie: String,
}

impl KdeAuth {
    /// Fails unless `url` carries a non-empty `cookie` parameter.
    ///
    /// Accepts a full URL or a bare query string, with or without the leading `?`.
    pub fn new(url: &str) -> Result<Self, AuthError> {
        let cookie = query_pairs(url)
            .find(|(key, _)| *key == COOKIE_PARAM)
            .map(|(_, value)| value)
            .filter(|value| !value.is_empty())
            .ok_or(AuthError::MissingCookie)?;

        Ok(Self {
            auth_cookie: cookie.to_string(),
        })
    }

    pub fn auth_cookie(&self) -> &str {
        &self.auth_cookie
    }

    /// Snapshot against the host's current cookie string
    pub fn state(&self, ambient_cookie: &str) -> AuthState {
        AuthState {
            is_authenticated: is_authenticated(ambient_cookie),
            auth_cookie: Some(self.auth_cookie.clone()),
        }
    }
}

/// True when the host cookie string mentions `auth` anywhere
pub fn is_authenticated(ambient_cookie: &str) -> bool {
    ambient_cookie.contains("auth")
}

/// All query parameters of `url`; a repeated key keeps its last value
pub fn parse_url_params(url: &str) -> HashMap<String, String> {
    query_pairs(url)
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

pub fn validate_url_params(params: &HashMap<String, String>) -> bool {
    match params.get(COOKIE_PARAM) {
        Some(value) if !value.is_empty() => true,
        _ => {
            error!("Missing required parameter: {}", COOKIE_PARAM);
            false
        }
    }
}

/// Raw `key=value` pairs, values left exactly as written
fn query_pairs(url: &str) -> impl Iterator<Item = (&str, &str)> {
    let query = match url.split_once('?') {
        Some((_, query)) => query,
        None => url,
    };
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_cookie() {
        assert_eq!(
            KdeAuth::new("http://example.com").unwrap_err(),
            AuthError::MissingCookie
        );
        assert_eq!(
            KdeAuth::new("http://example.com").unwrap_err().to_string(),
            "Authentication cookie is missing."
        );
    }

    #[test]
    fn test_malformed_url_without_value() {
        assert!(KdeAuth::new("http://example.com?invalidParam").is_err());
        assert!(KdeAuth::new("?cookie").is_err());
        assert!(KdeAuth::new("?cookie=").is_err());
        assert!(KdeAuth::new("").is_err());
    }

    #[test]
    fn test_cookie_from_query() {
        let auth = KdeAuth::new("?cookie=abc123").unwrap();
        assert_eq!(auth.auth_cookie(), "abc123");

        let auth = KdeAuth::new("cookie=bare").unwrap();
        assert_eq!(auth.auth_cookie(), "bare");

        let auth = KdeAuth::new("https://host.test/app?lang=en&cookie=s3cr%3Dt&x=1").unwrap();
        assert_eq!(auth.auth_cookie(), "s3cr%3Dt");
    }

    #[test]
    fn test_cookie_value_kept_verbatim() {
        let auth = KdeAuth::new("?cookie=a=b+c").unwrap();
        assert_eq!(auth.auth_cookie(), "a=b+c");
    }

    #[test]
    fn test_first_cookie_wins() {
        let auth = KdeAuth::new("?cookie=first&cookie=second").unwrap();
        assert_eq!(auth.auth_cookie(), "first");
    }

    #[test]
    fn test_is_authenticated() {
        assert!(!is_authenticated(""));
        assert!(!is_authenticated("session=1"));
        assert!(is_authenticated("auth=abc123"));
        assert!(is_authenticated("theme=dark; oauth_state=x"));
    }

    #[test]
    fn test_state() {
        let auth = KdeAuth::new("?cookie=tok").unwrap();
        assert_eq!(
            auth.state("auth=1"),
            AuthState {
                is_authenticated: true,
                auth_cookie: Some("tok".to_string()),
            }
        );
        let value = serde_json::to_value(auth.state("")).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"isAuthenticated": false, "authCookie": "tok"})
        );
    }

    #[test]
    fn test_parse_url_params() {
        let params = parse_url_params("http://h.test/?a=1&b=&c&a=2");
        assert_eq!(params.get("a").map(String::as_str), Some("2"));
        assert_eq!(params.get("b").map(String::as_str), Some(""));
        assert_eq!(params.get("c").map(String::as_str), Some(""));
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn test_validate_url_params() {
        assert!(validate_url_params(&parse_url_params("?cookie=x")));
        assert!(!validate_url_params(&parse_url_params("?cookie=")));
        assert!(!validate_url_params(&parse_url_params("?other=x")));
    }
}
