//! Upstream request header construction.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, REFERER, USER_AGENT};

use crate::config::UpstreamConfig;
use crate::media::token::extract_headers;

/// Headers sent upstream when no token says otherwise.
#[derive(Debug, Clone)]
pub struct HeaderDefaults {
    pub user_agent: String,
    pub accept: String,
    pub referer: String,
}

impl Default for HeaderDefaults {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0".to_string(),
            accept: "*/*".to_string(),
            referer: "https://www.facebook.com/".to_string(),
        }
    }
}

impl From<&UpstreamConfig> for HeaderDefaults {
    fn from(config: &UpstreamConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            referer: config.referer.clone(),
            ..Self::default()
        }
    }
}

impl HeaderDefaults {
    fn to_header_map(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in [
            (USER_AGENT, &self.user_agent),
            (ACCEPT, &self.accept),
            (REFERER, &self.referer),
        ] {
            match HeaderValue::from_str(value) {
                Ok(v) => {
                    headers.insert(name, v);
                }
                Err(_) => tracing::warn!(header = %name, "Skipping invalid default header value"),
            }
        }
        headers
    }
}

/// Build the headers for an upstream media fetch.
///
/// Priority, lowest first: defaults, token headers of `raw_url`, token
/// headers of `resolved_url`. Names compare case-insensitively.
pub fn build_headers(defaults: &HeaderDefaults, raw_url: &str, resolved_url: &str) -> HeaderMap {
    let mut headers = defaults.to_header_map();

    for url in [raw_url, resolved_url] {
        for (name, value) in extract_headers(url) {
            let parsed = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(&value),
            );
            match parsed {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => tracing::debug!(header = %name, "Skipping invalid token header"),
            }
        }
    }

    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine as _;

    fn tokenized(payload: &str) -> String {
        format!(
            "https://cdn.example.com/clip.mp4?token=h.{}.s",
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    #[test]
    fn test_defaults_without_token() {
        let url = "https://cdn.example.com/clip.mp4";
        let headers = build_headers(&HeaderDefaults::default(), url, url);
        assert_eq!(headers[USER_AGENT], "Mozilla/5.0");
        assert_eq!(headers[ACCEPT], "*/*");
        assert_eq!(headers[REFERER], "https://www.facebook.com/");
        assert_eq!(headers.len(), 3);
    }

    #[test]
    fn test_token_overrides_defaults() {
        let raw = tokenized(r#"{"headers":{"user-agent":"Agent/2","Cookie":"c=1"}}"#);
        let headers = build_headers(&HeaderDefaults::default(), &raw, &raw);
        assert_eq!(headers[USER_AGENT], "Agent/2");
        assert_eq!(headers["cookie"], "c=1");
        assert_eq!(headers[ACCEPT], "*/*");
        assert_eq!(headers.get_all(USER_AGENT).iter().count(), 1);
    }

    #[test]
    fn test_resolved_overrides_raw() {
        let raw = tokenized(r#"{"headers":{"Cookie":"raw","X-Raw":"1"}}"#);
        let resolved = tokenized(r#"{"headers":{"cookie":"resolved"}}"#);
        let headers = build_headers(&HeaderDefaults::default(), &raw, &resolved);
        assert_eq!(headers["cookie"], "resolved");
        assert_eq!(headers["x-raw"], "1");
    }

    #[test]
    fn test_invalid_token_header_skipped() {
        let raw = tokenized(r#"{"headers":{"Bad Name":"x","X-Bad":"a\nb","X-Ok":"y"}}"#);
        let headers = build_headers(&HeaderDefaults::default(), &raw, &raw);
        assert_eq!(headers["x-ok"], "y");
        assert!(headers.get("x-bad").is_none());
        assert_eq!(headers.len(), 4);
    }
}
