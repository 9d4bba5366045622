//! External directory lookup
//!
//! Resolves a scanned card tag or typed student ID to a canonical email via
//! the institutional portal. Stateless: no retries, no caching. The portal
//! may answer 200 with an HTML error page, so payloads are classified by
//! content rather than by status code.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::DirectoryConfig;

const USER_AGENT: &str = "dlsl-student-api/1.0";
const ACCEPT: &str = "application/json, text/plain, */*";
const LOOKUP_ACTION: &str = "registration_tapregister";
/// Upstream bodies are truncated to this many characters in logs
const LOGGED_BODY_LIMIT: usize = 512;

/// Directory lookup failures. "No record" is not one of these.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Directory transport error: {0}")]
    Transport(String),

    #[error("Directory returned status {status}")]
    Status { status: u16, body: String },

    #[error("Directory returned a malformed payload: {0}")]
    Malformed(String),
}

/// Identity as reported by the directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryRecord {
    /// Lower-cased, trimmed
    pub email: String,
    pub name: Option<String>,
    pub photo: Option<String>,
}

/// Resolver seam so handlers can be exercised without a live portal
#[async_trait]
pub trait DirectoryResolver: Send + Sync {
    /// Look up an identifier.
    ///
    /// # Returns
    /// * `Ok(Some(record))` - identity found
    /// * `Ok(None)` - well-formed answer without a usable email
    /// * `Err(_)` - transport failure, timeout, or malformed payload
    async fn resolve(&self, identifier: &str) -> Result<Option<DirectoryRecord>, DirectoryError>;
}

fn truncate(body: &str) -> &str {
    match body.char_indices().nth(LOGGED_BODY_LIMIT) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

/// Only consulted for bodies that failed to parse as JSON
fn looks_like_html(body: &str) -> bool {
    let lower = body.to_ascii_lowercase();
    let head = lower.trim_start();
    head.starts_with('<') && (lower.contains("<!doctype html") || lower.contains("<html"))
}

fn non_empty_string(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Classify a portal response.
pub fn parse_portal_response(
    status: u16,
    body: &str,
) -> Result<Option<DirectoryRecord>, DirectoryError> {
    if status >= 500 {
        return Err(DirectoryError::Status {
            status,
            body: truncate(body).to_string(),
        });
    }

    let data: Value = serde_json::from_str(body).map_err(|e| {
        if looks_like_html(body) {
            DirectoryError::Malformed("received HTML instead of JSON data".to_string())
        } else {
            DirectoryError::Malformed(format!("invalid JSON: {}", e))
        }
    })?;
    let object = data
        .as_object()
        .ok_or_else(|| DirectoryError::Malformed("expected a JSON object".to_string()))?;

    let email = match object.get("email_address") {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(email)) => email.trim().to_lowercase(),
        Some(other) => {
            return Err(DirectoryError::Malformed(format!(
                "email_address is not a string: {}",
                other
            )))
        }
    };

    if email.is_empty() {
        return Ok(None);
    }

    Ok(Some(DirectoryRecord {
        email,
        name: non_empty_string(object.get("name")),
        photo: non_empty_string(object.get("photo")),
    }))
}

/// Portal-backed resolver
pub struct PortalClient {
    http_client: reqwest::Client,
    lookup_url: String,
    reg_key: String,
}

impl PortalClient {
    pub fn new(config: &DirectoryConfig) -> Result<Self, DirectoryError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| DirectoryError::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            lookup_url: config.lookup_url(),
            reg_key: config.reg_key.clone(),
        })
    }

    pub fn lookup_url(&self) -> &str {
        &self.lookup_url
    }
}

#[async_trait]
impl DirectoryResolver for PortalClient {
    async fn resolve(&self, identifier: &str) -> Result<Option<DirectoryRecord>, DirectoryError> {
        debug!(identifier = %identifier, url = %self.lookup_url, "Querying directory");

        let form = [
            ("action", LOOKUP_ACTION),
            ("regkey", self.reg_key.as_str()),
            ("card_tag", identifier),
        ];

        let response = self
            .http_client
            .post(&self.lookup_url)
            .header(reqwest::header::ACCEPT, ACCEPT)
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                error!(identifier = %identifier, error = %e, "Directory request failed");
                DirectoryError::Transport(e.to_string())
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            error!(identifier = %identifier, status, error = %e, "Directory body unreadable");
            DirectoryError::Transport(e.to_string())
        })?;

        let result = parse_portal_response(status, &body);
        match &result {
            Ok(Some(record)) => {
                info!(identifier = %identifier, email = %record.email, "Directory record found")
            }
            Ok(None) => info!(identifier = %identifier, status, "No directory record"),
            Err(e) => error!(
                identifier = %identifier,
                status,
                body = %truncate(&body),
                error = %e,
                "Directory lookup failed"
            ),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_found_record_is_canonicalised() {
        let body = r#"{"email_address":"  Juan_DelaCruz@DLSL.edu.ph ","name":"Juan","photo":""}"#;
        let record = parse_portal_response(200, body).unwrap().unwrap();
        assert_eq!(record.email, "juan_delacruz@dlsl.edu.ph");
        assert_eq!(record.name.as_deref(), Some("Juan"));
        assert_eq!(record.photo, None);
    }

    #[test]
    fn test_missing_or_empty_email_is_not_found() {
        assert_eq!(parse_portal_response(200, "{}").unwrap(), None);
        assert_eq!(parse_portal_response(200, r#"{"email_address":""}"#).unwrap(), None);
        assert_eq!(parse_portal_response(200, r#"{"email_address":"  "}"#).unwrap(), None);
        assert_eq!(parse_portal_response(200, r#"{"email_address":null}"#).unwrap(), None);
        assert_eq!(parse_portal_response(404, r#"{"error":"none"}"#).unwrap(), None);
    }

    #[test]
    fn test_html_with_ok_status_is_upstream_failure() {
        let body = "<!doctype html><html><body>Login</body></html>";
        assert!(matches!(
            parse_portal_response(200, body),
            Err(DirectoryError::Malformed(_))
        ));
        assert!(matches!(
            parse_portal_response(200, "\n  <!DOCTYPE HTML>\n<html></html>"),
            Err(DirectoryError::Malformed(_))
        ));
    }

    #[test]
    fn test_html_text_inside_json_field_is_not_html() {
        let body = r#"{"email_address":"ana_reyes@x.edu","name":"<!DOCTYPE html> Ana"}"#;
        let record = parse_portal_response(200, body).unwrap().unwrap();
        assert_eq!(record.email, "ana_reyes@x.edu");
        assert_eq!(record.name.as_deref(), Some("<!DOCTYPE html> Ana"));
    }

    #[test]
    fn test_html_error_is_reported_as_html() {
        match parse_portal_response(200, "<html><body>Error</body></html>") {
            Err(DirectoryError::Malformed(msg)) => assert!(msg.contains("HTML")),
            other => panic!("expected malformed error, got {:?}", other),
        }
        match parse_portal_response(200, "Service unavailable") {
            Err(DirectoryError::Malformed(msg)) => assert!(msg.contains("invalid JSON")),
            other => panic!("expected malformed error, got {:?}", other),
        }
    }

    #[test]
    fn test_non_json_and_non_object_payloads_are_malformed() {
        assert!(matches!(
            parse_portal_response(200, "Service unavailable"),
            Err(DirectoryError::Malformed(_))
        ));
        assert!(matches!(
            parse_portal_response(200, r#"["a@x.edu"]"#),
            Err(DirectoryError::Malformed(_))
        ));
        assert!(matches!(
            parse_portal_response(200, r#"{"email_address":42}"#),
            Err(DirectoryError::Malformed(_))
        ));
    }

    #[test]
    fn test_server_errors_are_upstream_failures() {
        match parse_portal_response(502, "bad gateway") {
            Err(DirectoryError::Status { status, body }) => {
                assert_eq!(status, 502);
                assert_eq!(body, "bad gateway");
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[test]
    fn test_truncate_limits_logged_body() {
        let long = "x".repeat(LOGGED_BODY_LIMIT * 2);
        assert_eq!(truncate(&long).len(), LOGGED_BODY_LIMIT);
        assert_eq!(truncate("short"), "short");
    }

    #[test]
    fn test_client_creation() {
        let client = PortalClient::new(&DirectoryConfig::default()).unwrap();
        assert_eq!(
            client.lookup_url(),
            "https://portal.dlsl.edu.ph/registration/event/helper.php"
        );
    }

    #[tokio::test]
    async fn test_unreachable_directory_is_transport_error() {
        let config = DirectoryConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            helper_path: "/helper.php".to_string(),
            timeout: std::time::Duration::from_secs(2),
            ..Default::default()
        };
        let client = PortalClient::new(&config).unwrap();
        assert!(matches!(
            client.resolve("04A1").await,
            Err(DirectoryError::Transport(_))
        ));
    }
}
