//! HTTP client for the attendance server
//!
//! [`AttendanceApi`] is the seam the console talks through; [`ApiClient`]
//! is the reqwest implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::StatusCode;
use rollcall_common::api::{
    ErrorResponse, EventRequest, EventResponse, ImportRequest, ImportResponse, MessageResponse,
    TapRequest, TapResponse,
};
use rollcall_common::{ExportKind, TapRecord};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

const USER_AGENT: &str = concat!("rollcall-kiosk/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);
const FALLBACK_EXPORT_NAME: &str = "export.csv";

#[derive(Debug, Error)]
pub enum ClientError {
    /// Server unreachable or the exchange failed mid-flight
    #[error("Server unreachable: {0}")]
    Transport(String),

    /// Server answered with a non-success status
    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("Unexpected server response: {0}")]
    Decode(String),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ClientError::Decode(e.to_string())
        } else {
            ClientError::Transport(e.to_string())
        }
    }
}

/// A downloaded export file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub file_name: String,
    pub content: Vec<u8>,
}

#[async_trait]
pub trait AttendanceApi: Send + Sync {
    async fn tap(&self, student_id: &str) -> Result<TapResponse, ClientError>;

    async fn start_event(&self, name: &str) -> Result<String, ClientError>;

    async fn current_event(&self) -> Result<EventResponse, ClientError>;

    async fn attendance(&self) -> Result<Vec<TapRecord>, ClientError>;

    async fn import_registered(&self, emails: Vec<String>) -> Result<ImportResponse, ClientError>;

    async fn export(&self, kind: ExportKind) -> Result<Download, ClientError>;
}

pub struct ApiClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// `base_url` is the API root, e.g. `http://localhost:10000/api`
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn checked(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(server_error(status, &body))
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        debug!("POST {}", url);
        let response = self.http_client.post(&url).json(body).send().await?;
        Ok(Self::checked(response).await?.json().await?)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = self.url(path);
        debug!("GET {}", url);
        let response = self.http_client.get(&url).send().await?;
        Ok(Self::checked(response).await?.json().await?)
    }
}

/// Map an error response to [`ClientError::Server`], preferring the
/// `{error}` message from the body
pub fn server_error(status: StatusCode, body: &str) -> ClientError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.error)
        .unwrap_or_else(|_| format!("Server returned {}", status));
    ClientError::Server {
        status: status.as_u16(),
        message,
    }
}

/// Extract `filename` from a Content-Disposition header value
pub fn disposition_file_name(header: &str) -> Option<String> {
    header.split(';').map(str::trim).find_map(|part| {
        let value = part.strip_prefix("filename=")?;
        let value = value.trim_matches('"');
        (!value.is_empty()).then(|| value.to_string())
    })
}

fn export_path(kind: ExportKind) -> &'static str {
    match kind {
        ExportKind::Attendance => "export",
        ExportKind::Registered => "export-registered",
    }
}

#[async_trait]
impl AttendanceApi for ApiClient {
    async fn tap(&self, student_id: &str) -> Result<TapResponse, ClientError> {
        let request = TapRequest {
            student_id: Some(student_id.to_string()),
        };
        self.post_json("tap", &request).await
    }

    async fn start_event(&self, name: &str) -> Result<String, ClientError> {
        let request = EventRequest {
            name: Some(name.to_string()),
        };
        let response: MessageResponse = self.post_json("event", &request).await?;
        Ok(response.message)
    }

    async fn current_event(&self) -> Result<EventResponse, ClientError> {
        self.get_json("event").await
    }

    async fn attendance(&self) -> Result<Vec<TapRecord>, ClientError> {
        self.get_json("attendance").await
    }

    async fn import_registered(&self, emails: Vec<String>) -> Result<ImportResponse, ClientError> {
        let request = ImportRequest {
            emails: Some(emails),
            students: None,
        };
        self.post_json("import-registered", &request).await
    }

    async fn export(&self, kind: ExportKind) -> Result<Download, ClientError> {
        let url = self.url(export_path(kind));
        debug!("GET {}", url);
        let response = Self::checked(self.http_client.get(&url).send().await?).await?;

        let file_name = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(disposition_file_name)
            .unwrap_or_else(|| FALLBACK_EXPORT_NAME.to_string());
        let content = response.bytes().await?.to_vec();

        Ok(Download { file_name, content })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disposition_file_name() {
        assert_eq!(
            disposition_file_name("attachment; filename=\"Orientation_attendance.csv\""),
            Some("Orientation_attendance.csv".to_string())
        );
        assert_eq!(
            disposition_file_name("attachment;filename=plain.csv"),
            Some("plain.csv".to_string())
        );
        assert_eq!(disposition_file_name("attachment"), None);
        assert_eq!(disposition_file_name("attachment; filename=\"\""), None);
    }

    #[test]
    fn test_server_error_uses_body_message() {
        let err = server_error(StatusCode::NOT_FOUND, r#"{"error":"Student not found in portal"}"#);
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.to_string(), "Student not found in portal");
    }

    #[test]
    fn test_server_error_without_json_body() {
        let err = server_error(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        assert_eq!(err.status(), Some(502));
        assert!(err.to_string().contains("502"));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ApiClient::new("http://localhost:10000/api/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:10000/api");
        assert_eq!(client.url("tap"), "http://localhost:10000/api/tap");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        let client = ApiClient::new("http://127.0.0.1:1/api").unwrap();
        let err = client.current_event().await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }
}
