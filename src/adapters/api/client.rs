use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::ports::{RepositoryError, RepositoryResult};

/// Bearer token shared between the session layer and every request.
pub type SharedToken = Arc<RwLock<Option<String>>>;

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: SharedToken,
}

impl ApiClient {
    pub fn new(base_url: &str, token: SharedToken) -> RepositoryResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("creator-desk/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RepositoryError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn set_token(&self, token: Option<String>) {
        match self.token.write() {
            Ok(mut guard) => *guard = token,
            Err(poisoned) => *poisoned.into_inner() = token,
        }
    }

    fn current_token(&self) -> Option<String> {
        match self.token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.current_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> RepositoryResult<T> {
        let url = build_url(&self.base_url, path, query);
        tracing::debug!(%url, "GET");

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|e| RepositoryError::Network(e.to_string()))?;

        self.handle_response(response).await
    }

    pub async fn post<T: DeserializeOwned, R: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &R,
    ) -> RepositoryResult<T> {
        let url = build_url(&self.base_url, path, &[]);
        tracing::debug!(%url, "POST");

        let response = self
            .authorize(self.client.post(&url))
            .json(body)
            .send()
            .await
            .map_err(|e| RepositoryError::Network(e.to_string()))?;

        self.handle_response(response).await
    }

    pub async fn put<T: DeserializeOwned, R: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &R,
    ) -> RepositoryResult<T> {
        let url = build_url(&self.base_url, path, &[]);
        tracing::debug!(%url, "PUT");

        let response = self
            .authorize(self.client.put(&url))
            .json(body)
            .send()
            .await
            .map_err(|e| RepositoryError::Network(e.to_string()))?;

        self.handle_response(response).await
    }

    /// Sends each file as a part of the multipart field `field`.
    pub async fn post_files<T: DeserializeOwned>(
        &self,
        path: &str,
        field: &'static str,
        files: &[PathBuf],
    ) -> RepositoryResult<T> {
        let mut form = Form::new();
        for file in files {
            let bytes = tokio::fs::read(file).await.map_err(|e| RepositoryError::Io {
                path: file.display().to_string(),
                message: e.to_string(),
            })?;
            let file_name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "upload".to_string());
            let part = Part::bytes(bytes)
                .file_name(file_name)
                .mime_str(guess_mime(file))
                .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
            form = form.part(field, part);
        }

        let url = build_url(&self.base_url, path, &[]);
        tracing::debug!(%url, files = files.len(), "POST multipart");

        let response = self
            .authorize(self.client.post(&url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| RepositoryError::Network(e.to_string()))?;

        self.handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> RepositoryResult<T> {
        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| RepositoryError::Network(e.to_string()))?;

        tracing::debug!(status = status.as_u16(), "API Response: {}", response_text);

        match status.as_u16() {
            200..=299 => {
                let body = if response_text.trim().is_empty() {
                    "null"
                } else {
                    response_text.as_str()
                };
                serde_json::from_str(body).map_err(|e| {
                    RepositoryError::Serialization(format!(
                        "Failed to parse response: {e}. Response was: {response_text}"
                    ))
                })
            }
            401 | 403 => Err(RepositoryError::Authentication(
                extract_message(&response_text)
                    .unwrap_or_else(|| "Session expired, please sign in again".to_string()),
            )),
            404 => Err(RepositoryError::NotFound(
                extract_message(&response_text).unwrap_or_else(|| "Resource not found".to_string()),
            )),
            code => Err(RepositoryError::Api {
                status: code,
                message: extract_message(&response_text).unwrap_or_else(|| {
                    let text = response_text.trim();
                    if text.is_empty() {
                        status.to_string()
                    } else {
                        text.to_string()
                    }
                }),
            }),
        }
    }
}

/// The `message` (or `error`) field of a JSON error body.
pub fn extract_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .filter_map(|key| value.get(key).and_then(|v| v.as_str()))
        .map(str::trim)
        .find(|m| !m.is_empty())
        .map(str::to_string)
}

pub fn build_url(base_url: &str, path: &str, query: &[(&str, &str)]) -> String {
    let mut url = format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'));
    if !query.is_empty() {
        let params: Vec<String> = query
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect();
        url.push('?');
        url.push_str(&params.join("&"));
    }
    url
}

fn guess_mime(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("mp4") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url_joins_and_encodes() {
        assert_eq!(
            build_url("http://localhost:8080/", "/project/draft/42", &[("userId", "a b&c")]),
            "http://localhost:8080/project/draft/42?userId=a%20b%26c"
        );
        assert_eq!(
            build_url("http://api", "user/signin", &[]),
            "http://api/user/signin"
        );
    }

    #[test]
    fn test_extract_message() {
        assert_eq!(
            extract_message(r#"{"message":"Invalid credentials"}"#).as_deref(),
            Some("Invalid credentials")
        );
        assert_eq!(
            extract_message(r#"{"error":"Missing field"}"#).as_deref(),
            Some("Missing field")
        );
        assert_eq!(extract_message(r#"{"message":""}"#), None);
        assert_eq!(extract_message("<html>Bad gateway</html>"), None);
    }

    #[test]
    fn test_mime_guess() {
        assert_eq!(guess_mime(Path::new("a/b/Cover.JPG")), "image/jpeg");
        assert_eq!(guess_mime(Path::new("clip.mov")), "video/quicktime");
        assert_eq!(guess_mime(Path::new("notes")), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_upload_of_missing_file_names_it() {
        let client = ApiClient::new("http://127.0.0.1:9", Arc::new(RwLock::new(None))).unwrap();
        let missing = std::env::temp_dir().join("creator-desk-missing-cover.jpg");

        let err = client
            .post_files::<serde_json::Value>("/project/upload_pictures", "images", &[missing.clone()])
            .await
            .unwrap_err();

        match &err {
            RepositoryError::Io { path, .. } => assert_eq!(path, &missing.display().to_string()),
            other => panic!("expected Io error, got {other:?}"),
        }
        assert!(err.user_message().contains("creator-desk-missing-cover.jpg"));
    }

    #[test]
    fn test_token_is_shared() {
        let token: SharedToken = Arc::new(RwLock::new(None));
        let client = ApiClient::new("http://localhost", token.clone()).unwrap();
        client.set_token(Some("abc".to_string()));
        assert_eq!(token.read().unwrap().as_deref(), Some("abc"));
        assert_eq!(client.current_token().as_deref(), Some("abc"));
    }
}
