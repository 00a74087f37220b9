//! Fixed pages and static files.

use std::path::{Component, Path, PathBuf};

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::http::error::FrontDoorError;

pub const INDEX_PAGE: &str = "index.html";
pub const MESSAGE_PAGE: &str = "send_message.html";
pub const ERROR_PAGE: &str = "error.html";

/// Guess a MIME type from file extension, falling back to `text/plain`.
pub fn mime_from_ext(path: &str) -> &'static str {
    let ext = match path.rsplit_once('.') {
        Some((_, ext)) if !ext.contains('/') => ext.to_ascii_lowercase(),
        _ => return "text/plain",
    };
    match ext.as_str() {
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" | "mjs" => "text/javascript",
        "json" => "application/json",
        "txt" => "text/plain",
        "xml" => "application/xml",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "ico" => "image/vnd.microsoft.icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "pdf" => "application/pdf",
        _ => "text/plain",
    }
}

/// Files served from one root directory.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
}

impl StaticFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a request path (without the leading slash) to a file under the root.
    ///
    /// Anything that is not a plain relative path of normal components is
    /// refused, so requests never leave the root.
    pub fn resolve(&self, request_path: &str) -> Option<PathBuf> {
        let relative = Path::new(request_path);
        let mut components = relative.components().peekable();
        components.peek()?;
        if !components.all(|c| matches!(c, Component::Normal(_))) {
            return None;
        }
        Some(self.root.join(relative))
    }

    /// A fixed HTML page with the given status.
    pub async fn page(&self, name: &str, status: StatusCode) -> Result<Response, FrontDoorError> {
        let bytes = tokio::fs::read(self.root.join(name)).await.map_err(|e| {
            tracing::error!(page = name, root = %self.root.display(), error = %e, "Failed to read page");
            FrontDoorError::PageUnavailable(name.to_string())
        })?;
        Ok((status, [(header::CONTENT_TYPE, "text/html")], bytes).into_response())
    }

    /// The error page with 404, or a plain 404 when it is missing too.
    pub async fn not_found(&self) -> Response {
        match self.page(ERROR_PAGE, StatusCode::NOT_FOUND).await {
            Ok(response) => response,
            Err(_) => (StatusCode::NOT_FOUND, "Not Found").into_response(),
        }
    }

    /// Any file under the root with a guessed content type.
    pub async fn file(&self, request_path: &str) -> Response {
        let Some(path) = self.resolve(request_path) else {
            return self.not_found().await;
        };

        let is_file = tokio::fs::metadata(&path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            return self.not_found().await;
        }

        match tokio::fs::read(&path).await {
            Ok(bytes) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, mime_from_ext(request_path))],
                bytes,
            )
                .into_response(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read static file");
                self.not_found().await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_guessing() {
        assert_eq!(mime_from_ext("style.css"), "text/css");
        assert_eq!(mime_from_ext("logo.PNG"), "image/png");
        assert_eq!(mime_from_ext("assets/app.js"), "text/javascript");
        assert_eq!(mime_from_ext("README"), "text/plain");
        assert_eq!(mime_from_ext("dir.v2/README"), "text/plain");
        assert_eq!(mime_from_ext("archive.unknownext"), "text/plain");
    }

    #[test]
    fn test_resolve_stays_under_root() {
        let files = StaticFiles::new("/srv/site");
        assert_eq!(
            files.resolve("css/style.css"),
            Some(PathBuf::from("/srv/site/css/style.css"))
        );
        assert_eq!(files.resolve("../secret"), None);
        assert_eq!(files.resolve("css/../../secret"), None);
        assert_eq!(files.resolve("/etc/passwd"), None);
        assert_eq!(files.resolve(""), None);
    }

    #[tokio::test]
    async fn test_missing_error_page_still_404() {
        let dir = tempfile::tempdir().unwrap();
        let files = StaticFiles::new(dir.path());
        let response = files.not_found().await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_missing_page_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let files = StaticFiles::new(dir.path());
        let err = files.page(INDEX_PAGE, StatusCode::OK).await.unwrap_err();
        assert!(matches!(err, FrontDoorError::PageUnavailable(_)));
    }
}
