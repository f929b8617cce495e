use super::{Middleware, Next};
use crate::http::{HttpResponse, Request, Response};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Serves files below a public directory for GET and HEAD requests
///
/// A directory is answered with its `index.html`. When nothing on disk
/// matches, the request continues down the chain untouched.
pub struct Static {
    root: PathBuf,
}

impl Static {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn lookup(&self, path: &str) -> Option<PathBuf> {
        let mut file = self.root.join(path.trim_start_matches('/'));
        let metadata = tokio::fs::metadata(&file).await.ok()?;
        if metadata.is_dir() {
            file.push("index.html");
            let metadata = tokio::fs::metadata(&file).await.ok()?;
            if !metadata.is_file() {
                return None;
            }
        }
        Some(file)
    }
}

#[async_trait]
impl Middleware for Static {
    async fn handle(&self, request: Request, next: Next) -> Response {
        if request.method() != http::Method::GET && request.method() != http::Method::HEAD {
            return next(request).await;
        }

        let Ok(path) = urlencoding::decode(request.path()) else {
            return next(request).await;
        };
        if path.split('/').any(|segment| segment == "..") {
            tracing::warn!("Rejected static path {}", request.path());
            return Err(HttpResponse::text("Invalid path").status(400));
        }

        let Some(file) = self.lookup(&path).await else {
            return next(request).await;
        };

        match tokio::fs::read(&file).await {
            Ok(bytes) => {
                tracing::debug!("[static] Serving {}", file.display());
                Ok(HttpResponse::bytes(bytes, content_type_for(&file)))
            }
            Err(e) => {
                tracing::warn!("[static] Failed to read {}: {}", file.display(), e);
                next(request).await
            }
        }
    }
}

fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
        .as_str()
    {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" => "application/javascript; charset=utf-8",
        "json" => "application/json",
        "txt" => "text/plain; charset=utf-8",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        _ => "application/octet-stream",
    }
}
