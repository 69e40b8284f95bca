//! Static client assets.
//!
//! Only a fixed whitelist of files is served. Any other path redirects to
//! `/`, so the browser always lands on the client page.

use std::path::PathBuf;

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

/// Request path to file name under the static directory.
const ROUTES: [(&str, &str); 4] = [
    ("/", "index.html"),
    ("/favicon.ico", "favicon.ico"),
    ("/rover-client.js", "rover-client.js"),
    ("/protocol.js", "protocol.js"),
];

/// File served for `path`, if whitelisted.
pub fn resolve(path: &str) -> Option<&'static str> {
    ROUTES.iter().find(|(route, _)| *route == path).map(|(_, file)| *file)
}

/// MIME type by extension. Extensionless files are treated as HTML.
pub fn content_type(file: &str) -> &'static str {
    match file.rsplit_once('.').map(|(_, ext)| ext) {
        None | Some("html") => "text/html",
        Some("js") => "text/javascript",
        Some("css") => "text/css",
        Some("ico") => "image/x-icon",
        Some(_) => "application/octet-stream",
    }
}

/// Serves the whitelisted client files from a directory.
#[derive(Debug, Clone, Default)]
pub struct Assets {
    root: Option<PathBuf>,
}

impl Assets {
    /// Serve from `root`, or answer 404 for every whitelisted file if `None`.
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    /// Answer a GET for `path`.
    pub async fn serve(&self, path: &str) -> Response {
        let Some(file) = resolve(path) else {
            tracing::debug!(path, "not whitelisted, redirecting");
            return (StatusCode::FOUND, [(header::LOCATION, "/")]).into_response();
        };
        let Some(root) = &self.root else {
            return StatusCode::NOT_FOUND.into_response();
        };

        match tokio::fs::read(root.join(file)).await {
            Ok(body) => ([(header::CONTENT_TYPE, content_type(file))], body).into_response(),
            Err(err) => {
                tracing::error!(file, error = %err, "cannot read static file");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            },
        }
    }
}
