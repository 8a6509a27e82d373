use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, Method},
    middleware::Next,
    response::Response,
};

/// What the caller of a request may see, attached as a request extension by
/// [`editor_gate`].
///
/// `Public` callers only read published, non-deleted content.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Public,
    Editor,
}

impl Access {
    pub fn is_editor(self) -> bool {
        self == Access::Editor
    }
}

/// Shared-token gate for the editing API.
///
/// When `token` is `None` every caller is an editor. Otherwise a request
/// without `Authorization: Bearer <token>` is public: it may read published
/// content and nothing else under `/api/`.
#[derive(Clone, Debug, Default)]
pub struct EditorGate {
    token: Option<String>,
}

impl EditorGate {
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }

    fn access(&self, req: &Request) -> Access {
        match self.token {
            None => Access::Editor,
            Some(ref token) if bearer_token(req) == Some(token.as_str()) => Access::Editor,
            Some(_) => Access::Public,
        }
    }
}

/// Axum middleware enforcing [`EditorGate`].
///
/// 1. paths outside `/api/` → passthrough
/// 2. editor (no token configured, or matching bearer) → passthrough
/// 3. public `GET`/`HEAD`/`OPTIONS` of content without `include_deleted` → passthrough
/// 4. otherwise → 401 with a JSON body
///
/// Handlers read the resulting [`Access`] to filter drafts and deleted rows.
pub async fn editor_gate(
    State(gate): State<Arc<EditorGate>>,
    mut req: Request,
    next: Next,
) -> Response {
    let access = gate.access(&req);
    if access.is_editor() || !req.uri().path().starts_with("/api/") || is_public_read(&req) {
        req.extensions_mut().insert(access);
        return next.run(req).await;
    }
    tracing::warn!(method = %req.method(), path = %req.uri().path(), "rejected request without editor token");
    unauthorized()
}

fn unauthorized() -> Response {
    let mut resp = Response::new(Body::from(r#"{"error":"unauthorized"}"#));
    *resp.status_mut() = axum::http::StatusCode::UNAUTHORIZED;
    resp.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("application/json"),
    );
    resp
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn is_read_only(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// A read an anonymous caller may make: not the user directory and not a
/// listing that asks for soft-deleted rows.
fn is_public_read(req: &Request) -> bool {
    let path = req.uri().path();
    let users = path == "/api/users" || path.starts_with("/api/users/");
    is_read_only(req.method()) && !users && !wants_deleted(req.uri().query())
}

fn wants_deleted(query: Option<&str>) -> bool {
    query.is_some_and(|q| {
        q.split('&')
            .any(|pair| matches!(pair, "include_deleted=true" | "include_deleted=1"))
    })
}

fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
