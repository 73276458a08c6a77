use crate::error::{ServerError, ServerResult};
use axum::http::header::{ACCEPT, CONTENT_TYPE};
use axum::http::HeaderMap;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use once_cell::sync::Lazy;

/// The service's OpenAPI document, served as-is for YAML clients.
pub const OPENAPI_YAML: &str = include_str!("../../api/openapi.yaml");

static OPENAPI_JSON: Lazy<Result<serde_json::Value, String>> =
    Lazy::new(|| serde_yaml::from_str(OPENAPI_YAML).map_err(|e| e.to_string()));

const DOCS_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <title>Eval Hub API</title>
  <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css" />
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
  <script>
    window.onload = () => {
      window.ui = SwaggerUIBundle({
        url: "/openapi.yaml",
        dom_id: "#swagger-ui",
      });
    };
  </script>
</body>
</html>
"##;

fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("application/json"))
}

/// GET /openapi.yaml
///
/// YAML by default, JSON when the `Accept` header asks for it.
pub async fn openapi_spec(headers: HeaderMap) -> ServerResult<Response> {
    if wants_json(&headers) {
        let document = OPENAPI_JSON
            .as_ref()
            .map_err(|e| ServerError::Internal(format!("invalid OpenAPI document: {e}")))?;
        return Ok(Json(document).into_response());
    }

    Ok(([(CONTENT_TYPE, "application/yaml")], OPENAPI_YAML).into_response())
}

/// GET /docs
pub async fn docs_page() -> Html<&'static str> {
    Html(DOCS_HTML)
}
