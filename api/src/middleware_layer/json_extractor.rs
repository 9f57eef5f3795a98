//! Wraps plain-text 400/422 rejections (from axum's `Json`, `Query` and
//! `Multipart` extractors) in the JSON error envelope.

use axum::{
    body::{Body, Bytes},
    http::{HeaderValue, Request, StatusCode, header::CONTENT_TYPE},
    middleware::Next,
    response::Response,
};

use crate::core::http::response_envelope::{ApiErrorDetail, ApiResponse};

const KNOWN_FIELDS: [&str; 7] = ["fileKeys", "fileIds", "userId", "message", "name", "url", "key"];

async fn take_body(res: Response) -> (axum::http::response::Parts, Bytes) {
    let (parts, body) = res.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_default();
    (parts, bytes)
}

fn guess_path_from_serde_msg(msg: &str) -> Option<String> {
    KNOWN_FIELDS
        .iter()
        .find(|k| msg.contains(*k))
        .map(|k| k.to_string())
}

fn hint_for(msg: &str) -> Option<String> {
    if msg.contains("expected a sequence") {
        Some("Expected an array for this field (e.g. [\"key1\", \"key2\"]).".into())
    } else if msg.contains("expected a map") || msg.contains("expected struct") {
        Some("Expected a JSON object here (e.g. { \"field\": \"value\" }).".into())
    } else if msg.contains("missing field") {
        Some("Add the missing field to the request.".into())
    } else {
        None
    }
}

fn is_json(parts: &axum::http::response::Parts) -> bool {
    parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}

pub async fn json_error_mapper(req: Request<Body>, next: Next) -> Response {
    let res = next.run(req).await;
    let status = res.status();

    if !(status == StatusCode::BAD_REQUEST || status == StatusCode::UNPROCESSABLE_ENTITY) {
        return res;
    }

    let (mut parts, bytes) = take_body(res).await;
    if is_json(&parts) {
        return Response::from_parts(parts, bytes.into());
    }
    let original = String::from_utf8_lossy(&bytes);

    let details = match guess_path_from_serde_msg(&original) {
        Some(path) => vec![ApiErrorDetail::field(path, hint_for(&original))],
        None => Vec::new(),
    };

    let envelope = ApiResponse::<()>::error(
        if status == StatusCode::BAD_REQUEST {
            "BAD_REQUEST"
        } else {
            "UNPROCESSABLE_ENTITY"
        },
        original.trim(),
        details,
    );

    let body = match serde_json::to_vec(&envelope) {
        Ok(v) => v,
        Err(_) => bytes.to_vec(),
    };

    parts
        .headers
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    parts.headers.remove(axum::http::header::CONTENT_LENGTH);

    Response::from_parts(parts, body.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_field_and_hint() {
        let msg = "Failed to deserialize the JSON body: fileKeys: invalid type: string, expected a sequence";
        assert_eq!(guess_path_from_serde_msg(msg).as_deref(), Some("fileKeys"));
        assert!(hint_for(msg).unwrap().contains("array"));
        assert!(guess_path_from_serde_msg("nothing known").is_none());
    }
}
