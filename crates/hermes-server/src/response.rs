//! Writing handler outcomes onto the wire.

use bytes::Bytes;
use hermes_core::{ApiError, HandlerResponse};
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{Response, StatusCode};
use http_body_util::Full;

/// The response type produced by dispatch and middleware.
pub type HttpResponse = Response<Full<Bytes>>;

const APPLICATION_JSON: &str = "application/json";

/// Writes a successful handler response.
///
/// Handler headers are applied first. A body is serialized as JSON and
/// labelled `application/json`; without one the response carries no
/// content type and an empty body.
pub(crate) fn from_handler(response: HandlerResponse) -> HttpResponse {
    let (status, body, headers) = response.into_parts();
    let payload = match body {
        Some(value) => match serde_json::to_vec(&value) {
            Ok(bytes) => Some(Bytes::from(bytes)),
            Err(err) => return error_response(&ApiError::unknown(err)),
        },
        None => None,
    };

    let has_body = payload.is_some();
    let mut http = Response::new(Full::new(payload.unwrap_or_default()));
    *http.status_mut() = status;
    *http.headers_mut() = headers;
    if has_body {
        http.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
    }
    http
}

/// Writes the error envelope for `err` with the status of its kind.
#[must_use]
pub fn error_response(err: &ApiError) -> HttpResponse {
    let (status, bytes) = match serde_json::to_vec(&err.to_envelope()) {
        Ok(bytes) => (err.status(), Bytes::from(bytes)),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Bytes::from_static(br#"{"errors":[{"title":"UnknownError","detail":"An unknown error occurred.","code":10001}]}"#),
        ),
    };
    let mut http = Response::new(Full::new(bytes));
    *http.status_mut() = status;
    http.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
    http
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::LINK;
    use http_body_util::BodyExt;

    async fn body_of(response: HttpResponse) -> Bytes {
        response.into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn no_content_has_no_type_and_no_body() {
        let http = from_handler(HandlerResponse::no_content());
        assert_eq!(http.status(), StatusCode::NO_CONTENT);
        assert!(http.headers().get(CONTENT_TYPE).is_none());
        assert!(body_of(http).await.is_empty());
    }

    #[tokio::test]
    async fn body_is_json() {
        let http = from_handler(HandlerResponse::ok().with_json(serde_json::json!({"guid": "s-1"})));
        assert_eq!(http.headers()[CONTENT_TYPE], "application/json");
        let body: serde_json::Value = serde_json::from_slice(&body_of(http).await).unwrap();
        assert_eq!(body["guid"], "s-1");
    }

    #[test]
    fn repeated_headers_are_kept() {
        let response = HandlerResponse::accepted()
            .with_header(LINK, HeaderValue::from_static("<a>; rel=\"first\""))
            .with_header(LINK, HeaderValue::from_static("<b>; rel=\"next\""));
        let http = from_handler(response);
        assert_eq!(http.headers().get_all(LINK).iter().count(), 2);
    }

    #[tokio::test]
    async fn error_envelope() {
        let http = error_response(&ApiError::not_found("Space"));
        assert_eq!(http.status(), StatusCode::NOT_FOUND);
        let body: serde_json::Value = serde_json::from_slice(&body_of(http).await).unwrap();
        assert_eq!(body["errors"][0]["title"], "CF-ResourceNotFound");
        assert_eq!(body["errors"][0]["detail"], "Space not found. Ensure it exists and you have access to it.");
        assert_eq!(body["errors"][0]["code"], 10010);
    }
}
