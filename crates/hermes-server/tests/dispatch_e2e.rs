//! End-to-end dispatch behaviour, driven through `Dispatcher::dispatch`
//! and, for the listener, over a real socket.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use hermes_core::{
    ApiError, AuthInfo, BoxFuture, ErrorsResponse, HandlerResponse, HandlerResult, Request,
    RequestContext, Routable, Route,
};
use hermes_extract::{DecoderValidator, Validate, ValidationErrors};
use hermes_server::{
    Dispatcher, HttpResponse, Middleware, Next, RouterBuilder, Server, ServerConfig,
    ShutdownSignal,
};
use http::header::{AUTHORIZATION, CONTENT_TYPE, LINK};
use http::{HeaderValue, Method, StatusCode};
use http_body_util::BodyExt;
use serde::Deserialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

struct BearerAuth;

impl Middleware for BearerAuth {
    fn name(&self) -> &'static str {
        "bearer-auth"
    }

    fn process<'a>(&'a self, mut request: Request, next: Next<'a>) -> BoxFuture<'a, HttpResponse> {
        Box::pin(async move {
            let token = request
                .headers()
                .get(AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.strip_prefix("bearer "))
                .map(str::to_string);
            if let Some(token) = token {
                let _ = AuthInfo::from_token(token).attach(request.extensions_mut());
            }
            next.run(request).await
        })
    }
}

struct Tag(&'static str);

impl Middleware for Tag {
    fn name(&self) -> &'static str {
        self.0
    }

    fn process<'a>(&'a self, request: Request, next: Next<'a>) -> BoxFuture<'a, HttpResponse> {
        Box::pin(async move {
            let mut response = next.run(request).await;
            response
                .headers_mut()
                .append("x-seen-by", HeaderValue::from_static(self.0));
            response
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SpaceCreate {
    name: String,
}

impl Validate for SpaceCreate {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(!self.name.is_empty(), "Name cannot be blank");
        errors.into_result()
    }
}

#[derive(Clone, Default)]
struct Spaces {
    calls: Arc<AtomicUsize>,
}

impl Routable for Spaces {
    fn authenticated_routes(&self) -> Vec<Route> {
        let calls = Arc::clone(&self.calls);
        vec![
            Route::get("/v3/spaces/{guid}", move |ctx: RequestContext, _req: Request| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    let token = ctx.require_auth_info()?.token.clone();
                    HandlerResponse::ok().with_body(&serde_json::json!({
                        "guid": ctx.param("guid"),
                        "token": token,
                        "correlation_id": ctx.correlation_id().as_str(),
                    }))
                }
            }),
            Route::post("/v3/spaces", create_space),
            Route::get("/v3/spaces/{guid}/secret", secret),
            Route::delete("/v3/spaces/{guid}", delete_space),
            Route::get("/v3/spaces", list_spaces),
            Route::get("/v3/broken", broken),
        ]
    }

    fn unauthenticated_routes(&self) -> Vec<Route> {
        vec![Route::get("/v3/info", info), Route::get("/v3/spaces/summary", info)]
    }
}

async fn create_space(_ctx: RequestContext, request: Request) -> HandlerResult {
    let body: SpaceCreate = DecoderValidator::new().decode_and_validate_json_request(&request)?;
    HandlerResponse::created().with_body(&serde_json::json!({ "name": body.name }))
}

async fn secret(_ctx: RequestContext, _request: Request) -> HandlerResult {
    Err(ApiError::forbidden("Space").forbidden_as_not_found())
}

async fn delete_space(_ctx: RequestContext, _request: Request) -> HandlerResult {
    Ok(HandlerResponse::no_content())
}

async fn list_spaces(_ctx: RequestContext, _request: Request) -> HandlerResult {
    Ok(HandlerResponse::ok()
        .with_json(serde_json::json!({ "resources": [] }))
        .with_header(LINK, HeaderValue::from_static("</v3/spaces?page=1>; rel=\"first\""))
        .with_header(LINK, HeaderValue::from_static("</v3/spaces?page=2>; rel=\"next\"")))
}

async fn broken(_ctx: RequestContext, _request: Request) -> HandlerResult {
    Err(ApiError::unknown("database went away").context("listing spaces"))
}

async fn info(ctx: RequestContext, _request: Request) -> HandlerResult {
    HandlerResponse::ok().with_body(&serde_json::json!({
        "authenticated": ctx.auth_info().is_some(),
        "token": ctx.auth_info().map(|info| info.token.as_str()),
    }))
}

fn dispatcher(spaces: &Spaces) -> Dispatcher {
    RouterBuilder::new()
        .load_routes(spaces)
        .use_middleware(Tag("common"))
        .use_auth_middleware(BearerAuth)
        .build()
        .unwrap()
}

fn request(method: Method, uri: &str) -> http::request::Builder {
    http::Request::builder().method(method).uri(uri)
}

fn empty(builder: http::request::Builder) -> Request {
    builder.body(Bytes::new()).unwrap()
}

async fn json(response: HttpResponse) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn envelope(response: HttpResponse) -> ErrorsResponse {
    serde_json::from_value(json(response).await).unwrap()
}

#[tokio::test]
async fn authenticated_route_without_identity_never_reaches_handler() {
    let spaces = Spaces::default();
    let dispatcher = dispatcher(&spaces);

    let response = dispatcher
        .dispatch(empty(request(Method::GET, "/v3/spaces/s-1")))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(spaces.calls.load(Ordering::SeqCst), 0);
    let body = envelope(response).await;
    assert_eq!(body.errors[0].title, "CF-NotAuthenticated");
    assert_eq!(body.errors[0].code, 10002);
    assert_eq!(body.errors[0].detail, "Authentication error");
}

#[tokio::test]
async fn authenticated_route_with_identity_sees_params_and_token() {
    let spaces = Spaces::default();
    let dispatcher = dispatcher(&spaces);

    let response = dispatcher
        .dispatch(empty(
            request(Method::GET, "/v3/spaces/s-1").header(AUTHORIZATION, "bearer t0k"),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
    assert_eq!(spaces.calls.load(Ordering::SeqCst), 1);
    let body = json(response).await;
    assert_eq!(body["guid"], "s-1");
    assert_eq!(body["token"], "t0k");
}

#[tokio::test]
async fn unauthenticated_route_runs_without_identity() {
    let dispatcher = dispatcher(&Spaces::default());

    let response = dispatcher
        .dispatch(empty(request(Method::GET, "/v3/info")))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json(response).await["authenticated"], false);
}

#[tokio::test]
async fn auth_middleware_skips_unauthenticated_routes() {
    let dispatcher = dispatcher(&Spaces::default());

    let response = dispatcher
        .dispatch(empty(
            request(Method::GET, "/v3/info").header(AUTHORIZATION, "bearer t0k"),
        ))
        .await;

    assert_eq!(json(response).await["authenticated"], false);
}

#[tokio::test]
async fn literal_segment_beats_parameter() {
    let spaces = Spaces::default();
    let dispatcher = dispatcher(&spaces);

    let response = dispatcher
        .dispatch(empty(request(Method::GET, "/v3/spaces/summary")))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(spaces.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn literal_segment_for_other_method_does_not_hide_parameter_route() {
    let dispatcher = dispatcher(&Spaces::default());

    let response = dispatcher
        .dispatch(empty(
            request(Method::DELETE, "/v3/spaces/summary").header(AUTHORIZATION, "bearer t0k"),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn upstream_identity_passes_through_to_unauthenticated_routes() {
    let dispatcher = RouterBuilder::new()
        .load_routes(&Spaces::default())
        .use_middleware(BearerAuth)
        .build()
        .unwrap();

    let response = dispatcher
        .dispatch(empty(
            request(Method::GET, "/v3/info").header(AUTHORIZATION, "bearer upstream"),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json(response).await;
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["token"], "upstream");
}

#[tokio::test]
async fn unknown_path_is_endpoint_not_found() {
    let dispatcher = dispatcher(&Spaces::default());

    let response = dispatcher
        .dispatch(empty(request(Method::GET, "/v3/nope")))
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.headers().get_all("x-seen-by").iter().count(), 1);
    let body = envelope(response).await;
    assert_eq!(body.errors[0].title, "CF-ResourceNotFound");
    assert_eq!(
        body.errors[0].detail,
        "Endpoint not found. Ensure it exists and you have access to it."
    );
}

#[tokio::test]
async fn wrong_method_lists_allowed_methods() {
    let dispatcher = dispatcher(&Spaces::default());

    let response = dispatcher
        .dispatch(empty(request(Method::PATCH, "/v3/spaces/s-1")))
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let allow = response.headers()[http::header::ALLOW].to_str().unwrap().to_string();
    assert!(allow.contains("GET"));
    assert!(allow.contains("DELETE"));
}

#[tokio::test]
async fn custom_fallbacks_replace_the_defaults() {
    let dispatcher = RouterBuilder::new()
        .load_routes(&Spaces::default())
        .set_not_found_handler(|_ctx: RequestContext, _req: Request| async {
            Ok::<_, ApiError>(
                HandlerResponse::new(StatusCode::NOT_FOUND).with_json(serde_json::json!({"not": "found"})),
            )
        })
        .set_method_not_allowed_handler(|_ctx: RequestContext, _req: Request| async {
            Ok::<_, ApiError>(HandlerResponse::new(StatusCode::METHOD_NOT_ALLOWED))
        })
        .build()
        .unwrap();

    let response = dispatcher
        .dispatch(empty(request(Method::GET, "/v3/nope")))
        .await;
    assert_eq!(json(response).await["not"], "found");

    let response = dispatcher
        .dispatch(empty(request(Method::PUT, "/v3/info")))
        .await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn malformed_json_is_message_parse_error() {
    let dispatcher = dispatcher(&Spaces::default());

    let response = dispatcher
        .dispatch(
            request(Method::POST, "/v3/spaces")
                .header(AUTHORIZATION, "bearer t0k")
                .body(Bytes::from_static(b"{\"name\":"))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = envelope(response).await;
    assert_eq!(body.errors[0].title, "CF-MessageParseError");
    assert_eq!(body.errors[0].detail, "Request invalid due to parse error: invalid request body");
    assert_eq!(body.errors[0].code, 1001);
}

#[tokio::test]
async fn unknown_field_is_unprocessable() {
    let dispatcher = dispatcher(&Spaces::default());

    let response = dispatcher
        .dispatch(
            request(Method::POST, "/v3/spaces")
                .header(AUTHORIZATION, "bearer t0k")
                .body(Bytes::from_static(br#"{"name":"dev","colour":"blue"}"#))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = envelope(response).await;
    assert_eq!(body.errors[0].title, "CF-UnprocessableEntity");
    assert_eq!(body.errors[0].detail, "invalid request body: json: unknown field \"colour\"");
}

#[tokio::test]
async fn validation_failure_is_unprocessable() {
    let dispatcher = dispatcher(&Spaces::default());

    let response = dispatcher
        .dispatch(
            request(Method::POST, "/v3/spaces")
                .header(AUTHORIZATION, "bearer t0k")
                .body(Bytes::from_static(br#"{"name":""}"#))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(envelope(response).await.errors[0].detail, "Name cannot be blank");
}

#[tokio::test]
async fn created_response_carries_body() {
    let dispatcher = dispatcher(&Spaces::default());

    let response = dispatcher
        .dispatch(
            request(Method::POST, "/v3/spaces")
                .header(AUTHORIZATION, "bearer t0k")
                .body(Bytes::from_static(br#"{"name":"dev"}"#))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(json(response).await["name"], "dev");
}

#[tokio::test]
async fn forbidden_rewritten_as_not_found() {
    let dispatcher = dispatcher(&Spaces::default());

    let response = dispatcher
        .dispatch(empty(
            request(Method::GET, "/v3/spaces/s-1/secret").header(AUTHORIZATION, "bearer t0k"),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        envelope(response).await.errors[0].detail,
        "Space not found. Ensure it exists and you have access to it."
    );
}

#[tokio::test]
async fn no_content_has_no_content_type() {
    let dispatcher = dispatcher(&Spaces::default());

    let response = dispatcher
        .dispatch(empty(
            request(Method::DELETE, "/v3/spaces/s-1").header(AUTHORIZATION, "bearer t0k"),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(response.headers().get(CONTENT_TYPE).is_none());
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn handler_headers_are_additive() {
    let dispatcher = dispatcher(&Spaces::default());

    let response = dispatcher
        .dispatch(empty(
            request(Method::GET, "/v3/spaces").header(AUTHORIZATION, "bearer t0k"),
        ))
        .await;

    assert_eq!(response.headers().get_all(LINK).iter().count(), 2);
    assert_eq!(response.headers()["x-seen-by"], "common");
}

#[tokio::test]
async fn unknown_errors_hide_their_cause() {
    let dispatcher = dispatcher(&Spaces::default());

    let response = dispatcher
        .dispatch(empty(
            request(Method::GET, "/v3/broken").header(AUTHORIZATION, "bearer t0k"),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = envelope(response).await;
    assert_eq!(body.errors[0].title, "UnknownError");
    assert_eq!(body.errors[0].detail, "An unknown error occurred.");
    assert_eq!(body.errors[0].code, 10001);
}

#[tokio::test]
async fn incoming_correlation_id_is_reused_and_echoed() {
    let dispatcher = dispatcher(&Spaces::default());

    let response = dispatcher
        .dispatch(empty(
            request(Method::GET, "/v3/spaces/s-1")
                .header(AUTHORIZATION, "bearer t0k")
                .header("x-correlation-id", "req-42"),
        ))
        .await;

    assert_eq!(response.headers()["x-correlation-id"], "req-42");
    assert_eq!(json(response).await["correlation_id"], "req-42");
}

#[tokio::test]
async fn correlation_id_generated_when_absent_or_untrusted() {
    let dispatcher = RouterBuilder::new()
        .load_routes(&Spaces::default())
        .trust_incoming_correlation(false)
        .build()
        .unwrap();

    let response = dispatcher
        .dispatch(empty(
            request(Method::GET, "/v3/nope").header("x-correlation-id", "req-42"),
        ))
        .await;
    let echoed = response.headers()["x-correlation-id"].to_str().unwrap();
    assert_ne!(echoed, "req-42");
    assert_eq!(echoed.len(), 36);
}

async fn raw_http(addr: std::net::SocketAddr, request: &str) -> String {
    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.unwrap();
    String::from_utf8(buf).unwrap()
}

#[tokio::test]
async fn server_serves_and_shuts_down() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let config = ServerConfig::builder()
        .shutdown_timeout(Duration::from_secs(1))
        .build();
    let shutdown = ShutdownSignal::new();
    let server = Server::new(config, dispatcher(&Spaces::default()));
    let running = tokio::spawn(server.serve(listener, shutdown.clone()));

    let reply = raw_http(
        addr,
        "GET /v3/info HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert!(reply.starts_with("HTTP/1.1 200"), "{reply}");
    assert!(reply.to_ascii_lowercase().contains("x-correlation-id:"));

    let reply = raw_http(
        addr,
        "GET /v3/spaces/s-1 HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert!(reply.starts_with("HTTP/1.1 401"), "{reply}");

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(3), running)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn oversized_body_is_rejected_before_dispatch() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let config = ServerConfig::builder().max_body_size(8).build();
    let shutdown = ShutdownSignal::new();
    let running = tokio::spawn(
        Server::new(config, dispatcher(&Spaces::default())).serve(listener, shutdown.clone()),
    );

    let body = r#"{"name":"a-long-space-name"}"#;
    let reply = raw_http(
        addr,
        &format!(
            "POST /v3/spaces HTTP/1.1\r\nHost: localhost\r\nAuthorization: bearer t\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        ),
    )
    .await;
    assert!(reply.starts_with("HTTP/1.1 400"), "{reply}");
    assert!(reply.contains("CF-MessageParseError"));

    shutdown.trigger();
    let _ = tokio::time::timeout(Duration::from_secs(3), running).await;
}
