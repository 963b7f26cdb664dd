//! A stand-in for upstream authentication.

use hermes_core::{AuthInfo, BoxFuture, Request};
use hermes_server::{HttpResponse, Middleware, Next};
use http::header::AUTHORIZATION;

/// Auth middleware for tests: any `Authorization: bearer <token>` header
/// becomes the caller identity, unchecked.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubAuth;

impl Middleware for StubAuth {
    fn name(&self) -> &'static str {
        "stub-auth"
    }

    fn process<'a>(&'a self, mut request: Request, next: Next<'a>) -> BoxFuture<'a, HttpResponse> {
        Box::pin(async move {
            let token = request
                .headers()
                .get(AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| {
                    let (scheme, token) = value.split_once(' ')?;
                    scheme.eq_ignore_ascii_case("bearer").then(|| token.trim().to_string())
                });
            if let Some(token) = token.filter(|token| !token.is_empty()) {
                let _ = AuthInfo::from_token(token).attach(request.extensions_mut());
            }
            next.run(request).await
        })
    }
}
