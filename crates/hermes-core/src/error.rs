//! The API error taxonomy.
//!
//! Every failure that leaves the dispatcher is an [`ApiError`], and every
//! [`ApiError`] has exactly one [`ErrorKind`]. The kind fixes the HTTP
//! status, the title and the numeric code that clients see; the detail is
//! message specific.
//!
//! | Kind | Status | Title | Code |
//! |---|---|---|---|
//! | [`ErrorKind::Unknown`] | 500 | `UnknownError` | 10001 |
//! | [`ErrorKind::InvalidAuthToken`] | 401 | `CF-InvalidAuthToken` | 1000 |
//! | [`ErrorKind::NotAuthenticated`] | 401 | `CF-NotAuthenticated` | 10002 |
//! | [`ErrorKind::Forbidden`] | 403 | `CF-NotAuthorized` | 10003 |
//! | [`ErrorKind::NotFound`] | 404 | `CF-ResourceNotFound` | 10010 |
//! | [`ErrorKind::MessageParse`] | 400 | `CF-MessageParseError` | 1001 |
//! | [`ErrorKind::UnknownQueryKey`] | 400 | `CF-BadQueryParameter` | 10005 |
//! | [`ErrorKind::UnprocessableEntity`] | 422 | `CF-UnprocessableEntity` | 10008 |
//! | [`ErrorKind::BackendUnavailable`] | 502 | `CF-BlobstoreUnavailable` | 150006 |
//!
//! Wrapping an error for context (see [`ApiError::context`] and
//! [`ApiError::log_and_return`]) never changes its kind, so classification
//! survives any number of wrapping layers.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use http::StatusCode;
use serde::{Deserialize, Serialize};

/// Result alias for handler and helper code.
pub type ApiResult<T> = Result<T, ApiError>;

type Cause = Arc<dyn StdError + Send + Sync + 'static>;

/// The closed set of failure kinds a client can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Uncategorized failure. The detail never carries the cause.
    Unknown,
    /// The presented credential was rejected by the backend.
    InvalidAuthToken,
    /// No identity was attached to a request that needs one.
    NotAuthenticated,
    /// The caller may not perform the action.
    Forbidden,
    /// The resource does not exist or is not visible to the caller.
    NotFound,
    /// The request body could not be parsed at all.
    MessageParse,
    /// The query string contained a key the endpoint does not support.
    UnknownQueryKey,
    /// The request was well formed but semantically invalid.
    UnprocessableEntity,
    /// A downstream store could not be reached.
    BackendUnavailable,
}

impl ErrorKind {
    /// Every kind, in table order.
    pub const ALL: [Self; 9] = [
        Self::Unknown,
        Self::InvalidAuthToken,
        Self::NotAuthenticated,
        Self::Forbidden,
        Self::NotFound,
        Self::MessageParse,
        Self::UnknownQueryKey,
        Self::UnprocessableEntity,
        Self::BackendUnavailable,
    ];

    /// HTTP status emitted for this kind.
    #[must_use]
    pub const fn status(self) -> StatusCode {
        match self {
            Self::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidAuthToken | Self::NotAuthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MessageParse | Self::UnknownQueryKey => StatusCode::BAD_REQUEST,
            Self::UnprocessableEntity => StatusCode::UNPROCESSABLE_ENTITY,
            Self::BackendUnavailable => StatusCode::BAD_GATEWAY,
        }
    }

    /// Stable wire title.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Unknown => "UnknownError",
            Self::InvalidAuthToken => "CF-InvalidAuthToken",
            Self::NotAuthenticated => "CF-NotAuthenticated",
            Self::Forbidden => "CF-NotAuthorized",
            Self::NotFound => "CF-ResourceNotFound",
            Self::MessageParse => "CF-MessageParseError",
            Self::UnknownQueryKey => "CF-BadQueryParameter",
            Self::UnprocessableEntity => "CF-UnprocessableEntity",
            Self::BackendUnavailable => "CF-BlobstoreUnavailable",
        }
    }

    /// Stable numeric code.
    #[must_use]
    pub const fn code(self) -> u32 {
        match self {
            Self::Unknown => 10001,
            Self::InvalidAuthToken => 1000,
            Self::NotAuthenticated => 10002,
            Self::Forbidden => 10003,
            Self::NotFound => 10010,
            Self::MessageParse => 1001,
            Self::UnknownQueryKey => 10005,
            Self::UnprocessableEntity => 10008,
            Self::BackendUnavailable => 150006,
        }
    }

    /// Looks a kind up by its numeric code.
    #[must_use]
    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }

    /// Looks a kind up by its wire title.
    #[must_use]
    pub fn from_title(title: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.title() == title)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// A classified API failure.
///
/// Carries the kind, the client-visible detail, and optionally the cause
/// and context collected on the way up. Only kind and detail ever reach the
/// client; cause, context and fields are for logs.
///
/// # Example
///
/// ```
/// use hermes_core::{ApiError, ErrorKind};
///
/// fn lookup_space(found: bool) -> Result<(), ApiError> {
///     if !found {
///         return Err(ApiError::forbidden("Space"));
///     }
///     Ok(())
/// }
///
/// let err = lookup_space(false)
///     .map_err(|e| e.context("fetching space"))
///     .map_err(ApiError::forbidden_as_not_found)
///     .unwrap_err();
///
/// assert_eq!(err.kind(), ErrorKind::NotFound);
/// assert_eq!(
///     err.detail(),
///     "Space not found. Ensure it exists and you have access to it."
/// );
/// ```
#[derive(Clone)]
pub struct ApiError {
    kind: ErrorKind,
    detail: String,
    resource_type: Option<String>,
    cause: Option<Cause>,
    /// Innermost first.
    context: Vec<String>,
    fields: Vec<(String, String)>,
}

impl ApiError {
    fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
            resource_type: None,
            cause: None,
            context: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// An uncategorized failure wrapping `cause`.
    ///
    /// The cause is logged by the dispatcher but the client only ever sees
    /// `An unknown error occurred.`
    pub fn unknown(cause: impl Into<Box<dyn StdError + Send + Sync + 'static>>) -> Self {
        Self::new(ErrorKind::Unknown, "An unknown error occurred.").with_cause(cause)
    }

    /// The backend rejected the caller's credential.
    #[must_use]
    pub fn invalid_auth_token() -> Self {
        Self::new(ErrorKind::InvalidAuthToken, "Invalid Auth Token")
    }

    /// No identity is attached to the request.
    #[must_use]
    pub fn not_authenticated() -> Self {
        Self::new(ErrorKind::NotAuthenticated, "Authentication error")
    }

    /// The caller may not act on a resource of `resource_type`.
    ///
    /// The resource type is remembered so [`Self::forbidden_as_not_found`]
    /// can describe the resource.
    pub fn forbidden(resource_type: impl Into<String>) -> Self {
        let mut err = Self::new(
            ErrorKind::Forbidden,
            "You are not authorized to perform the requested action",
        );
        err.resource_type = Some(resource_type.into());
        err
    }

    /// A resource of `resource_type` does not exist or is hidden.
    pub fn not_found(resource_type: impl Into<String>) -> Self {
        let resource_type = resource_type.into();
        let mut err = Self::new(
            ErrorKind::NotFound,
            format!("{resource_type} not found. Ensure it exists and you have access to it."),
        );
        err.resource_type = Some(resource_type);
        err
    }

    /// The request body is not parseable.
    #[must_use]
    pub fn message_parse() -> Self {
        Self::new(
            ErrorKind::MessageParse,
            "Request invalid due to parse error: invalid request body",
        )
    }

    /// The query contained an unsupported key.
    ///
    /// The supported keys are listed sorted, so the detail is the same no
    /// matter how the caller ordered them.
    pub fn unknown_query_key<I, S>(supported_keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut keys: Vec<String> = supported_keys
            .into_iter()
            .map(|k| k.as_ref().to_string())
            .collect();
        keys.sort_unstable();
        keys.dedup();
        Self::new(
            ErrorKind::UnknownQueryKey,
            format!(
                "The query parameter is invalid: Valid parameters are: '{}'",
                keys.join(", ")
            ),
        )
    }

    /// The request is well formed but not acceptable.
    pub fn unprocessable_entity(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnprocessableEntity, detail)
    }

    /// A downstream store is unavailable.
    #[must_use]
    pub fn backend_unavailable() -> Self {
        Self::new(
            ErrorKind::BackendUnavailable,
            "Failed to perform operation due to blobstore unavailability.",
        )
    }

    /// Attaches the underlying cause, replacing any previous one.
    #[must_use]
    pub fn with_cause(mut self, cause: impl Into<Box<dyn StdError + Send + Sync + 'static>>) -> Self {
        self.cause = Some(Arc::from(cause.into()));
        self
    }

    /// Wraps the error with a context message. The kind is unchanged.
    #[must_use]
    pub fn context(mut self, message: impl Into<String>) -> Self {
        self.context.push(message.into());
        self
    }

    /// Logs the error with `message` and key/value context, then returns it
    /// wrapped with `message`.
    ///
    /// The key/value pairs also travel with the error so the dispatcher can
    /// repeat them when the request finally fails.
    #[must_use]
    pub fn log_and_return(mut self, message: impl Into<String>, fields: &[(&str, &dyn fmt::Display)]) -> Self {
        let message = message.into();
        for (key, value) in fields {
            self.fields.push(((*key).to_string(), value.to_string()));
        }
        tracing::info!(
            error = %self,
            error.kind = %self.kind,
            context = %FieldList(&self.fields),
            "{message}"
        );
        self.context(message)
    }

    /// Rewrites a forbidden error into a not-found error for the same
    /// resource type. Other kinds pass through unchanged.
    ///
    /// Used where revealing that a resource exists would itself leak
    /// information.
    #[must_use]
    pub fn forbidden_as_not_found(self) -> Self {
        if self.kind != ErrorKind::Forbidden {
            return self;
        }
        let resource_type = self.resource_type.as_deref().unwrap_or("Resource");
        let replacement = Self::not_found(resource_type);
        self.rekind(replacement)
    }

    /// Rewrites the error into an unprocessable entity with `detail` when
    /// its kind is one of `kinds`. Other kinds pass through unchanged.
    ///
    /// Typical use is a failed lookup of a related resource named in the
    /// request body: the client supplied a bad reference, the server is fine.
    #[must_use]
    pub fn as_unprocessable_entity(self, detail: impl Into<String>, kinds: &[ErrorKind]) -> Self {
        if !kinds.contains(&self.kind) {
            return self;
        }
        let replacement = Self::unprocessable_entity(detail);
        self.rekind(replacement)
    }

    /// Translates a backend failure into the taxonomy.
    ///
    /// Unauthorized becomes [`ErrorKind::InvalidAuthToken`], not found and
    /// forbidden keep their meaning for `resource_type`, an unavailable
    /// backend becomes [`ErrorKind::BackendUnavailable`]. Anything else is
    /// [`ErrorKind::Unknown`]. The backend error is kept as the cause.
    pub fn from_backend<E>(err: E, resource_type: &str) -> Self
    where
        E: BackendFailure,
    {
        let translated = match err.reason() {
            BackendReason::Unauthorized => Self::invalid_auth_token(),
            BackendReason::NotFound => Self::not_found(resource_type),
            BackendReason::Forbidden => Self::forbidden(resource_type),
            BackendReason::Unavailable => Self::backend_unavailable(),
            BackendReason::Other => {
                return Self::unknown(err);
            }
        };
        translated.with_cause(err)
    }

    /// Searches an error chain for an [`ApiError`].
    ///
    /// Follows [`StdError::source`] links, so an `ApiError` buried under
    /// foreign wrappers is still found.
    pub fn find<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a Self> {
        let mut current = Some(err);
        while let Some(link) = current {
            if let Some(found) = link.downcast_ref::<Self>() {
                return Some(found);
            }
            current = link.source();
        }
        None
    }

    // Keeps cause, context and fields; takes kind, detail and resource type
    // from the replacement.
    fn rekind(self, replacement: Self) -> Self {
        Self {
            kind: replacement.kind,
            detail: replacement.detail,
            resource_type: replacement.resource_type,
            cause: self.cause,
            context: self.context,
            fields: self.fields,
        }
    }

    /// The error's kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns true if the error is of `kind`.
    #[must_use]
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }

    /// HTTP status for the error's kind.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.kind.status()
    }

    /// Client-visible detail.
    #[must_use]
    pub fn detail(&self) -> &str {
        &self.detail
    }

    /// Resource type for forbidden and not-found errors.
    #[must_use]
    pub fn resource_type(&self) -> Option<&str> {
        self.resource_type.as_deref()
    }

    /// The wrapped cause, if any.
    #[must_use]
    pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.cause.as_deref()
    }

    /// Context messages, outermost first.
    pub fn context_messages(&self) -> impl Iterator<Item = &str> {
        self.context.iter().rev().map(String::as_str)
    }

    /// Key/value pairs collected by [`Self::log_and_return`].
    #[must_use]
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// Builds the wire envelope for this error.
    #[must_use]
    pub fn to_envelope(&self) -> ErrorsResponse {
        ErrorsResponse {
            errors: vec![ErrorBody {
                title: self.kind.title().to_string(),
                detail: self.detail.clone(),
                code: self.kind.code(),
            }],
        }
    }
}

impl fmt::Debug for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiError")
            .field("kind", &self.kind)
            .field("detail", &self.detail)
            .field("resource_type", &self.resource_type)
            .field("context", &self.context)
            .field("fields", &self.fields)
            .field("cause", &self.cause.as_ref().map(ToString::to_string))
            .finish()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for message in self.context_messages() {
            write!(f, "{message}: ")?;
        }
        write!(f, "{}: {}", self.kind.title(), self.detail)?;
        if let Some(cause) = &self.cause {
            write!(f, ": {cause}")?;
        }
        Ok(())
    }
}

impl StdError for ApiError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn StdError + 'static))
    }
}

impl From<anyhow::Error> for ApiError {
    /// Recovers an [`ApiError`] from anywhere in the chain, keeping the
    /// outer messages as context. Otherwise the error becomes
    /// [`ErrorKind::Unknown`].
    fn from(err: anyhow::Error) -> Self {
        let mut outer = Vec::new();
        for link in err.chain() {
            if let Some(found) = link.downcast_ref::<Self>() {
                return outer
                    .into_iter()
                    .rev()
                    .fold(found.clone(), |acc, message| acc.context(message));
            }
            outer.push(link.to_string());
        }
        Self::unknown(err)
    }
}

/// Extension for attaching context to `Result<T, ApiError>`.
pub trait ResultExt<T> {
    /// Wraps the error with `message`.
    fn context(self, message: impl Into<String>) -> ApiResult<T>;

    /// Wraps the error with a lazily built message.
    fn with_context<F, M>(self, f: F) -> ApiResult<T>
    where
        F: FnOnce() -> M,
        M: Into<String>;
}

impl<T> ResultExt<T> for ApiResult<T> {
    fn context(self, message: impl Into<String>) -> ApiResult<T> {
        self.map_err(|err| err.context(message))
    }

    fn with_context<F, M>(self, f: F) -> ApiResult<T>
    where
        F: FnOnce() -> M,
        M: Into<String>,
    {
        self.map_err(|err| err.context(f()))
    }
}

/// Why a backend call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendReason {
    /// The credential was rejected.
    Unauthorized,
    /// The object does not exist.
    NotFound,
    /// The caller may not access the object.
    Forbidden,
    /// The backend could not be reached.
    Unavailable,
    /// Anything else.
    Other,
}

/// A failure reported by a backend client.
///
/// Repository implementations implement this for their client's error type
/// so [`ApiError::from_backend`] can classify it.
pub trait BackendFailure: StdError + Send + Sync + 'static {
    /// Classifies the failure.
    fn reason(&self) -> BackendReason;
}

/// JSON error body: `{"errors":[{"title","detail","code"}]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorsResponse {
    /// Always exactly one entry when produced by [`ApiError::to_envelope`].
    pub errors: Vec<ErrorBody>,
}

/// One entry of an [`ErrorsResponse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Wire title of the kind.
    pub title: String,
    /// Human-readable detail.
    pub detail: String,
    /// Numeric code of the kind.
    pub code: u32,
}

impl ErrorBody {
    /// The kind named by this body's code, if it is one we know.
    #[must_use]
    pub fn kind(&self) -> Option<ErrorKind> {
        ErrorKind::from_code(self.code).filter(|kind| kind.title() == self.title)
    }
}

struct FieldList<'a>(&'a [(String, String)]);

impl fmt::Display for FieldList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, thiserror::Error)]
    #[error("backend said {0:?}")]
    struct FakeBackendError(BackendReason);

    impl BackendFailure for FakeBackendError {
        fn reason(&self) -> BackendReason {
            self.0
        }
    }

    #[test]
    fn test_wire_contract_table() {
        let expected = [
            (ErrorKind::Unknown, 500, "UnknownError", 10001),
            (ErrorKind::InvalidAuthToken, 401, "CF-InvalidAuthToken", 1000),
            (ErrorKind::NotAuthenticated, 401, "CF-NotAuthenticated", 10002),
            (ErrorKind::Forbidden, 403, "CF-NotAuthorized", 10003),
            (ErrorKind::NotFound, 404, "CF-ResourceNotFound", 10010),
            (ErrorKind::MessageParse, 400, "CF-MessageParseError", 1001),
            (ErrorKind::UnknownQueryKey, 400, "CF-BadQueryParameter", 10005),
            (ErrorKind::UnprocessableEntity, 422, "CF-UnprocessableEntity", 10008),
            (ErrorKind::BackendUnavailable, 502, "CF-BlobstoreUnavailable", 150006),
        ];

        for (kind, status, title, code) in expected {
            assert_eq!(kind.status().as_u16(), status, "{kind:?}");
            assert_eq!(kind.title(), title);
            assert_eq!(kind.code(), code);
            assert_eq!(ErrorKind::from_code(code), Some(kind));
            assert_eq!(ErrorKind::from_title(title), Some(kind));
        }
        assert_eq!(ErrorKind::from_code(42), None);
    }

    #[test]
    fn test_unknown_hides_cause() {
        let err = ApiError::unknown("database password is hunter2");
        assert_eq!(err.detail(), "An unknown error occurred.");
        assert!(!serde_json::to_string(&err.to_envelope())
            .unwrap()
            .contains("hunter2"));
        assert!(err.to_string().contains("hunter2"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_fixed_details() {
        assert_eq!(ApiError::not_authenticated().detail(), "Authentication error");
        assert_eq!(ApiError::invalid_auth_token().detail(), "Invalid Auth Token");
        assert_eq!(
            ApiError::forbidden("App").detail(),
            "You are not authorized to perform the requested action"
        );
        assert_eq!(
            ApiError::not_found("App").detail(),
            "App not found. Ensure it exists and you have access to it."
        );
        assert_eq!(
            ApiError::message_parse().detail(),
            "Request invalid due to parse error: invalid request body"
        );
    }

    #[test]
    fn test_unknown_query_key_sorts_keys() {
        let err = ApiError::unknown_query_key(["names", "guids", "space_guids"]);
        assert_eq!(err.kind(), ErrorKind::UnknownQueryKey);
        assert_eq!(
            err.detail(),
            "The query parameter is invalid: Valid parameters are: 'guids, names, space_guids'"
        );
    }

    #[test]
    fn test_forbidden_as_not_found() {
        let err = ApiError::forbidden("Space")
            .with_cause("rbac denied")
            .forbidden_as_not_found();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.resource_type(), Some("Space"));
        assert_eq!(err.cause().map(ToString::to_string).as_deref(), Some("rbac denied"));
    }

    #[test]
    fn test_forbidden_as_not_found_passes_others_through() {
        let err = ApiError::unprocessable_entity("bad").forbidden_as_not_found();
        assert_eq!(err.kind(), ErrorKind::UnprocessableEntity);
        assert_eq!(err.detail(), "bad");
    }

    #[test]
    fn test_as_unprocessable_entity() {
        let detail = "Invalid space. Ensure it exists and you have access to it.";
        let kinds = [ErrorKind::NotFound, ErrorKind::Forbidden];

        let from_not_found = ApiError::not_found("Space").as_unprocessable_entity(detail, &kinds);
        assert_eq!(from_not_found.kind(), ErrorKind::UnprocessableEntity);
        assert_eq!(from_not_found.detail(), detail);

        let from_forbidden = ApiError::forbidden("Space").as_unprocessable_entity(detail, &kinds);
        assert_eq!(from_forbidden.kind(), ErrorKind::UnprocessableEntity);

        let untouched = ApiError::backend_unavailable().as_unprocessable_entity(detail, &kinds);
        assert_eq!(untouched.kind(), ErrorKind::BackendUnavailable);
    }

    #[test]
    fn test_kind_survives_three_layers_of_wrapping() {
        let err = ApiError::not_found("App")
            .context("failed to fetch app from store")
            .log_and_return("failed to get app", &[("guid", &"a1")])
            .context("handler");

        assert!(err.is(ErrorKind::NotFound));
        assert_eq!(
            err.context_messages().collect::<Vec<_>>(),
            vec!["handler", "failed to get app", "failed to fetch app from store"]
        );
        assert_eq!(err.fields(), &[("guid".to_string(), "a1".to_string())]);
        assert!(err.to_string().starts_with("handler: failed to get app: "));
    }

    #[test]
    fn test_result_ext_context() {
        let result: ApiResult<()> = Err(ApiError::forbidden("Org"));
        let err = result.with_context(|| format!("org {}", "o1")).unwrap_err();
        assert!(err.is(ErrorKind::Forbidden));
        assert_eq!(err.context_messages().next(), Some("org o1"));
    }

    #[test]
    fn test_from_anyhow_recovers_kind() {
        let inner = anyhow::Error::new(ApiError::not_found("Route"))
            .context("repository")
            .context("handler");
        let err = ApiError::from(inner);

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(
            err.context_messages().collect::<Vec<_>>(),
            vec!["handler", "repository"]
        );
    }

    #[test]
    fn test_from_anyhow_unclassified_is_unknown() {
        let err = ApiError::from(anyhow::anyhow!("socket closed"));
        assert_eq!(err.kind(), ErrorKind::Unknown);
        assert_eq!(err.detail(), "An unknown error occurred.");
    }

    #[test]
    fn test_find_through_foreign_wrapper() {
        #[derive(Debug, thiserror::Error)]
        #[error("wrapped")]
        struct Wrapper(#[source] ApiError);

        let wrapped = Wrapper(ApiError::forbidden("Domain"));
        let found = ApiError::find(&wrapped).unwrap();
        assert_eq!(found.kind(), ErrorKind::Forbidden);
    }

    #[test]
    fn test_from_backend() {
        let cases = [
            (BackendReason::Unauthorized, ErrorKind::InvalidAuthToken),
            (BackendReason::NotFound, ErrorKind::NotFound),
            (BackendReason::Forbidden, ErrorKind::Forbidden),
            (BackendReason::Unavailable, ErrorKind::BackendUnavailable),
            (BackendReason::Other, ErrorKind::Unknown),
        ];
        for (reason, kind) in cases {
            let err = ApiError::from_backend(FakeBackendError(reason), "Org");
            assert_eq!(err.kind(), kind, "{reason:?}");
            assert!(err.cause().is_some());
        }

        let not_found = ApiError::from_backend(FakeBackendError(BackendReason::NotFound), "Org");
        assert_eq!(
            not_found.detail(),
            "Org not found. Ensure it exists and you have access to it."
        );
    }

    #[test]
    fn test_envelope_shape() {
        let json = serde_json::to_value(ApiError::message_parse().to_envelope()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "errors": [{
                    "title": "CF-MessageParseError",
                    "detail": "Request invalid due to parse error: invalid request body",
                    "code": 1001
                }]
            })
        );
    }

    fn any_error() -> impl Strategy<Value = ApiError> {
        let resource = "[A-Z][a-z]{2,10}";
        prop_oneof![
            Just(ApiError::unknown("boom")),
            Just(ApiError::invalid_auth_token()),
            Just(ApiError::not_authenticated()),
            resource.prop_map(|r| ApiError::forbidden(r)),
            resource.prop_map(|r| ApiError::not_found(r)),
            Just(ApiError::message_parse()),
            prop::collection::vec("[a-z_]{1,8}", 1..5).prop_map(|keys| ApiError::unknown_query_key(keys)),
            ".{0,40}".prop_map(|d| ApiError::unprocessable_entity(d)),
            Just(ApiError::backend_unavailable()),
        ]
    }

    proptest! {
        #[test]
        fn prop_envelope_round_trip(err in any_error()) {
            let json = serde_json::to_string(&err.to_envelope()).unwrap();
            let decoded: ErrorsResponse = serde_json::from_str(&json).unwrap();

            prop_assert_eq!(decoded.errors.len(), 1);
            let body = &decoded.errors[0];
            prop_assert_eq!(body.title.as_str(), err.kind().title());
            prop_assert_eq!(body.detail.as_str(), err.detail());
            prop_assert_eq!(body.code, err.kind().code());
            prop_assert_eq!(body.kind(), Some(err.kind()));
            prop_assert_eq!(body.kind().map(ErrorKind::status), Some(err.status()));
        }
    }
}
