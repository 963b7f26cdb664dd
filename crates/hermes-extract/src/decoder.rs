//! The decoder/validator handlers call to read their input.

use std::collections::HashMap;

use hermes_core::{ApiError, Request};
use parking_lot::RwLock;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::error::Category;

use crate::query::{KeyedPayload, QueryValues};
use crate::validate::Validate;

/// Default maximum body size (1 MB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// Decodes request bodies and queries into typed payloads and validates them.
///
/// Failures are always one of three taxonomy members:
///
/// - the body is not JSON at all: [`hermes_core::ErrorKind::MessageParse`] (400)
/// - the body is JSON but has unknown fields or wrong types, or the payload
///   breaks its own rules: [`hermes_core::ErrorKind::UnprocessableEntity`] (422)
/// - the query has an unsupported key: [`hermes_core::ErrorKind::UnknownQueryKey`] (400)
///
/// Body payloads should derive `Deserialize` with
/// `#[serde(deny_unknown_fields)]`; that is what makes unknown fields an
/// error rather than silently dropped.
///
/// One instance is shared by all handlers; compiled ignored-key patterns
/// are cached on it.
///
/// # Example
///
/// ```
/// use hermes_extract::{DecoderValidator, Validate};
/// use hermes_core::ErrorKind;
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize)]
/// #[serde(deny_unknown_fields)]
/// struct SpaceCreate {
///     name: String,
/// }
///
/// impl Validate for SpaceCreate {}
///
/// let decoder = DecoderValidator::new();
///
/// let space: SpaceCreate = decoder.decode_and_validate_json(br#"{"name":"dev"}"#).unwrap();
/// assert_eq!(space.name, "dev");
///
/// let err = decoder
///     .decode_and_validate_json::<SpaceCreate>(br#"{"name":"dev","color":"red"}"#)
///     .unwrap_err();
/// assert_eq!(err.kind(), ErrorKind::UnprocessableEntity);
/// assert_eq!(err.detail(), r#"invalid request body: json: unknown field "color""#);
/// ```
#[derive(Debug)]
pub struct DecoderValidator {
    max_body_size: usize,
    patterns: RwLock<HashMap<&'static str, Regex>>,
}

impl Default for DecoderValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl DecoderValidator {
    /// A decoder with the default body limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_body_size(DEFAULT_MAX_BODY_SIZE)
    }

    /// A decoder rejecting bodies over `max_body_size` bytes.
    #[must_use]
    pub fn with_max_body_size(max_body_size: usize) -> Self {
        Self {
            max_body_size,
            patterns: RwLock::new(HashMap::new()),
        }
    }

    /// Decodes a JSON body and validates it.
    pub fn decode_and_validate_json<T>(&self, body: &[u8]) -> Result<T, ApiError>
    where
        T: DeserializeOwned + Validate,
    {
        if body.len() > self.max_body_size {
            return Err(ApiError::message_parse().with_cause(format!(
                "request body of {} bytes exceeds the {} byte limit",
                body.len(),
                self.max_body_size
            )));
        }

        let mut deserializer = serde_json::Deserializer::from_slice(body);
        let payload: T = serde_path_to_error::deserialize(&mut deserializer).map_err(|err| {
            let path = err.path().to_string();
            field_error(err.into_inner(), &path)
        })?;
        deserializer.end().map_err(json_error)?;
        payload.validate()?;
        Ok(payload)
    }

    /// Decodes the request's JSON body and validates it.
    pub fn decode_and_validate_json_request<T>(&self, request: &Request) -> Result<T, ApiError>
    where
        T: DeserializeOwned + Validate,
    {
        self.decode_and_validate_json(request.body())
    }

    /// Decodes a raw query string (without `?`) and validates it.
    pub fn decode_and_validate_query<T>(&self, query: &str) -> Result<T, ApiError>
    where
        T: KeyedPayload + Validate,
    {
        let values = QueryValues::parse(query).map_err(|e| ApiError::message_parse().with_cause(e))?;
        let ignored = self.ignored_patterns(T::ignored_keys())?;

        let is_ignored = |key: &str| ignored.iter().any(|pattern| pattern.is_match(key));
        if let Some(unknown) = values
            .keys()
            .find(|&key| !is_supported::<T>(key) && !is_ignored(key))
        {
            tracing::debug!(key = unknown, "rejecting unsupported query key");
            return Err(ApiError::unknown_query_key(T::supported_keys()));
        }

        let values = values.retain_keys(is_supported::<T>);
        let payload =
            T::decode_from_query(&values).map_err(|e| ApiError::message_parse().with_cause(e))?;
        payload.validate()?;
        Ok(payload)
    }

    /// Decodes the request's query and validates it.
    pub fn decode_and_validate_query_request<T>(&self, request: &Request) -> Result<T, ApiError>
    where
        T: KeyedPayload + Validate,
    {
        self.decode_and_validate_query(request.uri().query().unwrap_or_default())
    }

    fn ignored_patterns(&self, patterns: &'static [&'static str]) -> Result<Vec<Regex>, ApiError> {
        {
            let cache = self.patterns.read();
            if patterns.iter().all(|p| cache.contains_key(p)) {
                return Ok(patterns.iter().filter_map(|p| cache.get(p).cloned()).collect());
            }
        }

        let mut cache = self.patterns.write();
        let mut compiled = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            let regex = match cache.get(pattern) {
                Some(regex) => regex.clone(),
                None => {
                    let regex = Regex::new(pattern).map_err(|e| {
                        ApiError::unknown(e).context(format!("ignored query key pattern {pattern}"))
                    })?;
                    cache.insert(*pattern, regex.clone());
                    regex
                }
            };
            compiled.push(regex);
        }
        Ok(compiled)
    }
}

fn is_supported<T: KeyedPayload>(key: &str) -> bool {
    T::supported_keys().iter().any(|supported| *supported == key)
}

/// Maps a `serde_json` failure onto the taxonomy.
///
/// Syntax errors and truncated input are parse errors. Data errors (unknown
/// fields, type mismatches, missing fields) are unprocessable entities whose
/// detail names the problem without the line and column.
pub fn json_error(err: serde_json::Error) -> ApiError {
    field_error(err, ".")
}

/// Like [`json_error`], naming the field at `path` when a value has the
/// wrong type: `Memory_in_mb must be a integer`.
fn field_error(err: serde_json::Error, path: &str) -> ApiError {
    match err.classify() {
        Category::Syntax | Category::Eof | Category::Io => ApiError::message_parse().with_cause(err),
        Category::Data => {
            let message = data_error_message(&err);
            let detail = if let Some(field) = unknown_field_name(&message) {
                format!("invalid request body: json: unknown field \"{field}\"")
            } else if let Some(expected) = mismatched_type(&message).filter(|_| path != ".") {
                format!("{} must be a {}", capitalize(path), type_name(expected))
            } else {
                format!("invalid request body: {message}")
            };
            ApiError::unprocessable_entity(detail).with_cause(err)
        }
    }
}

fn data_error_message(err: &serde_json::Error) -> String {
    let full = err.to_string();
    let position = format!(" at line {} column {}", err.line(), err.column());
    match full.strip_suffix(&position) {
        Some(message) => message.to_string(),
        None => full,
    }
}

// serde reports "unknown field `name`, expected one of ..."
fn unknown_field_name(message: &str) -> Option<&str> {
    let rest = message.strip_prefix("unknown field `")?;
    rest.split_once('`').map(|(field, _)| field)
}

// serde reports "invalid type: string \"x\", expected i64"
fn mismatched_type(message: &str) -> Option<&str> {
    if !message.starts_with("invalid type: ") {
        return None;
    }
    message.rsplit_once(", expected ").map(|(_, expected)| expected)
}

fn type_name(expected: &str) -> &str {
    match expected {
        "i8" | "i16" | "i32" | "i64" | "i128" | "u8" | "u16" | "u32" | "u64" | "u128" => "integer",
        "f32" | "f64" => "number",
        "a boolean" => "boolean",
        "a string" | "a borrowed string" | "a character" => "string",
        "a sequence" => "array",
        "a map" => "object",
        other if other.starts_with("struct ") => "object",
        other => other.strip_prefix("a ").or_else(|| other.strip_prefix("an ")).unwrap_or(other),
    }
}

fn capitalize(path: &str) -> String {
    let mut chars = path.chars();
    chars
        .next()
        .map(|first| first.to_uppercase().chain(chars).collect())
        .unwrap_or_default()
}
