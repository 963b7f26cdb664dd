//! # Hermes Extract
//!
//! Turns raw request input into typed, validated payloads.
//!
//! | Input | Entry point | Payload bound |
//! |-------|-------------|---------------|
//! | JSON body | [`DecoderValidator::decode_and_validate_json`] | `DeserializeOwned + Validate` |
//! | Query string | [`DecoderValidator::decode_and_validate_query`] | [`KeyedPayload`] `+ Validate` |
//!
//! Every failure comes back as a [`hermes_core::ApiError`] the handler can
//! return with `?`.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod decoder;
mod query;
mod validate;

pub use decoder::{json_error, DecoderValidator, DEFAULT_MAX_BODY_SIZE};
pub use query::{comma_separated, KeyedPayload, QueryValues};
pub use validate::{Validate, ValidationErrors, DETAIL_SEPARATOR};
