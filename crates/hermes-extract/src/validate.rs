//! Payload-level validation.
//!
//! Decoding only proves the input has the right shape. [`Validate`] runs the
//! payload's own rules afterwards, and every violation is collected into a
//! single [`ValidationErrors`] so the client gets one response listing all
//! of them.

use hermes_core::ApiError;

/// Rules a decoded payload must satisfy.
///
/// The default accepts everything, so payloads without rules can opt in
/// with an empty `impl Validate for T {}`.
///
/// # Example
///
/// ```
/// use hermes_extract::{Validate, ValidationErrors};
///
/// struct ScaleProcess {
///     instances: i64,
/// }
///
/// impl Validate for ScaleProcess {
///     fn validate(&self) -> Result<(), ValidationErrors> {
///         let mut errors = ValidationErrors::new();
///         errors.check(self.instances >= 0, "Instances must be greater than or equal to 0");
///         errors.into_result()
///     }
/// }
///
/// let err = ScaleProcess { instances: -1 }.validate().unwrap_err();
/// assert_eq!(err.to_detail(), "Instances must be greater than or equal to 0");
/// ```
pub trait Validate {
    /// Checks the payload, reporting every violation found.
    fn validate(&self) -> Result<(), ValidationErrors> {
        Ok(())
    }
}

/// Violations collected while validating one payload.
///
/// Displays as the combined detail, see [`ValidationErrors::to_detail`].
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("{}", self.to_detail())]
pub struct ValidationErrors {
    messages: Vec<String>,
}

/// Separator between messages in the combined detail.
pub const DETAIL_SEPARATOR: &str = ", ";

impl ValidationErrors {
    /// No violations yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a violation.
    pub fn push(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    /// Records `message` unless `ok` holds.
    pub fn check(&mut self, ok: bool, message: impl Into<String>) {
        if !ok {
            self.push(message);
        }
    }

    /// Records the violations of a nested payload under `prefix`.
    ///
    /// A nested `space must be provided` under `relationships` becomes
    /// `relationships.space must be provided`.
    pub fn nest(&mut self, prefix: &str, nested: Result<(), Self>) {
        if let Err(nested) = nested {
            self.messages.extend(
                nested
                    .messages
                    .into_iter()
                    .map(|message| format!("{prefix}.{message}")),
            );
        }
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Recorded messages in insertion order.
    #[must_use]
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// `Ok` if empty, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Messages sorted and joined with `", "`.
    #[must_use]
    pub fn to_detail(&self) -> String {
        let mut messages: Vec<&str> = self.messages.iter().map(String::as_str).collect();
        messages.sort_unstable();
        messages.join(DETAIL_SEPARATOR)
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        Self::unprocessable_entity(errors.to_detail())
    }
}
