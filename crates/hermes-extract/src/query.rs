//! Query-string payloads.
//!
//! A query payload declares which keys it understands. Anything else in the
//! query string is rejected unless it matches one of the payload's ignored
//! key patterns (`fields[apps]`, for instance).

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

/// A payload decoded from the URL query.
///
/// The default [`KeyedPayload::decode_from_query`] hands the supported
/// pairs to `serde_urlencoded`, so most payloads only derive `Deserialize`
/// and list their keys.
///
/// # Example
///
/// ```
/// use hermes_extract::{comma_separated, KeyedPayload};
/// use serde::Deserialize;
///
/// #[derive(Debug, Default, Deserialize, PartialEq)]
/// struct AppList {
///     #[serde(default, deserialize_with = "comma_separated")]
///     names: Vec<String>,
///     #[serde(default, deserialize_with = "comma_separated")]
///     space_guids: Vec<String>,
/// }
///
/// impl KeyedPayload for AppList {
///     fn supported_keys() -> &'static [&'static str] {
///         &["names", "space_guids"]
///     }
///
///     fn ignored_keys() -> &'static [&'static str] {
///         &[r"^fields\[.+\]$"]
///     }
/// }
/// ```
pub trait KeyedPayload: DeserializeOwned {
    /// Keys this payload understands.
    fn supported_keys() -> &'static [&'static str];

    /// Regex patterns for keys that are accepted but not decoded.
    fn ignored_keys() -> &'static [&'static str] {
        &[]
    }

    /// Builds the payload from the supported pairs.
    fn decode_from_query(values: &QueryValues) -> Result<Self, serde_urlencoded::de::Error> {
        let encoded = serde_urlencoded::to_string(values.pairs())
            .map_err(|e| <serde_urlencoded::de::Error as serde::de::Error>::custom(e))?;
        serde_urlencoded::from_str(&encoded)
    }
}

/// Ordered query pairs, repeated keys allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryValues {
    pairs: Vec<(String, String)>,
}

impl QueryValues {
    /// Parses a raw query string (without the leading `?`).
    pub fn parse(query: &str) -> Result<Self, serde_urlencoded::de::Error> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query)?;
        Ok(Self { pairs })
    }

    /// Keeps only the pairs whose key satisfies `keep`.
    #[must_use]
    pub fn retain_keys(mut self, keep: impl Fn(&str) -> bool) -> Self {
        self.pairs.retain(|(key, _)| keep(key));
        self
    }

    /// All pairs in order.
    #[must_use]
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Distinct keys in first-seen order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        let mut seen = Vec::new();
        self.pairs.iter().filter_map(move |(key, _)| {
            if seen.contains(&key) {
                None
            } else {
                seen.push(key);
                Some(key.as_str())
            }
        })
    }

    /// First value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if there are no pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Deserializes `a,b,,c` into `["a", "b", "c"]`.
///
/// Use with `#[serde(default, deserialize_with = "comma_separated")]` for
/// list filters such as `names` or `guids`.
pub fn comma_separated<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(raw
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(ToString::to_string)
        .collect())
}
