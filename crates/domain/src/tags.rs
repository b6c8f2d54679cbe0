//! Tag keys, tag values, and the tag contexts recorded alongside measurements.

use kvscope_shared::{ErrorCode, ErrorEnvelope};
use serde::Serialize;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

/// Maximum length, in bytes, of a tag key or tag value.
pub const MAX_TAG_LENGTH: usize = 255;

/// Character substituted for anything outside printable ASCII.
const REPLACEMENT: char = '?';

/// Validation failures for tag keys and values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagError {
    /// Tag key is empty.
    EmptyKey,
    /// Tag key or value exceeds [`MAX_TAG_LENGTH`].
    TooLong {
        /// Byte length of the rejected input.
        length: usize,
    },
    /// Tag key or value contains a character outside printable ASCII.
    NonPrintable {
        /// Byte offset of the first offending character.
        position: usize,
    },
}

impl TagError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::EmptyKey => ErrorCode::new("domain", "empty_tag_key"),
            Self::TooLong { .. } => ErrorCode::new("domain", "tag_too_long"),
            Self::NonPrintable { .. } => ErrorCode::new("domain", "tag_not_printable"),
        }
    }
}

impl fmt::Display for TagError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyKey => formatter.write_str("TagKey must be non-empty"),
            Self::TooLong { .. } => write!(
                formatter,
                "tag keys and values must be at most {MAX_TAG_LENGTH} bytes"
            ),
            Self::NonPrintable { .. } => {
                formatter.write_str("tag keys and values must be printable ASCII")
            },
        }
    }
}

impl std::error::Error for TagError {}

impl From<TagError> for ErrorEnvelope {
    fn from(error: TagError) -> Self {
        let envelope = Self::expected(error.error_code(), error.to_string());
        match error {
            TagError::EmptyKey => envelope,
            TagError::TooLong { length } => envelope.with_metadata("length", length.to_string()),
            TagError::NonPrintable { position } => {
                envelope.with_metadata("position", position.to_string())
            },
        }
    }
}

fn validate_tag_text(input: &str) -> Result<(), TagError> {
    if input.len() > MAX_TAG_LENGTH {
        return Err(TagError::TooLong {
            length: input.len(),
        });
    }
    if let Some((position, _)) = input.char_indices().find(|(_, ch)| !is_printable(*ch)) {
        return Err(TagError::NonPrintable { position });
    }
    Ok(())
}

const fn is_printable(ch: char) -> bool {
    matches!(ch, ' '..='~')
}

/// Name of a tag dimension (e.g. `method`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TagKey(Cow<'static, str>);

impl TagKey {
    /// Method tag: the instrumented command identifier.
    pub const METHOD: Self = Self::from_static("method");
    /// Error tag: description of the recorded failure.
    pub const ERROR: Self = Self::from_static("error");
    /// Status tag: `OK` or `ERROR`.
    pub const STATUS: Self = Self::from_static("status");
    /// Direction tag (`type`), a view column never populated by tracking.
    pub const DIRECTION: Self = Self::from_static("type");

    const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Parse and validate a tag key.
    pub fn parse(input: impl Into<String>) -> Result<Self, TagError> {
        let input = input.into();
        if input.is_empty() {
            return Err(TagError::EmptyKey);
        }
        validate_tag_text(&input)?;
        Ok(Self(Cow::Owned(input)))
    }

    /// Borrow the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TagKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for TagKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Value of a tag dimension.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TagValue(Cow<'static, str>);

impl TagValue {
    /// Status value for calls that completed without a recorded error.
    pub const OK: Self = Self(Cow::Borrowed("OK"));
    /// Status value for calls that recorded an error.
    pub const ERROR: Self = Self(Cow::Borrowed("ERROR"));

    /// Parse and validate a tag value. Empty values are allowed.
    pub fn parse(input: impl Into<String>) -> Result<Self, TagError> {
        let input = input.into();
        validate_tag_text(&input)?;
        Ok(Self(Cow::Owned(input)))
    }

    /// Build a tag value from arbitrary text.
    ///
    /// Characters outside printable ASCII become `?` and the result is cut to
    /// [`MAX_TAG_LENGTH`] bytes. Used for values derived at call time, such as
    /// error descriptions, which must never make recording fail.
    #[must_use]
    pub fn sanitize(input: &str) -> Self {
        let sanitized: String = input
            .chars()
            .take(MAX_TAG_LENGTH)
            .map(|ch| if is_printable(ch) { ch } else { REPLACEMENT })
            .collect();
        Self(Cow::Owned(sanitized))
    }

    /// Borrow the value as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TagValue {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Immutable set of tags attached to one recording.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TagContext {
    tags: BTreeMap<TagKey, TagValue>,
}

impl TagContext {
    /// Empty context.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            tags: BTreeMap::new(),
        }
    }

    /// Look up the value for a key.
    #[must_use]
    pub fn get(&self, key: &TagKey) -> Option<&TagValue> {
        self.tags.get(key)
    }

    /// Returns true when the key is present.
    #[must_use]
    pub fn contains(&self, key: &TagKey) -> bool {
        self.tags.contains_key(key)
    }

    /// Number of tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Returns true when no tags are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Iterate tags in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&TagKey, &TagValue)> {
        self.tags.iter()
    }
}

impl FromIterator<(TagKey, TagValue)> for TagContext {
    fn from_iter<I: IntoIterator<Item = (TagKey, TagValue)>>(iter: I) -> Self {
        Self {
            tags: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn well_known_keys_match_wire_names() {
        assert_eq!(TagKey::METHOD.as_str(), "method");
        assert_eq!(TagKey::ERROR.as_str(), "error");
        assert_eq!(TagKey::STATUS.as_str(), "status");
        assert_eq!(TagKey::DIRECTION.as_str(), "type");
        assert_eq!(TagValue::OK.as_str(), "OK");
        assert_eq!(TagValue::ERROR.as_str(), "ERROR");
    }

    #[test]
    fn parsed_key_equals_constant() -> Result<(), TagError> {
        assert_eq!(TagKey::parse("method")?, TagKey::METHOD);
        Ok(())
    }

    #[test]
    fn invalid_keys_are_rejected() {
        assert_eq!(TagKey::parse(""), Err(TagError::EmptyKey));
        assert_eq!(
            TagKey::parse("a\tb"),
            Err(TagError::NonPrintable { position: 1 })
        );
        assert_eq!(
            TagValue::parse("x".repeat(256)),
            Err(TagError::TooLong { length: 256 })
        );
    }

    #[test]
    fn sanitize_replaces_control_characters() {
        let value = TagValue::sanitize("line one\nline two\u{e9}");
        assert_eq!(value.as_str(), "line one?line two?");
    }

    #[test]
    fn context_lookup_and_order() -> Result<(), TagError> {
        let context: TagContext = [
            (TagKey::STATUS, TagValue::OK),
            (TagKey::METHOD, TagValue::parse("llen")?),
        ]
        .into_iter()
        .collect();

        assert_eq!(context.len(), 2);
        assert_eq!(context.get(&TagKey::STATUS), Some(&TagValue::OK));
        assert!(!context.contains(&TagKey::ERROR));
        let keys: Vec<&str> = context.iter().map(|(key, _)| key.as_str()).collect();
        assert_eq!(keys, vec!["method", "status"]);
        Ok(())
    }

    #[test]
    fn tag_errors_map_into_envelopes() {
        let envelope: ErrorEnvelope = TagError::NonPrintable { position: 3 }.into();
        assert_eq!(envelope.code, ErrorCode::new("domain", "tag_not_printable"));
        assert_eq!(
            envelope.metadata.get("position").map(String::as_str),
            Some("3")
        );
    }

    proptest! {
        #[test]
        fn sanitized_values_always_parse(input in any::<String>()) {
            let sanitized = TagValue::sanitize(&input);
            prop_assert!(sanitized.as_str().len() <= MAX_TAG_LENGTH);
            prop_assert!(TagValue::parse(sanitized.as_str()).is_ok());
        }

        #[test]
        fn sanitize_keeps_printable_input(input in "[ -~]{0,255}") {
            let sanitized = TagValue::sanitize(&input);
            prop_assert_eq!(sanitized.as_str(), input.as_str());
        }
    }
}
