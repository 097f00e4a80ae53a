use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;
use thiserror::Error;

/// Identifier of a content category, e.g. `words` or `public-speaking`.
///
/// Always a non-empty lowercase slug, so it can be used verbatim as a path
/// segment in content resource paths.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CategoryId(String);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CategoryIdError {
    #[error("category id cannot be empty")]
    Empty,

    #[error("category id contains invalid character {0:?}")]
    InvalidChar(char),
}

impl CategoryId {
    /// Creates a new `CategoryId`.
    ///
    /// # Errors
    ///
    /// Returns `CategoryIdError` if the id is empty or is not a lowercase slug.
    pub fn new(id: impl Into<String>) -> Result<Self, CategoryIdError> {
        let id = id.into();
        let id = id.trim();
        if id.is_empty() {
            return Err(CategoryIdError::Empty);
        }
        if let Some(bad) = id
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-' || *c == '_'))
        {
            return Err(CategoryIdError::InvalidChar(bad));
        }
        Ok(Self(id.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CategoryId {
    type Error = CategoryIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CategoryId> for String {
    fn from(value: CategoryId) -> Self {
        value.0
    }
}

impl FromStr for CategoryId {
    type Err = CategoryIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for CategoryId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Identifier of a single content item within its category.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(u64);

impl ContentId {
    /// Creates a new `ContentId`
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying u64 value
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// A 1-based page number.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct PageNumber(NonZeroU32);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("page numbers start at 1")]
pub struct PageNumberError;

impl PageNumber {
    pub const FIRST: PageNumber = PageNumber(NonZeroU32::MIN);

    /// Creates a new `PageNumber`.
    ///
    /// # Errors
    ///
    /// Returns `PageNumberError` for page zero.
    pub fn new(page: u32) -> Result<Self, PageNumberError> {
        NonZeroU32::new(page).map(Self).ok_or(PageNumberError)
    }

    #[must_use]
    pub fn get(self) -> u32 {
        self.0.get()
    }

    /// The following page, saturating at `u32::MAX`.
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// The preceding page, or `None` on the first page.
    #[must_use]
    pub fn previous(self) -> Option<Self> {
        NonZeroU32::new(self.0.get() - 1).map(Self)
    }
}

impl Default for PageNumber {
    fn default() -> Self {
        Self::FIRST
    }
}

impl TryFrom<u32> for PageNumber {
    type Error = PageNumberError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PageNumber> for u32 {
    fn from(value: PageNumber) -> Self {
        value.get()
    }
}

impl FromStr for PageNumber {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u32>()
            .ok()
            .and_then(|page| PageNumber::new(page).ok())
            .ok_or_else(|| ParseIdError {
                kind: "PageNumber".to_string(),
            })
    }
}

impl fmt::Debug for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CategoryId({})", self.0)
    }
}

impl fmt::Debug for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentId({})", self.0)
    }
}

impl fmt::Debug for PageNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PageNumber({})", self.0)
    }
}

// ─── Display Implementations ───────────────────────────────────────────────────

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for PageNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─── FromStr Implementations ───────────────────────────────────────────────────

/// Error type for parsing ID from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

impl FromStr for ContentId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>()
            .map(ContentId::new)
            .map_err(|_| ParseIdError {
                kind: "ContentId".to_string(),
            })
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_id_accepts_slugs() {
        let id = CategoryId::new("public-speaking").unwrap();
        assert_eq!(id.as_str(), "public-speaking");
        assert_eq!(id.to_string(), "public-speaking");
    }

    #[test]
    fn category_id_rejects_empty_and_paths() {
        assert_eq!(CategoryId::new("  ").unwrap_err(), CategoryIdError::Empty);
        assert_eq!(
            CategoryId::new("../etc").unwrap_err(),
            CategoryIdError::InvalidChar('.')
        );
        assert_eq!(
            CategoryId::new("Words").unwrap_err(),
            CategoryIdError::InvalidChar('W')
        );
    }

    #[test]
    fn content_id_from_str() {
        let id: ContentId = "123".parse().unwrap();
        assert_eq!(id, ContentId::new(123));
        assert!("seven".parse::<ContentId>().is_err());
    }

    #[test]
    fn page_number_rejects_zero() {
        assert_eq!(PageNumber::new(0).unwrap_err(), PageNumberError);
        assert!("0".parse::<PageNumber>().is_err());
        assert_eq!("4".parse::<PageNumber>().unwrap().get(), 4);
    }

    #[test]
    fn page_number_steps() {
        let first = PageNumber::FIRST;
        assert_eq!(first.previous(), None);
        assert_eq!(first.next().get(), 2);
        assert_eq!(first.next().previous(), Some(first));
    }

    #[test]
    fn page_number_serde_rejects_zero() {
        assert!(serde_json::from_str::<PageNumber>("0").is_err());
        let page: PageNumber = serde_json::from_str("5").unwrap();
        assert_eq!(serde_json::to_string(&page).unwrap(), "5");
    }
}
