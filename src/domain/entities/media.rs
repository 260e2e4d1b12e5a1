use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque identifier of a media item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaId(String);

impl MediaId {
    /// Creates a new identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MediaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MediaId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for MediaId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Category a media item is filed under.
///
/// The server either inlines the category name or embeds the category entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryRef {
    /// Inline category name.
    Name(String),
    /// Reference to a category entity.
    Entity {
        /// Category entity ID.
        id: String,
        /// Category display name.
        name: String,
    },
}

impl CategoryRef {
    /// Returns the category name regardless of representation.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) | Self::Entity { name, .. } => name,
        }
    }

    /// Returns true if this category is the one named `category`.
    #[must_use]
    pub fn matches(&self, category: &str) -> bool {
        self.name().trim() == category.trim()
    }
}

/// A single piece of content shown in the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    /// Unique identifier.
    pub id: MediaId,
    /// Creation time reported by the server, if any.
    pub created_at: Option<DateTime<Utc>>,
    /// Category the item is filed under.
    pub category: Option<CategoryRef>,
    /// Optional title.
    pub title: Option<String>,
    /// Full-size display URL.
    pub image_url: String,
    /// Thumbnail display URL.
    pub thumbnail_url: Option<String>,
    /// Set on items inserted locally right after upload.
    #[serde(skip)]
    pub recent_upload: bool,
}

impl MediaItem {
    /// Creates a new item with only the required fields.
    #[must_use]
    pub fn new(id: impl Into<MediaId>, image_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created_at: None,
            category: None,
            title: None,
            image_url: image_url.into(),
            thumbnail_url: None,
            recent_upload: false,
        }
    }

    #[must_use]
    pub const fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: CategoryRef) -> Self {
        self.category = Some(category);
        self
    }

    /// Flags the item as a local recent upload.
    #[must_use]
    pub const fn as_recent_upload(mut self) -> Self {
        self.recent_upload = true;
        self
    }

    /// Returns the category name, if any.
    #[must_use]
    pub fn category_name(&self) -> Option<&str> {
        self.category.as_ref().map(CategoryRef::name)
    }

    /// Returns true if the item belongs to `category`, or if no category is given.
    #[must_use]
    pub fn in_category(&self, category: Option<&str>) -> bool {
        match category {
            None => true,
            Some(wanted) => self.category.as_ref().is_some_and(|c| c.matches(wanted)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_ref_name() {
        let inline = CategoryRef::Name("Nature".to_string());
        let entity = CategoryRef::Entity {
            id: "c1".to_string(),
            name: "Travel".to_string(),
        };

        assert_eq!(inline.name(), "Nature");
        assert_eq!(entity.name(), "Travel");
        assert!(entity.matches(" Travel "));
    }

    #[test]
    fn test_in_category() {
        let item =
            MediaItem::new("a", "https://cdn/a.jpg").with_category(CategoryRef::Name("Nature".into()));
        let uncategorized = MediaItem::new("b", "https://cdn/b.jpg");

        assert!(item.in_category(None));
        assert!(item.in_category(Some("Nature")));
        assert!(!item.in_category(Some("Portrait")));
        assert!(uncategorized.in_category(None));
        assert!(!uncategorized.in_category(Some("Nature")));
    }

    #[test]
    fn test_category_ref_deserializes_both_shapes() {
        let inline: CategoryRef = serde_json::from_str(r#""Nature""#).unwrap();
        let entity: CategoryRef = serde_json::from_str(r#"{"id":"c1","name":"Travel"}"#).unwrap();

        assert_eq!(inline, CategoryRef::Name("Nature".to_string()));
        assert_eq!(entity.name(), "Travel");
    }
}
