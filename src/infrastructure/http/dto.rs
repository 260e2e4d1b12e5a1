//! Wire shapes of the `/images` endpoint.
//!
//! The endpoint has answered with several shapes over time. Everything is
//! decoded into one [`FeedPage`] here so nothing past the adapter sees them.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::entities::{CategoryRef, FeedPage, MediaItem, Pagination};

/// Body of a successful `/images` response.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ImagesResponse {
    /// Bare array of items, without pagination.
    List(Vec<ImageDto>),
    /// Object carrying items and optional pagination.
    Paged {
        #[serde(alias = "data")]
        images: Vec<ImageDto>,
        #[serde(default)]
        pagination: Option<PaginationDto>,
    },
}

/// One media item as sent by the server.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageDto {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default, alias = "url")]
    pub image_url: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub category: Option<CategoryDto>,
}

/// Category either inlined by name or populated as an object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CategoryDto {
    Name(String),
    Entity {
        #[serde(alias = "_id")]
        id: String,
        #[serde(default)]
        name: String,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationDto {
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub total: u64,
    #[serde(default, alias = "totalPages")]
    pub pages: u32,
}

const fn first_page() -> u32 {
    1
}

/// Error body returned with non-2xx statuses.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorResponse {
    /// The most specific message the server gave, if any.
    #[must_use]
    pub fn into_message(self) -> Option<String> {
        self.message.or(self.error).filter(|m| !m.trim().is_empty())
    }
}

impl From<CategoryDto> for CategoryRef {
    fn from(dto: CategoryDto) -> Self {
        match dto {
            CategoryDto::Name(name) => Self::Name(name),
            CategoryDto::Entity { id, name } => Self::Entity { id, name },
        }
    }
}

impl From<ImageDto> for MediaItem {
    fn from(dto: ImageDto) -> Self {
        Self {
            id: dto.id.into(),
            created_at: dto.created_at,
            category: dto.category.map(CategoryRef::from),
            title: dto.title,
            image_url: dto.image_url,
            thumbnail_url: dto.thumbnail_url,
            recent_upload: false,
        }
    }
}

impl From<PaginationDto> for Pagination {
    fn from(dto: PaginationDto) -> Self {
        Self::new(dto.page, dto.limit, dto.total, dto.pages)
    }
}

impl From<ImagesResponse> for FeedPage {
    fn from(response: ImagesResponse) -> Self {
        let (images, pagination) = match response {
            ImagesResponse::List(images) => (images, None),
            ImagesResponse::Paged { images, pagination } => (images, pagination),
        };
        Self::new(
            images.into_iter().map(MediaItem::from).collect(),
            pagination.map(Pagination::from),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(body: &str) -> FeedPage {
        serde_json::from_str::<ImagesResponse>(body).unwrap().into()
    }

    #[test]
    fn test_bare_array_has_no_pagination() {
        let page = decode(
            r#"[
                {"_id": "a1", "imageUrl": "https://cdn/a1.jpg", "category": "Nature"},
                {"_id": "b2", "imageUrl": "https://cdn/b2.jpg"}
            ]"#,
        );

        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].category_name(), Some("Nature"));
        assert!(page.pagination.is_none());
    }

    #[test]
    fn test_paged_object_with_populated_category() {
        let page = decode(
            r#"{
                "images": [{
                    "_id": "a1",
                    "imageUrl": "https://cdn/a1.jpg",
                    "thumbnailUrl": "https://cdn/a1_t.jpg",
                    "title": "Lake",
                    "createdAt": "2025-06-01T11:55:00.000Z",
                    "category": {"_id": "c9", "name": "Travel"}
                }],
                "pagination": {"page": 2, "limit": 20, "total": 41, "pages": 3}
            }"#,
        );

        let item = &page.items[0];
        assert_eq!(item.id.as_str(), "a1");
        assert_eq!(
            item.category,
            Some(CategoryRef::Entity {
                id: "c9".to_string(),
                name: "Travel".to_string()
            })
        );
        assert!(item.created_at.is_some());
        assert!(!item.recent_upload);
        assert_eq!(page.pagination, Some(Pagination::new(2, 20, 41, 3)));
    }

    #[test]
    fn test_paged_object_without_pagination() {
        let page = decode(r#"{"images": []}"#);
        assert!(page.items.is_empty());
        assert!(page.pagination.is_none());
    }

    #[test]
    fn test_total_pages_alias() {
        let page = decode(r#"{"images": [], "pagination": {"page": 1, "limit": 10, "total": 5, "totalPages": 1}}"#);
        assert_eq!(page.pagination.map(|p| p.pages), Some(1));
    }

    #[test]
    fn test_unrecognised_body_is_rejected() {
        assert!(serde_json::from_str::<ImagesResponse>(r#"{"items": 3}"#).is_err());
    }

    #[test]
    fn test_error_message_prefers_message_field() {
        let body: ErrorResponse = serde_json::from_str(r#"{"error": "bad", "message": "Invalid page"}"#).unwrap();
        assert_eq!(body.into_message().as_deref(), Some("Invalid page"));

        let body: ErrorResponse = serde_json::from_str(r#"{"error": "bad"}"#).unwrap();
        assert_eq!(body.into_message().as_deref(), Some("bad"));
    }
}
