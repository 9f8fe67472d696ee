use serde::{Deserialize, Serialize};

use crate::db::{OwnerRatingRow, StoreRatingRow, StoreSummary, User};
use crate::domain::{AverageRating, Paged, Role};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub address: String,
    pub role: Role,
    pub created_at: String,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id.value(),
            name: user.name,
            email: user.email,
            address: user.address,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StoreDto {
    pub id: i32,
    pub name: String,
    pub location: String,
    pub contact_email: String,
    pub owner_id: Option<i32>,
    pub owner_name: Option<String>,
    /// One decimal place, or "N/A" when nobody rated the store.
    pub average_rating: String,
    pub rating_count: u64,
    /// The caller's own rating; null when anonymous or not yet rated.
    pub user_submitted_rating: Option<u8>,
}

impl From<StoreSummary> for StoreDto {
    fn from(store: StoreSummary) -> Self {
        Self {
            id: store.id.value(),
            name: store.name,
            location: store.location,
            contact_email: store.contact_email,
            owner_id: store.owner_id.map(|id| id.value()),
            owner_name: store.owner_name,
            average_rating: store.average.display(),
            rating_count: store.average.count(),
            user_submitted_rating: store.user_rating.map(|v| v.get()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PagedResponse<T> {
    pub items: Vec<T>,
    pub total_items: u64,
    pub total_pages: u64,
    pub current_page: u64,
}

impl<T> PagedResponse<T> {
    pub fn from_paged<U>(paged: Paged<U>) -> Self
    where
        T: From<U>,
    {
        let paged = paged.map(T::from);
        Self {
            items: paged.items,
            total_items: paged.total_items,
            total_pages: paged.total_pages,
            current_page: paged.current_page,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RatingDto {
    pub id: i32,
    pub user_id: i32,
    pub user_name: String,
    pub user_email: String,
    pub rating: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl From<StoreRatingRow> for RatingDto {
    fn from(row: StoreRatingRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            user_name: row.user_name,
            user_email: row.user_email,
            rating: row.rating,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OwnerRatingDto {
    pub id: i32,
    pub store_id: i32,
    pub store_name: String,
    pub user_id: i32,
    pub user_name: String,
    pub user_email: String,
    pub rating: i32,
    pub submitted_at: String,
}

impl From<OwnerRatingRow> for OwnerRatingDto {
    fn from(row: OwnerRatingRow) -> Self {
        Self {
            id: row.id,
            store_id: row.store_id,
            store_name: row.store_name,
            user_id: row.user_id,
            user_name: row.user_name,
            user_email: row.user_email,
            rating: row.rating,
            submitted_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AverageRatingDto {
    pub store_id: i32,
    pub average_rating: String,
    pub rating_count: u64,
}

impl AverageRatingDto {
    #[must_use]
    pub fn new(store_id: i32, average: AverageRating) -> Self {
        Self {
            store_id,
            average_rating: average.display(),
            rating_count: average.count(),
        }
    }
}

/// Loosely typed listing parameters; unknown sort values fall back to the
/// defaults rather than failing the request.
#[derive(Debug, Default, Deserialize)]
pub struct StoreListParams {
    pub search: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
    #[serde(alias = "ownerId")]
    pub owner_id: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserListParams {
    pub role: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}
