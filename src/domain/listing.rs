//! Validated listing parameters for the store catalog and the user directory.
//!
//! Query strings arrive as loose optional strings; these types are what the
//! repositories accept, with unknown sort fields falling back to the default.

use super::{PageRequest, Role, SortOrder, UserId};

/// Columns the store listing can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreSortField {
    #[default]
    Name,
    Location,
    ContactEmail,
    OwnerName,
    AverageRating,
}

impl StoreSortField {
    #[must_use]
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("location") => Self::Location,
            Some("contact_email" | "email") => Self::ContactEmail,
            Some("owner_name") => Self::OwnerName,
            Some("average_rating" | "rating") => Self::AverageRating,
            _ => Self::Name,
        }
    }

    /// Name of the result column the listing query orders by.
    #[must_use]
    pub const fn column_alias(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Location => "location",
            Self::ContactEmail => "contact_email",
            Self::OwnerName => "owner_name",
            Self::AverageRating => "average_rating",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreQuery {
    /// Substring matched against name, location and contact email.
    pub search: Option<String>,
    pub owner_id: Option<UserId>,
    pub sort: StoreSortField,
    pub order: SortOrder,
    pub page: PageRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserSortField {
    #[default]
    Name,
    Email,
    Address,
    Role,
}

impl UserSortField {
    #[must_use]
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("email") => Self::Email,
            Some("address") => Self::Address,
            Some("role") => Self::Role,
            _ => Self::Name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserQuery {
    pub role: Option<Role>,
    /// Substring matched against name, email and address.
    pub search: Option<String>,
    pub sort: UserSortField,
    pub order: SortOrder,
    pub page: PageRequest,
}

/// Trims a search term and drops it when empty.
#[must_use]
pub fn normalize_search(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
