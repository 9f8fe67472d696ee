//! Domain types for the rating service with strong typing.
//!
//! Newtype identifiers keep user, store and rating ids from being mixed up,
//! and the submodules hold the pure role and rating rules that the services
//! build on.

pub mod listing;
pub mod rating;
pub mod role;
pub mod validation;

pub use listing::{StoreQuery, StoreSortField, UserQuery, UserSortField};
pub use rating::{AverageRating, InvalidRating, RatingOutcome, RatingValue};
pub use role::{
    Access, Role, RoleAction, RoleDenied, RoleTransition, UnknownRole, UpgradePolicy, authorize,
    reconcile_role,
};
pub use validation::InvalidField;

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            #[must_use]
            pub const fn value(&self) -> i32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self::new(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

entity_id!(
    /// Identifier of a registered user.
    UserId
);

entity_id!(
    /// Identifier of a store in the catalog.
    StoreId
);

entity_id!(
    /// Identifier of a single rating row.
    RatingId
);

/// Sort order enumeration to replace boolean blindness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    #[serde(alias = "ASC", alias = "Asc")]
    Asc,
    #[serde(alias = "DESC", alias = "Desc")]
    Desc,
}

impl SortOrder {
    #[must_use]
    pub const fn is_ascending(&self) -> bool {
        matches!(self, Self::Asc)
    }

    /// Parses a loosely-typed order parameter, falling back to ascending.
    #[must_use]
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("desc") => Self::Desc,
            _ => Self::Asc,
        }
    }
}

const MAX_OFFSET: u64 = i64::MAX.unsigned_abs();

/// One-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl PageRequest {
    /// Builds a page request, clamping the page to at least 1 and the limit
    /// to `1..=max_limit`.
    #[must_use]
    pub fn new(page: Option<u64>, limit: Option<u64>, default_limit: u64, max_limit: u64) -> Self {
        let max_limit = max_limit.max(1);
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(default_limit).clamp(1, max_limit),
        }
    }

    /// Row offset of the page. Saturates at the largest offset SQLite can
    /// bind, so an absurd page number yields an empty page.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        let offset = (self.page - 1).saturating_mul(self.limit);
        if offset > MAX_OFFSET { MAX_OFFSET } else { offset }
    }

    #[must_use]
    pub const fn total_pages(&self, total_items: u64) -> u64 {
        total_items.div_ceil(self.limit)
    }
}

/// A page of results along with the totals the listing endpoints report.
#[derive(Debug, Clone, Serialize)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total_items: u64,
    pub total_pages: u64,
    pub current_page: u64,
}

impl<T> Paged<T> {
    #[must_use]
    pub fn new(items: Vec<T>, total_items: u64, request: PageRequest) -> Self {
        Self {
            items,
            total_items,
            total_pages: request.total_pages(total_items),
            current_page: request.page,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paged<U> {
        Paged {
            items: self.items.into_iter().map(f).collect(),
            total_items: self.total_items,
            total_pages: self.total_pages,
            current_page: self.current_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_convert_and_display() {
        let id = StoreId::new(42);
        assert_eq!(id.value(), 42);
        assert_eq!(id.to_string(), "42");
        assert_eq!(i32::from(id), 42);
        assert_eq!(StoreId::from(42), id);
    }

    #[test]
    fn ids_serialize_transparently() {
        let json = serde_json::to_string(&UserId::new(7)).unwrap();
        assert_eq!(json, "7");
        let back: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, UserId::new(7));
    }

    #[test]
    fn sort_order_lenient_parsing() {
        assert_eq!(SortOrder::parse_lenient(Some("DESC")), SortOrder::Desc);
        assert_eq!(SortOrder::parse_lenient(Some("asc")), SortOrder::Asc);
        assert_eq!(SortOrder::parse_lenient(Some("sideways")), SortOrder::Asc);
        assert_eq!(SortOrder::parse_lenient(None), SortOrder::Asc);
        assert!(SortOrder::Asc.is_ascending());
    }

    #[test]
    fn page_request_clamps_and_counts() {
        let page = PageRequest::new(Some(0), Some(500), 10, 100);
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, 100);

        let page = PageRequest::new(Some(3), None, 10, 100);
        assert_eq!(page.offset(), 20);
        assert_eq!(page.total_pages(21), 3);
        assert_eq!(page.total_pages(0), 0);
    }

    #[test]
    fn page_offset_saturates_for_huge_pages() {
        let page = PageRequest::new(Some(u64::MAX), Some(10), 10, 100);
        assert_eq!(page.page, u64::MAX);
        assert_eq!(page.offset(), i64::MAX.unsigned_abs());

        let page = PageRequest::new(Some(u64::MAX / 2), Some(100), 10, 100);
        assert_eq!(page.offset(), i64::MAX.unsigned_abs());
    }
}
