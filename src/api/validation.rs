use super::{ApiError, StoreListParams, UserListParams};
use crate::config::ListingConfig;
use crate::domain::listing::normalize_search;
use crate::domain::{
    PageRequest, Role, SortOrder, StoreQuery, StoreSortField, UserId, UserQuery, UserSortField,
};
use crate::services::RatingError;

pub fn validate_id(resource: &str, id: i32) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid {resource} ID: {id}. ID must be a positive integer"
        )));
    }
    Ok(id)
}

/// Reads the submitted rating from a loosely typed JSON value. Form-style
/// clients send the number as a string, so `"4"` is accepted. The range
/// itself is checked by the rating service.
pub fn rating_input(raw: Option<&serde_json::Value>) -> Result<i64, RatingError> {
    use serde_json::Value;

    let invalid =
        || RatingError::Validation("Rating must be a whole number between 1 and 5.".to_string());

    match raw {
        None | Some(Value::Null) => Err(RatingError::Validation("Rating is required.".to_string())),
        Some(Value::Number(n)) => n.as_i64().ok_or_else(invalid),
        Some(Value::String(s)) if s.trim().is_empty() => {
            Err(RatingError::Validation("Rating is required.".to_string()))
        }
        Some(Value::String(s)) => s.trim().parse::<i64>().map_err(|_| invalid()),
        Some(_) => Err(invalid()),
    }
}

pub fn page_request(listing: &ListingConfig, page: Option<u64>, limit: Option<u64>) -> PageRequest {
    PageRequest::new(page, limit, listing.default_page_size, listing.max_page_size)
}

pub fn store_query(listing: &ListingConfig, params: StoreListParams) -> Result<StoreQuery, ApiError> {
    let owner_id = params
        .owner_id
        .map(|id| validate_id("owner", id).map(UserId::new))
        .transpose()?;

    Ok(StoreQuery {
        search: normalize_search(params.search),
        owner_id,
        sort: StoreSortField::parse_lenient(params.sort.as_deref()),
        order: SortOrder::parse_lenient(params.order.as_deref()),
        page: page_request(listing, params.page, params.limit),
    })
}

pub fn user_query(listing: &ListingConfig, params: UserListParams) -> Result<UserQuery, ApiError> {
    let role = params
        .role
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::parse::<Role>)
        .transpose()
        .map_err(|e| ApiError::validation(e.to_string()))?;

    Ok(UserQuery {
        role,
        search: normalize_search(params.search),
        sort: UserSortField::parse_lenient(params.sort.as_deref()),
        order: SortOrder::parse_lenient(params.order.as_deref()),
        page: page_request(listing, params.page, params.limit),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_id() {
        assert!(validate_id("store", 1).is_ok());
        assert!(validate_id("store", 0).is_err());
        assert!(validate_id("store", -4).is_err());
    }

    #[test]
    fn test_rating_input() {
        use serde_json::json;

        assert_eq!(rating_input(Some(&json!(4))).unwrap(), 4);
        assert_eq!(rating_input(Some(&json!(" 5 "))).unwrap(), 5);
        // Out of range is left to the service.
        assert_eq!(rating_input(Some(&json!(9))).unwrap(), 9);

        for bad in [json!(null), json!(""), json!(4.5), json!("four"), json!([4]), json!(true)] {
            assert!(
                matches!(rating_input(Some(&bad)), Err(RatingError::Validation(_))),
                "{bad} should be rejected"
            );
        }
        assert!(matches!(
            rating_input(None),
            Err(RatingError::Validation(msg)) if msg == "Rating is required."
        ));
    }

    #[test]
    fn test_store_query_defaults() {
        let query = store_query(&ListingConfig::default(), StoreListParams::default()).unwrap();
        assert_eq!(query.sort, StoreSortField::Name);
        assert_eq!(query.order, SortOrder::Asc);
        assert_eq!(query.page.page, 1);
        assert_eq!(query.page.limit, 10);
        assert!(query.search.is_none());
    }

    #[test]
    fn test_store_query_clamps_limit() {
        let params = StoreListParams {
            limit: Some(10_000),
            sort: Some("average_rating".into()),
            order: Some("desc".into()),
            ..Default::default()
        };
        let query = store_query(&ListingConfig::default(), params).unwrap();
        assert_eq!(query.page.limit, 100);
        assert_eq!(query.sort, StoreSortField::AverageRating);
        assert_eq!(query.order, SortOrder::Desc);
    }

    #[test]
    fn test_user_query_role_filter() {
        let params = UserListParams {
            role: Some("Store Owner".into()),
            ..Default::default()
        };
        let query = user_query(&ListingConfig::default(), params).unwrap();
        assert_eq!(query.role, Some(Role::StoreOwner));

        let params = UserListParams {
            role: Some("Overlord".into()),
            ..Default::default()
        };
        assert!(user_query(&ListingConfig::default(), params).is_err());
    }
}
