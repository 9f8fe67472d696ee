use anyhow::Context;

use crate::config::Config;
use crate::domain::{PageRequest, Role, SortOrder, UserQuery, UserSortField, listing::normalize_search};
use crate::state::SharedState;

pub async fn cmd_list_users(
    config: Config,
    role: Option<String>,
    search: Option<String>,
    page: u64,
) -> anyhow::Result<()> {
    let role = parse_role_filter(role.as_deref())?;

    let page = PageRequest::new(
        Some(page),
        None,
        config.listing.default_page_size,
        config.listing.max_page_size,
    );

    let shared = SharedState::new(config).await?;
    let query = UserQuery {
        role,
        search: normalize_search(search),
        sort: UserSortField::Name,
        order: SortOrder::Asc,
        page,
    };

    let users = shared.user_service.list_users(&query).await?;

    if users.items.is_empty() {
        println!("No users found.");
        return Ok(());
    }

    println!("{:<6} {:<24} {:<32} {}", "ID", "Role", "Email", "Name");
    println!("{:-<90}", "");
    for user in &users.items {
        println!(
            "{:<6} {:<24} {:<32} {}",
            user.id,
            user.role.as_str(),
            user.email,
            user.name
        );
    }
    println!();
    println!(
        "Page {} of {} ({} users)",
        users.current_page, users.total_pages, users.total_items
    );

    Ok(())
}

fn parse_role_filter(raw: Option<&str>) -> anyhow::Result<Option<Role>> {
    raw.map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::parse::<Role>)
        .transpose()
        .context("Expected one of \"Normal User\", \"Store Owner\", \"System Administrator\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_filter_parsing() {
        assert_eq!(parse_role_filter(None).unwrap(), None);
        assert_eq!(parse_role_filter(Some("  ")).unwrap(), None);
        assert_eq!(
            parse_role_filter(Some("Store Owner")).unwrap(),
            Some(Role::StoreOwner)
        );

        let err = parse_role_filter(Some("Janitor")).unwrap_err();
        assert!(format!("{err:#}").contains("Unknown role: Janitor"));
    }
}
