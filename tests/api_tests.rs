use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use rateboard::config::Config;
use serde_json::{Value, json};
use tower::ServiceExt;

/// Seeded on startup by the default `[security.bootstrap_admin]` section.
const ADMIN_EMAIL: &str = "admin@rateboard.local";
const ADMIN_PASSWORD: &str = "Admin@1234";

const PASSWORD: &str = "Secret@123";

async fn spawn_app() -> Router {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.server.secure_cookies = false;
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;

    let state = rateboard::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    rateboard::api::router(state)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }

    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, json)
}

async fn register(app: &Router, name: &str, email: &str, role: Option<&str>) -> i64 {
    let (status, body) = send(
        app,
        "POST",
        "/api/register",
        None,
        Some(json!({
            "name": name,
            "email": email,
            "password": PASSWORD,
            "address": "12 Market Street, Springfield",
            "role": role,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    body["data"]["id"].as_i64().unwrap()
}

async fn login(app: &Router, email: &str, password: &str, role: Option<&str>) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        "/api/login",
        None,
        Some(json!({ "email": email, "password": password, "role": role })),
    )
    .await
}

async fn token_for(app: &Router, email: &str, password: &str) -> String {
    let (status, body) = login(app, email, password, None).await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["data"]["token"].as_str().unwrap().to_string()
}

async fn admin_token(app: &Router) -> String {
    token_for(app, ADMIN_EMAIL, ADMIN_PASSWORD).await
}

async fn create_store(app: &Router, admin: &str, name: &str, owner_id: Option<i64>) -> i64 {
    let slug = name.to_lowercase().replace(' ', "");
    let (status, body) = send(
        app,
        "POST",
        "/api/stores",
        Some(admin),
        Some(json!({
            "name": name,
            "contact_email": format!("{slug}@stores.test"),
            "location": "1 High Street",
            "owner_id": owner_id,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create store failed: {body}");
    body["data"]["id"].as_i64().unwrap()
}

/// Registers a normal user and returns their token.
async fn rater(app: &Router, n: usize) -> String {
    let email = format!("rater{n}@example.com");
    register(app, &format!("Regular Customer Number {n}"), &email, None).await;
    token_for(app, &email, PASSWORD).await
}

#[tokio::test]
async fn test_health_is_public() {
    let app = spawn_app().await;

    let (status, body) = send(&app, "GET", "/health/live", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = send(&app, "GET", "/health/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], true);
}

#[tokio::test]
async fn test_register_login_and_me() {
    let app = spawn_app().await;

    let id = register(&app, "Alice Wonderland Smith", "alice@example.com", None).await;

    let (status, body) = login(&app, "alice@example.com", PASSWORD, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["user"]["role"], "Normal User");
    assert_eq!(body["data"]["role_upgraded"], false);
    assert_eq!(body["data"]["token"].as_str().unwrap().len(), 64);

    let token = body["data"]["token"].as_str().unwrap();
    let (status, body) = send(&app, "GET", "/api/me", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"].as_i64(), Some(id));
    assert_eq!(body["data"]["email"], "alice@example.com");
    assert!(body["data"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_registration_rules() {
    let app = spawn_app().await;
    register(&app, "Alice Wonderland Smith", "alice@example.com", None).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/register",
        None,
        Some(json!({
            "name": "Alice Wonderland Smith",
            "email": "alice@example.com",
            "password": PASSWORD,
            "address": "Elsewhere",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);

    let (status, _) = send(
        &app,
        "POST",
        "/api/register",
        None,
        Some(json!({
            "name": "Mallory Would Be Admin",
            "email": "mallory@example.com",
            "password": PASSWORD,
            "address": "Elsewhere",
            "role": "System Administrator",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/api/register",
        None,
        Some(json!({
            "name": "Too Short",
            "email": "short@example.com",
            "password": PASSWORD,
            "address": "Elsewhere",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/api/register",
        None,
        Some(json!({
            "name": "Weak Password Wendy Jones",
            "email": "wendy@example.com",
            "password": "password",
            "address": "Elsewhere",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invalid_credentials() {
    let app = spawn_app().await;
    register(&app, "Alice Wonderland Smith", "alice@example.com", None).await;

    let (status, body) = login(&app, "alice@example.com", "Wrong@1234", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials.");

    let (status, body) = login(&app, "nobody@example.com", PASSWORD, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials.");
}

#[tokio::test]
async fn test_login_upgrade_is_persisted() {
    let app = spawn_app().await;
    register(&app, "Bob Builder Of Things", "bob@example.com", None).await;

    let (status, body) = login(&app, "bob@example.com", PASSWORD, Some("Store Owner")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role_upgraded"], true);
    assert_eq!(body["data"]["user"]["role"], "Store Owner");

    // The upgrade sticks: asking for the lower role is now denied.
    let (status, body) = login(&app, "bob@example.com", PASSWORD, Some("Normal User")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].as_str().unwrap().contains("(Store Owner)"));

    let (status, body) = login(&app, "bob@example.com", PASSWORD, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["role"], "Store Owner");
    assert_eq!(body["data"]["role_upgraded"], false);
}

#[tokio::test]
async fn test_unknown_login_role_is_denied() {
    let app = spawn_app().await;
    register(&app, "Bob Builder Of Things", "bob@example.com", None).await;

    let (status, _) = login(&app, "bob@example.com", PASSWORD, Some("Superuser")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = login(&app, "bob@example.com", PASSWORD, None).await;
    assert_eq!(body["data"]["user"]["role"], "Normal User");
}

#[tokio::test]
async fn test_role_gates() {
    let app = spawn_app().await;
    let user = rater(&app, 1).await;
    let admin = admin_token(&app).await;

    let (status, body) = send(&app, "GET", "/api/admin/dashboard-stats", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Access Denied: No valid token provided.");

    let (status, _) = send(
        &app,
        "GET",
        "/api/admin/dashboard-stats",
        Some("not-a-real-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, "GET", "/api/admin/dashboard-stats", Some(&user), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["error"],
        "Access Denied: You do not have permission to perform this action."
    );

    let (status, _) = send(&app, "GET", "/api/owner/stores", Some(&user), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "GET", "/api/admin/dashboard-stats", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);

    // Administrators are not store owners.
    let (status, _) = send(&app, "GET", "/api/owner/stores", Some(&admin), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_denied_write_has_no_effect() {
    let app = spawn_app().await;
    let user = rater(&app, 1).await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/stores",
        Some(&user),
        Some(json!({
            "name": "Sneaky Store",
            "contact_email": "sneaky@stores.test",
            "location": "Nowhere",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, "GET", "/api/stores", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_items"], 0);
}

#[tokio::test]
async fn test_logout_revokes_token() {
    let app = spawn_app().await;
    let token = rater(&app, 1).await;

    let (status, _) = send(&app, "POST", "/api/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "GET", "/api/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_rating_submission_upserts() {
    let app = spawn_app().await;
    let admin = admin_token(&app).await;
    let store = create_store(&app, &admin, "Corner Bakery", None).await;
    let user = rater(&app, 1).await;

    let uri = format!("/api/ratings/{store}");

    let (status, body) = send(&app, "POST", &uri, Some(&user), Some(json!({ "rating": 4 }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["message"], "Rating submitted successfully!");
    assert_eq!(body["data"]["created"], true);
    let first_id = body["data"]["rating_id"].as_i64();

    let (status, body) = send(&app, "POST", &uri, Some(&user), Some(json!({ "rating": 2 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["message"], "Rating updated successfully!");
    assert_eq!(body["data"]["rating_id"].as_i64(), first_id);

    let (status, body) = send(&app, "GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["rating"], 2);

    let (_, body) = send(&app, "GET", &format!("/api/stores/{store}"), Some(&user), None).await;
    assert_eq!(body["data"]["average_rating"], "2.0");
    assert_eq!(body["data"]["rating_count"], 1);
    assert_eq!(body["data"]["user_submitted_rating"], 2);
}

#[tokio::test]
async fn test_rating_out_of_range_is_rejected() {
    let app = spawn_app().await;
    let admin = admin_token(&app).await;
    let store = create_store(&app, &admin, "Corner Bakery", None).await;
    let user = rater(&app, 1).await;

    let uri = format!("/api/ratings/{store}");
    for value in [0, 6, -1] {
        let (status, body) =
            send(&app, "POST", &uri, Some(&user), Some(json!({ "rating": value }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "rating {value}");
        assert_eq!(body["success"], false);
    }

    let (_, body) = send(&app, "GET", &format!("{uri}/average"), None, None).await;
    assert_eq!(body["data"]["average_rating"], "N/A");
    assert_eq!(body["data"]["rating_count"], 0);
}

#[tokio::test]
async fn test_rating_unknown_store() {
    let app = spawn_app().await;
    let user = rater(&app, 1).await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/ratings/999",
        Some(&user),
        Some(json!({ "rating": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "POST",
        "/api/ratings/0",
        Some(&user),
        Some(json!({ "rating": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_only_normal_users_rate() {
    let app = spawn_app().await;
    let admin = admin_token(&app).await;
    let store = create_store(&app, &admin, "Corner Bakery", None).await;

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/ratings/{store}"),
        Some(&admin),
        Some(json!({ "rating": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/ratings/{store}"),
        None,
        Some(json!({ "rating": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_average_across_users() {
    let app = spawn_app().await;
    let admin = admin_token(&app).await;
    let rated = create_store(&app, &admin, "Corner Bakery", None).await;
    let unrated = create_store(&app, &admin, "Quiet Bookshop", None).await;

    for (n, value) in [3, 4, 5].into_iter().enumerate() {
        let token = rater(&app, n).await;
        let (status, _) = send(
            &app,
            "POST",
            &format!("/api/ratings/{rated}"),
            Some(&token),
            Some(json!({ "rating": value })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, body) = send(&app, "GET", &format!("/api/ratings/{rated}/average"), None, None).await;
    assert_eq!(body["data"]["average_rating"], "4.0");
    assert_eq!(body["data"]["rating_count"], 3);

    let (_, body) = send(&app, "GET", &format!("/api/stores/{unrated}"), None, None).await;
    assert_eq!(body["data"]["average_rating"], "N/A");
    assert!(body["data"]["user_submitted_rating"].is_null());

    let (_, body) = send(
        &app,
        "GET",
        "/api/stores?sort=average_rating&order=desc",
        None,
        None,
    )
    .await;
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["id"].as_i64(), Some(rated));
}

#[tokio::test]
async fn test_store_listing_search_and_viewer_rating() {
    let app = spawn_app().await;
    let admin = admin_token(&app).await;
    let bakery = create_store(&app, &admin, "Corner Bakery", None).await;
    create_store(&app, &admin, "Quiet Bookshop", None).await;
    let user = rater(&app, 1).await;

    send(
        &app,
        "POST",
        &format!("/api/ratings/{bakery}"),
        Some(&user),
        Some(json!({ "rating": 5 })),
    )
    .await;

    let (status, body) = send(&app, "GET", "/api/stores?search=bakery", Some(&user), None).await;
    assert_eq!(status, StatusCode::OK);
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], "Corner Bakery");
    assert_eq!(items[0]["user_submitted_rating"], 5);

    let (_, body) = send(&app, "GET", "/api/stores?search=bakery", None, None).await;
    assert!(body["data"]["items"][0]["user_submitted_rating"].is_null());

    let (_, body) = send(&app, "GET", "/api/stores?limit=1&page=2", None, None).await;
    assert_eq!(body["data"]["total_items"], 2);
    assert_eq!(body["data"]["total_pages"], 2);
    assert_eq!(body["data"]["items"][0]["name"], "Quiet Bookshop");
}

#[tokio::test]
async fn test_duplicate_store_is_conflict() {
    let app = spawn_app().await;
    let admin = admin_token(&app).await;
    create_store(&app, &admin, "Corner Bakery", None).await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/stores",
        Some(&admin),
        Some(json!({
            "name": "Corner Bakery",
            "contact_email": "other@stores.test",
            "location": "2 High Street",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        "POST",
        "/api/stores",
        Some(&admin),
        Some(json!({
            "name": "Ghost Owned Store",
            "contact_email": "ghost@stores.test",
            "location": "2 High Street",
            "owner_id": 4242,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_owner_dashboard() {
    let app = spawn_app().await;
    let admin = admin_token(&app).await;

    let owner_id = register(&app, "Olivia Owner Of Shops", "olivia@example.com", Some("Store Owner")).await;
    let owned = create_store(&app, &admin, "Olivias Deli", Some(owner_id)).await;
    create_store(&app, &admin, "Somebody Elses Shop", None).await;

    let user = rater(&app, 1).await;
    send(
        &app,
        "POST",
        &format!("/api/ratings/{owned}"),
        Some(&user),
        Some(json!({ "rating": 4 })),
    )
    .await;

    let owner = token_for(&app, "olivia@example.com", PASSWORD).await;

    let (status, body) = send(&app, "GET", "/api/owner/stores", Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    let stores = body["data"]["stores"].as_array().unwrap();
    assert_eq!(stores.len(), 1);
    assert_eq!(stores[0]["name"], "Olivias Deli");
    assert_eq!(stores[0]["average_rating"], "4.0");
    assert_eq!(stores[0]["owner_name"], "Olivia Owner Of Shops");

    let (status, body) = send(&app, "GET", "/api/owner/ratings", Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    let ratings = body["data"].as_array().unwrap();
    assert_eq!(ratings.len(), 1);
    assert_eq!(ratings[0]["rating"], 4);
    assert_eq!(ratings[0]["user_email"], "rater1@example.com");
}

#[tokio::test]
async fn test_deleting_user_removes_their_ratings() {
    let app = spawn_app().await;
    let admin = admin_token(&app).await;

    let owner_id = register(&app, "Olivia Owner Of Shops", "olivia@example.com", Some("Store Owner")).await;
    let store = create_store(&app, &admin, "Olivias Deli", Some(owner_id)).await;

    let user_id = register(&app, "Regular Customer Number 1", "rater1@example.com", None).await;
    let user = token_for(&app, "rater1@example.com", PASSWORD).await;
    send(
        &app,
        "POST",
        &format!("/api/ratings/{store}"),
        Some(&user),
        Some(json!({ "rating": 5 })),
    )
    .await;

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/admin/users/{user_id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, "GET", &format!("/api/ratings/{store}/average"), None, None).await;
    assert_eq!(body["data"]["average_rating"], "N/A");

    // Their token went with them.
    let (status, _) = send(&app, "GET", "/api/me", Some(&user), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Deleting the owner keeps the store without an owner.
    send(
        &app,
        "DELETE",
        &format!("/api/admin/users/{owner_id}"),
        Some(&admin),
        None,
    )
    .await;
    let (status, body) = send(&app, "GET", &format!("/api/stores/{store}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["owner_id"].is_null());

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/admin/users/{user_id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleting_store_removes_its_ratings() {
    let app = spawn_app().await;
    let admin = admin_token(&app).await;
    let store = create_store(&app, &admin, "Corner Bakery", None).await;
    let user = rater(&app, 1).await;

    send(
        &app,
        "POST",
        &format!("/api/ratings/{store}"),
        Some(&user),
        Some(json!({ "rating": 3 })),
    )
    .await;

    let (_, body) = send(&app, "GET", "/api/admin/dashboard-stats", Some(&admin), None).await;
    assert_eq!(body["data"]["totalRatings"], 1);

    let (status, _) = send(&app, "DELETE", &format!("/api/stores/{store}"), Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "GET", &format!("/api/stores/{store}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, "GET", "/api/admin/dashboard-stats", Some(&admin), None).await;
    assert_eq!(body["data"]["totalStores"], 0);
    assert_eq!(body["data"]["totalRatings"], 0);
}

#[tokio::test]
async fn test_admin_user_management() {
    let app = spawn_app().await;
    let admin = admin_token(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/admin/users",
        Some(&admin),
        Some(json!({
            "name": "Second System Administrator",
            "email": "second@example.com",
            "password": PASSWORD,
            "address": "Head office",
            "role": "System Administrator",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["role"], "System Administrator");
    let id = body["data"]["id"].as_i64().unwrap();

    rater(&app, 1).await;

    let (_, body) = send(&app, "GET", "/api/admin/dashboard-stats", Some(&admin), None).await;
    assert_eq!(body["data"]["totalUsers"], 3);

    let (status, body) = send(
        &app,
        "GET",
        "/api/admin/users?role=System%20Administrator&sort=email",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["email"], ADMIN_EMAIL);

    let (status, body) = send(&app, "GET", &format!("/api/admin/users/{id}"), Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "second@example.com");

    let (status, _) = send(&app, "GET", "/api/admin/users?role=Janitor", Some(&admin), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_password() {
    let app = spawn_app().await;
    let token = rater(&app, 1).await;

    let (status, _) = send(
        &app,
        "PUT",
        "/api/update-password",
        Some(&token),
        Some(json!({ "current_password": "Wrong@1234", "password": "Changed@123" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "PUT",
        "/api/update-password",
        Some(&token),
        Some(json!({ "current_password": PASSWORD, "password": "Changed@123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Tokens issued before the change no longer authenticate.
    let (status, _) = send(&app, "GET", "/api/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = login(&app, "rater1@example.com", PASSWORD, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = login(&app, "rater1@example.com", "Changed@123", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_huge_page_number_returns_empty_page() {
    let app = spawn_app().await;
    let admin = admin_token(&app).await;
    create_store(&app, &admin, "Corner Bakery", None).await;

    let (status, body) = send(
        &app,
        "GET",
        "/api/stores?page=18446744073709551615&limit=10",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_items"], 1);
    assert!(body["data"]["items"].as_array().unwrap().is_empty());

    let (status, body) = send(
        &app,
        "GET",
        "/api/admin/users?page=18446744073709551615&limit=100",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_rating_bodies_are_validation_errors() {
    let app = spawn_app().await;
    let admin = admin_token(&app).await;
    let store = create_store(&app, &admin, "Corner Bakery", None).await;
    let user = rater(&app, 1).await;
    let uri = format!("/api/ratings/{store}");

    let (status, body) = send(&app, "POST", &uri, Some(&user), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Rating is required.");

    let (status, body) = send(&app, "POST", &uri, Some(&user), Some(json!({ "rating": null }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Rating is required.");

    for bad in [json!(4.5), json!("four"), json!([4])] {
        let (status, body) =
            send(&app, "POST", &uri, Some(&user), Some(json!({ "rating": bad }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "rating {bad}");
        assert_eq!(body["success"], false);
    }

    let (_, body) = send(&app, "GET", &format!("{uri}/average"), None, None).await;
    assert_eq!(body["data"]["rating_count"], 0);

    // Numeric strings from form clients are accepted.
    let (status, body) = send(&app, "POST", &uri, Some(&user), Some(json!({ "rating": "4" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["rating"], 4);

    let (status, _) = send(&app, "POST", &uri, Some(&user), Some(json!({ "rating": "6" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
