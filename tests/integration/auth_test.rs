//! Integration tests for the authentication API
//!
//! Covers register, login, logout and the current-user endpoint against a
//! real PostgreSQL database, including the lazy credit reset on login.

use actix_web::{test, web, App};
use leadgate::routes;
use serde_json::{json, Value};

use crate::common::{login_cookie, session_middleware, test_config, ProfileBuilder, TestDb};

macro_rules! auth_app {
    ($db:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($db.pool.clone()))
                .app_data(web::Data::new(test_config()))
                .wrap(session_middleware())
                .configure(routes::auth::configure),
        )
        .await
    };
}

#[actix_web::test]
async fn register_creates_a_free_account_with_full_allotment() {
    let db = TestDb::new().await;
    let app = auth_app!(db);

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "email": "new@example.com",
            "password": "hunter2hunter2"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    assert!(resp.headers().contains_key("set-cookie"));

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["user"]["email"], "new@example.com");
    assert_eq!(body["user"]["plan"], "free");
    assert_eq!(body["user"]["daily_credits"], 3);
    assert_eq!(body["user"]["telegram_linked"], false);

    let (plan, credits): (String, i32) =
        sqlx::query_as("SELECT plan, daily_credits FROM profiles WHERE email = $1")
            .bind("new@example.com")
            .fetch_one(&db.pool)
            .await
            .unwrap();
    assert_eq!(plan, "free");
    assert_eq!(credits, 3);
}

#[actix_web::test]
async fn register_rejects_invalid_email_and_duplicates() {
    let db = TestDb::new().await;
    ProfileBuilder::new("taken@example.com")
        .insert(&db.pool)
        .await;
    let app = auth_app!(db);

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({ "email": "not-an-email", "password": "hunter2hunter2" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({ "email": "taken@example.com", "password": "hunter2hunter2" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn login_rejects_a_wrong_password() {
    let db = TestDb::new().await;
    ProfileBuilder::new("user@example.com")
        .insert(&db.pool)
        .await;
    let app = auth_app!(db);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "user@example.com", "password": "wrong" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["reason"], "not_authenticated");
}

#[actix_web::test]
async fn login_restores_stale_credits() {
    let db = TestDb::new().await;
    ProfileBuilder::new("returning@example.com")
        .with_credits(0)
        .reset_days_ago(1)
        .insert(&db.pool)
        .await;
    let app = auth_app!(db);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "returning@example.com", "password": "password123" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["user"]["daily_credits"], 3);
}

#[actix_web::test]
async fn me_reflects_the_session_profile() {
    let db = TestDb::new().await;
    ProfileBuilder::new("pro@example.com")
        .pro()
        .with_telegram("1001")
        .insert(&db.pool)
        .await;
    let app = auth_app!(db);
    let cookie = login_cookie(&app, "pro@example.com").await;

    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .insert_header(("Cookie", cookie))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["plan"], "pro");
    assert_eq!(body["telegram_linked"], true);
    // Pro accounts have no credit counter to show
    assert!(body.get("daily_credits").is_none());
}

#[actix_web::test]
async fn me_without_a_session_is_unauthorized() {
    let db = TestDb::new().await;
    let app = auth_app!(db);

    let req = test::TestRequest::get().uri("/api/auth/me").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn logout_invalidates_the_session() {
    let db = TestDb::new().await;
    ProfileBuilder::new("leaver@example.com")
        .insert(&db.pool)
        .await;
    let app = auth_app!(db);
    let cookie = login_cookie(&app, "leaver@example.com").await;

    let req = test::TestRequest::post()
        .uri("/api/auth/logout")
        .insert_header(("Cookie", cookie.clone()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 204);

    // The logout response rewrites the cookie; the old value alone would
    // still decode, so replay the cleared cookie from the response.
    let cleared = resp
        .headers()
        .get("set-cookie")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.split(';').next())
        .unwrap_or_default()
        .to_string();

    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .insert_header(("Cookie", cleared))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn inactive_accounts_cannot_log_in() {
    let db = TestDb::new().await;
    let profile = ProfileBuilder::new("disabled@example.com")
        .insert(&db.pool)
        .await;
    sqlx::query("UPDATE profiles SET is_active = FALSE WHERE id = $1")
        .bind(profile.id)
        .execute(&db.pool)
        .await
        .unwrap();
    let app = auth_app!(db);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "disabled@example.com", "password": "password123" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}
