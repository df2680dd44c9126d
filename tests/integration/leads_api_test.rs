//! Integration tests for the apply gate API
//!
//! Tests the full HTTP flow: session auth, lead lookup and credit
//! consumption through POST /api/leads/{id}/apply.

use actix_web::{test, web, App};
use leadgate::routes;
use serde_json::Value;

use crate::common::{
    credit_state, insert_lead, login_cookie, session_middleware, test_config, LeadBuilder,
    ProfileBuilder, TestDb,
};

#[actix_web::test]
async fn apply_consumes_a_credit_until_exhausted() {
    let db = TestDb::new().await;
    ProfileBuilder::new("applicant@example.com")
        .with_credits(3)
        .insert(&db.pool)
        .await;
    let lead = insert_lead(&db.pool).await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(db.pool.clone()))
            .app_data(web::Data::new(test_config()))
            .wrap(session_middleware())
            .configure(routes::auth::configure)
            .configure(routes::leads::configure),
    )
    .await;
    let cookie = login_cookie(&app, "applicant@example.com").await;

    for expected_remaining in [2, 1, 0] {
        let req = test::TestRequest::post()
            .uri(&format!("/api/leads/{}/apply", lead.id))
            .insert_header(("Cookie", cookie.clone()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["allowed"], true);
        assert_eq!(body["remaining"], expected_remaining);
    }

    // Fourth attempt: out of credits
    let req = test::TestRequest::post()
        .uri(&format!("/api/leads/{}/apply", lead.id))
        .insert_header(("Cookie", cookie))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["allowed"], false);
    assert_eq!(body["reason"], "limit_reached");
}

#[actix_web::test]
async fn pro_user_applies_without_remaining_field() {
    let db = TestDb::new().await;
    let profile = ProfileBuilder::new("pro@example.com")
        .pro()
        .with_credits(0)
        .insert(&db.pool)
        .await;
    let lead = insert_lead(&db.pool).await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(db.pool.clone()))
            .app_data(web::Data::new(test_config()))
            .wrap(session_middleware())
            .configure(routes::auth::configure)
            .configure(routes::leads::configure),
    )
    .await;
    let cookie = login_cookie(&app, "pro@example.com").await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/leads/{}/apply", lead.id))
        .insert_header(("Cookie", cookie))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["allowed"], true);
    assert!(body.get("remaining").is_none());

    let (credits, _) = credit_state(&db.pool, profile.id).await;
    assert_eq!(credits, 0);
}

#[actix_web::test]
async fn apply_requires_authentication() {
    let db = TestDb::new().await;
    let lead = insert_lead(&db.pool).await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(db.pool.clone()))
            .app_data(web::Data::new(test_config()))
            .wrap(session_middleware())
            .configure(routes::auth::configure)
            .configure(routes::leads::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/leads/{}/apply", lead.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn apply_to_unknown_lead_is_404_and_costs_nothing() {
    let db = TestDb::new().await;
    let profile = ProfileBuilder::new("careful@example.com")
        .with_credits(3)
        .insert(&db.pool)
        .await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(db.pool.clone()))
            .app_data(web::Data::new(test_config()))
            .wrap(session_middleware())
            .configure(routes::auth::configure)
            .configure(routes::leads::configure),
    )
    .await;
    let cookie = login_cookie(&app, "careful@example.com").await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/leads/{}/apply", uuid::Uuid::new_v4()))
        .insert_header(("Cookie", cookie))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);

    let (credits, _) = credit_state(&db.pool, profile.id).await;
    assert_eq!(credits, 3);
}

#[actix_web::test]
async fn get_lead_returns_the_stored_record() {
    let db = TestDb::new().await;
    ProfileBuilder::new("viewer@example.com")
        .insert(&db.pool)
        .await;
    let lead = LeadBuilder::new("Embedded Rust gig")
        .with_description("Firmware for a fleet of soil sensors")
        .insert(&db.pool)
        .await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(db.pool.clone()))
            .app_data(web::Data::new(test_config()))
            .wrap(session_middleware())
            .configure(routes::auth::configure)
            .configure(routes::leads::configure),
    )
    .await;
    let cookie = login_cookie(&app, "viewer@example.com").await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/leads/{}", lead.id))
        .insert_header(("Cookie", cookie))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["id"], serde_json::json!(lead.id));
    assert_eq!(body["title"], "Embedded Rust gig");
    assert_eq!(body["description"], "Firmware for a fleet of soil sensors");
}

#[actix_web::test]
async fn leads_listing_returns_recent_leads() {
    let db = TestDb::new().await;
    ProfileBuilder::new("reader@example.com")
        .insert(&db.pool)
        .await;
    insert_lead(&db.pool).await;
    insert_lead(&db.pool).await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(db.pool.clone()))
            .app_data(web::Data::new(test_config()))
            .wrap(session_middleware())
            .configure(routes::auth::configure)
            .configure(routes::leads::configure),
    )
    .await;
    let cookie = login_cookie(&app, "reader@example.com").await;

    let req = test::TestRequest::get()
        .uri("/api/leads")
        .insert_header(("Cookie", cookie))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["leads"].as_array().unwrap().len(), 2);
}
