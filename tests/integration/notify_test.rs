//! Integration tests for lead ingestion and the Pro fan-out
//!
//! Telegram is stubbed with wiremock; email is pointed at an unreachable
//! SMTP endpoint so delivery failures can be shown not to poison the run.

use actix_web::{test, web, App};
use leadgate::config::Config;
use leadgate::routes;
use leadgate::services::Notifiers;
use serde_json::{json, Value};
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{test_config, ProfileBuilder, TestDb};

const BOT_TOKEN: &str = "test-token";

/// Telegram stub answering sendMessage, plus a config wired to it.
/// Email points at a closed local port so every SMTP delivery fails.
async fn telegram_stub() -> (MockServer, Config) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{}/sendMessage", BOT_TOKEN)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .mount(&server)
        .await;

    let mut config = test_config();
    config.telegram.bot_token = Some(BOT_TOKEN.to_string());
    config.telegram.api_base = server.uri();
    config.smtp.host = Some("127.0.0.1".to_string());
    config.smtp.port = 1;
    (server, config)
}

fn notify_body(lead_id: Uuid) -> Value {
    json!({
        "secret": "test-notify-secret",
        "lead": {
            "id": lead_id,
            "title": "Senior Rust developer wanted",
            "company": "Acme Corp",
            "description": "Build a payments backend",
            "url": "https://jobs.example.com/123",
            "budget": "$5,000",
            "skill": "Rust"
        }
    })
}

#[actix_web::test]
async fn fan_out_counts_recipients_and_survives_channel_failures() {
    let db = TestDb::new().await;
    let (server, config) = telegram_stub().await;

    // Three reachable Pro accounts; email deliveries for A and C will fail,
    // telegram deliveries for B and C will land on the stub.
    ProfileBuilder::new("pro-email@example.com")
        .pro()
        .insert(&db.pool)
        .await;
    ProfileBuilder::new("pro-telegram@example.com")
        .pro()
        .without_email_notifications()
        .with_telegram("1001")
        .insert(&db.pool)
        .await;
    ProfileBuilder::new("pro-both@example.com")
        .pro()
        .with_telegram("1002")
        .insert(&db.pool)
        .await;
    // Free accounts never receive lead alerts, channels or not
    ProfileBuilder::new("free@example.com")
        .with_telegram("1003")
        .insert(&db.pool)
        .await;

    let notifiers = Notifiers::from_config(&config);
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(db.pool.clone()))
            .app_data(web::Data::new(config))
            .app_data(web::Data::new(notifiers))
            .configure(routes::notify::configure),
    )
    .await;

    let lead_id = Uuid::new_v4();
    let req = test::TestRequest::post()
        .uri("/api/notify")
        .set_json(notify_body(lead_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["lead_id"], json!(lead_id));
    assert_eq!(body["message"], "Lead stored, 3 Pro users notified");

    // Only the two Pro telegram channels reached the stub
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);

    // The lead was stored under the submitted id
    let (title,): (String,) = sqlx::query_as("SELECT title FROM leads WHERE id = $1")
        .bind(lead_id)
        .fetch_one(&db.pool)
        .await
        .unwrap();
    assert_eq!(title, "Senior Rust developer wanted");
}

#[actix_web::test]
async fn redelivered_lead_updates_in_place() {
    let db = TestDb::new().await;
    let (_server, config) = telegram_stub().await;

    let notifiers = Notifiers::from_config(&config);
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(db.pool.clone()))
            .app_data(web::Data::new(config))
            .app_data(web::Data::new(notifiers))
            .configure(routes::notify::configure),
    )
    .await;

    let lead_id = Uuid::new_v4();
    for title in ["First title", "Updated title"] {
        let mut body = notify_body(lead_id);
        body["lead"]["title"] = json!(title);
        let req = test::TestRequest::post()
            .uri("/api/notify")
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
    }

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM leads")
        .fetch_one(&db.pool)
        .await
        .unwrap();
    assert_eq!(count, 1);

    let (title,): (String,) = sqlx::query_as("SELECT title FROM leads WHERE id = $1")
        .bind(lead_id)
        .fetch_one(&db.pool)
        .await
        .unwrap();
    assert_eq!(title, "Updated title");
}

#[actix_web::test]
async fn wrong_secret_is_rejected_before_any_side_effect() {
    let db = TestDb::new().await;
    let (server, config) = telegram_stub().await;

    ProfileBuilder::new("pro@example.com")
        .pro()
        .with_telegram("1001")
        .insert(&db.pool)
        .await;

    let notifiers = Notifiers::from_config(&config);
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(db.pool.clone()))
            .app_data(web::Data::new(config))
            .app_data(web::Data::new(notifiers))
            .configure(routes::notify::configure),
    )
    .await;

    let mut body = notify_body(Uuid::new_v4());
    body["secret"] = json!("wrong-secret");
    let req = test::TestRequest::post()
        .uri("/api/notify")
        .set_json(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    assert!(server.received_requests().await.unwrap().is_empty());

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM leads")
        .fetch_one(&db.pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[actix_web::test]
async fn missing_title_is_a_validation_error() {
    let db = TestDb::new().await;
    let (_server, config) = telegram_stub().await;

    let notifiers = Notifiers::from_config(&config);
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(db.pool.clone()))
            .app_data(web::Data::new(config))
            .app_data(web::Data::new(notifiers))
            .configure(routes::notify::configure),
    )
    .await;

    let mut body = notify_body(Uuid::new_v4());
    body["lead"]["title"] = json!("");
    let req = test::TestRequest::post()
        .uri("/api/notify")
        .set_json(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn sparse_payload_with_defaults_is_accepted() {
    let db = TestDb::new().await;
    let (server, config) = telegram_stub().await;

    ProfileBuilder::new("pro@example.com")
        .pro()
        .with_telegram("1001")
        .insert(&db.pool)
        .await;

    let notifiers = Notifiers::from_config(&config);
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(db.pool.clone()))
            .app_data(web::Data::new(config))
            .app_data(web::Data::new(notifiers))
            .configure(routes::notify::configure),
    )
    .await;

    // Only id and title; description, url, budget and skill all default
    let req = test::TestRequest::post()
        .uri("/api/notify")
        .set_json(json!({
            "secret": "test-notify-secret",
            "lead": { "id": Uuid::new_v4(), "title": "Bare minimum lead" }
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[actix_web::test]
async fn notify_pro_requires_the_shared_secret() {
    let db = TestDb::new().await;
    let (server, config) = telegram_stub().await;

    ProfileBuilder::new("pro@example.com")
        .pro()
        .with_telegram("1001")
        .insert(&db.pool)
        .await;

    let notifiers = Notifiers::from_config(&config);
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(db.pool.clone()))
            .app_data(web::Data::new(config))
            .app_data(web::Data::new(notifiers))
            .configure(routes::notify::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/notify/pro")
        .set_json(json!({
            "secret": "wrong-secret",
            "title": "Big contract up for grabs",
            "apply_link": "https://jobs.example.com/456"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
    assert!(server.received_requests().await.unwrap().is_empty());

    let req = test::TestRequest::post()
        .uri("/api/notify/pro")
        .set_json(json!({
            "secret": "test-notify-secret",
            "title": "Big contract up for grabs",
            "apply_link": "https://jobs.example.com/456"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "1 Pro users notified");
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[actix_web::test]
async fn telegram_message_carries_chat_id_and_markdown() {
    let db = TestDb::new().await;
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{}/sendMessage", BOT_TOKEN)))
        .and(body_partial_json(json!({
            "chat_id": "1001",
            "parse_mode": "Markdown"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = test_config();
    config.telegram.bot_token = Some(BOT_TOKEN.to_string());
    config.telegram.api_base = server.uri();

    ProfileBuilder::new("pro@example.com")
        .pro()
        .without_email_notifications()
        .with_telegram("1001")
        .insert(&db.pool)
        .await;

    let notifiers = Notifiers::from_config(&config);
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(db.pool.clone()))
            .app_data(web::Data::new(config))
            .app_data(web::Data::new(notifiers))
            .configure(routes::notify::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/notify")
        .set_json(notify_body(Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    server.verify().await;
}
