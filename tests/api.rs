//! End-to-end checks of the HTTP surface against the in-memory backend.

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use courtside_back::{
    build_router,
    config::AppConfig,
    dao::booking_store::memory::MemoryBookingStore,
    state::{
        AppState, SharedState,
        auth::{Principal, UserRole},
        clock::ManualClock,
    },
};
use serde_json::{Value, json};
use time::macros::date;
use tower::ServiceExt;
use uuid::Uuid;

const ADMIN_TOKEN: &str = "admin-token";
const ALICE_TOKEN: &str = "alice-token";
const BOB_TOKEN: &str = "bob-token";

async fn app_state(with_store: bool) -> SharedState {
    let principal = |role| Principal {
        user_id: Uuid::new_v4(),
        role,
    };
    let config = AppConfig::default().with_api_tokens(vec![
        (ADMIN_TOKEN.into(), principal(UserRole::Admin)),
        (ALICE_TOKEN.into(), principal(UserRole::User)),
        (BOB_TOKEN.into(), principal(UserRole::User)),
    ]);
    let state = AppState::with_clock(config, Arc::new(ManualClock::at_date(date!(2025 - 01 - 10))));
    if with_store {
        state
            .set_booking_store(Arc::new(MemoryBookingStore::new()))
            .await;
    }
    state
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn seed_court(app: &Router) -> String {
    let (status, arena) = send(
        app,
        Method::POST,
        "/api/admin/arenas",
        Some(ADMIN_TOKEN),
        Some(json!({
            "name": "Smash Hall",
            "address": "Jl. Merdeka 1",
            "city": "Bandung",
            "category": "indoor",
            "price_per_hour": 60000
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, court) = send(
        app,
        Method::POST,
        "/api/admin/courts",
        Some(ADMIN_TOKEN),
        Some(json!({ "arena_id": arena["id"], "name": "Court A", "type": "Standard" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    court["id"].as_str().unwrap().to_owned()
}

#[tokio::test]
async fn healthcheck_reports_storage_state() {
    let app = build_router(app_state(true).await);
    let (status, body) = send(&app, Method::GET, "/api/healthcheck", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let degraded = build_router(app_state(false).await);
    let (status, body) = send(&degraded, Method::GET, "/api/healthcheck", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");

    let (status, _) = send(&degraded, Method::GET, "/api/arenas", None, None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn protected_routes_require_token_and_role() {
    let app = build_router(app_state(true).await);

    let (status, body) = send(&app, Method::GET, "/api/bookings/user/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["message"].is_string());

    let (status, _) = send(&app, Method::GET, "/api/bookings/user/me", Some("bogus"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::GET, "/api/bookings/admin", Some(ALICE_TOKEN), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, Method::GET, "/api/bookings/admin", Some(ADMIN_TOKEN), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::GET, "/api/events?token=bogus", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn booking_flow_over_http() {
    let app = build_router(app_state(true).await);
    let court_id = seed_court(&app).await;

    let booking_request = json!({
        "courtId": court_id,
        "date": "2025-01-11",
        "timeSlots": ["19:00", "20:00"],
        "totalPriceFromFrontend": 1
    });
    let (status, booking) = send(
        &app,
        Method::POST,
        "/api/bookings",
        Some(ALICE_TOKEN),
        Some(booking_request.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(booking["status"], "pending");
    assert_eq!(booking["paymentStatus"], "unpaid");
    assert_eq!(booking["totalPrice"], 120_000);
    assert_eq!(booking["endTime"], "21:00");
    let invoice = booking["invoiceNumber"].as_str().unwrap().to_owned();

    let (status, slots) = send(
        &app,
        Method::GET,
        &format!("/api/bookings/available-slots?courtId={court_id}&date=2025-01-11"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let booked: Vec<&str> = slots
        .as_array()
        .unwrap()
        .iter()
        .filter(|slot| slot["status"] == "booked")
        .map(|slot| slot["time"].as_str().unwrap())
        .collect();
    assert_eq!(booked, ["19:00", "20:00"]);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/bookings",
        Some(BOB_TOKEN),
        Some(booking_request),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/bookings/{invoice}"),
        Some(BOB_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, paid) = send(
        &app,
        Method::POST,
        &format!("/api/bookings/{invoice}/payment"),
        Some(ALICE_TOKEN),
        Some(json!({ "paymentMethod": "qris" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paid["status"], "confirmed");
    assert_eq!(paid["paymentStatus"], "paid");
    assert_eq!(paid["paymentMethod"], "qris");

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/bookings/{invoice}/cancel"),
        Some(ALICE_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, stats) = send(
        &app,
        Method::GET,
        "/api/bookings/admin/stats",
        Some(ADMIN_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["byStatus"]["confirmed"], 1);
}

#[tokio::test]
async fn malformed_requests_are_rejected() {
    let app = build_router(app_state(true).await);
    let court_id = seed_court(&app).await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/bookings",
        Some(ALICE_TOKEN),
        Some(json!({ "courtId": court_id, "date": "11-01-2025", "timeSlots": ["10:00"] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/bookings",
        Some(ALICE_TOKEN),
        Some(json!({ "courtId": court_id, "date": "2025-01-11", "timeSlots": ["24:00"] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/bookings/available-slots?courtId={}&date=2025-01-11", Uuid::new_v4()),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
