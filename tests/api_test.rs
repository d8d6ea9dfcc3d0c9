use std::time::Duration;

use actix_web::{http::StatusCode, test, web, App};
use serde_json::json;

use directory::database::{seed::SEED_ADMIN_ID, MemoryStore};
use directory::handlers;
use directory::models::{ApiResponse, Business, BusinessStatus, User, UserType};
use directory::state::AppState;

fn seeded_state() -> web::Data<AppState> {
    web::Data::new(AppState::in_memory(MemoryStore::seeded(Duration::ZERO)))
}

fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {token}"))
}

fn listing_payload(name: &str) -> serde_json::Value {
    json!({
        "name": name,
        "category": "Restaurant & Cafe",
        "description": "Saffron ice cream and faloodeh",
        "address": "7 Hafez Street, Shiraz",
        "phone": "+98 71 3200 4455",
        "services": ["Takeaway"],
        "images": ["https://images.example.com/shiraz/front.jpg"],
        "status": "approved"
    })
}

#[actix_rt::test]
async fn health_reports_store_backend() {
    let app = test::init_service(
        App::new()
            .app_data(seeded_state())
            .configure(handlers::configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "ok");
    assert_eq!(body["store"], "memory");
}

#[actix_rt::test]
async fn category_search_returns_only_restaurants() {
    let app = test::init_service(
        App::new()
            .app_data(seeded_state())
            .configure(handlers::configure),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/v1/businesses?category=Restaurant%20%26%20Cafe")
        .to_request();
    let body: ApiResponse<Vec<Business>> = test::call_and_read_body_json(&app, req).await;

    let names: Vec<String> = body
        .data
        .expect("listing data")
        .into_iter()
        .map(|b| b.name)
        .collect();
    assert_eq!(names, vec!["Toranj Restaurant", "Farah Restaurant"]);
}

#[actix_rt::test]
async fn filters_combine_and_distance_is_derived() {
    let app = test::init_service(
        App::new()
            .app_data(seeded_state())
            .configure(handlers::configure),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/v1/businesses?isPromoted=true&status=approved&lat=35.7575&lng=51.4098")
        .to_request();
    let body: ApiResponse<Vec<Business>> = test::call_and_read_body_json(&app, req).await;

    let businesses = body.data.expect("listing data");
    assert_eq!(businesses.len(), 1, "only Toranj is promoted and approved");
    assert_eq!(businesses[0].name, "Toranj Restaurant");
    assert!(businesses[0].distance < 0.01);
}

#[actix_rt::test]
async fn text_search_matches_description() {
    let app = test::init_service(
        App::new()
            .app_data(seeded_state())
            .configure(handlers::configure),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/v1/businesses?query=BRAKE")
        .to_request();
    let body: ApiResponse<Vec<Business>> = test::call_and_read_body_json(&app, req).await;

    let businesses = body.data.expect("listing data");
    assert_eq!(businesses.len(), 1);
    assert_eq!(businesses[0].name, "Iraj Auto Repair");
}

#[actix_rt::test]
async fn creating_a_listing_requires_a_known_identity() {
    let app = test::init_service(
        App::new()
            .app_data(seeded_state())
            .configure(handlers::configure),
    )
    .await;

    let anonymous = test::TestRequest::post()
        .uri("/api/v1/businesses")
        .set_json(listing_payload("Shiraz Sweets"))
        .to_request();
    assert_eq!(
        test::call_service(&app, anonymous).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let stranger = test::TestRequest::post()
        .uri("/api/v1/businesses")
        .insert_header(bearer("no-such-profile"))
        .set_json(listing_payload("Shiraz Sweets"))
        .to_request();
    assert_eq!(
        test::call_service(&app, stranger).await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[actix_rt::test]
async fn owner_submissions_enter_moderation_and_admin_approves() {
    let app = test::init_service(
        App::new()
            .app_data(seeded_state())
            .configure(handlers::configure),
    )
    .await;

    // Admin registers a business owner profile
    let req = test::TestRequest::post()
        .uri("/api/v1/users")
        .insert_header(bearer(SEED_ADMIN_ID))
        .set_json(json!({
            "id": "owner-1",
            "firstName": "Nasrin",
            "lastName": "Karimi",
            "email": "nasrin@example.com",
            "userType": "business_owner"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let owner: ApiResponse<User> = test::read_body_json(resp).await;
    assert_eq!(owner.data.expect("profile").user_type, UserType::BusinessOwner);

    // Owner asks for approved status; it is ignored
    let req = test::TestRequest::post()
        .uri("/api/v1/businesses")
        .insert_header(bearer("owner-1"))
        .set_json(listing_payload("Shiraz Sweets"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: ApiResponse<Business> = test::read_body_json(resp).await;
    let created = created.data.expect("created listing");
    assert_eq!(created.status, BusinessStatus::Pending);
    assert_eq!(created.rating, 0.0);
    assert_eq!(created.review_count, 0);
    assert_eq!(created.image, "https://images.example.com/shiraz/front.jpg");

    // Owner cannot moderate
    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/businesses/{}/status", created.id))
        .insert_header(bearer("owner-1"))
        .set_json(json!({ "status": "approved" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );

    // Admin can
    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/businesses/{}/status", created.id))
        .insert_header(bearer(SEED_ADMIN_ID))
        .set_json(json!({ "status": "approved" }))
        .to_request();
    let body: ApiResponse<Business> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.data.expect("moderated").status, BusinessStatus::Approved);
}

#[actix_rt::test]
async fn invalid_listing_payload_is_rejected_before_storage() {
    let app = test::init_service(
        App::new()
            .app_data(seeded_state())
            .configure(handlers::configure),
    )
    .await;

    let mut payload = listing_payload("Shiraz Sweets");
    payload["website"] = json!("not a url");

    let req = test::TestRequest::post()
        .uri("/api/v1/businesses")
        .insert_header(bearer(SEED_ADMIN_ID))
        .set_json(payload)
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::BAD_REQUEST
    );

    let req = test::TestRequest::get().uri("/api/v1/businesses").to_request();
    let body: ApiResponse<Vec<Business>> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.data.expect("listing data").len(), 4);
}

#[actix_rt::test]
async fn update_replaces_record_and_missing_id_is_not_found() {
    let app = test::init_service(
        App::new()
            .app_data(seeded_state())
            .configure(handlers::configure),
    )
    .await;

    let mut payload = listing_payload("Toranj Restaurant & Garden");
    payload["status"] = json!("rejected");

    let req = test::TestRequest::put()
        .uri("/api/v1/businesses/1")
        .insert_header(bearer(SEED_ADMIN_ID))
        .set_json(payload.clone())
        .to_request();
    let body: ApiResponse<Business> = test::call_and_read_body_json(&app, req).await;
    let updated = body.data.expect("updated listing");
    assert_eq!(updated.name, "Toranj Restaurant & Garden");
    assert_eq!(updated.status, BusinessStatus::Rejected);
    assert_eq!(updated.rating, 4.7, "rating is echoed back untouched");
    assert_eq!(updated.review_count, 128);
    assert_eq!(updated.website, None);

    let req = test::TestRequest::put()
        .uri("/api/v1/businesses/missing")
        .insert_header(bearer(SEED_ADMIN_ID))
        .set_json(payload)
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[actix_rt::test]
async fn deleted_listing_is_no_longer_found() {
    let app = test::init_service(
        App::new()
            .app_data(seeded_state())
            .configure(handlers::configure),
    )
    .await;

    let req = test::TestRequest::delete()
        .uri("/api/v1/businesses/4")
        .insert_header(bearer(SEED_ADMIN_ID))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NO_CONTENT
    );

    let req = test::TestRequest::get()
        .uri("/api/v1/businesses/4")
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );

    let req = test::TestRequest::delete()
        .uri("/api/v1/businesses/4")
        .insert_header(bearer(SEED_ADMIN_ID))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[actix_rt::test]
async fn profile_endpoints_are_admin_only() {
    let app = test::init_service(
        App::new()
            .app_data(seeded_state())
            .configure(handlers::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/users")
        .insert_header(bearer(SEED_ADMIN_ID))
        .set_json(json!({
            "id": "regular-1",
            "firstName": "Reza",
            "lastName": "Ahmadi",
            "email": "reza@example.com"
        }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::CREATED
    );

    let req = test::TestRequest::get()
        .uri("/api/v1/me")
        .insert_header(bearer("regular-1"))
        .to_request();
    let me: ApiResponse<User> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(me.data.expect("profile").user_type, UserType::Regular);

    let req = test::TestRequest::get()
        .uri("/api/v1/users")
        .insert_header(bearer("regular-1"))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );

    let req = test::TestRequest::get()
        .uri("/api/v1/users?userType=regular")
        .insert_header(bearer(SEED_ADMIN_ID))
        .to_request();
    let users: ApiResponse<Vec<User>> = test::call_and_read_body_json(&app, req).await;
    let users = users.data.expect("profiles");
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].email, "reza@example.com");

    let req = test::TestRequest::post()
        .uri("/api/v1/businesses")
        .insert_header(bearer("regular-1"))
        .set_json(listing_payload("Reza's Kiosk"))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );
}

#[actix_rt::test]
async fn unusable_origin_is_a_bad_request() {
    let app = test::init_service(
        App::new()
            .app_data(seeded_state())
            .configure(handlers::configure),
    )
    .await;

    for uri in [
        "/api/v1/businesses?lat=NaN&lng=51.4",
        "/api/v1/businesses?lat=95.0&lng=51.4",
        "/api/v1/businesses?lat=35.7&lng=inf",
    ] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");

        let body: ApiResponse<()> = test::read_body_json(resp).await;
        assert!(!body.success);
        assert!(body.error.is_some());
    }
}

#[actix_rt::test]
async fn empty_category_parameter_lists_everything() {
    let app = test::init_service(
        App::new()
            .app_data(seeded_state())
            .configure(handlers::configure),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/v1/businesses?category=")
        .to_request();
    let body: ApiResponse<Vec<Business>> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.data.expect("listing data").len(), 4);
}
