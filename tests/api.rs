//! HTTP API integration tests against an in-process server.

mod common;

use reqwest::{Method, StatusCode};
use serde_json::{Value, json};

use common::{TEST_PASSWORD, TestServer};
use coursework::types::Capability;

const VIDEO_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

async fn create_course(server: &TestServer, token: &str, title: &str) -> String {
    let (status, body) = server
        .post(
            "/api/v1/courses",
            token,
            json!({"title": title, "description": "about"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"]["id"].as_str().expect("course id").to_string()
}

async fn create_lesson(server: &TestServer, token: &str, course_id: &str, title: &str) -> String {
    let (status, body) = server
        .post(
            "/api/v1/lessons",
            token,
            json!({"course_id": course_id, "title": title, "video_url": VIDEO_URL}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"]["id"].as_str().expect("lesson id").to_string()
}

#[tokio::test]
async fn test_health() {
    let server = TestServer::start().await;
    let resp = reqwest::get(format!("{}/health", server.base_url))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_register_login_and_me() {
    let server = TestServer::start().await;

    let register = json!({
        "email": "  Alice@Example.com ",
        "password": "s3cret-pass",
        "password_confirm": "s3cret-pass",
        "first_name": "Alice"
    });
    let (status, body) = server
        .request(Method::POST, "/api/v1/auth/register", None, Some(register.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["user"]["email"], "alice@example.com");
    assert!(body["data"]["user"].get("password_hash").is_none());
    let token = body["data"]["token"].as_str().unwrap().to_string();

    let (status, _) = server
        .request(Method::POST, "/api/v1/auth/register", None, Some(register))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = server
        .request(
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(json!({"email": "bob@example.com", "password": "s3cret-pass", "password_confirm": "other-pass"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = server
        .request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({"email": "alice@example.com", "password": "wrong-pass"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid email or password");

    let (status, body) = server
        .request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({"email": "ALICE@example.com", "password": "s3cret-pass"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(body["data"]["token"].as_str().unwrap().starts_with("cw_"));

    let (status, body) = server.get("/api/v1/auth/me", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "alice@example.com");
    assert_eq!(body["data"]["first_name"], "Alice");
}

#[tokio::test]
async fn test_token_scopes_are_separate() {
    let server = TestServer::start().await;
    let user = server.create_user("user@example.com", Capability::default());

    let (status, _) = server
        .request(Method::GET, "/api/v1/courses", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = server.get("/api/v1/courses", &server.admin_token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = server.get("/api/v1/admin/users", &user.token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = server.get("/api/v1/courses", "cw_garbage").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = server
        .request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({"email": user.email, "password": TEST_PASSWORD})),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["user"]["id"], user.id);
}

#[tokio::test]
async fn test_inactive_user_is_rejected() {
    let server = TestServer::start().await;
    let user = server.create_user("idle@example.com", Capability::default());

    let mut record = server.store.get_user(&user.id).unwrap().unwrap();
    record.is_active = false;
    server.store.update_user(&record).unwrap();

    let (status, body) = server.get("/api/v1/auth/me", &user.token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Account is inactive");
}

#[tokio::test]
async fn test_course_ownership_and_moderation() {
    let server = TestServer::start().await;
    let owner = server.create_user("owner@example.com", Capability::default());
    let other = server.create_user("other@example.com", Capability::default());
    let moderator = server.create_user("mod@example.com", Capability::moderator());

    let course_id = create_course(&server, &owner.token, "Rust 101").await;
    let path = format!("/api/v1/courses/{course_id}");

    let (status, body) = server.get(&path, &other.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["owner_id"], owner.id);
    assert_eq!(body["data"]["lessons_count"], 0);

    let (status, _) = server
        .patch(&path, &other.token, json!({"title": "Hijacked"}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = server
        .patch(&path, &moderator.token, json!({"title": "Rust 101 (revised)"}))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["title"], "Rust 101 (revised)");
    assert_eq!(body["data"]["owner_id"], owner.id);

    let (status, _) = server.delete(&path, &moderator.token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = server.delete(&path, &other.token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = server.delete(&path, &owner.token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = server.get(&path, &owner.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_course_validation_and_listing() {
    let server = TestServer::start().await;
    let owner = server.create_user("owner@example.com", Capability::default());

    let (status, _) = server
        .post("/api/v1/courses", &owner.token, json!({"title": "   "}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    for i in 0..3 {
        create_course(&server, &owner.token, &format!("Course {i}")).await;
    }

    let (status, body) = server
        .get("/api/v1/courses?page=1&page_size=2", &owner.token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["has_more"], true);
    assert_eq!(body["page_size"], 2);

    let (_, body) = server
        .get("/api/v1/courses?page=2&page_size=2", &owner.token)
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["has_more"], false);

    let (status, body) = server
        .get("/api/v1/courses?page=9223372036854775807", &owner.token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());
    assert_eq!(body["has_more"], false);
}

#[tokio::test]
async fn test_lessons_belong_to_courses() {
    let server = TestServer::start().await;
    let owner = server.create_user("owner@example.com", Capability::default());
    let other = server.create_user("other@example.com", Capability::default());
    let course_id = create_course(&server, &owner.token, "Video course").await;

    for bad in [
        "https://vimeo.com/123",
        "ftp://youtube.com/watch?v=1",
        "https://youtube.com.evil.org/watch",
        "not a url",
    ] {
        let (status, body) = server
            .post(
                "/api/v1/lessons",
                &owner.token,
                json!({"course_id": course_id, "title": "Intro", "video_url": bad}),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{bad}: {body}");
    }

    let (status, _) = server
        .post(
            "/api/v1/lessons",
            &owner.token,
            json!({"course_id": "missing", "title": "Intro", "video_url": VIDEO_URL}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let lesson_id = create_lesson(&server, &owner.token, &course_id, "Intro").await;

    let (_, body) = server
        .get(&format!("/api/v1/courses/{course_id}"), &owner.token)
        .await;
    assert_eq!(body["data"]["lessons_count"], 1);
    assert_eq!(body["data"]["lessons"][0]["id"], lesson_id);

    let path = format!("/api/v1/lessons/{lesson_id}");
    let (status, _) = server
        .patch(&path, &other.token, json!({"title": "Mine now"}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = server
        .patch(&path, &owner.token, json!({"video_url": "https://example.com/v"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = server
        .patch(&path, &owner.token, json!({"video_url": "https://youtu.be/abc"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["video_url"], "https://youtu.be/abc");

    let (status, _) = server.delete(&path, &owner.token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_subscription_lifecycle() {
    let server = TestServer::start().await;
    let owner = server.create_user("owner@example.com", Capability::default());
    let student = server.create_user("student@example.com", Capability::default());
    let course_id = create_course(&server, &owner.token, "Subscribed").await;
    let subscribe = format!("/api/v1/courses/{course_id}/subscribe");
    let unsubscribe = format!("/api/v1/courses/{course_id}/unsubscribe");

    let (status, body) = server.post(&subscribe, &student.token, json!({})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["status"], "created");

    let (status, body) = server.post(&subscribe, &student.token, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "You are already subscribed to this course");

    let (status, body) = server.delete(&unsubscribe, &student.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "deactivated");

    // The row still exists, so a repeat is another deactivation.
    let (status, body) = server.delete(&unsubscribe, &student.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "deactivated");

    let stranger = server.create_user("stranger@example.com", Capability::default());
    let (status, _) = server.delete(&unsubscribe, &stranger.token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = server
        .post(
            "/api/v1/subscriptions",
            &student.token,
            json!({"course_id": course_id}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "reactivated");

    let (_, body) = server.get("/api/v1/subscriptions", &student.token).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _) = server.post(&subscribe, &owner.token, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = server
        .post("/api/v1/courses/missing/subscribe", &student.token, json!({}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = server
        .delete(&format!("/api/v1/subscriptions/{course_id}"), &student.token)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = server.get("/api/v1/subscriptions", &student.token).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_updates_notify_only_active_subscribers() {
    let server = TestServer::start().await;
    let owner = server.create_user("owner@example.com", Capability::default());
    let stays = server.create_user("stays@example.com", Capability::default());
    let leaves = server.create_user("leaves@example.com", Capability::default());
    let course_id = create_course(&server, &owner.token, "Newsworthy").await;

    for user in [&stays, &leaves] {
        let (status, _) = server
            .post(
                &format!("/api/v1/courses/{course_id}/subscribe"),
                &user.token,
                json!({}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }
    let (status, _) = server
        .delete(
            &format!("/api/v1/courses/{course_id}/unsubscribe"),
            &leaves.token,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let lesson_id = create_lesson(&server, &owner.token, &course_id, "Chapter 1").await;
    let sent = server.wait_for_mail(1).await;
    assert_eq!(sent[0].to, "stays@example.com");
    assert_eq!(sent[0].subject, "Course update: Newsworthy");
    assert!(sent[0].body.contains("Chapter 1"));

    let (status, _) = server
        .patch(
            &format!("/api/v1/courses/{course_id}"),
            &owner.token,
            json!({"description": "now with more"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let sent = server.wait_for_mail(2).await;
    assert_eq!(sent[1].body, "The course \"Newsworthy\" has been updated.");

    let (status, _) = server
        .patch(
            &format!("/api/v1/lessons/{lesson_id}"),
            &owner.token,
            json!({"title": "Chapter one"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let sent = server.wait_for_mail(3).await;
    assert!(sent.iter().all(|m| m.to == "stays@example.com"));
}

#[tokio::test]
async fn test_checkout_flow() {
    let server = TestServer::start().await;
    let owner = server.create_user("owner@example.com", Capability::default());
    let buyer = server.create_user("buyer@example.com", Capability::default());
    let course_id = create_course(&server, &owner.token, "Paid course").await;

    let (status, _) = server
        .post(
            "/api/v1/checkout/products",
            &buyer.token,
            json!({"course_id": course_id, "name": "Paid course"}),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = server
        .post(
            "/api/v1/checkout/products",
            &owner.token,
            json!({"course_id": course_id, "name": "Paid course"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let product_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = server
        .post(
            "/api/v1/checkout/products",
            &owner.token,
            json!({"course_id": course_id, "name": "Again"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let session_body = json!({
        "course_id": course_id,
        "success_url": "https://app.example.com/ok",
        "cancel_url": "https://app.example.com/cancel",
        "idempotency_key": "buyer-attempt-1"
    });

    let (status, _) = server
        .post("/api/v1/checkout/sessions", &buyer.token, session_body.clone())
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = server
        .post(
            "/api/v1/checkout/prices",
            &owner.token,
            json!({"product_id": product_id, "amount": -1.0}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = server
        .post(
            "/api/v1/checkout/prices",
            &owner.token,
            json!({"product_id": product_id, "amount": 25.0, "currency": "EUR"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["unit_amount"], 2500);
    assert_eq!(body["data"]["currency"], "eur");

    let (status, body) = server
        .post("/api/v1/checkout/sessions", &buyer.token, session_body.clone())
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["reused"], false);
    let local_id = body["data"]["local_session_id"].as_str().unwrap().to_string();
    let external_id = body["data"]["external_session_id"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(body["data"]["redirect_url"].is_string());

    let (status, body) = server
        .post("/api/v1/checkout/sessions", &buyer.token, session_body)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["reused"], true);
    assert_eq!(body["data"]["local_session_id"], local_id);

    let (status, _) = server
        .get(&format!("/api/v1/checkout/sessions/{local_id}"), &owner.token)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = server
        .get(
            &format!("/api/v1/checkout/sessions/{local_id}/status"),
            &buyer.token,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["payment_status"], "unpaid");
    assert_eq!(body["data"]["local_status"], "pending");

    let reconcile = format!("/api/v1/admin/sessions/{external_id}/status");
    let (status, body) = server
        .put(&reconcile, &server.admin_token, json!({"status": "paid"}))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "paid");

    let (status, _) = server
        .put(&reconcile, &server.admin_token, json!({"status": "pending"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = server
        .put(&reconcile, &server.admin_token, json!({"status": "paid"}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = server
        .post(
            &format!("/api/v1/checkout/sessions/{local_id}/sync"),
            &buyer.token,
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "paid");

    let (_, body) = server.get("/api/v1/checkout/sessions", &buyer.token).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_payments_ledger() {
    let server = TestServer::start().await;
    let owner = server.create_user("owner@example.com", Capability::default());
    let payer = server.create_user("payer@example.com", Capability::default());
    let course_id = create_course(&server, &owner.token, "Algebra").await;
    let lesson_id = create_lesson(&server, &owner.token, &course_id, "Matrices").await;

    let (status, _) = server
        .post(
            "/api/v1/payments",
            &payer.token,
            json!({"course_id": course_id, "lesson_id": lesson_id, "amount": 5.0, "method": "cash"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = server
        .post(
            "/api/v1/payments",
            &payer.token,
            json!({"amount": 5.0, "method": "cash"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = server
        .post(
            "/api/v1/payments",
            &payer.token,
            json!({"course_id": course_id, "amount": 5.0, "method": "card"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = server
        .post(
            "/api/v1/payments",
            &payer.token,
            json!({"lesson_id": "missing", "amount": 5.0, "method": "cash"}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = server
        .post(
            "/api/v1/payments",
            &payer.token,
            json!({"course_id": course_id, "amount": 120.0, "method": "transfer"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["method_display"], "Bank transfer");
    assert_eq!(body["data"]["item"]["kind"], "course");
    let payment_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = server
        .post(
            "/api/v1/payments",
            &payer.token,
            json!({"lesson_id": lesson_id, "amount": 15.0, "method": "cash"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = server
        .get("/api/v1/payments?ordering=-amount", &payer.token)
        .await;
    let amounts: Vec<f64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["amount"].as_f64().unwrap())
        .collect();
    assert_eq!(amounts, vec![120.0, 15.0]);

    let (_, body) = server
        .get("/api/v1/payments?method=cash", &payer.token)
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (_, body) = server
        .get("/api/v1/payments?search=matri", &payer.token)
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["item"]["id"], lesson_id);

    let (_, body) = server
        .get("/api/v1/payments?amount_min=100", &payer.token)
        .await;
    assert_eq!(body["data"][0]["id"], payment_id);

    let (status, _) = server
        .get("/api/v1/payments?ordering=user_id", &payer.token)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = server.get("/api/v1/payments", &owner.token).await;
    assert!(body["data"].as_array().unwrap().is_empty());

    let (status, _) = server
        .get(&format!("/api/v1/payments/{payment_id}"), &owner.token)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = server
        .get(&format!("/api/v1/payments/{payment_id}"), &payer.token)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_admin_user_management() {
    let server = TestServer::start().await;
    let admin = server.admin_token.clone();

    let (status, _) = server
        .post(
            "/api/v1/admin/users",
            &admin,
            json!({"email": "new@example.com", "capabilities": ["superuser"]}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = server
        .post(
            "/api/v1/admin/users",
            &admin,
            json!({"email": "New@Example.com", "capabilities": ["moderator"]}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["email"], "new@example.com");
    assert_eq!(
        body["data"]["capability_names"],
        json!(["course:moderate", "lesson:moderate"])
    );
    let user_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = server
        .post(
            "/api/v1/admin/users",
            &admin,
            json!({"email": "new@example.com"}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = server
        .put(
            &format!("/api/v1/admin/users/{user_id}/capabilities"),
            &admin,
            json!({"capabilities": ["course:moderate"]}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["capability_names"], json!(["course:moderate"]));

    let (status, body) = server
        .post(
            &format!("/api/v1/admin/users/{user_id}/tokens"),
            &admin,
            json!({"expires_in_seconds": 3600}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert!(body["data"]["metadata"].get("token_hash").is_none());
    let token = body["data"]["token"].as_str().unwrap().to_string();

    let (status, body) = server.get("/api/v1/auth/me", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], user_id);

    let (_, body) = server
        .get(&format!("/api/v1/admin/users/{user_id}/tokens"), &admin)
        .await;
    let token_id = body["data"][0]["id"].as_str().unwrap().to_string();

    let (status, _) = server
        .delete(&format!("/api/v1/admin/tokens/{token_id}"), &admin)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = server.get("/api/v1/auth/me", &token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, body): (_, Value) = server.get("/api/v1/admin/users", &admin).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}
