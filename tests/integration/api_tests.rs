//! API integration tests
//!
//! These run against a live server whose bootstrap administrator is
//! admin/admin (see `.env.example`). Start it, then: cargo test -- --ignored

use chrono::{Duration, NaiveDate, Utc};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

const BASE_URL: &str = "http://localhost:8080/api/v1";

async fn login(client: &Client, username: &str, password: &str) -> String {
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

async fn admin_token(client: &Client) -> String {
    login(client, "admin", "admin").await
}

fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, &Uuid::new_v4().simple().to_string()[..8])
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

async fn post_json(client: &Client, token: &str, path: &str, body: Value) -> Value {
    let response = client
        .post(format!("{}{}", BASE_URL, path))
        .bearer_auth(token)
        .json(&body)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::CREATED, "POST {} failed", path);
    response.json().await.expect("Failed to parse response")
}

async fn create_author(client: &Client, token: &str) -> i64 {
    let author = post_json(
        client,
        token,
        "/authors",
        json!({ "first_name": "Gabriel", "last_name": unique("Garcia") }),
    )
    .await;
    author["id"].as_i64().expect("No author id")
}

async fn create_book(client: &Client, token: &str, author_id: Option<i64>) -> i64 {
    let book = post_json(
        client,
        token,
        "/books",
        json!({
            "title": unique("Cien anos"),
            "summary": "Seven generations of the Buendia family.",
            "isbn": "9780060883287",
            "author_id": author_id,
        }),
    )
    .await;
    book["id"].as_i64().expect("No book id")
}

async fn create_instance(client: &Client, token: &str, book_id: i64, extra: Value) -> String {
    let mut body = json!({ "book_id": book_id, "imprint": "Harper, 2006" });
    if let (Some(body), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
        body.extend(extra.clone());
    }
    let instance = post_json(client, token, "/book-instances", body).await;
    instance["id"].as_str().expect("No instance id").to_string()
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_login() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "username": "admin", "password": "admin" }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["token"].is_string());
    assert_eq!(body["token_type"], "Bearer");
    assert!(body["user"].get("password").is_none());
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "username": "admin", "password": "wrong" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_catalog_writes_need_a_token() {
    let client = Client::new();

    let response = client
        .post(format!("{}/genres", BASE_URL))
        .json(&json!({ "name": "Fantasy" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_summary_is_public() {
    let client = Client::new();

    let response = client
        .get(format!("{}/catalog/summary", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["title_term"], "el");
    assert!(body["num_books"].is_i64());
}

#[tokio::test]
#[ignore]
async fn test_renew_three_weeks_ahead() {
    let client = Client::new();
    let token = admin_token(&client).await;
    let book_id = create_book(&client, &token, None).await;
    let instance_id = create_instance(
        &client,
        &token,
        book_id,
        json!({ "status": "on_loan", "due_back": today() + Duration::days(2) }),
    )
    .await;

    let proposal: Value = client
        .get(format!("{}/book-instances/{}/renew", BASE_URL, instance_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    let proposed = proposal["proposed_renewal_date"].clone();
    assert_eq!(proposed, json!(today() + Duration::days(21)));

    let response = client
        .post(format!("{}/book-instances/{}/renew", BASE_URL, instance_id))
        .bearer_auth(&token)
        .json(&json!({ "renewal_date": proposed }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["due_back"], proposed);
    assert_eq!(body["status"], "on_loan");
}

#[tokio::test]
#[ignore]
async fn test_renew_rejects_past_and_far_dates() {
    let client = Client::new();
    let token = admin_token(&client).await;
    let book_id = create_book(&client, &token, None).await;
    let due_back = today() + Duration::days(2);
    let instance_id = create_instance(
        &client,
        &token,
        book_id,
        json!({ "status": "on_loan", "due_back": due_back }),
    )
    .await;

    for date in [today() - Duration::days(1), today() + Duration::days(29)] {
        let response = client
            .post(format!("{}/book-instances/{}/renew", BASE_URL, instance_id))
            .bearer_auth(&token)
            .json(&json!({ "renewal_date": date }))
            .send()
            .await
            .expect("Failed to send request");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    let instance: Value = client
        .get(format!("{}/book-instances/{}", BASE_URL, instance_id))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(instance["due_back"], json!(due_back));
}

#[tokio::test]
#[ignore]
async fn test_deleting_author_keeps_books() {
    let client = Client::new();
    let token = admin_token(&client).await;
    let author_id = create_author(&client, &token).await;
    let book_id = create_book(&client, &token, Some(author_id)).await;

    let response = client
        .delete(format!("{}/authors/{}", BASE_URL, author_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let book: Value = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert!(book["author"].is_null());
}

#[tokio::test]
#[ignore]
async fn test_my_loans_in_due_then_creation_order() {
    let client = Client::new();
    let token = admin_token(&client).await;

    let username = unique("reader");
    let reader = post_json(
        &client,
        &token,
        "/users",
        json!({ "username": username, "password": "reader-pass" }),
    )
    .await;
    let reader_id = reader["id"].as_i64().expect("No user id");

    let book_id = create_book(&client, &token, None).await;
    let later = create_instance(
        &client,
        &token,
        book_id,
        json!({ "status": "on_loan", "borrower_id": reader_id, "due_back": today() + Duration::days(10) }),
    )
    .await;
    let overdue = create_instance(
        &client,
        &token,
        book_id,
        json!({ "status": "on_loan", "borrower_id": reader_id, "due_back": today() - Duration::days(3) }),
    )
    .await;
    let tie_first = create_instance(
        &client,
        &token,
        book_id,
        json!({ "status": "on_loan", "borrower_id": reader_id, "due_back": today() + Duration::days(5) }),
    )
    .await;
    let tie_second = create_instance(
        &client,
        &token,
        book_id,
        json!({ "status": "on_loan", "borrower_id": reader_id, "due_back": today() + Duration::days(5) }),
    )
    .await;
    let undated = create_instance(
        &client,
        &token,
        book_id,
        json!({ "status": "on_loan", "borrower_id": reader_id }),
    )
    .await;
    create_instance(
        &client,
        &token,
        book_id,
        json!({ "status": "reserved", "borrower_id": reader_id, "due_back": today() }),
    )
    .await;

    let reader_token = login(&client, &username, "reader-pass").await;
    let body: Value = client
        .get(format!("{}/loans/mine", BASE_URL))
        .bearer_auth(&reader_token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");

    let ids: Vec<&str> = body["items"]
        .as_array()
        .expect("No items")
        .iter()
        .map(|item| item["id"].as_str().expect("No instance id"))
        .collect();

    // Equal due dates keep creation order; copies without a due date come last
    assert_eq!(body["total"], 5);
    assert_eq!(
        ids,
        vec![
            overdue.as_str(),
            tie_first.as_str(),
            tie_second.as_str(),
            later.as_str(),
            undated.as_str(),
        ]
    );
    assert_eq!(body["items"][0]["is_overdue"], true);
    assert_eq!(body["items"][4]["is_overdue"], false);

    let response = client
        .get(format!("{}/loans", BASE_URL))
        .bearer_auth(&reader_token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
