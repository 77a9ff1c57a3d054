use std::sync::Arc;

use anyhow::Result;
use fake::{
    faker::{internet::en::SafeEmail, lorem::en::Sentence, name::en::Name},
    Fake,
};
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use spiritual_cookie::web::types::MessageBody;

use crate::helpers::{FailingStore, TestApp};

fn valid_prayer() -> Value {
    json!({
        "name": "Ana",
        "email": "ana@example.com",
        "prayer": "For my family"
    })
}

async fn message(resp: reqwest::Response) -> Result<String> {
    Ok(resp.json::<MessageBody>().await?.message)
}

#[tokio::test]
async fn api_prayer_without_session_unauthorized() -> Result<()> {
    let (app, store) = TestApp::spawn().await?;

    let res = app.post_prayer(&valid_prayer()).await?;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(message(res).await?, "Unauthorized");
    assert!(store.records().is_empty());

    Ok(())
}

#[tokio::test]
async fn api_prayer_session_checked_before_body() -> Result<()> {
    let (app, store) = TestApp::spawn().await?;

    let res = app.post_prayer(&json!({})).await?;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(store.records().is_empty());

    Ok(())
}

#[tokio::test]
async fn api_prayer_ok() -> Result<()> {
    let (app, store) = TestApp::spawn().await?;
    app.sign_in("signed.in@example.com").await?;

    let res = app.post_prayer(&valid_prayer()).await?;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(message(res).await?, "Prayer request submitted successfully");

    let records = store.records();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.name, "Ana");
    assert_eq!(record.email, "ana@example.com");
    assert_eq!(record.prayer, "For my family");
    // The submitter comes from the session, never from the form.
    assert_eq!(record.user, "signed.in@example.com");
    assert!(record.date.timestamp_millis() > 0);

    Ok(())
}

#[tokio::test]
async fn api_prayer_fake_data_ok() -> Result<()> {
    let (app, store) = TestApp::spawn().await?;
    let user_email: String = SafeEmail().fake();
    app.sign_in(&user_email).await?;

    for _ in 0..3 {
        let name: String = Name().fake();
        let email: String = SafeEmail().fake();
        let prayer: String = Sentence(3..10).fake();

        let res = app
            .post_prayer(&json!({ "name": name, "email": email, "prayer": prayer }))
            .await?;
        assert_eq!(res.status(), StatusCode::OK);
    }

    let records = store.records();
    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|record| record.user == user_email));

    Ok(())
}

#[tokio::test]
async fn api_prayer_missing_fields_bad_request() -> Result<()> {
    let (app, store) = TestApp::spawn().await?;
    app.sign_in("ana@example.com").await?;

    let tests = [
        (json!({ "email": "ana@example.com", "prayer": "p" }), "Missing name"),
        (json!({ "name": "Ana", "email": "", "prayer": "p" }), "Empty email"),
        (json!({ "name": "Ana", "email": "ana@example.com", "prayer": null }), "Null prayer"),
        (json!({ "name": 5, "email": "ana@example.com", "prayer": "p" }), "Number as name"),
        (json!({}), "Empty json"),
        (json!("just a string"), "Not an object"),
    ];

    for (json_request, params) in tests {
        let res = app.post_prayer(&json_request).await?;
        assert_eq!(
            res.status(),
            StatusCode::BAD_REQUEST,
            "Wrong response: ({}), Expected: ({}); for request with: {params}",
            res.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(message(res).await?, "All fields are required");
    }
    assert!(store.records().is_empty());

    Ok(())
}

#[tokio::test]
async fn api_prayer_malformed_body_bad_request() -> Result<()> {
    let (app, store) = TestApp::spawn().await?;
    app.sign_in("ana@example.com").await?;

    let res = app
        .http_client
        .post(format!("{}/api/prayer", app.addr))
        .header("content-type", "application/json")
        .body("{ not json")
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(message(res).await?, "All fields are required");
    assert!(store.records().is_empty());

    Ok(())
}

#[tokio::test]
async fn api_prayer_other_methods_not_allowed() -> Result<()> {
    let (app, _) = TestApp::spawn().await?;

    for method in [Method::GET, Method::PUT, Method::DELETE, Method::PATCH] {
        let res = app
            .http_client
            .request(method.clone(), format!("{}/api/prayer", app.addr))
            .send()
            .await?;

        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED, "for {method}");
        assert_eq!(message(res).await?, "Method Not Allowed");
    }

    Ok(())
}

#[tokio::test]
async fn api_prayer_store_failure_internal_error() -> Result<()> {
    let app = TestApp::spawn_with_store(Arc::new(FailingStore)).await?;
    app.sign_in("ana@example.com").await?;

    let res = app.post_prayer(&valid_prayer()).await?;

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(message(res).await?, "Internal Server Error");

    Ok(())
}

#[tokio::test]
async fn every_response_has_request_id() -> Result<()> {
    let (app, _) = TestApp::spawn().await?;

    let ok = app.get("/health-check").await?;
    let err = app.post_prayer(&valid_prayer()).await?;

    for res in [ok, err] {
        let id = res
            .headers()
            .get("x-request-id")
            .and_then(|id| id.to_str().ok())
            .map(uuid::Uuid::parse_str);
        assert!(matches!(id, Some(Ok(_))), "missing x-request-id on {}", res.url());
    }

    Ok(())
}
