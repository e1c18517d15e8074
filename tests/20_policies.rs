mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn create_and_fetch_policy() -> Result<()> {
    let server = common::TestServer::start("policy-create").await?;

    let res = server
        .client
        .post(server.url("/api/policies"))
        .json(&json!({ "policy_number": "POL-1", "attended": true }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(res.json::<Value>().await?, json!({ "id": 1 }));

    let policy = server
        .client
        .get(server.url("/api/policies/1"))
        .send()
        .await?
        .json::<Value>()
        .await?;
    assert_eq!(
        policy,
        json!({
            "id": 1,
            "policy_number": "POL-1",
            "claim_number": null,
            "date": null,
            "address": null,
            "attended": 1,
            "broker_letter_number": null,
            "broker_letter_date": null
        })
    );
    Ok(())
}

#[tokio::test]
async fn put_replaces_every_field() -> Result<()> {
    let server = common::TestServer::start("policy-put").await?;
    let id = server
        .create(
            "/api/policies",
            json!({ "policy_number": "POL-1", "claim_number": "C-1", "date": "2024-02-01", "attended": true }),
        )
        .await?;

    let res = server
        .client
        .put(server.url(&format!("/api/policies/{}", id)))
        .json(&json!({
            "policy_number": "POL-1B",
            "address": "Calle Mayor 1",
            "broker_letter_number": "BL-3",
            "broker_letter_date": "2024-03-15",
            "date": ""
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let policy = server
        .client
        .get(server.url(&format!("/api/policies/{}", id)))
        .send()
        .await?
        .json::<Value>()
        .await?;
    assert_eq!(policy["policy_number"], "POL-1B");
    assert!(policy["claim_number"].is_null());
    assert!(policy["date"].is_null());
    assert_eq!(policy["attended"], 0);
    assert_eq!(policy["address"], "Calle Mayor 1");
    assert_eq!(policy["broker_letter_date"], "2024-03-15");
    Ok(())
}

#[tokio::test]
async fn missing_policy_number_is_rejected() -> Result<()> {
    let server = common::TestServer::start("policy-validation").await?;

    let res = server
        .client
        .post(server.url("/api/policies"))
        .json(&json!({ "claim_number": "C-1" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["field_errors"]["policy_number"].is_string());

    let res = server
        .client
        .post(server.url("/api/policies"))
        .header("content-type", "application/json")
        .body("{ not json")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>().await?["code"], "INVALID_JSON");
    Ok(())
}

#[tokio::test]
async fn unknown_policy_is_404() -> Result<()> {
    let server = common::TestServer::start("policy-404").await?;

    let res = server.client.get(server.url("/api/policies/77")).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.json::<Value>().await?["code"], "NOT_FOUND");

    let res = server
        .client
        .put(server.url("/api/policies/77"))
        .json(&json!({ "policy_number": "POL-77" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}
