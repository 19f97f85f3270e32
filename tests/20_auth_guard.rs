mod common;

use anyhow::Result;
use reqwest::StatusCode;

// Every /api route must reject requests without a valid bearer token
// before touching anything else.

#[tokio::test]
async fn protected_routes_require_a_token() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    for path in [
        "/api/auth/me",
        "/api/patients/me",
        "/api/caregivers/patients",
        "/api/medications?patientProfileId=00000000-0000-0000-0000-000000000000",
        "/api/treatments?patientProfileId=00000000-0000-0000-0000-000000000000",
        "/api/appointments?patientProfileId=00000000-0000-0000-0000-000000000000",
        "/api/intake-events?patientProfileId=00000000-0000-0000-0000-000000000000",
    ] {
        let res = client.get(format!("{}{}", server.base_url, path)).send().await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "no 401 for {}", path);

        let body = res.json::<serde_json::Value>().await?;
        assert_eq!(body["code"], "UNAUTHORIZED", "wrong error code for {}", path);
    }

    Ok(())
}

#[tokio::test]
async fn garbage_bearer_token_is_rejected() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/auth/me", server.base_url))
        .header("authorization", "Bearer not.a.jwt")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn basic_auth_scheme_is_rejected() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/patients/me", server.base_url))
        .header("authorization", "Basic dXNlcjpwYXNz")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn register_validates_before_anything_else() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    // Short password and bad email fail validation regardless of database state
    let res = client
        .post(format!("{}/auth/register", server.base_url))
        .json(&serde_json::json!({
            "email": "not-an-email",
            "password": "short",
            "role": "PATIENT"
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["field_errors"]["email"].is_string());
    assert!(body["field_errors"]["password"].is_string());
    Ok(())
}

#[tokio::test]
async fn unknown_role_is_rejected_at_registration() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    // Role is a closed enum; deserialization fails before any handler logic
    let res = client
        .post(format!("{}/auth/register", server.base_url))
        .json(&serde_json::json!({
            "email": "someone@example.com",
            "password": "long-enough",
            "role": "AUDITOR"
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    Ok(())
}
