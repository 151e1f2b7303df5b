mod common;

use anyhow::Result;
use reqwest::{Method, StatusCode};
use serde_json::json;

use common::{TestServer, ADMIN_PASSWORD, ADMIN_USERNAME};

#[tokio::test]
async fn health_and_root_are_public() -> Result<()> {
    let server = TestServer::spawn().await?;
    let client = reqwest::Client::new();

    let res = client.get(format!("{}/health", server.base_url)).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await?;
    assert_eq!(body["data"]["status"], "ok");

    let res = client.get(format!("{}/", server.base_url)).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["name"], "Caseflow API");
    Ok(())
}

#[tokio::test]
async fn login_returns_tokens_and_user() -> Result<()> {
    let server = TestServer::spawn().await?;

    let (status, body) = server
        .call(
            Method::POST,
            "/auth/login/",
            None,
            Some(json!({ "username": ADMIN_USERNAME, "password": ADMIN_PASSWORD })),
        )
        .await?;

    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert!(data["access"].as_str().is_some_and(|t| !t.is_empty()));
    assert!(data["refresh"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(data["user"]["id"], 1);
    assert_eq!(data["user"]["username"], ADMIN_USERNAME);
    assert_eq!(data["user"]["is_admin"], true);
    Ok(())
}

#[tokio::test]
async fn login_rejects_bad_credentials_and_missing_fields() -> Result<()> {
    let server = TestServer::spawn().await?;

    let (status, body) = server
        .call(
            Method::POST,
            "/auth/login/",
            None,
            Some(json!({ "username": ADMIN_USERNAME, "password": "wrong" })),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Credenciales incorrectas.");

    let (status, body) = server
        .call(Method::POST, "/auth/login/", None, Some(json!({ "username": "nobody", "password": "x" })))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Credenciales incorrectas.");

    let (status, body) = server
        .call(Method::POST, "/auth/login/", None, Some(json!({ "username": ADMIN_USERNAME })))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["field_errors"]["password"].is_string());
    Ok(())
}

#[tokio::test]
async fn refresh_issues_new_access_token() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (_, refresh) = server.login(ADMIN_USERNAME, ADMIN_PASSWORD).await?;

    let (status, body) = server
        .call(Method::POST, "/auth/refresh/", None, Some(json!({ "refresh": refresh })))
        .await?;
    assert_eq!(status, StatusCode::OK);
    let access = body["data"]["access"].as_str().unwrap().to_string();

    let (status, body) = server.call(Method::GET, "/auth/me/", Some(&access), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], ADMIN_USERNAME);
    Ok(())
}

#[tokio::test]
async fn refresh_rejects_garbage_and_access_tokens() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (access, _) = server.login(ADMIN_USERNAME, ADMIN_PASSWORD).await?;

    let (status, _) = server
        .call(Method::POST, "/auth/refresh/", None, Some(json!({ "refresh": "not-a-token" })))
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = server
        .call(Method::POST, "/auth/refresh/", None, Some(json!({ "refresh": access })))
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn protected_routes_require_a_valid_access_token() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (_, refresh) = server.login(ADMIN_USERNAME, ADMIN_PASSWORD).await?;

    let (status, body) = server.call(Method::GET, "/cases/", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = server.call(Method::GET, "/cases/", Some("garbage"), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // A refresh token is not accepted where an access token is expected
    let (status, _) = server.call(Method::GET, "/auth/me/", Some(&refresh), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn trailing_slash_is_optional() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = server.admin_token().await?;

    let (with_slash, _) = server.call(Method::GET, "/auth/me/", Some(&token), None).await?;
    let (without_slash, _) = server.call(Method::GET, "/auth/me", Some(&token), None).await?;
    assert_eq!(with_slash, StatusCode::OK);
    assert_eq!(without_slash, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn deleted_user_token_stops_working() -> Result<()> {
    let server = TestServer::spawn().await?;
    let admin = server.admin_token().await?;
    let token = server.user_token("lperez", false).await?;

    let (_, users) = server.call(Method::GET, "/users/", Some(&admin), None).await?;
    let id = users["data"][0]["id"].as_i64().unwrap();
    let (status, _) = server.call(Method::DELETE, &format!("/users/{}/", id), Some(&admin), None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = server.call(Method::GET, "/auth/me/", Some(&token), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}
