mod common;

use anyhow::Result;
use reqwest::{Method, StatusCode};
use serde_json::json;

use common::TestServer;

#[tokio::test]
async fn protected_account_is_hidden() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = server.admin_token().await?;
    server.user_token("lucia", false).await?;

    let (status, body) = server.call(Method::GET, "/users/", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    let users = body["data"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["username"], "lucia");
    assert!(users[0].get("password_hash").is_none());

    for method in [Method::GET, Method::DELETE] {
        let (status, _) = server.call(method, "/users/1/", Some(&token), None).await?;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
    let (status, _) = server
        .call(Method::PATCH, "/users/1/", Some(&token), Some(json!({ "is_admin": false })))
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn non_admins_are_forbidden() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = server.user_token("pablo", false).await?;

    let (status, body) = server.call(Method::GET, "/users/", Some(&token), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);

    let (status, _) = server
        .call(
            Method::POST,
            "/users/",
            Some(&token),
            Some(json!({ "username": "intruso", "password": "secret-pw" })),
        )
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Ordinary routes still work for them
    let (status, _) = server.call(Method::GET, "/cases/", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn create_validates_username_and_password() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = server.admin_token().await?;

    let (status, body) = server
        .call(Method::POST, "/users/", Some(&token), Some(json!({ "username": "ana", "password": "abc" })))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["password"].is_string());

    let (status, body) = server
        .call(Method::POST, "/users/", Some(&token), Some(json!({ "username": "ana", "password": "abcd" })))
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["is_admin"], false);
    assert_eq!(body["data"]["is_staff"], false);

    let (status, body) = server
        .call(Method::POST, "/users/", Some(&token), Some(json!({ "username": "ana", "password": "other-pw" })))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field_errors"]["username"], "A user with that username already exists.");

    // Also clashes with the hidden account
    let (status, _) = server
        .call(Method::POST, "/users/", Some(&token), Some(json!({ "username": "admin", "password": "other-pw" })))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn admin_flag_implies_staff_and_can_be_patched() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = server.admin_token().await?;

    let (status, body) = server
        .call(
            Method::POST,
            "/users/",
            Some(&token),
            Some(json!({ "username": "socia", "password": "secret-pw", "is_admin": true })),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["is_staff"], true);
    let id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = server
        .call(
            Method::PATCH,
            &format!("/users/{}/", id),
            Some(&token),
            Some(json!({ "username": "socia.mayor", "is_admin": false })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "socia.mayor");
    assert_eq!(body["data"]["is_admin"], false);
    assert_eq!(body["data"]["is_staff"], false);

    // Demotion takes effect on the next request with an existing token
    let demoted = server.login("socia.mayor", "secret-pw").await?.0;
    let (status, _) = server.call(Method::GET, "/users/", Some(&demoted), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn admins_cannot_delete_themselves() -> Result<()> {
    let server = TestServer::spawn().await?;
    let admin = server.admin_token().await?;
    let second = server.user_token("segunda", true).await?;

    let (_, me) = server.call(Method::GET, "/auth/me/", Some(&second), None).await?;
    let own_id = me["data"]["id"].as_i64().unwrap();

    let (status, body) = server
        .call(Method::DELETE, &format!("/users/{}/", own_id), Some(&second), None)
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "You cannot delete your own account.");

    let (status, _) = server
        .call(Method::DELETE, &format!("/users/{}/", own_id), Some(&admin), None)
        .await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // The deleted account's token stops working
    let (status, _) = server.call(Method::GET, "/auth/me/", Some(&second), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn deleting_a_user_keeps_their_cases() -> Result<()> {
    let server = TestServer::spawn().await?;
    let admin = server.admin_token().await?;
    let token = server.user_token("temporal", false).await?;

    let (_, created) = server
        .call(Method::POST, "/cases/", Some(&token), Some(json!({ "caratula": "Sucesión Gómez" })))
        .await?;
    let case_id = created["data"]["id"].as_i64().unwrap();
    let (_, me) = server.call(Method::GET, "/auth/me/", Some(&token), None).await?;
    let user_id = me["data"]["id"].as_i64().unwrap();

    let (status, _) = server
        .call(Method::DELETE, &format!("/users/{}/", user_id), Some(&admin), None)
        .await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = server
        .call(Method::GET, &format!("/cases/{}/", case_id), Some(&admin), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["created_by"].is_null());
    assert!(body["data"]["created_by_username"].is_null());
    Ok(())
}
