mod common;

use anyhow::Result;
use axum::body::{to_bytes, Body};
use axum::http::Request;
use chrono::{Datelike, Utc};
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use caseflow_api::app;
use common::{test_config, test_state, TestServer};

async fn create_case(server: &TestServer, token: &str, body: Value) -> Result<Value> {
    let (status, body) = server.call(Method::POST, "/cases/", Some(token), Some(body)).await?;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    Ok(body["data"].clone())
}

#[tokio::test]
async fn create_assigns_internal_code_and_author() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = server.admin_token().await?;
    let year = Utc::now().year();

    let first = create_case(&server, &token, json!({ "caratula": "Gómez c/ Pérez s/ daños" })).await?;
    let second = create_case(&server, &token, json!({ "caratula": "López s/ sucesión" })).await?;

    assert_eq!(first["codigo_interno"], format!("ENT-0001-{}-JLCA", year));
    assert_eq!(second["codigo_interno"], format!("ENT-0002-{}-JLCA", year));
    assert_eq!(first["estado"], "Abierto");
    assert_eq!(first["created_by_username"], "admin");
    assert_eq!(first["last_modified_by_username"], "admin");
    assert_eq!(first["actuaciones"], json!([]));
    Ok(())
}

#[tokio::test]
async fn create_ignores_read_only_fields_and_requires_caratula() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = server.admin_token().await?;

    let case = create_case(
        &server,
        &token,
        json!({ "caratula": "Caso", "codigo_interno": "HACKED", "id": 999, "fecha_inicio": "" }),
    )
    .await?;
    assert_ne!(case["codigo_interno"], "HACKED");
    assert_ne!(case["id"], 999);
    assert!(case["fecha_inicio"].is_null());

    let (status, body) = server
        .call(Method::POST, "/cases/", Some(&token), Some(json!({ "caratula": "  " })))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["caratula"].is_string());
    Ok(())
}

#[tokio::test]
async fn list_filters_by_search_and_status() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = server.admin_token().await?;

    create_case(&server, &token, json!({ "caratula": "Gómez c/ Pérez", "cliente_nombre": "Ana Gómez" })).await?;
    create_case(
        &server,
        &token,
        json!({ "caratula": "Ruiz s/ despido", "nro_expediente": "EXP-77/2024", "estado": "Cerrado" }),
    )
    .await?;

    let (_, all) = server.call(Method::GET, "/cases/", Some(&token), None).await?;
    assert_eq!(all["data"].as_array().unwrap().len(), 2);
    // Most recently updated first
    assert_eq!(all["data"][0]["caratula"], "Ruiz s/ despido");

    let (_, by_client) = server.call(Method::GET, "/cases/?search=ana%20g", Some(&token), None).await?;
    assert_eq!(by_client["data"].as_array().unwrap().len(), 1);
    assert_eq!(by_client["data"][0]["caratula"], "Gómez c/ Pérez");

    let (_, by_file) = server.call(Method::GET, "/cases/?search=exp-77", Some(&token), None).await?;
    assert_eq!(by_file["data"][0]["caratula"], "Ruiz s/ despido");

    let (_, closed) = server.call(Method::GET, "/cases/?estado=Cerrado", Some(&token), None).await?;
    assert_eq!(closed["data"].as_array().unwrap().len(), 1);

    let (status, unknown) = server.call(Method::GET, "/cases/?estado=Archivado", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unknown["data"], json!([]));
    Ok(())
}

#[tokio::test]
async fn patch_and_put_record_the_modifier() -> Result<()> {
    let server = TestServer::spawn().await?;
    let admin = server.admin_token().await?;
    let user = server.user_token("mgarcia", false).await?;

    let case = create_case(&server, &admin, json!({ "caratula": "Original", "juzgado": "Civil 3" })).await?;
    let id = case["id"].as_i64().unwrap();

    let (status, body) = server
        .call(Method::PATCH, &format!("/cases/{}/", id), Some(&user), Some(json!({ "estado": "En Trámite" })))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["estado"], "En Trámite");
    assert_eq!(body["data"]["juzgado"], "Civil 3");
    assert_eq!(body["data"]["created_by_username"], "admin");
    assert_eq!(body["data"]["last_modified_by_username"], "mgarcia");
    assert_eq!(body["data"]["codigo_interno"], case["codigo_interno"]);

    let (status, body) = server
        .call(Method::PUT, &format!("/cases/{}/", id), Some(&admin), Some(json!({ "caratula": "Reemplazado" })))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["caratula"], "Reemplazado");
    assert_eq!(body["data"]["juzgado"], "");
    assert_eq!(body["data"]["estado"], "Abierto");
    assert_eq!(body["data"]["last_modified_by_username"], "admin");
    Ok(())
}

#[tokio::test]
async fn detail_includes_nested_records_and_delete_cascades() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = server.admin_token().await?;
    let case = create_case(&server, &token, json!({ "caratula": "Con registros" })).await?;
    let id = case["id"].as_i64().unwrap();

    let (status, actuacion) = server
        .call(
            Method::POST,
            &format!("/cases/{}/add_actuacion/", id),
            Some(&token),
            Some(json!({ "fecha": "2025-03-10", "descripcion": "Presentación de demanda", "tipo": "Escrito" })),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(actuacion["data"]["caso"], id);

    let (status, _) = server
        .call(
            Method::POST,
            &format!("/cases/{}/add_alerta/", id),
            Some(&token),
            Some(json!({ "titulo": "Contestar traslado", "fecha_vencimiento": "2025-04-01", "hora": "09:30" })),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = server
        .call(
            Method::POST,
            &format!("/cases/{}/add_note/", id),
            Some(&token),
            Some(json!({ "titulo": "Estrategia", "contenido": "Pedir pericia contable" })),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);

    let (status, detail) = server.call(Method::GET, &format!("/cases/{}/", id), Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["data"]["actuaciones"].as_array().unwrap().len(), 1);
    assert_eq!(detail["data"]["alertas"][0]["hora"], "09:30:00");
    assert_eq!(detail["data"]["alertas"][0]["prioridad"], "Media");
    assert_eq!(detail["data"]["notas"][0]["created_by_username"], "admin");

    let (status, body) = server.call(Method::DELETE, &format!("/cases/{}/", id), Some(&token), None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, _) = server.call(Method::GET, &format!("/cases/{}/", id), Some(&token), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, alertas) = server.call(Method::GET, "/alertas/", Some(&token), None).await?;
    assert_eq!(alertas["data"], json!([]));
    Ok(())
}

#[tokio::test]
async fn nested_creation_on_unknown_case_is_not_found() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = server.admin_token().await?;

    let (status, body) = server
        .call(
            Method::POST,
            "/cases/404/add_note/",
            Some(&token),
            Some(json!({ "titulo": "Huérfana" })),
        )
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Case not found");

    let (status, _) = server.call(Method::GET, "/cases/abc/", Some(&token), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn dashboard_reports_counts_recent_cases_and_alerts() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = server.admin_token().await?;

    for i in 0..6 {
        let estado = if i % 2 == 0 { "Abierto" } else { "Pausado" };
        create_case(&server, &token, json!({ "caratula": format!("Caso {i}"), "estado": estado })).await?;
    }
    let (_, cases) = server.call(Method::GET, "/cases/", Some(&token), None).await?;
    let oldest = cases["data"][5]["id"].as_i64().unwrap();
    server
        .call(
            Method::POST,
            &format!("/cases/{}/add_alerta/", oldest),
            Some(&token),
            Some(json!({ "titulo": "Vence plazo", "fecha_vencimiento": "2025-07-01", "prioridad": "Alta" })),
        )
        .await?;

    let (status, body) = server.call(Method::GET, "/dashboard/", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(
        data["stats"],
        json!({ "total_cases": 6, "open_cases": 3, "in_progress_cases": 0, "paused_cases": 3, "closed_cases": 0 })
    );
    assert_eq!(data["recent_cases"].as_array().unwrap().len(), 5);
    assert_eq!(data["recent_cases"][0]["caratula"], "Caso 5");
    assert_eq!(data["alertas"][0]["prioridad"], "Alta");
    Ok(())
}

#[tokio::test]
async fn router_handles_requests_without_a_socket() -> Result<()> {
    let state = test_state(test_config()).await?;
    let service = app(state);

    let response = service
        .clone()
        .oneshot(Request::builder().uri("/api/cases/").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = service
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login/")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await?)?;
    assert_eq!(body["code"], "INVALID_JSON");
    Ok(())
}
