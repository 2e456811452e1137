//! Patient routes against a real Postgres with the schema applied.

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::{Value, json};
use sqlx::Row;

use crate::test_db::{TestDb, app_with_token, send};

fn patient(name: &str) -> Value {
    json!({
        "full_name": name,
        "birth_date": "1990-05-01",
        "gender": "FEMALE",
        "marital_status": "SINGLE",
        "email": "patient@example.com",
        "mobile_number": "0917 555 0100",
        "dental_history": { "palate": true, "past_dental_care_or_treatments": "braces" },
        "medical_chart": { "allergies": "penicillin", "diabetes": true }
    })
}

fn id_of(body: &Value) -> String {
    body["id"].as_str().unwrap_or_default().to_string()
}

#[tokio::test]
async fn create_and_fetch_with_nested_records() -> Result<()> {
    let Ok(db) = TestDb::new().await else {
        return Ok(());
    };
    let (app, token) = app_with_token(db.pool.clone())?;

    let (status, created) =
        send(&app, Method::POST, "/v1/patients", &token, Some(&patient("Ana Cruz"))).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["full_name"], "Ana Cruz");
    assert_eq!(created["dental_history"]["palate"], true);
    assert_eq!(created["dental_history"]["bad_breath"], false);
    assert_eq!(created["medical_chart"]["allergies"], "penicillin");
    assert!(created["age"].as_i64().is_some_and(|age| age >= 34));

    let id = id_of(&created);
    let (status, fetched) =
        send(&app, Method::GET, &format!("/v1/patients/{id}"), &token, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let nested = sqlx::query(
        "SELECT (SELECT COUNT(*) FROM dental_histories) AS dental, \
         (SELECT COUNT(*) FROM medical_charts) AS chart",
    )
    .fetch_one(&db.pool)
    .await?;
    assert_eq!(nested.try_get::<i64, _>("dental")?, 1);
    assert_eq!(nested.try_get::<i64, _>("chart")?, 1);
    Ok(())
}

#[tokio::test]
async fn search_escapes_wildcards_and_pages() -> Result<()> {
    let Ok(db) = TestDb::new().await else {
        return Ok(());
    };
    let (app, token) = app_with_token(db.pool.clone())?;

    for name in ["Ana 50%_ Cruz", "Ana Bautista", "Bea Santos"] {
        let (status, _) =
            send(&app, Method::POST, "/v1/patients", &token, Some(&patient(name))).await?;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, page) = send(&app, Method::GET, "/v1/patients?name=50%25_", &token, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["full_name"], "Ana 50%_ Cruz");

    let (_, page) = send(&app, Method::GET, "/v1/patients?name=a_b", &token, None).await?;
    assert_eq!(page["total"], 0);

    let (_, page) = send(&app, Method::GET, "/v1/patients?name=ANA", &token, None).await?;
    assert_eq!(page["total"], 2);

    let (_, first) = send(&app, Method::GET, "/v1/patients?limit=2", &token, None).await?;
    assert_eq!(first["total"], 3);
    assert_eq!(first["limit"], 2);
    assert_eq!(first["items"].as_array().map(Vec::len), Some(2));

    let (_, rest) = send(&app, Method::GET, "/v1/patients?limit=2&offset=2", &token, None).await?;
    assert_eq!(rest["total"], 3);
    assert_eq!(rest["offset"], 2);
    assert_eq!(rest["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(rest["items"][0]["full_name"], "Bea Santos");

    let (status, _) = send(&app, Method::GET, "/v1/patients?offset=-1", &token, None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn replace_resets_omitted_nested_fields() -> Result<()> {
    let Ok(db) = TestDb::new().await else {
        return Ok(());
    };
    let (app, token) = app_with_token(db.pool.clone())?;

    let (_, created) =
        send(&app, Method::POST, "/v1/patients", &token, Some(&patient("Ana Cruz"))).await?;
    let uri = format!("/v1/patients/{}", id_of(&created));

    let replacement = json!({
        "full_name": "Ana Cruz-Reyes",
        "birth_date": "1990-05-01",
        "gender": "FEMALE",
        "marital_status": "MARRIED",
        "email": "ana@example.com",
        "medical_chart": { "hypertension": true }
    });
    let (status, updated) = send(&app, Method::PUT, &uri, &token, Some(&replacement)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["full_name"], "Ana Cruz-Reyes");
    assert_eq!(updated["marital_status"], "MARRIED");
    assert_eq!(updated["mobile_number"], "");
    assert_eq!(updated["dental_history"]["palate"], false);
    assert_eq!(updated["dental_history"]["past_dental_care_or_treatments"], "");
    assert_eq!(updated["medical_chart"]["allergies"], "");
    assert_eq!(updated["medical_chart"]["diabetes"], false);
    assert_eq!(updated["medical_chart"]["hypertension"], true);

    let missing = format!("/v1/patients/{}", uuid::Uuid::now_v7());
    let (status, _) = send(&app, Method::PUT, &missing, &token, Some(&replacement)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn delete_removes_patient_and_nested_records() -> Result<()> {
    let Ok(db) = TestDb::new().await else {
        return Ok(());
    };
    let (app, token) = app_with_token(db.pool.clone())?;

    let (_, created) =
        send(&app, Method::POST, "/v1/patients", &token, Some(&patient("Ana Cruz"))).await?;
    let uri = format!("/v1/patients/{}", id_of(&created));

    let (status, body) = send(&app, Method::DELETE, &uri, &token, None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, _) = send(&app, Method::GET, &uri, &token, None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::DELETE, &uri, &token, None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let remaining = sqlx::query(
        "SELECT (SELECT COUNT(*) FROM dental_histories) + \
         (SELECT COUNT(*) FROM medical_charts) AS nested",
    )
    .fetch_one(&db.pool)
    .await?;
    assert_eq!(remaining.try_get::<i64, _>("nested")?, 0);
    Ok(())
}
