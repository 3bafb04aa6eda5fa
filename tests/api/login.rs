use reqwest::Method;

use serde_json::Value;

use sqlx::PgPool;

use gymdesk::domain::Role;

use crate::helpers::{TestApp, TestUser};

#[sqlx::test]
async fn admin_receives_bearer_token(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let admin = TestUser::register(&pool, "admin@gym.test", Role::Admin).await;

    let res = app
        .login(&admin.email, &admin.password)
        .await
        .expect("Failed to execute request");
    assert_eq!(200, res.status().as_u16());

    let body: Value = res.json().await.expect("Failed to parse body");
    assert_eq!("Bearer", body["token_type"]);
    assert_eq!("admin", body["user"]["role"]);
    assert_eq!(admin.id.to_string(), body["user"]["id"]);
    // Fixed clock at midnight plus a one hour session
    assert_eq!("2024-03-10T01:00:00Z", body["expires_at"]);

    let token = body["token"].as_str().unwrap();
    let res = app
        .get("dashboard/expiring-subscriptions", token)
        .await
        .expect("Failed to execute request");
    assert_eq!(200, res.status().as_u16());

    Ok(())
}

#[sqlx::test]
async fn wrong_password_is_unauthorized(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let admin = TestUser::register(&pool, "admin@gym.test", Role::Admin).await;

    let res = app
        .login(&admin.email, "not the password")
        .await
        .expect("Failed to execute request");

    assert_eq!(401, res.status().as_u16());

    Ok(())
}

#[sqlx::test]
async fn unknown_email_is_unauthorized(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;

    let res = app
        .login("ghost@gym.test", "whatever-password")
        .await
        .expect("Failed to execute request");

    assert_eq!(401, res.status().as_u16());

    Ok(())
}

#[sqlx::test]
async fn members_cannot_open_a_dashboard_session(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let member = TestUser::register(&pool, "member@gym.test", Role::Member).await;

    let res = app
        .login(&member.email, &member.password)
        .await
        .expect("Failed to execute request");

    assert_eq!(403, res.status().as_u16());

    Ok(())
}

#[sqlx::test]
async fn protected_routes_require_a_valid_token(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;

    let missing = app
        .request(Method::GET, "members")
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(401, missing.status().as_u16());

    let forged = app
        .get("members", "eyJleHAiOjF9.c2lnbmF0dXJl")
        .await
        .expect("Failed to execute request");
    assert_eq!(401, forged.status().as_u16());

    let body: Value = forged.json().await.expect("Failed to parse body");
    assert_eq!("Unauthorized", body["message"]);

    Ok(())
}
