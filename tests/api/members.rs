use serde_json::{json, Value};

use sqlx::PgPool;

use uuid::Uuid;

use gymdesk::domain::{Role, SubscriptionStatus};

use crate::helpers::{days_from_today, TestApp, TestUser};

#[sqlx::test]
async fn create_returns_created_for_valid_member(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let token = app.admin_token().await;

    let res = app
        .post(
            "members",
            &token,
            &json!({
                "name": "Yusuf Omar",
                "email": "Yusuf@Example.com",
                "password": "strong-password",
                "phone": "01000000001",
                "gender": "male",
                "birth_date": "1990-04-02"
            }),
        )
        .await
        .expect("Failed to execute request");
    assert_eq!(201, res.status().as_u16());

    let body: Value = res.json().await.expect("Failed to parse body");
    let id: Uuid = body["id"].as_str().unwrap().parse().unwrap();

    let (email, role): (String, String) =
        sqlx::query_as("select email, role from users where id = $1")
            .bind(id)
            .fetch_one(&pool)
            .await?;
    assert_eq!("yusuf@example.com", email);
    assert_eq!("member", role);

    Ok(())
}

#[sqlx::test]
async fn create_rejects_invalid_members(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let token = app.admin_token().await;

    let cases = [
        (json!({"name": "", "email": "a@example.com", "password": "long-enough"}), "empty name"),
        (json!({"name": "Bad <Name>", "email": "a@example.com", "password": "long-enough"}), "forbidden characters"),
        (json!({"name": "Valid Name", "email": "not-an-email", "password": "long-enough"}), "invalid email"),
        (json!({"name": "Valid Name", "email": "a@example.com", "password": "short"}), "short password"),
        (json!({"name": "Valid Name", "email": "a@example.com", "password": "long-enough", "role": "admin"}), "admin role"),
    ];

    for (body, description) in cases {
        let res = app
            .post("members", &token, &body)
            .await
            .expect("Failed to execute request");

        assert_eq!(
            400,
            res.status().as_u16(),
            "The API did not reject a member with {}",
            description
        );
    }

    Ok(())
}

#[sqlx::test]
async fn duplicate_email_is_a_conflict(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let token = app.admin_token().await;
    let member = json!({
        "name": "Yusuf Omar",
        "email": "yusuf@example.com",
        "password": "strong-password"
    });

    let first = app.post("members", &token, &member).await.unwrap();
    let second = app.post("members", &token, &member).await.unwrap();

    assert_eq!(201, first.status().as_u16());
    assert_eq!(409, second.status().as_u16());

    Ok(())
}

#[sqlx::test]
async fn list_reports_computed_status(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let token = app.admin_token().await;

    let active = TestUser::register_named(&pool, "Active Member", "active@gym.test", Role::Member).await;
    let lapsed = TestUser::register_named(&pool, "Lapsed Member", "lapsed@gym.test", Role::Member).await;
    app.insert_subscription(
        active.id,
        "Regular",
        days_from_today(-10),
        Some(days_from_today(20)),
        SubscriptionStatus::Active,
    )
    .await;
    // Still flagged active, but the end date has passed
    app.insert_subscription(
        lapsed.id,
        "Regular",
        days_from_today(-60),
        Some(days_from_today(-30)),
        SubscriptionStatus::Active,
    )
    .await;

    let res = app.get("members", &token).await.unwrap();
    assert_eq!(200, res.status().as_u16());
    let body: Value = res.json().await.unwrap();

    assert_eq!(2, body["total"]);
    assert_eq!(1, body["current_page"]);
    assert_eq!(1, body["last_page"]);
    assert_eq!(15, body["per_page"]);

    let status_of = |email: &str| {
        body["data"]
            .as_array()
            .unwrap()
            .iter()
            .find(|m| m["email"] == email)
            .map(|m| m["subscription_status"].clone())
            .unwrap()
    };
    assert_eq!("active", status_of("active@gym.test"));
    assert_eq!("inactive", status_of("lapsed@gym.test"));

    let res = app
        .get("members?subscription_status=inactive", &token)
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(1, body["total"]);
    assert_eq!("lapsed@gym.test", body["data"][0]["email"]);

    let res = app.get("members?search=ACTIVE%20mem", &token).await.unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(1, body["total"]);
    assert_eq!(active.id.to_string(), body["data"][0]["id"]);

    Ok(())
}

#[sqlx::test]
async fn list_rejects_unknown_status_filter(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let token = app.admin_token().await;

    let res = app
        .get("members?subscription_status=frozen", &token)
        .await
        .unwrap();
    assert_eq!(400, res.status().as_u16());

    Ok(())
}

#[sqlx::test]
async fn list_paginates(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let token = app.admin_token().await;

    for i in 0..5 {
        TestUser::register(&pool, &format!("member{}@gym.test", i), Role::Member).await;
    }

    let res = app.get("members?page=2&per_page=2", &token).await.unwrap();
    let body: Value = res.json().await.unwrap();

    assert_eq!(5, body["total"]);
    assert_eq!(2, body["current_page"]);
    assert_eq!(3, body["last_page"]);
    assert_eq!(2, body["data"].as_array().unwrap().len());

    Ok(())
}

#[sqlx::test]
async fn status_prefers_active_subscription_over_cancelled(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let token = app.admin_token().await;
    let member = TestUser::register(&pool, "member@gym.test", Role::Member).await;

    app.insert_subscription(
        member.id,
        "Regular",
        days_from_today(-30),
        Some(days_from_today(0)),
        SubscriptionStatus::Cancelled,
    )
    .await;
    let active = app
        .insert_subscription(
            member.id,
            "VIP",
            days_from_today(-25),
            Some(days_from_today(5)),
            SubscriptionStatus::Active,
        )
        .await;

    let res = app
        .get(&format!("members/{}/status", member.id), &token)
        .await
        .unwrap();
    assert_eq!(200, res.status().as_u16());

    let body: Value = res.json().await.unwrap();
    assert_eq!("active", body["status"]);
    assert_eq!(active.to_string(), body["subscription"]["id"]);

    Ok(())
}

#[sqlx::test]
async fn member_without_subscriptions_is_inactive(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let token = app.admin_token().await;
    let member = TestUser::register(&pool, "member@gym.test", Role::Member).await;

    let res = app
        .get(&format!("members/{}/status", member.id), &token)
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();

    assert_eq!("inactive", body["status"]);
    assert!(body["subscription"].is_null());

    Ok(())
}

#[sqlx::test]
async fn unknown_member_is_not_found(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let token = app.admin_token().await;

    for path in ["status", "subscriptions"] {
        let res = app
            .get(&format!("members/{}/{}", Uuid::new_v4(), path), &token)
            .await
            .unwrap();
        assert_eq!(404, res.status().as_u16());
    }

    Ok(())
}

#[sqlx::test]
async fn subscriptions_are_listed_newest_first_with_expiry(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let token = app.admin_token().await;
    let member = TestUser::register(&pool, "member@gym.test", Role::Member).await;

    app.insert_subscription(
        member.id,
        "Regular",
        days_from_today(-68),
        Some(days_from_today(-38)),
        SubscriptionStatus::Expired,
    )
    .await;
    app.insert_subscription(
        member.id,
        "VIP",
        days_from_today(-27),
        Some(days_from_today(3)),
        SubscriptionStatus::Active,
    )
    .await;

    let res = app
        .get(&format!("members/{}/subscriptions", member.id), &token)
        .await
        .unwrap();
    assert_eq!(200, res.status().as_u16());

    let body: Value = res.json().await.unwrap();
    let subs = body.as_array().unwrap();
    assert_eq!(2, subs.len());

    assert_eq!("VIP", subs[0]["plan_name"]);
    assert_eq!(3, subs[0]["days_until_expiry"]);
    assert_eq!("expires_soon", subs[0]["expiry"]);

    assert_eq!("Regular", subs[1]["plan_name"]);
    assert_eq!(-38, subs[1]["days_until_expiry"]);
    assert_eq!("not_expiring", subs[1]["expiry"]);

    Ok(())
}

#[sqlx::test]
async fn show_returns_member_with_current_subscription(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let token = app.admin_token().await;
    let member = TestUser::register_named(&pool, "Mona Adel", "mona@gym.test", Role::Member).await;
    let current = app
        .insert_subscription(
            member.id,
            "VIP",
            days_from_today(-5),
            Some(days_from_today(25)),
            SubscriptionStatus::Active,
        )
        .await;

    let res = app
        .get(&format!("members/{}", member.id), &token)
        .await
        .unwrap();
    assert_eq!(200, res.status().as_u16());

    let body: Value = res.json().await.unwrap();
    assert_eq!("Mona Adel", body["name"]);
    assert_eq!("mona@gym.test", body["email"]);
    assert_eq!("active", body["subscription_status"]);
    assert_eq!(current.to_string(), body["current_subscription"]["id"]);
    assert!(body.get("password_hash").is_none());

    Ok(())
}

#[sqlx::test]
async fn update_changes_only_supplied_fields(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let token = app.admin_token().await;
    let member = TestUser::register_named(&pool, "Mona Adel", "mona@gym.test", Role::Member).await;

    let res = app
        .put(
            &format!("members/{}", member.id),
            &token,
            &json!({ "email": "Mona.Adel@Example.com", "phone": "01000000002" }),
        )
        .await
        .unwrap();
    assert_eq!(200, res.status().as_u16());

    let body: Value = res.json().await.unwrap();
    assert_eq!("Mona Adel", body["name"]);
    assert_eq!("mona.adel@example.com", body["email"]);
    assert_eq!("01000000002", body["phone"]);

    let (name, email, phone): (String, String, Option<String>) =
        sqlx::query_as("select name, email, phone from users where id = $1")
            .bind(member.id)
            .fetch_one(&pool)
            .await?;
    assert_eq!("Mona Adel", name);
    assert_eq!("mona.adel@example.com", email);
    assert_eq!(Some("01000000002".to_string()), phone);

    Ok(())
}

#[sqlx::test]
async fn update_rejects_invalid_or_taken_values(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let token = app.admin_token().await;
    let member = TestUser::register(&pool, "member@gym.test", Role::Member).await;
    TestUser::register(&pool, "taken@gym.test", Role::Member).await;
    let url = format!("members/{}", member.id);

    let invalid = app.put(&url, &token, &json!({ "name": "" })).await.unwrap();
    assert_eq!(400, invalid.status().as_u16());

    let taken = app
        .put(&url, &token, &json!({ "email": "taken@gym.test" }))
        .await
        .unwrap();
    assert_eq!(409, taken.status().as_u16());

    let email: String = sqlx::query_scalar("select email from users where id = $1")
        .bind(member.id)
        .fetch_one(&pool)
        .await?;
    assert_eq!("member@gym.test", email);

    Ok(())
}

#[sqlx::test]
async fn delete_removes_member_and_history(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let token = app.admin_token().await;
    let member = TestUser::register(&pool, "member@gym.test", Role::Member).await;
    app.insert_subscription(
        member.id,
        "Regular",
        days_from_today(-5),
        Some(days_from_today(25)),
        SubscriptionStatus::Active,
    )
    .await;
    let url = format!("members/{}", member.id);

    let first = app.delete(&url, &token).await.unwrap();
    assert_eq!(204, first.status().as_u16());

    let second = app.delete(&url, &token).await.unwrap();
    assert_eq!(404, second.status().as_u16());

    let remaining: i64 = sqlx::query_scalar("select count(*) from subscriptions where user_id = $1")
        .bind(member.id)
        .fetch_one(&pool)
        .await?;
    assert_eq!(0, remaining);

    Ok(())
}

#[sqlx::test]
async fn other_roles_are_not_members(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let token = app.admin_token().await;
    let coach = TestUser::register(&pool, "coach@gym.test", Role::Coach).await;

    for path in ["", "/status", "/subscriptions"] {
        let res = app
            .get(&format!("members/{}{}", coach.id, path), &token)
            .await
            .unwrap();
        assert_eq!(404, res.status().as_u16(), "GET members/{{id}}{} found a coach", path);
    }

    let url = format!("members/{}", coach.id);
    let updated = app
        .put(&url, &token, &json!({ "name": "Renamed Coach" }))
        .await
        .unwrap();
    assert_eq!(404, updated.status().as_u16());

    let deleted = app.delete(&url, &token).await.unwrap();
    assert_eq!(404, deleted.status().as_u16());

    let name: String = sqlx::query_scalar("select name from users where id = $1")
        .bind(coach.id)
        .fetch_one(&pool)
        .await?;
    assert_eq!("Test User", name);

    Ok(())
}

#[sqlx::test]
async fn malformed_requests_get_json_errors(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let token = app.admin_token().await;

    let bad_query = app.get("members?page=abc", &token).await.unwrap();
    let bad_path = app.get("members/not-a-uuid/status", &token).await.unwrap();
    let bad_body = app
        .post("members", &token, &json!({ "name": 42 }))
        .await
        .unwrap();

    for (res, description) in [
        (bad_query, "query"),
        (bad_path, "path"),
        (bad_body, "body"),
    ] {
        assert_eq!(400, res.status().as_u16(), "Malformed {} was not rejected", description);
        let body: Value = res.json().await.unwrap();
        assert!(
            body["message"].is_string(),
            "Malformed {} error has no message",
            description
        );
    }

    Ok(())
}
