use serde_json::Value;

use sqlx::PgPool;

use gymdesk::domain::{Role, SubscriptionStatus};

use crate::helpers::{days_from_today, TestApp, TestUser};

#[sqlx::test]
async fn expiring_subscriptions_are_grouped(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let token = app.admin_token().await;

    let today = TestUser::register_named(&pool, "Today Member", "today@gym.test", Role::Member).await;
    let soon = TestUser::register_named(&pool, "Soon Member", "soon@gym.test", Role::Member).await;
    let later = TestUser::register_named(&pool, "Later Member", "later@gym.test", Role::Member).await;
    let lapsed = TestUser::register_named(&pool, "Lapsed Member", "lapsed@gym.test", Role::Member).await;

    app.insert_subscription(
        today.id,
        "Regular",
        days_from_today(-30),
        Some(days_from_today(0)),
        SubscriptionStatus::Active,
    )
    .await;
    app.insert_subscription(
        soon.id,
        "VIP",
        days_from_today(-27),
        Some(days_from_today(3)),
        SubscriptionStatus::Active,
    )
    .await;
    app.insert_subscription(
        later.id,
        "Regular",
        days_from_today(-10),
        Some(days_from_today(20)),
        SubscriptionStatus::Active,
    )
    .await;
    app.insert_subscription(
        lapsed.id,
        "Regular",
        days_from_today(-68),
        Some(days_from_today(-38)),
        SubscriptionStatus::Active,
    )
    .await;

    let res = app
        .get("dashboard/expiring-subscriptions", &token)
        .await
        .expect("Failed to execute request");
    assert_eq!(200, res.status().as_u16());

    let body: Value = res.json().await.unwrap();
    assert_eq!(2, body["total"]);
    assert_eq!(1, body["expires_today"]);
    assert_eq!(1, body["expires_soon"]);

    let first = &body["subscriptions"][0];
    assert_eq!("Today Member", first["user_name"]);
    assert_eq!(0, first["days_until_expiry"]);
    assert_eq!("Today", first["formatted_days"]);
    assert_eq!("Mar 10, 2024", first["formatted_end_date"]);
    assert_eq!("expires_today", first["status"]);

    let second = &body["subscriptions"][1];
    assert_eq!("soon@gym.test", second["user_email"]);
    assert_eq!("VIP", second["plan_type"]);
    assert_eq!(3, second["days_until_expiry"]);
    assert_eq!("In 3 days", second["formatted_days"]);
    assert_eq!(200000, second["price"]);
    assert_eq!("expires_soon", second["status"]);

    Ok(())
}

#[sqlx::test]
async fn cancelled_subscription_ending_today_is_excluded(pool: PgPool) -> sqlx::Result<()> {
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
    app.insert_subscription(
        member.id,
        "VIP",
        days_from_today(-25),
        Some(days_from_today(5)),
        SubscriptionStatus::Active,
    )
    .await;

    let body: Value = app
        .get("dashboard/expiring-subscriptions", &token)
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(1, body["total"]);
    assert_eq!(0, body["expires_today"]);
    assert_eq!(5, body["subscriptions"][0]["days_until_expiry"]);

    Ok(())
}

#[sqlx::test]
async fn empty_dashboard(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let token = app.admin_token().await;

    let body: Value = app
        .get("dashboard/expiring-subscriptions", &token)
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(0, body["total"]);
    assert!(body["subscriptions"].as_array().unwrap().is_empty());

    Ok(())
}

#[sqlx::test]
async fn stats_count_members_by_current_plan(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let token = app.admin_token().await;

    let regular = TestUser::register(&pool, "regular@gym.test", Role::Member).await;
    let vip = TestUser::register(&pool, "vip@gym.test", Role::Member).await;
    let suspended = TestUser::register(&pool, "suspended@gym.test", Role::Member).await;
    TestUser::register(&pool, "idle@gym.test", Role::Member).await;
    TestUser::register(&pool, "coach@gym.test", Role::Coach).await;

    app.insert_subscription(
        regular.id,
        "Regular",
        days_from_today(-10),
        Some(days_from_today(20)),
        SubscriptionStatus::Active,
    )
    .await;
    // An older running subscription loses to the newer VIP one
    app.insert_subscription(
        vip.id,
        "Regular",
        days_from_today(-20),
        Some(days_from_today(10)),
        SubscriptionStatus::Active,
    )
    .await;
    app.insert_subscription(
        vip.id,
        "VIP",
        days_from_today(-2),
        Some(days_from_today(28)),
        SubscriptionStatus::Active,
    )
    .await;
    app.insert_subscription(
        suspended.id,
        "Regular",
        days_from_today(-5),
        Some(days_from_today(25)),
        SubscriptionStatus::Suspended,
    )
    .await;

    let res = app
        .get("dashboard/stats", &token)
        .await
        .expect("Failed to execute request");
    assert_eq!(200, res.status().as_u16());

    let body: Value = res.json().await.unwrap();
    assert_eq!(4, body["total_members"]);
    assert_eq!(2, body["active_members"]);
    assert_eq!(2, body["inactive_members"]);
    assert_eq!(1, body["total_coaches"]);

    let share_of = |plan: &str| {
        body["membership_distribution"]
            .as_array()
            .unwrap()
            .iter()
            .find(|share| share["name"] == plan)
            .map(|share| share["value"].clone())
            .unwrap()
    };
    assert_eq!(1, share_of("Regular"));
    assert_eq!(1, share_of("VIP"));
    assert_eq!(0, share_of("Trial"));
    assert_eq!(0, share_of("Couple Discount"));

    Ok(())
}
