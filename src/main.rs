use std::net::TcpListener;
use std::sync::Arc;

use anyhow::Context;

use sqlx::PgPool;

use gymdesk::app::{self, AppState};
use gymdesk::auth::SessionTtl;
use gymdesk::crypto::SigningKey;
use gymdesk::lifecycle::SystemClock;
use gymdesk::settings::Settings;
use gymdesk::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = telemetry::create_subscriber("info", std::io::stdout);
    telemetry::set_subscriber(subscriber)?;

    let settings = Settings::load()?;

    let pool = PgPool::connect_with(settings.database.with_db())
        .await
        .context("Failed to connect to the database")?;
    sqlx::migrate!()
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    let signing_key = SigningKey::new(settings.app.secret_key())?;

    let listener = TcpListener::bind(settings.app.addr())?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    let state = AppState {
        pool,
        signing_key,
        clock: Arc::new(SystemClock),
        evaluator: settings.lifecycle.evaluator(),
        session_ttl: SessionTtl(settings.app.session_ttl()),
    };

    app::run(listener, state)?.await.context("Failed to run app")
}
