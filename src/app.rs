use std::net::TcpListener;
use std::sync::Arc;

use actix_web::dev::Server;
use actix_web::{get, HttpResponse, Responder};
use actix_web::{web, App, HttpServer};

use sqlx::PgPool;

use tracing_actix_web::TracingLogger;

use crate::auth::SessionTtl;
use crate::controller::{coaches, dashboard, login, members, memberships, subscriptions};
use crate::crypto::SigningKey;
use crate::error::extractor_error;
use crate::lifecycle::{Clock, LifecycleEvaluator};

/// Simple health-check endpoint
#[tracing::instrument(name = "Health check")]
#[get("/health_check")]
async fn health_check() -> impl Responder {
    HttpResponse::Ok().body("I am alive")
}

/// Shared state handed to every request handler
pub struct AppState {
    pub pool: PgPool,
    pub signing_key: SigningKey,
    pub clock: Arc<dyn Clock>,
    pub evaluator: LifecycleEvaluator,
    pub session_ttl: SessionTtl,
}

/// Run the application on a specified TCP listener
pub fn run(listener: TcpListener, state: AppState) -> anyhow::Result<Server> {
    // Wrap application data
    let pool = web::Data::new(state.pool);
    let signing_key = web::Data::new(state.signing_key);
    let clock: web::Data<dyn Clock> = web::Data::from(state.clock);
    let evaluator = web::Data::new(state.evaluator);
    let session_ttl = web::Data::new(state.session_ttl);

    tracing::info!(
        "Expiry window is {} days, sessions last {} minutes",
        evaluator.window_days(),
        session_ttl.0.num_minutes()
    );

    // Start the server
    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(pool.clone())
            .app_data(signing_key.clone())
            .app_data(clock.clone())
            .app_data(evaluator.clone())
            .app_data(session_ttl.clone())
            .app_data(web::JsonConfig::default().error_handler(extractor_error))
            .app_data(web::QueryConfig::default().error_handler(extractor_error))
            .app_data(web::PathConfig::default().error_handler(extractor_error))
            .service(health_check)
            .service(login::scope())
            .service(members::scope())
            .service(subscriptions::scope())
            .service(memberships::scope())
            .service(coaches::scope())
            .service(dashboard::scope())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
