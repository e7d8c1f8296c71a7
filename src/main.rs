//! Oremus payments service entrypoint.
//!
//! Wires the Postgres and Resend adapters into the webhook pipeline,
//! spawns the notification retry worker, and serves the axum router.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderValue, Method};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use oremus_payments::adapters::email::ResendMailer;
use oremus_payments::adapters::http::{router, AppState};
use oremus_payments::adapters::postgres::{
    PostgresNotificationRepository, PostgresOrderRepository, PostgresPaymentRepository,
    PostgresWebhookEventRepository,
};
use oremus_payments::application::handlers::{
    DispatchNotificationHandler, NotificationRetryWorker, ProcessWebhookHandler,
    ReconcilePaymentHandler,
};
use oremus_payments::config::AppConfig;
use oremus_payments::domain::notification::TemplateRegistry;
use oremus_payments::domain::payment::WebhookVerifier;
use oremus_payments::ports::{
    MailSender, NotificationRepository, OrderRepository, PaymentRepository, WebhookEventRepository,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config);

    // A registry with a missing template must abort startup, not surface
    // as a skipped email weeks later.
    let templates = TemplateRegistry::with_defaults();
    templates.validate()?;
    let templates = Arc::new(templates);

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        info!("Running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;
    }

    let payments: Arc<dyn PaymentRepository> = Arc::new(PostgresPaymentRepository::new(pool.clone()));
    let orders: Arc<dyn OrderRepository> = Arc::new(PostgresOrderRepository::new(pool.clone()));
    let webhook_events: Arc<dyn WebhookEventRepository> =
        Arc::new(PostgresWebhookEventRepository::new(pool.clone()));
    let notifications: Arc<dyn NotificationRepository> =
        Arc::new(PostgresNotificationRepository::new(pool.clone()));
    let mailer: Arc<dyn MailSender> = Arc::new(ResendMailer::new(&config.email));

    let reconciler = ReconcilePaymentHandler::new(payments.clone(), orders.clone());
    let dispatcher = DispatchNotificationHandler::new(
        orders.clone(),
        notifications.clone(),
        mailer.clone(),
        templates,
    );
    let webhooks = Arc::new(ProcessWebhookHandler::new(
        WebhookVerifier::new(config.payment.stripe_webhook_secret.clone()),
        webhook_events.clone(),
        reconciler,
        dispatcher,
    ));

    let worker = NotificationRetryWorker::new(
        notifications,
        webhook_events,
        mailer,
        config.notifications.clone(),
    );
    tokio::spawn(worker.run());

    let mut app = router(AppState { webhooks })
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    let origins = config.server.cors_origins_list();
    if !origins.is_empty() {
        let parsed = origins
            .iter()
            .map(|origin| origin.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()?;
        app = app.layer(
            CorsLayer::new()
                .allow_origin(parsed)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers(Any),
        );
    }

    let addr = config.server.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        %addr,
        environment = ?config.server.environment,
        stripe_test_mode = config.payment.is_test_mode(),
        "Oremus payments service listening"
    );
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.is_production() {
        builder.json().init();
    } else {
        builder.init();
    }
}
