use crate::cli::ServeArgs;
use crate::infra::{build_mailer, open_store, persist_store, AppState};
use crate::routes::service_router;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use interview_hub::auth::TokenIssuer;
use interview_hub::config::AppConfig;
use interview_hub::error::AppError;
use interview_hub::hiring::activity::ActivityLog;
use interview_hub::http::HubState;
use interview_hub::jobs::JobRunner;
use interview_hub::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let store = Arc::new(open_store(&config)?);
    let tokens = Arc::new(TokenIssuer::new(
        &config.auth.jwt_secret,
        config.auth.access_ttl(),
        config.auth.refresh_ttl(),
    ));
    let activity = ActivityLog::default();

    let runner = JobRunner::new(
        Arc::clone(&store),
        build_mailer(&config.mail)?,
        activity.clone(),
        config.mail.from.clone(),
        config.jobs.clone(),
    );
    let jobs = runner.spawn();

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let app = service_router(HubState::new(Arc::clone(&store), tokens, activity))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, jobs = jobs.len(), "interview hub ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    readiness_flag.store(false, Ordering::Release);
    jobs.abort_all();
    runner.flush_activity_once()?;
    persist_store(&config, &store)?;
    info!("interview hub stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
