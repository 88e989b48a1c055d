use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use dormdesk::booking::{BookingService, InMemoryLedger};
use dormdesk::config::AppConfig;
use dormdesk::error::AppError;
use dormdesk::telemetry;
use tracing::info;

use crate::cli::ServeArgs;
use crate::infra::{
    apply_seed, load_seed, AppState, InMemoryIdentityDirectory, InMemoryResidencyDirectory,
};
use crate::routes::with_booking_routes;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let ledger = Arc::new(InMemoryLedger::default());
    let residencies = Arc::new(InMemoryResidencyDirectory::default());
    let identities = Arc::new(InMemoryIdentityDirectory::default());

    if let Some(path) = args.seed.take() {
        let seed = load_seed(&path)?;
        let (residency_count, identity_count) = apply_seed(seed, &residencies, &identities);
        info!(
            path = %path.display(),
            residencies = residency_count,
            identities = identity_count,
            "directories seeded"
        );
    }

    let booking_service = Arc::new(BookingService::new(
        ledger,
        residencies.clone(),
        identities,
        config.allocation.rivals,
    ));

    let app = with_booking_routes(booking_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        known_residencies = residencies.len(),
        "booking allocation service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
