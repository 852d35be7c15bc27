use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use mealbridge::config::AppConfig;
use mealbridge::donations::{
    AssignmentCoordinator, DonationApi, DonationService, ExpirySweeper, GeoMatcher,
};
use mealbridge::error::AppError;
use mealbridge::ngos::NgoRegistry;
use mealbridge::scoring::RuleBasedScorer;
use mealbridge::store::{InMemoryDonationStore, InMemoryNgoStore, InMemoryVolunteerStore};
use mealbridge::telemetry;
use mealbridge::volunteers::VolunteerRegistry;
use tracing::info;

use crate::cli::ServeArgs;
use crate::infra::{AppState, LoggingNotificationSink};
use crate::routes::{platform_routes, Directory};

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

    let donations = Arc::new(InMemoryDonationStore::default());
    let volunteers = Arc::new(InMemoryVolunteerStore::default());
    let ngos = Arc::new(InMemoryNgoStore::default());
    let scorer = Arc::new(RuleBasedScorer::load());
    let notifications = Arc::new(LoggingNotificationSink);

    let api = Arc::new(DonationApi {
        service: DonationService::new(
            donations.clone(),
            volunteers.clone(),
            scorer,
            notifications,
            config.matching,
            config.scoring.predict_timeout,
        ),
        coordinator: AssignmentCoordinator::new(donations.clone(), volunteers.clone()),
        matcher: GeoMatcher::new(donations.clone(), volunteers.clone(), config.matching),
    });

    let directory = Arc::new(Directory {
        volunteers: VolunteerRegistry::new(volunteers.clone()),
        ngos: NgoRegistry::new(ngos, volunteers),
    });

    let sweeper = ExpirySweeper::new(donations, config.sweeper.interval);
    tokio::spawn(sweeper.run());

    let app = platform_routes(api, directory)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "donation coordination service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
