pub mod auth;
pub mod catalog;
pub mod error;
pub mod handlers;
pub mod ical;
pub mod models;
pub mod openapi;
pub mod recurrence;
pub mod settings;
pub mod slug;
pub mod store;
pub mod validation;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
};
use chrono_tz::Tz;
use handlers::{
    create_events, create_group, delete_event, delete_group, get_timetable, get_timetable_ical,
    healthz_live, healthz_ready, list_groups, resolve_selection, root, update_event,
    update_group,
};
use tokio::sync::RwLock;
use tower_http::LatencyUnit;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::catalog::Catalog;
use crate::ical::ICalExporter;
use crate::openapi::ApiDoc;
use crate::settings::Settings;
use crate::store::ScheduleStore;

#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub store: Arc<RwLock<ScheduleStore>>,
    pub exporter: Arc<ICalExporter>,
    pub tz: Tz,
}

impl AppState {
    pub fn new(settings: Settings, store: ScheduleStore) -> Result<Self, config::ConfigError> {
        let tz = settings.tz()?;
        Ok(Self {
            settings,
            store: Arc::new(RwLock::new(store)),
            exporter: Arc::new(ICalExporter::new()),
            tz,
        })
    }
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;

    let env_filter = if settings.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .without_time()
        .init();

    let mut store = ScheduleStore::new();
    if let Some(path) = &settings.catalog_path {
        info!(path = %path, "loading group catalog");
        Catalog::load(path)?
            .seed(&mut store)
            .map_err(|err| format!("catalog seeding failed: {err}"))?;
    }

    let state = AppState::new(settings, store)?;
    let app = build_router(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], state.settings.port));
    info!("Starting GSOM Timetable API on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        );

    let mut router = Router::new()
        .route("/", get(root))
        .route("/healthz/live", get(healthz_live))
        .route("/healthz/ready", get(healthz_ready))
        .route("/groups", get(list_groups))
        .route("/slug", get(resolve_selection))
        .route("/timetable/{slug}", get(get_timetable))
        .route("/timetable/{slug}/ical", get(get_timetable_ical))
        .route("/admin/groups", post(create_group))
        .route(
            "/admin/groups/{id}",
            put(update_group).delete(delete_group),
        )
        .route("/admin/schedule", post(create_events))
        .route("/admin/schedule/{id}", put(update_event).delete(delete_event))
        .with_state(state.clone());

    if state.settings.enable_swagger {
        let openapi = ApiDoc::openapi();
        let swagger = SwaggerUi::new("/docs").url("/openapi.json", openapi);
        router = router.merge(swagger);
    }

    router.layer(trace_layer)
}
