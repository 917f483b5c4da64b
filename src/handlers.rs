use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::TypedHeader;
use axum_extra::headers::{Authorization, authorization::Bearer};
use chrono::NaiveDate;
use http::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};
use utoipa::ToSchema;

use crate::{
    AppState,
    auth::verify_token,
    catalog::{create_group as store_group, update_group as replace_group},
    error::ApiError,
    models::{
        Group, GroupView, Language, NewGroup, ScheduleEventPrototype, StoredEvent,
        TimetableEntry, TimetableResponse,
    },
    recurrence::{RecurrenceRule, expand},
    slug::{self, Degree, ProgramIdentity},
    store::ScheduleStore,
    validation::{validate_prototype, validate_range, validate_rule},
};

type BearerHeader = Option<TypedHeader<Authorization<Bearer>>>;

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TimetableQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    #[serde(default)]
    pub lang: Language,
}

#[derive(Debug, Deserialize)]
pub struct SelectionQuery {
    pub degree: Degree,
    /// Program display name (`Corporate Finance`) or abbreviation (`cfin`).
    pub program: String,
    pub year: u16,
    /// Bare (`B01`) or full (`24.B01-vshm`) group code.
    pub group: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SlugResponse {
    pub slug: String,
    pub url: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateEventsRequest {
    pub group_id: i64,
    #[serde(flatten)]
    pub prototype: ScheduleEventPrototype,
    #[serde(default)]
    pub recurrence: RecurrenceRule,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatedEvents {
    pub created: usize,
    pub ids: Vec<i64>,
}

fn authorize(state: &AppState, auth: BearerHeader, query: &TokenQuery) -> Result<(), ApiError> {
    let auth_header = auth.map(|TypedHeader(a)| a);
    verify_token(&state.settings, auth_header, query.token.as_deref())
}

/// Slugs that do not resolve are reported as a missing timetable, never as
/// a malformed request.
fn resolve_slug(slug: &str) -> Result<ProgramIdentity, ApiError> {
    slug::decode(slug).ok_or_else(|| ApiError::NotFound(format!("Timetable {slug} not found")))
}

/// Finds the group a slug names. A slug that shares only the full code with
/// a stored group (different degree or program) names nothing.
fn timetable_group<'a>(
    store: &'a ScheduleStore,
    identity: &ProgramIdentity,
) -> Result<&'a Group, ApiError> {
    let full_code = identity.full_code();
    store
        .find_group(&full_code)
        .filter(|group| group.identity == *identity)
        .ok_or_else(|| {
            debug!(%full_code, slug = %identity.slug(), "no group for slug");
            ApiError::NotFound(format!("Group {full_code} not found"))
        })
}

fn public_url(state: &AppState, identity: &ProgramIdentity) -> Result<String, ApiError> {
    slug::canonical_url(&state.settings.public_url, identity)
        .map(|url| url.to_string())
        .map_err(|err| {
            error!(error = %err, "cannot build timetable url");
            ApiError::Internal("Failed to build timetable address".into())
        })
}

#[utoipa::path(get, path = "/", tag = "timetable")]
pub async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "GSOM Timetable API",
        "endpoints": {
            "/groups": "List groups with their timetable slugs",
            "/slug": "Resolve a degree/program/year/group selection to a timetable address",
            "/timetable/{slug}": "Get a group timetable as JSON",
            "/timetable/{slug}/ical": "Download a group timetable as iCal file"
        }
    }))
}

#[utoipa::path(get, path = "/healthz/live", tag = "timetable")]
pub async fn healthz_live() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

#[utoipa::path(get, path = "/healthz/ready", tag = "timetable")]
pub async fn healthz_ready(State(state): State<AppState>) -> impl IntoResponse {
    let groups = state.store.read().await.groups().len();
    Json(serde_json::json!({"status": "ok", "groups": groups}))
}

#[utoipa::path(
    get,
    path = "/groups",
    responses((status = 200, description = "All groups", body = [GroupView])),
    tag = "timetable"
)]
pub async fn list_groups(State(state): State<AppState>) -> impl IntoResponse {
    let store = state.store.read().await;
    let groups: Vec<GroupView> = store.groups().into_iter().map(GroupView::from).collect();
    Json(groups)
}

#[utoipa::path(
    get,
    path = "/slug",
    params(
        ("degree" = String, Query, description = "bachelor or master"),
        ("program" = String, Query, description = "Program name or abbreviation"),
        ("year" = u16, Query, description = "Four-digit intake year"),
        ("group" = String, Query, description = "Group code, e.g. B01 or 24.B01-vshm")
    ),
    responses(
        (status = 200, description = "Timetable address for the selection", body = SlugResponse),
        (status = 400, description = "Unknown program, bad year or group code")
    ),
    tag = "timetable"
)]
pub async fn resolve_selection(
    State(state): State<AppState>,
    Query(query): Query<SelectionQuery>,
) -> Result<Json<SlugResponse>, ApiError> {
    let slug = slug::encode(&query.program, query.year, &query.group, query.degree)?;
    let identity = resolve_slug(&slug)?;
    Ok(Json(SlugResponse {
        url: public_url(&state, &identity)?,
        slug,
    }))
}

#[utoipa::path(
    get,
    path = "/timetable/{slug}",
    params(
        ("slug" = String, Path, description = "Timetable slug, e.g. bak-men-24-b01"),
        ("start" = Option<String>, Query, description = "First date to include (YYYY-MM-DD)"),
        ("end" = Option<String>, Query, description = "Last date to include (YYYY-MM-DD)"),
        ("lang" = Option<String>, Query, description = "Heading language: en or ru")
    ),
    responses(
        (status = 200, description = "Group timetable", body = TimetableResponse),
        (status = 404, description = "Unknown slug or group")
    ),
    tag = "timetable"
)]
pub async fn get_timetable(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<TimetableQuery>,
) -> Result<Json<TimetableResponse>, ApiError> {
    validate_range(query.start, query.end)?;
    let identity = resolve_slug(&slug)?;
    let full_code = identity.full_code();

    let store = state.store.read().await;
    let group = timetable_group(&store, &identity)?;
    let events = store
        .events_for_group(group.id, query.start, query.end)
        .into_iter()
        .map(TimetableEntry::from)
        .collect();

    Ok(Json(TimetableResponse {
        slug: identity.slug(),
        full_code: full_code.to_string(),
        url: public_url(&state, &identity)?,
        title: identity.display_name(query.lang),
        group: GroupView::from(group),
        events,
    }))
}

#[utoipa::path(
    get,
    path = "/timetable/{slug}/ical",
    params(
        ("slug" = String, Path, description = "Timetable slug, e.g. bak-men-24-b01"),
        ("start" = Option<String>, Query, description = "First date to include (YYYY-MM-DD)"),
        ("end" = Option<String>, Query, description = "Last date to include (YYYY-MM-DD)"),
        ("lang" = Option<String>, Query, description = "Event language: en or ru")
    ),
    responses(
        (status = 200, description = "iCal file", content_type = "text/calendar"),
        (status = 404, description = "Unknown slug, group, or no events")
    ),
    tag = "timetable"
)]
pub async fn get_timetable_ical(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<TimetableQuery>,
) -> Result<impl IntoResponse, ApiError> {
    validate_range(query.start, query.end)?;
    let identity = resolve_slug(&slug)?;
    let full_code = identity.full_code();

    let store = state.store.read().await;
    let group = timetable_group(&store, &identity)?;
    let events: Vec<&StoredEvent> = store.events_for_group(group.id, query.start, query.end);
    if events.is_empty() {
        return Err(ApiError::NotFound("No classes found".into()));
    }

    let body = state.exporter.generate(
        &identity.display_name(query.lang),
        &full_code,
        &events,
        state.tz,
        query.lang,
    );
    let disposition = format!("attachment; filename={}.ics", identity.slug());
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/calendar".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

#[utoipa::path(
    post,
    path = "/admin/groups",
    request_body = NewGroup,
    responses(
        (status = 201, description = "Group created", body = GroupView),
        (status = 400, description = "Invalid group code or year"),
        (status = 401, description = "Invalid authentication token"),
        (status = 409, description = "Group already exists")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "admin"
)]
pub async fn create_group(
    State(state): State<AppState>,
    auth: BearerHeader,
    Query(query): Query<TokenQuery>,
    Json(new_group): Json<NewGroup>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, auth, &query)?;
    let mut store = state.store.write().await;
    let group = store_group(&mut store, new_group)?;
    info!(full_code = %group.identity.full_code(), "group created");
    Ok((StatusCode::CREATED, Json(GroupView::from(group))))
}

#[utoipa::path(
    put,
    path = "/admin/groups/{id}",
    params(("id" = i64, Path, description = "Group id")),
    request_body = NewGroup,
    responses(
        (status = 200, description = "Group updated", body = GroupView),
        (status = 400, description = "Invalid group code or year"),
        (status = 401, description = "Invalid authentication token"),
        (status = 404, description = "Group not found"),
        (status = 409, description = "Another group has this full code")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "admin"
)]
pub async fn update_group(
    State(state): State<AppState>,
    auth: BearerHeader,
    Query(query): Query<TokenQuery>,
    Path(id): Path<i64>,
    Json(new_group): Json<NewGroup>,
) -> Result<Json<GroupView>, ApiError> {
    authorize(&state, auth, &query)?;
    let mut store = state.store.write().await;
    let group = replace_group(&mut store, id, new_group)?;
    info!(group_id = id, full_code = %group.identity.full_code(), "group updated");
    Ok(Json(GroupView::from(group)))
}

#[utoipa::path(
    delete,
    path = "/admin/groups/{id}",
    params(("id" = i64, Path, description = "Group id")),
    responses(
        (status = 200, description = "Group and its events deleted"),
        (status = 401, description = "Invalid authentication token"),
        (status = 404, description = "Group not found")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "admin"
)]
pub async fn delete_group(
    State(state): State<AppState>,
    auth: BearerHeader,
    Query(query): Query<TokenQuery>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, auth, &query)?;
    let removed_events = state.store.write().await.delete_group(id)?;
    info!(group_id = id, removed_events, "group deleted");
    Ok(Json(serde_json::json!({"deleted": id, "removed_events": removed_events})))
}

#[utoipa::path(
    post,
    path = "/admin/schedule",
    request_body = CreateEventsRequest,
    responses(
        (status = 201, description = "Events created", body = CreatedEvents),
        (status = 400, description = "Missing fields or invalid recurrence"),
        (status = 401, description = "Invalid authentication token"),
        (status = 404, description = "Group not found")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "admin"
)]
pub async fn create_events(
    State(state): State<AppState>,
    auth: BearerHeader,
    Query(query): Query<TokenQuery>,
    Json(request): Json<CreateEventsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, auth, &query)?;
    validate_prototype(&request.prototype)?;
    validate_rule(request.prototype.date, &request.recurrence)?;

    let instances = expand(&request.prototype, &request.recurrence);
    let ids = state
        .store
        .write()
        .await
        .insert_events(request.group_id, instances)?;
    info!(
        group_id = request.group_id,
        pattern = ?request.recurrence.pattern,
        created = ids.len(),
        "schedule events created"
    );
    Ok((
        StatusCode::CREATED,
        Json(CreatedEvents {
            created: ids.len(),
            ids,
        }),
    ))
}

#[utoipa::path(
    put,
    path = "/admin/schedule/{id}",
    params(("id" = i64, Path, description = "Event id")),
    request_body = ScheduleEventPrototype,
    responses(
        (status = 200, description = "Event updated", body = StoredEvent),
        (status = 400, description = "Missing fields"),
        (status = 401, description = "Invalid authentication token"),
        (status = 404, description = "Event not found")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "admin"
)]
pub async fn update_event(
    State(state): State<AppState>,
    auth: BearerHeader,
    Query(query): Query<TokenQuery>,
    Path(id): Path<i64>,
    Json(prototype): Json<ScheduleEventPrototype>,
) -> Result<Json<StoredEvent>, ApiError> {
    authorize(&state, auth, &query)?;
    validate_prototype(&prototype)?;
    let mut store = state.store.write().await;
    let event = store.update_event(id, prototype)?;
    Ok(Json(event.clone()))
}

#[utoipa::path(
    delete,
    path = "/admin/schedule/{id}",
    params(("id" = i64, Path, description = "Event id")),
    responses(
        (status = 204, description = "Event deleted"),
        (status = 401, description = "Invalid authentication token"),
        (status = 404, description = "Event not found")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "admin"
)]
pub async fn delete_event(
    State(state): State<AppState>,
    auth: BearerHeader,
    Query(query): Query<TokenQuery>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    authorize(&state, auth, &query)?;
    state.store.write().await.delete_event(id)?;
    Ok(StatusCode::NO_CONTENT)
}
