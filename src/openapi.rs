use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::handlers::{CreateEventsRequest, CreatedEvents, SlugResponse};
use crate::models::{
    BilingualText, EventDetails, GroupView, Language, NewGroup, ScheduleEventInstance,
    ScheduleEventPrototype, StoredEvent, TimetableEntry, TimetableResponse,
};
use crate::recurrence::{RecurrencePattern, RecurrenceRule, TeachingDay};
use crate::slug::{Degree, Program};

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
        components.add_security_scheme(
            "query_token",
            SecurityScheme::ApiKey(ApiKey::Query(ApiKeyValue::new("token"))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::healthz_live,
        crate::handlers::healthz_ready,
        crate::handlers::list_groups,
        crate::handlers::resolve_selection,
        crate::handlers::get_timetable,
        crate::handlers::get_timetable_ical,
        crate::handlers::create_group,
        crate::handlers::update_group,
        crate::handlers::delete_group,
        crate::handlers::create_events,
        crate::handlers::update_event,
        crate::handlers::delete_event
    ),
    components(schemas(
        BilingualText,
        EventDetails,
        ScheduleEventPrototype,
        ScheduleEventInstance,
        StoredEvent,
        NewGroup,
        GroupView,
        TimetableEntry,
        TimetableResponse,
        Language,
        Degree,
        Program,
        RecurrencePattern,
        RecurrenceRule,
        TeachingDay,
        CreateEventsRequest,
        CreatedEvents,
        SlugResponse
    )),
    tags(
        (name = "timetable", description = "Public timetable lookups"),
        (name = "admin", description = "Group and schedule management")
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/timetable/{slug}"));
        assert!(doc.paths.paths.contains_key("/admin/schedule"));
        assert!(doc.paths.paths["/admin/groups/{id}"].put.is_some());
        let schemes = &doc.components.unwrap().security_schemes;
        assert!(schemes.contains_key("bearer_auth"));
    }
}
