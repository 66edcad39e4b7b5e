use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the tagging service.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::session::open_session,
        crate::routes::session::get_session,
        crate::routes::session::close_session,
        crate::routes::session::answer,
        crate::routes::session::step_back,
        crate::routes::session::reset,
        crate::routes::tags::list_tags,
        crate::routes::tags::delete_tag,
        crate::routes::roster::get_roster,
        crate::routes::roster::replace_roster,
        crate::routes::sse::event_stream,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::HealthStatus,
            crate::dto::session::OpenSessionRequest,
            crate::dto::session::AnswerRequest,
            crate::dto::session::AnswerResponse,
            crate::dto::session::SessionView,
            crate::dto::session::QuestionView,
            crate::dto::session::OptionView,
            crate::dto::tags::TagView,
            crate::dto::roster::RosterResponse,
            crate::dto::roster::ReplaceRosterRequest,
            crate::dto::sse::Handshake,
            crate::dto::sse::SessionClosedEvent,
            crate::dto::sse::TagsUpdatedEvent,
            crate::dto::sse::RosterUpdatedEvent,
            crate::dto::sse::NoticeEvent,
            crate::dto::sse::NoticeLevel,
            crate::state::mode::TaggingMode,
            crate::state::navigator::Answer,
            crate::state::roster::RosterEntry,
            crate::state::roster::Player,
            crate::state::roster::Position,
            crate::state::tag_store::RecordId,
            crate::state::tag_store::EntryStatus,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "session", description = "Tagging session and question navigation"),
        (name = "tags", description = "Records of the open session"),
        (name = "roster", description = "Roster of the session's game"),
        (name = "sse", description = "Server-sent events stream"),
    )
)]
pub struct ApiDoc;
