//! HTTP API for the Buzzwin ledger.

use crate::error::Error;
use crate::ledger::{AwardOutcome, KarmaSummary};
use crate::models::{ImpactMoment, RitualCompletion, RitualDefinition, StoryReaction, User, UserRitualState};
use crate::moments::{MomentPatch, NewMoment};
use crate::node::NodeState;
use crate::rituals::{CompletionOutcome, NewRitual};
use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{FromRequest, FromRequestParts, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use buzzwin_karma::{AchievementReport, EffortLevel, KarmaAction, ReactionType, RitualScope};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

type AppState = Arc<NodeState>;

type ApiResult<T> = std::result::Result<Json<T>, Error>;

/// Build the API router.
pub fn build_router(state: AppState) -> Router {
    // CORS layer for browser access
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health
        .route("/health", get(health))
        .route("/ready", get(ready))
        // Users
        .route("/api/users", post(create_user))
        .route("/api/users/:id", get(get_user))
        .route("/api/users/:id/rituals", get(list_owned_rituals))
        // Karma
        .route("/api/karma/award", post(award_karma))
        .route("/api/karma/award-multiple", post(award_karma_multiple))
        .route("/api/karma/:user_id", get(get_karma))
        // Rituals
        .route("/api/rituals", get(list_rituals).post(create_ritual))
        .route("/api/rituals/join", post(join_ritual))
        .route("/api/rituals/leave", post(leave_ritual))
        .route("/api/rituals/complete", post(complete_ritual))
        .route(
            "/api/rituals/achievements",
            get(achievements_query).post(achievements_body),
        )
        .route("/api/rituals/state/:user_id", get(get_ritual_state))
        .route("/api/rituals/completions/:user_id", get(list_completions))
        .route("/api/rituals/:id", get(get_ritual).delete(delete_ritual))
        // Impact moments
        .route("/api/impact-moments", get(list_moments).post(create_moment))
        .route(
            "/api/impact-moments/:id",
            get(get_moment).put(update_moment).delete(delete_moment),
        )
        .route("/api/impact-moments/:id/convert", post(convert_moment))
        // Story reactions
        .route("/api/story-reactions", post(react_to_story))
        .route("/api/story-reactions/:story_id", get(list_reactions))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// --- Errors ---

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::InvalidArgument(_) | Error::Domain(_) | Error::Conflict(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Unauthorized(_) => StatusCode::FORBIDDEN,
            Error::Storage(_) | Error::Serialization(_) | Error::Io(_) | Error::Config(_) => {
                tracing::error!("Request failed: {}", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = ErrorBody {
            success: false,
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::InvalidArgument(rejection.body_text())
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Error::InvalidArgument(rejection.body_text())
    }
}

/// JSON body extractor whose rejections use the API error shape.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(Error))]
struct ApiJson<T>(T);

/// Query string extractor whose rejections use the API error shape.
#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(Error))]
struct ApiQuery<T>(T);

#[derive(Debug, Serialize)]
struct Success {
    success: bool,
}

const OK: Success = Success { success: true };

fn parse_effort(value: &str) -> Result<EffortLevel, Error> {
    Ok(value.parse::<EffortLevel>()?)
}

fn parse_scope(value: Option<&str>) -> Result<Option<RitualScope>, Error> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => Ok(Some(s.parse()?)),
    }
}

// --- Health endpoints ---

async fn health() -> &'static str {
    "OK"
}

async fn ready() -> &'static str {
    "OK"
}

// --- User endpoints ---

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct CreateUserRequest {
    id: String,
    display_name: String,
}

async fn create_user(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), Error> {
    let user = state.ledger.create_user(&req.id, &req.display_name)?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn get_user(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<User> {
    Ok(Json(state.ledger.get_user(&id)?))
}

async fn list_owned_rituals(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<RitualDefinition>> {
    Ok(Json(state.ledger.list_owned_rituals(&id)?))
}

// --- Karma endpoints ---

async fn get_karma(State(state): State<AppState>, Path(user_id): Path<String>) -> ApiResult<KarmaSummary> {
    Ok(Json(state.ledger.get_user_karma(&user_id)?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct AwardKarmaRequest {
    user_id: String,
    action: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AwardKarmaResponse {
    success: bool,
    points: u64,
    #[serde(flatten)]
    karma: KarmaSummary,
}

async fn award_karma(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<AwardKarmaRequest>,
) -> ApiResult<AwardKarmaResponse> {
    let action: KarmaAction = req.action.parse()?;
    let (award, karma) = state.ledger.award_karma(&req.user_id, action)?;
    Ok(Json(AwardKarmaResponse {
        success: true,
        points: award.points,
        karma,
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct AwardMultipleRequest {
    user_ids: Vec<String>,
    action: String,
}

#[derive(Debug, Serialize)]
struct AwardMultipleResponse {
    results: Vec<AwardOutcome>,
}

async fn award_karma_multiple(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<AwardMultipleRequest>,
) -> ApiResult<AwardMultipleResponse> {
    let action: KarmaAction = req.action.parse()?;
    let results = state.ledger.award_karma_to_multiple(&req.user_ids, action);
    Ok(Json(AwardMultipleResponse { results }))
}

// --- Ritual endpoints ---

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RitualListQuery {
    scope: Option<String>,
    user_id: Option<String>,
}

async fn list_rituals(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<RitualListQuery>,
) -> ApiResult<Vec<RitualDefinition>> {
    let scope = parse_scope(query.scope.as_deref())?;
    Ok(Json(state.ledger.list_rituals(scope, query.user_id.as_deref())?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct CreateRitualRequest {
    user_id: String,
    title: String,
    description: String,
    tags: Vec<String>,
    effort_level: String,
    scope: Option<String>,
}

async fn create_ritual(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateRitualRequest>,
) -> Result<(StatusCode, Json<RitualDefinition>), Error> {
    let ritual = state.ledger.create_ritual(NewRitual {
        user_id: req.user_id,
        title: req.title,
        description: req.description,
        tags: req.tags,
        effort_level: parse_effort(&req.effort_level)?,
        scope: parse_scope(req.scope.as_deref())?.unwrap_or(RitualScope::Personalized),
    })?;
    Ok((StatusCode::CREATED, Json(ritual)))
}

async fn get_ritual(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<RitualDefinition> {
    Ok(Json(state.ledger.get_ritual(&id)?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct UserQuery {
    user_id: String,
}

async fn delete_ritual(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> ApiResult<Success> {
    state.ledger.delete_ritual(&id, &query.user_id)?;
    Ok(Json(OK))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct MembershipRequest {
    user_id: String,
    ritual_id: String,
    /// Accepted for compatibility; rituals have a single canonical record.
    ritual_scope: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JoinResponse {
    success: bool,
    joined: bool,
    ripple_count: u64,
}

async fn join_ritual(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<MembershipRequest>,
) -> ApiResult<JoinResponse> {
    let outcome = state.ledger.join_ritual(&req.ritual_id, &req.user_id)?;
    Ok(Json(JoinResponse {
        success: true,
        joined: outcome.joined,
        ripple_count: outcome.ripple_count,
    }))
}

async fn leave_ritual(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<MembershipRequest>,
) -> ApiResult<Success> {
    if let Some(scope) = req.ritual_scope.as_deref() {
        tracing::debug!(ritual_id = %req.ritual_id, scope, "Ignoring ritualScope on leave");
    }
    state.ledger.leave_ritual(&req.ritual_id, &req.user_id)?;
    Ok(Json(OK))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct CompleteRitualRequest {
    user_id: String,
    ritual_id: String,
    completed_quietly: Option<bool>,
    shared_as_moment_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompleteRitualResponse {
    success: bool,
    #[serde(flatten)]
    outcome: CompletionOutcome,
}

async fn complete_ritual(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CompleteRitualRequest>,
) -> ApiResult<CompleteRitualResponse> {
    let shared_as = req.shared_as_moment_id.filter(|id| !id.trim().is_empty());
    let outcome = state.ledger.complete_ritual(
        &req.user_id,
        &req.ritual_id,
        req.completed_quietly.unwrap_or(true),
        shared_as,
    )?;
    Ok(Json(CompleteRitualResponse {
        success: true,
        outcome,
    }))
}

async fn achievements_query(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> ApiResult<AchievementReport> {
    Ok(Json(state.ledger.achievements(&query.user_id)?))
}

async fn achievements_body(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<UserQuery>,
) -> ApiResult<AchievementReport> {
    Ok(Json(state.ledger.achievements(&req.user_id)?))
}

async fn get_ritual_state(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<UserRitualState> {
    Ok(Json(state.ledger.get_ritual_state(&user_id)?))
}

async fn list_completions(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Vec<RitualCompletion>> {
    Ok(Json(state.ledger.list_completions(&user_id)?))
}

// --- Impact moment endpoints ---

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct MomentListQuery {
    user_id: Option<String>,
}

async fn list_moments(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<MomentListQuery>,
) -> ApiResult<Vec<ImpactMoment>> {
    Ok(Json(state.ledger.list_moments(query.user_id.as_deref())?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct CreateMomentRequest {
    text: String,
    tags: Vec<String>,
    effort_level: String,
    user_id: String,
    ritual_id: Option<String>,
    anonymous: bool,
}

#[derive(Debug, Serialize)]
struct CreatedResponse {
    success: bool,
    id: String,
}

async fn create_moment(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateMomentRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), Error> {
    let moment = state.ledger.create_moment(NewMoment {
        user_id: req.user_id,
        text: req.text,
        tags: req.tags,
        effort_level: parse_effort(&req.effort_level)?,
        ritual_id: req.ritual_id,
        anonymous: req.anonymous,
    })?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            success: true,
            id: moment.id,
        }),
    ))
}

async fn get_moment(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<ImpactMoment> {
    Ok(Json(state.ledger.get_moment(&id)?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct UpdateMomentRequest {
    user_id: String,
    text: Option<String>,
    tags: Option<Vec<String>>,
    effort_level: Option<String>,
}

async fn update_moment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateMomentRequest>,
) -> ApiResult<ImpactMoment> {
    let patch = MomentPatch {
        text: req.text,
        tags: req.tags,
        effort_level: req.effort_level.as_deref().map(parse_effort).transpose()?,
    };
    Ok(Json(state.ledger.update_moment(&id, &req.user_id, patch)?))
}

async fn delete_moment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> ApiResult<Success> {
    state.ledger.delete_moment(&id, &query.user_id)?;
    Ok(Json(OK))
}

#[derive(Debug, Serialize)]
struct ConvertResponse {
    success: bool,
    ritual: RitualDefinition,
}

async fn convert_moment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UserQuery>,
) -> Result<(StatusCode, Json<ConvertResponse>), Error> {
    let ritual = state.ledger.convert_moment_to_ritual(&id, &req.user_id)?;
    Ok((
        StatusCode::CREATED,
        Json(ConvertResponse {
            success: true,
            ritual,
        }),
    ))
}

// --- Story reaction endpoints ---

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ReactionRequest {
    story_id: String,
    user_id: String,
    reaction_type: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReactionResponse {
    success: bool,
    reaction_count: usize,
}

async fn react_to_story(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ReactionRequest>,
) -> ApiResult<ReactionResponse> {
    let reaction_type: ReactionType = req.reaction_type.parse()?;
    let outcome = state
        .ledger
        .react_to_story(&req.story_id, &req.user_id, reaction_type)?;
    Ok(Json(ReactionResponse {
        success: true,
        reaction_count: outcome.reaction_count,
    }))
}

async fn list_reactions(
    State(state): State<AppState>,
    Path(story_id): Path<String>,
) -> ApiResult<Vec<StoryReaction>> {
    Ok(Json(state.ledger.story_reactions(&story_id)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{Clock, Ledger};
    use crate::storage::Storage;
    use axum_test::TestServer;
    use chrono::NaiveDate;
    use serde_json::{json, Value};
    use tempfile::{tempdir, TempDir};

    fn create_test_app() -> (TempDir, Arc<NodeState>, TestServer) {
        let dir = tempdir().unwrap();
        let storage = Arc::new(Storage::open(dir.path().join("db")).unwrap());
        let today = NaiveDate::from_ymd_opt(2024, 9, 1).unwrap();
        let state = Arc::new(NodeState {
            ledger: Ledger::new(storage, Clock::on(today)),
        });
        let server = TestServer::new(build_router(Arc::clone(&state))).unwrap();
        (dir, state, server)
    }

    async fn create_ritual_via_api(server: &TestServer, user_id: &str, scope: &str) -> String {
        let response = server
            .post("/api/rituals")
            .json(&json!({
                "userId": user_id,
                "title": "Morning stretch",
                "tags": ["health"],
                "effortLevel": "minimal",
                "scope": scope,
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json::<Value>()["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let (_dir, _state, server) = create_test_app();
        let response = server.get("/health").await;
        response.assert_status_ok();
        response.assert_text("OK");
    }

    #[tokio::test]
    async fn test_complete_ritual_flow() {
        let (_dir, state, server) = create_test_app();
        state.ledger.create_user("alice", "Alice").unwrap();
        let ritual_id = create_ritual_via_api(&server, "alice", "global").await;

        let response = server
            .post("/api/rituals/complete")
            .json(&json!({ "userId": "alice", "ritualId": ritual_id, "completedQuietly": false }))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["success"], true);
        assert_eq!(body["updatedStreak"], 1);
        assert_eq!(body["state"]["totalCompleted"], 1);
        assert_eq!(body["completion"]["date"], "2024-09-01");
        assert_eq!(body["karmaAwarded"], 10);

        let duplicate = server
            .post("/api/rituals/complete")
            .json(&json!({ "userId": "alice", "ritualId": ritual_id, "completedQuietly": false }))
            .await;
        duplicate.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = duplicate.json();
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("already completed"));

        let completions: Vec<Value> = server.get("/api/rituals/completions/alice").await.json();
        assert_eq!(completions.len(), 1);
    }

    #[tokio::test]
    async fn test_complete_requires_fields() {
        let (_dir, _state, server) = create_test_app();
        let response = server
            .post("/api/rituals/complete")
            .json(&json!({ "ritualId": "r1" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_body_uses_error_shape() {
        let (_dir, state, server) = create_test_app();
        state.ledger.create_user("alice", "Alice").unwrap();

        let wrong_type = server
            .post("/api/rituals/complete")
            .json(&json!({ "userId": "alice", "ritualId": "r1", "completedQuietly": "yes" }))
            .await;
        wrong_type.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = wrong_type.json();
        assert_eq!(body["success"], false);
        assert!(body["error"].is_string());

        let not_json = server.post("/api/story-reactions").text("inspired").await;
        not_json.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(not_json.json::<Value>()["success"], false);

        let bad_query = server.get("/api/impact-moments?userId=alice&userId=bob").await;
        bad_query.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(bad_query.json::<Value>()["success"], false);
    }

    #[tokio::test]
    async fn test_join_and_leave() {
        let (_dir, state, server) = create_test_app();
        state.ledger.create_user("alice", "Alice").unwrap();
        state.ledger.create_user("bob", "Bob").unwrap();
        let ritual_id = create_ritual_via_api(&server, "alice", "public").await;

        let joined: Value = server
            .post("/api/rituals/join")
            .json(&json!({ "userId": "bob", "ritualId": ritual_id }))
            .await
            .json();
        assert_eq!(joined["rippleCount"], 2);

        let left = server
            .post("/api/rituals/leave")
            .json(&json!({ "userId": "bob", "ritualId": ritual_id, "ritualScope": "public" }))
            .await;
        left.assert_status_ok();
        assert_eq!(left.json::<Value>()["success"], true);

        let ritual: Value = server.get(&format!("/api/rituals/{}", ritual_id)).await.json();
        assert_eq!(ritual["rippleCount"], 1);
        assert_eq!(ritual["joinedByUsers"], json!(["alice"]));

        // Leaving twice, or leaving a ritual that does not exist, still succeeds.
        server
            .post("/api/rituals/leave")
            .json(&json!({ "userId": "bob", "ritualId": ritual_id }))
            .await
            .assert_status_ok();
        server
            .post("/api/rituals/leave")
            .json(&json!({ "userId": "bob", "ritualId": "missing" }))
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn test_achievements_get_and_post() {
        let (_dir, state, server) = create_test_app();
        state.ledger.create_user("alice", "Alice").unwrap();

        let via_get: Value = server
            .get("/api/rituals/achievements")
            .add_query_param("userId", "alice")
            .await
            .json();
        let via_post: Value = server
            .post("/api/rituals/achievements")
            .json(&json!({ "userId": "alice" }))
            .await
            .json();
        assert_eq!(via_get, via_post);
        assert_eq!(via_get["unlockedIds"], json!([]));
        assert!(!via_get["achievements"].as_array().unwrap().is_empty());

        server
            .post("/api/rituals/achievements")
            .json(&json!({ "userId": "ghost" }))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_impact_moment_create_and_ownership() {
        let (_dir, state, server) = create_test_app();
        state.ledger.create_user("alice", "Alice").unwrap();

        let response = server
            .post("/api/impact-moments")
            .json(&json!({
                "text": "Planted a tree",
                "tags": ["environment"],
                "effortLevel": "significant",
                "userId": "alice",
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let id = response.json::<Value>()["id"].as_str().unwrap().to_string();

        let karma: Value = server.get("/api/karma/alice").await.json();
        assert_eq!(karma["total"], 10);
        assert_eq!(karma["breakdown"]["creation"], 10);

        server
            .put(&format!("/api/impact-moments/{}", id))
            .json(&json!({ "userId": "mallory", "text": "Hijacked" }))
            .await
            .assert_status(StatusCode::FORBIDDEN);
        server
            .delete(&format!("/api/impact-moments/{}", id))
            .add_query_param("userId", "mallory")
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let converted = server
            .post(&format!("/api/impact-moments/{}/convert", id))
            .json(&json!({ "userId": "alice" }))
            .await;
        converted.assert_status(StatusCode::CREATED);
        assert_eq!(converted.json::<Value>()["ritual"]["scope"], "personalized");
    }

    #[tokio::test]
    async fn test_impact_moment_rejects_bad_effort() {
        let (_dir, state, server) = create_test_app();
        state.ledger.create_user("alice", "Alice").unwrap();
        server
            .post("/api/impact-moments")
            .json(&json!({
                "text": "Planted a tree",
                "tags": ["environment"],
                "effortLevel": "legendary",
                "userId": "alice",
            }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_story_reactions() {
        let (_dir, state, server) = create_test_app();
        state.ledger.create_user("alice", "Alice").unwrap();

        let body: Value = server
            .post("/api/story-reactions")
            .json(&json!({ "storyId": "story-1", "userId": "alice", "reactionType": "inspired" }))
            .await
            .json();
        assert_eq!(body["success"], true);
        assert_eq!(body["reactionCount"], 1);

        let reactions: Vec<Value> = server.get("/api/story-reactions/story-1").await.json();
        assert_eq!(reactions.len(), 1);
        assert_eq!(reactions[0]["reactionType"], "inspired");

        server
            .post("/api/story-reactions")
            .json(&json!({ "storyId": "story-1", "userId": "alice", "reactionType": "furious" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_award_endpoints() {
        let (_dir, state, server) = create_test_app();
        state.ledger.create_user("alice", "Alice").unwrap();

        let body: Value = server
            .post("/api/karma/award")
            .json(&json!({ "userId": "alice", "action": "comment_posted" }))
            .await
            .json();
        assert_eq!(body["points"], 3);
        assert_eq!(body["total"], 3);

        server
            .post("/api/karma/award")
            .json(&json!({ "userId": "alice", "action": "free_points" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let bulk: Value = server
            .post("/api/karma/award-multiple")
            .json(&json!({ "userIds": ["alice", "ghost"], "action": "story_reaction" }))
            .await
            .json();
        assert_eq!(bulk["results"][0]["success"], true);
        assert_eq!(bulk["results"][1]["success"], false);

        server.get("/api/karma/ghost").await.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_private_rituals_listing() {
        let (_dir, state, server) = create_test_app();
        state.ledger.create_user("alice", "Alice").unwrap();
        create_ritual_via_api(&server, "alice", "personalized").await;
        create_ritual_via_api(&server, "alice", "global").await;

        let public: Vec<Value> = server.get("/api/rituals").await.json();
        assert_eq!(public.len(), 1);

        let mine: Vec<Value> = server.get("/api/users/alice/rituals").await.json();
        assert_eq!(mine.len(), 2);

        server
            .get("/api/rituals")
            .add_query_param("scope", "secret")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}
