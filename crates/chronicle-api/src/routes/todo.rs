//! Routes for the to-do bounded context.
//!
//! Commands identify their actor with the optional `x-actor-id` header.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use chronicle_core::event::AggregateId;
use chronicle_todo::application::command_handlers::{self, TodoCommandResult};
use chronicle_todo::application::query_handlers::{self, TodoView};
use chronicle_todo::domain::commands;

use crate::error::ApiError;
use crate::state::AppState;

/// Header naming who issued a command.
pub const ACTOR_HEADER: &str = "x-actor-id";

/// Request body for POST / and POST /{id}/text.
#[derive(Debug, Deserialize)]
pub struct TextRequest {
    /// The to-do text.
    pub text: String,
}

/// Request body for POST /{id}/done.
#[derive(Debug, Deserialize)]
pub struct DoneRequest {
    /// New completion state.
    pub is_done: bool,
}

/// Query parameters for GET /.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// Include soft-deleted items.
    #[serde(default)]
    pub include_deleted: bool,
}

/// Query parameters for GET /{id}.
#[derive(Debug, Default, Deserialize)]
pub struct GetParams {
    /// Return the state as of this version.
    pub version: Option<i64>,
    /// Return the item even if it is soft-deleted.
    #[serde(default)]
    pub include_deleted: bool,
}

/// Query parameters for GET /batch.
#[derive(Debug, Default, Deserialize)]
pub struct BatchParams {
    /// Comma-separated to-do ids.
    #[serde(default)]
    pub ids: String,
    /// Include soft-deleted items.
    #[serde(default)]
    pub include_deleted: bool,
}

/// Response body returned after a command is successfully handled.
#[derive(Debug, Serialize)]
pub struct CommandResponse {
    /// The affected to-do item.
    pub aggregate_id: String,
    /// Version after the command.
    pub version: i64,
    /// IDs of the domain events produced and persisted.
    pub event_ids: Vec<Uuid>,
}

impl From<TodoCommandResult> for CommandResponse {
    fn from(result: TodoCommandResult) -> Self {
        Self {
            aggregate_id: result.aggregate_id.to_string(),
            version: result.version,
            event_ids: result.event_ids,
        }
    }
}

fn actor(headers: &HeaderMap) -> Option<String> {
    headers
        .get(ACTOR_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

/// POST /
#[instrument(skip_all)]
async fn create_todo(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<TextRequest>,
) -> Result<(StatusCode, Json<CommandResponse>), ApiError> {
    let command = commands::CreateTodo {
        actor_id: actor(&headers),
        text: request.text,
    };

    info!(actor_id = ?command.actor_id, "handling create_todo command");

    let result =
        command_handlers::handle_create_todo(&command, state.clock.as_ref(), &state.todos).await?;

    Ok((StatusCode::CREATED, Json(result.into())))
}

/// GET /
#[instrument(skip(state))]
async fn list_todos(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<TodoView>>, ApiError> {
    let views = query_handlers::list_todos(params.include_deleted, &state.todos).await?;
    Ok(Json(views))
}

/// GET /batch
#[instrument(skip(state))]
async fn get_todos_batch(
    State(state): State<AppState>,
    Query(params): Query<BatchParams>,
) -> Result<Json<Vec<TodoView>>, ApiError> {
    let ids: Vec<AggregateId> = params
        .ids
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(AggregateId::from)
        .collect();
    let views = query_handlers::get_todos_by_ids(&ids, params.include_deleted, &state.todos).await?;
    Ok(Json(views))
}

/// GET /{id}
#[instrument(skip(state))]
async fn get_todo(
    State(state): State<AppState>,
    Path(todo_id): Path<String>,
    Query(params): Query<GetParams>,
) -> Result<Json<TodoView>, ApiError> {
    let view = query_handlers::get_todo_by_id(
        &AggregateId::new(todo_id),
        params.version,
        params.include_deleted,
        &state.todos,
    )
    .await?;
    Ok(Json(view))
}

/// POST /{id}/text
#[instrument(skip(state, headers, request))]
async fn change_text(
    State(state): State<AppState>,
    Path(todo_id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<TextRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::ChangeTodoText {
        actor_id: actor(&headers),
        todo_id: AggregateId::new(todo_id),
        text: request.text,
    };

    info!(actor_id = ?command.actor_id, "handling change_todo_text command");

    let result =
        command_handlers::handle_change_todo_text(&command, state.clock.as_ref(), &state.todos)
            .await?;

    Ok(Json(result.into()))
}

/// POST /{id}/done
#[instrument(skip(state, headers))]
async fn set_done(
    State(state): State<AppState>,
    Path(todo_id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<DoneRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::SetTodoDone {
        actor_id: actor(&headers),
        todo_id: AggregateId::new(todo_id),
        is_done: request.is_done,
    };

    info!(actor_id = ?command.actor_id, "handling set_todo_done command");

    let result =
        command_handlers::handle_set_todo_done(&command, state.clock.as_ref(), &state.todos)
            .await?;

    Ok(Json(result.into()))
}

/// DELETE /{id}
#[instrument(skip(state, headers))]
async fn delete_todo(
    State(state): State<AppState>,
    Path(todo_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::DeleteTodo {
        actor_id: actor(&headers),
        todo_id: AggregateId::new(todo_id),
    };

    info!(actor_id = ?command.actor_id, "handling delete_todo command");

    let result =
        command_handlers::handle_delete_todo(&command, state.clock.as_ref(), &state.todos).await?;

    Ok(Json(result.into()))
}

/// POST /{id}/restore
#[instrument(skip(state, headers))]
async fn restore_todo(
    State(state): State<AppState>,
    Path(todo_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::RestoreTodo {
        actor_id: actor(&headers),
        todo_id: AggregateId::new(todo_id),
    };

    info!(actor_id = ?command.actor_id, "handling restore_todo command");

    let result =
        command_handlers::handle_restore_todo(&command, state.clock.as_ref(), &state.todos).await?;

    Ok(Json(result.into()))
}

/// Returns the router for the to-do context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_todo).get(list_todos))
        .route("/batch", get(get_todos_batch))
        .route("/{id}", get(get_todo).delete(delete_todo))
        .route("/{id}/text", post(change_text))
        .route("/{id}/done", post(set_done))
        .route("/{id}/restore", post(restore_todo))
}
