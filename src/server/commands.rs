use super::error::ApiError;
use super::validation::{
    required, within_limit, MAX_COMMAND, MAX_EXPLANATION, MAX_SEARCH_TEXT, MAX_TOOL_NAME,
};
use super::SharedState;
use crate::store::{Command, NewCommand};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

pub(super) fn routes() -> Router<SharedState> {
    Router::new()
        .route("/commands", post(create_command))
        .route("/commands/:tool_name", get(commands_by_tool))
        .route("/commands/:tool_name/search", get(search_commands))
        .route("/commands/:tool_name/count", get(count_commands))
}

// Any client-supplied `id` is ignored; the store assigns one.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateCommandRequest {
    tool_name: Option<String>,
    command_text: Option<String>,
    explanation: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(rename = "searchText")]
    search_text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CountResponse {
    tool_name: String,
    count: u64,
}

async fn create_command(
    State(state): State<SharedState>,
    body: Result<Json<CreateCommandRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Command>), ApiError> {
    let Json(request) = body?;
    let tool_name = required("toolName", request.tool_name.as_deref(), MAX_TOOL_NAME)?;
    let command_text = required("commandText", request.command_text.as_deref(), MAX_COMMAND)?;
    let explanation = within_limit(
        "explanation",
        request.explanation.as_deref().unwrap_or_default(),
        MAX_EXPLANATION,
    )?;

    let saved = state
        .commands
        .save(NewCommand::new(tool_name, command_text, explanation))
        .await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

async fn commands_by_tool(
    State(state): State<SharedState>,
    Path(tool_name): Path<String>,
) -> Result<Response, ApiError> {
    let tool_name = required("toolName", Some(tool_name.as_str()), MAX_TOOL_NAME)?;
    let commands = state.commands.find_by_tool(tool_name).await?;
    Ok(list_response(commands))
}

async fn search_commands(
    State(state): State<SharedState>,
    Path(tool_name): Path<String>,
    query: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = query?;
    let tool_name = required("toolName", Some(tool_name.as_str()), MAX_TOOL_NAME)?;
    let search_text = required(
        "searchText",
        params.search_text.as_deref(),
        MAX_SEARCH_TEXT,
    )?;

    let commands = state
        .commands
        .search_by_tool_and_text(tool_name, search_text)
        .await?;
    Ok(list_response(commands))
}

async fn count_commands(
    State(state): State<SharedState>,
    Path(tool_name): Path<String>,
) -> Result<Json<CountResponse>, ApiError> {
    let tool_name = required("toolName", Some(tool_name.as_str()), MAX_TOOL_NAME)?;
    let count = state.commands.count_by_tool(tool_name).await?;
    Ok(Json(CountResponse {
        tool_name: tool_name.to_string(),
        count,
    }))
}

/// 204 with no body when nothing matched.
fn list_response(commands: Vec<Command>) -> Response {
    if commands.is_empty() {
        StatusCode::NO_CONTENT.into_response()
    } else {
        Json(commands).into_response()
    }
}
