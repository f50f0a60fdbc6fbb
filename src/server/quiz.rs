use super::error::ApiError;
use super::validation::{
    present, required, MAX_ANSWER, MAX_COMMAND, MAX_EXPLANATION, MAX_QUESTION, MAX_TOOL_NAME,
};
use super::SharedState;
use crate::store::Command;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

pub(super) fn routes() -> Router<SharedState> {
    // `check`, `explain` and `save` shadow tool names of the same spelling.
    Router::new()
        .route("/tools", get(quiz_tools))
        .route("/quiz/check", post(check_answer))
        .route("/quiz/explain", post(explain_command))
        .route("/quiz/save", post(save_command))
        .route("/quiz/:tool_name", get(quiz_question))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QuestionResponse {
    question: String,
    tool_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckRequest {
    question: Option<String>,
    answer: Option<String>,
    tool_name: Option<String>,
}

#[derive(Debug, Serialize)]
struct CheckResponse {
    feedback: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExplainRequest {
    command: Option<String>,
    tool_name: Option<String>,
}

#[derive(Debug, Serialize)]
struct ExplainResponse {
    explanation: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaveRequest {
    command: Option<String>,
    tool_name: Option<String>,
    explanation: Option<String>,
}

#[derive(Debug, Serialize)]
struct ToolsResponse {
    tools: Vec<String>,
}

async fn quiz_question(
    State(state): State<SharedState>,
    Path(tool_name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let tool_name = required("toolName", Some(tool_name.as_str()), MAX_TOOL_NAME)?;
    let question = state.llm_text(state.quiz.generate_question(tool_name).await)?;

    // Every call must reach the model; nothing in between may reuse a question.
    let headers = [
        (header::CACHE_CONTROL, "no-cache, no-store, must-revalidate"),
        (header::PRAGMA, "no-cache"),
        (header::EXPIRES, "0"),
    ];
    Ok((
        headers,
        Json(QuestionResponse {
            question,
            tool_name: tool_name.to_string(),
        }),
    ))
}

async fn check_answer(
    State(state): State<SharedState>,
    body: Result<Json<CheckRequest>, JsonRejection>,
) -> Result<Json<CheckResponse>, ApiError> {
    let Json(request) = body?;
    let question = required("question", request.question.as_deref(), MAX_QUESTION)?;
    let answer = required("answer", request.answer.as_deref(), MAX_ANSWER)?;
    let tool_name = required("toolName", request.tool_name.as_deref(), MAX_TOOL_NAME)?;

    let feedback = state.llm_text(
        state
            .quiz
            .evaluate_answer(tool_name, question, answer)
            .await,
    )?;
    Ok(Json(CheckResponse { feedback }))
}

async fn explain_command(
    State(state): State<SharedState>,
    body: Result<Json<ExplainRequest>, JsonRejection>,
) -> Result<Json<ExplainResponse>, ApiError> {
    let Json(request) = body?;
    let command = required("command", request.command.as_deref(), MAX_COMMAND)?;
    let tool_name = required("toolName", request.tool_name.as_deref(), MAX_TOOL_NAME)?;

    let explanation = state.llm_text(
        state
            .quiz
            .get_command_explanation(tool_name, command)
            .await,
    )?;
    Ok(Json(ExplainResponse { explanation }))
}

async fn save_command(
    State(state): State<SharedState>,
    body: Result<Json<SaveRequest>, JsonRejection>,
) -> Result<Json<Command>, ApiError> {
    let Json(request) = body?;
    let command = required("command", request.command.as_deref(), MAX_COMMAND)?;
    let tool_name = required("toolName", request.tool_name.as_deref(), MAX_TOOL_NAME)?;
    let explanation = present(
        "explanation",
        request.explanation.as_deref(),
        MAX_EXPLANATION,
    )?;

    let saved = state
        .quiz
        .save_command(tool_name, command, explanation)
        .await?;
    Ok(Json(saved))
}

async fn quiz_tools(State(state): State<SharedState>) -> Json<ToolsResponse> {
    Json(ToolsResponse {
        tools: state.quiz_tools.clone(),
    })
}
