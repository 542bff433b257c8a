use super::state::AppState;
use crate::error::CoachError;
use crate::feedback::Report;
use crate::session::{
    AnswerAnalysis, AnswerSubmission, AudioUpload, Difficulty, Focus, SessionSettings,
};
use axum::extract::multipart::Field;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartPracticeRequest {
    pub role: String,
    pub user_id: String,
    /// Defaults to adaptive
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Defaults to general
    #[serde(default)]
    pub focus: Focus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartPracticeResponse {
    pub session_id: String,
    pub questions: Vec<String>,
    pub round_number: u32,
    pub config: SessionSettings,
    pub previous_round: PreviousRound,
}

/// What the new round was adapted from, if anything.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviousRound {
    pub session_id: Option<String>,
    pub weaknesses: Vec<String>,
    pub score: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishRequest {
    pub session_id: String,
    pub user_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishResponse {
    pub status: String,
    pub summary: Report,
    pub per_question: Vec<AnswerAnalysis>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /practice/start
pub async fn start_practice(
    State(state): State<AppState>,
    Json(req): Json<StartPracticeRequest>,
) -> Result<impl IntoResponse, CoachError> {
    if req.role.trim().is_empty() || req.user_id.trim().is_empty() {
        return Err(CoachError::InvalidInput("Missing role/userId".to_string()));
    }

    let started = state
        .orchestrator
        .start(&req.role, &req.user_id, req.difficulty, req.focus)
        .await?;

    Ok(Json(StartPracticeResponse {
        session_id: started.session_id,
        questions: started.questions,
        round_number: started.round_number,
        config: started.config,
        previous_round: PreviousRound {
            session_id: started.based_on_session_id,
            weaknesses: started.based_on_weaknesses,
            score: started.previous_score,
        },
    }))
}

/// POST /practice/answer (multipart form, optional audio attachment)
pub async fn submit_answer(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, CoachError> {
    let mut session_id = None;
    let mut user_id = None;
    let mut question_index = None;
    let mut question = None;
    let mut skipped = false;
    let mut audio = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| CoachError::InvalidInput(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "sessionId" => session_id = Some(text_field(field).await?),
            "userId" => user_id = Some(text_field(field).await?),
            "questionIndex" => {
                let raw = text_field(field).await?;
                let parsed = raw.trim().parse::<u32>().map_err(|_| {
                    CoachError::InvalidInput(format!("Invalid questionIndex: {raw}"))
                })?;
                question_index = Some(parsed);
            }
            "questionText" => question = Some(text_field(field).await?),
            // Boolean-as-string; only a case-insensitive "true" counts
            "skipped" => skipped = text_field(field).await?.trim().eq_ignore_ascii_case("true"),
            "file" => {
                let file_name = field.file_name().map(str::to_owned);
                let bytes = field.bytes().await.map_err(|e| {
                    CoachError::InvalidInput(format!("Failed to read audio upload: {e}"))
                })?;
                audio = Some(AudioUpload {
                    bytes: bytes.to_vec(),
                    file_name,
                });
            }
            other => debug!("Ignoring unknown multipart field {other:?}"),
        }
    }

    let session_id =
        session_id.ok_or_else(|| CoachError::InvalidInput("Missing sessionId".to_string()))?;
    let user_id = user_id.ok_or_else(|| CoachError::InvalidInput("Missing userId".to_string()))?;
    let question_index = question_index
        .ok_or_else(|| CoachError::InvalidInput("Missing questionIndex".to_string()))?;

    state
        .orchestrator
        .record_answer(
            &session_id,
            &user_id,
            AnswerSubmission {
                question_index,
                question,
                skipped,
                audio,
            },
        )
        .await?;

    Ok(Json(json!({ "ok": true })))
}

/// POST /practice/finish
pub async fn finish_practice(
    State(state): State<AppState>,
    Json(req): Json<FinishRequest>,
) -> Result<impl IntoResponse, CoachError> {
    let completed = state
        .orchestrator
        .finish(&req.session_id, &req.user_id)
        .await?;

    Ok(Json(FinishResponse {
        status: "completed".to_string(),
        summary: completed.summary,
        per_question: completed.per_question,
    }))
}

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn text_field(field: Field<'_>) -> Result<String, CoachError> {
    field
        .text()
        .await
        .map_err(|e| CoachError::InvalidInput(format!("Malformed multipart field: {e}")))
}
