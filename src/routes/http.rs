//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;

use axum::{
  extract::{Path, State},
  http::{header, StatusCode},
  response::IntoResponse,
  Json,
};
use tracing::{error, info, instrument, warn};

use crate::coverage::CoverageError;
use crate::factory::GenerationError;
use crate::logic::*;
use crate::protocol::*;
use crate::state::AppState;

type HttpError = (StatusCode, Json<ErrorOut>);

fn generation_error(e: GenerationError) -> HttpError {
  let status = match &e {
    GenerationError::Coverage(CoverageError::Io { .. }) => StatusCode::NOT_FOUND,
    GenerationError::Coverage(_) | GenerationError::NoUncoveredLines { .. } => StatusCode::UNPROCESSABLE_ENTITY,
  };
  (status, Json(ErrorOut { error: e.to_string() }))
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip_all)]
pub async fn http_post_challenge(
  State(state): State<Arc<AppState>>,
  Json(body): Json<ChallengeIn>,
) -> Result<Json<ChallengeOut>, HttpError> {
  match create_challenge(&state, body).await {
    Ok(t) => {
      info!(target: "challenge", id = %t.id, kind = t.challenge.type_name(), "HTTP challenge created");
      Ok(Json(to_out(&t)))
    }
    Err(e) => {
      warn!(target: "challenge", error = %e, "HTTP challenge creation failed");
      Err(generation_error(e))
    }
  }
}

#[instrument(level = "info", skip(state))]
pub async fn http_list_challenges(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let all = state.list_challenges().await;
  Json(all.iter().map(to_out).collect::<Vec<_>>())
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_get_challenge(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<Json<ChallengeOut>, HttpError> {
  match state.get_challenge(&id).await {
    Some(t) => Ok(Json(to_out(&t))),
    None => Err((StatusCode::NOT_FOUND, Json(ErrorOut { error: format!("Unknown challenge id: {}", id) }))),
  }
}

#[instrument(level = "info", skip(state, body), fields(branch = ?body.branch, result = ?body.outcome.result))]
pub async fn http_post_build(
  State(state): State<Arc<AppState>>,
  Json(body): Json<BuildIn>,
) -> Result<Json<EvaluationOut>, HttpError> {
  match evaluate_build(&state, body.branch, body.constants, body.outcome).await {
    Ok(report) => {
      info!(target: "challenge", branch = %report.branch, solved = report.solved.len(), rejected = report.rejected.len(), "HTTP build evaluated");
      Ok(Json(report))
    }
    Err(e) => {
      error!(target: "challenge", error = %e, "HTTP build evaluation aborted");
      Err((StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorOut { error: e.to_string() })))
    }
  }
}

#[instrument(level = "info", skip(state))]
pub async fn http_export_xml(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let xml = export_xml(&state).await;
  ([(header::CONTENT_TYPE, "application/xml")], xml)
}
