use crate::availability::{available_slots, parse_date};
use crate::backend::BookingBackend;
use crate::booking::{book, BookingRequest};
use crate::error::{BookingError, ErrorKind};
use crate::slots::format_slot;
use crate::types::{Appointment, CounselorProfile, ProfileUpdate};
use axum::extract::{Path, Query, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use axum::{
    routing::{get, post, put},
    Router,
};
use axum_valid::Valid;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, warn};
use uuid::Uuid;

/// Header carrying the id of the authenticated user.
pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Clone)]
pub struct AppState<T: BookingBackend> {
    pub backend: T,
}

/// Id of the user on whose behalf the request runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActingUser(pub Uuid);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityQuery {
    date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAppointmentRequest {
    counselor_user_id: Uuid,
    start_time: String,
    mode: String,
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        let status = match self.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = match self.kind() {
            ErrorKind::Storage => "An internal server error occurred".to_string(),
            _ => self.to_string(),
        };

        let body = Json(json!({
            "error": self.code(),
            "message": message,
        }));
        (status, body).into_response()
    }
}

pub fn create_app<T: BookingBackend>(backend: T) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/counselors", get(get_counselors))
        .route("/counselors/me/profile", put(update_profile))
        .route(
            "/counselors/{counselor_id}/availability",
            get(get_availability),
        )
        .route("/appointments", post(create_appointment))
        .route("/appointments/my-schedule", get(get_my_schedule))
        .route_layer(middleware::from_fn(identify))
        .with_state(AppState { backend })
        .layer(cors)
}

fn unauthorized(message: &str) -> Response {
    let body = Json(json!({
        "error": "unauthorized",
        "message": message,
    }));
    (StatusCode::UNAUTHORIZED, body).into_response()
}

async fn identify(mut request: Request, next: Next) -> Result<Response, Response> {
    let Some(header) = request.headers().get(USER_ID_HEADER) else {
        return Err(unauthorized("Missing credentials"));
    };
    let Some(user_id) = header
        .to_str()
        .ok()
        .and_then(|value| Uuid::parse_str(value.trim()).ok())
    else {
        return Err(unauthorized("Malformed user id"));
    };

    request.extensions_mut().insert(ActingUser(user_id));
    Ok(next.run(request).await)
}

/// Runs a backend call off the async executor; backends may block on locks or I/O.
async fn run_blocking<R, F>(task: F) -> Result<R, BookingError>
where
    F: FnOnce() -> Result<R, BookingError> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(task).await.map_err(|err| {
        error!(?err, "Backend task failed");
        BookingError::Storage(err.to_string())
    })?
}

async fn get_counselors<T: BookingBackend>(
    State(state): State<AppState<T>>,
) -> Result<Json<Vec<CounselorProfile>>, BookingError> {
    let counselors = run_blocking(move || state.backend.counselors()).await?;
    Ok(Json(counselors))
}

async fn update_profile<T: BookingBackend>(
    State(state): State<AppState<T>>,
    Extension(ActingUser(user_id)): Extension<ActingUser>,
    Valid(Json(update)): Valid<Json<ProfileUpdate>>,
) -> Result<Json<CounselorProfile>, BookingError> {
    let profile = run_blocking(move || state.backend.update_profile(user_id, update))
        .await
        .inspect_err(|err| warn!(%user_id, %err, "Profile update rejected"))?;
    Ok(Json(profile))
}

async fn get_availability<T: BookingBackend>(
    State(state): State<AppState<T>>,
    Path(counselor_id): Path<Uuid>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Vec<String>>, BookingError> {
    let date = parse_date(query.date.as_deref().unwrap_or_default())?;
    let slots = run_blocking(move || available_slots(&state.backend, counselor_id, date)).await?;
    Ok(Json(slots.iter().map(format_slot).collect()))
}

async fn create_appointment<T: BookingBackend>(
    State(state): State<AppState<T>>,
    Extension(ActingUser(student_id)): Extension<ActingUser>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<Appointment>), BookingError> {
    let request = BookingRequest {
        counselor_id: request.counselor_user_id,
        student_id,
        start_time: request.start_time,
        mode: request.mode,
    };
    let appointment = run_blocking(move || book(&state.backend, request)).await?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

async fn get_my_schedule<T: BookingBackend>(
    State(state): State<AppState<T>>,
    Extension(ActingUser(counselor_id)): Extension<ActingUser>,
) -> Result<Json<Vec<Appointment>>, BookingError> {
    let appointments =
        run_blocking(move || state.backend.appointments_for_counselor(counselor_id)).await?;
    Ok(Json(appointments))
}
