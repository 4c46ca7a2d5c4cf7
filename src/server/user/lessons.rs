use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use super::courses::load_course;
use crate::auth::RequireUser;
use crate::notify::ChangeKind;
use crate::policy::{Operation, authorize};
use crate::server::AppState;
use crate::server::dto::{CreateLessonRequest, UpdateLessonRequest};
use crate::server::response::{
    ApiError, ApiResponse, LESSON_PAGE, PageParams, StoreOptionExt, StoreResultExt,
};
use crate::server::validation::{validate_title, validate_video_url};
use crate::types::Lesson;

fn load_lesson(state: &AppState, id: &str) -> Result<Lesson, ApiError> {
    state
        .store
        .get_lesson(id)
        .api_err("Failed to get lesson")?
        .or_not_found("Lesson not found")
}

pub async fn list_lessons(
    _auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> impl IntoResponse {
    let page = params.resolve(LESSON_PAGE);

    let lessons = state
        .store
        .list_lessons(page.offset(), page.fetch_limit())
        .api_err("Failed to list lessons")?;

    Ok::<_, ApiError>(Json(page.respond(lessons, |l| l)))
}

pub async fn create_lesson(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateLessonRequest>,
) -> impl IntoResponse {
    validate_title(&req.title, "Lesson")?;
    validate_video_url(&req.video_url)?;

    let course = load_course(state.store.as_ref(), &req.course_id)?;

    let now = Utc::now();
    let lesson = Lesson {
        id: Uuid::new_v4().to_string(),
        course_id: course.id,
        title: req.title.trim().to_string(),
        description: req.description,
        video_url: req.video_url.trim().to_string(),
        owner_id: auth.user.id.clone(),
        created_at: now,
        updated_at: now,
    };
    authorize(&auth.user, &lesson, Operation::Create)?;

    state
        .store
        .create_lesson(&lesson)
        .api_err("Failed to create lesson")?;

    tracing::info!(lesson = %lesson.id, course = %lesson.course_id, "lesson created");
    state.notify_course_update(&lesson.course_id, ChangeKind::Lesson, &lesson.id);

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(lesson))))
}

pub async fn get_lesson(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let lesson = load_lesson(&state, &id)?;
    authorize(&auth.user, &lesson, Operation::Read)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(lesson)))
}

pub async fn update_lesson(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateLessonRequest>,
) -> impl IntoResponse {
    let mut lesson = load_lesson(&state, &id)?;
    authorize(&auth.user, &lesson, Operation::Update)?;

    if let Some(title) = req.title {
        validate_title(&title, "Lesson")?;
        lesson.title = title.trim().to_string();
    }
    if let Some(description) = req.description {
        lesson.description = description;
    }
    if let Some(video_url) = req.video_url {
        validate_video_url(&video_url)?;
        lesson.video_url = video_url.trim().to_string();
    }
    lesson.updated_at = Utc::now();

    state
        .store
        .update_lesson(&lesson)
        .api_err("Failed to update lesson")?;

    state.notify_course_update(&lesson.course_id, ChangeKind::Lesson, &lesson.id);

    Ok::<_, ApiError>(Json(ApiResponse::success(lesson)))
}

pub async fn delete_lesson(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let lesson = load_lesson(&state, &id)?;
    authorize(&auth.user, &lesson, Operation::Delete)?;

    state
        .store
        .delete_lesson(&lesson.id)
        .api_err("Failed to delete lesson")?;

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
