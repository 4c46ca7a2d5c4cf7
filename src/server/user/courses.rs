use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use super::subscriptions::subscribe_response;
use crate::auth::RequireUser;
use crate::notify::ChangeKind;
use crate::policy::{Operation, authorize};
use crate::server::AppState;
use crate::server::dto::{CourseResponse, CreateCourseRequest, SubscriptionStatusResponse, UpdateCourseRequest};
use crate::server::response::{
    ApiError, ApiResponse, COURSE_PAGE, PageParams, StoreOptionExt, StoreResultExt,
};
use crate::server::validation::validate_title;
use crate::store::Store;
use crate::types::{Course, LessonSummary};

pub(super) fn course_response(store: &dyn Store, course: Course) -> Result<CourseResponse, ApiError> {
    let lessons = store
        .list_course_lessons(&course.id)
        .api_err("Failed to list lessons")?;

    Ok(CourseResponse {
        lessons_count: lessons.len(),
        lessons: lessons.iter().map(LessonSummary::from).collect(),
        course,
    })
}

pub(super) fn load_course(store: &dyn Store, id: &str) -> Result<Course, ApiError> {
    store
        .get_course(id)
        .api_err("Failed to get course")?
        .or_not_found("Course not found")
}

pub async fn list_courses(
    _auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> impl IntoResponse {
    let page = params.resolve(COURSE_PAGE);
    let store = state.store.as_ref();

    let courses = store
        .list_courses(page.offset(), page.fetch_limit())
        .api_err("Failed to list courses")?;

    let mut items = Vec::with_capacity(courses.len());
    for course in courses {
        items.push(course_response(store, course)?);
    }

    Ok::<_, ApiError>(Json(page.respond(items, |c| c)))
}

pub async fn create_course(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateCourseRequest>,
) -> impl IntoResponse {
    validate_title(&req.title, "Course")?;

    let now = Utc::now();
    let course = Course {
        id: Uuid::new_v4().to_string(),
        title: req.title.trim().to_string(),
        description: req.description,
        owner_id: auth.user.id.clone(),
        created_at: now,
        updated_at: now,
    };
    authorize(&auth.user, &course, Operation::Create)?;

    state
        .store
        .create_course(&course)
        .api_err("Failed to create course")?;

    tracing::info!(course = %course.id, owner = %course.owner_id, "course created");
    let response = course_response(state.store.as_ref(), course)?;
    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(response))))
}

pub async fn get_course(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let course = load_course(state.store.as_ref(), &id)?;
    authorize(&auth.user, &course, Operation::Read)?;

    let response = course_response(state.store.as_ref(), course)?;
    Ok::<_, ApiError>(Json(ApiResponse::success(response)))
}

pub async fn update_course(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateCourseRequest>,
) -> impl IntoResponse {
    let mut course = load_course(state.store.as_ref(), &id)?;
    authorize(&auth.user, &course, Operation::Update)?;

    if let Some(title) = req.title {
        validate_title(&title, "Course")?;
        course.title = title.trim().to_string();
    }
    if let Some(description) = req.description {
        course.description = description;
    }
    course.updated_at = Utc::now();

    state
        .store
        .update_course(&course)
        .api_err("Failed to update course")?;

    state.notify_course_update(&course.id, ChangeKind::Course, &course.id);

    let response = course_response(state.store.as_ref(), course)?;
    Ok::<_, ApiError>(Json(ApiResponse::success(response)))
}

pub async fn delete_course(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let course = load_course(state.store.as_ref(), &id)?;
    authorize(&auth.user, &course, Operation::Delete)?;

    state
        .store
        .delete_course(&course.id)
        .api_err("Failed to delete course")?;

    tracing::info!(course = %course.id, "course deleted");
    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

pub async fn list_course_lessons(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let course = load_course(state.store.as_ref(), &id)?;
    authorize(&auth.user, &course, Operation::Read)?;

    let lessons = state
        .store
        .list_course_lessons(&course.id)
        .api_err("Failed to list lessons")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(lessons)))
}

pub async fn subscribe(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    subscribe_response(&state, &auth.user.id, &id)
}

pub async fn unsubscribe(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    state.ledger.unsubscribe(&auth.user.id, &id)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(SubscriptionStatusResponse {
        course_id: id,
        status: "deactivated",
        message: "Subscription deactivated",
    })))
}
