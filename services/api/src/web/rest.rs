//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::error::{error_response, port_error, ErrorResponse, HandlerError};
use crate::web::state::{AppState, TabRole, TabSession};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use chrono::Utc;
use discipline_core::export::{self, ExportFormat};
use discipline_core::profile::{ProfileBook, RECENT_ACTIVITY_LIMIT};
use discipline_core::stats::{ChartDataset, SummaryCounters};
use discipline_core::{
    ActivityEntry, CaseFilter, CasePriority, CaseStats, CaseStatus, DashboardView, NewComplaint, PushedCase,
    StudentProfile, TeacherCase, TeacherCaseBook, TeacherCaseEdit, Theme,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::{IntoParams, OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        create_session_handler,
        create_teacher_session_handler,
        close_session_handler,
        dashboard_handler,
        stats_handler,
        submit_complaint_handler,
        resolve_complaint_handler,
        delete_complaint_handler,
        export_handler,
        get_profile_handler,
        put_profile_handler,
        reset_profile_handler,
        list_activities_handler,
        put_activities_handler,
        get_theme_handler,
        put_theme_handler,
        list_teacher_cases_handler,
        add_teacher_case_handler,
        edit_teacher_case_handler,
        delete_teacher_case_handler,
        push_case_handler,
    ),
    components(
        schemas(CreateSessionRequest, CreateSessionResponse, ErrorResponse, PushResponse, ThemeBody, TabRole)
    ),
    tags(
        (name = "Discipline Case Tracker API", description = "Student and teacher dashboards for disciplinary cases.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// Body of the bootstrap request. Without a snapshot the tab reads the local store.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateSessionRequest {
    #[serde(default)]
    #[schema(value_type = Option<Vec<Object>>)]
    pub snapshot: Option<Vec<Value>>,
}

/// The response payload sent after successfully opening a tab.
#[derive(Serialize, ToSchema)]
pub struct CreateSessionResponse {
    session_id: Uuid,
    role: TabRole,
    #[schema(value_type = Object)]
    dashboard: DashboardView,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    stats: CaseStats,
    summary: SummaryCounters,
    status_chart: ChartDataset,
    priority_chart: ChartDataset,
    #[serde(skip_serializing_if = "Option::is_none")]
    badge: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct PushResponse {
    /// Records now waiting in the student inbox.
    waiting: usize,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ThemeBody {
    #[schema(value_type = String, example = "dark")]
    theme: Theme,
}

/// Optional filter overrides. Any field given replaces the tab's active filter.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FilterParams {
    /// Free-text search over title and description.
    q: Option<String>,
    /// `all` or one of `pending`, `in-progress`, `resolved`, `rejected`.
    status: Option<String>,
    /// `all` or one of `low`, `medium`, `high`, `urgent`.
    priority: Option<String>,
}

impl FilterParams {
    fn is_empty(&self) -> bool {
        self.q.is_none() && self.status.is_none() && self.priority.is_none()
    }

    /// Builds the filter these params describe, or `None` when none were given.
    fn to_filter(&self) -> Result<Option<CaseFilter>, HandlerError> {
        if self.is_empty() {
            return Ok(None);
        }
        let defaults = CaseFilter::default();
        let status = self.status.clone().unwrap_or(defaults.status);
        let priority = self.priority.clone().unwrap_or(defaults.priority);

        if status != discipline_core::filter::ALL && CaseStatus::parse(&status).is_none() {
            return Err(error_response(StatusCode::BAD_REQUEST, format!("Unknown status '{}'", status)));
        }
        if priority != discipline_core::filter::ALL && CasePriority::parse(&priority).is_none() {
            return Err(error_response(
                StatusCode::BAD_REQUEST,
                format!("Unknown priority '{}'", priority),
            ));
        }
        Ok(Some(CaseFilter::new(self.q.clone().unwrap_or_default(), status, priority)))
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExportParams {
    /// `csv` (default) or `json`.
    #[param(value_type = Option<String>)]
    format: Option<ExportFormat>,
    q: Option<String>,
    status: Option<String>,
    priority: Option<String>,
}

//=========================================================================================
// Helpers
//=========================================================================================

async fn find_session(app_state: &AppState, id: Uuid) -> Result<Arc<TabSession>, HandlerError> {
    let session = app_state
        .session(id)
        .await
        .ok_or_else(|| error_response(StatusCode::NOT_FOUND, format!("Session {} not found", id)))?;
    session.touch();
    Ok(session)
}

/// Complaint edits belong to the student dashboard.
fn require_student(session: &TabSession) -> Result<(), HandlerError> {
    match session.role {
        TabRole::Student => Ok(()),
        TabRole::Teacher => Err(error_response(
            StatusCode::FORBIDDEN,
            "Complaints can only be changed from a student tab",
        )),
    }
}

//=========================================================================================
// Tab Session Handlers
//=========================================================================================

/// Open a student tab.
///
/// Clears the previous session's stored data, loads the records (from the
/// snapshot when one is given) and starts the tab's reconciliation listener.
#[utoipa::path(
    post,
    path = "/sessions",
    request_body(content = CreateSessionRequest, description = "Optional server-embedded snapshot."),
    responses(
        (status = 201, description = "Tab opened", body = CreateSessionResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn create_session_handler(
    State(app_state): State<Arc<AppState>>,
    body: Option<Json<CreateSessionRequest>>,
) -> Result<impl IntoResponse, HandlerError> {
    let request = body.map(|Json(b)| b).unwrap_or_default();
    let session = app_state
        .open_session(request.snapshot)
        .await
        .map_err(|e| port_error("Failed to open session", e))?;

    let response = CreateSessionResponse {
        session_id: session.id,
        role: session.role,
        dashboard: session.view().await,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Open a teacher tab over the stored data.
#[utoipa::path(
    post,
    path = "/sessions/teacher",
    responses(
        (status = 201, description = "Tab opened", body = CreateSessionResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn create_teacher_session_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HandlerError> {
    let session = app_state
        .open_teacher_session()
        .await
        .map_err(|e| port_error("Failed to open session", e))?;

    let response = CreateSessionResponse {
        session_id: session.id,
        role: session.role,
        dashboard: session.view().await,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Close a tab and stop its listener.
#[utoipa::path(
    delete,
    path = "/sessions/{id}",
    params(("id" = Uuid, Path, description = "Tab session id.")),
    responses(
        (status = 204, description = "Tab closed"),
        (status = 404, description = "Unknown session", body = ErrorResponse)
    )
)]
pub async fn close_session_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, HandlerError> {
    if app_state.close_session(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(error_response(StatusCode::NOT_FOUND, format!("Session {} not found", id)))
    }
}

/// The tab's dashboard. Filter params given here become the tab's active filter.
#[utoipa::path(
    get,
    path = "/sessions/{id}/dashboard",
    params(("id" = Uuid, Path, description = "Tab session id."), FilterParams),
    responses(
        (status = 200, description = "Filtered list, recent items, counters and charts"),
        (status = 400, description = "Unknown status or priority", body = ErrorResponse),
        (status = 404, description = "Unknown session", body = ErrorResponse)
    )
)]
pub async fn dashboard_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(params): Query<FilterParams>,
) -> Result<Json<DashboardView>, HandlerError> {
    let session = find_session(&app_state, id).await?;
    let filter = params.to_filter()?;

    let view = {
        let mut state = session.state.lock().await;
        state
            .refresh(session.role)
            .await
            .map_err(|e| port_error("Failed to reload complaints", e))?;
        if let Some(filter) = filter {
            state.filter = filter;
        }
        DashboardView::build(state.repository.records(), &state.filter)
    };
    Ok(Json(view))
}

/// Counts per status and priority over every record of the tab.
#[utoipa::path(
    get,
    path = "/sessions/{id}/stats",
    params(("id" = Uuid, Path, description = "Tab session id.")),
    responses(
        (status = 200, description = "Aggregated counters"),
        (status = 404, description = "Unknown session", body = ErrorResponse)
    )
)]
pub async fn stats_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<StatsResponse>, HandlerError> {
    let session = find_session(&app_state, id).await?;
    let stats = {
        let mut state = session.state.lock().await;
        state
            .refresh(session.role)
            .await
            .map_err(|e| port_error("Failed to reload complaints", e))?;
        discipline_core::aggregate(state.repository.records())
    };
    Ok(Json(StatsResponse {
        summary: stats.summary(),
        status_chart: stats.status_chart(),
        priority_chart: stats.priority_chart(),
        badge: stats.badge(),
        stats,
    }))
}

//=========================================================================================
// Student Complaint Handlers
//=========================================================================================

/// Submit a new complaint from the student tab.
#[utoipa::path(
    post,
    path = "/sessions/{id}/complaints",
    params(("id" = Uuid, Path, description = "Tab session id.")),
    request_body(content_type = "application/json", description = "title, description, category, priority, course, date"),
    responses(
        (status = 201, description = "Complaint recorded"),
        (status = 400, description = "Missing title", body = ErrorResponse),
        (status = 403, description = "Not a student tab", body = ErrorResponse),
        (status = 404, description = "Unknown session", body = ErrorResponse)
    )
)]
pub async fn submit_complaint_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(complaint): Json<NewComplaint>,
) -> Result<impl IntoResponse, HandlerError> {
    let session = find_session(&app_state, id).await?;
    require_student(&session)?;

    let record = {
        let mut state = session.state.lock().await;
        state
            .repository
            .submit(complaint)
            .await
            .map_err(|e| port_error("Failed to submit complaint", e))?
    };
    session.render().await;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Mark a student-authored complaint as resolved.
#[utoipa::path(
    post,
    path = "/sessions/{id}/complaints/{case_id}/resolve",
    params(
        ("id" = Uuid, Path, description = "Tab session id."),
        ("case_id" = String, Path, description = "Case id as shown on the dashboard.")
    ),
    responses(
        (status = 200, description = "Complaint resolved"),
        (status = 403, description = "Case is read only", body = ErrorResponse),
        (status = 404, description = "Unknown session or case", body = ErrorResponse)
    )
)]
pub async fn resolve_complaint_handler(
    State(app_state): State<Arc<AppState>>,
    Path((id, case_id)): Path<(Uuid, String)>,
) -> Result<impl IntoResponse, HandlerError> {
    let session = find_session(&app_state, id).await?;
    require_student(&session)?;

    let record = {
        let mut state = session.state.lock().await;
        let case_id = state
            .repository
            .find_id(&case_id)
            .ok_or_else(|| error_response(StatusCode::NOT_FOUND, format!("Case {} not found", case_id)))?;
        state
            .repository
            .resolve(&case_id)
            .await
            .map_err(|e| port_error("Failed to resolve complaint", e))?
    };
    session.render().await;
    Ok(Json(record))
}

/// Delete a student-authored complaint.
#[utoipa::path(
    delete,
    path = "/sessions/{id}/complaints/{case_id}",
    params(
        ("id" = Uuid, Path, description = "Tab session id."),
        ("case_id" = String, Path, description = "Case id as shown on the dashboard.")
    ),
    responses(
        (status = 200, description = "Complaint deleted"),
        (status = 403, description = "Case is read only", body = ErrorResponse),
        (status = 404, description = "Unknown session or case", body = ErrorResponse)
    )
)]
pub async fn delete_complaint_handler(
    State(app_state): State<Arc<AppState>>,
    Path((id, case_id)): Path<(Uuid, String)>,
) -> Result<impl IntoResponse, HandlerError> {
    let session = find_session(&app_state, id).await?;
    require_student(&session)?;

    let removed = {
        let mut state = session.state.lock().await;
        let case_id = state
            .repository
            .find_id(&case_id)
            .ok_or_else(|| error_response(StatusCode::NOT_FOUND, format!("Case {} not found", case_id)))?;
        state
            .repository
            .delete(&case_id)
            .await
            .map_err(|e| port_error("Failed to delete complaint", e))?
    };
    session.render().await;
    Ok(Json(removed))
}

/// Download the filtered list as CSV or JSON.
#[utoipa::path(
    get,
    path = "/sessions/{id}/export",
    params(("id" = Uuid, Path, description = "Tab session id."), ExportParams),
    responses(
        (status = 200, description = "Export file", content_type = "text/csv"),
        (status = 400, description = "Unknown status or priority", body = ErrorResponse),
        (status = 404, description = "Unknown session", body = ErrorResponse)
    )
)]
pub async fn export_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(params): Query<ExportParams>,
) -> Result<impl IntoResponse, HandlerError> {
    let session = find_session(&app_state, id).await?;
    let format = params.format.unwrap_or_default();
    let filter = FilterParams {
        q: params.q,
        status: params.status,
        priority: params.priority,
    }
    .to_filter()?;

    let records = {
        let mut state = session.state.lock().await;
        state
            .refresh(session.role)
            .await
            .map_err(|e| port_error("Failed to reload complaints", e))?;
        filter.as_ref().unwrap_or(&state.filter).apply(state.repository.records())
    };
    let body = export::render(&records, format).map_err(|e| {
        error!("Failed to render export: {:?}", e);
        error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to render export")
    })?;

    let disposition = format!("attachment; filename=\"{}\"", format.file_name(Utc::now().date_naive()));
    info!(session_id = %id, count = records.len(), ?format, "Exported complaints");
    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

//=========================================================================================
// Profile, Activity and Theme Handlers
//=========================================================================================

/// The saved student profile.
#[utoipa::path(
    get,
    path = "/profile",
    responses(
        (status = 200, description = "Saved profile"),
        (status = 404, description = "No profile saved", body = ErrorResponse)
    )
)]
pub async fn get_profile_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<StudentProfile>, HandlerError> {
    ProfileBook::new(app_state.store.clone())
        .profile()
        .await
        .map_err(|e| port_error("Failed to load profile", e))?
        .map(Json)
        .ok_or_else(|| error_response(StatusCode::NOT_FOUND, "No profile saved"))
}

#[utoipa::path(
    put,
    path = "/profile",
    request_body(content_type = "application/json", description = "The full profile."),
    responses(
        (status = 200, description = "Profile saved"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn put_profile_handler(
    State(app_state): State<Arc<AppState>>,
    Json(profile): Json<StudentProfile>,
) -> Result<Json<StudentProfile>, HandlerError> {
    ProfileBook::new(app_state.store.clone())
        .save_profile(&profile)
        .await
        .map_err(|e| port_error("Failed to save profile", e))?;
    Ok(Json(profile))
}

#[utoipa::path(
    delete,
    path = "/profile",
    responses(
        (status = 204, description = "Profile removed"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn reset_profile_handler(State(app_state): State<Arc<AppState>>) -> Result<StatusCode, HandlerError> {
    ProfileBook::new(app_state.store.clone())
        .reset_profile()
        .await
        .map_err(|e| port_error("Failed to reset profile", e))?;
    Ok(StatusCode::NO_CONTENT)
}

/// The most recent activities, newest first as stored.
#[utoipa::path(
    get,
    path = "/activities",
    responses(
        (status = 200, description = "Recent activities"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn list_activities_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<ActivityEntry>>, HandlerError> {
    let activities = ProfileBook::new(app_state.store.clone())
        .recent_activities()
        .await
        .map_err(|e| port_error("Failed to load activities", e))?;
    Ok(Json(activities))
}

#[utoipa::path(
    put,
    path = "/activities",
    request_body(content_type = "application/json", description = "The full activity list."),
    responses(
        (status = 204, description = "Activities saved"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn put_activities_handler(
    State(app_state): State<Arc<AppState>>,
    Json(activities): Json<Vec<ActivityEntry>>,
) -> Result<StatusCode, HandlerError> {
    ProfileBook::new(app_state.store.clone())
        .save_activities(&activities)
        .await
        .map_err(|e| port_error("Failed to save activities", e))?;
    info!(count = activities.len(), limit = RECENT_ACTIVITY_LIMIT, "Saved activities");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/theme",
    responses(
        (status = 200, description = "Current theme", body = ThemeBody),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn get_theme_handler(State(app_state): State<Arc<AppState>>) -> Result<Json<ThemeBody>, HandlerError> {
    let theme = ProfileBook::new(app_state.store.clone())
        .theme()
        .await
        .map_err(|e| port_error("Failed to load theme", e))?;
    Ok(Json(ThemeBody { theme }))
}

#[utoipa::path(
    put,
    path = "/theme",
    request_body = ThemeBody,
    responses(
        (status = 200, description = "Theme saved", body = ThemeBody),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn put_theme_handler(
    State(app_state): State<Arc<AppState>>,
    Json(body): Json<ThemeBody>,
) -> Result<Json<ThemeBody>, HandlerError> {
    ProfileBook::new(app_state.store.clone())
        .save_theme(body.theme)
        .await
        .map_err(|e| port_error("Failed to save theme", e))?;
    Ok(Json(body))
}

//=========================================================================================
// Teacher Handlers
//=========================================================================================

/// The teacher's case activity table.
#[utoipa::path(
    get,
    path = "/teacher/cases",
    responses(
        (status = 200, description = "All rows"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn list_teacher_cases_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<TeacherCase>>, HandlerError> {
    let cases = TeacherCaseBook::new(app_state.store.clone())
        .load()
        .await
        .map_err(|e| port_error("Failed to load cases", e))?;
    Ok(Json(cases))
}

#[utoipa::path(
    post,
    path = "/teacher/cases",
    request_body(content_type = "application/json", description = "student, category, date, description"),
    responses(
        (status = 201, description = "Row added; the full table is returned"),
        (status = 400, description = "Missing student or category", body = ErrorResponse)
    )
)]
pub async fn add_teacher_case_handler(
    State(app_state): State<Arc<AppState>>,
    Json(case): Json<TeacherCase>,
) -> Result<impl IntoResponse, HandlerError> {
    let cases = TeacherCaseBook::new(app_state.store.clone())
        .add(case)
        .await
        .map_err(|e| port_error("Failed to add case", e))?;
    Ok((StatusCode::CREATED, Json(cases)))
}

#[utoipa::path(
    put,
    path = "/teacher/cases/{index}",
    params(("index" = usize, Path, description = "Row position in the table.")),
    request_body(content_type = "application/json", description = "Fields to change: student, category, date"),
    responses(
        (status = 200, description = "Row updated"),
        (status = 404, description = "Case not found", body = ErrorResponse)
    )
)]
pub async fn edit_teacher_case_handler(
    State(app_state): State<Arc<AppState>>,
    Path(index): Path<usize>,
    Json(edit): Json<TeacherCaseEdit>,
) -> Result<Json<TeacherCase>, HandlerError> {
    let case = TeacherCaseBook::new(app_state.store.clone())
        .edit(index, edit)
        .await
        .map_err(|e| port_error("Failed to edit case", e))?;
    Ok(Json(case))
}

#[utoipa::path(
    delete,
    path = "/teacher/cases/{index}",
    params(("index" = usize, Path, description = "Row position in the table.")),
    responses(
        (status = 200, description = "Row removed"),
        (status = 404, description = "Case not found", body = ErrorResponse)
    )
)]
pub async fn delete_teacher_case_handler(
    State(app_state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> Result<Json<TeacherCase>, HandlerError> {
    let case = TeacherCaseBook::new(app_state.store.clone())
        .delete(index)
        .await
        .map_err(|e| port_error("Failed to delete case", e))?;
    Ok(Json(case))
}

/// Send a case to the student dashboard. Open student tabs pick it up from the inbox.
#[utoipa::path(
    post,
    path = "/teacher/push",
    request_body(content_type = "application/json", description = "title (required), description, category, status, priority, date, response, id"),
    responses(
        (status = 202, description = "Case queued in the student inbox", body = PushResponse),
        (status = 400, description = "Missing title", body = ErrorResponse)
    )
)]
pub async fn push_case_handler(
    State(app_state): State<Arc<AppState>>,
    Json(case): Json<PushedCase>,
) -> Result<impl IntoResponse, HandlerError> {
    let waiting = TeacherCaseBook::new(app_state.store.clone())
        .push_to_student(case)
        .await
        .map_err(|e| port_error("Failed to push case", e))?;
    Ok((StatusCode::ACCEPTED, Json(PushResponse { waiting })))
}
