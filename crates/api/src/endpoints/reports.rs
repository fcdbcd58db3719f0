//! Report endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch, post},
};
use hunsuking_common::AppResult;
use hunsuking_core::SubmitReportInput;
use hunsuking_db::entities::report::{self, ReportStatus, ReportTargetKind};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AdminUser, AuthUser},
    middleware::AppState,
    response::ApiResponse,
};

/// Submit report request.
#[derive(Debug, Deserialize)]
pub struct SubmitReportRequest {
    pub target_kind: ReportTargetKind,
    pub target_id: String,
    pub detail: String,
}

/// Report list parameters.
#[derive(Debug, Deserialize)]
pub struct ListReportsQuery {
    pub status: Option<ReportStatus>,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

const fn default_limit() -> u64 {
    20
}

/// Report response.
#[derive(Serialize)]
pub struct ReportResponse {
    pub id: String,
    pub reporter_id: String,
    pub reported_user_id: String,
    pub target_kind: ReportTargetKind,
    pub target_id: String,
    pub article_id: String,
    pub detail: String,
    pub status: ReportStatus,
    pub created_at: String,
    pub resolved_at: Option<String>,
}

impl From<report::Model> for ReportResponse {
    fn from(r: report::Model) -> Self {
        Self {
            id: r.id,
            reporter_id: r.reporter_id,
            reported_user_id: r.reported_user_id,
            target_kind: r.target_kind,
            target_id: r.target_id,
            article_id: r.article_id,
            detail: r.detail,
            status: r.status,
            created_at: r.created_at.to_rfc3339(),
            resolved_at: r.resolved_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// File a report.
async fn submit_report(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<SubmitReportRequest>,
) -> AppResult<ApiResponse<ReportResponse>> {
    let report = state
        .moderation_service
        .submit(
            &user.id,
            SubmitReportInput {
                target_kind: req.target_kind,
                target_id: req.target_id,
                detail: req.detail,
            },
        )
        .await?;
    Ok(ApiResponse::ok(report.into()))
}

/// List reports. Admin only.
async fn list_reports(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Query(query): Query<ListReportsQuery>,
) -> AppResult<ApiResponse<Vec<ReportResponse>>> {
    let limit = query.limit.min(100);
    let reports = state
        .moderation_service
        .list(admin.is_admin, query.status, limit)
        .await?;
    Ok(ApiResponse::ok(reports.into_iter().map(Into::into).collect()))
}

/// Get one report. Admin only.
async fn get_report(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(report_id): Path<String>,
) -> AppResult<ApiResponse<ReportResponse>> {
    let report = state.moderation_service.get(admin.is_admin, &report_id).await?;
    Ok(ApiResponse::ok(report.into()))
}

/// Update status request.
#[derive(Debug, Deserialize)]
pub struct UpdateReportStatusRequest {
    pub status: ReportStatus,
}

/// Move a report through the workflow. Admin only.
async fn update_report_status(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(report_id): Path<String>,
    Json(req): Json<UpdateReportStatusRequest>,
) -> AppResult<ApiResponse<ReportResponse>> {
    let report = state
        .moderation_service
        .update_status(admin.is_admin, &report_id, req.status)
        .await?;
    Ok(ApiResponse::ok(report.into()))
}

/// Create the reports router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(submit_report).get(list_reports))
        .route("/{id}", get(get_report))
        .route("/{id}/status", patch(update_report_status))
}
