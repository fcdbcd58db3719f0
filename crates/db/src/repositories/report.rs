//! Report repository.

use std::sync::Arc;

use crate::entities::{
    Report,
    report::{self, ReportStatus, ReportTargetKind},
};
use hunsuking_common::{AppError, AppResult};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, SqlErr,
};

/// Report repository for database operations.
#[derive(Clone)]
pub struct ReportRepository {
    db: Arc<DatabaseConnection>,
}

impl ReportRepository {
    /// Create a new report repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// File a report.
    ///
    /// The (reporter, target) unique constraint surfaces as
    /// [`AppError::Duplicate`].
    pub async fn create(&self, model: report::ActiveModel) -> AppResult<report::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                AppError::Duplicate("You have already reported this".to_string())
            } else {
                AppError::Database(e.to_string())
            }
        })
    }

    /// Find a report by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<report::Model>> {
        Report::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a report by ID, erroring if missing.
    pub async fn get_by_id(&self, id: &str) -> AppResult<report::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Report not found: {id}")))
    }

    /// Get reports, newest first, optionally filtered by status.
    pub async fn find_all(
        &self,
        status: Option<ReportStatus>,
        limit: u64,
    ) -> AppResult<Vec<report::Model>> {
        let mut query = Report::find().order_by_desc(report::Column::Id);

        if let Some(s) = status {
            query = query.filter(report::Column::Status.eq(s));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Move a report from one status to another.
    ///
    /// Compare-and-set keyed on the expected current status: when a
    /// concurrent moderator already moved the report, zero rows match and
    /// `false` comes back, so edge-triggered side effects (the warning
    /// counter) fire at most once.
    pub async fn transition_status(
        &self,
        id: &str,
        from: ReportStatus,
        to: ReportStatus,
    ) -> AppResult<bool> {
        let now = chrono::Utc::now();
        let mut update = Report::update_many()
            .col_expr(report::Column::Status, Expr::value(to))
            .col_expr(report::Column::UpdatedAt, Expr::value(now))
            .filter(report::Column::Id.eq(id))
            .filter(report::Column::Status.eq(from));

        if to == ReportStatus::Resolved {
            update = update.col_expr(report::Column::ResolvedAt, Expr::value(now));
        }

        let result = update
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }
}
