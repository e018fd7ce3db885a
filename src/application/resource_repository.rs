// Repository trait for backend resource access
use crate::application::errors::ClientError;
use crate::domain::envelope::ResourceEnvelope;
use crate::domain::period::Period;
use crate::domain::records::{
    Assignment, AttendanceStats, Client, MonthlyReport, Project, ReportStatus, Role, User,
};
use async_trait::async_trait;

pub type ClientResult<T> = Result<ResourceEnvelope<T>, ClientError>;

/// Optional filters for the monthly-reports collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportFilter {
    pub status: Option<ReportStatus>,
    pub engineer_id: Option<String>,
}

#[async_trait]
pub trait ResourceRepository: Send + Sync {
    /// List users, optionally restricted to one role
    async fn list_users(&self, role: Option<Role>) -> ClientResult<Vec<User>>;

    async fn get_user(&self, id: &str) -> ClientResult<User>;

    async fn list_clients(&self) -> ClientResult<Vec<Client>>;

    async fn list_projects(&self) -> ClientResult<Vec<Project>>;

    /// List assignments, optionally for a single engineer
    async fn list_assignments(&self, engineer_id: Option<&str>) -> ClientResult<Vec<Assignment>>;

    async fn list_monthly_reports(&self, filter: &ReportFilter) -> ClientResult<Vec<MonthlyReport>>;

    /// Attendance statistics for one engineer over one month
    async fn attendance_stats(&self, engineer_id: &str, period: Period)
    -> ClientResult<AttendanceStats>;

    async fn update_report_status(
        &self,
        report_id: &str,
        status: ReportStatus,
    ) -> ClientResult<MonthlyReport>;
}
