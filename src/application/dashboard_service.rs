// Dashboard service - Use case for building role dashboards
use crate::application::aggregator::{Aggregated, AggregationRequest, Aggregator};
use crate::application::clock::Clock;
use crate::application::errors::DashboardError;
use crate::application::resource_repository::{ReportFilter, ResourceRepository};
use crate::domain::dashboard::{AdminDashboard, EngineerDashboard, EngineerRow, SalesDashboard};
use crate::domain::period::Period;
use crate::domain::records::{ReportStatus, Role};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardSettings {
    pub ending_soon_days: i64,
    pub recent_reports: usize,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            ending_soon_days: 30,
            recent_reports: 6,
        }
    }
}

#[derive(Clone)]
pub struct DashboardService {
    repository: Arc<dyn ResourceRepository>,
    aggregator: Aggregator,
    clock: Arc<dyn Clock>,
    settings: DashboardSettings,
}

impl DashboardService {
    pub fn new(
        repository: Arc<dyn ResourceRepository>,
        aggregator: Aggregator,
        clock: Arc<dyn Clock>,
        settings: DashboardSettings,
    ) -> Self {
        Self {
            repository,
            aggregator,
            clock,
            settings,
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn repository(&self) -> &Arc<dyn ResourceRepository> {
        &self.repository
    }

    pub async fn admin_dashboard(&self) -> Result<Aggregated<AdminDashboard>, DashboardError> {
        let repo = self.repository.as_ref();
        let today = self.clock.today();
        let window = self.settings.ending_soon_days;
        let submitted = ReportFilter {
            status: Some(ReportStatus::Submitted),
            engineer_id: None,
        };

        let request = AggregationRequest::new()
            .slice("clients", repo.list_clients(), |v: &mut AdminDashboard, clients| {
                v.apply_clients(clients)
            })
            .slice("projects", repo.list_projects(), move |v: &mut AdminDashboard, projects| {
                v.apply_projects(projects, today, window)
            })
            .slice(
                "engineers",
                repo.list_users(Some(Role::Engineer)),
                |v: &mut AdminDashboard, users| v.apply_engineers(users),
            )
            .slice("assignments", repo.list_assignments(None), |v: &mut AdminDashboard, assignments| {
                v.apply_assignments(assignments)
            })
            .slice(
                "reports",
                repo.list_monthly_reports(&submitted),
                |v: &mut AdminDashboard, reports| v.apply_reports(reports),
            );

        let aggregated = self.aggregator.run(request).await;
        if aggregated.all_failed() {
            tracing::error!("Admin dashboard: every data source failed");
            return Err(DashboardError::AllSourcesFailed("admin"));
        }

        Ok(aggregated.map(AdminDashboard::derive))
    }

    pub async fn sales_dashboard(&self) -> Result<Aggregated<SalesDashboard>, DashboardError> {
        let repo = self.repository.as_ref();
        let today = self.clock.today();
        let window = self.settings.ending_soon_days;

        let request = AggregationRequest::new()
            .slice("clients", repo.list_clients(), |v: &mut SalesDashboard, clients| {
                v.apply_clients(clients)
            })
            .slice("projects", repo.list_projects(), move |v: &mut SalesDashboard, projects| {
                v.apply_projects(projects, today, window)
            });

        let aggregated = self.aggregator.run(request).await;
        if aggregated.all_failed() {
            tracing::error!("Sales dashboard: every data source failed");
            return Err(DashboardError::AllSourcesFailed("sales"));
        }

        Ok(aggregated.map(SalesDashboard::derive))
    }

    /// Build one engineer's dashboard. The profile lookup runs first; without
    /// it there is nothing to aggregate.
    pub async fn engineer_dashboard(
        &self,
        engineer_id: &str,
        period: Option<Period>,
    ) -> Result<Aggregated<EngineerDashboard>, DashboardError> {
        let repo = self.repository.as_ref();
        let period = period.unwrap_or_else(|| Period::containing(self.clock.today()));
        tracing::debug!("Building engineer dashboard for {} ({})", engineer_id, period);

        let profile = match repo.get_user(engineer_id).await {
            Ok(envelope) => envelope.into_data(),
            Err(e) if e.is_not_found() => {
                return Err(DashboardError::EngineerNotFound(engineer_id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        let engineer = match profile {
            Ok(user) if user.role == Role::Engineer => user,
            Ok(user) => {
                tracing::debug!("User {} has role {}, not engineer", user.id, user.role.as_str());
                return Err(DashboardError::EngineerNotFound(engineer_id.to_string()));
            }
            Err(_) => return Err(DashboardError::EngineerNotFound(engineer_id.to_string())),
        };

        let reports = ReportFilter {
            status: None,
            engineer_id: Some(engineer.id.clone()),
        };
        let limit = self.settings.recent_reports;

        let request = AggregationRequest::new()
            .slice(
                "assignments",
                repo.list_assignments(Some(&engineer.id)),
                |v: &mut EngineerDashboard, assignments| v.apply_assignments(assignments),
            )
            .slice(
                "attendance",
                repo.attendance_stats(&engineer.id, period),
                |v: &mut EngineerDashboard, stats| v.apply_attendance(stats),
            )
            .slice(
                "reports",
                repo.list_monthly_reports(&reports),
                move |v: &mut EngineerDashboard, reports| v.apply_reports(reports, limit),
            );

        let seed = EngineerDashboard::new(EngineerRow::from(engineer.clone()), period);
        let aggregated = self.aggregator.run_seeded(seed, request).await;
        if aggregated.all_failed() {
            tracing::error!("Engineer dashboard for {}: every data source failed", engineer.id);
            return Err(DashboardError::AllSourcesFailed("engineer"));
        }

        Ok(aggregated.map(EngineerDashboard::derive))
    }
}
