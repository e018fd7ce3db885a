// Dashboard view-models
//
// Each `apply_*` method is the reducer for one named slice and writes only the
// fields of that slice. `derive` runs once after the fold and fills the
// cross-slice metrics.
use super::period::Period;
use super::records::{
    Assignment, AssignmentStatus, AttendanceStats, Client, ClientStatus, MonthlyReport, Project,
    ProjectStatus, ReportStatus, Role, User,
};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineerRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub active_assignments: usize,
}

impl From<User> for EngineerRow {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            active_assignments: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminDashboard {
    pub total_clients: usize,
    pub active_clients: usize,

    pub total_projects: usize,
    pub active_projects: usize,
    pub projects_ending_soon: usize,

    pub total_engineers: usize,
    pub engineers: Vec<EngineerRow>,

    pub assignments_loaded: bool,
    pub active_assignments: usize,
    pub assignment_load: BTreeMap<String, usize>,

    pub pending_reports: usize,

    pub client_active_rate: Option<f64>,
    pub project_active_rate: Option<f64>,
    pub available_engineers: Option<usize>,
}

impl AdminDashboard {
    pub fn apply_clients(&mut self, clients: Vec<Client>) {
        self.total_clients = clients.len();
        self.active_clients = count_active_clients(&clients);
    }

    pub fn apply_projects(&mut self, projects: Vec<Project>, today: NaiveDate, window_days: i64) {
        self.total_projects = projects.len();
        self.active_projects = projects
            .iter()
            .filter(|p| p.status == ProjectStatus::Active)
            .count();
        self.projects_ending_soon = projects
            .iter()
            .filter(|p| ends_within(p, today, window_days))
            .count();
    }

    pub fn apply_engineers(&mut self, users: Vec<User>) {
        let mut engineers: Vec<EngineerRow> = users
            .into_iter()
            .filter(|u| u.role == Role::Engineer)
            .map(EngineerRow::from)
            .collect();
        engineers.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

        self.total_engineers = engineers.len();
        self.engineers = engineers;
    }

    pub fn apply_assignments(&mut self, assignments: Vec<Assignment>) {
        let mut load = BTreeMap::new();
        let mut active = 0;
        for assignment in assignments
            .iter()
            .filter(|a| a.status == AssignmentStatus::Active)
        {
            active += 1;
            if let Some(engineer_id) = &assignment.engineer_id {
                *load.entry(engineer_id.clone()).or_insert(0) += 1;
            }
        }

        self.assignments_loaded = true;
        self.active_assignments = active;
        self.assignment_load = load;
    }

    pub fn apply_reports(&mut self, reports: Vec<MonthlyReport>) {
        self.pending_reports = reports
            .iter()
            .filter(|r| r.status == ReportStatus::Submitted)
            .count();
    }

    pub fn derive(mut self) -> Self {
        self.client_active_rate = ratio(self.active_clients, self.total_clients);
        self.project_active_rate = ratio(self.active_projects, self.total_projects);

        for engineer in &mut self.engineers {
            engineer.active_assignments =
                self.assignment_load.get(&engineer.id).copied().unwrap_or(0);
        }

        // Without assignment data every engineer would look idle.
        self.available_engineers = self.assignments_loaded.then(|| {
            self.engineers
                .iter()
                .filter(|e| e.active_assignments == 0)
                .count()
        });

        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCounts {
    pub total: usize,
    pub active: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRow {
    pub id: String,
    pub name: String,
    pub status: ClientStatus,
    pub project_count: usize,
    pub active_project_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectEnding {
    pub id: String,
    pub name: String,
    pub client_id: Option<String>,
    pub end_date: NaiveDate,
    pub days_left: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesDashboard {
    pub total_clients: usize,
    pub active_clients: usize,
    pub clients: Vec<ClientRow>,

    pub total_projects: usize,
    pub active_projects: usize,
    pub projects_ending_soon: usize,
    pub upcoming_endings: Vec<ProjectEnding>,
    pub projects_by_client: BTreeMap<String, ProjectCounts>,

    pub client_active_rate: Option<f64>,
}

impl SalesDashboard {
    pub fn apply_clients(&mut self, clients: Vec<Client>) {
        self.total_clients = clients.len();
        self.active_clients = count_active_clients(&clients);

        let mut rows: Vec<ClientRow> = clients
            .into_iter()
            .map(|c| ClientRow {
                id: c.id,
                name: c.name,
                status: c.status,
                project_count: 0,
                active_project_count: 0,
            })
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        self.clients = rows;
    }

    pub fn apply_projects(&mut self, projects: Vec<Project>, today: NaiveDate, window_days: i64) {
        self.total_projects = projects.len();

        let mut by_client: BTreeMap<String, ProjectCounts> = BTreeMap::new();
        let mut endings = Vec::new();
        let mut active = 0;

        for project in &projects {
            let is_active = project.status == ProjectStatus::Active;
            if is_active {
                active += 1;
            }
            if let Some(client_id) = &project.client_id {
                let counts = by_client.entry(client_id.clone()).or_default();
                counts.total += 1;
                if is_active {
                    counts.active += 1;
                }
            }
            if let (true, Some(end)) = (ends_within(project, today, window_days), project.end_date) {
                endings.push(ProjectEnding {
                    id: project.id.clone(),
                    name: project.name.clone(),
                    client_id: project.client_id.clone(),
                    end_date: end,
                    days_left: (end - today).num_days(),
                });
            }
        }

        endings.sort_by(|a, b| a.end_date.cmp(&b.end_date).then_with(|| a.id.cmp(&b.id)));

        self.active_projects = active;
        self.projects_ending_soon = endings.len();
        self.upcoming_endings = endings;
        self.projects_by_client = by_client;
    }

    pub fn derive(mut self) -> Self {
        self.client_active_rate = ratio(self.active_clients, self.total_clients);
        for row in &mut self.clients {
            let counts = self
                .projects_by_client
                .get(&row.id)
                .copied()
                .unwrap_or_default();
            row.project_count = counts.total;
            row.active_project_count = counts.active;
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRow {
    pub id: String,
    pub project_id: Option<String>,
    pub project_name: Option<String>,
    pub role: Option<String>,
    pub status: AssignmentStatus,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl From<Assignment> for AssignmentRow {
    fn from(a: Assignment) -> Self {
        Self {
            id: a.id,
            project_id: a.project_id,
            project_name: a.project_name,
            role: a.role,
            status: a.status,
            start_date: a.start_date,
            end_date: a.end_date,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSummary {
    pub working_days: u32,
    pub present_days: u32,
    pub absent_days: u32,
    pub leave_days: u32,
    pub total_hours: f64,
    pub attendance_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    pub id: String,
    pub period: Period,
    pub status: ReportStatus,
    pub total_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineerDashboard {
    pub engineer: EngineerRow,
    pub period: Period,

    pub assignments: Vec<AssignmentRow>,
    pub active_assignments: usize,

    pub attendance: AttendanceSummary,

    pub recent_reports: Vec<ReportRow>,
    pub current_report_status: Option<ReportStatus>,
}

impl EngineerDashboard {
    pub fn new(engineer: EngineerRow, period: Period) -> Self {
        Self {
            engineer,
            period,
            assignments: Vec::new(),
            active_assignments: 0,
            attendance: AttendanceSummary::default(),
            recent_reports: Vec::new(),
            current_report_status: None,
        }
    }

    pub fn apply_assignments(&mut self, assignments: Vec<Assignment>) {
        let mut rows: Vec<AssignmentRow> = assignments.into_iter().map(AssignmentRow::from).collect();
        // Active first, then most recent start.
        rows.sort_by(|a, b| {
            (b.status == AssignmentStatus::Active)
                .cmp(&(a.status == AssignmentStatus::Active))
                .then_with(|| b.start_date.cmp(&a.start_date))
                .then_with(|| a.id.cmp(&b.id))
        });
        self.active_assignments = rows
            .iter()
            .filter(|r| r.status == AssignmentStatus::Active)
            .count();
        self.assignments = rows;
    }

    pub fn apply_attendance(&mut self, stats: AttendanceStats) {
        self.attendance = AttendanceSummary {
            working_days: stats.working_days,
            present_days: stats.present_days,
            absent_days: stats.absent_days,
            leave_days: stats.leave_days,
            total_hours: stats.total_hours,
            attendance_rate: None,
        };
    }

    pub fn apply_reports(&mut self, reports: Vec<MonthlyReport>, limit: usize) {
        let mut rows: Vec<ReportRow> = reports
            .into_iter()
            .filter_map(|r| {
                Period::new(r.year, r.month).map(|period| ReportRow {
                    id: r.id,
                    period,
                    status: r.status,
                    total_hours: r.total_hours,
                })
            })
            .collect();
        rows.sort_by(|a, b| b.period.cmp(&a.period).then_with(|| a.id.cmp(&b.id)));

        self.current_report_status = rows
            .iter()
            .find(|r| r.period == self.period)
            .map(|r| r.status);
        rows.truncate(limit);
        self.recent_reports = rows;
    }

    pub fn derive(mut self) -> Self {
        self.attendance.attendance_rate = ratio(
            self.attendance.present_days as usize,
            self.attendance.working_days as usize,
        );
        self
    }
}

fn count_active_clients(clients: &[Client]) -> usize {
    clients
        .iter()
        .filter(|c| c.status == ClientStatus::Active)
        .count()
}

/// Active project whose end date falls in `[today, today + window_days]`.
pub fn ends_within(project: &Project, today: NaiveDate, window_days: i64) -> bool {
    if project.status != ProjectStatus::Active {
        return false;
    }
    match project.end_date {
        Some(end) => end >= today && end <= today + Duration::days(window_days),
        None => false,
    }
}

fn ratio(part: usize, total: usize) -> Option<f64> {
    if total == 0 {
        None
    } else {
        Some(part as f64 / total as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn project(id: &str, client: &str, status: ProjectStatus, end: Option<NaiveDate>) -> Project {
        Project {
            id: id.to_string(),
            name: format!("Project {}", id),
            client_id: Some(client.to_string()),
            status,
            start_date: None,
            end_date: end,
        }
    }

    fn assignment(id: &str, engineer: &str, status: AssignmentStatus) -> Assignment {
        Assignment {
            id: id.to_string(),
            engineer_id: Some(engineer.to_string()),
            project_id: Some("p1".to_string()),
            project_name: None,
            role: None,
            status,
            start_date: None,
            end_date: None,
        }
    }

    fn engineer(id: &str, name: &str) -> User {
        User {
            id: id.to_string(),
            name: name.to_string(),
            email: format!("{}@example.com", id),
            role: Role::Engineer,
            is_active: true,
        }
    }

    #[test]
    fn test_ends_within_window_bounds() {
        let today = day(2025, 6, 1);
        let p = |end| project("p", "c", ProjectStatus::Active, Some(end));

        assert!(ends_within(&p(today), today, 30));
        assert!(ends_within(&p(day(2025, 7, 1)), today, 30));
        assert!(!ends_within(&p(day(2025, 7, 2)), today, 30));
        assert!(!ends_within(&p(day(2025, 5, 31)), today, 30));
        assert!(!ends_within(
            &project("p", "c", ProjectStatus::Completed, Some(today)),
            today,
            30
        ));
        assert!(!ends_within(&project("p", "c", ProjectStatus::Active, None), today, 30));
    }

    #[test]
    fn test_admin_derive_available_engineers() {
        let mut dashboard = AdminDashboard::default();
        dashboard.apply_engineers(vec![engineer("e1", "Bo"), engineer("e2", "Al")]);
        dashboard.apply_assignments(vec![
            assignment("a1", "e1", AssignmentStatus::Active),
            assignment("a2", "e1", AssignmentStatus::Active),
            assignment("a3", "e2", AssignmentStatus::Completed),
        ]);
        let dashboard = dashboard.derive();

        assert_eq!(dashboard.active_assignments, 2);
        assert_eq!(dashboard.available_engineers, Some(1));
        // Sorted by name
        assert_eq!(dashboard.engineers[0].id, "e2");
        assert_eq!(dashboard.engineers[0].active_assignments, 0);
        assert_eq!(dashboard.engineers[1].active_assignments, 2);
    }

    #[test]
    fn test_admin_available_engineers_unknown_without_assignments() {
        let mut dashboard = AdminDashboard::default();
        dashboard.apply_engineers(vec![engineer("e1", "Bo")]);
        let dashboard = dashboard.derive();
        assert_eq!(dashboard.available_engineers, None);
    }

    #[test]
    fn test_admin_rates() {
        let dashboard = AdminDashboard::default().derive();
        assert_eq!(dashboard.client_active_rate, None);

        let mut dashboard = AdminDashboard::default();
        dashboard.apply_clients(vec![
            Client { id: "c1".into(), name: "A".into(), status: ClientStatus::Active },
            Client { id: "c2".into(), name: "B".into(), status: ClientStatus::Inactive },
        ]);
        let dashboard = dashboard.derive();
        assert_eq!(dashboard.client_active_rate, Some(0.5));
    }

    #[test]
    fn test_engineers_slice_ignores_other_roles() {
        let mut dashboard = AdminDashboard::default();
        let mut sales = engineer("s1", "Sam");
        sales.role = Role::Sales;
        dashboard.apply_engineers(vec![engineer("e1", "Bo"), sales]);
        assert_eq!(dashboard.total_engineers, 1);
    }

    #[test]
    fn test_sales_client_rows_and_endings() {
        let today = day(2025, 6, 1);
        let mut dashboard = SalesDashboard::default();
        dashboard.apply_clients(vec![
            Client { id: "c2".into(), name: "Zeta".into(), status: ClientStatus::Active },
            Client { id: "c1".into(), name: "Acme".into(), status: ClientStatus::Active },
        ]);
        dashboard.apply_projects(
            vec![
                project("p1", "c1", ProjectStatus::Active, Some(day(2025, 6, 20))),
                project("p2", "c1", ProjectStatus::Completed, Some(day(2025, 5, 1))),
                project("p3", "c2", ProjectStatus::Active, Some(day(2025, 6, 5))),
                project("p4", "c2", ProjectStatus::Active, Some(day(2025, 12, 31))),
            ],
            today,
            30,
        );
        let dashboard = dashboard.derive();

        assert_eq!(dashboard.clients[0].name, "Acme");
        assert_eq!(dashboard.clients[0].project_count, 2);
        assert_eq!(dashboard.clients[0].active_project_count, 1);
        assert_eq!(dashboard.clients[1].project_count, 2);
        assert_eq!(dashboard.clients[1].active_project_count, 2);

        assert_eq!(dashboard.projects_ending_soon, 2);
        assert_eq!(dashboard.upcoming_endings[0].id, "p3");
        assert_eq!(dashboard.upcoming_endings[0].days_left, 4);
        assert_eq!(dashboard.upcoming_endings[1].id, "p1");
    }

    #[test]
    fn test_engineer_reports_current_period_and_limit() {
        let period = Period::new(2025, 6).unwrap();
        let mut dashboard = EngineerDashboard::new(EngineerRow::default(), period);
        let report = |id: &str, month, status| MonthlyReport {
            id: id.to_string(),
            engineer_id: Some("e1".to_string()),
            year: 2025,
            month,
            status,
            total_hours: 160.0,
        };

        dashboard.apply_reports(
            vec![
                report("r3", 3, ReportStatus::Approved),
                report("r6", 6, ReportStatus::Submitted),
                report("r5", 5, ReportStatus::Approved),
                report("r4", 4, ReportStatus::Approved),
                report("bad", 0, ReportStatus::Draft),
            ],
            2,
        );

        assert_eq!(dashboard.current_report_status, Some(ReportStatus::Submitted));
        let ids: Vec<&str> = dashboard.recent_reports.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r6", "r5"]);
    }

    #[test]
    fn test_engineer_attendance_rate() {
        let mut dashboard =
            EngineerDashboard::new(EngineerRow::default(), Period::new(2025, 6).unwrap());
        dashboard.apply_attendance(AttendanceStats {
            working_days: 20,
            present_days: 15,
            absent_days: 2,
            leave_days: 3,
            total_hours: 120.0,
        });
        let dashboard = dashboard.derive();
        assert_eq!(dashboard.attendance.attendance_rate, Some(0.75));
    }

    #[test]
    fn test_engineer_assignments_active_first() {
        let mut dashboard =
            EngineerDashboard::new(EngineerRow::default(), Period::new(2025, 6).unwrap());
        dashboard.apply_assignments(vec![
            assignment("a1", "e1", AssignmentStatus::Completed),
            assignment("a2", "e1", AssignmentStatus::Active),
        ]);
        assert_eq!(dashboard.active_assignments, 1);
        assert_eq!(dashboard.assignments[0].id, "a2");
    }
}
