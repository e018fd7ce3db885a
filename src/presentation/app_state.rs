// Application state for HTTP handlers
use crate::application::aggregator::Aggregated;
use crate::application::dashboard_cache::DashboardCache;
use crate::application::dashboard_service::DashboardService;
use crate::domain::dashboard::AdminDashboard;

pub type AdminDashboardCache = DashboardCache<Aggregated<AdminDashboard>>;

pub struct AppState {
    pub dashboard_service: DashboardService,
    pub admin_cache: AdminDashboardCache,
}
