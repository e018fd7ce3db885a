// Presentation layer - HTTP surface over the dashboards
pub mod app_state;
pub mod handlers;
pub mod router;
