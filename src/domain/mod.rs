// Domain layer - Backend records and dashboard view-models
pub mod dashboard;
pub mod envelope;
pub mod period;
pub mod records;
