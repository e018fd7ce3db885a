// Application layer - Use cases and the seams they depend on
pub mod aggregator;
pub mod clock;
pub mod dashboard_cache;
pub mod dashboard_service;
pub mod errors;
pub mod resource_repository;
