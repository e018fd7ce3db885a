// Infrastructure layer - External dependencies and adapters
pub mod api_client;
pub mod cache_store;
pub mod config;
pub mod http_response;
