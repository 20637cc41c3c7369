pub mod auth_service;
pub mod chart_service;
