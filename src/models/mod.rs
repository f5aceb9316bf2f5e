pub mod activity;
pub mod health_metrics;
pub mod user;
