pub mod activity;
pub mod dashboard;
pub mod metrics;
pub mod users;
