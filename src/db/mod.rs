//! Storage contracts for users, daily metrics and activities.
//!
//! Every service operation runs inside one [`Transaction`]. Writes become
//! visible to other transactions only on [`Transaction::commit`]; dropping a
//! transaction without committing discards its changes.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{activity::Activity, health_metrics::HealthMetrics, user::User};

pub use memory::MemoryDatabase;
pub use postgres::PgDatabase;

#[async_trait]
pub trait Database: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn Transaction>, AppError>;

    /// A transaction that observes one consistent snapshot and never writes.
    async fn begin_read_only(&self) -> Result<Box<dyn Transaction>, AppError>;
}

#[async_trait]
pub trait UserStore: Send {
    async fn find_user(&mut self, user_id: Uuid) -> Result<Option<User>, AppError>;
    async fn find_all_users(&mut self) -> Result<Vec<User>, AppError>;
    async fn user_exists(&mut self, user_id: Uuid) -> Result<bool, AppError>;
    async fn email_exists(&mut self, email: &str) -> Result<bool, AppError>;
    async fn save_user(&mut self, user: User) -> Result<User, AppError>;
    /// Removes the user together with every activity and metrics row it owns.
    async fn delete_user(&mut self, user_id: Uuid) -> Result<(), AppError>;
}

#[async_trait]
pub trait MetricsStore: Send {
    /// In a read-write transaction the returned row stays locked until commit.
    async fn find_metrics(
        &mut self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<HealthMetrics>, AppError>;

    /// Rows with `from <= date <= to`, ordered by date.
    async fn find_metrics_range(
        &mut self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<HealthMetrics>, AppError>;

    /// Inserts or updates by id. A second row for the same (user, date) is rejected.
    async fn save_metrics(&mut self, metrics: HealthMetrics) -> Result<HealthMetrics, AppError>;
}

#[async_trait]
pub trait ActivityStore: Send {
    async fn find_activity(&mut self, activity_id: Uuid) -> Result<Option<Activity>, AppError>;
    async fn find_activities_by_user(&mut self, user_id: Uuid) -> Result<Vec<Activity>, AppError>;

    /// Activities whose start lies in `[from, to]`, ordered by start.
    async fn find_activities_between(
        &mut self,
        user_id: Uuid,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<Activity>, AppError>;

    async fn save_activity(&mut self, activity: Activity) -> Result<Activity, AppError>;
    async fn delete_activity(&mut self, activity_id: Uuid) -> Result<(), AppError>;
    async fn activity_exists(&mut self, activity_id: Uuid) -> Result<bool, AppError>;
}

#[async_trait]
pub trait Transaction: UserStore + MetricsStore + ActivityStore {
    async fn commit(self: Box<Self>) -> Result<(), AppError>;
}
