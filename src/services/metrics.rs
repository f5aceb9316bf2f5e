use chrono::NaiveDate;
use log::info;
use std::sync::Arc;
use uuid::Uuid;

use super::require_user;
use crate::db::{Database, Transaction};
use crate::errors::AppError;
use crate::models::health_metrics::{HealthMetrics, MetricsPatch};
use crate::utils::clock::LocalClock;
use crate::utils::validation::validate_steps;

/// Returns the stored aggregate for (user, date), or a fresh zeroed one that
/// has not been saved yet.
pub(crate) async fn open_daily_metrics(
    tx: &mut dyn Transaction,
    user_id: Uuid,
    date: NaiveDate,
) -> Result<HealthMetrics, AppError> {
    Ok(tx
        .find_metrics(user_id, date)
        .await?
        .unwrap_or_else(|| HealthMetrics::open(user_id, date)))
}

#[derive(Clone)]
pub struct MetricsService {
    db: Arc<dyn Database>,
    clock: LocalClock,
}

impl MetricsService {
    pub fn new(db: Arc<dyn Database>, clock: LocalClock) -> Self {
        MetricsService { db, clock }
    }

    /// Overwrites the supplied fields of the day's aggregate, creating it if needed.
    pub async fn save_metrics(
        &self,
        user_id: Uuid,
        date: Option<NaiveDate>,
        patch: MetricsPatch,
    ) -> Result<HealthMetrics, AppError> {
        let date = date.unwrap_or_else(|| self.clock.today());

        let mut tx = self.db.begin().await?;
        require_user(&mut *tx, user_id).await?;
        let mut metrics = open_daily_metrics(&mut *tx, user_id, date).await?;
        metrics.apply_patch(&patch);
        let metrics = tx.save_metrics(metrics).await?;
        tx.commit().await?;

        info!("Saved metrics for user {} on {}", user_id, date);
        Ok(metrics)
    }

    pub async fn get_metrics(&self, user_id: Uuid, date: NaiveDate) -> Result<HealthMetrics, AppError> {
        let mut tx = self.db.begin_read_only().await?;
        require_user(&mut *tx, user_id).await?;
        let metrics = tx.find_metrics(user_id, date).await?;
        tx.commit().await?;
        metrics.ok_or_else(|| AppError::not_found(format!("No metrics recorded for {}", date)))
    }

    pub async fn get_today_metrics(&self, user_id: Uuid) -> Result<HealthMetrics, AppError> {
        self.get_metrics(user_id, self.clock.today()).await
    }

    pub async fn get_metrics_range(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<HealthMetrics>, AppError> {
        let mut tx = self.db.begin_read_only().await?;
        require_user(&mut *tx, user_id).await?;
        let rows = tx.find_metrics_range(user_id, from, to).await?;
        tx.commit().await?;
        Ok(rows)
    }

    /// Adds steps and their implied distance to the day's aggregate. Each call
    /// accumulates; resubmitting the same count counts it twice.
    pub async fn add_steps(
        &self,
        user_id: Uuid,
        date: Option<NaiveDate>,
        steps: i32,
    ) -> Result<HealthMetrics, AppError> {
        validate_steps(steps)?;
        let date = date.unwrap_or_else(|| self.clock.today());

        let mut tx = self.db.begin().await?;
        require_user(&mut *tx, user_id).await?;
        let mut metrics = open_daily_metrics(&mut *tx, user_id, date).await?;
        metrics.add_steps(steps);
        let metrics = tx.save_metrics(metrics).await?;
        tx.commit().await?;

        info!("Added {} steps for user {} on {}", steps, user_id, date);
        Ok(metrics)
    }
}
